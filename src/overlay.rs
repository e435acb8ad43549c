//! Text overlays: page numbering and watermarks
//!
//! Overlays are drawn as Form XObjects with their own resources (font and
//! graphics state), invoked from a one-line content stream appended or
//! prepended to each page. The form carries the page's MediaBox as its
//! BBox, so overlay coordinates are plain page coordinates regardless of
//! what the page content does to the graphics state.

use chrono::NaiveDate;
use lopdf::{Dictionary, Object, ObjectId, Stream};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::font::StandardFont;

/// RGB fill color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const GRAY: Color = Color {
        r: 0.6,
        g: 0.6,
        b: 0.6,
    };

    /// Parse a `#rrggbb` (or `rrggbb`) hex color
    pub fn from_hex(hex: &str) -> Result<Color> {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::Validation(format!("invalid hex color: {}", hex)));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).unwrap_or(0) as f32 / 255.0
        };
        Ok(Color {
            r: channel(0..2),
            g: channel(2..4),
            b: channel(4..6),
        })
    }
}

/// Whether an overlay draws over or under the existing page content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layer {
    /// Draw on top of the page content (appended content stream)
    #[default]
    Foreground,
    /// Draw underneath the page content (prepended content stream)
    Background,
}

/// Fixed page anchor for overlay text. Positions derive from the page's
/// MediaBox and the configured margin only; page content is never read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    #[default]
    BottomCenter,
    BottomRight,
}

impl Anchor {
    /// (horizontal, vertical): -1 = left/bottom, 0 = center, 1 = right/top
    fn position(&self) -> (i8, i8) {
        match self {
            Anchor::TopLeft => (-1, 1),
            Anchor::TopCenter => (0, 1),
            Anchor::TopRight => (1, 1),
            Anchor::CenterLeft => (-1, 0),
            Anchor::Center => (0, 0),
            Anchor::CenterRight => (1, 0),
            Anchor::BottomLeft => (-1, -1),
            Anchor::BottomCenter => (0, -1),
            Anchor::BottomRight => (1, -1),
        }
    }
}

impl std::str::FromStr for Anchor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Anchor> {
        match s.to_lowercase().as_str() {
            "top-left" => Ok(Anchor::TopLeft),
            "top-center" | "top" => Ok(Anchor::TopCenter),
            "top-right" => Ok(Anchor::TopRight),
            "center-left" | "left" => Ok(Anchor::CenterLeft),
            "center" => Ok(Anchor::Center),
            "center-right" | "right" => Ok(Anchor::CenterRight),
            "bottom-left" => Ok(Anchor::BottomLeft),
            "bottom-center" | "bottom" => Ok(Anchor::BottomCenter),
            "bottom-right" => Ok(Anchor::BottomRight),
            other => Err(Error::Validation(format!("unknown anchor: {}", other))),
        }
    }
}

/// Visual style shared by all overlay operations
#[derive(Debug, Clone)]
pub struct OverlayStyle {
    pub font: StandardFont,
    /// Font size in points
    pub size: f64,
    pub color: Color,
    /// `0.0` (invisible) to `1.0` (opaque)
    pub opacity: f64,
    /// Counter-clockwise text rotation in degrees
    pub rotation: f64,
    pub layer: Layer,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            font: StandardFont::Helvetica,
            size: 12.0,
            color: Color::BLACK,
            opacity: 1.0,
            rotation: 0.0,
            layer: Layer::Foreground,
        }
    }
}

/// Configuration for [`add_page_numbers`]
#[derive(Debug, Clone)]
pub struct PageNumberOptions {
    /// Per-page text; `[page]`, `[pages]`, and `[date]` expand per page
    pub template: String,
    pub anchor: Anchor,
    /// Distance from the page edge in points
    pub margin: f64,
    pub style: OverlayStyle,
    /// Value for the `[date]` placeholder
    pub date: Option<NaiveDate>,
}

impl Default for PageNumberOptions {
    fn default() -> Self {
        Self {
            template: "Page [page] of [pages]".to_string(),
            anchor: Anchor::BottomCenter,
            margin: 36.0,
            style: OverlayStyle::default(),
            date: None,
        }
    }
}

/// Configuration for [`watermark`]
#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    /// Watermark text; the same placeholders as page numbering apply
    pub text: String,
    pub anchor: Anchor,
    pub margin: f64,
    pub style: OverlayStyle,
    pub date: Option<NaiveDate>,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            anchor: Anchor::Center,
            margin: 36.0,
            style: OverlayStyle {
                font: StandardFont::HelveticaBold,
                size: 48.0,
                color: Color::GRAY,
                opacity: 0.35,
                rotation: 45.0,
                layer: Layer::Foreground,
            },
            date: None,
        }
    }
}

/// Stamp "Page i of N" style labels on every page, 1-based.
///
/// The label position is a fixed anchor computed from the page box; the
/// operation never inspects what is already drawn. A zero-page document
/// comes back unchanged.
pub fn add_page_numbers(document: &Document, options: &PageNumberOptions) -> Result<Document> {
    validate_style(&options.style)?;

    let mut stamped = document.clone();
    let total = stamped.page_count();
    if total == 0 {
        return Ok(stamped);
    }

    let texts: Vec<String> = (1..=total)
        .map(|page| expand_template(&options.template, page, total, options.date))
        .collect();
    stamp_pages(
        &mut stamped,
        &texts,
        &options.style,
        options.anchor,
        options.margin,
    )?;

    log::debug!("numbered {} pages", total);
    Ok(stamped)
}

/// Stamp the same styled text on every page.
///
/// Foreground (the default) draws over the page content, background
/// underneath it. A zero-page document is a no-op, not an error.
pub fn watermark(document: &Document, options: &WatermarkOptions) -> Result<Document> {
    validate_style(&options.style)?;

    let mut stamped = document.clone();
    let total = stamped.page_count();
    if total == 0 {
        return Ok(stamped);
    }

    let texts: Vec<String> = (1..=total)
        .map(|page| expand_template(&options.text, page, total, options.date))
        .collect();
    stamp_pages(
        &mut stamped,
        &texts,
        &options.style,
        options.anchor,
        options.margin,
    )?;

    log::debug!("watermarked {} pages", total);
    Ok(stamped)
}

fn validate_style(style: &OverlayStyle) -> Result<()> {
    if !(0.0..=1.0).contains(&style.opacity) {
        return Err(Error::Validation(format!(
            "opacity must be within 0..=1, got {}",
            style.opacity
        )));
    }
    if style.size <= 0.0 {
        return Err(Error::Validation(format!(
            "font size must be positive, got {}",
            style.size
        )));
    }
    Ok(())
}

/// Expand `[page]`, `[pages]`, and `[date]` placeholders
fn expand_template(template: &str, page: usize, total: usize, date: Option<NaiveDate>) -> String {
    let mut text = template
        .replace("[page]", &page.to_string())
        .replace("[pages]", &total.to_string());
    if text.contains("[date]") {
        let formatted = date
            .map(|d| d.format("%B %-d, %Y").to_string())
            .unwrap_or_default();
        text = text.replace("[date]", &formatted);
    }
    text
}

/// Escape special characters in PDF literal strings
fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}

/// Draw one text per page. The font and graphics state objects are shared
/// across pages; each page gets its own Form XObject sized to its box.
fn stamp_pages(
    document: &mut Document,
    texts: &[String],
    style: &OverlayStyle,
    anchor: Anchor,
    margin: f64,
) -> Result<()> {
    let page_ids: Vec<ObjectId> = document.page_ids().to_vec();

    let font_id = document.inner_mut().add_object(style.font.dictionary());
    let gs_id = {
        let mut gs = Dictionary::new();
        gs.set("Type", Object::Name(b"ExtGState".to_vec()));
        gs.set("BM", Object::Name(b"Normal".to_vec()));
        gs.set("ca", Object::Real(style.opacity as f32));
        gs.set("CA", Object::Real(style.opacity as f32));
        document.inner_mut().add_object(Object::Dictionary(gs))
    };

    for (index, &page_id) in page_ids.iter().enumerate() {
        let media = document.page_media_box(index)?;
        let content = overlay_content(&texts[index], style, anchor, margin, media);
        let xobject = form_xobject(content, media, font_id, gs_id);
        let xobject_id = document.inner_mut().add_object(xobject);

        let name = register_xobject(document.inner_mut(), page_id, xobject_id)?;
        let invoke = format!("q\n/{} Do\nQ\n", name);
        let invoke_id = document
            .inner_mut()
            .add_object(Stream::new(Dictionary::new(), invoke.into_bytes()));
        match style.layer {
            Layer::Foreground => append_page_content(document.inner_mut(), page_id, invoke_id)?,
            Layer::Background => prepend_page_content(document.inner_mut(), page_id, invoke_id)?,
        }
    }

    Ok(())
}

/// Build the text-drawing operators for one page
fn overlay_content(
    text: &str,
    style: &OverlayStyle,
    anchor: Anchor,
    margin: f64,
    media: [f64; 4],
) -> String {
    let [llx, lly, urx, ury] = media;
    let (h, v) = anchor.position();

    // anchor point in page coordinates
    let ax = match h {
        -1 => llx + margin,
        0 => (llx + urx) / 2.0,
        _ => urx - margin,
    };
    let ay = match v {
        -1 => lly + margin,
        0 => (lly + ury) / 2.0,
        _ => ury - margin,
    };

    // alignment offsets in text space, so they rotate with the text
    let width = style.font.text_width(text, style.size);
    let dx = match h {
        -1 => 0.0,
        0 => -width / 2.0,
        _ => -width,
    };
    let dy = match v {
        -1 => 0.0,
        0 => -0.35 * style.size,
        _ => -style.size,
    };

    let theta = style.rotation.to_radians();
    let (sin, cos) = theta.sin_cos();

    let mut content = String::new();
    content.push_str("/GS1 gs\n");
    content.push_str(&format!(
        "{} {} {} rg\n",
        fmt_coord(style.color.r as f64),
        fmt_coord(style.color.g as f64),
        fmt_coord(style.color.b as f64)
    ));
    content.push_str("BT\n");
    content.push_str(&format!("/F1 {} Tf\n", fmt_coord(style.size)));
    content.push_str(&format!(
        "{} {} {} {} {} {} Tm\n",
        fmt_coord(cos),
        fmt_coord(sin),
        fmt_coord(-sin),
        fmt_coord(cos),
        fmt_coord(ax),
        fmt_coord(ay)
    ));
    content.push_str(&format!("{} {} Td\n", fmt_coord(dx), fmt_coord(dy)));
    content.push_str(&format!("({}) Tj\n", escape_pdf_string(text)));
    content.push_str("ET\n");
    content
}

/// Format a content-stream number: four decimal places, trailing zeros
/// trimmed, and no negative zero.
fn fmt_coord(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    let mut text = format!("{:.4}", rounded);
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    text
}

/// Wrap overlay content in a Form XObject with its own resources
fn form_xobject(content: String, media: [f64; 4], font_id: ObjectId, gs_id: ObjectId) -> Stream {
    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut gstates = Dictionary::new();
    gstates.set("GS1", Object::Reference(gs_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));
    resources.set("ExtGState", Object::Dictionary(gstates));

    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Form".to_vec()));
    dict.set("FormType", Object::Integer(1));
    dict.set(
        "BBox",
        Object::Array(vec![
            Object::Real(media[0] as f32),
            Object::Real(media[1] as f32),
            Object::Real(media[2] as f32),
            Object::Real(media[3] as f32),
        ]),
    );
    dict.set("Resources", Object::Dictionary(resources));

    Stream::new(dict, content.into_bytes())
}

/// Register the Form XObject in the page's Resources under a name not
/// already taken, and return that name.
fn register_xobject(
    doc: &mut lopdf::Document,
    page_id: ObjectId,
    xobject_id: ObjectId,
) -> Result<String> {
    // resources may be inline or a shared reference; either way the page
    // gets its own copy with the overlay registered
    let mut resources = {
        let page_dict = doc.get_object(page_id).and_then(Object::as_dict)?;
        match page_dict.get(b"Resources") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(res_id)) => match doc.get_object(*res_id) {
                Ok(Object::Dictionary(dict)) => dict.clone(),
                _ => Dictionary::new(),
            },
            _ => Dictionary::new(),
        }
    };
    let mut xobjects = match resources.get(b"XObject") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };

    let mut suffix = 1usize;
    let name = loop {
        let candidate = format!("Stamp{}", suffix);
        if xobjects.get(candidate.as_bytes()).is_err() {
            break candidate;
        }
        suffix += 1;
    };
    xobjects.set(name.as_bytes(), Object::Reference(xobject_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    let page_dict = doc.get_object_mut(page_id).and_then(Object::as_dict_mut)?;
    page_dict.set("Resources", Object::Dictionary(resources));
    Ok(name)
}

/// Append a content stream after the page's existing Contents
fn append_page_content(
    doc: &mut lopdf::Document,
    page_id: ObjectId,
    content_id: ObjectId,
) -> Result<()> {
    let page_dict = doc.get_object_mut(page_id).and_then(Object::as_dict_mut)?;
    let existing = page_dict.get(b"Contents").ok().cloned();
    match existing {
        Some(Object::Reference(first)) => {
            page_dict.set(
                "Contents",
                Object::Array(vec![
                    Object::Reference(first),
                    Object::Reference(content_id),
                ]),
            );
        }
        Some(Object::Array(mut contents)) => {
            contents.push(Object::Reference(content_id));
            page_dict.set("Contents", Object::Array(contents));
        }
        _ => {
            page_dict.set("Contents", Object::Array(vec![Object::Reference(content_id)]));
        }
    }
    Ok(())
}

/// Prepend a content stream before the page's existing Contents
fn prepend_page_content(
    doc: &mut lopdf::Document,
    page_id: ObjectId,
    content_id: ObjectId,
) -> Result<()> {
    let page_dict = doc.get_object_mut(page_id).and_then(Object::as_dict_mut)?;
    let existing = page_dict.get(b"Contents").ok().cloned();
    match existing {
        Some(Object::Reference(first)) => {
            page_dict.set(
                "Contents",
                Object::Array(vec![
                    Object::Reference(content_id),
                    Object::Reference(first),
                ]),
            );
        }
        Some(Object::Array(mut contents)) => {
            contents.insert(0, Object::Reference(content_id));
            page_dict.set("Contents", Object::Array(contents));
        }
        _ => {
            page_dict.set("Contents", Object::Array(vec![Object::Reference(content_id)]));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_template_page_numbers() {
        let text = expand_template("Page [page] of [pages]", 3, 10, None);
        assert_eq!(text, "Page 3 of 10");
    }

    #[test]
    fn test_expand_template_date() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let text = expand_template("Issued [date]", 1, 1, Some(date));
        assert_eq!(text, "Issued August 6, 2026");

        let blank = expand_template("Issued [date]", 1, 1, None);
        assert_eq!(blank, "Issued ");
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(escape_pdf_string("a(b)c\\d"), "a\\(b\\)c\\\\d");
    }

    #[test]
    fn test_color_from_hex() {
        let color = Color::from_hex("#ff8000").unwrap();
        assert!((color.r - 1.0).abs() < 1e-6);
        assert!((color.g - 128.0 / 255.0).abs() < 1e-6);
        assert!((color.b - 0.0).abs() < 1e-6);

        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("zzzzzz").is_err());
    }

    #[test]
    fn test_anchor_parse() {
        assert_eq!("bottom-center".parse::<Anchor>().unwrap(), Anchor::BottomCenter);
        assert_eq!("center".parse::<Anchor>().unwrap(), Anchor::Center);
        assert!("middle-out".parse::<Anchor>().is_err());
    }

    #[test]
    fn test_opacity_validated() {
        let doc = Document::new();
        let options = WatermarkOptions {
            text: "DRAFT".to_string(),
            style: OverlayStyle {
                opacity: 1.5,
                ..OverlayStyle::default()
            },
            ..WatermarkOptions::default()
        };
        assert!(matches!(watermark(&doc, &options), Err(Error::Validation(_))));
    }

    #[test]
    fn test_watermark_empty_document_is_noop() {
        let doc = Document::new();
        let options = WatermarkOptions {
            text: "DRAFT".to_string(),
            ..WatermarkOptions::default()
        };
        let stamped = watermark(&doc, &options).unwrap();
        assert_eq!(stamped.page_count(), 0);
    }

    #[test]
    fn test_overlay_content_anchors_and_rotation() {
        let style = OverlayStyle::default();
        let content = overlay_content("Hi", &style, Anchor::BottomLeft, 36.0, [0.0, 0.0, 612.0, 792.0]);
        assert!(content.contains("1 0 0 1 36 36 Tm"));
        assert!(content.contains("(Hi) Tj"));

        let rotated = OverlayStyle {
            rotation: 90.0,
            ..OverlayStyle::default()
        };
        let content = overlay_content("Hi", &rotated, Anchor::BottomLeft, 36.0, [0.0, 0.0, 612.0, 792.0]);
        assert!(content.contains("0 1 -1 0 36 36 Tm"));
    }

    #[test]
    fn test_fmt_coord() {
        assert_eq!(fmt_coord(36.0), "36");
        assert_eq!(fmt_coord(-0.0), "0");
        assert_eq!(fmt_coord(0.70710678), "0.7071");
        assert_eq!(fmt_coord(90.0_f64.to_radians().cos()), "0");
    }
}
