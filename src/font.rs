//! Standard-14 font handles for overlay text
//!
//! Overlays use the base PDF fonts, so no font program is embedded and the
//! output stays viewer-portable. Width metrics are needed only to anchor
//! text (centering, right alignment), never for shaping.

use lopdf::{Dictionary, Object};

/// Helvetica advance widths for WinAnsi codes 32..=126, in 1/1000 em
const HELVETICA_WIDTHS: [i16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// One of the standard-14 base fonts usable for overlay text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StandardFont {
    #[default]
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
}

impl StandardFont {
    /// PDF BaseFont name
    pub fn base_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::Courier => "Courier",
        }
    }

    /// Map a free-form family name to the closest standard font.
    ///
    /// Accepts CSS generic families ("serif", "monospace") and common
    /// concrete names ("Arial", "Times New Roman"); anything unrecognized
    /// falls back to Helvetica, the most compatible default.
    pub fn from_name(name: &str) -> StandardFont {
        let lower = name.to_lowercase();
        let bold = lower.contains("bold");

        if lower.contains("times") || (lower.contains("serif") && !lower.contains("sans")) {
            return if bold {
                StandardFont::TimesBold
            } else {
                StandardFont::TimesRoman
            };
        }
        if lower.contains("courier") || lower.contains("mono") {
            return StandardFont::Courier;
        }
        if bold {
            StandardFont::HelveticaBold
        } else {
            StandardFont::Helvetica
        }
    }

    /// Type1 font dictionary referencing this base font
    pub(crate) fn dictionary(&self) -> Dictionary {
        let mut font = Dictionary::new();
        font.set("Type", Object::Name(b"Font".to_vec()));
        font.set("Subtype", Object::Name(b"Type1".to_vec()));
        font.set("BaseFont", Object::Name(self.base_name().as_bytes().to_vec()));
        font
    }

    /// Estimated advance width of `text` at `size` points.
    ///
    /// Exact for Helvetica and Courier in the ASCII range; Times and bytes
    /// outside the table use an average-width approximation, which is close
    /// enough for anchoring.
    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        let per_mille: f64 = match self {
            StandardFont::Courier => text.len() as f64 * 600.0,
            StandardFont::Helvetica | StandardFont::HelveticaBold => text
                .bytes()
                .map(|b| {
                    if (32..=126).contains(&b) {
                        HELVETICA_WIDTHS[(b - 32) as usize] as f64
                    } else {
                        556.0
                    }
                })
                .sum(),
            StandardFont::TimesRoman | StandardFont::TimesBold => text.len() as f64 * 480.0,
        };
        per_mille * size / 1000.0
    }
}
