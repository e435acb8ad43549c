//! Paperforge CLI tool
//!
//! A command-line front end for the paperforge library: merge, split,
//! rotate, reorder, number, watermark, and compress PDF files.

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use glob::glob;
use std::path::{Path, PathBuf};
use std::process;

use paperforge::{
    add_page_numbers, compress, merge, reorder, rotate, split, watermark, Anchor, Color,
    CompressOptions, Document, EncodeOptions, Layer, PageNumberOptions, StandardFont,
    WatermarkOptions,
};

/// Paperforge - merge, split, rotate, reorder, stamp, and compress PDFs
#[derive(Parser)]
#[command(name = "paperforge")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge PDFs in order
    paperforge merge -o combined.pdf intro.pdf \"chapters/*.pdf\" appendix.pdf

    # One file per page
    paperforge split report.pdf -o pages/

    # Quarter turn clockwise
    paperforge rotate report.pdf -o rotated.pdf --angle 90

    # Move the last page to the front of a 3-page file
    paperforge reorder report.pdf -o shuffled.pdf --order 2,0,1

    # Page numbers and a diagonal draft stamp
    paperforge number report.pdf -o numbered.pdf
    paperforge watermark report.pdf -o stamped.pdf --text \"DRAFT [date]\" --date today")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge two or more PDF files into one
    Merge {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Split a PDF into one file per page
    Split {
        /// Input PDF file
        input: PathBuf,

        /// Output directory (created if missing)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Rotate every page by a right angle
    Rotate {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Rotation delta in degrees; multiples of 90, negatives allowed
        #[arg(long, allow_hyphen_values = true)]
        angle: i32,
    },

    /// Rearrange pages by a permutation
    Reorder {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Comma-separated 0-based source indices, e.g. "2,0,1"
        #[arg(long)]
        order: String,
    },

    /// Stamp page numbers on every page
    Number {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Label template; [page], [pages], and [date] expand per page
        #[arg(long)]
        template: Option<String>,

        /// Label anchor, e.g. bottom-center, top-right
        #[arg(long)]
        anchor: Option<String>,

        /// Font size in points
        #[arg(long)]
        font_size: Option<f64>,

        /// Date for the [date] placeholder: "today", ISO, or US format
        #[arg(long)]
        date: Option<String>,
    },

    /// Stamp a text watermark on every page
    Watermark {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Watermark text; [page], [pages], and [date] expand per page
        #[arg(long)]
        text: String,

        /// Watermark anchor (default: center)
        #[arg(long)]
        anchor: Option<String>,

        /// Font family, mapped to the closest standard font
        #[arg(long)]
        font: Option<String>,

        /// Font size in points
        #[arg(long)]
        font_size: Option<f64>,

        /// Fill color as #rrggbb
        #[arg(long)]
        color: Option<String>,

        /// Opacity from 0 to 1
        #[arg(long)]
        opacity: Option<f64>,

        /// Text rotation in degrees, counter-clockwise
        #[arg(long, allow_hyphen_values = true)]
        rotation: Option<f64>,

        /// Draw underneath the page content instead of on top
        #[arg(long)]
        behind: bool,

        /// Date for the [date] placeholder: "today", ISO, or US format
        #[arg(long)]
        date: Option<String>,
    },

    /// Rewrite a PDF with structural compression
    Compress {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Merge { inputs, output } => cmd_merge(inputs, output),
        Commands::Split { input, output } => cmd_split(input, output),
        Commands::Rotate {
            input,
            output,
            angle,
        } => cmd_rotate(input, output, angle),
        Commands::Reorder {
            input,
            output,
            order,
        } => cmd_reorder(input, output, order),
        Commands::Number {
            input,
            output,
            template,
            anchor,
            font_size,
            date,
        } => cmd_number(input, output, template, anchor, font_size, date),
        Commands::Watermark {
            input,
            output,
            text,
            anchor,
            font,
            font_size,
            color,
            opacity,
            rotation,
            behind,
            date,
        } => cmd_watermark(
            input, output, text, anchor, font, font_size, color, opacity, rotation, behind, date,
        ),
        Commands::Compress { input, output } => cmd_compress(input, output),
        Commands::Info { input } => cmd_info(input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Expand glob patterns in input paths, preserving argument order.
/// Matches within a single pattern come back in the glob crate's sorted
/// order.
fn expand_globs(patterns: Vec<String>) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = false;
            for entry in glob(&pattern).with_context(|| format!("invalid pattern: {}", pattern))? {
                match entry {
                    Ok(path) => {
                        paths.push(path);
                        matched = true;
                    }
                    Err(e) => eprintln!("Warning: glob error for {}: {}", pattern, e),
                }
            }
            if !matched {
                bail!("no files matched pattern: {}", pattern);
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

fn load_document(path: &Path) -> anyhow::Result<Document> {
    let bytes =
        std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    Document::load(&bytes).with_context(|| format!("cannot decode {}", path.display()))
}

fn write_document(document: &Document, path: &Path) -> anyhow::Result<()> {
    let bytes = document
        .encode(&EncodeOptions::default())
        .with_context(|| format!("cannot encode {}", path.display()))?;
    std::fs::write(path, bytes).with_context(|| format!("cannot write {}", path.display()))
}

/// Parse "today", ISO (2026-08-06), or US (8/6/2026) dates
fn parse_date(expr: &str) -> anyhow::Result<NaiveDate> {
    let expr = expr.trim();
    if expr.eq_ignore_ascii_case("today") {
        return Ok(Local::now().date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(expr, "%m/%d/%Y") {
        return Ok(date);
    }
    bail!("unable to parse date: {}", expr)
}

fn parse_order(order: &str) -> anyhow::Result<Vec<usize>> {
    order
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .with_context(|| format!("invalid page index: {}", part.trim()))
        })
        .collect()
}

fn cmd_merge(inputs: Vec<String>, output: PathBuf) -> anyhow::Result<()> {
    let inputs = expand_globs(inputs)?;

    let mut documents = Vec::with_capacity(inputs.len());
    for path in &inputs {
        documents.push(load_document(path)?);
    }

    eprintln!("Merging {} PDF files...", documents.len());
    let merged = merge(&documents)?;
    write_document(&merged, &output)?;

    eprintln!("Merged to: {}", output.display());
    Ok(())
}

fn cmd_split(input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let document = load_document(&input)?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());

    std::fs::create_dir_all(&output)
        .with_context(|| format!("cannot create {}", output.display()))?;

    let parts = split(&document)?;
    let count = parts.len();
    for (index, part) in parts.iter().enumerate() {
        let path = output.join(format!("{}-{:03}.pdf", stem, index + 1));
        write_document(part, &path)?;
    }

    eprintln!("Split into {} files under {}", count, output.display());
    Ok(())
}

fn cmd_rotate(input: PathBuf, output: PathBuf, angle: i32) -> anyhow::Result<()> {
    let document = load_document(&input)?;
    let rotated = rotate(&document, angle)?;
    write_document(&rotated, &output)?;

    eprintln!("Rotated {} pages by {} degrees", rotated.page_count(), angle);
    Ok(())
}

fn cmd_reorder(input: PathBuf, output: PathBuf, order: String) -> anyhow::Result<()> {
    let document = load_document(&input)?;
    let order = parse_order(&order)?;
    let reordered = reorder(&document, &order)?;
    write_document(&reordered, &output)?;

    eprintln!("Reordered {} pages", reordered.page_count());
    Ok(())
}

fn cmd_number(
    input: PathBuf,
    output: PathBuf,
    template: Option<String>,
    anchor: Option<String>,
    font_size: Option<f64>,
    date: Option<String>,
) -> anyhow::Result<()> {
    let document = load_document(&input)?;

    let mut options = PageNumberOptions::default();
    if let Some(template) = template {
        options.template = template;
    }
    if let Some(anchor) = anchor {
        options.anchor = anchor.parse::<Anchor>()?;
    }
    if let Some(size) = font_size {
        options.style.size = size;
    }
    if let Some(date) = date {
        options.date = Some(parse_date(&date)?);
    }

    let numbered = add_page_numbers(&document, &options)?;
    write_document(&numbered, &output)?;

    eprintln!("Numbered {} pages", numbered.page_count());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_watermark(
    input: PathBuf,
    output: PathBuf,
    text: String,
    anchor: Option<String>,
    font: Option<String>,
    font_size: Option<f64>,
    color: Option<String>,
    opacity: Option<f64>,
    rotation: Option<f64>,
    behind: bool,
    date: Option<String>,
) -> anyhow::Result<()> {
    let document = load_document(&input)?;

    let mut options = WatermarkOptions {
        text,
        ..WatermarkOptions::default()
    };
    if let Some(anchor) = anchor {
        options.anchor = anchor.parse::<Anchor>()?;
    }
    if let Some(font) = font {
        options.style.font = StandardFont::from_name(&font);
    }
    if let Some(size) = font_size {
        options.style.size = size;
    }
    if let Some(color) = color {
        options.style.color = Color::from_hex(&color)?;
    }
    if let Some(opacity) = opacity {
        options.style.opacity = opacity;
    }
    if let Some(rotation) = rotation {
        options.style.rotation = rotation;
    }
    if behind {
        options.style.layer = Layer::Background;
    }
    if let Some(date) = date {
        options.date = Some(parse_date(&date)?);
    }

    let stamped = watermark(&document, &options)?;
    write_document(&stamped, &output)?;

    eprintln!("Watermarked {} pages", stamped.page_count());
    Ok(())
}

fn cmd_compress(input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let before = std::fs::metadata(&input).map(|m| m.len()).unwrap_or(0);
    let document = load_document(&input)?;
    let compressed = compress(&document, &CompressOptions::default())?;
    write_document(&compressed, &output)?;

    let after = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
    eprintln!("Compressed {} -> {} bytes", before, after);
    Ok(())
}

fn cmd_info(input: PathBuf) -> anyhow::Result<()> {
    let document = load_document(&input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", document.page_count());
    if let Some(title) = document.title() {
        println!("Title: {}", title);
    }
    if let Some(producer) = document.producer() {
        println!("Producer: {}", producer);
    }
    for index in 0..document.page_count() {
        let (width, height) = document.page_size(index)?;
        let rotation = document.page_rotation(index)?;
        println!(
            "  page {}: {:.0} x {:.0} pt, rotation {}",
            index + 1,
            width,
            height,
            rotation
        );
    }

    Ok(())
}
