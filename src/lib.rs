//! Paperforge
//!
//! An in-memory PDF page-manipulation library. This crate provides:
//! - A document model over raw PDF bytes (load, encode, page accessors)
//! - Page import across documents with deep-copied ownership
//! - Merge, split, rotate, and reorder operations
//! - Page-number and watermark text overlays
//! - Lossless structural compression
//!
//! All operations are pure: they take document references and return new
//! documents, leaving their inputs untouched. File IO stays with the
//! caller; the library only ever sees and produces bytes.
//!
//! # Example
//!
//! ```no_run
//! use paperforge::{merge, Document, EncodeOptions};
//!
//! # fn main() -> paperforge::Result<()> {
//! let intro = Document::load(&std::fs::read("intro.pdf").unwrap())?;
//! let appendix = Document::load(&std::fs::read("appendix.pdf").unwrap())?;
//!
//! let combined = merge(&[intro, appendix])?;
//! std::fs::write("combined.pdf", combined.encode(&EncodeOptions::default())?).unwrap();
//! # Ok(())
//! # }
//! ```

pub mod compress;
pub mod document;
pub mod error;
pub mod font;
pub mod merge;
pub mod overlay;
pub mod split;
pub mod transform;

// Re-export commonly used items
pub use compress::{compress, CompressOptions};
pub use document::{Document, EncodeOptions, Page};
pub use error::{Error, Result};
pub use font::StandardFont;
pub use merge::merge;
pub use overlay::{
    add_page_numbers, watermark, Anchor, Color, Layer, OverlayStyle, PageNumberOptions,
    WatermarkOptions,
};
pub use split::split;
pub use transform::{reorder, rotate};
