//! Split: break a document into single-page documents

use crate::document::Document;
use crate::error::Result;

/// Split a document into one single-page document per page, in the
/// original page order. A zero-page document yields an empty list.
pub fn split(document: &Document) -> Result<Vec<Document>> {
    let mut parts = Vec::with_capacity(document.page_count());
    for index in 0..document.page_count() {
        let mut part = Document::new();
        let pages = part.import_pages(document, &[index])?;
        for page in pages {
            part.add_page(page)?;
        }
        parts.push(part);
    }

    log::debug!("split document into {} parts", parts.len());
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_empty_document_yields_empty_list() {
        let parts = split(&Document::new()).unwrap();
        assert!(parts.is_empty());
    }
}
