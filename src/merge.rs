//! Merge: concatenate the pages of several documents into a new one

use crate::document::Document;
use crate::error::{Error, Result};

/// Merge two or more documents into a new one.
///
/// The result contains, in order, every page of every input document in
/// input order. The inputs are not modified.
pub fn merge(documents: &[Document]) -> Result<Document> {
    if documents.len() < 2 {
        return Err(Error::Validation(format!(
            "merge requires at least 2 documents, got {}",
            documents.len()
        )));
    }

    let mut merged = Document::new();
    for document in documents {
        let indices: Vec<usize> = (0..document.page_count()).collect();
        let pages = merged.import_pages(document, &indices)?;
        for page in pages {
            merged.add_page(page)?;
        }
    }

    log::debug!(
        "merged {} documents into {} pages",
        documents.len(),
        merged.page_count()
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_rejects_empty_input() {
        let result = merge(&[]);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_merge_rejects_single_input() {
        let result = merge(&[Document::new()]);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_merge_of_empty_documents_is_empty() {
        let merged = merge(&[Document::new(), Document::new()]).unwrap();
        assert_eq!(merged.page_count(), 0);
    }
}
