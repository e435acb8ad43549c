//! Rotate and reorder: page-sequence transforms that touch no content

use crate::document::Document;
use crate::error::{Error, Result};

/// Rotate every page by `delta` degrees.
///
/// The delta is normalized mod 360 first, so negative values and values
/// past a full turn are fine (450 behaves as 90). The normalized delta
/// must be a right angle; each page ends up at
/// `(current + delta) mod 360`.
pub fn rotate(document: &Document, delta: i32) -> Result<Document> {
    let delta = delta.rem_euclid(360);
    if delta % 90 != 0 {
        return Err(Error::Validation(format!(
            "rotation delta must be a multiple of 90 degrees, got {}",
            delta
        )));
    }

    let mut rotated = document.clone();
    for index in 0..rotated.page_count() {
        let current = rotated.page_rotation(index)?;
        rotated.set_page_rotation(index, current + delta)?;
    }
    Ok(rotated)
}

/// Rearrange pages by the given permutation of `[0, page_count)`.
///
/// `order[i]` names the source index of the page that ends up at position
/// `i`. The permutation must be a bijection; anything partial, duplicated,
/// or out of range is rejected before any page moves. The new page
/// sequence is built in full and swapped in as one assignment, never by
/// removing and re-adding pages one at a time.
pub fn reorder(document: &Document, order: &[usize]) -> Result<Document> {
    let page_count = document.page_count();
    if order.len() != page_count {
        return Err(Error::Validation(format!(
            "permutation has {} entries but document has {} pages",
            order.len(),
            page_count
        )));
    }
    let mut seen = vec![false; page_count];
    for &index in order {
        if index >= page_count {
            return Err(Error::Validation(format!(
                "permutation entry {} out of range for {} pages",
                index, page_count
            )));
        }
        if seen[index] {
            return Err(Error::Validation(format!(
                "permutation repeats page index {}",
                index
            )));
        }
        seen[index] = true;
    }

    let mut reordered = document.clone();
    let current = reordered.page_ids().to_vec();
    let pages = order.iter().map(|&index| current[index]).collect();
    reordered.set_page_order(pages);
    Ok(reordered)
}
