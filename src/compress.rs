//! Lossless structural compression
//!
//! Only structure is touched: identical indirect objects are folded into
//! one shared object and the references rewritten. No stream data is
//! re-encoded, so the result decodes to the identical page sequence and
//! identical visible content. Orphan pruning and stream compaction happen
//! at encode time via `EncodeOptions::compact`.

use std::collections::{HashMap, HashSet};

use lopdf::{Dictionary, Object, ObjectId, Stream};

use crate::document::Document;
use crate::error::Result;

/// Options controlling [`compress`]
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// Fold byte-identical indirect objects into shared objects
    pub dedup_objects: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            dedup_objects: true,
        }
    }
}

/// Produce a structurally compressed copy of the document
pub fn compress(document: &Document, options: &CompressOptions) -> Result<Document> {
    let mut compressed = document.clone();
    if options.dedup_objects {
        let folded = dedup_shared_objects(&mut compressed);
        log::debug!("folded {} duplicate objects", folded);
    }
    Ok(compressed)
}

/// Fold identical objects until no duplicates remain.
///
/// Page objects, the page-tree root, the catalog, and Info stay distinct:
/// folding a page into another would make one object serve two positions
/// in the page sequence. Folding runs in passes because collapsing one
/// pair can make the objects referencing them identical in turn; the pass
/// count is capped so malformed reference cycles cannot loop forever.
fn dedup_shared_objects(document: &mut Document) -> usize {
    let mut protected: HashSet<ObjectId> = document.page_ids().iter().copied().collect();
    protected.insert(document.pages_root());
    if let Ok(root) = document
        .inner()
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
    {
        protected.insert(root);
    }
    if let Ok(info) = document
        .inner()
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
    {
        protected.insert(info);
    }

    let mut total = 0usize;
    for _ in 0..8 {
        let inner = document.inner_mut();

        let mut canonical: HashMap<String, ObjectId> = HashMap::new();
        let mut remap: HashMap<ObjectId, ObjectId> = HashMap::new();
        for (&id, object) in inner.objects.iter() {
            if protected.contains(&id) {
                continue;
            }
            let key = object_key(object);
            match canonical.get(&key) {
                Some(&keep) => {
                    remap.insert(id, keep);
                }
                None => {
                    canonical.insert(key, id);
                }
            }
        }
        if remap.is_empty() {
            break;
        }
        total += remap.len();

        for id in remap.keys() {
            inner.objects.remove(id);
        }
        let ids: Vec<ObjectId> = inner.objects.keys().copied().collect();
        for id in ids {
            if let Some(object) = inner.objects.get(&id) {
                let rewritten = remap_refs(object, &remap);
                inner.objects.insert(id, rewritten);
            }
        }
        let trailer = inner.trailer.clone();
        inner.trailer = remap_dict(&trailer, &remap);
    }
    total
}

/// Content-identity key: stream position bookkeeping is ignored so equal
/// streams loaded from different file offsets still fold.
fn object_key(object: &Object) -> String {
    match object {
        Object::Stream(stream) => format!("S{:?}|{:?}", stream.dict, stream.content),
        other => format!("O{:?}", other),
    }
}

fn remap_refs(object: &Object, remap: &HashMap<ObjectId, ObjectId>) -> Object {
    match object {
        Object::Reference(id) => match remap.get(id) {
            Some(&keep) => Object::Reference(keep),
            None => Object::Reference(*id),
        },
        Object::Array(items) => {
            Object::Array(items.iter().map(|o| remap_refs(o, remap)).collect())
        }
        Object::Dictionary(dict) => Object::Dictionary(remap_dict(dict, remap)),
        Object::Stream(stream) => Object::Stream(Stream {
            dict: remap_dict(&stream.dict, remap),
            content: stream.content.clone(),
            allows_compression: stream.allows_compression,
            start_position: stream.start_position,
        }),
        other => other.clone(),
    }
}

fn remap_dict(dict: &Dictionary, remap: &HashMap<ObjectId, ObjectId>) -> Dictionary {
    let mut out = Dictionary::new();
    for (key, value) in dict.iter() {
        out.set(key.clone(), remap_refs(value, remap));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_folds_identical_streams() {
        let mut doc = Document::new();
        let (first, second, holder) = {
            let inner = doc.inner_mut();
            let first = inner.add_object(Stream::new(Dictionary::new(), b"same bytes".to_vec()));
            let second = inner.add_object(Stream::new(Dictionary::new(), b"same bytes".to_vec()));
            let holder = inner.add_object(Object::Array(vec![
                Object::Reference(first),
                Object::Reference(second),
            ]));
            (first, second, holder)
        };
        assert_ne!(first, second);

        let folded = dedup_shared_objects(&mut doc);
        assert_eq!(folded, 1);

        let inner = doc.inner();
        let array = inner.get_object(holder).unwrap().as_array().unwrap();
        let ids: Vec<ObjectId> = array.iter().map(|o| o.as_reference().unwrap()).collect();
        assert_eq!(ids[0], ids[1]);
        assert!(inner.objects.contains_key(&ids[0]));
    }

    #[test]
    fn test_compress_preserves_page_count() {
        let doc = Document::new();
        let compressed = compress(&doc, &CompressOptions::default()).unwrap();
        assert_eq!(compressed.page_count(), 0);
    }
}
