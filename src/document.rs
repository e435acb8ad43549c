//! In-memory PDF document model
//!
//! Wraps a decoded `lopdf::Document` together with an ordered page list and
//! the metadata the library cares about. The page vector is the sole
//! determinant of encoded page order; `encode` rebuilds a flat page tree
//! from it.
//!
//! Invariant: every page dictionary held by the model is self-contained.
//! Inheritable attributes (`MediaBox`, `CropBox`, `Resources`, `Rotate`)
//! are materialized into each leaf page at load time, so pages survive
//! re-parenting, import into another document, and tree flattening.

use std::collections::HashMap;

use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat};

use crate::error::{Error, Result};

/// Page attributes resolvable through the page-tree Parent chain
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Handle to a page owned by a [`Document`].
///
/// A page handle is only meaningful for the document that produced it; a
/// page is never shared live between two documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    id: ObjectId,
}

/// Options controlling [`Document::encode`]
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Prune unreferenced objects and compact stream data before
    /// serializing. Off preserves the object store as-is.
    pub compact: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { compact: true }
    }
}

/// A decoded PDF document: an ordered page sequence plus metadata
#[derive(Debug, Clone)]
pub struct Document {
    inner: lopdf::Document,
    pages_root: ObjectId,
    pages: Vec<ObjectId>,
    title: Option<String>,
    producer: Option<String>,
}

impl Document {
    /// Create an empty document (zero pages)
    pub fn new() -> Document {
        let mut inner = lopdf::Document::with_version("1.5");

        let pages_root = inner.new_object_id();
        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set("Count", Object::Integer(0));
        pages_dict.set("Kids", Object::Array(Vec::new()));
        inner.objects.insert(pages_root, Object::Dictionary(pages_dict));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_root));
        let catalog_id = inner.add_object(Object::Dictionary(catalog));
        inner.trailer.set("Root", Object::Reference(catalog_id));

        Document {
            inner,
            pages_root,
            pages: Vec::new(),
            title: None,
            producer: None,
        }
    }

    /// Decode a document from raw PDF bytes.
    ///
    /// Fails with [`Error::Decode`] on malformed input, encrypted input,
    /// or any page whose content stream does not resolve. There is no
    /// partial-success mode: either the whole document decodes or nothing
    /// is returned.
    pub fn load(bytes: &[u8]) -> Result<Document> {
        let mut inner =
            lopdf::Document::load_mem(bytes).map_err(|e| Error::Decode(e.to_string()))?;

        if inner.trailer.get(b"Encrypt").is_ok() {
            return Err(Error::Decode(
                "encrypted documents are not supported".to_string(),
            ));
        }

        let catalog_id = inner
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|_| Error::Decode("missing document catalog".to_string()))?;

        let pages_root = inner
            .get_object(catalog_id)
            .and_then(Object::as_dict)
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(Object::as_reference)
            .map_err(|_| Error::Decode("missing page tree root".to_string()))?;

        let pages: Vec<ObjectId> = inner.get_pages().into_values().collect();

        for &page_id in &pages {
            materialize_inherited(&mut inner, page_id).map_err(as_decode)?;
            validate_page_contents(&inner, page_id)?;
        }

        let (title, producer) = read_info(&inner);

        log::debug!("decoded document with {} pages", pages.len());

        Ok(Document {
            inner,
            pages_root,
            pages,
            title,
            producer,
        })
    }

    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Document title, if any
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    /// Producer string, if any
    pub fn producer(&self) -> Option<&str> {
        self.producer.as_deref()
    }

    pub fn set_producer(&mut self, producer: Option<String>) {
        self.producer = producer;
    }

    /// Copy the pages at `indices` (0-based) from `source` into this
    /// document's ownership.
    ///
    /// Each page is deep-copied: its dictionary plus the transitive closure
    /// of objects it references, so visual content, size, and the source's
    /// rotation all carry over. The returned handles follow the order of
    /// `indices` and are not yet part of the page sequence — pass them to
    /// [`Document::add_page`].
    pub fn import_pages(&mut self, source: &Document, indices: &[usize]) -> Result<Vec<Page>> {
        for &index in indices {
            if index >= source.pages.len() {
                return Err(Error::PageIndex {
                    index,
                    page_count: source.pages.len(),
                });
            }
        }

        let mut imported = Vec::with_capacity(indices.len());
        for &index in indices {
            let id = self.copy_page_from(source, source.pages[index])?;
            imported.push(Page { id });
        }

        log::debug!("imported {} pages", imported.len());
        Ok(imported)
    }

    /// Append a previously imported page to the page sequence
    pub fn add_page(&mut self, page: Page) -> Result<()> {
        if !self.inner.objects.contains_key(&page.id) {
            return Err(Error::Validation(
                "page does not belong to this document".to_string(),
            ));
        }
        if self.pages.contains(&page.id) {
            return Err(Error::Validation(
                "page is already part of the document".to_string(),
            ));
        }
        self.pages.push(page.id);
        Ok(())
    }

    /// Remove the page at `index`; the remaining pages re-index
    /// contiguously.
    pub fn remove_page(&mut self, index: usize) -> Result<()> {
        if index >= self.pages.len() {
            return Err(Error::PageIndex {
                index,
                page_count: self.pages.len(),
            });
        }
        self.pages.remove(index);
        Ok(())
    }

    /// Page width and height in points, from the page's MediaBox
    pub fn page_size(&self, index: usize) -> Result<(f64, f64)> {
        let media = self.page_media_box(index)?;
        Ok(((media[2] - media[0]).abs(), (media[3] - media[1]).abs()))
    }

    /// Absolute page rotation in degrees: 0, 90, 180, or 270
    pub fn page_rotation(&self, index: usize) -> Result<i32> {
        let dict = self.page_dict(index)?;
        let degrees = match dict.get(b"Rotate") {
            Ok(Object::Integer(n)) => *n as i32,
            _ => 0,
        };
        Ok(degrees.rem_euclid(360))
    }

    /// Set the page's absolute rotation. The angle is normalized mod 360
    /// and must land on a right angle.
    pub fn set_page_rotation(&mut self, index: usize, degrees: i32) -> Result<()> {
        let normalized = degrees.rem_euclid(360);
        if normalized % 90 != 0 {
            return Err(Error::Validation(format!(
                "rotation must be a multiple of 90 degrees, got {}",
                degrees
            )));
        }
        let id = self.page_id(index)?;
        let dict = self.inner.get_object_mut(id).and_then(Object::as_dict_mut)?;
        dict.set("Rotate", Object::Integer(normalized as i64));
        Ok(())
    }

    /// Serialize the document to PDF bytes.
    ///
    /// Does not mutate the document; repeated encodes of the same state
    /// produce the same bytes. The page tree is rebuilt flat from the page
    /// sequence and the Info dictionary is rebuilt from the model's
    /// metadata.
    pub fn encode(&self, options: &EncodeOptions) -> Result<Vec<u8>> {
        let mut inner = self.inner.clone();

        let kids: Vec<Object> = self
            .pages
            .iter()
            .map(|&id| Object::Reference(id))
            .collect();
        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set("Count", Object::Integer(self.pages.len() as i64));
        pages_dict.set("Kids", Object::Array(kids));
        inner
            .objects
            .insert(self.pages_root, Object::Dictionary(pages_dict));

        for &page_id in &self.pages {
            if let Ok(Object::Dictionary(dict)) = inner.get_object_mut(page_id) {
                dict.set("Parent", Object::Reference(self.pages_root));
            }
        }

        if self.title.is_some() || self.producer.is_some() {
            let mut info = Dictionary::new();
            if let Some(title) = &self.title {
                info.set(
                    "Title",
                    Object::String(title.as_bytes().to_vec(), StringFormat::Literal),
                );
            }
            if let Some(producer) = &self.producer {
                info.set(
                    "Producer",
                    Object::String(producer.as_bytes().to_vec(), StringFormat::Literal),
                );
            }
            let info_id = inner.add_object(Object::Dictionary(info));
            inner.trailer.set("Info", Object::Reference(info_id));
        } else {
            inner.trailer.remove(b"Info");
        }

        if options.compact {
            let _ = inner.prune_objects();
            inner.compress();
        }

        let mut buffer = Vec::new();
        inner
            .save_to(&mut buffer)
            .map_err(|e| Error::Encode(e.to_string()))?;
        Ok(buffer)
    }

    pub(crate) fn inner(&self) -> &lopdf::Document {
        &self.inner
    }

    pub(crate) fn inner_mut(&mut self) -> &mut lopdf::Document {
        &mut self.inner
    }

    pub(crate) fn page_ids(&self) -> &[ObjectId] {
        &self.pages
    }

    pub(crate) fn pages_root(&self) -> ObjectId {
        self.pages_root
    }

    /// Replace the page sequence in one step. Used by reorder, which
    /// guarantees the new vector is a permutation of the current one.
    pub(crate) fn set_page_order(&mut self, pages: Vec<ObjectId>) {
        self.pages = pages;
    }

    pub(crate) fn page_media_box(&self, index: usize) -> Result<[f64; 4]> {
        let dict = self.page_dict(index)?;
        let array = dict.get(b"MediaBox").and_then(Object::as_array)?;
        if array.len() != 4 {
            return Err(Error::Decode(
                "MediaBox must have four entries".to_string(),
            ));
        }
        let mut media = [0.0f64; 4];
        for (slot, object) in media.iter_mut().zip(array) {
            *slot = number(object)
                .ok_or_else(|| Error::Decode("MediaBox entry is not a number".to_string()))?;
        }
        Ok(media)
    }

    fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.pages.get(index).copied().ok_or(Error::PageIndex {
            index,
            page_count: self.pages.len(),
        })
    }

    fn page_dict(&self, index: usize) -> Result<&Dictionary> {
        let id = self.page_id(index)?;
        Ok(self.inner.get_object(id).and_then(Object::as_dict)?)
    }

    /// Deep-copy one page object and everything it references from
    /// `source` into this document's object store.
    fn copy_page_from(&mut self, source: &Document, src_page_id: ObjectId) -> Result<ObjectId> {
        let mut page_dict = source
            .inner
            .get_object(src_page_id)
            .and_then(Object::as_dict)?
            .clone();
        // the copy is re-parented by the destination at encode time
        page_dict.remove(b"Parent");

        // Transitive closure of referenced objects. Dangling references and
        // page-tree nodes reachable through annotation links map to null
        // instead of being dragged along.
        let mut id_map: HashMap<ObjectId, Option<ObjectId>> = HashMap::new();
        let mut queue = Vec::new();
        for (_, value) in page_dict.iter() {
            collect_refs(value, &mut queue);
        }

        while let Some(old) = queue.pop() {
            if id_map.contains_key(&old) {
                continue;
            }
            let object = match source.inner.get_object(old) {
                Ok(object) => object,
                Err(_) => {
                    id_map.insert(old, None);
                    continue;
                }
            };
            if let Ok(dict) = object.as_dict() {
                if let Ok(kind) = dict.get(b"Type").and_then(Object::as_name) {
                    if kind == b"Page" || kind == b"Pages" {
                        id_map.insert(old, None);
                        continue;
                    }
                }
            }
            id_map.insert(old, Some(self.inner.new_object_id()));
            collect_refs(object, &mut queue);
        }

        for (&old, &mapped) in &id_map {
            if let Some(new_id) = mapped {
                let object = source.inner.get_object(old)?;
                self.inner.objects.insert(new_id, rewrite_refs(object, &id_map));
            }
        }

        let new_page_id = self.inner.new_object_id();
        self.inner
            .objects
            .insert(new_page_id, Object::Dictionary(rewrite_dict(&page_dict, &id_map)));
        Ok(new_page_id)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(n) => Some(*n as f64),
        Object::Real(n) => Some(*n as f64),
        _ => None,
    }
}

/// Pull inheritable attributes down the Parent chain into the leaf page
/// dictionary, so the page stays valid outside its original tree.
fn materialize_inherited(inner: &mut lopdf::Document, page_id: ObjectId) -> Result<()> {
    let mut missing: Vec<&'static [u8]> = Vec::new();
    let mut parent;
    {
        let page_dict = inner.get_object(page_id).and_then(Object::as_dict)?;
        for key in INHERITABLE_KEYS {
            if page_dict.get(key).is_err() {
                missing.push(key);
            }
        }
        parent = page_dict.get(b"Parent").and_then(Object::as_reference).ok();
    }

    let mut found: Vec<(&'static [u8], Object)> = Vec::new();
    let mut depth = 0usize;
    while let Some(node_id) = parent {
        if missing.is_empty() {
            break;
        }
        depth += 1;
        if depth > 64 {
            return Err(Error::Decode("page tree deeper than 64 levels".to_string()));
        }
        let node = inner.get_object(node_id).and_then(Object::as_dict)?;
        let mut remaining = Vec::new();
        for key in missing {
            match node.get(key) {
                Ok(value) => found.push((key, value.clone())),
                Err(_) => remaining.push(key),
            }
        }
        missing = remaining;
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    let page_dict = inner.get_object_mut(page_id).and_then(Object::as_dict_mut)?;
    for (key, value) in found {
        page_dict.set(key, value);
    }
    if page_dict.get(b"MediaBox").is_err() {
        // MediaBox is a required attribute; fall back to US Letter
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        );
    }
    Ok(())
}

/// Reject pages whose content stream references do not resolve
fn validate_page_contents(inner: &lopdf::Document, page_id: ObjectId) -> Result<()> {
    let page_dict = inner
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|_| Error::Decode("page object is not a dictionary".to_string()))?;

    let contents = match page_dict.get(b"Contents") {
        Ok(contents) => contents,
        Err(_) => return Ok(()),
    };
    let refs: Vec<ObjectId> = match contents {
        Object::Reference(id) => vec![*id],
        Object::Array(items) => items.iter().filter_map(|o| o.as_reference().ok()).collect(),
        Object::Stream(_) => return Ok(()),
        _ => {
            return Err(Error::Decode(
                "page Contents has an unsupported type".to_string(),
            ))
        }
    };
    for id in refs {
        match inner.get_object(id) {
            Ok(Object::Stream(_)) => {}
            _ => {
                return Err(Error::Decode(format!(
                    "page content stream {} {} does not resolve",
                    id.0, id.1
                )))
            }
        }
    }
    Ok(())
}

fn read_info(inner: &lopdf::Document) -> (Option<String>, Option<String>) {
    let mut title = None;
    let mut producer = None;

    if let Ok(Object::Reference(info_id)) = inner.trailer.get(b"Info") {
        if let Ok(Object::Dictionary(info)) = inner.get_object(*info_id) {
            title = info
                .get(b"Title")
                .and_then(Object::as_str)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes.to_vec()).ok());
            producer = info
                .get(b"Producer")
                .and_then(Object::as_str)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes.to_vec()).ok());
        }
    }

    (title, producer)
}

fn as_decode(error: Error) -> Error {
    match error {
        Error::Pdf(inner) => Error::Decode(inner.to_string()),
        other => other,
    }
}

fn collect_refs(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => {
            for item in items {
                collect_refs(item, out);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter() {
                collect_refs(value, out);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter() {
                collect_refs(value, out);
            }
        }
        _ => {}
    }
}

/// Rewrite all references in an object through the id map; unmapped or
/// deliberately dropped references become null.
fn rewrite_refs(object: &Object, id_map: &HashMap<ObjectId, Option<ObjectId>>) -> Object {
    match object {
        Object::Reference(old) => match id_map.get(old) {
            Some(Some(new_id)) => Object::Reference(*new_id),
            _ => Object::Null,
        },
        Object::Array(items) => {
            Object::Array(items.iter().map(|o| rewrite_refs(o, id_map)).collect())
        }
        Object::Dictionary(dict) => Object::Dictionary(rewrite_dict(dict, id_map)),
        Object::Stream(stream) => Object::Stream(Stream {
            dict: rewrite_dict(&stream.dict, id_map),
            content: stream.content.clone(),
            allows_compression: stream.allows_compression,
            start_position: stream.start_position,
        }),
        other => other.clone(),
    }
}

fn rewrite_dict(dict: &Dictionary, id_map: &HashMap<ObjectId, Option<ObjectId>>) -> Dictionary {
    let mut out = Dictionary::new();
    for (key, value) in dict.iter() {
        out.set(key.clone(), rewrite_refs(value, id_map));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_is_empty() {
        let doc = Document::new();
        assert_eq!(doc.page_count(), 0);
        assert!(doc.title().is_none());
    }

    #[test]
    fn test_remove_page_out_of_bounds() {
        let mut doc = Document::new();
        let result = doc.remove_page(0);
        assert!(matches!(
            result,
            Err(Error::PageIndex {
                index: 0,
                page_count: 0
            })
        ));
    }

    #[test]
    fn test_import_pages_out_of_bounds() {
        let source = Document::new();
        let mut dest = Document::new();
        let result = dest.import_pages(&source, &[0]);
        assert!(matches!(result, Err(Error::PageIndex { .. })));
    }

    #[test]
    fn test_add_foreign_page_rejected() {
        let mut doc = Document::new();
        let foreign = Page { id: (9999, 0) };
        assert!(matches!(
            doc.add_page(foreign),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_repeated_encodes_are_identical() {
        let doc = Document::new();
        let options = EncodeOptions::default();
        let first = doc.encode(&options).unwrap();
        let second = doc.encode(&options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_metadata_round_trip() {
        let mut doc = Document::new();
        doc.set_title(Some("Quarterly Report".to_string()));
        doc.set_producer(Some("paperforge".to_string()));

        let bytes = doc.encode(&EncodeOptions::default()).unwrap();
        let reloaded = Document::load(&bytes).unwrap();

        assert_eq!(reloaded.title(), Some("Quarterly Report"));
        assert_eq!(reloaded.producer(), Some("paperforge"));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let result = Document::load(b"this is not a pdf");
        assert!(matches!(result, Err(Error::Decode(_))));
    }
}
