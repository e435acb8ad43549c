//! Integration tests for the paperforge library

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, Stream, StringFormat};
use tempfile::TempDir;

use paperforge::{
    add_page_numbers, compress, merge, reorder, rotate, split, watermark, CompressOptions,
    Document, EncodeOptions, Error, PageNumberOptions, WatermarkOptions,
};

/// Build an in-memory PDF with `num_pages` pages. Page `i` (0-based) gets
/// a distinct width of `500 + i` points so tests can tell pages apart
/// after reordering, and a text run tagged with `prefix`.
fn sample_pdf(num_pages: u32, prefix: &str) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for i in 0..num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                ),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("{}-{}", prefix, i + 1).into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(500 + i as i64),
                    Object::Integer(792),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
        ]);
        page_ids.push(doc.add_object(page));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn load_sample(num_pages: u32, prefix: &str) -> Document {
    Document::load(&sample_pdf(num_pages, prefix)).unwrap()
}

/// Width assigned to page `index` by `sample_pdf`
fn page_width(document: &Document, index: usize) -> f64 {
    document.page_size(index).unwrap().0
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[test]
fn test_round_trip_preserves_structure() {
    let original = load_sample(3, "Doc");
    let bytes = original.encode(&EncodeOptions::default()).unwrap();

    let reloaded = Document::load(&bytes).unwrap();
    assert_eq!(reloaded.page_count(), 3);
    for index in 0..3 {
        assert_eq!(page_width(&reloaded, index), page_width(&original, index));
        assert_eq!(
            reloaded.page_rotation(index).unwrap(),
            original.page_rotation(index).unwrap()
        );
    }

    // second decode/encode generation keeps the same properties
    let again = Document::load(&reloaded.encode(&EncodeOptions::default()).unwrap()).unwrap();
    assert_eq!(again.page_count(), 3);
    for index in 0..3 {
        assert_eq!(page_width(&again, index), page_width(&original, index));
    }
}

#[test]
fn test_repeated_encode_is_deterministic() {
    let document = load_sample(2, "Doc");
    let options = EncodeOptions::default();
    assert_eq!(
        document.encode(&options).unwrap(),
        document.encode(&options).unwrap()
    );
}

#[test]
fn test_merge_combines_pages_in_order() {
    let first = load_sample(2, "A");
    let second = load_sample(3, "B");

    let merged = merge(&[first.clone(), second]).unwrap();
    assert_eq!(merged.page_count(), 5);

    // the first pageCount(A) pages are A's pages in order
    for index in 0..2 {
        assert_eq!(page_width(&merged, index), page_width(&first, index));
    }

    // merged output still decodes and carries both documents' content
    let bytes = merged.encode(&EncodeOptions { compact: false }).unwrap();
    assert!(contains(&bytes, b"A-1"));
    assert!(contains(&bytes, b"B-3"));

    let reloaded = Document::load(&bytes).unwrap();
    assert_eq!(reloaded.page_count(), 5);
}

#[test]
fn test_merge_requires_two_documents() {
    let only = load_sample(2, "A");
    assert!(matches!(merge(&[only]), Err(Error::Validation(_))));
    assert!(matches!(merge(&[]), Err(Error::Validation(_))));
}

#[test]
fn test_merge_leaves_inputs_untouched() {
    let first = load_sample(2, "A");
    let second = load_sample(1, "B");
    let _ = merge(&[first.clone(), second.clone()]).unwrap();
    assert_eq!(first.page_count(), 2);
    assert_eq!(second.page_count(), 1);
}

#[test]
fn test_split_produces_single_page_documents() {
    let document = load_sample(4, "Doc");
    let parts = split(&document).unwrap();

    assert_eq!(parts.len(), 4);
    for (index, part) in parts.iter().enumerate() {
        assert_eq!(part.page_count(), 1);
        assert_eq!(page_width(part, 0), page_width(&document, index));
    }
}

#[test]
fn test_split_then_merge_reproduces_order() {
    let document = load_sample(3, "Doc");
    let parts = split(&document).unwrap();
    let rejoined = merge(&parts).unwrap();

    assert_eq!(rejoined.page_count(), 3);
    for index in 0..3 {
        assert_eq!(page_width(&rejoined, index), page_width(&document, index));
    }
}

#[test]
fn test_split_empty_document_yields_no_parts() {
    let parts = split(&Document::new()).unwrap();
    assert!(parts.is_empty());
}

#[test]
fn test_rotate_four_quarter_turns_is_identity() {
    let mut document = load_sample(2, "Doc");
    for _ in 0..4 {
        document = rotate(&document, 90).unwrap();
    }
    for index in 0..2 {
        assert_eq!(document.page_rotation(index).unwrap(), 0);
    }
}

#[test]
fn test_rotate_overfull_and_negative_deltas() {
    let document = load_sample(1, "Doc");

    // 450 behaves as 90
    let rotated = rotate(&document, 450).unwrap();
    assert_eq!(rotated.page_rotation(0).unwrap(), 90);

    // -90 behaves as 270
    let rotated = rotate(&document, -90).unwrap();
    assert_eq!(rotated.page_rotation(0).unwrap(), 270);
}

#[test]
fn test_rotate_accumulates_on_existing_rotation() {
    let document = load_sample(1, "Doc");
    let quarter = rotate(&document, 90).unwrap();
    let half = rotate(&quarter, 90).unwrap();
    assert_eq!(half.page_rotation(0).unwrap(), 180);
}

#[test]
fn test_rotation_survives_round_trip() {
    let document = rotate(&load_sample(2, "Doc"), 90).unwrap();
    let reloaded = Document::load(&document.encode(&EncodeOptions::default()).unwrap()).unwrap();
    assert_eq!(reloaded.page_rotation(0).unwrap(), 90);
    assert_eq!(reloaded.page_rotation(1).unwrap(), 90);
}

#[test]
fn test_reorder_scenario() {
    let document = load_sample(3, "Doc");
    let reordered = reorder(&document, &[2, 0, 1]).unwrap();

    assert_eq!(page_width(&reordered, 0), page_width(&document, 2));
    assert_eq!(page_width(&reordered, 1), page_width(&document, 0));
    assert_eq!(page_width(&reordered, 2), page_width(&document, 1));
}

#[test]
fn test_reorder_rejects_non_bijections() {
    let document = load_sample(3, "Doc");

    // duplicate index
    assert!(matches!(
        reorder(&document, &[0, 0, 1]),
        Err(Error::Validation(_))
    ));
    // wrong length
    assert!(matches!(
        reorder(&document, &[0, 1]),
        Err(Error::Validation(_))
    ));
    // out of range
    assert!(matches!(
        reorder(&document, &[0, 1, 3]),
        Err(Error::Validation(_))
    ));

    // source untouched by the failed calls
    assert_eq!(document.page_count(), 3);
    for index in 0..3 {
        assert_eq!(page_width(&document, index), 500.0 + index as f64);
    }
}

#[test]
fn test_remove_page_reindexes_contiguously() {
    let mut document = load_sample(3, "Doc");
    document.remove_page(0).unwrap();

    assert_eq!(document.page_count(), 2);
    assert_eq!(page_width(&document, 0), 501.0);
    assert_eq!(page_width(&document, 1), 502.0);
}

#[test]
fn test_import_pages_rejects_bad_index() {
    let source = load_sample(2, "Doc");
    let mut dest = Document::new();
    let result = dest.import_pages(&source, &[0, 5]);
    assert!(matches!(
        result,
        Err(Error::PageIndex {
            index: 5,
            page_count: 2
        })
    ));
}

#[test]
fn test_import_pages_follows_index_order() {
    let source = load_sample(3, "Doc");
    let mut dest = Document::new();
    let pages = dest.import_pages(&source, &[2, 0]).unwrap();
    for page in pages {
        dest.add_page(page).unwrap();
    }

    assert_eq!(dest.page_count(), 2);
    assert_eq!(page_width(&dest, 0), page_width(&source, 2));
    assert_eq!(page_width(&dest, 1), page_width(&source, 0));
}

#[test]
fn test_page_numbers_are_one_based() {
    let document = load_sample(2, "Doc");
    let numbered = add_page_numbers(&document, &PageNumberOptions::default()).unwrap();

    let bytes = numbered.encode(&EncodeOptions { compact: false }).unwrap();
    assert!(contains(&bytes, b"Page 1 of 2"));
    assert!(contains(&bytes, b"Page 2 of 2"));
    assert!(!contains(&bytes, b"Page 0 of 2"));

    // original content still present under the overlay
    assert!(contains(&bytes, b"Doc-1"));
}

#[test]
fn test_watermark_stamps_every_page() {
    let document = load_sample(3, "Doc");
    let options = WatermarkOptions {
        text: "CONFIDENTIAL".to_string(),
        ..WatermarkOptions::default()
    };
    let stamped = watermark(&document, &options).unwrap();

    assert_eq!(stamped.page_count(), 3);
    let bytes = stamped.encode(&EncodeOptions { compact: false }).unwrap();
    assert!(contains(&bytes, b"CONFIDENTIAL"));

    let reloaded = Document::load(&bytes).unwrap();
    assert_eq!(reloaded.page_count(), 3);
}

#[test]
fn test_watermark_on_empty_document_is_noop() {
    let options = WatermarkOptions {
        text: "DRAFT".to_string(),
        ..WatermarkOptions::default()
    };
    let stamped = watermark(&Document::new(), &options).unwrap();
    assert_eq!(stamped.page_count(), 0);

    // still encodes to a loadable document
    let bytes = stamped.encode(&EncodeOptions::default()).unwrap();
    let reloaded = Document::load(&bytes).unwrap();
    assert_eq!(reloaded.page_count(), 0);
}

#[test]
fn test_compress_preserves_page_sequence() {
    let document = load_sample(3, "Doc");
    let compressed = compress(&document, &CompressOptions::default()).unwrap();

    let reloaded =
        Document::load(&compressed.encode(&EncodeOptions::default()).unwrap()).unwrap();
    assert_eq!(reloaded.page_count(), 3);
    for index in 0..3 {
        assert_eq!(page_width(&reloaded, index), page_width(&document, index));
    }
}

#[test]
fn test_load_rejects_garbage() {
    assert!(matches!(Document::load(b"not a pdf"), Err(Error::Decode(_))));
    assert!(matches!(Document::load(b""), Err(Error::Decode(_))));
}

#[test]
fn test_save_and_reload_through_filesystem() {
    let temp_dir = TempDir::new().expect("failed to create temp directory");
    let path = temp_dir.path().join("roundtrip.pdf");

    let document = load_sample(2, "Doc");
    std::fs::write(&path, document.encode(&EncodeOptions::default()).unwrap()).unwrap();

    let reloaded = Document::load(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(reloaded.page_count(), 2);
}
