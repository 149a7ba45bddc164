//! lopdf adapter for document object-model edits
//!
//! Covers the engine work neither qpdf nor PDFium expose: blank-document
//! creation, bookmark removal/expansion, embedded-file removal, watermark
//! overlays, and text replacement.

use crate::error::{Error, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeSet;

/// Style of a tiled text watermark
#[derive(Debug, Clone)]
pub struct WatermarkStyle {
    /// Font size in points
    pub font_size: f64,
    /// Fill opacity (0.0-1.0)
    pub opacity: f64,
    /// Counter-clockwise rotation in degrees
    pub rotation_degrees: f64,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            opacity: 0.3,
            rotation_degrees: 45.0,
        }
    }
}

fn map_lopdf_error(e: lopdf::Error) -> Error {
    Error::Lopdf {
        reason: e.to_string(),
    }
}

fn load(data: &[u8]) -> Result<Document> {
    Document::load_mem(data).map_err(map_lopdf_error)
}

fn save(doc: &mut Document) -> Result<Vec<u8>> {
    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Build an `Object::Real` from an f64 regardless of the underlying width.
fn real(value: f64) -> Object {
    Object::Real(value as _)
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(*value as f64),
        _ => None,
    }
}

fn catalog_id(doc: &Document) -> Result<ObjectId> {
    doc.trailer
        .get(b"Root")
        .and_then(|object| object.as_reference())
        .map_err(map_lopdf_error)
}

/// Create a blank single-page letter-size document.
pub fn new_blank_document() -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();

    let content_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), Vec::new())));

    let mut page_dict = Dictionary::new();
    page_dict.set("Type", Object::Name(b"Page".to_vec()));
    page_dict.set("Parent", Object::Reference(pages_id));
    page_dict.set("Contents", Object::Reference(content_id));
    page_dict.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ]),
    );
    let page_id = doc.add_object(Object::Dictionary(page_dict));

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    pages_dict.set("Count", Object::Integer(1));
    doc.objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog_dict = Dictionary::new();
    catalog_dict.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog_dict.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog_dict));

    doc.trailer.set("Root", Object::Reference(catalog_id));

    save(&mut doc)
}

/// Collect every outline node reachable from `first` through First/Next
/// references. Prev/Parent pointers are ignored so cycles cannot loop.
fn outline_nodes(doc: &Document, first: ObjectId) -> Vec<ObjectId> {
    let mut nodes = Vec::new();
    let mut visited = BTreeSet::new();
    let mut stack = vec![first];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        nodes.push(id);

        if let Ok(dict) = doc.get_dictionary(id) {
            for key in [b"First".as_slice(), b"Next".as_slice()] {
                if let Ok(Object::Reference(next)) = dict.get(key) {
                    stack.push(*next);
                }
            }
        }
    }

    nodes
}

fn outlines_entry(doc: &Document) -> Result<Option<ObjectId>> {
    let catalog = doc.get_dictionary(catalog_id(doc)?).map_err(map_lopdf_error)?;
    Ok(catalog
        .get(b"Outlines")
        .ok()
        .and_then(|object| object.as_reference().ok()))
}

/// Remove the whole bookmark tree from a document.
pub fn clear_bookmarks(data: &[u8]) -> Result<Vec<u8>> {
    let mut doc = load(data)?;
    let root_id = catalog_id(&doc)?;

    if let Some(outlines_id) = outlines_entry(&doc)? {
        let mut stale = vec![outlines_id];
        let first = doc
            .get_dictionary(outlines_id)
            .ok()
            .and_then(|dict| dict.get(b"First").ok())
            .and_then(|object| object.as_reference().ok());
        if let Some(first_id) = first {
            stale.extend(outline_nodes(&doc, first_id));
        }
        for id in stale {
            doc.objects.remove(&id);
        }
    }

    if let Ok(Object::Dictionary(catalog)) = doc.get_object_mut(root_id) {
        catalog.remove(b"Outlines");
    }

    save(&mut doc)
}

/// Open every bookmark node and show the outline panel when the document is
/// opened. A negative /Count marks a collapsed node; its open form is the
/// positive count.
pub fn expand_bookmarks(data: &[u8]) -> Result<Vec<u8>> {
    let mut doc = load(data)?;
    let root_id = catalog_id(&doc)?;

    let first = outlines_entry(&doc)?.and_then(|outlines_id| {
        doc.get_dictionary(outlines_id)
            .ok()
            .and_then(|dict| dict.get(b"First").ok())
            .and_then(|object| object.as_reference().ok())
    });

    if let Some(first_id) = first {
        for id in outline_nodes(&doc, first_id) {
            let count = doc
                .get_dictionary(id)
                .ok()
                .and_then(|dict| dict.get(b"Count").ok())
                .and_then(|object| object.as_i64().ok());
            if let Some(count) = count {
                if count < 0 {
                    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(id) {
                        dict.set("Count", Object::Integer(-count));
                    }
                }
            }
        }
    }

    if let Ok(Object::Dictionary(catalog)) = doc.get_object_mut(root_id) {
        catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));
    }

    save(&mut doc)
}

/// Remove the document-level embedded-files name tree.
pub fn clear_attachments(data: &[u8]) -> Result<Vec<u8>> {
    let mut doc = load(data)?;
    let root_id = catalog_id(&doc)?;

    let names = doc
        .get_dictionary(root_id)
        .map_err(map_lopdf_error)?
        .get(b"Names")
        .ok()
        .cloned();

    match names {
        Some(Object::Reference(names_id)) => {
            if let Ok(Object::Dictionary(names_dict)) = doc.get_object_mut(names_id) {
                names_dict.remove(b"EmbeddedFiles");
            }
        }
        Some(Object::Dictionary(mut names_dict)) => {
            names_dict.remove(b"EmbeddedFiles");
            if let Ok(Object::Dictionary(catalog)) = doc.get_object_mut(root_id) {
                catalog.set("Names", Object::Dictionary(names_dict));
            }
        }
        _ => {}
    }

    save(&mut doc)
}

/// Replace text on every page where the engine finds it. Returns the new
/// document bytes and the number of pages that changed.
pub fn replace_text(data: &[u8], old_text: &str, new_text: &str) -> Result<(Vec<u8>, u32)> {
    let mut doc = load(data)?;
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();

    let mut pages_changed = 0u32;
    for page_number in page_numbers {
        match doc.replace_text(page_number, old_text, new_text, None) {
            Ok(()) => pages_changed += 1,
            Err(e) => {
                tracing::debug!(page = page_number, error = %e, "no replacement on page");
            }
        }
    }

    let bytes = save(&mut doc)?;
    Ok((bytes, pages_changed))
}

/// Stamp a tiled, rotated, semi-transparent text watermark on every page.
pub fn add_text_watermark(data: &[u8], text: &str, style: &WatermarkStyle) -> Result<Vec<u8>> {
    let mut doc = load(data)?;
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

    let mut gs_dict = Dictionary::new();
    gs_dict.set("Type", Object::Name(b"ExtGState".to_vec()));
    gs_dict.set("ca", real(style.opacity));
    gs_dict.set("CA", real(style.opacity));
    let gs_id = doc.add_object(Object::Dictionary(gs_dict));

    let mut font_dict = Dictionary::new();
    font_dict.set("Type", Object::Name(b"Font".to_vec()));
    font_dict.set("Subtype", Object::Name(b"Type1".to_vec()));
    font_dict.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    let font_id = doc.add_object(Object::Dictionary(font_dict));

    for page_id in pages {
        let (width, height) = page_media_box(&doc, page_id);
        let content = watermark_content(text, width, height, style);
        let encoded = content.encode().map_err(map_lopdf_error)?;
        let stream_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), encoded)));

        append_page_content(&mut doc, page_id, stream_id)?;
        merge_page_resources(&mut doc, page_id, font_id, gs_id)?;
    }

    save(&mut doc)
}

/// Page dimensions from /MediaBox, walking the Parent chain for inherited
/// values. Falls back to US letter.
fn page_media_box(doc: &Document, page_id: ObjectId) -> (f64, f64) {
    let mut current = Some(page_id);
    let mut depth = 0;

    while let Some(id) = current {
        if depth > 16 {
            break;
        }
        depth += 1;

        let Ok(dict) = doc.get_dictionary(id) else {
            break;
        };

        if let Ok(object) = dict.get(b"MediaBox") {
            let object = match object {
                Object::Reference(r) => doc.get_object(*r).unwrap_or(object),
                other => other,
            };
            if let Object::Array(values) = object {
                let nums: Vec<f64> = values.iter().filter_map(number).collect();
                if nums.len() == 4 {
                    return ((nums[2] - nums[0]).abs(), (nums[3] - nums[1]).abs());
                }
            }
        }

        current = dict
            .get(b"Parent")
            .ok()
            .and_then(|object| object.as_reference().ok());
    }

    (612.0, 792.0)
}

fn watermark_content(text: &str, page_width: f64, page_height: f64, style: &WatermarkStyle) -> Content {
    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new("gs", vec![Object::Name(b"WmGs".to_vec())]),
        // fixed violet fill
        Operation::new("rg", vec![real(0.93), real(0.51), real(0.93)]),
    ];

    let radians = style.rotation_degrees.to_radians();
    let (sin, cos) = radians.sin_cos();

    // 2 x 3 tile grid, one stamp per cell center
    let cell_width = page_width / 2.0;
    let cell_height = page_height / 3.0;
    // Helvetica glyphs average roughly half the font size in width
    let half_width = text.chars().count() as f64 * style.font_size * 0.25;

    for row in 0..3 {
        for col in 0..2 {
            let cx = col as f64 * cell_width + cell_width / 2.0;
            let cy = row as f64 * cell_height + cell_height / 2.0;

            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![
                    real(cos),
                    real(sin),
                    real(-sin),
                    real(cos),
                    real(cx),
                    real(cy),
                ],
            ));
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(b"WmFont".to_vec()), real(style.font_size)],
            ));
            operations.push(Operation::new("Td", vec![real(-half_width), real(0.0)]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(
                    text.as_bytes().to_vec(),
                    StringFormat::Literal,
                )],
            ));
            operations.push(Operation::new("ET", vec![]));
            operations.push(Operation::new("Q", vec![]));
        }
    }

    operations.push(Operation::new("Q", vec![]));
    Content { operations }
}

fn append_page_content(doc: &mut Document, page_id: ObjectId, stream_id: ObjectId) -> Result<()> {
    let contents = doc
        .get_dictionary(page_id)
        .map_err(map_lopdf_error)?
        .get(b"Contents")
        .ok()
        .cloned();

    let new_contents = match contents {
        Some(Object::Reference(existing)) => Object::Array(vec![
            Object::Reference(existing),
            Object::Reference(stream_id),
        ]),
        Some(Object::Array(mut streams)) => {
            streams.push(Object::Reference(stream_id));
            Object::Array(streams)
        }
        _ => Object::Reference(stream_id),
    };

    if let Ok(Object::Dictionary(page_dict)) = doc.get_object_mut(page_id) {
        page_dict.set("Contents", new_contents);
    }

    Ok(())
}

fn resolved_dict(doc: &Document, object: Option<&Object>) -> Dictionary {
    match object {
        Some(Object::Dictionary(dict)) => dict.clone(),
        Some(Object::Reference(id)) => doc
            .get_dictionary(*id)
            .map(|dict| dict.clone())
            .unwrap_or_default(),
        _ => Dictionary::new(),
    }
}

/// Register the watermark font and graphics state on a page. The resolved
/// resources are written back inline so pages sharing a resources object do
/// not affect each other.
fn merge_page_resources(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    gs_id: ObjectId,
) -> Result<()> {
    let page_dict = doc.get_dictionary(page_id).map_err(map_lopdf_error)?;
    let mut resources = resolved_dict(doc, page_dict.get(b"Resources").ok());

    let mut fonts = resolved_dict(doc, resources.get(b"Font").ok());
    fonts.set("WmFont", Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let mut gstates = resolved_dict(doc, resources.get(b"ExtGState").ok());
    gstates.set("WmGs", Object::Reference(gs_id));
    resources.set("ExtGState", Object::Dictionary(gstates));

    if let Ok(Object::Dictionary(page_dict)) = doc.get_object_mut(page_id) {
        page_dict.set("Resources", Object::Dictionary(resources));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Build a small PDF with the given number of pages, each carrying an
    /// identifiable text content stream.
    fn sample_pdf(num_pages: u32) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");

        let pages_id = doc.new_object_id();
        let mut page_ids = Vec::new();

        for page_num in 0..num_pages {
            let content = format!("BT /F1 12 Tf 50 700 Td (Sample-Page-{}) Tj ET", page_num + 1);
            let content_id = doc.add_object(Object::Stream(Stream::new(
                Dictionary::new(),
                content.into_bytes(),
            )));

            let mut page_dict = Dictionary::new();
            page_dict.set("Type", Object::Name(b"Page".to_vec()));
            page_dict.set("Parent", Object::Reference(pages_id));
            page_dict.set("Contents", Object::Reference(content_id));
            page_dict.set(
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            );
            let page_id = doc.add_object(Object::Dictionary(page_dict));
            page_ids.push(Object::Reference(page_id));
        }

        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set("Count", Object::Integer(num_pages as i64));
        pages_dict.set("Kids", Object::Array(page_ids));
        doc.objects
            .insert(pages_id, Object::Dictionary(pages_dict));

        let mut catalog_dict = Dictionary::new();
        catalog_dict.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog_dict.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(Object::Dictionary(catalog_dict));

        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    /// Same as `sample_pdf` but with a two-entry outline tree, the second
    /// entry collapsed.
    fn sample_pdf_with_outline() -> Vec<u8> {
        let data = sample_pdf(2);
        let mut doc = Document::load_mem(&data).unwrap();

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let outlines_id = doc.new_object_id();

        let mut first = Dictionary::new();
        first.set("Title", Object::string_literal("Chapter 1"));
        first.set("Parent", Object::Reference(outlines_id));
        first.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(pages[0]),
                Object::Name(b"Fit".to_vec()),
            ]),
        );
        let first_id = doc.add_object(Object::Dictionary(first));

        let mut second = Dictionary::new();
        second.set("Title", Object::string_literal("Chapter 2"));
        second.set("Parent", Object::Reference(outlines_id));
        second.set("Prev", Object::Reference(first_id));
        second.set("Count", Object::Integer(-1));
        let second_id = doc.add_object(Object::Dictionary(second));

        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(first_id) {
            dict.set("Next", Object::Reference(second_id));
        }

        let mut outlines = Dictionary::new();
        outlines.set("Type", Object::Name(b"Outlines".to_vec()));
        outlines.set("First", Object::Reference(first_id));
        outlines.set("Last", Object::Reference(second_id));
        outlines.set("Count", Object::Integer(2));
        doc.objects
            .insert(outlines_id, Object::Dictionary(outlines));

        let root_id = catalog_id(&doc).unwrap();
        if let Ok(Object::Dictionary(catalog)) = doc.get_object_mut(root_id) {
            catalog.set("Outlines", Object::Reference(outlines_id));
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_new_blank_document_has_one_page() {
        let data = new_blank_document().unwrap();
        let doc = Document::load_mem(&data).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_clear_bookmarks_removes_outline_tree() {
        let data = sample_pdf_with_outline();
        let cleared = clear_bookmarks(&data).unwrap();

        let doc = Document::load_mem(&cleared).unwrap();
        let catalog = doc.get_dictionary(catalog_id(&doc).unwrap()).unwrap();
        assert!(catalog.get(b"Outlines").is_err());
        // page count untouched
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_clear_bookmarks_without_outline_is_noop() {
        let data = sample_pdf(1);
        let cleared = clear_bookmarks(&data).unwrap();

        let doc = Document::load_mem(&cleared).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_expand_bookmarks_opens_nodes_and_sets_page_mode() {
        let data = sample_pdf_with_outline();
        let expanded = expand_bookmarks(&data).unwrap();

        let doc = Document::load_mem(&expanded).unwrap();
        let catalog = doc.get_dictionary(catalog_id(&doc).unwrap()).unwrap();
        let mode = catalog.get(b"PageMode").unwrap();
        assert_eq!(mode, &Object::Name(b"UseOutlines".to_vec()));

        let outlines_id = catalog.get(b"Outlines").unwrap().as_reference().unwrap();
        let first_id = doc
            .get_dictionary(outlines_id)
            .unwrap()
            .get(b"First")
            .unwrap()
            .as_reference()
            .unwrap();
        for id in outline_nodes(&doc, first_id) {
            if let Ok(count) = doc.get_dictionary(id).unwrap().get(b"Count") {
                assert!(count.as_i64().unwrap() > 0);
            }
        }
    }

    #[test]
    fn test_clear_attachments_drops_embedded_files_tree() {
        let data = sample_pdf(1);
        let mut doc = Document::load_mem(&data).unwrap();

        let mut names = Dictionary::new();
        let mut embedded = Dictionary::new();
        embedded.set("Names", Object::Array(vec![]));
        names.set("EmbeddedFiles", Object::Dictionary(embedded));
        let names_id = doc.add_object(Object::Dictionary(names));

        let root_id = catalog_id(&doc).unwrap();
        if let Ok(Object::Dictionary(catalog)) = doc.get_object_mut(root_id) {
            catalog.set("Names", Object::Reference(names_id));
        }

        let mut with_attachment = Vec::new();
        doc.save_to(&mut with_attachment).unwrap();

        let cleared = clear_attachments(&with_attachment).unwrap();
        let doc = Document::load_mem(&cleared).unwrap();
        let catalog = doc.get_dictionary(catalog_id(&doc).unwrap()).unwrap();
        let names_id = catalog.get(b"Names").unwrap().as_reference().unwrap();
        assert!(doc
            .get_dictionary(names_id)
            .unwrap()
            .get(b"EmbeddedFiles")
            .is_err());
    }

    #[test]
    fn test_watermark_appends_content_and_resources() {
        let data = sample_pdf(2);
        let marked = add_text_watermark(&data, "CONFIDENTIAL", &WatermarkStyle::default()).unwrap();

        let doc = Document::load_mem(&marked).unwrap();
        assert_eq!(doc.get_pages().len(), 2);

        for (_, page_id) in doc.get_pages() {
            let page = doc.get_dictionary(page_id).unwrap();

            let contents = page.get(b"Contents").unwrap();
            match contents {
                Object::Array(streams) => assert_eq!(streams.len(), 2),
                other => panic!("expected content array, got {:?}", other),
            }

            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
            let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
            assert!(fonts.get(b"WmFont").is_ok());
            let gstates = resources.get(b"ExtGState").unwrap().as_dict().unwrap();
            assert!(gstates.get(b"WmGs").is_ok());
        }
    }

    #[test]
    fn test_watermark_content_tiles_and_rotates() {
        let content = watermark_content("DRAFT", 612.0, 792.0, &WatermarkStyle::default());
        let stamps = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .count();
        assert_eq!(stamps, 6);
        let rotations = content
            .operations
            .iter()
            .filter(|op| op.operator == "cm")
            .count();
        assert_eq!(rotations, 6);
    }

    #[test]
    fn test_replace_text_keeps_page_count() {
        let data = sample_pdf(2);
        let (replaced, _pages_changed) = replace_text(&data, "Sample-Page-1", "Edited").unwrap();

        let doc = Document::load_mem(&replaced).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_page_media_box_inherited_default() {
        let data = sample_pdf(1);
        let doc = Document::load_mem(&data).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        assert_eq!(page_media_box(&doc, page_id), (612.0, 792.0));
    }
}
