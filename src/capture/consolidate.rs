//! Consolidation of a case's captured documents into one PDF.
//!
//! Pages keep their source order: primary snapshot first, then each
//! secondary in discovery order. A merge failure degrades to the first
//! document rather than losing the capture.

use anyhow::{bail, Context, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use tracing::warn;

/// Consolidate documents into a single PDF, `documents` given in their
/// intended page order.
///
/// No documents means nothing to consolidate. A single document is passed
/// through byte-for-byte. Multiple documents are merged; if merging fails
/// the first document stands in for the set.
pub fn consolidate(documents: &[&[u8]]) -> Option<Vec<u8>> {
    match documents {
        [] => None,
        [only] => Some(only.to_vec()),
        many => match merge_pdfs(many) {
            Ok(merged) => Some(merged),
            Err(e) => {
                warn!("PDF merge failed, keeping first document only: {e:#}");
                Some(many[0].to_vec())
            }
        },
    }
}

/// Page attributes a PDF page may inherit from its page-tree ancestors.
/// Re-parenting a page severs that chain, so these are copied down onto
/// the page itself before the merge.
const INHERITABLE_KEYS: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Merge PDFs by concatenating their pages in input order.
///
/// Every source page is re-parented under one fresh page-tree root that
/// carries only `Type`/`Kids`/`Count`. Source Pages nodes are never
/// key-merged: their per-document attributes (Resources in particular)
/// are dictionaries that cannot be combined, only inherited downward.
fn merge_pdfs(inputs: &[&[u8]]) -> Result<Vec<u8>> {
    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut merged = Document::with_version("1.5");

    for (index, bytes) in inputs.iter().enumerate() {
        let mut doc = Document::load_mem(bytes)
            .with_context(|| format!("failed to parse document {index}"))?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        // get_pages is keyed by page number, so iteration preserves the
        // document's own page order.
        for page_id in doc.get_pages().into_values() {
            let mut page_dict = doc
                .get_object(page_id)
                .and_then(Object::as_dict)
                .map_err(|e| anyhow::anyhow!("bad page object in document {index}: {e}"))?
                .clone();
            for key in INHERITABLE_KEYS {
                if !page_dict.has(key) {
                    if let Some(value) = inherited_attr(&doc, page_id, key) {
                        page_dict.set(*key, value);
                    }
                }
            }
            pages.push((page_id, page_dict));
        }

        // Carry everything except page-tree structure; the merged tree is
        // rebuilt from scratch below.
        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                _ => {
                    merged.objects.insert(object_id, object);
                }
            }
        }
    }

    if pages.is_empty() {
        bail!("no pages found in any input");
    }

    let pages_id = (max_id, 0);
    let catalog_id = (max_id + 1, 0);

    for (page_id, mut page_dict) in pages.iter().cloned() {
        page_dict.set("Parent", pages_id);
        merged
            .objects
            .insert(page_id, Object::Dictionary(page_dict));
    }

    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => pages.len() as i64,
            "Kids" => pages
                .iter()
                .map(|(id, _)| Object::Reference(*id))
                .collect::<Vec<_>>(),
        }),
    );
    merged.objects.insert(
        catalog_id,
        Object::Dictionary(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        }),
    );

    merged.trailer.set("Root", catalog_id);
    merged.max_id = catalog_id.0;
    merged.renumber_objects();
    merged.compress();

    let mut out = Vec::new();
    merged
        .save_to(&mut out)
        .context("failed to serialize merged document")?;
    Ok(out)
}

/// Look up an inheritable page attribute by walking the Parent chain.
fn inherited_attr(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_object(page_id).and_then(Object::as_dict).ok()?;
    loop {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent_id = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_object(parent_id).and_then(Object::as_dict).ok()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::Stream;

    /// Minimal one-page PDF showing `text`. Resources live on the Pages
    /// node, not the page, so the page relies on inheritance the way
    /// real-world generators often do.
    fn make_pdf(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 48.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_no_documents_is_none() {
        assert_eq!(consolidate(&[]), None);
    }

    #[test]
    fn test_single_document_passes_through_unchanged() {
        let pdf = make_pdf("only");
        let out = consolidate(&[&pdf]).unwrap();
        assert_eq!(out, pdf);
    }

    #[test]
    fn test_merge_keeps_page_order() {
        let a = make_pdf("AAAA");
        let b = make_pdf("BBBB");
        let c = make_pdf("CCCC");
        let out = consolidate(&[&a, &b, &c]).unwrap();

        let merged = Document::load_mem(&out).unwrap();
        assert_eq!(merged.get_pages().len(), 3);
        assert!(merged.extract_text(&[1]).unwrap().contains("AAAA"));
        assert!(merged.extract_text(&[2]).unwrap().contains("BBBB"));
        assert!(merged.extract_text(&[3]).unwrap().contains("CCCC"));
    }

    #[test]
    fn test_merged_pages_keep_their_own_resources() {
        // Each source declares its font on its Pages node; after the
        // merge every page must still resolve a dictionary-valued
        // Resources with that font, and the rebuilt root must hold no
        // leftover per-source attributes.
        let out = consolidate(&[&make_pdf("one"), &make_pdf("two")]).unwrap();
        let merged = Document::load_mem(&out).unwrap();

        for (_, page_id) in merged.get_pages() {
            let page = merged.get_object(page_id).unwrap().as_dict().unwrap();
            let resources = match page.get(b"Resources").unwrap() {
                Object::Reference(id) => merged.get_object(*id).unwrap().as_dict().unwrap(),
                Object::Dictionary(dict) => dict,
                other => panic!("Resources must be a dictionary, got {other:?}"),
            };
            assert!(resources.has(b"Font"));
        }

        let root_id = merged.trailer.get(b"Root").unwrap().as_reference().unwrap();
        let catalog = merged.get_object(root_id).unwrap().as_dict().unwrap();
        let pages_id = catalog.get(b"Pages").unwrap().as_reference().unwrap();
        let pages_root = merged.get_object(pages_id).unwrap().as_dict().unwrap();
        assert!(!pages_root.has(b"Resources"));
        assert_eq!(pages_root.len(), 3); // Type, Kids, Count
    }

    #[test]
    fn test_unparseable_input_degrades_to_first() {
        let a = make_pdf("good");
        let garbage = b"this is not a pdf at all".to_vec();
        let out = consolidate(&[&a, &garbage]).unwrap();
        assert_eq!(out, a);
    }
}
