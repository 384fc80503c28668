//! Overlay of the text layer onto the stripped document.
//!
//! Each text page becomes a Form XObject drawn on top of the stripped page
//! with the same index. The graphics state of the original content is
//! isolated with `q`/`Q` so it cannot leak into the overlay.

use std::collections::HashSet;

use lopdf::content::Operation;
use lopdf::{dictionary, Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::parser::resolve;
use crate::render::compressed_stream;

use super::encode_operations;

/// Resource name of the overlay form on merged pages.
pub const TEXT_LAYER_NAME: &str = "TxLn";

/// Outcome of a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Pages present in both documents
    pub pages_merged: usize,
    /// Text pages appended because the base document had no such page
    pub pages_appended: usize,
}

/// One page of the text layer, detached from its document.
struct LayerPage {
    content: Vec<u8>,
    resources: Object,
    media_box: Object,
}

/// Merge `layer` over `base`, page by page.
///
/// The result has as many pages as the longer of the two documents. A page
/// missing from the layer leaves the base page unchanged.
pub fn merge_text_layer(base: &mut LopdfDocument, mut layer: LopdfDocument) -> Result<MergeReport> {
    layer.renumber_objects_with(base.max_id + 1);

    let mut skip = HashSet::new();
    let mut layer_pages = Vec::new();
    for (index, page_id) in layer.get_pages().into_values().enumerate() {
        let dict = layer
            .get_dictionary(page_id)
            .map_err(|e| Error::composition(index, e.to_string()))?;
        let content = layer
            .get_page_content(page_id)
            .map_err(|e| Error::composition(index, e.to_string()))?;
        if let Ok(contents) = dict.get(b"Contents") {
            collect_refs(contents, &mut skip);
        }
        layer_pages.push(LayerPage {
            content,
            resources: Object::Dictionary(effective_resources(&layer, page_id)),
            media_box: dict
                .get(b"MediaBox")
                .map(|o| resolve(&layer, o).clone())
                .unwrap_or_else(|_| letter_box()),
        });
    }

    for (id, object) in std::mem::take(&mut layer.objects) {
        if skip.contains(&id) {
            continue;
        }
        match object.type_name().unwrap_or("") {
            "Catalog" | "Pages" | "Page" => {}
            _ => {
                base.objects.insert(id, object);
            }
        }
    }
    base.max_id = base.max_id.max(layer.max_id);

    let base_pages: Vec<ObjectId> = base.get_pages().into_values().collect();
    let mut report = MergeReport::default();
    for (index, page) in layer_pages.into_iter().enumerate() {
        let form_id = base.add_object(compressed_stream(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => page.media_box.clone(),
                "Resources" => page.resources,
            },
            &page.content,
        ));
        match base_pages.get(index) {
            Some(&page_id) => {
                overlay_form(base, page_id, form_id).map_err(|e| Error::composition(index, e.to_string()))?;
                report.pages_merged += 1;
            }
            None => {
                append_page(base, form_id, page.media_box)
                    .map_err(|e| Error::composition(index, e.to_string()))?;
                report.pages_appended += 1;
            }
        }
    }

    log::info!(
        "Merged text layer: {} pages overlaid, {} appended",
        report.pages_merged,
        report.pages_appended
    );
    Ok(report)
}

fn collect_refs(obj: &Object, ids: &mut HashSet<ObjectId>) {
    match obj {
        Object::Reference(id) => {
            ids.insert(*id);
        }
        Object::Array(items) => items.iter().for_each(|o| collect_refs(o, ids)),
        _ => {}
    }
}

fn letter_box() -> Object {
    Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()])
}

fn draw_form_ops(name: &str) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

fn content_stream(doc: &mut LopdfDocument, operations: Vec<Operation>) -> Result<ObjectId> {
    let data = encode_operations(operations)?;
    Ok(doc.add_object(compressed_stream(Dictionary::new(), &data)))
}

/// Resources in effect for a page, following `/Parent` inheritance.
fn effective_resources(doc: &LopdfDocument, page_id: ObjectId) -> Dictionary {
    let mut seen = HashSet::new();
    let mut current = page_id;
    while seen.insert(current) {
        let Ok(dict) = doc.get_dictionary(current) else {
            break;
        };
        if let Ok(resources) = dict.get(b"Resources") {
            return resolve(doc, resources).as_dict().cloned().unwrap_or_default();
        }
        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => current = parent,
            Err(_) => break,
        }
    }
    Dictionary::new()
}

/// A name not yet used in `xobjects`, starting with `base`.
fn unique_name(xobjects: &Dictionary, base: &str) -> String {
    let mut name = base.to_string();
    let mut n = 1;
    while xobjects.has(name.as_bytes()) {
        name = format!("{}{}", base, n);
        n += 1;
    }
    name
}

fn overlay_form(doc: &mut LopdfDocument, page_id: ObjectId, form_id: ObjectId) -> Result<()> {
    let mut resources = effective_resources(doc, page_id);
    let mut xobjects = resources
        .get(b"XObject")
        .map(|o| resolve(doc, o).as_dict().cloned().unwrap_or_default())
        .unwrap_or_default();
    let name = unique_name(&xobjects, TEXT_LAYER_NAME);
    xobjects.set(name.as_bytes().to_vec(), form_id);
    resources.set("XObject", xobjects);

    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(obj) => match resolve(doc, obj) {
            Object::Array(items) => items.clone(),
            _ => vec![obj.clone()],
        },
        Err(_) => Vec::new(),
    };

    let open_id = content_stream(doc, vec![Operation::new("q", vec![])])?;
    let mut overlay = vec![Operation::new("Q", vec![])];
    overlay.extend(draw_form_ops(&name));
    let overlay_id = content_stream(doc, overlay)?;

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(overlay_id));

    let page = doc.get_dictionary_mut(page_id)?;
    page.set("Resources", resources);
    page.set("Contents", contents);
    Ok(())
}

fn append_page(doc: &mut LopdfDocument, form_id: ObjectId, media_box: Object) -> Result<()> {
    let pages_id = doc
        .catalog()?
        .get(b"Pages")
        .and_then(Object::as_reference)?;
    let content_id = content_stream(doc, draw_form_ops(TEXT_LAYER_NAME))?;
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => media_box,
        "Resources" => dictionary! {
            "XObject" => dictionary! { TEXT_LAYER_NAME => form_id },
        },
        "Contents" => content_id,
    });

    let pages = doc.get_dictionary_mut(pages_id)?;
    let mut kids = pages
        .get(b"Kids")
        .and_then(Object::as_array)
        .cloned()
        .unwrap_or_default();
    kids.push(Object::Reference(page_id));
    let count = kids.len() as i64;
    pages.set("Kids", kids);
    pages.set("Count", count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use lopdf::content::Content;

    use super::*;

    /// Document with one page per content string, sharing inherited
    /// resources and media box.
    fn doc_with_pages(contents: &[&str]) -> LopdfDocument {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for content in contents {
            let content_id = doc.add_object(lopdf::Stream::new(
                Dictionary::new(),
                format!("{}\n", content).into_bytes(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_overlay_on_existing_page() {
        let mut base = doc_with_pages(&["0 0 m 100 100 l S"]);
        let layer = doc_with_pages(&["BT /F1 12 Tf 72 700 Td (Hola) Tj ET"]);

        let report = merge_text_layer(&mut base, layer).unwrap();
        assert_eq!(report.pages_merged, 1);
        assert_eq!(report.pages_appended, 0);

        let pages = base.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = pages[&1];
        let content = base.get_page_content(page_id).unwrap();
        let ops = Content::decode(&content).unwrap().operations;
        let names: Vec<&str> = ops.iter().map(|o| o.operator.as_str()).collect();
        assert_eq!(names, vec!["q", "m", "l", "S", "Q", "q", "Do", "Q"]);

        let resources = effective_resources(&base, page_id);
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        let form_id = xobjects.get(b"TxLn").unwrap().as_reference().unwrap();
        let form = base.get_object(form_id).unwrap().as_stream().unwrap();
        assert_eq!(form.dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Form");
        // Inherited fonts stay available to the original content.
        assert!(resources.has(b"Font"));
    }

    #[test]
    fn test_layer_with_more_pages_appends() {
        let mut base = doc_with_pages(&["0 0 m 100 100 l S"]);
        let layer = doc_with_pages(&[
            "BT /F1 12 Tf 72 700 Td (One) Tj ET",
            "BT /F1 12 Tf 72 700 Td (Two) Tj ET",
        ]);

        let report = merge_text_layer(&mut base, layer).unwrap();
        assert_eq!(report.pages_merged, 1);
        assert_eq!(report.pages_appended, 1);
        let pages = base.get_pages();
        assert_eq!(pages.len(), 2);
        let appended = base.get_dictionary(pages[&2]).unwrap();
        assert_eq!(appended.get(b"MediaBox").unwrap().as_array().unwrap().len(), 4);
        let content = base.get_page_content(pages[&2]).unwrap();
        let ops = Content::decode(&content).unwrap().operations;
        assert_eq!(ops[1].operator, "Do");
    }

    #[test]
    fn test_base_with_more_pages_kept() {
        let mut base = doc_with_pages(&["0 0 m 10 10 l S", "0 0 m 20 20 l S"]);
        let layer = doc_with_pages(&["BT /F1 12 Tf 72 700 Td (One) Tj ET"]);

        let report = merge_text_layer(&mut base, layer).unwrap();
        assert_eq!(report.pages_merged, 1);
        let pages = base.get_pages();
        assert_eq!(pages.len(), 2);
        let second = base.get_page_content(pages[&2]).unwrap();
        assert!(!String::from_utf8_lossy(&second).contains("Do"));
    }

    #[test]
    fn test_unique_name() {
        let mut xobjects = Dictionary::new();
        assert_eq!(unique_name(&xobjects, "TxLn"), "TxLn");
        xobjects.set("TxLn", Object::Null);
        assert_eq!(unique_name(&xobjects, "TxLn"), "TxLn1");
    }
}
