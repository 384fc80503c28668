//! Fixture PDFs built in memory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// What to put on a fixture page.
pub struct FixturePage {
    /// `(x, baseline, size, text)` runs in Helvetica
    pub texts: Vec<(f32, f32, f32, &'static str)>,
    /// Draw the 2x2 image at this `(x, y, size)`
    pub image: Option<(f32, f32, f32)>,
    /// Annotation subtypes to attach
    pub annotations: Vec<&'static str>,
}

impl FixturePage {
    pub fn blank() -> Self {
        Self {
            texts: Vec::new(),
            image: None,
            annotations: Vec::new(),
        }
    }

    pub fn text(x: f32, baseline: f32, size: f32, text: &'static str) -> Self {
        Self::blank().with_text(x, baseline, size, text)
    }

    pub fn with_text(mut self, x: f32, baseline: f32, size: f32, text: &'static str) -> Self {
        self.texts.push((x, baseline, size, text));
        self
    }

    pub fn with_image(mut self, x: f32, y: f32, size: f32) -> Self {
        self.image = Some((x, y, size));
        self
    }

    pub fn with_annotation(mut self, subtype: &'static str) -> Self {
        self.annotations.push(subtype);
        self
    }
}

fn annotation(doc: &mut Document, subtype: &str) -> ObjectId {
    let mut dict = dictionary! {
        "Type" => "Annot",
        "Subtype" => subtype,
        "Rect" => vec![100.into(), 100.into(), 200.into(), 120.into()],
    };
    if subtype == "Link" {
        dict.set(
            "A",
            dictionary! {
                "S" => "URI",
                "URI" => Object::string_literal("https://example.com"),
            },
        );
    }
    doc.add_object(dict)
}

/// A US Letter document with one page per fixture page. Every page shares one
/// resource dictionary holding Helvetica as `/F1` and a 2x2 gray image as
/// `/Im1`.
pub fn build_pdf(pages: &[FixturePage]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 2,
            "Height" => 2,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0, 255, 255, 0],
    ));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
        "XObject" => dictionary! { "Im1" => image_id },
    });

    let mut kids = Vec::new();
    for page_fixture in pages {
        let mut operations = Vec::new();
        for &(x, baseline, size, text) in &page_fixture.texts {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), size.into()]),
                Operation::new("Td", vec![x.into(), baseline.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ]);
        }
        if let Some((x, y, size)) = page_fixture.image {
            operations.extend([
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![size.into(), 0.into(), 0.into(), size.into(), x.into(), y.into()],
                ),
                Operation::new("Do", vec!["Im1".into()]),
                Operation::new("Q", vec![]),
            ]);
        }
        let content = Content { operations }.encode().unwrap();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));

        let annots: Vec<Object> = page_fixture
            .annotations
            .iter()
            .map(|subtype| Object::Reference(annotation(&mut doc, subtype)))
            .collect();

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        };
        if !annots.is_empty() {
            page.set("Annots", annots);
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Sample Paper"),
        "Author" => Object::string_literal("A. Writer"),
    });
    doc.trailer.set("Info", info_id);
    doc
}

pub fn to_bytes(doc: &mut Document) -> Vec<u8> {
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Save `doc` as `dir/name` and return the path.
pub fn write_pdf(dir: &Path, name: &str, doc: &mut Document) -> PathBuf {
    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

/// Operators of a page's own content streams, forms not expanded.
pub fn page_operators(doc: &Document, page: u32) -> Vec<String> {
    let pages = doc.get_pages();
    let content = doc.get_page_content(pages[&page]).unwrap();
    Content::decode(&content)
        .unwrap()
        .operations
        .into_iter()
        .map(|op| op.operator)
        .collect()
}

/// All text of a merged page's text layer, lines joined by spaces.
pub fn text_layer_text(doc: &Document, page: u32) -> String {
    text_layer_strings(doc, page).join(" ")
}

/// Text shown inside the text layer form of a merged page, one entry per
/// drawn line.
pub fn text_layer_strings(doc: &Document, page: u32) -> Vec<String> {
    let pages = doc.get_pages();
    let page = doc.get_dictionary(pages[&page]).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let form_id = xobjects.get(b"TxLn").unwrap().as_reference().unwrap();
    let form = doc.get_object(form_id).unwrap().as_stream().unwrap();
    let data = form.decompressed_content().unwrap_or_else(|_| form.content.clone());
    Content::decode(&data)
        .unwrap()
        .operations
        .into_iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| {
            op.operands
                .first()
                .and_then(|o| o.as_str().ok())
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        })
        .collect()
}
