//! Text layer output with an embedded TrueType font.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Document, Object};
use transpdf::render::TextLayerBuilder;
use transpdf::{BBox, DocumentInfo, FontRegistry, PageInfo, RenderOptions, TextElement};

const SALAM: &str = "\u{0633}\u{0644}\u{0627}\u{0645}";

fn registry() -> FontRegistry {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");
    let mut registry = FontRegistry::default();
    registry.register("DejaVuSans", path).unwrap();
    registry
}

fn translated(translation: &str, top: f32) -> TextElement {
    let mut element = TextElement::new(
        "source",
        0,
        BBox::new(72.0, top, 400.0, top + 30.0),
        "Helvetica",
        12.0,
    );
    element.set_translation(translation);
    element
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap(),
        other => other,
    }
}

/// Parse the bfchar entries of a ToUnicode CMap.
fn parse_to_unicode(cmap: &str) -> BTreeMap<u16, String> {
    let mut map = BTreeMap::new();
    for line in cmap.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 2 || !parts[0].starts_with('<') || !parts[1].starts_with('<') {
            continue;
        }
        let gid = u16::from_str_radix(parts[0].trim_matches(|c| c == '<' || c == '>'), 16).unwrap();
        let hex = parts[1].trim_matches(|c| c == '<' || c == '>');
        let units: Vec<u16> = (0..hex.len())
            .step_by(4)
            .map(|i| u16::from_str_radix(&hex[i..i + 4], 16).unwrap())
            .collect();
        map.insert(gid, String::from_utf16(&units).unwrap());
    }
    map
}

/// Glyph ids shown by each text operator of a page, in drawing order.
fn shown_glyph_runs(doc: &Document, page: u32) -> Vec<Vec<u16>> {
    let pages = doc.get_pages();
    let content = doc.get_page_content(pages[&page]).unwrap();
    let mut runs = Vec::new();
    for op in Content::decode(&content).unwrap().operations {
        let strings: Vec<&[u8]> = match op.operator.as_str() {
            "Tj" => op.operands.iter().filter_map(|o| o.as_str().ok()).collect(),
            "TJ" => op.operands[0]
                .as_array()
                .unwrap()
                .iter()
                .filter_map(|o| o.as_str().ok())
                .collect(),
            _ => continue,
        };
        let gids = strings
            .iter()
            .flat_map(|bytes| bytes.chunks(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]])))
            .collect();
        runs.push(gids);
    }
    runs
}

#[test]
fn test_registered_font_embedded_as_type0() {
    let registry = registry();
    let options = RenderOptions::default();
    let info = DocumentInfo::new(vec![PageInfo::letter()]);
    let layer = TextLayerBuilder::new(&registry, &options)
        .build(&info, &[translated("Hello", 100.0), translated(SALAM, 200.0)])
        .unwrap();
    assert_eq!(layer.elements_drawn, 2);

    let doc = &layer.document;
    let pages = doc.get_pages();
    let page = doc.get_dictionary(pages[&1]).unwrap();
    let resources = resolve(doc, page.get(b"Resources").unwrap()).as_dict().unwrap();
    let fonts = resolve(doc, resources.get(b"Font").unwrap()).as_dict().unwrap();
    assert!(!fonts.has(b"FHelv"));
    let font = resolve(doc, fonts.get(b"F1").unwrap()).as_dict().unwrap();

    assert_eq!(font.get(b"Subtype").unwrap().as_name().unwrap(), b"Type0");
    assert_eq!(font.get(b"Encoding").unwrap().as_name().unwrap(), b"Identity-H");

    let descendants = font.get(b"DescendantFonts").unwrap().as_array().unwrap();
    let cid_font = resolve(doc, &descendants[0]).as_dict().unwrap();
    assert_eq!(cid_font.get(b"Subtype").unwrap().as_name().unwrap(), b"CIDFontType2");
    assert_eq!(cid_font.get(b"CIDToGIDMap").unwrap().as_name().unwrap(), b"Identity");
    let widths = cid_font.get(b"W").unwrap().as_array().unwrap();
    assert!(!widths.is_empty());
    assert_eq!(widths.len() % 2, 0);

    let descriptor = resolve(doc, cid_font.get(b"FontDescriptor").unwrap()).as_dict().unwrap();
    let font_file = resolve(doc, descriptor.get(b"FontFile2").unwrap()).as_stream().unwrap();
    assert!(font_file.dict.has(b"Length1"));
}

#[test]
fn test_to_unicode_round_trips_shown_glyphs() {
    let registry = registry();
    let options = RenderOptions::default();
    let info = DocumentInfo::new(vec![PageInfo::letter()]);
    let layer = TextLayerBuilder::new(&registry, &options)
        .build(&info, &[translated("Hello", 100.0), translated(SALAM, 200.0)])
        .unwrap();

    let doc = &layer.document;
    let pages = doc.get_pages();
    let page = doc.get_dictionary(pages[&1]).unwrap();
    let resources = resolve(doc, page.get(b"Resources").unwrap()).as_dict().unwrap();
    let fonts = resolve(doc, resources.get(b"Font").unwrap()).as_dict().unwrap();
    let font = resolve(doc, fonts.get(b"F1").unwrap()).as_dict().unwrap();
    let cmap_stream = resolve(doc, font.get(b"ToUnicode").unwrap()).as_stream().unwrap();
    let cmap_bytes = cmap_stream
        .decompressed_content()
        .unwrap_or_else(|_| cmap_stream.content.clone());
    let to_unicode = parse_to_unicode(&String::from_utf8(cmap_bytes).unwrap());

    let runs = shown_glyph_runs(doc, 1);
    assert_eq!(runs.len(), 2);
    let decode = |gids: &[u16]| -> Vec<String> {
        gids.iter()
            .map(|gid| to_unicode.get(gid).cloned().unwrap_or_default())
            .collect()
    };

    assert_eq!(decode(&runs[0]).concat(), "Hello");
    // Right-to-left glyphs are drawn in visual order
    let mut persian = decode(&runs[1]);
    persian.reverse();
    assert_eq!(persian.concat(), SALAM);
}
