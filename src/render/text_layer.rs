//! Text-only PDF layer built from fitted elements.
//!
//! Produces a separate document with one page per source page, holding
//! nothing but the translated text. Registered fonts are embedded as
//! Type0/CIDFontType2 fonts keyed by glyph id; without registered fonts
//! the built-in Helvetica is used.

use std::collections::BTreeMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document as LopdfDocument, Object, ObjectId, Stream, StringFormat};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::font::{FontChoice, FontFace, FontRegistry, BUILTIN_FONT};
use crate::model::{Color, DocumentInfo, TextElement};

use super::fitter::{RenderedLine, TextFitter};
use super::options::RenderOptions;

/// Resource name of the built-in font.
const BUILTIN_RESOURCE: &str = "FHelv";

/// A generated text layer.
pub struct TextLayer {
    pub document: LopdfDocument,
    /// Elements that produced at least one line
    pub elements_drawn: usize,
}

/// Glyphs used from one registered font.
#[derive(Debug, Default)]
struct UsedFont {
    resource: String,
    /// gid → (advance in font units, text it stands for)
    glyphs: BTreeMap<u16, (u16, String)>,
}

/// Fonts referenced while drawing.
#[derive(Debug, Default)]
struct FontUsage {
    registered: BTreeMap<String, UsedFont>,
    builtin: bool,
}

impl FontUsage {
    fn resource_for(&mut self, choice: &FontChoice<'_>) -> String {
        match choice {
            FontChoice::Builtin => {
                self.builtin = true;
                BUILTIN_RESOURCE.to_string()
            }
            FontChoice::Registered(name) => {
                let next = self.registered.len() + 1;
                self.registered
                    .entry(name.to_string())
                    .or_insert_with(|| UsedFont {
                        resource: format!("F{}", next),
                        glyphs: BTreeMap::new(),
                    })
                    .resource
                    .clone()
            }
        }
    }
}

/// Builds the text layer document.
pub struct TextLayerBuilder<'a> {
    registry: &'a FontRegistry,
    options: &'a RenderOptions,
}

impl<'a> TextLayerBuilder<'a> {
    pub fn new(registry: &'a FontRegistry, options: &'a RenderOptions) -> Self {
        Self { registry, options }
    }

    /// Draw every element with text to show onto a page of its own index.
    pub fn build(&self, info: &DocumentInfo, elements: &[TextElement]) -> Result<TextLayer> {
        let mut usage = FontUsage::default();
        let mut contents: Vec<Vec<Operation>> = vec![Vec::new(); info.page_count()];
        let mut elements_drawn = 0;

        for element in elements {
            let Some(text) = element.display_text(self.options.partial) else {
                continue;
            };
            let (Some(page), Some(ops)) = (
                info.page(element.page_index),
                contents.get_mut(element.page_index),
            ) else {
                log::warn!(
                    "Element on page {} beyond the document's {} pages, skipped",
                    element.page_index + 1,
                    info.page_count()
                );
                continue;
            };

            let choice = self.registry.choose(&element.font_name, element.font_size);
            if matches!(choice, FontChoice::Builtin) && crate::script::contains_rtl_chars(text) {
                log::warn!("No registered font for right-to-left text, using {}", BUILTIN_FONT);
            }
            let fitter = TextFitter::new(self.registry, self.options);
            let lines = fitter.layout(element, text, choice.name(), page);
            if lines.is_empty() {
                continue;
            }

            let color = self
                .options
                .text_color
                .or(element.color)
                .unwrap_or(Color::BLACK);
            let resource = usage.resource_for(&choice);
            for line in &lines {
                let show = self.show_line(&choice, line, &mut usage);
                ops.extend(draw_line(&resource, line, color, show));
            }
            elements_drawn += 1;
        }

        let document = self.assemble(info, contents, &usage)?;
        log::info!(
            "Text layer: {} elements on {} pages",
            elements_drawn,
            info.page_count()
        );
        Ok(TextLayer {
            document,
            elements_drawn,
        })
    }

    /// Text-showing operator for a line: a `TJ` glyph run shaped with a
    /// registered font, or a `Tj` of WinAnsi bytes for the built-in font.
    fn show_line(&self, choice: &FontChoice<'_>, line: &RenderedLine, usage: &mut FontUsage) -> Operation {
        let FontChoice::Registered(name) = choice else {
            let bytes = line.text.chars().map(winansi_byte).collect();
            return Operation::new("Tj", vec![Object::String(bytes, StringFormat::Hexadecimal)]);
        };
        let (Some(face), Some(used)) = (self.registry.get(name), usage.registered.get_mut(*name)) else {
            return Operation::new("Tj", vec![Object::String(Vec::new(), StringFormat::Hexadecimal)]);
        };

        let Some(glyphs) = face.shape(&line.logical) else {
            log::debug!("Cannot shape with {}, drawing glyphs one per char", name);
            let mut bytes = Vec::with_capacity(line.text.len() * 2);
            for (c, glyph) in face.glyphs(&line.text) {
                let (gid, advance) = glyph.unwrap_or((0, 0));
                bytes.extend_from_slice(&gid.to_be_bytes());
                if gid != 0 {
                    used.glyphs
                        .entry(gid)
                        .or_insert_with(|| (advance, c.to_string().nfkc().collect()));
                }
            }
            return Operation::new("Tj", vec![Object::String(bytes, StringFormat::Hexadecimal)]);
        };

        let upem = f32::from(face.units_per_em().max(1));
        let mut parts = Vec::new();
        let mut segment = Vec::with_capacity(glyphs.len() * 2);
        for glyph in glyphs {
            if glyph.gid == 0 {
                log::debug!("{} has no glyph for {:?}", name, glyph.text);
            }
            segment.extend_from_slice(&glyph.gid.to_be_bytes());
            let default = face.glyph_advance(glyph.gid);
            if glyph.gid != 0 {
                used.glyphs
                    .entry(glyph.gid)
                    .or_insert_with(|| (default, glyph.text.nfkc().collect()));
            }
            // Positive values move the next glyph left, in 1/1000 em
            let adjust = ((f32::from(default) - glyph.advance as f32) * 1000.0 / upem).round() as i64;
            if adjust != 0 {
                parts.push(Object::String(std::mem::take(&mut segment), StringFormat::Hexadecimal));
                parts.push(Object::Integer(adjust));
            }
        }
        if !segment.is_empty() {
            parts.push(Object::String(segment, StringFormat::Hexadecimal));
        }
        Operation::new("TJ", vec![Object::Array(parts)])
    }

    fn assemble(
        &self,
        info: &DocumentInfo,
        contents: Vec<Vec<Operation>>,
        usage: &FontUsage,
    ) -> Result<LopdfDocument> {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for (name, used) in &usage.registered {
            let face = self
                .registry
                .get(name)
                .ok_or_else(|| Error::Font(format!("font {} is not registered", name)))?;
            let font_id = embed_font(&mut doc, face, used);
            fonts.set(used.resource.as_bytes().to_vec(), font_id);
        }
        if usage.builtin || usage.registered.is_empty() {
            let helvetica = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => BUILTIN_FONT,
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(BUILTIN_RESOURCE, helvetica);
        }
        let resources_id = doc.add_object(dictionary! { "Font" => fonts });

        let mut kids = Vec::with_capacity(contents.len());
        for (index, operations) in contents.into_iter().enumerate() {
            let page = info
                .page(index)
                .ok_or_else(|| Error::composition(index, "missing page geometry"))?;
            let data = Content { operations }
                .encode()
                .map_err(|e| Error::composition(index, e.to_string()))?;
            let content_id = doc.add_object(compressed_stream(Dictionary::new(), &data));
            let media_box: Vec<Object> = page.media_box().iter().map(|&v| Object::Real(v)).collect();
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box,
                "Contents" => content_id,
                "Resources" => resources_id,
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
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        Ok(doc)
    }
}

fn draw_line(resource: &str, line: &RenderedLine, color: Color, show: Operation) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "rg",
            vec![color.r.into(), color.g.into(), color.b.into()],
        ),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(resource.as_bytes().to_vec()), line.font_size.into()],
        ),
        Operation::new("Td", vec![line.x.into(), line.y.into()]),
        show,
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// WinAnsi code of a char; `?` for anything outside Latin-1.
fn winansi_byte(c: char) -> u8 {
    match c as u32 {
        code @ 0x20..=0x7E | code @ 0xA0..=0xFF => code as u8,
        _ => b'?',
    }
}

/// Flate-compress `data` into a stream with `dict`.
pub(crate) fn compressed_stream(mut dict: Dictionary, data: &[u8]) -> Stream {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let compressed = encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .ok();
    match compressed {
        Some(bytes) => {
            dict.set("Filter", "FlateDecode");
            Stream::new(dict, bytes)
        }
        None => Stream::new(dict, data.to_vec()),
    }
}

fn pdf_font_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                Some(c)
            } else if c.is_whitespace() {
                Some('-')
            } else {
                None
            }
        })
        .collect();
    if cleaned.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        cleaned
    }
}

/// Embed a registered font as Type0/CIDFontType2 with Identity-H
/// encoding and CID = glyph id.
fn embed_font(doc: &mut LopdfDocument, face: &FontFace, used: &UsedFont) -> ObjectId {
    let base_font = pdf_font_name(face.name());
    let upem = f32::from(face.units_per_em().max(1));
    let scale = |v: i16| (f32::from(v) * 1000.0 / upem).round() as i64;
    let [x_min, y_min, x_max, y_max] = face.bbox();

    let font_file = compressed_stream(
        dictionary! { "Length1" => face.data().len() as i64 },
        face.data(),
    );
    let font_file_id = doc.add_object(font_file);

    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => base_font.as_str(),
        "Flags" => 4,
        "FontBBox" => vec![scale(x_min).into(), scale(y_min).into(), scale(x_max).into(), scale(y_max).into()],
        "ItalicAngle" => face.italic_angle(),
        "Ascent" => scale(face.ascender()),
        "Descent" => scale(face.descender()),
        "CapHeight" => scale(face.cap_height()),
        "StemV" => 80,
        "FontFile2" => font_file_id,
    });

    let mut widths = Vec::with_capacity(used.glyphs.len() * 2);
    for (&gid, &(advance, _)) in &used.glyphs {
        let width = (f32::from(advance) * 1000.0 / upem).round() as i64;
        widths.push(Object::Integer(i64::from(gid)));
        widths.push(Object::Array(vec![Object::Integer(width)]));
    }

    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => base_font.as_str(),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 1000,
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    });

    let to_unicode_id = doc.add_object(compressed_stream(
        Dictionary::new(),
        to_unicode_cmap(&used.glyphs).as_bytes(),
    ));

    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => base_font.as_str(),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    })
}

/// ToUnicode CMap mapping each used glyph id back to text.
fn to_unicode_cmap(glyphs: &BTreeMap<u16, (u16, String)>) -> String {
    let mut out = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );

    let entries: Vec<(&u16, &String)> = glyphs.iter().map(|(gid, (_, text))| (gid, text)).collect();
    for chunk in entries.chunks(100) {
        out.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, text) in chunk {
            let units: String = text
                .encode_utf16()
                .map(|u| format!("{:04X}", u))
                .collect();
            out.push_str(&format!("<{:04X}> <{}>\n", gid, units));
        }
        out.push_str("endbfchar\n");
    }

    out.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, PageInfo};

    fn info(pages: usize) -> DocumentInfo {
        DocumentInfo::new(vec![PageInfo::letter(); pages])
    }

    fn translated(text: &str, page: usize) -> TextElement {
        let mut element = TextElement::new(
            "Hello",
            page,
            BBox::new(100.0, 100.0, 300.0, 130.0),
            "Helvetica",
            12.0,
        );
        element.set_translation(text);
        element
    }

    fn page_ops(doc: &LopdfDocument, page: u32) -> Vec<Operation> {
        let pages = doc.get_pages();
        let content = doc.get_page_content(pages[&page]).unwrap();
        Content::decode(&content).unwrap().operations
    }

    #[test]
    fn test_builtin_layer() {
        let registry = FontRegistry::default();
        let options = RenderOptions::default();
        let layer = TextLayerBuilder::new(&registry, &options)
            .build(&info(2), &[translated("Bonjour", 1)])
            .unwrap();

        assert_eq!(layer.elements_drawn, 1);
        assert_eq!(layer.document.get_pages().len(), 2);
        assert!(page_ops(&layer.document, 1).is_empty());

        let ops = page_ops(&layer.document, 2);
        let tf = ops.iter().find(|op| op.operator == "Tf").unwrap();
        assert_eq!(tf.operands[0].as_name().unwrap(), b"FHelv");
        let tj = ops.iter().find(|op| op.operator == "Tj").unwrap();
        assert_eq!(tj.operands[0].as_str().unwrap(), b"Bonjour");
        assert_eq!(ops.first().unwrap().operator, "q");
    }

    #[test]
    fn test_untranslated_skipped_unless_partial() {
        let registry = FontRegistry::default();
        let element = TextElement::new(
            "Original",
            0,
            BBox::new(100.0, 100.0, 300.0, 130.0),
            "Helvetica",
            12.0,
        );

        let options = RenderOptions::default();
        let layer = TextLayerBuilder::new(&registry, &options)
            .build(&info(1), std::slice::from_ref(&element))
            .unwrap();
        assert_eq!(layer.elements_drawn, 0);

        let partial = RenderOptions::default().with_partial(true);
        let layer = TextLayerBuilder::new(&registry, &partial)
            .build(&info(1), &[element])
            .unwrap();
        assert_eq!(layer.elements_drawn, 1);
    }

    #[test]
    fn test_element_beyond_pages_skipped() {
        let registry = FontRegistry::default();
        let options = RenderOptions::default();
        let layer = TextLayerBuilder::new(&registry, &options)
            .build(&info(1), &[translated("Hi", 4)])
            .unwrap();
        assert_eq!(layer.elements_drawn, 0);
        assert_eq!(layer.document.get_pages().len(), 1);
    }

    #[test]
    fn test_winansi_byte() {
        assert_eq!(winansi_byte('A'), b'A');
        assert_eq!(winansi_byte('é'), 0xE9);
        assert_eq!(winansi_byte('\u{0628}'), b'?');
    }

    #[test]
    fn test_to_unicode_cmap() {
        let mut glyphs = BTreeMap::new();
        glyphs.insert(3u16, (500u16, "\u{0628}".to_string()));
        let cmap = to_unicode_cmap(&glyphs);
        assert!(cmap.contains("1 beginbfchar"));
        assert!(cmap.contains("<0003> <0628>"));
    }

    #[test]
    fn test_pdf_font_name() {
        assert_eq!(pdf_font_name("Vazirmatn Bold"), "Vazirmatn-Bold");
        assert_eq!(pdf_font_name("()"), "EmbeddedFont");
    }
}
