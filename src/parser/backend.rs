//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for PDF operations, isolating
//! the concrete PDF library (lopdf) from the word extraction logic.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::font::{helvetica_advance, is_helvetica_like};
use crate::model::{BBox, Metadata, PageInfo};

use super::matrix::Matrix;

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Advance used for codes with no declared width (1/1000 em).
const DEFAULT_GLYPH_WIDTH: f32 = 500.0;

/// Font information returned by the backend.
#[derive(Debug, Clone, Default)]
pub struct BackendFontInfo {
    /// Font resource name (key in the page's font dictionary).
    pub name: Vec<u8>,
    /// Base font name (e.g., "Helvetica-Bold").
    pub base_font: String,
    /// Two-byte codes (Type0 fonts).
    pub is_cid: bool,
    /// First code covered by `widths`.
    pub first_char: u32,
    /// `/Widths` of a simple font.
    pub widths: Vec<f32>,
    /// `/W` of a CID font, expanded per CID.
    pub cid_widths: HashMap<u32, f32>,
    /// `/DW` or `/MissingWidth`.
    pub default_width: Option<f32>,
}

impl BackendFontInfo {
    /// Advance of a character code in 1/1000 text space units.
    pub fn code_width(&self, code: u32) -> f32 {
        let declared = if self.is_cid {
            self.cid_widths.get(&code).copied()
        } else {
            code.checked_sub(self.first_char)
                .and_then(|i| self.widths.get(i as usize).copied())
        };
        if let Some(w) = declared {
            return w;
        }
        if !self.is_cid && is_helvetica_like(&self.base_font) {
            if let Some(w) = char::from_u32(code).and_then(helvetica_advance) {
                return w as f32;
            }
        }
        self.default_width.unwrap_or(if self.is_cid {
            1000.0
        } else {
            DEFAULT_GLYPH_WIDTH
        })
    }

    /// Split a string operand into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.is_cid {
            bytes
                .chunks(2)
                .map(|c| match c {
                    [hi, lo] => u32::from(*hi) << 8 | u32::from(*lo),
                    [single] => u32::from(*single),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        }
    }
}

/// A value from a PDF content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    pub fn new(operator: &str, operands: Vec<PdfValue>) -> Self {
        Self {
            operator: operator.to_string(),
            operands,
        }
    }
}

/// An image XObject available to a page.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Resource name used with `Do`.
    pub name: Vec<u8>,
    /// Object id when the image is an indirect object.
    pub id: Option<ObjectId>,
    /// Pixel dimensions.
    pub width: u32,
    pub height: u32,
    /// Where the page content draws it, in page space.
    pub bbox: Option<BBox>,
    /// Transform in effect at the `Do`, in user space.
    pub placement: Option<Matrix>,
    /// Drawn from inside a form XObject rather than the page content.
    pub used_by_form: bool,
    /// Stored stream bytes.
    pub data: Vec<u8>,
    /// File extension matching the stream encoding.
    pub ext: &'static str,
}

/// An annotation entry of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationInfo {
    /// Position in the page's `/Annots` array.
    pub index: usize,
    pub id: Option<ObjectId>,
    /// `/Subtype` (e.g., "Link", "FreeText").
    pub subtype: String,
    pub rect: Option<[f32; 4]>,
}

/// Abstract interface for PDF document access.
///
/// Implementations provide page enumeration, page geometry, font info,
/// content stream decoding, text decoding and resource listing, without
/// exposing any concrete PDF library types.
pub trait PdfBackend {
    /// Return all pages as (page_number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Page size, rotation and media box origin.
    fn page_info(&self, page: PageId) -> Result<PageInfo>;

    /// Return font info for a given page.
    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>>;

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        decode_ops(data)
    }

    /// Decode a text byte sequence using the font's encoding on the given page.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;

    /// Image XObjects of a page with their placement.
    fn page_images(&self, page: PageId) -> Result<Vec<PageImage>>;

    /// Annotations of a page.
    fn page_annotations(&self, page: PageId) -> Result<Vec<AnnotationInfo>>;

    /// Document Info dictionary.
    fn metadata(&self) -> Metadata;
}

/// Parse content stream bytes with lopdf.
pub fn decode_ops(data: &[u8]) -> Result<Vec<ContentOp>> {
    let content =
        lopdf::content::Content::decode(data).map_err(|e| Error::PdfParse(e.to_string()))?;

    Ok(content
        .operations
        .into_iter()
        .map(|op| ContentOp {
            operator: op.operator,
            operands: op.operands.iter().map(convert_object).collect(),
        })
        .collect())
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// LopdfBackend: lopdf-backed implementation
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Self::from_document(doc)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Self::from_document(doc)
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Result<Self> {
        Ok(Self { doc })
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Take the underlying document.
    pub fn into_inner(self) -> LopdfDocument {
        self.doc
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        resolve(&self.doc, obj)
    }

    fn font_info(&self, name: &[u8], dict: &Dictionary) -> BackendFontInfo {
        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let subtype = dict.get(b"Subtype").ok().and_then(|o| o.as_name().ok());
        let mut info = BackendFontInfo {
            name: name.to_vec(),
            base_font,
            ..Default::default()
        };

        if subtype == Some(b"Type0".as_slice()) {
            info.is_cid = true;
            let descendant = dict
                .get(b"DescendantFonts")
                .ok()
                .map(|o| self.resolve(o))
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| arr.first())
                .map(|o| self.resolve(o))
                .and_then(|o| o.as_dict().ok());
            if let Some(cid_font) = descendant {
                info.default_width = cid_font
                    .get(b"DW")
                    .ok()
                    .and_then(|o| number(self.resolve(o)));
                if let Ok(w) = cid_font.get(b"W") {
                    if let Ok(arr) = self.resolve(w).as_array() {
                        info.cid_widths = self.expand_cid_widths(arr);
                    }
                }
            }
        } else {
            info.first_char = dict
                .get(b"FirstChar")
                .ok()
                .and_then(|o| number(self.resolve(o)))
                .map(|n| n.max(0.0) as u32)
                .unwrap_or(0);
            if let Ok(w) = dict.get(b"Widths") {
                if let Ok(arr) = self.resolve(w).as_array() {
                    info.widths = arr
                        .iter()
                        .map(|o| number(self.resolve(o)).unwrap_or(0.0))
                        .collect();
                }
            }
            info.default_width = dict
                .get(b"FontDescriptor")
                .ok()
                .and_then(|o| self.resolve(o).as_dict().ok())
                .and_then(|fd| fd.get(b"MissingWidth").ok())
                .and_then(|o| number(self.resolve(o)))
                .filter(|w| *w > 0.0);
        }
        info
    }

    /// Expand `[c [w1 w2 ...] cfirst clast w ...]`.
    fn expand_cid_widths(&self, arr: &[Object]) -> HashMap<u32, f32> {
        let mut widths = HashMap::new();
        let mut i = 0;
        while i < arr.len() {
            let Some(first) = number(self.resolve(&arr[i])) else {
                break;
            };
            let first = first.max(0.0) as u32;
            match arr.get(i + 1).map(|o| self.resolve(o)) {
                Some(Object::Array(list)) => {
                    for (offset, w) in list.iter().enumerate() {
                        if let Some(w) = number(self.resolve(w)) {
                            widths.insert(first + offset as u32, w);
                        }
                    }
                    i += 2;
                }
                Some(last) => {
                    let last = number(last).map(|n| n.max(0.0) as u32).unwrap_or(first);
                    let w = arr
                        .get(i + 2)
                        .and_then(|o| number(self.resolve(o)))
                        .unwrap_or(1000.0);
                    for cid in first..=last.min(first.saturating_add(0xFFFF)) {
                        widths.insert(cid, w);
                    }
                    i += 3;
                }
                None => break,
            }
        }
        widths
    }

    /// Inheritable page attribute, walking up `/Parent`.
    fn inherited(&self, page: PageId, key: &[u8]) -> Option<&Object> {
        let mut current = self.doc.get_dictionary(page).ok()?;
        let mut seen = HashSet::new();
        loop {
            if let Ok(obj) = current.get(key) {
                return Some(self.resolve(obj));
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            if !seen.insert(parent) {
                return None;
            }
            current = self.doc.get_dictionary(parent).ok()?;
        }
    }

    /// Effective resources of a page, following inheritance.
    pub fn page_resources(&self, page: PageId) -> Option<&Dictionary> {
        self.inherited(page, b"Resources")
            .and_then(|o| o.as_dict().ok())
    }

    /// `(name, object)` pairs of a resource dictionary's `/XObject` entry.
    fn xobjects<'a>(&'a self, resources: &'a Dictionary) -> Vec<(Vec<u8>, &'a Object)> {
        resources
            .get(b"XObject")
            .ok()
            .map(|o| self.resolve(o))
            .and_then(|o| o.as_dict().ok())
            .map(|dict| dict.iter().map(|(k, v)| (k.clone(), v)).collect())
            .unwrap_or_default()
    }

    /// Image object ids referenced by form XObjects of a page, recursively.
    fn images_in_forms(&self, resources: &Dictionary) -> HashSet<ObjectId> {
        let mut images = HashSet::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<ObjectId> = self
            .xobjects(resources)
            .into_iter()
            .filter_map(|(_, o)| o.as_reference().ok())
            .collect();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Ok(Object::Stream(stream)) = self.doc.get_object(id) else {
                continue;
            };
            if subtype_of(&stream.dict) != Some(b"Form".as_slice()) {
                continue;
            }
            let Some(form_resources) = stream
                .dict
                .get(b"Resources")
                .ok()
                .and_then(|o| self.resolve(o).as_dict().ok())
            else {
                continue;
            };
            for (_, obj) in self.xobjects(form_resources) {
                if let Ok(child) = obj.as_reference() {
                    match self.doc.get_object(child) {
                        Ok(Object::Stream(s)) if subtype_of(&s.dict) == Some(b"Image".as_slice()) => {
                            images.insert(child);
                        }
                        _ => stack.push(child),
                    }
                }
            }
        }
        images
    }

    /// Transform in effect at each top-level `Do`, keyed by resource name.
    fn do_placements(&self, page: PageId) -> Result<HashMap<Vec<u8>, Matrix>> {
        let ops = self.decode_content(&self.page_content(page)?)?;
        let mut placements = HashMap::new();
        let mut ctm = Matrix::IDENTITY;
        let mut stack = Vec::new();

        for op in &ops {
            match op.operator.as_str() {
                "q" => stack.push(ctm),
                "Q" => ctm = stack.pop().unwrap_or(Matrix::IDENTITY),
                "cm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        ctm = m.then(&ctm);
                    }
                }
                "Do" => {
                    if let Some(PdfValue::Name(name)) = op.operands.first() {
                        placements.entry(name.clone()).or_insert(ctm);
                    }
                }
                _ => {}
            }
        }
        Ok(placements)
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_info(&self, page: PageId) -> Result<PageInfo> {
        let media_box = self
            .inherited(page, b"MediaBox")
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .filter_map(|o| number(self.resolve(o)))
                    .collect::<Vec<_>>()
            })
            .filter(|nums| nums.len() >= 4);

        let mut info = match media_box {
            Some(nums) => {
                let (x0, x1) = (nums[0].min(nums[2]), nums[0].max(nums[2]));
                let (y0, y1) = (nums[1].min(nums[3]), nums[1].max(nums[3]));
                let mut info = PageInfo::new(x1 - x0, y1 - y0);
                info.origin = (x0, y0);
                info
            }
            None => {
                log::warn!("Page {:?} has no usable MediaBox, assuming Letter", page);
                PageInfo::letter()
            }
        };

        info.rotation = self
            .inherited(page, b"Rotate")
            .and_then(number)
            .map(|r| (r as i32).rem_euclid(360))
            .unwrap_or(0);
        Ok(info)
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>> {
        let lopdf_fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        Ok(lopdf_fonts
            .iter()
            .map(|(name, dict)| self.font_info(name, dict))
            .collect())
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without content is blank, not broken.
            Err(_) => return Ok(Vec::new()),
        };

        let refs: Vec<&Object> = match self.resolve(contents) {
            Object::Array(arr) => arr.iter().collect(),
            other => vec![other],
        };

        let mut content = Vec::new();
        for obj in refs {
            match self.resolve(obj) {
                Object::Stream(s) => {
                    let data = s
                        .decompressed_content()
                        .unwrap_or_else(|_| s.content.clone());
                    content.extend_from_slice(&data);
                    content.push(b'\n');
                }
                _ => return Err(Error::PdfParse("Invalid content stream".to_string())),
            }
        }
        Ok(content)
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        if let Ok(lopdf_fonts) = self.doc.get_page_fonts(page) {
            if let Some(font_dict) = lopdf_fonts.get(font_name) {
                if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }

    fn page_images(&self, page: PageId) -> Result<Vec<PageImage>> {
        let Some(resources) = self.page_resources(page) else {
            return Ok(Vec::new());
        };
        let info = self.page_info(page)?;
        let placements = self.do_placements(page)?;
        let in_forms = self.images_in_forms(resources);

        let mut images = Vec::new();
        for (name, obj) in self.xobjects(resources) {
            let id = obj.as_reference().ok();
            let Object::Stream(stream) = self.resolve(obj) else {
                continue;
            };
            if subtype_of(&stream.dict) != Some(b"Image".as_slice()) {
                continue;
            }

            let dim = |key: &[u8]| {
                stream
                    .dict
                    .get(key)
                    .ok()
                    .and_then(|o| number(self.resolve(o)))
                    .map(|n| n.max(0.0) as u32)
                    .unwrap_or(0)
            };
            let (ext, data) = match image_filter(&stream.dict, &self.doc) {
                Some(filter @ ("DCTDecode" | "JPXDecode" | "JBIG2Decode" | "CCITTFaxDecode")) => {
                    (extension_for(filter), stream.content.clone())
                }
                _ => (
                    "bin",
                    stream
                        .decompressed_content()
                        .unwrap_or_else(|_| stream.content.clone()),
                ),
            };

            let placement = placements.get(&name).copied();
            let bbox = placement.map(|m| user_rect_to_page(m.unit_square_bounds(), &info));

            images.push(PageImage {
                used_by_form: id.map(|i| in_forms.contains(&i)).unwrap_or(false),
                name,
                id,
                width: dim(b"Width"),
                height: dim(b"Height"),
                bbox,
                placement,
                data,
                ext,
            });
        }
        Ok(images)
    }

    fn page_annotations(&self, page: PageId) -> Result<Vec<AnnotationInfo>> {
        let page_dict = self
            .doc
            .get_dictionary(page)
            .map_err(|e| Error::PdfParse(e.to_string()))?;
        let Ok(annots) = page_dict.get(b"Annots") else {
            return Ok(Vec::new());
        };
        let Ok(entries) = self.resolve(annots).as_array() else {
            return Ok(Vec::new());
        };

        Ok(entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let dict = self.resolve(entry).as_dict().ok()?;
                let subtype = subtype_of(dict)
                    .map(|s| String::from_utf8_lossy(s).into_owned())
                    .unwrap_or_default();
                let rect = dict
                    .get(b"Rect")
                    .ok()
                    .and_then(|o| self.resolve(o).as_array().ok())
                    .and_then(|arr| {
                        let n: Vec<f32> = arr.iter().filter_map(number).collect();
                        (n.len() == 4).then(|| [n[0], n[1], n[2], n[3]])
                    });
                Some(AnnotationInfo {
                    index,
                    id: entry.as_reference().ok(),
                    subtype,
                    rect,
                })
            })
            .collect())
    }

    fn metadata(&self) -> Metadata {
        let info = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .map(|o| self.resolve(o))
            .and_then(|o| o.as_dict().ok());
        let Some(info) = info else {
            return Metadata::default();
        };

        let text = |key: &[u8]| -> Option<String> {
            let raw = match self.resolve(info.get(key).ok()?) {
                Object::String(bytes, _) => decode_text_simple(bytes),
                Object::Name(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                _ => return None,
            };
            let value = raw.trim_matches('\0').trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        Metadata {
            title: text(b"Title"),
            author: text(b"Author"),
            subject: text(b"Subject"),
            keywords: text(b"Keywords"),
            creator: text(b"Creator"),
            producer: text(b"Producer"),
            created: text(b"CreationDate").and_then(|d| parse_pdf_date(&d)),
            modified: text(b"ModDate").and_then(|d| parse_pdf_date(&d)),
        }
    }
}

/// Follow a reference one level, returning the object itself otherwise.
pub(crate) fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn subtype_of(dict: &Dictionary) -> Option<&[u8]> {
    dict.get(b"Subtype").ok().and_then(|o| o.as_name().ok())
}

/// Last filter of an image stream.
fn image_filter<'a>(dict: &'a Dictionary, doc: &'a LopdfDocument) -> Option<&'a str> {
    let filter = resolve(doc, dict.get(b"Filter").ok()?);
    let name = match filter {
        Object::Name(n) => n.as_slice(),
        Object::Array(arr) => arr.last()?.as_name().ok()?,
        _ => return None,
    };
    std::str::from_utf8(name).ok()
}

fn extension_for(filter: &str) -> &'static str {
    match filter {
        "DCTDecode" => "jpg",
        "JPXDecode" => "jpx",
        "JBIG2Decode" => "jb2",
        "CCITTFaxDecode" => "fax",
        _ => "bin",
    }
}

/// Convert user-space bounds (y up) to a page-space box (y down).
pub(crate) fn user_rect_to_page(bounds: (f32, f32, f32, f32), page: &PageInfo) -> BBox {
    let (x0, y0, x1, y1) = bounds;
    let (ox, oy) = page.origin;
    BBox::new(
        x0 - ox,
        page.height - (y1 - oy),
        x1 - ox,
        page.height - (y0 - oy),
    )
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

/// Helper: extract a number from a [`PdfValue`].
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(r) => Some(*r),
        _ => None,
    }
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}

/// Format a timestamp as a PDF date string.
pub fn format_pdf_date(date: &chrono::DateTime<chrono::Utc>) -> String {
    date.format("D:%Y%m%d%H%M%SZ").to_string()
}
