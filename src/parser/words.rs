//! Positioned word extraction from page content streams.
//!
//! Walks the content operators keeping the graphics and text state, places
//! each glyph with the font's width table and splits glyph runs into words
//! on whitespace and on jumps in position.

use std::collections::HashMap;

use crate::error::Result;
use crate::model::{BBox, PageInfo, Word};

use super::backend::{
    get_number_from_value, BackendFontInfo, ContentOp, PageId, PdfBackend, PdfValue,
};
use super::matrix::Matrix;

/// Ascent and descent of a glyph box, as fractions of the font size.
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;
/// A baseline shift above this fraction of the size ends the word.
const BASELINE_TOLERANCE: f32 = 0.1;
/// Forward gap (fraction of size) that separates words.
const WORD_GAP: f32 = 0.2;
/// Backward jump (fraction of size) that separates words.
const BACKWARD_GAP: f32 = 0.5;

/// Font and size in effect over a region of the page, one per show
/// operator. Used to attribute fonts to lines whose words carry none.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpan {
    pub bbox: BBox,
    pub font_name: String,
    pub font_size: f32,
}

/// Words and font spans of one page.
#[derive(Debug, Clone, Default)]
pub struct PageText {
    pub words: Vec<Word>,
    pub spans: Vec<FontSpan>,
}

/// Text state parameters saved with `q`.
#[derive(Debug, Clone, Copy)]
struct TextState {
    font: Option<usize>,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// Word being accumulated, in user space.
#[derive(Debug)]
struct PendingWord {
    text: String,
    start_x: f32,
    end_x: f32,
    baseline: f32,
    size: f32,
    font: String,
}

/// Extracts positioned words from pages of a [`PdfBackend`].
pub struct WordExtractor<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: PdfBackend + ?Sized> WordExtractor<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Extract the words of one page.
    ///
    /// `page_index` is the 0-based index recorded on each word; `info`
    /// gives the page height used to flip coordinates to top-left origin.
    pub fn extract_page(
        &self,
        page_index: usize,
        page: PageId,
        info: &PageInfo,
    ) -> Result<PageText> {
        let content = self.backend.page_content(page)?;
        if content.is_empty() {
            return Ok(PageText::default());
        }
        let ops = self.backend.decode_content(&content)?;
        let fonts = self.backend.page_fonts(page)?;

        let mut walker = Walker {
            backend: self.backend,
            page,
            page_index,
            info,
            fonts_by_name: fonts
                .iter()
                .enumerate()
                .map(|(i, f)| (f.name.clone(), i))
                .collect(),
            fonts: &fonts,
            fallback_font: BackendFontInfo::default(),
            ctm: Matrix::IDENTITY,
            state: TextState::default(),
            stack: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            in_text: false,
            pending: None,
            out: PageText::default(),
        };

        for op in &ops {
            walker.apply(op);
        }
        walker.flush();

        log::debug!(
            "Page {}: {} words, {} font spans",
            page_index + 1,
            walker.out.words.len(),
            walker.out.spans.len()
        );
        Ok(walker.out)
    }
}

/// Content stream interpreter state for one page.
struct Walker<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
    page: PageId,
    page_index: usize,
    info: &'a PageInfo,
    fonts_by_name: HashMap<Vec<u8>, usize>,
    fonts: &'a [BackendFontInfo],
    fallback_font: BackendFontInfo,
    ctm: Matrix,
    state: TextState,
    stack: Vec<(Matrix, TextState)>,
    tm: Matrix,
    tlm: Matrix,
    in_text: bool,
    pending: Option<PendingWord>,
    out: PageText,
}

impl<B: PdfBackend + ?Sized> Walker<'_, B> {
    fn apply(&mut self, op: &ContentOp) {
        let num = |i: usize| op.operands.get(i).and_then(get_number_from_value);

        match op.operator.as_str() {
            "q" => self.stack.push((self.ctm, self.state)),
            "Q" => {
                if let Some((ctm, state)) = self.stack.pop() {
                    self.ctm = ctm;
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    self.ctm = m.then(&self.ctm);
                }
            }
            "BT" => {
                self.in_text = true;
                self.tm = Matrix::IDENTITY;
                self.tlm = Matrix::IDENTITY;
            }
            "ET" => {
                self.in_text = false;
                self.flush();
            }
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    self.state.font = self.fonts_by_name.get(name).copied();
                    if self.state.font.is_none() {
                        log::debug!(
                            "Font /{} not in page resources",
                            String::from_utf8_lossy(name)
                        );
                    }
                }
                if let Some(size) = num(1) {
                    self.state.size = size;
                }
            }
            "Tc" => self.state.char_spacing = num(0).unwrap_or(0.0),
            "Tw" => self.state.word_spacing = num(0).unwrap_or(0.0),
            "Tz" => self.state.horizontal_scale = num(0).unwrap_or(100.0) / 100.0,
            "TL" => self.state.leading = num(0).unwrap_or(0.0),
            "Ts" => self.state.rise = num(0).unwrap_or(0.0),
            "Td" => self.move_line(num(0).unwrap_or(0.0), num(1).unwrap_or(0.0)),
            "TD" => {
                let ty = num(1).unwrap_or(0.0);
                self.state.leading = -ty;
                self.move_line(num(0).unwrap_or(0.0), ty);
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    self.tm = m;
                    self.tlm = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(value @ PdfValue::Str(_)) = op.operands.first() {
                    self.show(std::slice::from_ref(value));
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    self.show(items);
                }
            }
            "'" => {
                self.next_line();
                if let Some(value @ PdfValue::Str(_)) = op.operands.first() {
                    self.show(std::slice::from_ref(value));
                }
            }
            "\"" => {
                self.state.word_spacing = num(0).unwrap_or(self.state.word_spacing);
                self.state.char_spacing = num(1).unwrap_or(self.state.char_spacing);
                self.next_line();
                if let Some(value @ PdfValue::Str(_)) = op.operands.get(2) {
                    self.show(std::slice::from_ref(value));
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translate(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.state.leading);
    }

    fn font(&self) -> &BackendFontInfo {
        self.state
            .font
            .and_then(|i| self.fonts.get(i))
            .unwrap_or(&self.fallback_font)
    }

    /// Show a string or a `TJ` array.
    fn show(&mut self, items: &[PdfValue]) {
        if !self.in_text {
            return;
        }
        let mut span_box: Option<BBox> = None;
        let mut span_size = 0.0f32;

        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    if let Some((bbox, size)) = self.show_string(bytes) {
                        span_box = Some(match span_box {
                            Some(b) => b.union(&bbox),
                            None => bbox,
                        });
                        span_size = size;
                    }
                }
                other => {
                    if let Some(adjust) = get_number_from_value(other) {
                        let tx = -adjust / 1000.0 * self.state.size * self.state.horizontal_scale;
                        self.tm = Matrix::translate(tx, 0.0).then(&self.tm);
                    }
                }
            }
        }

        if let Some(bbox) = span_box {
            let font_name = self.font().base_font.clone();
            if !font_name.is_empty() {
                self.out.spans.push(FontSpan {
                    bbox,
                    font_name,
                    font_size: span_size,
                });
            }
        }
    }

    /// Place the glyphs of one string; returns their box and the
    /// effective font size.
    fn show_string(&mut self, bytes: &[u8]) -> Option<(BBox, f32)> {
        let font = self.font().clone();
        let codes = font.codes(bytes);
        if codes.is_empty() {
            return None;
        }
        let text = self.backend.decode_text(self.page, &font.name, bytes);
        let chars: Vec<char> = text.chars().collect();

        let state = self.state;
        let advances: Vec<f32> = codes
            .iter()
            .map(|&code| {
                let glyph = font.code_width(code) / 1000.0 * state.size;
                let word_space = if !font.is_cid && code == 32 {
                    state.word_spacing
                } else {
                    0.0
                };
                (glyph + state.char_spacing + word_space) * state.horizontal_scale
            })
            .collect();

        // Chars and codes line up unless the encoding maps a code to
        // several chars (ligatures) or none; spread the run evenly then.
        let char_advances: Vec<f32> = if chars.len() == codes.len() {
            advances
        } else if chars.is_empty() {
            let total: f32 = advances.iter().sum();
            self.tm = Matrix::translate(total, 0.0).then(&self.tm);
            return None;
        } else {
            let total: f32 = advances.iter().sum();
            vec![total / chars.len() as f32; chars.len()]
        };

        let mut bbox: Option<BBox> = None;
        let mut size = 0.0f32;
        for (c, advance) in chars.into_iter().zip(char_advances) {
            let m = self.tm.then(&self.ctm);
            let (x, y) = m.apply(0.0, state.rise);
            let (end_x, _) = m.apply(advance, state.rise);
            self.tm = Matrix::translate(advance, 0.0).then(&self.tm);

            size = state.size * m.vertical_scale();
            if !(x.is_finite() && y.is_finite() && end_x.is_finite() && size.is_finite()) {
                continue;
            }
            let glyph_box = self.to_page_box(x.min(end_x), x.max(end_x), y, size);
            bbox = Some(match bbox {
                Some(b) => b.union(&glyph_box),
                None => glyph_box,
            });
            self.push_char(c, x.min(end_x), x.max(end_x), y, size, &font.base_font);
        }
        bbox.map(|b| (b, size))
    }

    fn push_char(&mut self, c: char, x: f32, end_x: f32, baseline: f32, size: f32, font: &str) {
        if c.is_whitespace() || c == '\0' {
            self.flush();
            return;
        }

        if let Some(word) = &self.pending {
            let gap = x - word.end_x;
            let tolerance = word.size.max(size);
            let breaks = (baseline - word.baseline).abs() > BASELINE_TOLERANCE * tolerance
                || gap > WORD_GAP * tolerance
                || gap < -BACKWARD_GAP * tolerance;
            if breaks {
                self.flush();
            }
        }

        match &mut self.pending {
            Some(word) => {
                word.text.push(c);
                word.start_x = word.start_x.min(x);
                word.end_x = word.end_x.max(end_x);
                word.size = word.size.max(size);
            }
            None => {
                self.pending = Some(PendingWord {
                    text: c.to_string(),
                    start_x: x,
                    end_x,
                    baseline,
                    size,
                    font: font.to_string(),
                });
            }
        }
    }

    fn flush(&mut self) {
        let Some(word) = self.pending.take() else {
            return;
        };
        let bbox = self.to_page_box(word.start_x, word.end_x, word.baseline, word.size);
        let mut out = Word::new(word.text, self.page_index, bbox);
        if !word.font.is_empty() {
            out = out.with_font(word.font, word.size);
        }
        self.out.words.push(out);
    }

    /// Box of a glyph run in page space (top-left origin).
    fn to_page_box(&self, x0: f32, x1: f32, baseline: f32, size: f32) -> BBox {
        let (ox, oy) = self.info.origin;
        let height = self.info.height;
        let y = baseline - oy;
        BBox::new(
            x0 - ox,
            height - (y + ASCENT * size),
            x1 - ox,
            height - (y - DESCENT * size),
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::Metadata;
    use crate::parser::backend::{decode_text_simple, AnnotationInfo, PageImage};
    use std::collections::BTreeMap;

    /// Single-page backend serving a fixed content stream.
    pub(crate) struct MockBackend {
        pub content: Vec<u8>,
        pub fonts: Vec<BackendFontInfo>,
        pub info: PageInfo,
    }

    impl MockBackend {
        pub(crate) fn helvetica(content: &str) -> Self {
            Self {
                content: content.as_bytes().to_vec(),
                fonts: vec![BackendFontInfo {
                    name: b"F1".to_vec(),
                    base_font: "Helvetica".to_string(),
                    ..Default::default()
                }],
                info: PageInfo::letter(),
            }
        }
    }

    impl PdfBackend for MockBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            BTreeMap::from([(1, (1, 0))])
        }

        fn page_info(&self, _page: PageId) -> Result<PageInfo> {
            Ok(self.info)
        }

        fn page_fonts(&self, _page: PageId) -> Result<Vec<BackendFontInfo>> {
            Ok(self.fonts.clone())
        }

        fn page_content(&self, _page: PageId) -> Result<Vec<u8>> {
            Ok(self.content.clone())
        }

        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            decode_text_simple(bytes)
        }

        fn page_images(&self, _page: PageId) -> Result<Vec<PageImage>> {
            Ok(Vec::new())
        }

        fn page_annotations(&self, _page: PageId) -> Result<Vec<AnnotationInfo>> {
            Ok(Vec::new())
        }

        fn metadata(&self) -> Metadata {
            Metadata::default()
        }
    }

    fn extract(content: &str) -> PageText {
        let backend = MockBackend::helvetica(content);
        WordExtractor::new(&backend)
            .extract_page(0, (1, 0), &backend.info)
            .unwrap()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_words_split_on_space() {
        let text = extract("BT /F1 12 Tf 100 680 Td (Hello World) Tj ET");
        let words: Vec<&str> = text.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(words, vec!["Hello", "World"]);

        let hello = &text.words[0];
        assert!(close(hello.bbox.x0, 100.0));
        assert!(close(hello.bbox.x1, 127.336));
        assert!(close(hello.bbox.y0, 102.4));
        assert!(close(hello.bbox.y1, 114.4));
        assert_eq!(hello.font_name.as_deref(), Some("Helvetica"));
        assert_eq!(hello.font_size, Some(12.0));

        // H e l l o + space = 2278 + 278 units
        assert!(close(text.words[1].bbox.x0, 130.672));
    }

    #[test]
    fn test_tj_kerning() {
        let text = extract("BT /F1 12 Tf 72 700 Td [(Hel) -50 (lo) -1000 (World)] TJ ET");
        let words: Vec<&str> = text.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(words, vec!["Hello", "World"]);
        assert_eq!(text.spans.len(), 1);
        assert_eq!(text.spans[0].font_name, "Helvetica");
    }

    #[test]
    fn test_baseline_change_splits_words() {
        let text = extract("BT /F1 12 Tf 72 700 Td (One) Tj 0 -14 Td (Two) Tj ET");
        assert_eq!(text.words.len(), 2);
        assert!(text.words[1].bbox.y0 > text.words[0].bbox.y0);
        assert!(close(text.words[1].bbox.x0, 72.0));
    }

    #[test]
    fn test_ctm_scales_size() {
        let text = extract("q 2 0 0 2 0 0 cm BT /F1 10 Tf 50 300 Td (A) Tj ET Q");
        let word = &text.words[0];
        assert!(close(word.bbox.x0, 100.0));
        assert_eq!(word.font_size, Some(20.0));
        // baseline at 600 in user space
        assert!(close(word.bbox.y1, 792.0 - 600.0 + 4.0));
    }

    #[test]
    fn test_graphics_state_restored() {
        let text = extract("q 3 0 0 3 0 0 cm Q BT /F1 10 Tf 50 300 Td (A) Tj ET");
        assert_eq!(text.words[0].font_size, Some(10.0));
    }

    #[test]
    fn test_text_outside_bt_ignored() {
        let text = extract("(stray) Tj BT /F1 12 Tf 10 10 Td (kept) Tj ET");
        assert_eq!(text.words.len(), 1);
        assert_eq!(text.words[0].text, "kept");
    }

    #[test]
    fn test_next_line_operators() {
        let text = extract("BT /F1 12 Tf 14 TL 72 700 Td (first) Tj T* (second) Tj ET");
        assert_eq!(text.words.len(), 2);
        assert!(close(text.words[1].bbox.y0 - text.words[0].bbox.y0, 14.0));
    }

    #[test]
    fn test_media_box_origin() {
        let mut backend = MockBackend::helvetica("BT /F1 12 Tf 150 250 Td (X) Tj ET");
        backend.info.origin = (50.0, 50.0);
        let text = WordExtractor::new(&backend)
            .extract_page(2, (1, 0), &backend.info)
            .unwrap();
        let word = &text.words[0];
        assert_eq!(word.page_index, 2);
        assert!(close(word.bbox.x0, 100.0));
        assert!(close(word.bbox.y1, 792.0 - 200.0 + 2.4));
    }

    #[test]
    fn test_empty_content() {
        let text = extract("");
        assert!(text.words.is_empty());
        assert!(text.spans.is_empty());
    }
}
