//! PDF document parser: positioned text elements per page.

use std::path::Path;

use lopdf::Document as LopdfDocument;

use crate::detect::{read_header, sniff_header};
use crate::error::{Error, Result};
use crate::model::{DocumentInfo, TextElement};

use super::backend::{LopdfBackend, PageImage, PdfBackend};
use super::layout::{reading_order, LayoutAnalyzer};
use super::options::ParseOptions;
use super::words::{PageText, WordExtractor};

/// PDF document parser.
pub struct PdfParser {
    backend: LopdfBackend,
    options: ParseOptions,
}

impl PdfParser {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();

        // Verify it's a PDF
        let header = read_header(path)?;
        log::debug!("Opening {} ({})", path.display(), header);

        let backend = LopdfBackend::load_file(path)?;
        Ok(Self { backend, options })
    }

    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        sniff_header(data)?;
        let backend = LopdfBackend::load_bytes(data)?;
        Ok(Self { backend, options })
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument, options: ParseOptions) -> Result<Self> {
        Ok(Self {
            backend: LopdfBackend::from_document(doc)?,
            options,
        })
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn backend(&self) -> &LopdfBackend {
        &self.backend
    }

    /// The underlying document, for composition.
    pub fn document(&self) -> &LopdfDocument {
        self.backend.raw_doc()
    }

    pub fn page_count(&self) -> u32 {
        self.backend.pages().len() as u32
    }

    /// Page geometry and metadata of the whole document.
    pub fn document_info(&self) -> Result<DocumentInfo> {
        document_info(&self.backend)
    }

    /// Text elements of the selected pages, in reading order.
    pub fn extract_elements(&self) -> Result<Vec<TextElement>> {
        extract_elements(&self.backend, &self.options)
    }

    /// Text elements of one page (1-indexed).
    pub fn extract_page_elements(&self, page_num: u32) -> Result<Vec<TextElement>> {
        let text = self.extract_page_words(page_num)?;
        let analyzer = LayoutAnalyzer::new(&self.options);
        Ok(analyzer.analyze(text.words, &text.spans))
    }

    /// Raw words and font spans of one page (1-indexed).
    pub fn extract_page_words(&self, page_num: u32) -> Result<PageText> {
        page_words(&self.backend, page_num)
    }

    /// Image XObjects of one page (1-indexed).
    pub fn page_images(&self, page_num: u32) -> Result<Vec<PageImage>> {
        let page_id = page_id(&self.backend, page_num)?;
        self.backend.page_images(page_id)
    }
}

fn page_id<B: PdfBackend + ?Sized>(backend: &B, page_num: u32) -> Result<(u32, u16)> {
    let pages = backend.pages();
    pages
        .get(&page_num)
        .copied()
        .ok_or(Error::PageOutOfRange(page_num, pages.len() as u32))
}

/// Page sizes and metadata from any backend.
pub fn document_info<B: PdfBackend + ?Sized>(backend: &B) -> Result<DocumentInfo> {
    let pages = backend
        .pages()
        .values()
        .map(|&id| backend.page_info(id))
        .collect::<Result<Vec<_>>>()?;
    let mut info = DocumentInfo::new(pages);
    info.metadata = backend.metadata();
    Ok(info)
}

fn page_words<B: PdfBackend + ?Sized>(backend: &B, page_num: u32) -> Result<PageText> {
    let id = page_id(backend, page_num)?;
    let info = backend.page_info(id)?;
    WordExtractor::new(backend)
        .extract_page(page_num as usize - 1, id, &info)
        .map_err(|e| Error::PdfParse(format!("page {}: {}", page_num, e)))
}

/// Extract text elements of the pages selected in `options`.
///
/// Elements are in reading order: by page, then top to bottom.
pub fn extract_elements<B: PdfBackend + ?Sized>(
    backend: &B,
    options: &ParseOptions,
) -> Result<Vec<TextElement>> {
    let analyzer = LayoutAnalyzer::new(options);
    let mut elements = Vec::new();

    for &page_num in backend.pages().keys() {
        if !options.pages.includes(page_num) {
            continue;
        }
        let text = page_words(backend, page_num)?;
        let mut page_elements = analyzer.analyze(text.words, &text.spans);
        page_elements.sort_by(reading_order);
        log::info!("Page {}: {} text elements", page_num, page_elements.len());
        elements.extend(page_elements);
    }

    Ok(elements)
}
