//! Output document generation.

use std::path::Path;

use chrono::Utc;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, StringFormat};

use crate::error::Result;
use crate::font::FontRegistry;
use crate::model::{Metadata, TextElement};
use crate::parser::{document_info, format_pdf_date, LopdfBackend, PageSelection};
use crate::render::{RenderOptions, TextLayerBuilder};

use super::merge::{merge_text_layer, MergeReport};
use super::strip::{strip_document, StripReport};

/// Summary of one generated document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub pages: usize,
    pub elements_drawn: usize,
    pub strip: StripReport,
    pub merge: MergeReport,
}

/// Produces translated documents from a source PDF and its elements.
pub struct PdfGenerator<'a> {
    registry: &'a FontRegistry,
    options: RenderOptions,
    metadata: Option<Metadata>,
    pages: PageSelection,
}

impl<'a> PdfGenerator<'a> {
    pub fn new(registry: &'a FontRegistry, options: RenderOptions) -> Self {
        Self {
            registry,
            options,
            metadata: None,
            pages: PageSelection::All,
        }
    }

    /// Pages whose text is replaced. Other pages are copied unchanged.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Metadata written into the output instead of the source's.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Generate the translated document for `input` into `output`.
    ///
    /// Intermediate documents live in a temporary directory that is removed
    /// when this returns, on success and failure alike.
    pub fn generate<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        elements: &[TextElement],
        output: Q,
    ) -> Result<GenerationReport> {
        let backend = LopdfBackend::load_file(input.as_ref())?;
        let (mut doc, report) = self.compose(backend, elements)?;
        doc.save(output.as_ref())?;
        log::info!("Wrote {}", output.as_ref().display());
        Ok(report)
    }

    /// Build the translated document in memory.
    pub fn compose(
        &self,
        backend: LopdfBackend,
        elements: &[TextElement],
    ) -> Result<(LopdfDocument, GenerationReport)> {
        let info = document_info(&backend)?;
        let encrypted = backend.is_encrypted();

        let (mut stripped, strip) = strip_document(backend, &self.pages)?;
        if encrypted {
            stripped.trailer.remove(b"Encrypt");
        }
        let layer = TextLayerBuilder::new(self.registry, &self.options).build(&info, elements)?;

        let workdir = tempfile::Builder::new().prefix("transpdf-").tempdir()?;
        let stripped_path = workdir.path().join("stripped.pdf");
        let text_path = workdir.path().join("text.pdf");
        stripped.save(&stripped_path)?;
        let mut text_doc = layer.document;
        text_doc.save(&text_path)?;
        log::debug!("Intermediate layers in {}", workdir.path().display());

        let mut doc = LopdfDocument::load(&stripped_path)?;
        let merge = merge_text_layer(&mut doc, LopdfDocument::load(&text_path)?)?;

        let metadata = self.metadata.as_ref().unwrap_or(&info.metadata);
        set_metadata(&mut doc, metadata)?;

        let report = GenerationReport {
            pages: doc.get_pages().len(),
            elements_drawn: layer.elements_drawn,
            strip,
            merge,
        };
        Ok((doc, report))
    }
}

/// Encode a string as a PDF text string: literal when ASCII, UTF-16BE
/// with a byte order mark otherwise.
pub fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::string_literal(value);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Write `metadata` into the document Info dictionary and stamp the
/// modification date. Empty fields leave existing values untouched.
pub fn set_metadata(doc: &mut LopdfDocument, metadata: &Metadata) -> Result<()> {
    let info_id = info_dictionary(doc);
    let info = doc.get_dictionary_mut(info_id)?;
    for (key, value) in metadata.text_fields() {
        info.set(key, text_string(value));
    }
    info.set("ModDate", Object::string_literal(format_pdf_date(&Utc::now())));
    Ok(())
}

/// Id of the Info dictionary, creating one when the trailer has none.
fn info_dictionary(doc: &mut LopdfDocument) -> ObjectId {
    let existing = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) if doc.get_dictionary(*id).is_ok() => return *id,
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    let id = doc.add_object(existing);
    doc.trailer.set("Info", id);
    id
}
