//! # transpdf
//!
//! Layout-preserving PDF translation for Rust.
//!
//! This library extracts positioned text blocks from a PDF, hands them to a
//! translation backend, fits the translations back into the original boxes
//! (with right-to-left shaping where needed) and draws them over a copy of
//! the document whose original text has been removed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use transpdf::{DummyTranslator, Pipeline};
//!
//! fn main() -> transpdf::Result<()> {
//!     let report = Pipeline::new().run("paper.pdf", "paper_fa.pdf", &DummyTranslator)?;
//!     println!("{} elements translated", report.translation.translated);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **parser**: words from content streams, grouped into lines and blocks
//! - **translate**: batching, pacing and retries around a [`Translator`]
//! - **render**: wrapping and shrinking text into boxes, text layer output
//! - **compose**: text stripping and overlay of the text layer

pub mod compose;
pub mod detect;
pub mod error;
pub mod font;
pub mod model;
pub mod parser;
pub mod render;
pub mod script;
pub mod translate;

// Re-export commonly used types
pub use compose::{GenerationReport, PdfGenerator};
pub use detect::{default_output_path, is_pdf};
pub use error::{Error, Result, TranslationError, TranslationErrorKind};
pub use font::{FontRegistry, TextMeasure};
pub use model::{Alignment, BBox, Color, DocumentInfo, Metadata, PageInfo, TextElement, Word};
pub use parser::{PageSelection, ParseOptions, PdfParser};
pub use render::{JsonFormat, RenderOptions};
pub use script::{is_rtl_script, shape_for_display};
pub use translate::{
    Domain, DummyTranslator, Orchestrator, TranslateOptions, TranslationReport, Translator,
};

use std::path::Path;

/// Extract text elements from a PDF file.
///
/// # Example
///
/// ```no_run
/// let elements = transpdf::extract_elements("paper.pdf").unwrap();
/// for element in &elements {
///     println!("page {}: {}", element.page_index + 1, element.text);
/// }
/// ```
pub fn extract_elements<P: AsRef<Path>>(path: P) -> Result<Vec<TextElement>> {
    PdfParser::open(path)?.extract_elements()
}

/// Extract text elements from a PDF file with custom options.
pub fn extract_elements_with_options<P: AsRef<Path>>(
    path: P,
    options: ParseOptions,
) -> Result<Vec<TextElement>> {
    PdfParser::open_with_options(path, options)?.extract_elements()
}

/// Extract text elements from PDF bytes.
pub fn extract_elements_from_bytes(data: &[u8]) -> Result<Vec<TextElement>> {
    PdfParser::from_bytes(data)?.extract_elements()
}

/// Extract text elements as JSON.
///
/// # Example
///
/// ```no_run
/// use transpdf::{to_json, JsonFormat};
///
/// let json = to_json("paper.pdf", JsonFormat::Pretty).unwrap();
/// std::fs::write("elements.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let elements = extract_elements(path)?;
    render::to_json(&elements, format)
}

/// Summary of a full translation run.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub elements: usize,
    pub translation: TranslationReport,
    pub generation: GenerationReport,
}

/// Builder for the extract, translate and generate pipeline.
///
/// # Example
///
/// ```no_run
/// use transpdf::{Domain, DummyTranslator, FontRegistry, Pipeline, TranslateOptions};
///
/// let mut fonts = FontRegistry::default();
/// fonts.load_dir("fonts")?;
///
/// let report = Pipeline::new()
///     .with_fonts(fonts)
///     .with_translate_options(TranslateOptions::new().with_domain(Domain::Scientific))
///     .partial(true)
///     .run("paper.pdf", "paper_fa.pdf", &DummyTranslator)?;
/// # Ok::<(), transpdf::Error>(())
/// ```
pub struct Pipeline {
    parse_options: ParseOptions,
    render_options: RenderOptions,
    translate_options: TranslateOptions,
    fonts: FontRegistry,
    metadata: Option<Metadata>,
}

impl Pipeline {
    /// Create a pipeline with default options and no registered fonts.
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::default(),
            render_options: RenderOptions::default(),
            translate_options: TranslateOptions::default(),
            fonts: FontRegistry::default(),
            metadata: None,
        }
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    pub fn with_translate_options(mut self, options: TranslateOptions) -> Self {
        self.translate_options = options;
        self
    }

    /// Fonts used for measuring and drawing translated text.
    pub fn with_fonts(mut self, fonts: FontRegistry) -> Self {
        self.fonts = fonts;
        self
    }

    /// Metadata for the output document.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Draw the original text of elements that were not translated.
    pub fn partial(mut self, enabled: bool) -> Self {
        self.render_options = self.render_options.with_partial(enabled);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.parse_options = self.parse_options.with_pages(pages);
        self
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    /// Translate `input` into `output` with `translator`.
    ///
    /// Nothing is written when extraction or translation fails. Under
    /// continue-on-error, elements that could not be translated are drawn
    /// with their original text. Pages outside the page selection are
    /// copied unchanged.
    pub fn run<P, Q, T>(&self, input: P, output: Q, translator: &T) -> Result<PipelineReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        T: Translator + ?Sized,
    {
        let input = input.as_ref();
        let mut elements = extract_elements_with_options(input, self.parse_options.clone())?;

        let translation = Orchestrator::new(translator, self.translate_options.clone())
            .translate_elements(&mut elements)?;

        let mut render_options = self.render_options.clone();
        if self.translate_options.continue_on_error {
            render_options = render_options.with_partial(true);
        }
        let mut generator = PdfGenerator::new(&self.fonts, render_options)
            .with_pages(self.parse_options.pages.clone());
        if let Some(metadata) = &self.metadata {
            generator = generator.with_metadata(metadata.clone());
        }
        let generation = generator.generate(input, &elements, output)?;

        Ok(PipelineReport {
            elements: elements.len(),
            translation,
            generation,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
