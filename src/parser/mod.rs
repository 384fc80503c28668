//! PDF parsing module: words, lines and text elements.

mod backend;
mod layout;
mod matrix;
mod options;
mod pdf_parser;
mod words;

pub use backend::{
    format_pdf_date, AnnotationInfo, BackendFontInfo, ContentOp, LopdfBackend, PageId,
    PageImage, PdfBackend, PdfValue,
};
pub(crate) use backend::resolve;
pub use layout::{font_family, reading_order, LayoutAnalyzer};
pub use matrix::Matrix;
pub use options::{PageSelection, ParseOptions};
pub use pdf_parser::{document_info, extract_elements, PdfParser};
pub use words::{FontSpan, PageText, WordExtractor};
