//! Data model shared by every pipeline stage.
//!
//! Word boxes come out of the extractor, are grouped into lines and then
//! into [`TextElement`]s, which carry the translation through fitting and
//! compositing. All boxes are in page space: origin at the top-left corner
//! of the media box, y growing downward.

mod document;
mod element;
mod geometry;

pub use document::{DocumentInfo, Metadata, PageInfo};
pub use element::{Alignment, Color, Line, TextElement, Word};
pub use geometry::BBox;
