//! Rendering: fitting translated text into element boxes and drawing it
//! onto a text-only PDF layer, plus JSON export of elements.

mod fitter;
mod json;
mod options;
mod text_layer;

pub use fitter::{FitResult, RenderedLine, TextFitter};
pub use json::{to_json, write_json, JsonFormat};
pub use options::RenderOptions;
pub use text_layer::{TextLayer, TextLayerBuilder};

pub(crate) use text_layer::compressed_stream;
