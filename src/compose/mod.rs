//! Page composition: text stripping, text layer overlay and output.
//!
//! The output is the stripped source document with the rendered text layer
//! drawn over each page.

mod generator;
mod merge;
mod strip;

pub use generator::{set_metadata, text_string, GenerationReport, PdfGenerator};
pub use merge::{merge_text_layer, MergeReport, TEXT_LAYER_NAME};
pub use strip::{
    fallback_placement, keeps_annotation, strip_document, strip_page, strip_text_operations,
    StripReport, StrippedPage, TEXT_ANNOTATIONS,
};

use lopdf::content::{Content, Operation};

/// Encode operations as a content stream that is safe to concatenate with
/// other streams of the same page.
///
/// Viewers join a page's content array without separators, so the stream
/// starts and ends with a newline.
pub(crate) fn encode_operations(operations: Vec<Operation>) -> lopdf::Result<Vec<u8>> {
    let body = Content { operations }.encode()?;
    let mut data = Vec::with_capacity(body.len() + 2);
    data.push(b'\n');
    data.extend_from_slice(&body);
    data.push(b'\n');
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_streams_concatenate() {
        let open = encode_operations(vec![Operation::new("q", vec![])]).unwrap();
        let close = encode_operations(vec![
            Operation::new("Q", vec![]),
            Operation::new("q", vec![]),
            Operation::new("Do", vec![lopdf::Object::Name(b"TxLn".to_vec())]),
            Operation::new("Q", vec![]),
        ])
        .unwrap();
        let mut joined = open;
        joined.extend_from_slice(b"0 0 m 10 10 l S");
        joined.extend_from_slice(&close);

        let ops = Content::decode(&joined).unwrap().operations;
        let names: Vec<&str> = ops.iter().map(|o| o.operator.as_str()).collect();
        assert_eq!(names, vec!["q", "m", "l", "S", "Q", "q", "Do", "Q"]);
    }
}
