//! Input validation before a PDF is handed to the extractor.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
/// Readers tolerate leading junk before the header within the first KiB.
const HEADER_SEARCH_LEN: usize = 1024;

/// Header information of a PDF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// Declared version (e.g., "1.7")
    pub version: String,
    /// Byte offset of `%PDF-` in the file
    pub offset: usize,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// Read and validate the header of a file on disk.
///
/// # Example
/// ```no_run
/// use transpdf::detect::read_header;
///
/// let header = read_header("paper.pdf").unwrap();
/// println!("{}", header);
/// ```
pub fn read_header<P: AsRef<Path>>(path: P) -> Result<PdfHeader> {
    let file = File::open(path)?;
    let mut data = Vec::with_capacity(HEADER_SEARCH_LEN);
    file.take(HEADER_SEARCH_LEN as u64).read_to_end(&mut data)?;
    sniff_header(&data)
}

/// Locate and validate `%PDF-x.y` within the leading bytes.
pub fn sniff_header(data: &[u8]) -> Result<PdfHeader> {
    let window = &data[..data.len().min(HEADER_SEARCH_LEN)];
    let offset = window
        .windows(PDF_MAGIC.len())
        .position(|w| w == PDF_MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let version_start = offset + PDF_MAGIC.len();
    let version = window
        .get(version_start..version_start + 3)
        .ok_or(Error::UnknownFormat)?;

    if !(version[0].is_ascii_digit() && version[1] == b'.' && version[2].is_ascii_digit()) {
        return Err(Error::UnknownFormat);
    }

    Ok(PdfHeader {
        version: String::from_utf8_lossy(version).into_owned(),
        offset,
    })
}

/// Check if a file looks like a PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    read_header(path).is_ok()
}

/// Derive `<dir>/<stem>_translated.pdf` from an input path.
pub fn default_output_path<P: AsRef<Path>>(input: P) -> PathBuf {
    let input = input.as_ref();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_translated.pdf", stem))
}
