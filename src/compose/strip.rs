//! Removal of text from page content.
//!
//! The stripped page keeps everything except the glyphs drawn by text
//! objects: paths, shadings, images and form XObjects stay in place with
//! their graphics state, and annotations are kept unless they carry
//! rendered text.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::PageInfo;
use crate::parser::{resolve, LopdfBackend, PageImage, PageSelection, PdfBackend};
use crate::render::compressed_stream;

use super::encode_operations;

/// Operators that only exist to position, style or show text.
const TEXT_OPERATORS: &[&str] = &[
    "BT", "ET", "Tc", "Tw", "Tz", "TL", "Tf", "Tr", "Ts", "Td", "TD", "Tm", "T*", "Tj", "TJ",
    "'", "\"",
];

/// Annotation subtypes whose appearance draws text over the page.
pub const TEXT_ANNOTATIONS: &[&str] = &[
    "FreeText",
    "Highlight",
    "Underline",
    "Squiggly",
    "StrikeOut",
    "Redact",
    "Caret",
];

/// What was kept and dropped on one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripReport {
    pub text_ops_removed: usize,
    pub images_kept: usize,
    /// Images drawn at a fallback position because none was known
    pub images_placed: usize,
    pub annotations_kept: usize,
    pub annotations_removed: usize,
    /// Elements that could not be copied and were skipped
    pub skipped: usize,
}

impl StripReport {
    fn absorb(&mut self, other: &StripReport) {
        self.text_ops_removed += other.text_ops_removed;
        self.images_kept += other.images_kept;
        self.images_placed += other.images_placed;
        self.annotations_kept += other.annotations_kept;
        self.annotations_removed += other.annotations_removed;
        self.skipped += other.skipped;
    }
}

/// Drop text operators from a decoded content stream.
///
/// Graphics state changes made inside a text object (colors, line width,
/// marked content) are kept since they outlive `ET`.
pub fn strip_text_operations(operations: Vec<Operation>) -> (Vec<Operation>, usize) {
    let before = operations.len();
    let kept: Vec<Operation> = operations
        .into_iter()
        .filter(|op| !TEXT_OPERATORS.contains(&op.operator.as_str()))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

/// Whether an annotation subtype is kept on the stripped page.
pub fn keeps_annotation(subtype: &str) -> bool {
    !TEXT_ANNOTATIONS.contains(&subtype)
}

/// Transform placing an image centered on the page, scaled to at most
/// 80% of the page while keeping its aspect ratio.
pub fn fallback_placement(image_width: u32, image_height: u32, page: &PageInfo) -> Option<[f32; 6]> {
    if image_width == 0 || image_height == 0 || page.width <= 0.0 || page.height <= 0.0 {
        return None;
    }
    let (w, h) = (image_width as f32, image_height as f32);
    let scale = (page.width * 0.8 / w).min(page.height * 0.8 / h);
    let (draw_w, draw_h) = (w * scale, h * scale);
    let (ox, oy) = page.origin;
    let x = ox + (page.width - draw_w) / 2.0;
    let y = oy + (page.height - draw_h) / 2.0;
    Some([draw_w, 0.0, 0.0, draw_h, x, y])
}

/// Planned edits for one page, computed before the document is mutated.
#[derive(Debug)]
pub struct StrippedPage {
    pub page_index: usize,
    pub page_id: ObjectId,
    pub operations: Vec<Operation>,
    /// Indices into the page's `/Annots` array that are kept
    pub kept_annotations: Option<Vec<usize>>,
    pub report: StripReport,
}

/// Plan the stripping of one page.
///
/// A content stream that cannot be decoded fails the page. Single images
/// or annotations that cannot be handled are logged and skipped.
pub fn strip_page<B: PdfBackend + ?Sized>(
    backend: &B,
    page_index: usize,
    page_id: ObjectId,
) -> Result<StrippedPage> {
    let page_err = |e: Error| Error::composition(page_index, e.to_string());
    let mut report = StripReport::default();

    let info = backend.page_info(page_id).map_err(page_err)?;
    let raw = backend.page_content(page_id).map_err(page_err)?;
    let content = Content::decode(&raw).map_err(|e| Error::composition(page_index, e.to_string()))?;
    let (mut operations, removed) = strip_text_operations(content.operations);
    report.text_ops_removed = removed;

    let images = backend.page_images(page_id).unwrap_or_else(|e| {
        log::warn!("Page {}: cannot list images: {}", page_index + 1, e);
        Vec::new()
    });
    for image in &images {
        if image.placement.is_some() || image.used_by_form {
            report.images_kept += 1;
            continue;
        }
        let name = String::from_utf8_lossy(&image.name);
        match place_image(image, &info) {
            Some(ops) => {
                log::warn!("Page {}: no position for image {}, centering it", page_index + 1, name);
                operations.extend(ops);
                report.images_placed += 1;
            }
            None => {
                log::warn!("Page {}: skipping image {} without usable size", page_index + 1, name);
                report.skipped += 1;
            }
        }
    }

    let kept_annotations = match backend.page_annotations(page_id) {
        Ok(annotations) if annotations.is_empty() => None,
        Ok(annotations) => {
            let mut kept = Vec::with_capacity(annotations.len());
            for a in annotations {
                if keeps_annotation(&a.subtype) {
                    kept.push(a.index);
                    report.annotations_kept += 1;
                } else {
                    log::debug!("Page {}: removing {} annotation", page_index + 1, a.subtype);
                    report.annotations_removed += 1;
                }
            }
            Some(kept)
        }
        Err(e) => {
            log::warn!("Page {}: cannot read annotations: {}", page_index + 1, e);
            None
        }
    };

    Ok(StrippedPage {
        page_index,
        page_id,
        operations,
        kept_annotations,
        report,
    })
}

impl StrippedPage {
    /// Write the planned content and annotations into `doc`.
    pub fn apply(self, doc: &mut LopdfDocument) -> Result<StripReport> {
        let page_index = self.page_index;
        let data = encode_operations(self.operations)
            .map_err(|e| Error::composition(page_index, e.to_string()))?;
        let content_id = doc.add_object(compressed_stream(Dictionary::new(), &data));

        let mut report = self.report;
        let annots = match self.kept_annotations {
            Some(kept) => annotation_entries(doc, self.page_id).map(|entries| {
                let total = entries.len();
                let keep: Vec<Object> = entries
                    .into_iter()
                    .enumerate()
                    .filter(|(i, _)| kept.contains(i))
                    .map(|(_, entry)| entry)
                    .collect();
                // Entries that could not be read as annotations are dropped.
                let unreadable = total.saturating_sub(keep.len() + report.annotations_removed);
                if unreadable > 0 {
                    log::warn!("Page {}: skipped {} unreadable annotations", page_index + 1, unreadable);
                    report.skipped += unreadable;
                }
                keep
            }),
            None => None,
        };

        let page = doc
            .get_dictionary_mut(self.page_id)
            .map_err(|e| Error::composition(page_index, e.to_string()))?;
        page.set("Contents", content_id);
        if let Some(annots) = annots {
            page.set("Annots", Object::Array(annots));
        }
        Ok(report)
    }
}

/// Strip the selected pages, failing on the first page that cannot be
/// stripped. Pages outside `pages` keep their content untouched.
pub fn strip_document(
    backend: LopdfBackend,
    pages: &PageSelection,
) -> Result<(LopdfDocument, StripReport)> {
    let plans = backend
        .pages()
        .into_iter()
        .enumerate()
        .filter(|(_, (number, _))| pages.includes(*number))
        .map(|(index, (_, page_id))| strip_page(&backend, index, page_id))
        .collect::<Result<Vec<_>>>()?;

    let mut doc = backend.into_inner();
    let mut total = StripReport::default();
    for plan in plans {
        let page = plan.page_index;
        let report = plan.apply(&mut doc)?;
        log::debug!("Page {}: {:?}", page + 1, report);
        total.absorb(&report);
    }
    log::info!(
        "Stripped {} text operators, kept {} images and {} annotations",
        total.text_ops_removed,
        total.images_kept + total.images_placed,
        total.annotations_kept
    );
    Ok((doc, total))
}

fn place_image(image: &PageImage, page: &PageInfo) -> Option<Vec<Operation>> {
    let m = fallback_placement(image.width, image.height, page)?;
    Some(vec![
        Operation::new("q", vec![]),
        Operation::new("cm", m.iter().map(|&v| v.into()).collect()),
        Operation::new("Do", vec![Object::Name(image.name.clone())]),
        Operation::new("Q", vec![]),
    ])
}

fn annotation_entries(doc: &LopdfDocument, page_id: ObjectId) -> Option<Vec<Object>> {
    let annots = doc.get_dictionary(page_id).ok()?.get(b"Annots").ok()?;
    resolve(doc, annots).as_array().ok().cloned()
}
