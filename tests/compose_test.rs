//! Integration tests for stripping, overlay and output generation.

mod common;

use common::{build_pdf, page_operators, text_layer_text, FixturePage};
use transpdf::compose::{merge_text_layer, strip_document, TEXT_LAYER_NAME};
use transpdf::parser::{LopdfBackend, PageSelection, PdfBackend};
use transpdf::render::TextLayerBuilder;
use transpdf::{BBox, DocumentInfo, FontRegistry, PageInfo, PdfGenerator, RenderOptions, TextElement};

fn backend(pages: &[FixturePage]) -> LopdfBackend {
    LopdfBackend::from_document(build_pdf(pages)).unwrap()
}

fn translated(text: &str, translation: &str, page: usize, bbox: BBox) -> TextElement {
    let mut element = TextElement::new(text, page, bbox, "Helvetica", 12.0);
    element.set_translation(translation);
    element
}

fn counts(doc: lopdf::Document) -> Vec<(usize, usize)> {
    let backend = LopdfBackend::from_document(doc).unwrap();
    backend
        .pages()
        .into_values()
        .map(|id| {
            let images = backend.page_images(id).unwrap();
            let annotations = backend.page_annotations(id).unwrap();
            (images.len(), annotations.len())
        })
        .collect()
}

#[test]
fn test_strip_removes_text_and_text_annotations() {
    let source = backend(&[FixturePage::text(100.0, 680.0, 12.0, "Hello")
        .with_image(300.0, 300.0, 100.0)
        .with_annotation("Link")
        .with_annotation("Highlight")]);

    let (doc, report) = strip_document(source, &PageSelection::All).unwrap();

    assert_eq!(report.text_ops_removed, 5);
    assert_eq!(report.images_kept, 1);
    assert_eq!(report.images_placed, 0);
    assert_eq!(report.annotations_kept, 1);
    assert_eq!(report.annotations_removed, 1);

    assert_eq!(page_operators(&doc, 1), vec!["q", "cm", "Do", "Q"]);
    let stripped = LopdfBackend::from_document(doc).unwrap();
    let page = stripped.pages()[&1];
    let annotations = stripped.page_annotations(page).unwrap();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].subtype, "Link");
}

#[test]
fn test_strip_places_undrawn_image() {
    let source = backend(&[FixturePage::text(100.0, 680.0, 12.0, "Caption")]);
    let (doc, report) = strip_document(source, &PageSelection::All).unwrap();

    assert_eq!(report.images_placed, 1);
    assert_eq!(page_operators(&doc, 1), vec!["q", "cm", "Do", "Q"]);
}

#[test]
fn test_zero_elements_keep_images_and_links() {
    let pages = [
        FixturePage::text(100.0, 680.0, 12.0, "Hello")
            .with_image(300.0, 300.0, 100.0)
            .with_annotation("Link"),
        FixturePage::text(72.0, 500.0, 10.0, "More")
            .with_image(50.0, 50.0, 20.0)
            .with_annotation("Link")
            .with_annotation("Link"),
    ];
    let before = counts(build_pdf(&pages));

    let registry = FontRegistry::default();
    let generator = PdfGenerator::new(&registry, RenderOptions::default());
    let (doc, report) = generator.compose(backend(&pages), &[]).unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(report.elements_drawn, 0);
    for page in 1..=2 {
        assert!(!page_operators(&doc, page).iter().any(|op| op == "Tj"));
    }
    assert_eq!(counts(doc), before);
    assert_eq!(before, vec![(1, 1), (1, 2)]);
}

#[test]
fn test_compose_overlays_text_on_matching_page() {
    let pages = [
        FixturePage::text(72.0, 700.0, 12.0, "first").with_image(300.0, 300.0, 50.0),
        FixturePage::text(72.0, 700.0, 12.0, "second").with_image(300.0, 300.0, 50.0),
    ];
    let elements = vec![translated(
        "second",
        "deuxieme",
        1,
        BBox::new(72.0, 80.0, 300.0, 100.0),
    )];

    let registry = FontRegistry::default();
    let generator = PdfGenerator::new(&registry, RenderOptions::default());
    let (doc, report) = generator.compose(backend(&pages), &elements).unwrap();

    assert_eq!(report.elements_drawn, 1);
    assert_eq!(report.merge.pages_merged, 2);
    assert!(text_layer_text(&doc, 1).is_empty());
    assert_eq!(text_layer_text(&doc, 2), "deuxieme");

    // Original graphics isolated in q/Q, then the text layer form
    assert_eq!(
        page_operators(&doc, 2),
        vec!["q", "q", "cm", "Do", "Q", "Q", "q", "Do", "Q"]
    );
}

#[test]
fn test_strip_only_selected_pages() {
    let source = backend(&[
        FixturePage::text(72.0, 700.0, 12.0, "keep me").with_image(300.0, 300.0, 50.0),
        FixturePage::text(72.0, 700.0, 12.0, "strip me").with_image(300.0, 300.0, 50.0),
    ]);
    let (doc, report) = strip_document(source, &PageSelection::Pages(vec![2])).unwrap();

    assert_eq!(report.text_ops_removed, 5);
    assert_eq!(page_operators(&doc, 1).iter().filter(|op| *op == "Tj").count(), 1);
    assert_eq!(page_operators(&doc, 2), vec!["q", "cm", "Do", "Q"]);
}

#[test]
fn test_compose_leaves_unselected_pages_untouched() {
    let pages = [
        FixturePage::text(72.0, 700.0, 12.0, "first"),
        FixturePage::text(72.0, 700.0, 12.0, "second"),
    ];
    let elements = vec![translated(
        "second",
        "deuxieme",
        1,
        BBox::new(72.0, 80.0, 300.0, 100.0),
    )];

    let registry = FontRegistry::default();
    let generator = PdfGenerator::new(&registry, RenderOptions::default())
        .with_pages(PageSelection::Pages(vec![2]));
    let (doc, _) = generator.compose(backend(&pages), &elements).unwrap();

    assert!(page_operators(&doc, 1).iter().any(|op| op == "Tj"));
    assert!(!page_operators(&doc, 2).iter().any(|op| op == "Tj"));
    assert_eq!(text_layer_text(&doc, 2), "deuxieme");
}

#[test]
fn test_merge_appends_extra_layer_pages() {
    let mut base = build_pdf(&[FixturePage::text(72.0, 700.0, 12.0, "only page")]);

    let info = DocumentInfo::new(vec![PageInfo::letter(); 3]);
    let elements = vec![translated("x", "page three", 2, BBox::new(72.0, 72.0, 400.0, 100.0))];
    let registry = FontRegistry::default();
    let options = RenderOptions::default();
    let layer = TextLayerBuilder::new(&registry, &options)
        .build(&info, &elements)
        .unwrap();

    let report = merge_text_layer(&mut base, layer.document).unwrap();

    assert_eq!(report.pages_merged, 1);
    assert_eq!(report.pages_appended, 2);
    assert_eq!(base.get_pages().len(), 3);
    assert_eq!(page_operators(&base, 3), vec!["q", "Do", "Q"]);
}

#[test]
fn test_merge_name_does_not_clash() {
    let mut base = build_pdf(&[FixturePage::blank()]);
    let layer = TextLayerBuilder::new(&FontRegistry::default(), &RenderOptions::default())
        .build(&DocumentInfo::new(vec![PageInfo::letter()]), &[])
        .unwrap();
    merge_text_layer(&mut base, layer.document).unwrap();

    let second = TextLayerBuilder::new(&FontRegistry::default(), &RenderOptions::default())
        .build(&DocumentInfo::new(vec![PageInfo::letter()]), &[])
        .unwrap();
    merge_text_layer(&mut base, second.document).unwrap();

    let pages = base.get_pages();
    let page = base.get_dictionary(pages[&1]).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    assert!(xobjects.has(TEXT_LAYER_NAME.as_bytes()));
    assert!(xobjects.has(format!("{}1", TEXT_LAYER_NAME).as_bytes()));
    assert!(xobjects.has(b"Im1"));
}
