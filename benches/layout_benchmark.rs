//! Benchmarks for layout grouping and text fitting.
//!
//! Run with: cargo bench
//!
//! Inputs are synthetic word grids and translated paragraphs.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use transpdf::font::EstimateMetrics;
use transpdf::parser::LayoutAnalyzer;
use transpdf::render::TextFitter;
use transpdf::{BBox, PageInfo, ParseOptions, RenderOptions, TextElement, Word};

/// A page of `rows` lines with `cols` words each, split in two columns.
fn word_grid(rows: usize, cols: usize) -> Vec<Word> {
    let mut words = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        let top = 72.0 + row as f32 * 14.0;
        for col in 0..cols {
            let column_offset = if col < cols / 2 { 0.0 } else { 60.0 };
            let x = 72.0 + column_offset + col as f32 * 40.0;
            words.push(
                Word::new(format!("w{}x{}", row, col), 0, BBox::new(x, top, x + 32.0, top + 12.0))
                    .with_font("Helvetica", 10.0),
            );
        }
    }
    words
}

fn paragraph(words: usize) -> String {
    (0..words)
        .map(|i| if i % 3 == 0 { "\u{0645}\u{062A}\u{0646}" } else { "\u{0648}\u{0627}\u{0698}\u{0647}" })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Benchmark grouping words into text elements.
fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping");
    let analyzer = LayoutAnalyzer::new(&ParseOptions::default());

    for rows in [10, 50, 100].iter() {
        let words = word_grid(*rows, 8);
        group.bench_function(format!("{}_lines", rows), |b| {
            b.iter(|| analyzer.analyze(black_box(words.clone()), &[]));
        });
    }

    group.finish();
}

/// Benchmark fitting translations into boxes of shrinking size.
fn bench_fitting(c: &mut Criterion) {
    let mut group = c.benchmark_group("fitting");
    let options = RenderOptions::default();
    let fitter = TextFitter::new(&EstimateMetrics, &options);
    let page = PageInfo::letter();

    for height in [200.0f32, 60.0, 20.0].iter() {
        let element = TextElement::new(
            "source",
            0,
            BBox::new(72.0, 72.0, 300.0, 72.0 + height),
            "Vazirmatn",
            12.0,
        );
        let text = paragraph(60);
        group.bench_function(format!("box_{}pt", height), |b| {
            b.iter(|| fitter.layout(black_box(&element), black_box(&text), "Vazirmatn", &page));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_grouping, bench_fitting);
criterion_main!(benches);
