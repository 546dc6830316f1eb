//! Benchmarks for pagetex validation and rendering.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic pages built in memory.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pagetex::model::{CodeData, EquationData, TableData};
use pagetex::render::render_fragment;
use pagetex::{check_plain_text, schema, ContentBlock, LoadedPage, Page, Reference, RenderOptions};
use serde_json::Value;

/// Creates a synthetic page with `blocks` groups of mixed content.
fn create_test_page(number: u32, blocks: usize) -> Page {
    let mut page = Page::new(number, format!("Section {} & Results", number));
    for i in 0..blocks {
        page.add_block(ContentBlock::text(format!(
            "Paragraph {} relates $a*b$ to \\ref{{eq:{}-{}}} and keeps going for a while.",
            i, number, i
        )));
        page.add_block(ContentBlock::Table(TableData {
            table_data: vec![
                vec!["name".into(), "value".into(), "unit".into()],
                vec![format!("x_{}", i), "42".into(), "m/s".into()],
            ],
            caption: Some(format!("Table {}", i)),
            label: Some(format!("tab:{}-{}", number, i)),
        }));
        page.add_block(ContentBlock::Code(CodeData {
            code: "fn main() {\n    println!(\"hi\");\n}\n".into(),
            language: "rust".into(),
            caption: None,
            label: None,
        }));
        page.add_block(ContentBlock::Equation(EquationData {
            equation: "E = mc^2".into(),
            label: Some(format!("eq:{}-{}", number, i)),
        }));
    }
    page.add_reference(Reference::new("knuth", "@book{knuth, title={TAOCP}}"));
    page
}

/// Benchmark the plain-text policy.
fn bench_text_policy(c: &mut Criterion) {
    let clean = "The value $a*b$ equals \\ref{eq:x} and \\cite{knuth}.\n".repeat(200);
    let dirty = "# Heading\n- item with **bold**\n```\n".repeat(200);

    c.bench_function("policy_clean_text", |b| {
        b.iter(|| check_plain_text(black_box(&clean)));
    });

    c.bench_function("policy_dirty_text", |b| {
        b.iter(|| check_plain_text(black_box(&dirty)));
    });
}

/// Benchmark schema validation of page documents.
fn bench_schema(c: &mut Criterion) {
    let value: Value = serde_json::to_value(create_test_page(1, 50)).unwrap();

    c.bench_function("schema_validate_page", |b| {
        b.iter(|| schema::validate_page(black_box(&value)));
    });
}

/// Benchmark rendering at various sizes.
fn bench_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_page");
    let options = RenderOptions::default();

    for blocks in [1, 10, 100].iter() {
        let page = LoadedPage::new(create_test_page(1, *blocks), "pages/01");

        group.bench_function(format!("{}_groups", blocks), |b| {
            b.iter(|| render_fragment(black_box(&page), &options).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_text_policy, bench_schema, bench_rendering);
criterion_main!(benches);
