use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mdscraper_core::{Document, ExtractionConfig, Pipeline, locate, preprocess::absolutize_urls, render};
use url::Url;

fn bench_parse(c: &mut Criterion) {
    let small = std::fs::read_to_string("../../tests/fixtures/class_content.html").unwrap();
    let medium = std::fs::read_to_string("../../tests/fixtures/docs_page.html").unwrap();
    let large = medium.repeat(50);

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("small", "1KB"), &small, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("medium", "2KB"), &medium, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("large", "100KB"), &large, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/docs_page.html").unwrap();
    let source = Url::parse("https://example.com/docs/getting-started.html").unwrap();
    let pipeline = Pipeline::new(
        ExtractionConfig::builder()
            .root_url(Some(Url::parse("https://example.com/docs").unwrap()))
            .build(),
    );

    c.bench_function("full_pipeline", |b| {
        b.iter(|| pipeline.process(black_box(&html), Some(&source)))
    });
}

fn bench_absolutize(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/docs_page.html").unwrap();
    let base = Url::parse("https://example.com/docs/getting-started.html").unwrap();

    c.bench_function("absolutize_urls", |b| b.iter(|| absolutize_urls(black_box(&html), &base)));
}

fn bench_locate_and_render(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/docs_page.html").unwrap();
    let doc = Document::parse(&html).unwrap();
    let config = ExtractionConfig::default();

    c.bench_function("locate_and_render", |b| {
        b.iter(|| {
            let content = locate(black_box(&doc), &config).unwrap();
            render(&doc, content.node, &config, None)
        })
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_full_pipeline,
    bench_absolutize,
    bench_locate_and_render
);
criterion_main!(benches);
