//! Benchmarks for current line recomputes.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use andika::document::Document;
use andika::locator::{LineLocator, split_sentences};

fn long_paragraphs() -> Document {
    let mut md = String::new();
    for i in 1..=60 {
        md.push_str(&format!(
            "Paragraph {i} opens here. It has a *middle* sentence! And it ends with a question?\n\n"
        ));
    }
    Document::parse(&md).unwrap()
}

fn bench_split_sentences(c: &mut Criterion) {
    let text = "Hello world. How are you? Fine. ".repeat(50);
    c.bench_function("split_sentences", |b| {
        b.iter(|| split_sentences(black_box(&text)))
    });
}

fn bench_locate_clicks(c: &mut Criterion) {
    let locator = LineLocator::default();
    c.bench_function("locate_60_paragraphs", |b| {
        b.iter_batched(
            long_paragraphs,
            |mut doc| {
                for line in [0, 30, 59] {
                    let caret = doc.caret_at_line(line, 30);
                    black_box(locator.locate(&mut doc, caret).unwrap());
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_split_sentences, bench_locate_clicks);
criterion_main!(benches);
