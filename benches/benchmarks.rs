//! Benchmarks for clean-up memory operations.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use spa_cleanup::config::ModelConfig;
use spa_cleanup::{CleanupMemory, Model, ReferenceSet, Vocabulary};

const SYMBOLS: [&str; 6] = ["A", "B", "C", "D", "E", "LETTER"];

fn benchmark_vocabulary(c: &mut Criterion) {
    c.bench_function("vocabulary_16d_6sym", |b| {
        b.iter(|| Vocabulary::with_symbols(black_box(16), 0, &SYMBOLS))
    });

    c.bench_function("vocabulary_512d_6sym", |b| {
        b.iter(|| Vocabulary::with_symbols(black_box(512), 0, &SYMBOLS))
    });
}

fn benchmark_evaluate(c: &mut Criterion) {
    let vocab = Vocabulary::with_symbols(512, 0, &SYMBOLS).unwrap();
    let single = ReferenceSet::build(&vocab, &["A"]).unwrap();
    let all = ReferenceSet::build(&vocab, &SYMBOLS).unwrap();
    let input = vocab.parse("0.8*LETTER+D").unwrap();

    c.bench_function("evaluate_512d_1ref", |b| {
        b.iter(|| single.evaluate(black_box(input.data())))
    });

    c.bench_function("evaluate_512d_6ref", |b| {
        b.iter(|| all.evaluate(black_box(input.data())))
    });

    let memory = CleanupMemory::new("all", all);
    c.bench_function("recall_512d_6ref", |b| {
        b.iter(|| memory.recall(black_box(input.data())))
    });
}

fn benchmark_parse(c: &mut Criterion) {
    let vocab = Vocabulary::with_symbols(512, 0, &SYMBOLS).unwrap();

    c.bench_function("parse_expression", |b| {
        b.iter(|| vocab.parse(black_box("0.8*LETTER+D-0.1*(A+B)")))
    });
}

fn benchmark_model_step(c: &mut Criterion) {
    let mut model = Model::from_config(&ModelConfig::default()).unwrap();

    c.bench_function("model_step_16d", |b| b.iter(|| model.step()));
}

criterion_group!(
    benches,
    benchmark_vocabulary,
    benchmark_evaluate,
    benchmark_parse,
    benchmark_model_step,
);
criterion_main!(benches);
