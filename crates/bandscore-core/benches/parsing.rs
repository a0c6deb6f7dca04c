use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bandscore_core::features::FeatureExtractor;
use bandscore_core::parser::parse_sample_set_str;
use bandscore_core::traits::extract_json_object;

fn bench_extract_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_features");
    let extractor = FeatureExtractor::default();

    let short = "Although it rained, we went out because the match, which was important, had started.";
    let long = short.repeat(200);

    group.bench_function("short", |b| b.iter(|| extractor.extract(black_box(short))));
    group.bench_function("long", |b| b.iter(|| extractor.extract(black_box(&long))));

    group.finish();
}

fn bench_extract_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_json");

    let bare = r#"{"scores": {"task_achievement": 6.5}, "feedback": {"strengths": []}}"#;
    let fenced = format!("Here is my assessment:\n\n```json\n{bare}\n```\n\nGood luck!");

    group.bench_function("bare", |b| b.iter(|| extract_json_object(black_box(bare))));
    group.bench_function("fenced", |b| {
        b.iter(|| extract_json_object(black_box(&fenced)))
    });

    group.finish();
}

fn bench_parse_sample_set(c: &mut Criterion) {
    let mut toml = String::from("[sample_set]\nid = \"bench\"\nname = \"Bench\"\n");
    for i in 0..100 {
        toml.push_str(&format!(
            "\n[[samples]]\nid = \"s{i}\"\ncontent = \"Essay number {i}, which is short.\"\n"
        ));
    }

    c.bench_function("parse_sample_set_100", |b| {
        b.iter(|| parse_sample_set_str(black_box(&toml), Path::new("bench.toml")))
    });
}

criterion_group!(
    benches,
    bench_extract_features,
    bench_extract_json,
    bench_parse_sample_set
);
criterion_main!(benches);
