use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bandscore_core::model::{WorkSample, WorkType};
use bandscore_core::ScoreSet;
use bandscore_core::ScoringService;

const ESSAY: &str = "In my opinion, public transport deserves far more investment than roads. \
Firstly, buses and trains move many people with a fraction of the emissions; \
moreover, they reduce congestion in city centres.\n\n\
However, critics argue that rural areas, which have sparse populations, gain little. \
For example, a village with one bus a day cannot rely on it for work. \
Therefore, a comprehensive framework must establish minimum service levels.\n\n\
In conclusion, although roads remain necessary, the significant benefits of transit \
demonstrate that it should be the priority because it serves everyone.";

const SPEECH: &str = "Um, well, I grew up in a small town near the coast, you know, \
and I think it was a really nice place to live because everyone knew each other. \
We used to go swimming in the summer, and, like, in the winter it was quiet.";

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let service = ScoringService::default();

    let essay = WorkSample::essay(ESSAY, "task2");
    group.bench_function("essay", |b| {
        b.iter(|| service.evaluate(black_box(&essay)))
    });

    let long_essay = WorkSample::essay(ESSAY.repeat(10), "task2");
    group.bench_function("essay_x10", |b| {
        b.iter(|| service.evaluate(black_box(&long_essay)))
    });

    let speech = WorkSample::speaking(SPEECH);
    group.bench_function("speaking", |b| {
        b.iter(|| service.evaluate(black_box(&speech)))
    });

    group.finish();
}

fn bench_complete_from_scores(c: &mut Criterion) {
    let service = ScoringService::default();
    let sample = WorkSample::essay(ESSAY, "task2");

    c.bench_function("complete_from_scores", |b| {
        b.iter(|| {
            let scores = ScoreSet::uniform(WorkType::Essay, black_box(6.0));
            service.complete_from_scores(&sample, scores)
        })
    });
}

criterion_group!(benches, bench_evaluate, bench_complete_from_scores);
criterion_main!(benches);
