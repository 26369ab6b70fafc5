use std::sync::Arc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use niasafe::alerts::{AlertThresholds, LogNotifier};
use niasafe::pipeline::CommentPipeline;
use niasafe::store::{InMemoryCommentStore, SqliteCommentStore};
use niasafe::{Scorer, ScoringError, SeverityScores};

struct FixedScorer(SeverityScores);

impl Scorer for FixedScorer {
    fn score(&self, _text: &str) -> Result<SeverityScores, ScoringError> {
        Ok(self.0)
    }
}

fn threat_scores() -> SeverityScores {
    SeverityScores::from_array([0.92, 0.31, 0.40, 0.95, 0.55, 0.12])
}

fn bench_alert_thresholds(c: &mut Criterion) {
    let thresholds = AlertThresholds::default();
    let benign = SeverityScores::from_array([0.02, 0.001, 0.01, 0.001, 0.01, 0.003]);
    let threat = threat_scores();

    let mut group = c.benchmark_group("Thresholds");
    group.bench_function("below_threshold", |b| b.iter(|| thresholds.exceeded(black_box(&benign))));
    group.bench_function("above_threshold", |b| b.iter(|| thresholds.exceeded(black_box(&threat))));
    group.bench_function("predicted_category", |b| b.iter(|| black_box(&threat).predicted_category()));
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("Pipeline");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let memory = CommentPipeline::new(
        Arc::new(FixedScorer(threat_scores())),
        Arc::new(InMemoryCommentStore::new()),
        Arc::new(LogNotifier),
        AlertThresholds::default(),
    );
    group.bench_function("process_memory_store", |b| {
        b.to_async(&runtime).iter(|| async { memory.process(black_box("I will kill you")).await.unwrap() })
    });

    let sqlite = CommentPipeline::new(
        Arc::new(FixedScorer(threat_scores())),
        Arc::new(SqliteCommentStore::open_in_memory().unwrap()),
        Arc::new(LogNotifier),
        AlertThresholds::default(),
    );
    group.bench_function("process_sqlite_store", |b| {
        b.to_async(&runtime).iter(|| async { sqlite.process(black_box("I will kill you")).await.unwrap() })
    });

    group.finish();
}

criterion_group!(benches, bench_alert_thresholds, bench_pipeline);
criterion_main!(benches);
