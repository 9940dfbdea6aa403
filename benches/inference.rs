//! Inference benchmark: feature extraction and classifier predict per event.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ransom_guard::config::ClassifierConfig;
use ransom_guard::features::{extract_features, FeatureVector, FEATURE_NAMES};
use ransom_guard::model::Classifier;
use std::path::Path;
use tempfile::tempdir;

fn write_dataset(path: &Path, rows: usize) {
    let mut out = FEATURE_NAMES.join(",") + ",Benign\n";
    for i in 0..rows {
        let benign = i % 2;
        let v = if benign == 1 { 100 + i } else { i % 7 };
        let cells = vec![v.to_string(); FEATURE_NAMES.len()].join(",");
        out.push_str(&format!("{cells},{benign}\n"));
    }
    std::fs::write(path, out).unwrap();
}

fn trained(rows: usize) -> Classifier {
    let dir = tempdir().unwrap();
    let path = dir.path().join("train.csv");
    write_dataset(&path, rows);
    Classifier::train(&path, &ClassifierConfig::default()).unwrap()
}

fn bench_predict(c: &mut Criterion) {
    let classifier = trained(200);
    let fv = FeatureVector {
        values: vec![0.0; FEATURE_NAMES.len()],
        event_id: "bench".to_string(),
    };

    c.bench_function("classifier_predict_9f", |b| {
        b.iter(|| classifier.predict(black_box(&fv)))
    });
}

fn bench_extract_and_predict(c: &mut Criterion) {
    let classifier = trained(200);
    let dir = tempdir().unwrap();
    let path = dir.path().join("invoice.pdf");
    std::fs::write(&path, vec![0u8; 4096]).unwrap();

    c.bench_function("extract_then_predict", |b| {
        b.iter(|| {
            let fv = extract_features("bench", black_box(&path), None, classifier.feature_names());
            black_box(classifier.predict(&fv))
        })
    });
}

fn bench_training(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let mut g = c.benchmark_group("classifier_train_by_rows");
    g.sample_size(10);
    for rows in [100, 1_000, 5_000] {
        let path = dir.path().join(format!("train_{rows}.csv"));
        write_dataset(&path, rows);
        g.bench_function(format!("rows_{}", rows).as_str(), |b| {
            b.iter(|| Classifier::train(black_box(&path), &ClassifierConfig::default()))
        });
    }
    g.finish();
}

criterion_group!(benches, bench_predict, bench_extract_and_predict, bench_training);
criterion_main!(benches);
