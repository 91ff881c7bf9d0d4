use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use survival_fairness::explainability::Explainer;
use survival_fairness::inference::Predictor;
use survival_fairness::preprocessing::Preprocessor;
use survival_fairness::synthetic::{generate, SyntheticConfig};
use survival_fairness::training::{ModelType, Trainer, TrainingConfig};

fn bench_preprocessing(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocessing");

    for n_rows in [891, 5000].iter() {
        let dataset = generate(&SyntheticConfig::default().with_n_samples(*n_rows)).unwrap();

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &dataset, |b, dataset| {
            b.iter(|| Preprocessor::fit(black_box(dataset.records())).unwrap())
        });
    }

    group.finish();
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    let dataset = generate(&SyntheticConfig::default()).unwrap();
    for model_type in ModelType::ALL {
        let config = TrainingConfig::default().with_candidates(vec![model_type]);

        group.bench_with_input(BenchmarkId::new("train", model_type.name()), &config, |b, config| {
            b.iter(|| Trainer::new(config.clone()).train(black_box(&dataset)).unwrap())
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    // Train model once
    let dataset = generate(&SyntheticConfig::default()).unwrap();
    let outcome = Trainer::new(TrainingConfig::default().with_n_estimators(50))
        .train(&dataset)
        .unwrap();
    let predictor = Predictor::new(outcome.model, outcome.preprocessor);
    let records = dataset.records();

    group.bench_function("single", |b| b.iter(|| predictor.predict(black_box(&records[0])).unwrap()));

    group.bench_function("batch_891", |b| b.iter(|| predictor.batch_predict(black_box(records))));

    let explainer = Explainer::new(&predictor);
    group.bench_function("explain", |b| b.iter(|| explainer.explain(black_box(&records[0])).unwrap()));

    group.finish();
}

criterion_group!(benches, bench_preprocessing, bench_training, bench_prediction);
criterion_main!(benches);
