use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use shoptrend::schema::{self, Record};
use shoptrend::training::{ModelKind, Trainer, TrainingConfig};

const SEASONS: [&str; 4] = ["Winter", "Spring", "Summer", "Fall"];
const SIZES: [&str; 4] = ["S", "M", "L", "XL"];
const CATEGORIES: [&str; 4] = ["Clothing", "Footwear", "Accessories", "Outerwear"];

fn create_purchase_data(n_rows: usize) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let category: Vec<&str> = (0..n_rows).map(|_| *CATEGORIES.choose(&mut rng).unwrap()).collect();
    let amount: Vec<f64> = category
        .iter()
        .map(|c| {
            let base = match *c {
                "Clothing" => 40.0,
                "Footwear" => 70.0,
                "Accessories" => 30.0,
                _ => 90.0,
            };
            base + rng.gen::<f64>() * 20.0
        })
        .collect();
    let age: Vec<i64> = (0..n_rows).map(|_| rng.gen_range(18..70)).collect();
    let season: Vec<&str> = (0..n_rows).map(|_| *SEASONS.choose(&mut rng).unwrap()).collect();
    let size: Vec<&str> = (0..n_rows).map(|_| *SIZES.choose(&mut rng).unwrap()).collect();
    let rating: Vec<f64> = (0..n_rows).map(|_| 2.5 + rng.gen::<f64>() * 2.5).collect();

    df!(
        schema::AGE => age,
        schema::PURCHASE_AMOUNT => amount,
        schema::SIZE => size,
        schema::SEASON => season,
        schema::REVIEW_RATING => rating,
        schema::CATEGORY => category,
    )
    .unwrap()
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [1000, 4000].iter() {
        let df = create_purchase_data(*n_rows);

        for kind in ModelKind::ALL {
            group.bench_with_input(
                BenchmarkId::new(kind.as_str(), n_rows),
                &df,
                |b, df| {
                    b.iter(|| {
                        let config = TrainingConfig::new(kind).with_n_estimators(50);
                        Trainer::new(config).train(black_box(df)).unwrap()
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    let train_df = create_purchase_data(4000);
    let record = Record::new()
        .with(schema::AGE, 35i64)
        .with(schema::PURCHASE_AMOUNT, 55.0)
        .with(schema::SIZE, "M")
        .with(schema::SEASON, "Winter")
        .with(schema::REVIEW_RATING, 3.8);

    for kind in ModelKind::ALL {
        let pipeline = Trainer::new(TrainingConfig::new(kind))
            .train(&train_df)
            .unwrap()
            .pipeline;

        group.bench_function(BenchmarkId::new("predict", kind.as_str()), |b| {
            b.iter(|| pipeline.predict(black_box(&record)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_training, bench_prediction);
criterion_main!(benches);
