use criterion::{criterion_group, criterion_main, Criterion};
use gwindows::prelude::*;
use gwindows::test_utilities::{random_features, random_seqlens, NRANDOM_ANNOTATIONS};
use rand::{rngs::StdRng, Rng, SeedableRng};

const BATCH_SIZE: usize = 256;

fn bench_sparse(c: &mut Criterion) {
    // create the benchmark group
    let mut group = c.benchmark_group("sparse");

    // create the test data
    let mut rng = StdRng::seed_from_u64(0);
    let seqlens = random_seqlens(&mut rng);
    let names = ["peak", "enhancer", "promoter"];
    let sources = vec![
        random_features(NRANDOM_ANNOTATIONS, &seqlens, &names, 1),
        random_features(NRANDOM_ANNOTATIONS, &seqlens, &names, 2),
    ];
    let annotation_list: Vec<String> = names.iter().map(|n| n.to_string()).collect();

    // configure the sample size for the group
    group.sample_size(10);

    group.bench_function("build_all_negatives", |b| {
        let config = SparseConfig {
            negative_ratio: NegativeRatio::All,
            ..SparseConfig::new(annotation_list.clone())
        };
        b.iter(|| {
            let indexer =
                SparseIntervalIndexer::from_sources(sources.clone(), &config).unwrap();
            indexer.len()
        });
    });

    let config = SparseConfig {
        seq_len: SeqLen::Fixed(1000),
        negative_ratio: NegativeRatio::All,
        augmentation: Augmentation::All,
        ..SparseConfig::new(annotation_list.clone())
    };
    let indexer = SparseIntervalIndexer::from_sources(sources.clone(), &config).unwrap();
    let batches: Vec<Vec<usize>> = (0..100)
        .map(|_| {
            (0..BATCH_SIZE)
                .map(|_| rng.gen_range(0..indexer.len()))
                .collect()
        })
        .collect();

    group.bench_function("random_batches", |b| {
        b.iter(|| {
            batches
                .iter()
                .map(|batch| indexer.get(batch).unwrap().len())
                .sum::<usize>()
        });
    });
}

fn bench_continuous(c: &mut Criterion) {
    let mut group = c.benchmark_group("continuous");

    let mut rng = StdRng::seed_from_u64(0);
    let seqlens = random_seqlens(&mut rng);
    let signal = BedGraphSignal::new(seqlens, vec![Vec::new()]).unwrap();
    let config = ContinuousConfig {
        ignore_targets: true,
        ..ContinuousConfig::new(1000)
    };
    let indexer = ContinuousSignalIndexer::new(signal, &config).unwrap();
    let indices: Vec<usize> = (0..BATCH_SIZE * 100)
        .map(|_| rng.gen_range(0..indexer.len()))
        .collect();

    group.bench_function("locate", |b| {
        b.iter(|| {
            indices
                .iter()
                .filter_map(|&i| indexer.mapper().locate(i))
                .count()
        });
    });
}

criterion_group!(benches, bench_sparse, bench_continuous);
criterion_main!(benches);
