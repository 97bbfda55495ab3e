//! Literal end-to-end scenarios with deterministic seeds, one per test.

use omnisketch::{OmniSketchError, Sketch};

fn perfectly_correlated(n: u32, epsilon: f64, delta: f64, seed: u32) -> Sketch {
    let mut sketch = Sketch::new_with_seed(epsilon, delta, 2, seed).unwrap();
    for i in 0..n {
        sketch.add(&[i % 100, i % 100]).unwrap();
    }
    sketch.finalize();
    sketch
}

#[test]
fn perfect_correlation() {
    let sketch = perfectly_correlated(100_000, 0.01, 0.01, 1);
    for q in 1..=10u32 {
        let matching = sketch.estimate(&[q, q]).unwrap();
        assert!((500..=1500).contains(&matching), "q={q} estimate={matching}");
        let mismatched = sketch.estimate(&[q, q + 1]).unwrap();
        assert!(mismatched < 500, "q={q} mismatched estimate={mismatched}");
    }
}

#[test]
fn wrong_shape_is_rejected() {
    let sketch = Sketch::new_with_seed(0.01, 0.01, 2, 1).unwrap();
    let err = sketch.estimate(&[1, 2, 3]).unwrap_err();
    assert!(matches!(err, OmniSketchError::ShapeMismatch { expected_columns: 2, actual_columns: 3 }));
}

#[test]
fn parallel_build_matches_the_single_shard_bounds() {
    let shard_count = 10u32;
    let mut shards: Vec<Sketch> = (0..shard_count)
        .map(|s| Sketch::new_with_seed(0.01, 0.01, 2, 100 + s).unwrap())
        .collect();
    for i in 0..100_000u32 {
        let shard = (i % shard_count) as usize;
        shards[shard].add(&[i % 100, i % 100]).unwrap();
    }

    let mut merged = shards
        .into_iter()
        .reduce(|a, b| a.combine_with(&b).unwrap())
        .unwrap();
    merged.finalize();

    for q in 1..=10u32 {
        let matching = merged.estimate(&[q, q]).unwrap();
        assert!((500..=1500).contains(&matching), "q={q} estimate={matching}");
        let mismatched = merged.estimate(&[q, q + 1]).unwrap();
        assert!(mismatched < 500, "q={q} mismatched estimate={mismatched}");
    }
}

#[test]
fn empty_sketch_estimates_zero() {
    let sketch = Sketch::new_with_seed(0.01, 0.01, 2, 1).unwrap();
    assert_eq!(sketch.count(), 0);
    assert_eq!(sketch.estimate(&[1, 2]).unwrap(), 0);
}

#[test]
fn combined_count_is_the_sum_of_shard_counts() {
    let shard_count = 10u32;
    let mut shards: Vec<Sketch> = (0..shard_count)
        .map(|s| Sketch::new_with_seed(0.01, 0.01, 2, 200 + s).unwrap())
        .collect();
    for i in 0..100_000u32 {
        let shard = (i % shard_count) as usize;
        shards[shard].add(&[i % 100, i % 100]).unwrap();
    }
    let expected_total: u64 = shards.iter().map(|s| s.count()).sum();
    let merged = shards.into_iter().reduce(|a, b| a.combine_with(&b).unwrap()).unwrap();
    assert_eq!(merged.count(), expected_total);
    assert_eq!(merged.count(), 100_000);
}

#[test]
fn scale_up_to_a_million_records() {
    let sketch = perfectly_correlated(1_000_000, 0.01, 0.01, 1);
    for q in 1..=10u32 {
        let matching = sketch.estimate(&[q, q]).unwrap();
        assert!((5_000..=15_000).contains(&matching), "q={q} estimate={matching}");
    }
}

#[test]
fn per_row_total_count_conservation_holds_after_ingest_and_merge() {
    let shard_count = 4u32;
    let mut shards: Vec<Sketch> = (0..shard_count)
        .map(|s| Sketch::new_with_seed(0.05, 0.05, 2, 300 + s).unwrap())
        .collect();
    for i in 0..20_000u32 {
        let shard = (i % shard_count) as usize;
        shards[shard].add(&[i % 50, i % 30]).unwrap();
    }
    let merged = shards.into_iter().reduce(|a, b| a.combine_with(&b).unwrap()).unwrap();

    for c in 0..merged.num_columns() {
        for r in 0..merged.height() {
            let sum: u64 = (0..merged.width())
                .map(|j| merged.bucket_total_count(c, r, j) as u64)
                .sum();
            assert_eq!(sum, merged.count());
        }
    }
}
