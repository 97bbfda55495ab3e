//! Intersects per-row bucket samples across all queried columns and scales
//! by the largest counted bucket (spec §4.7).

use std::collections::HashSet;

use crate::{error::OmniSketchError, hash, layout};

pub fn estimate(buf: &[u8], column_hashes: &[u32]) -> Result<i64, OmniSketchError> {
    let header = *layout::header(buf);
    if column_hashes.len() != header.num_columns as usize {
        return Err(OmniSketchError::ShapeMismatch {
            expected_columns: header.num_columns,
            actual_columns: column_hashes.len(),
        });
    }
    if header.count == 0 {
        return Ok(0);
    }

    let (num_columns, height, width, sample_size) =
        (header.num_columns, header.height, header.width, header.sample_size);
    let buckets = layout::buckets(buf, num_columns, height, width);
    let samples = layout::samples(buf, num_columns, height, width);

    let mut max_count: u32 = 0;
    let mut candidate: Option<HashSet<u32>> = None;

    for (c, &x) in column_hashes.iter().enumerate() {
        for r in 0..height as usize {
            let j = hash::row_hash(x, r as u32, width) as usize;
            let cell = layout::cell_index(c, r, j, height as usize, width as usize);
            let bucket = &buckets[cell];

            max_count = max_count.max(bucket.total_count);
            debug_assert!(
                bucket.sample_count < 2 || bucket.is_sorted(),
                "unsorted sample observed during estimation (invariant violation, call finalize() first)"
            );

            let ids = layout::cell_samples(samples, cell, sample_size);
            let cell_set: HashSet<u32> = ids[..bucket.sample_count as usize].iter().copied().collect();

            candidate = Some(match candidate {
                None => cell_set,
                Some(prev) => prev.intersection(&cell_set).copied().collect(),
            });
        }
    }

    let surviving = candidate.map(|s| s.len()).unwrap_or(0) as u64;
    let estimate = (max_count as u64 * surviving) / header.sample_size.max(1) as u64;
    Ok(estimate as i64)
}
