//! Per-cell bottom-k reservoir maintenance (spec §4.3). A cell is a
//! `BucketRaw` (metadata) plus its `[u32]` ID slots; this module is the only
//! place that mutates either.

use crate::{hash::id_priority, layout::BucketRaw};

/// `(H_s(id), id)` ordering key used throughout for bottom-k selection,
/// sorting, and merging (spec §4.3's tie-break rule).
#[inline]
pub(crate) fn priority_key(id: u32) -> (u32, u32) {
    (id_priority(id), id)
}

/// Inserts `id` into a cell, maintaining the bottom-`B` (smallest `H_s`)
/// invariant. `ids` is the cell's full `sample_size`-length slot array;
/// only the first `bucket.sample_count` entries are meaningful.
pub fn insert(bucket: &mut BucketRaw, ids: &mut [u32], id: u32) {
    bucket.total_count += 1;
    let capacity = ids.len();
    let key = priority_key(id);

    if (bucket.sample_count as usize) < capacity {
        let idx = bucket.sample_count as usize;
        debug_assert!(
            !ids[..idx].contains(&id),
            "duplicate id inserted into a cell (invariant 5)"
        );
        ids[idx] = id;
        bucket.sample_count += 1;
        if bucket.sample_count == 1 || key > (bucket.max_hash, ids[bucket.max_index as usize]) {
            bucket.max_index = idx as u16;
            bucket.max_hash = key.0;
        }
        bucket.set_sorted(false);
        return;
    }

    let current_max_key = (bucket.max_hash, ids[bucket.max_index as usize]);
    if key < current_max_key {
        let evict_idx = bucket.max_index as usize;
        debug_assert!(
            !ids[..bucket.sample_count as usize].contains(&id),
            "duplicate id inserted into a cell (invariant 5)"
        );
        ids[evict_idx] = id;
        recompute_max(bucket, ids);
        bucket.set_sorted(false);
    }
    // else: id's priority does not beat the current worst-of-the-best; discard.
}

/// Rescans `ids[0..bucket.sample_count]` to find the element with the
/// largest `(H_s, id)` key, per spec §4.3's post-eviction step.
fn recompute_max(bucket: &mut BucketRaw, ids: &[u32]) {
    let n = bucket.sample_count as usize;
    debug_assert!(n > 0);
    let mut best = 0usize;
    let mut best_key = priority_key(ids[0]);
    for (i, &candidate) in ids.iter().enumerate().take(n).skip(1) {
        let k = priority_key(candidate);
        if k > best_key {
            best = i;
            best_key = k;
        }
    }
    bucket.max_index = best as u16;
    bucket.max_hash = best_key.0;
}

/// Sorts a cell's samples under `(H_s, id)` and marks it canonical, per
/// spec §4.6. A no-op for cells with fewer than 2 samples beyond flagging
/// them sorted.
pub fn finalize_cell(bucket: &mut BucketRaw, ids: &mut [u32]) {
    let n = bucket.sample_count as usize;
    if n == 0 {
        return;
    }
    if n >= 2 && !bucket.is_sorted() {
        ids[..n].sort_unstable_by_key(|&id| priority_key(id));
    }
    bucket.max_index = (n - 1) as u16;
    bucket.max_hash = priority_key(ids[n - 1]).0;
    bucket.set_sorted(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    fn empty_bucket(capacity: usize) -> (BucketRaw, Vec<u32>) {
        (BucketRaw::zeroed(), vec![0u32; capacity])
    }

    #[test]
    fn fills_up_to_capacity_then_conditionally_evicts() {
        let (mut bucket, mut ids) = empty_bucket(4);
        for id in [10u32, 20, 30, 40] {
            insert(&mut bucket, &mut ids, id);
        }
        assert_eq!(bucket.sample_count, 4);
        assert_eq!(bucket.total_count, 4);

        // A fifth insert either evicts the current max or is discarded; either
        // way sample_count stays capped at capacity and total_count keeps
        // growing (P1: total_count tracks every insert, sample_count does not).
        insert(&mut bucket, &mut ids, 50);
        assert_eq!(bucket.sample_count, 4);
        assert_eq!(bucket.total_count, 5);
    }

    #[test]
    fn max_hash_always_matches_the_stored_max_index() {
        let (mut bucket, mut ids) = empty_bucket(3);
        for id in [100u32, 7, 999, 1, 55, 0xdead_beef, 2] {
            insert(&mut bucket, &mut ids, id);
            let n = bucket.sample_count as usize;
            let max_key = ids[..n]
                .iter()
                .map(|&x| priority_key(x))
                .max()
                .unwrap();
            assert_eq!(bucket.max_hash, max_key.0);
            assert_eq!(priority_key(ids[bucket.max_index as usize]), max_key);
        }
    }

    #[test]
    fn keeps_exactly_the_smallest_hs_ids_among_everything_seen() {
        let capacity = 5;
        let (mut bucket, mut ids) = empty_bucket(capacity);
        let stream: Vec<u32> = (0..500).collect();
        for &id in &stream {
            insert(&mut bucket, &mut ids, id);
        }
        let mut expected: Vec<u32> = stream.clone();
        expected.sort_unstable_by_key(|&id| priority_key(id));
        let expected_set: std::collections::HashSet<u32> =
            expected.into_iter().take(capacity).collect();
        let actual_set: std::collections::HashSet<u32> =
            ids[..bucket.sample_count as usize].iter().copied().collect();
        assert_eq!(expected_set, actual_set);
        assert_eq!(bucket.total_count as usize, stream.len());
    }

    #[test]
    fn finalize_sorts_and_sets_max_index_to_last_slot() {
        let (mut bucket, mut ids) = empty_bucket(4);
        for id in [300u32, 1, 77, 2] {
            insert(&mut bucket, &mut ids, id);
        }
        finalize_cell(&mut bucket, &mut ids);
        assert!(bucket.is_sorted());
        assert_eq!(bucket.max_index as usize, bucket.sample_count as usize - 1);
        let n = bucket.sample_count as usize;
        for w in ids[..n].windows(2) {
            assert!(priority_key(w[0]) < priority_key(w[1]));
        }
    }

    #[test]
    fn finalize_is_idempotent() {
        let (mut bucket, mut ids) = empty_bucket(4);
        for id in [9u32, 4, 200, 3] {
            insert(&mut bucket, &mut ids, id);
        }
        finalize_cell(&mut bucket, &mut ids);
        let once = ids.clone();
        finalize_cell(&mut bucket, &mut ids);
        assert_eq!(once, ids);
    }
}
