//! Merges two structurally compatible sketches bucket-by-bucket, preserving
//! the bottom-k property (spec §4.5).

use crate::{
    bucket::priority_key,
    layout::{self, BucketRaw, Header},
};

/// True iff two headers describe the same `(C, D, W, B, b)` shape, the
/// precondition `combine` requires (spec §4.5).
pub fn shapes_match(a: &Header, b: &Header) -> bool {
    a.num_columns == b.num_columns
        && a.width == b.width
        && a.height == b.height
        && a.sample_size == b.sample_size
        && a.item_size == b.item_size
}

/// Merges two same-shaped sketch buffers into a freshly allocated buffer.
/// Callers must have already verified `shapes_match`.
pub fn combine(a: &[u8], b: &[u8]) -> Vec<u8> {
    let a_header = *layout::header(a);
    let b_header = *layout::header(b);
    debug_assert!(shapes_match(&a_header, &b_header));

    let num_columns = a_header.num_columns;
    let height = a_header.height;
    let width = a_header.width;
    let sample_size = a_header.sample_size;

    let total_len = layout::total_buffer_len(num_columns, height, width, sample_size);
    let mut out = vec![0u8; total_len];
    *layout::header_mut(&mut out) = Header::new(
        num_columns,
        width,
        height,
        sample_size,
        a_header.item_size,
        a_header.seed,
    );
    layout::header_mut(&mut out).count = a_header.count + b_header.count;

    let cells = layout::bucket_count(num_columns, height, width);
    let a_buckets = layout::buckets(a, num_columns, height, width);
    let b_buckets = layout::buckets(b, num_columns, height, width);
    let a_samples = layout::samples(a, num_columns, height, width);
    let b_samples = layout::samples(b, num_columns, height, width);

    let bucket_region_end =
        layout::bucket_array_offset() + cells * layout::BUCKET_BYTES;
    let (head, tail) = out.split_at_mut(bucket_region_end);
    let out_buckets = layout::buckets_mut(head, num_columns, height, width);
    let out_samples = bytemuck::cast_slice_mut::<u8, u32>(tail);

    for cell in 0..cells {
        let a_ids = layout::cell_samples(a_samples, cell, sample_size);
        let b_ids = layout::cell_samples(b_samples, cell, sample_size);
        let out_ids = layout::cell_samples_mut(out_samples, cell, sample_size);
        merge_cell(
            &mut out_buckets[cell],
            out_ids,
            &a_buckets[cell],
            a_ids,
            &b_buckets[cell],
            b_ids,
        );
    }

    out
}

/// Two-pointer bottom-k merge of one cell, capped at the cell's capacity.
/// Materializes both inputs sorted (reusing `is_sorted` when true), then
/// walks them in lockstep emitting the smaller key, collapsing equal IDs
/// from the two inputs into a single emission (Open Question #2).
fn merge_cell(
    out_bucket: &mut BucketRaw,
    out_ids: &mut [u32],
    a_bucket: &BucketRaw,
    a_ids: &[u32],
    b_bucket: &BucketRaw,
    b_ids: &[u32],
) {
    out_bucket.total_count = a_bucket.total_count + b_bucket.total_count;

    let mut a_sorted: Vec<u32> = a_ids[..a_bucket.sample_count as usize].to_vec();
    if !a_bucket.is_sorted() {
        a_sorted.sort_unstable_by_key(|&id| priority_key(id));
    }
    let mut b_sorted: Vec<u32> = b_ids[..b_bucket.sample_count as usize].to_vec();
    if !b_bucket.is_sorted() {
        b_sorted.sort_unstable_by_key(|&id| priority_key(id));
    }

    let capacity = out_ids.len();
    let (mut i, mut j, mut n) = (0usize, 0usize, 0usize);
    while n < capacity && (i < a_sorted.len() || j < b_sorted.len()) {
        let next = match (a_sorted.get(i), b_sorted.get(j)) {
            (Some(&ai), Some(&bj)) => {
                let (ka, kb) = (priority_key(ai), priority_key(bj));
                if ka < kb {
                    i += 1;
                    ai
                } else if kb < ka {
                    j += 1;
                    bj
                } else {
                    // Equal (H_s, id) keys with distinct ids would collide
                    // under §4.3's tie-break rule, so an equal key implies an
                    // equal id: at most one emission (Open Question #2).
                    debug_assert_eq!(ai, bj);
                    i += 1;
                    j += 1;
                    ai
                }
            }
            (Some(&ai), None) => {
                i += 1;
                ai
            }
            (None, Some(&bj)) => {
                j += 1;
                bj
            }
            (None, None) => unreachable!(),
        };
        out_ids[n] = next;
        n += 1;
    }

    out_bucket.sample_count = n as u16;
    if n > 0 {
        out_bucket.max_index = (n - 1) as u16;
        out_bucket.max_hash = priority_key(out_ids[n - 1]).0;
    } else {
        out_bucket.max_index = 0;
        out_bucket.max_hash = 0;
    }
    out_bucket.set_sorted(true);
}
