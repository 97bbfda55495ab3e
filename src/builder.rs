//! Ingests one record's pre-hashed column values into every row of every
//! column matrix (spec §4.4).

use crate::{bucket, hash, layout};

/// Inserts `id` into cell `(c, r, H_r(column_hashes[c], r) mod width)` for
/// every column `c` and row `r`.
pub fn add(buf: &mut [u8], column_hashes: &[u32], id: u32) {
    let (num_columns, height, width, sample_size) = {
        let header = layout::header(buf);
        (header.num_columns, header.height, header.width, header.sample_size)
    };

    let bucket_region_end =
        layout::bucket_array_offset() + layout::bucket_count(num_columns, height, width) * layout::BUCKET_BYTES;
    let (head, tail) = buf.split_at_mut(bucket_region_end);
    let buckets = layout::buckets_mut(head, num_columns, height, width);
    let samples = bytemuck::cast_slice_mut::<u8, u32>(tail);

    for (c, &x) in column_hashes.iter().enumerate() {
        for r in 0..height as usize {
            let j = hash::row_hash(x, r as u32, width) as usize;
            let cell = layout::cell_index(c, r, j, height as usize, width as usize);
            let ids = layout::cell_samples_mut(samples, cell, sample_size);
            bucket::insert(&mut buckets[cell], ids, id);
        }
    }
}
