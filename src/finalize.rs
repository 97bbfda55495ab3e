//! Walks every cell of a sketch into canonical sorted form (spec §4.6).

use crate::{bucket, layout};

pub fn finalize(buf: &mut [u8]) {
    let (num_columns, height, width, sample_size) = {
        let header = layout::header(buf);
        (header.num_columns, header.height, header.width, header.sample_size)
    };
    let cells = layout::bucket_count(num_columns, height, width);

    // Buckets and samples live in disjoint regions of the same buffer, so we
    // split the buffer once up front rather than re-borrowing it per cell.
    let bucket_region_end = layout::bucket_array_offset() + cells * layout::BUCKET_BYTES;
    let (head, tail) = buf.split_at_mut(bucket_region_end);
    let buckets = layout::buckets_mut(head, num_columns, height, width);
    let samples = bytemuck::cast_slice_mut::<u8, u32>(tail);

    for (cell, bucket) in buckets.iter_mut().enumerate() {
        let ids = layout::cell_samples_mut(samples, cell, sample_size);
        bucket::finalize_cell(bucket, ids);
    }
}
