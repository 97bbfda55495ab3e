//! The compact binary representation of a sketch: `[header][buckets][samples]`,
//! with all offsets derived purely from the header fields (spec §4.1, §6).
//!
//! Nothing here owns a buffer; everything is a view (`&[u8]`/`&mut [u8]`) cast
//! through `bytemuck`, so a `Sketch` is free to be a single flat `Vec<u8>` with
//! no auxiliary index (spec §9, "flat-buffer representation, no internal
//! pointers").

use bytemuck::{Pod, Zeroable};

/// Size in bytes of the header region, including the reserved host slot.
pub const HEADER_BYTES: usize = 32;
/// Size in bytes of one [`BucketRaw`].
pub const BUCKET_BYTES: usize = 16;
/// Size in bytes of one ID slot.
pub const ID_BYTES: usize = 4;

/// The fixed-size header at offset 0 of a sketch's buffer. Field order and
/// widths match spec §6's binary format table exactly.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Header {
    /// Opaque slot reserved for a host's own framing (e.g. a length prefix).
    /// The core never reads or writes anything but `0` here.
    pub host_reserved: u32,
    /// Reserved for wire-format versioning; always `0` in this version.
    pub flags: u32,
    pub num_columns: u16,
    pub width: u16,
    pub height: u16,
    pub sample_size: u16,
    pub item_size: u16,
    _padding0: u16,
    pub count: u32,
    pub seed: u32,
}

impl Header {
    pub fn new(num_columns: u16, width: u16, height: u16, sample_size: u16, item_size: u16, seed: u32) -> Self {
        Header {
            host_reserved: 0,
            flags: 0,
            num_columns,
            width,
            height,
            sample_size,
            item_size,
            _padding0: 0,
            count: 0,
            seed,
        }
    }
}

/// One Count-Min-with-bottom-k cell (spec §3). `is_sorted` is stored as a
/// `u8` (0/1) rather than `bool` so the struct is unambiguously `Pod`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BucketRaw {
    pub total_count: u32,
    pub sample_count: u16,
    pub max_index: u16,
    pub max_hash: u32,
    pub is_sorted: u8,
    _padding0: [u8; 3],
}

impl BucketRaw {
    pub fn is_sorted(&self) -> bool {
        self.is_sorted != 0
    }

    pub fn set_sorted(&mut self, sorted: bool) {
        self.is_sorted = sorted as u8;
    }
}

const _: () = assert!(std::mem::size_of::<Header>() == HEADER_BYTES);
const _: () = assert!(std::mem::size_of::<BucketRaw>() == BUCKET_BYTES);

/// Number of `(column, row, col)` cells in a sketch of the given shape.
pub fn bucket_count(num_columns: u16, height: u16, width: u16) -> usize {
    num_columns as usize * height as usize * width as usize
}

/// Total number of ID slots across every cell.
pub fn sample_slot_count(num_columns: u16, height: u16, width: u16, sample_size: u16) -> usize {
    bucket_count(num_columns, height, width) * sample_size as usize
}

/// Byte offset of the bucket array (immediately after the header).
pub const fn bucket_array_offset() -> usize {
    HEADER_BYTES
}

/// Byte offset of the sample (ID) array.
pub fn sample_array_offset(num_columns: u16, height: u16, width: u16) -> usize {
    bucket_array_offset() + bucket_count(num_columns, height, width) * BUCKET_BYTES
}

/// Total buffer length for a sketch of the given shape.
pub fn total_buffer_len(num_columns: u16, height: u16, width: u16, sample_size: u16) -> usize {
    sample_array_offset(num_columns, height, width)
        + sample_slot_count(num_columns, height, width, sample_size) * ID_BYTES
}

/// Linear index of cell `(c, r, j)` within the bucket/sample arrays, per
/// spec §4.1: `c * W * D + r * W + j`.
pub fn cell_index(c: usize, r: usize, j: usize, height: usize, width: usize) -> usize {
    c * width * height + r * width + j
}

pub fn header(buf: &[u8]) -> &Header {
    bytemuck::from_bytes(&buf[0..HEADER_BYTES])
}

pub fn header_mut(buf: &mut [u8]) -> &mut Header {
    bytemuck::from_bytes_mut(&mut buf[0..HEADER_BYTES])
}

pub fn buckets(buf: &[u8], num_columns: u16, height: u16, width: u16) -> &[BucketRaw] {
    let start = bucket_array_offset();
    let end = start + bucket_count(num_columns, height, width) * BUCKET_BYTES;
    bytemuck::cast_slice(&buf[start..end])
}

pub fn buckets_mut(buf: &mut [u8], num_columns: u16, height: u16, width: u16) -> &mut [BucketRaw] {
    let start = bucket_array_offset();
    let end = start + bucket_count(num_columns, height, width) * BUCKET_BYTES;
    bytemuck::cast_slice_mut(&mut buf[start..end])
}

pub fn samples(buf: &[u8], num_columns: u16, height: u16, width: u16) -> &[u32] {
    let start = sample_array_offset(num_columns, height, width);
    bytemuck::cast_slice(&buf[start..])
}

pub fn samples_mut(buf: &mut [u8], num_columns: u16, height: u16, width: u16) -> &mut [u32] {
    let start = sample_array_offset(num_columns, height, width);
    bytemuck::cast_slice_mut(&mut buf[start..])
}

/// The ID slots belonging to one cell.
pub fn cell_samples<'a>(
    samples: &'a [u32],
    cell: usize,
    sample_size: u16,
) -> &'a [u32] {
    let start = cell * sample_size as usize;
    &samples[start..start + sample_size as usize]
}

pub fn cell_samples_mut<'a>(
    samples: &'a mut [u32],
    cell: usize,
    sample_size: u16,
) -> &'a mut [u32] {
    let start = cell * sample_size as usize;
    &mut samples[start..start + sample_size as usize]
}
