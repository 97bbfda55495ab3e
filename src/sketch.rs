//! The public handle over a sketch's flat buffer: construction, ingestion,
//! merging, finalization, estimation, and byte-level (de)serialization.

use crate::{builder, combiner, error::OmniSketchError, estimator, finalize, hash, layout, sizing};

/// A multi-dimensional Count-Min sketch with per-bucket bottom-k ID sampling.
///
/// Built for conjunctive equality-predicate cardinality estimation: given a
/// tuple of per-column hash values, `estimate` returns how many ingested
/// records matched all of them, without ever materializing the records
/// themselves. See the crate documentation for the shape of the underlying
/// `(C, D, W, B, b)` matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sketch {
    buf: Vec<u8>,
}

impl Sketch {
    /// Allocates a new, empty sketch sized for `(epsilon, delta)` accuracy
    /// over `num_columns` predicate columns, seeded from the host RNG.
    pub fn new(epsilon: f64, delta: f64, num_columns: i64) -> Result<Self, OmniSketchError> {
        Self::new_with_seed(epsilon, delta, num_columns, rand::random())
    }

    /// As [`Sketch::new`], but with an explicit seed. Exists so tests and
    /// callers who need byte-for-byte reproducibility don't have to depend
    /// on the host RNG.
    pub fn new_with_seed(epsilon: f64, delta: f64, num_columns: i64, seed: u32) -> Result<Self, OmniSketchError> {
        debug_assert!(cfg!(target_endian = "little"), "sketch wire format assumes a little-endian host");
        let dims = sizing::Dims::compute(epsilon, delta, num_columns)?;
        let total_len = layout::total_buffer_len(dims.num_columns, dims.height, dims.width, dims.sample_size);
        let mut buf = vec![0u8; total_len];
        *layout::header_mut(&mut buf) = layout::Header::new(
            dims.num_columns,
            dims.width,
            dims.height,
            dims.sample_size,
            dims.item_size,
            seed,
        );
        Ok(Sketch { buf })
    }

    /// Ingests one record, given its already-hashed value in each predicate
    /// column. The record's own ID is derived internally from the sketch's
    /// monotonically increasing ingest count, so callers never supply IDs.
    pub fn add(&mut self, column_hashes: &[u32]) -> Result<(), OmniSketchError> {
        let num_columns = self.num_columns();
        if column_hashes.len() != num_columns as usize {
            return Err(OmniSketchError::ShapeMismatch {
                expected_columns: num_columns,
                actual_columns: column_hashes.len(),
            });
        }
        let header = layout::header_mut(&mut self.buf);
        if header.count == u32::MAX {
            // count is a u32 wire field; incrementing past u32::MAX would wrap
            // and silently violate invariant 2 (Sigma total_count == count).
            return Err(OmniSketchError::ResourceLimit {
                requested_bytes: header.count as usize + 1,
                limit_bytes: u32::MAX as usize,
            });
        }
        header.count += 1;
        let n = header.count;
        let seed = header.seed;
        let id = hash::record_id(n, seed);
        builder::add(&mut self.buf, column_hashes, id);
        Ok(())
    }

    /// Merges `self` and `other` into a freshly allocated sketch. Both
    /// inputs must share the same `(C, D, W, B, b)` shape.
    pub fn combine_with(&self, other: &Sketch) -> Result<Sketch, OmniSketchError> {
        let (a_header, b_header) = (*layout::header(&self.buf), *layout::header(&other.buf));
        if a_header.num_columns != b_header.num_columns {
            return Err(OmniSketchError::ShapeMismatch {
                expected_columns: a_header.num_columns,
                actual_columns: b_header.num_columns as usize,
            });
        }
        if !combiner::shapes_match(&a_header, &b_header) {
            return Err(OmniSketchError::StructuralMismatch);
        }
        Ok(Sketch {
            buf: combiner::combine(&self.buf, &other.buf),
        })
    }

    /// Sorts every cell's samples into canonical `(H_s, id)` order, a
    /// precondition for `estimate`. Idempotent.
    pub fn finalize(&mut self) {
        finalize::finalize(&mut self.buf);
    }

    /// True iff every cell with at least two samples is in canonical order.
    pub fn is_finalized(&self) -> bool {
        let header = *layout::header(&self.buf);
        layout::buckets(&self.buf, header.num_columns, header.height, header.width)
            .iter()
            .all(|b| b.sample_count < 2 || b.is_sorted())
    }

    /// Estimates how many ingested records match every predicate in
    /// `column_hashes`, one hash per column, in the sketch's column order.
    pub fn estimate(&self, column_hashes: &[u32]) -> Result<i64, OmniSketchError> {
        estimator::estimate(&self.buf, column_hashes)
    }

    pub fn count(&self) -> u64 {
        layout::header(&self.buf).count as u64
    }

    pub fn num_columns(&self) -> u16 {
        layout::header(&self.buf).num_columns
    }

    pub fn width(&self) -> u16 {
        layout::header(&self.buf).width
    }

    pub fn height(&self) -> u16 {
        layout::header(&self.buf).height
    }

    pub fn sample_size(&self) -> u16 {
        layout::header(&self.buf).sample_size
    }

    pub fn item_size(&self) -> u16 {
        layout::header(&self.buf).item_size
    }

    pub fn seed(&self) -> u32 {
        layout::header(&self.buf).seed
    }

    /// The `total_count` recorded at cell `(c, r, j)`, exposed mainly so
    /// callers (and tests) can verify the per-row conservation property:
    /// summing over `j` at any fixed `(c, r)` always yields `self.count()`.
    pub fn bucket_total_count(&self, c: u16, r: u16, j: u16) -> u32 {
        let header = *layout::header(&self.buf);
        let cell = layout::cell_index(c as usize, r as usize, j as usize, header.height as usize, header.width as usize);
        layout::buckets(&self.buf, header.num_columns, header.height, header.width)[cell].total_count
    }

    /// The sketch's raw flat buffer: `[header][buckets][samples]`, already
    /// in wire order on any little-endian host.
    pub fn to_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Reconstructs a sketch from a buffer previously produced by
    /// `to_bytes`, validating only that the header is self-consistent with
    /// the buffer's length. Performs no further parsing.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, OmniSketchError> {
        if bytes.len() < layout::HEADER_BYTES {
            return Err(OmniSketchError::Truncated);
        }
        let header = *layout::header(&bytes);
        if header.num_columns == 0 {
            return Err(OmniSketchError::InvalidParameter {
                param: "num_columns",
                detail: "decoded header has num_columns == 0".to_string(),
            });
        }
        if header.width == 0 {
            return Err(OmniSketchError::InvalidParameter {
                param: "width",
                detail: "decoded header has width == 0".to_string(),
            });
        }
        if header.height == 0 {
            return Err(OmniSketchError::InvalidParameter {
                param: "height",
                detail: "decoded header has height == 0".to_string(),
            });
        }
        let expected_len =
            layout::total_buffer_len(header.num_columns, header.height, header.width, header.sample_size);
        if bytes.len() != expected_len {
            return Err(OmniSketchError::Truncated);
        }
        Ok(Sketch { buf: bytes })
    }
}

/// Null-propagating merge, matching spec §4.5/§6's table for combining
/// optional partial sketches (e.g. one per worker shard, some of which may
/// never have seen any data): `None` is the merge identity.
pub fn combine(a: Option<Sketch>, b: Option<Sketch>) -> Result<Option<Sketch>, OmniSketchError> {
    match (a, b) {
        (None, None) => Ok(None),
        (Some(x), None) => Ok(Some(x)),
        (None, Some(y)) => Ok(Some(y)),
        (Some(x), Some(y)) => x.combine_with(&y).map(Some),
    }
}
