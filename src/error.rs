use std::{error, fmt};

/// Errors returned by the synchronous, user-facing operations of a [`crate::Sketch`].
///
/// Invariant violations (duplicate IDs within a cell, `total_count` sums that
/// disagree with `count`, an unsorted sample surviving to estimation time) are
/// implementation bugs rather than user errors and are reported via
/// `debug_assert!` at the point they would occur instead of through this enum;
/// see spec §7.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OmniSketchError {
    /// `epsilon`/`delta` out of `(0, 1]`, `num_columns == 0`, or the computed
    /// sizing overflows the `u16` header fields.
    InvalidParameter { param: &'static str, detail: String },
    /// `combine` was asked to merge sketches whose `(C, D, W, B, b)` differ,
    /// or `add`/`estimate` was called with the wrong number of column hashes.
    ShapeMismatch {
        expected_columns: u16,
        actual_columns: usize,
    },
    /// Two present-but-incompatible sketches in `combine`, or two sketches
    /// that agree on column count but disagree on matrix dimensions.
    StructuralMismatch,
    /// The sketch implied by the requested parameters (or read back from
    /// bytes) would exceed the 1 GiB host cap.
    ResourceLimit { requested_bytes: usize, limit_bytes: usize },
    /// `from_bytes` was given a buffer too short for even a header, or whose
    /// header disagrees with the buffer's actual length.
    Truncated,
}

impl fmt::Display for OmniSketchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OmniSketchError::InvalidParameter { param, detail } => {
                write!(f, "invalid parameter `{param}`: {detail}")
            }
            OmniSketchError::ShapeMismatch {
                expected_columns,
                actual_columns,
            } => write!(
                f,
                "column count mismatch: sketch has {expected_columns} columns, got {actual_columns}"
            ),
            OmniSketchError::StructuralMismatch => {
                write!(f, "sketches do not share the same (columns, width, height, sample_size, item_size)")
            }
            OmniSketchError::ResourceLimit {
                requested_bytes,
                limit_bytes,
            } => write!(
                f,
                "sketch would require {requested_bytes} bytes, exceeding the {limit_bytes} byte cap"
            ),
            OmniSketchError::Truncated => write!(f, "buffer too short to be a valid sketch"),
        }
    }
}

impl error::Error for OmniSketchError {}
