//! Translates accuracy parameters `(epsilon, delta)` into concrete matrix
//! dimensions, per spec §4.1.

use crate::{error::OmniSketchError, layout};

/// The host-enforced upper bound on a single sketch's resident size (spec §5).
pub const RESOURCE_LIMIT_BYTES: usize = 1 << 30;

/// Concrete dimensions derived from `(epsilon, delta)`, plus the column count
/// the caller asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dims {
    pub num_columns: u16,
    pub width: u16,
    pub height: u16,
    pub sample_size: u16,
    pub item_size: u16,
}

impl Dims {
    /// Implements spec §4.1's sizing rule and validates the result against
    /// the `u16` header fields and the 1 GiB resource cap.
    pub fn compute(epsilon: f64, delta: f64, num_columns: i64) -> Result<Self, OmniSketchError> {
        if !(epsilon > 0.0 && epsilon <= 1.0) {
            return Err(OmniSketchError::InvalidParameter {
                param: "epsilon",
                detail: format!("{epsilon} is not in (0, 1]"),
            });
        }
        if !(delta > 0.0 && delta <= 1.0) {
            return Err(OmniSketchError::InvalidParameter {
                param: "delta",
                detail: format!("{delta} is not in (0, 1]"),
            });
        }
        if num_columns <= 0 {
            return Err(OmniSketchError::InvalidParameter {
                param: "num_columns",
                detail: format!("{num_columns} is not positive"),
            });
        }

        let height = (2.0_f64 / delta).ln().ceil();
        let height_usize = height as usize;
        if height_usize == 0 || height_usize > u16::MAX as usize {
            return Err(OmniSketchError::InvalidParameter {
                param: "delta",
                detail: format!("height {height} does not fit in the sketch's u16 header field"),
            });
        }

        let width = 1.0 + std::f64::consts::E * ((epsilon + 1.0) / epsilon).powf(1.0 / height);
        let width_usize = width.ceil() as usize;
        if width_usize == 0 || width_usize > u16::MAX as usize {
            return Err(OmniSketchError::InvalidParameter {
                param: "epsilon",
                detail: format!("width {width} does not fit in the sketch's u16 header field"),
            });
        }

        let mut sample_size: u32 = 0;
        let mut item_size: i64 = 0;
        loop {
            if item_size >= 32 || sample_size >= 1024 {
                break;
            }
            sample_size += 1;
            item_size = (4.0 * (sample_size as f64).powf(2.5) / delta).ln().ceil() as i64;
        }
        let item_size = item_size.clamp(0, 32) as u16;
        if sample_size > u16::MAX as u32 {
            return Err(OmniSketchError::InvalidParameter {
                param: "delta",
                detail: format!("sample size {sample_size} does not fit in the sketch's u16 header field"),
            });
        }

        if num_columns > u16::MAX as i64 {
            return Err(OmniSketchError::InvalidParameter {
                param: "num_columns",
                detail: format!("{num_columns} does not fit in the sketch's u16 header field"),
            });
        }

        let dims = Dims {
            num_columns: num_columns as u16,
            width: width_usize as u16,
            height: height_usize as u16,
            sample_size: sample_size as u16,
            item_size,
        };

        let total_bytes = layout::total_buffer_len(
            dims.num_columns,
            dims.height,
            dims.width,
            dims.sample_size,
        );
        if total_bytes > RESOURCE_LIMIT_BYTES {
            return Err(OmniSketchError::ResourceLimit {
                requested_bytes: total_bytes,
                limit_bytes: RESOURCE_LIMIT_BYTES,
            });
        }

        Ok(dims)
    }
}
