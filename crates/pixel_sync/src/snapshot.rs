//! Snapshot decoding.
//!
//! A full snapshot holds one code per canvas cell in row-major order. In a
//! sharded deployment each shard only owns the columns of its stripe, so its
//! snapshot is row-major over the reduced width `ceil(cols / stride)`:
//!
//! ```text
//! cols = 5, stride = 2, offset = 1
//! canvas x:   0  1  2  3  4  (5)
//! payload i:     0     1     2   <- x = 5 is past the edge and dropped
//! ```

use crate::palette::ColorCode;
use crate::{Result, SyncError};

/// Canvas cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

impl Coordinate {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A decoded cell update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub coordinate: Coordinate,
    pub code: ColorCode,
}

/// Column selection of a striped payload: column `x` is present iff `x % stride == offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripeDescriptor {
    pub offset: u32,
    pub stride: u32,
}

impl StripeDescriptor {
    /// The stripe covering every column.
    pub const FULL: StripeDescriptor = StripeDescriptor { offset: 0, stride: 1 };

    pub fn is_valid(&self) -> bool {
        self.stride >= 1 && self.offset < self.stride
    }

    pub fn contains(&self, x: u32) -> bool {
        self.is_valid() && x % self.stride == self.offset
    }

    /// Number of payload columns for a canvas `cols` wide.
    pub fn reduced_width(&self, cols: u32) -> u32 {
        cols.div_ceil(self.stride)
    }
}

/// Decode a full row-major snapshot.
///
/// # Errors
///
/// [`SyncError::MalformedSnapshot`] unless `codes.len() == rows * cols`.
pub fn decode_full(rows: u32, cols: u32, codes: &[ColorCode]) -> Result<Vec<Cell>> {
    decode_striped(rows, cols, StripeDescriptor::FULL, codes)
}

/// Decode the snapshot of a single stripe.
///
/// Columns that fall past the right edge in the last partial stripe are skipped.
///
/// # Errors
///
/// [`SyncError::InvalidStripe`] for an impossible descriptor and
/// [`SyncError::MalformedSnapshot`] unless `codes.len() == rows * ceil(cols / stride)`.
pub fn decode_striped(rows: u32, cols: u32, stripe: StripeDescriptor, codes: &[ColorCode]) -> Result<Vec<Cell>> {
    if !stripe.is_valid() {
        return Err(SyncError::InvalidStripe {
            offset: stripe.offset,
            stride: stripe.stride,
        });
    }

    let reduced = stripe.reduced_width(cols) as usize;
    let expected = reduced * rows as usize;
    if codes.len() != expected {
        return Err(SyncError::MalformedSnapshot {
            expected,
            found: codes.len(),
        });
    }
    if reduced == 0 {
        return Ok(Vec::new());
    }

    let mut cells = Vec::with_capacity(expected);
    for (y, row) in codes.chunks(reduced).enumerate() {
        for (i, &code) in row.iter().enumerate() {
            let x = i as u64 * stripe.stride as u64 + stripe.offset as u64;
            if x >= cols as u64 {
                continue;
            }
            cells.push(Cell {
                coordinate: Coordinate::new(x as u32, y as u32),
                code,
            });
        }
    }
    Ok(cells)
}
