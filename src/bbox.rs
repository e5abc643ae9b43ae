// SPDX-License-Identifier: MIT
//! Axis-aligned bounding boxes at cache precision
//!
//! Boxes are computed over `f64` coordinates but stored as `f32` pairs, the
//! width used by the cached field in the serialized form. Reduction always
//! rounds outward so the box keeps containing every input coordinate.

use serde::{Deserialize, Serialize};

use crate::error::GeomError;
use crate::geometry::{Dims, Geometry};

/// One (min, max) pair along a single axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    /// Whether `v` falls inside the range, widened back to `f64`
    pub fn contains(&self, v: f64) -> bool {
        f64::from(self.min) <= v && v <= f64::from(self.max)
    }
}

/// Bounding box with one range per active dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: Range,
    pub y: Range,
    pub z: Option<Range>,
    pub m: Option<Range>,
}

/// Largest `f32` not exceeding `v`
fn reduce_down(v: f64) -> f32 {
    let r = v as f32;
    if f64::from(r) > v {
        r.next_down()
    } else {
        r
    }
}

/// Smallest `f32` not below `v`
fn reduce_up(v: f64) -> f32 {
    let r = v as f32;
    if f64::from(r) < v {
        r.next_up()
    } else {
        r
    }
}

impl BoundingBox {
    /// Compute the box for a geometry tree, expanding running min/max over
    /// every coordinate. `None` when the tree is structurally empty; a
    /// degenerate box is never produced for empty input.
    pub fn compute(geom: &Geometry) -> Option<Self> {
        let mut mins = [f64::INFINITY; 4];
        let mut maxs = [f64::NEG_INFINITY; 4];
        let mut seen = false;

        geom.node().for_each_seq(&mut |seq| {
            for position in seq.positions() {
                seen = true;
                for (axis, &value) in position.iter().enumerate() {
                    mins[axis] = mins[axis].min(value);
                    maxs[axis] = maxs[axis].max(value);
                }
            }
        });

        if !seen {
            return None;
        }

        let range = |axis: usize| Range {
            min: reduce_down(mins[axis]),
            max: reduce_up(maxs[axis]),
        };

        // Axis order within a position is X, Y, then Z when present, then M.
        let dims = geom.dims();
        let z = dims.has_z.then(|| range(2));
        let m = dims.has_m.then(|| range(2 + usize::from(dims.has_z)));

        Some(Self {
            x: range(0),
            y: range(1),
            z,
            m,
        })
    }

    /// The dimensionality this box covers
    pub fn dims(&self) -> Dims {
        Dims::new(self.z.is_some(), self.m.is_some())
    }

    /// Number of ranges stored (2, 3, or 4)
    pub fn range_count(&self) -> usize {
        self.dims().count()
    }

    /// Serialized width in bytes
    pub fn byte_size(&self) -> usize {
        2 * self.range_count() * std::mem::size_of::<f32>()
    }

    /// Parse from the cached field region, little-endian
    pub(crate) fn from_bytes(bytes: &[u8], dims: Dims) -> Result<Self, GeomError> {
        let expected = 2 * dims.count() * std::mem::size_of::<f32>();
        if bytes.len() != expected {
            return Err(GeomError::MalformedBuffer(format!(
                "bounding box field must be {} bytes, got {}",
                expected,
                bytes.len()
            )));
        }

        let mut cursor = bytes;
        let mut next = || {
            let (raw, rest) = cursor.split_at(4);
            cursor = rest;
            f32::from_le_bytes(raw.try_into().unwrap())
        };
        let mut read_range = || Range {
            min: next(),
            max: next(),
        };

        let x = read_range();
        let y = read_range();
        let z = dims.has_z.then(&mut read_range);
        let m = dims.has_m.then(&mut read_range);

        Ok(Self { x, y, z, m })
    }

    /// Append the (min, max) pairs in X, Y, Z, M order
    pub(crate) fn write_to_buffer(&self, buffer: &mut Vec<u8>) {
        let mut put = |r: &Range| {
            buffer.extend_from_slice(&r.min.to_le_bytes());
            buffer.extend_from_slice(&r.max.to_le_bytes());
        };
        put(&self.x);
        put(&self.y);
        if let Some(z) = &self.z {
            put(z);
        }
        if let Some(m) = &self.m {
            put(m);
        }
    }
}
