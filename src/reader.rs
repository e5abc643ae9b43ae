// SPDX-License-Identifier: MIT
//! Decoder for serialized geometry buffers
//!
//! The payload parser is cursor-based and fails fast: every count is
//! bounds-checked against the remaining bytes before anything is allocated,
//! and trailing bytes after the declared structure are rejected.

use tracing::trace;

use crate::container::SerializedGeometry;
use crate::error::GeomError;
use crate::format::{GeomType, MAX_NESTING_DEPTH};
use crate::geometry::{CoordSeq, Dims, Geometry, Node};

/// Decode a serialized buffer into a geometry tree
pub fn decode(data: &[u8]) -> Result<Geometry, GeomError> {
    let view = SerializedGeometry::from_slice(data)?;
    decode_view(&view)
}

/// Decode through an already-validated view
pub(crate) fn decode_view(view: &SerializedGeometry<'_>) -> Result<Geometry, GeomError> {
    trace!(
        geom_type = view.geom_type().name(),
        size = view.size(),
        "decoding geometry"
    );

    let dims = view.dims();
    let mut cursor = Cursor::new(view.payload());
    let node = read_node(&mut cursor, dims, Some(view.geom_type()), 0)?;
    cursor.finish()?;

    Ok(Geometry::new(node, dims)
        .with_srid(view.srid())
        .with_solid(view.is_solid()))
}

/// Walk the payload skeleton counting nothing but coordinate presence
///
/// Validates the same structure as a full decode while skipping coordinate
/// values, so no tree is allocated.
pub(crate) fn payload_is_empty(view: &SerializedGeometry<'_>) -> Result<bool, GeomError> {
    let mut cursor = Cursor::new(view.payload());
    let mut any = false;
    walk_structure(&mut cursor, view.dims(), Some(view.geom_type()), 0, &mut any)?;
    cursor.finish()?;
    Ok(!any)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], GeomError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                GeomError::MalformedBuffer(format!(
                    "payload truncated: need {} more bytes at offset {}, {} remain",
                    n,
                    self.pos,
                    self.data.len() - self.pos
                ))
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32, GeomError> {
        let raw = self.take(4)?;
        Ok(u32::from_le_bytes(raw.try_into().unwrap()))
    }

    /// Read `count` coordinate values; bounds are checked before allocating
    fn read_f64s(&mut self, count: usize) -> Result<Vec<f64>, GeomError> {
        let nbytes = count.checked_mul(8).ok_or_else(|| {
            GeomError::MalformedBuffer("coordinate count overflows".to_string())
        })?;
        let raw = self.take(nbytes)?;
        Ok(raw
            .chunks_exact(8)
            .map(|chunk| f64::from_le_bytes(chunk.try_into().unwrap()))
            .collect())
    }

    fn skip_f64s(&mut self, count: usize) -> Result<(), GeomError> {
        let nbytes = count.checked_mul(8).ok_or_else(|| {
            GeomError::MalformedBuffer("coordinate count overflows".to_string())
        })?;
        self.take(nbytes).map(|_| ())
    }

    /// Everything declared by the header must be consumed exactly
    fn finish(&self) -> Result<(), GeomError> {
        if self.pos != self.data.len() {
            return Err(GeomError::MalformedBuffer(format!(
                "{} trailing bytes after payload",
                self.data.len() - self.pos
            )));
        }
        Ok(())
    }
}

fn read_tag(cursor: &mut Cursor<'_>, expected: Option<GeomType>) -> Result<GeomType, GeomError> {
    let raw = cursor.read_u32()?;
    let tag = u8::try_from(raw)
        .ok()
        .and_then(GeomType::from_code)
        .ok_or_else(|| GeomError::MalformedBuffer(format!("unknown payload type tag {}", raw)))?;
    if let Some(want) = expected {
        if tag != want {
            return Err(GeomError::MalformedBuffer(format!(
                "expected {} node, found {}",
                want, tag
            )));
        }
    }
    Ok(tag)
}

fn read_point_count(cursor: &mut Cursor<'_>) -> Result<u32, GeomError> {
    let n = cursor.read_u32()?;
    if n > 1 {
        return Err(GeomError::MalformedBuffer(format!(
            "point node declares {} coordinate positions",
            n
        )));
    }
    Ok(n)
}

fn read_seq(cursor: &mut Cursor<'_>, dims: Dims, npoints: u32) -> Result<CoordSeq, GeomError> {
    let count = (npoints as usize).checked_mul(dims.count()).ok_or_else(|| {
        GeomError::MalformedBuffer("coordinate count overflows".to_string())
    })?;
    let values = cursor.read_f64s(count)?;
    CoordSeq::from_values(dims, values)
}

fn read_counted_seq(cursor: &mut Cursor<'_>, dims: Dims) -> Result<CoordSeq, GeomError> {
    let n = cursor.read_u32()?;
    read_seq(cursor, dims, n)
}

fn read_rings(cursor: &mut Cursor<'_>, dims: Dims) -> Result<Vec<CoordSeq>, GeomError> {
    let nrings = cursor.read_u32()?;
    // Counts are untrusted; capacity grows only as bytes actually parse.
    let mut rings = Vec::new();
    for _ in 0..nrings {
        rings.push(read_counted_seq(cursor, dims)?);
    }
    Ok(rings)
}

fn read_node(
    cursor: &mut Cursor<'_>,
    dims: Dims,
    expected: Option<GeomType>,
    depth: usize,
) -> Result<Node, GeomError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(GeomError::MalformedBuffer(format!(
            "collection nesting deeper than {} levels",
            MAX_NESTING_DEPTH
        )));
    }

    let tag = read_tag(cursor, expected)?;
    match tag {
        GeomType::Point => {
            let n = read_point_count(cursor)?;
            Ok(Node::Point(read_seq(cursor, dims, n)?))
        }
        GeomType::LineString => Ok(Node::LineString(read_counted_seq(cursor, dims)?)),
        GeomType::Polygon => Ok(Node::Polygon(read_rings(cursor, dims)?)),
        GeomType::MultiPoint => {
            let count = cursor.read_u32()?;
            let mut members = Vec::new();
            for _ in 0..count {
                read_tag(cursor, Some(GeomType::Point))?;
                let n = read_point_count(cursor)?;
                members.push(read_seq(cursor, dims, n)?);
            }
            Ok(Node::MultiPoint(members))
        }
        GeomType::MultiLineString => {
            let count = cursor.read_u32()?;
            let mut members = Vec::new();
            for _ in 0..count {
                read_tag(cursor, Some(GeomType::LineString))?;
                members.push(read_counted_seq(cursor, dims)?);
            }
            Ok(Node::MultiLineString(members))
        }
        GeomType::MultiPolygon => {
            let count = cursor.read_u32()?;
            let mut members = Vec::new();
            for _ in 0..count {
                read_tag(cursor, Some(GeomType::Polygon))?;
                members.push(read_rings(cursor, dims)?);
            }
            Ok(Node::MultiPolygon(members))
        }
        GeomType::Collection => {
            let count = cursor.read_u32()?;
            let mut children = Vec::new();
            for _ in 0..count {
                children.push(read_node(cursor, dims, None, depth + 1)?);
            }
            Ok(Node::Collection(children))
        }
    }
}

fn walk_structure(
    cursor: &mut Cursor<'_>,
    dims: Dims,
    expected: Option<GeomType>,
    depth: usize,
    any: &mut bool,
) -> Result<(), GeomError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(GeomError::MalformedBuffer(format!(
            "collection nesting deeper than {} levels",
            MAX_NESTING_DEPTH
        )));
    }

    let mut skip_counted = |cursor: &mut Cursor<'_>, n: u32, any: &mut bool| {
        *any |= n > 0;
        cursor.skip_f64s((n as usize).saturating_mul(dims.count()))
    };

    let tag = read_tag(cursor, expected)?;
    match tag {
        GeomType::Point => {
            let n = read_point_count(cursor)?;
            skip_counted(cursor, n, any)
        }
        GeomType::LineString => {
            let n = cursor.read_u32()?;
            skip_counted(cursor, n, any)
        }
        GeomType::Polygon => {
            let nrings = cursor.read_u32()?;
            for _ in 0..nrings {
                let n = cursor.read_u32()?;
                skip_counted(cursor, n, any)?;
            }
            Ok(())
        }
        GeomType::MultiPoint => {
            let count = cursor.read_u32()?;
            for _ in 0..count {
                read_tag(cursor, Some(GeomType::Point))?;
                let n = read_point_count(cursor)?;
                skip_counted(cursor, n, any)?;
            }
            Ok(())
        }
        GeomType::MultiLineString => {
            let count = cursor.read_u32()?;
            for _ in 0..count {
                read_tag(cursor, Some(GeomType::LineString))?;
                let n = cursor.read_u32()?;
                skip_counted(cursor, n, any)?;
            }
            Ok(())
        }
        GeomType::MultiPolygon => {
            let count = cursor.read_u32()?;
            for _ in 0..count {
                read_tag(cursor, Some(GeomType::Polygon))?;
                let nrings = cursor.read_u32()?;
                for _ in 0..nrings {
                    let n = cursor.read_u32()?;
                    skip_counted(cursor, n, any)?;
                }
            }
            Ok(())
        }
        GeomType::Collection => {
            let count = cursor.read_u32()?;
            for _ in 0..count {
                walk_structure(cursor, dims, None, depth + 1, any)?;
            }
            Ok(())
        }
    }
}
