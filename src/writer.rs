// SPDX-License-Identifier: MIT
//! Encoder producing serialized geometry buffers
//!
//! Validation (dimensionality, SRID range, structural limits) happens
//! before a single output byte is produced; a failed encode never returns
//! a partially written buffer.

use tracing::trace;

use crate::bbox::BoundingBox;
use crate::error::GeomError;
use crate::format::{
    flags, normalize_srid, GeomHeader, GeomType, HEADER_SIZE, LENGTH_SIZE, MAX_NESTING_DEPTH,
    SRID_UNKNOWN,
};
use crate::geometry::{CoordSeq, Geometry, Node};

/// Builder for serialized geometry buffers
///
/// Bounding box caching is caller-controlled; the default writes none.
pub struct GeometryWriter {
    include_bbox: bool,
}

impl GeometryWriter {
    pub fn new() -> Self {
        Self {
            include_bbox: false,
        }
    }

    /// Cache a computed bounding box in the output (skipped automatically
    /// for empty geometries, which have no box)
    pub fn with_bbox(mut self, include: bool) -> Self {
        self.include_bbox = include;
        self
    }

    /// Serialize a geometry tree
    pub fn encode(&self, geom: &Geometry) -> Result<Vec<u8>, GeomError> {
        geom.check_dims()?;
        let srid = normalize_srid(geom.srid())?;

        let bbox = if self.include_bbox {
            BoundingBox::compute(geom)
        } else {
            None
        };

        let mut payload = Vec::new();
        write_node(&mut payload, geom.node(), 0)?;

        let mut header = GeomHeader::new(geom.geom_type(), geom.dims());
        header.srid = srid;
        if srid != SRID_UNKNOWN {
            header.flags |= flags::HAS_SRID;
        }
        if bbox.is_some() {
            header.flags |= flags::HAS_BBOX;
        }
        if geom.is_solid() {
            header.flags |= flags::IS_SOLID;
        }

        let bbox_size = bbox.as_ref().map_or(0, BoundingBox::byte_size);
        let total = LENGTH_SIZE + HEADER_SIZE + bbox_size + payload.len();
        let stated = u32::try_from(total).map_err(|_| {
            GeomError::MalformedBuffer("serialized size exceeds u32 range".to_string())
        })?;

        let mut buffer = Vec::with_capacity(total);
        buffer.extend_from_slice(&stated.to_le_bytes());
        header.write_to_buffer(&mut buffer);
        if let Some(bbox) = &bbox {
            bbox.write_to_buffer(&mut buffer);
        }
        buffer.extend_from_slice(&payload);

        debug_assert_eq!(buffer.len(), total);
        trace!(
            geom_type = geom.geom_type().name(),
            size = total,
            bbox = bbox.is_some(),
            "encoded geometry"
        );
        Ok(buffer)
    }
}

impl Default for GeometryWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize with default options (no cached bounding box)
pub fn encode(geom: &Geometry) -> Result<Vec<u8>, GeomError> {
    GeometryWriter::new().encode(geom)
}

fn write_count(buffer: &mut Vec<u8>, count: usize) -> Result<(), GeomError> {
    let count = u32::try_from(count).map_err(|_| {
        GeomError::MalformedBuffer("element count exceeds u32 range".to_string())
    })?;
    buffer.extend_from_slice(&count.to_le_bytes());
    Ok(())
}

fn write_tag(buffer: &mut Vec<u8>, tag: GeomType) {
    buffer.extend_from_slice(&u32::from(tag.code()).to_le_bytes());
}

fn write_values(buffer: &mut Vec<u8>, seq: &CoordSeq) {
    for value in seq.values() {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
}

fn write_counted_seq(buffer: &mut Vec<u8>, seq: &CoordSeq) -> Result<(), GeomError> {
    write_count(buffer, seq.len())?;
    write_values(buffer, seq);
    Ok(())
}

fn write_point_body(buffer: &mut Vec<u8>, seq: &CoordSeq) -> Result<(), GeomError> {
    if seq.len() > 1 {
        return Err(GeomError::MalformedBuffer(format!(
            "point geometry carries {} coordinate positions",
            seq.len()
        )));
    }
    write_counted_seq(buffer, seq)
}

fn write_rings(buffer: &mut Vec<u8>, rings: &[CoordSeq]) -> Result<(), GeomError> {
    write_count(buffer, rings.len())?;
    for ring in rings {
        write_counted_seq(buffer, ring)?;
    }
    Ok(())
}

fn write_node(buffer: &mut Vec<u8>, node: &Node, depth: usize) -> Result<(), GeomError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(GeomError::MalformedBuffer(format!(
            "collection nesting deeper than {} levels",
            MAX_NESTING_DEPTH
        )));
    }

    write_tag(buffer, node.geom_type());
    match node {
        Node::Point(seq) => write_point_body(buffer, seq),
        Node::LineString(seq) => write_counted_seq(buffer, seq),
        Node::Polygon(rings) => write_rings(buffer, rings),
        Node::MultiPoint(members) => {
            write_count(buffer, members.len())?;
            for member in members {
                write_tag(buffer, GeomType::Point);
                write_point_body(buffer, member)?;
            }
            Ok(())
        }
        Node::MultiLineString(members) => {
            write_count(buffer, members.len())?;
            for member in members {
                write_tag(buffer, GeomType::LineString);
                write_counted_seq(buffer, member)?;
            }
            Ok(())
        }
        Node::MultiPolygon(members) => {
            write_count(buffer, members.len())?;
            for member in members {
                write_tag(buffer, GeomType::Polygon);
                write_rings(buffer, member)?;
            }
            Ok(())
        }
        Node::Collection(children) => {
            write_count(buffer, children.len())?;
            for child in children {
                write_node(buffer, child, depth + 1)?;
            }
            Ok(())
        }
    }
}
