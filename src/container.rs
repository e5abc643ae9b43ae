// SPDX-License-Identifier: MIT
//! Zero-copy view over a serialized geometry buffer
//!
//! [`SerializedGeometry::from_slice`] verifies the envelope (the stated
//! length must match the actual buffer size) before any other field is
//! interpreted, then exposes the header, the optional fields, and the
//! payload as borrowed regions. Field extractors read only the header and
//! adjacent optional fields; the payload is never decoded except where
//! documented.

use tracing::debug;

use crate::bbox::BoundingBox;
use crate::error::GeomError;
use crate::format::{
    flags, normalize_srid, GeomHeader, GeomType, BBOX_OFFSET, FLAGS_OFFSET, LENGTH_SIZE,
    SRID_OFFSET, SRID_UNKNOWN,
};
use crate::geometry::{Dims, Geometry};

/// A validated, read-only view into a serialized geometry
#[derive(Debug, Clone, Copy)]
pub struct SerializedGeometry<'a> {
    header: GeomHeader,
    data: &'a [u8],
}

impl<'a> SerializedGeometry<'a> {
    /// Validate the envelope and header, without touching the payload
    pub fn from_slice(data: &'a [u8]) -> Result<Self, GeomError> {
        if data.len() < LENGTH_SIZE {
            return Err(GeomError::MalformedBuffer(format!(
                "buffer too small for length field: {} bytes",
                data.len()
            )));
        }

        // Envelope consistency comes first; nothing else is interpreted
        // until the stated length matches reality.
        let stated = u32::from_le_bytes(data[..LENGTH_SIZE].try_into().unwrap()) as usize;
        if stated != data.len() {
            return Err(GeomError::MalformedBuffer(format!(
                "stated length {} disagrees with actual size {}",
                stated,
                data.len()
            )));
        }

        if data.len() < BBOX_OFFSET {
            return Err(GeomError::MalformedBuffer(format!(
                "buffer too small for header: {} bytes",
                data.len()
            )));
        }

        let header = GeomHeader::from_bytes(&data[LENGTH_SIZE..BBOX_OFFSET])?;

        if header.payload_offset() > data.len() {
            return Err(GeomError::MalformedBuffer(
                "buffer too small for cached bounding box".to_string(),
            ));
        }

        Ok(Self { header, data })
    }

    pub fn header(&self) -> &GeomHeader {
        &self.header
    }

    /// Total buffer size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn geom_type(&self) -> GeomType {
        self.header.geom_type
    }

    pub fn has_z(&self) -> bool {
        self.header.has_z()
    }

    pub fn has_m(&self) -> bool {
        self.header.has_m()
    }

    pub fn has_bbox(&self) -> bool {
        self.header.has_bbox()
    }

    pub fn is_solid(&self) -> bool {
        self.header.is_solid()
    }

    pub fn dims(&self) -> Dims {
        self.header.dims()
    }

    /// Number of active coordinate dimensions (2, 3, or 4)
    pub fn dims_count(&self) -> usize {
        self.header.dims_count()
    }

    /// Embedded SRID; `SRID_UNKNOWN` when unspecified
    pub fn srid(&self) -> i32 {
        self.header.srid
    }

    /// Raw bytes of the cached bounding box, when present
    pub fn bbox_bytes(&self) -> Option<&'a [u8]> {
        self.header
            .has_bbox()
            .then(|| &self.data[BBOX_OFFSET..self.header.payload_offset()])
    }

    /// The cached bounding box, when present; never computes one
    pub fn bbox(&self) -> Result<Option<BoundingBox>, GeomError> {
        match self.bbox_bytes() {
            Some(bytes) => BoundingBox::from_bytes(bytes, self.dims()).map(Some),
            None => Ok(None),
        }
    }

    /// Structural payload region
    pub fn payload(&self) -> &'a [u8] {
        &self.data[self.header.payload_offset()..]
    }

    /// Whether the geometry contains zero coordinates at every level
    ///
    /// Emptiness is a structural property, not a flag, so this walks the
    /// payload skeleton (counts only, coordinates skipped) instead of
    /// reading a header bit.
    pub fn is_empty(&self) -> Result<bool, GeomError> {
        crate::reader::payload_is_empty(self)
    }

    /// Cached box when present (constant time), otherwise decode the
    /// payload and compute one. Does not mutate the buffer.
    pub fn get_or_compute_bbox(&self) -> Result<Option<BoundingBox>, GeomError> {
        if let Some(bbox) = self.bbox()? {
            return Ok(Some(bbox));
        }
        let geom = crate::reader::decode_view(self)?;
        Ok(BoundingBox::compute(&geom))
    }

    /// Decode the payload into a geometry tree
    pub fn decode(&self) -> Result<Geometry, GeomError> {
        crate::reader::decode_view(self)
    }
}

/// Constant-time SRID read at its fixed offset
pub fn get_srid(data: &[u8]) -> Result<i32, GeomError> {
    Ok(SerializedGeometry::from_slice(data)?.srid())
}

/// Validate, normalize, and patch the SRID in place
///
/// The field sits at a fixed offset immediately computable from the header,
/// so the write is constant time and never shifts subsequent bytes. The
/// HAS_SRID mirror bit is kept in step.
pub fn set_srid(data: &mut [u8], srid: i32) -> Result<(), GeomError> {
    SerializedGeometry::from_slice(data)?;
    let normalized = normalize_srid(srid)?;

    data[SRID_OFFSET..SRID_OFFSET + 4].copy_from_slice(&normalized.to_le_bytes());
    if normalized != SRID_UNKNOWN {
        data[FLAGS_OFFSET] |= flags::HAS_SRID;
    } else {
        data[FLAGS_OFFSET] &= !flags::HAS_SRID;
    }
    Ok(())
}

/// Return a new buffer with a computed bounding box cached in place
///
/// Idempotent: a buffer that already carries a box is returned verbatim, as
/// is one holding an empty geometry (empty geometries have no box). All
/// bytes other than the length field, the HAS_BBOX bit, and the inserted
/// field are preserved.
pub fn add_bbox(data: &[u8]) -> Result<Vec<u8>, GeomError> {
    let view = SerializedGeometry::from_slice(data)?;
    if view.has_bbox() {
        return Ok(data.to_vec());
    }

    let geom = crate::reader::decode_view(&view)?;
    let Some(bbox) = BoundingBox::compute(&geom) else {
        return Ok(data.to_vec());
    };

    let new_len = data.len() + bbox.byte_size();
    let stated = u32::try_from(new_len)
        .map_err(|_| GeomError::MalformedBuffer("buffer size exceeds u32 range".to_string()))?;

    let mut out = Vec::with_capacity(new_len);
    out.extend_from_slice(&stated.to_le_bytes());
    out.extend_from_slice(&data[LENGTH_SIZE..BBOX_OFFSET]);
    out[FLAGS_OFFSET] |= flags::HAS_BBOX;
    bbox.write_to_buffer(&mut out);
    out.extend_from_slice(view.payload());

    debug!(
        geom_type = view.geom_type().name(),
        bytes = bbox.byte_size(),
        "cached bounding box"
    );
    debug_assert_eq!(out.len(), new_len);
    Ok(out)
}

/// Return a new buffer with the cached bounding box removed
///
/// Idempotent: a buffer without a box is returned verbatim.
pub fn drop_bbox(data: &[u8]) -> Result<Vec<u8>, GeomError> {
    let view = SerializedGeometry::from_slice(data)?;
    if !view.has_bbox() {
        return Ok(data.to_vec());
    }

    let new_len = data.len() - view.header().bbox_size();
    let mut out = Vec::with_capacity(new_len);
    out.extend_from_slice(&(new_len as u32).to_le_bytes());
    out.extend_from_slice(&data[LENGTH_SIZE..BBOX_OFFSET]);
    out[FLAGS_OFFSET] &= !flags::HAS_BBOX;
    out.extend_from_slice(view.payload());

    debug!(geom_type = view.geom_type().name(), "dropped cached bounding box");
    debug_assert_eq!(out.len(), new_len);
    Ok(out)
}
