// SPDX-License-Identifier: MIT
//! Binary Geometry Container (BGC) format specification
//!
//! Defines the fixed header layout, flag bits, type codes, and the
//! embedded-SRID convention shared by the encoder, decoder, and the
//! in-place field accessors.

use crate::error::GeomError;

/// BGC format version
pub const GEOM_VERSION: u8 = 1;

/// Width of the leading total-length field
pub const LENGTH_SIZE: usize = 4;

/// Header size in bytes: version, type, flags, reserved, embedded SRID
pub const HEADER_SIZE: usize = 8;

/// Offset of the optional bounding box (and of the payload when no box
/// is cached)
pub const BBOX_OFFSET: usize = LENGTH_SIZE + HEADER_SIZE;

/// Offset of the embedded SRID field within the whole buffer
pub const SRID_OFFSET: usize = 8;

/// Offset of the flags byte within the whole buffer
pub const FLAGS_OFFSET: usize = 6;

/// Sentinel meaning "no spatial reference specified"
pub const SRID_UNKNOWN: i32 = 0;

/// Largest accepted spatial reference identifier
pub const SRID_MAX: i32 = 999_999;

/// Deepest accepted collection nesting
pub const MAX_NESTING_DEPTH: usize = 32;

/// Header flag bits
pub mod flags {
    /// Coordinates carry a Z component
    pub const HAS_Z: u8 = 0x01;

    /// Coordinates carry an M component
    pub const HAS_M: u8 = 0x02;

    /// A bounding box is cached between header and payload
    pub const HAS_BBOX: u8 = 0x04;

    /// The embedded SRID field holds a non-sentinel value
    pub const HAS_SRID: u8 = 0x08;

    /// Surface geometry encloses a solid
    pub const IS_SOLID: u8 = 0x10;

    /// Bits reserved for future format revisions; must be zero
    pub const RESERVED_MASK: u8 = 0xE0;
}

/// Geometry type codes as stored in the header and in payload node tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GeomType {
    Point = 1,
    LineString = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLineString = 5,
    MultiPolygon = 6,
    Collection = 7,
}

impl GeomType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(GeomType::Point),
            2 => Some(GeomType::LineString),
            3 => Some(GeomType::Polygon),
            4 => Some(GeomType::MultiPoint),
            5 => Some(GeomType::MultiLineString),
            6 => Some(GeomType::MultiPolygon),
            7 => Some(GeomType::Collection),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Member type required of each child, for the homogeneous multi types
    pub fn member_type(&self) -> Option<GeomType> {
        match self {
            GeomType::MultiPoint => Some(GeomType::Point),
            GeomType::MultiLineString => Some(GeomType::LineString),
            GeomType::MultiPolygon => Some(GeomType::Polygon),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GeomType::Point => "Point",
            GeomType::LineString => "LineString",
            GeomType::Polygon => "Polygon",
            GeomType::MultiPoint => "MultiPoint",
            GeomType::MultiLineString => "MultiLineString",
            GeomType::MultiPolygon => "MultiPolygon",
            GeomType::Collection => "GeometryCollection",
        }
    }
}

impl std::fmt::Display for GeomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalize an SRID input: `0` and the conventional `-1` marker both mean
/// "unspecified"; everything else must fall in `1..=SRID_MAX`
pub fn normalize_srid(srid: i32) -> Result<i32, GeomError> {
    match srid {
        0 | -1 => Ok(SRID_UNKNOWN),
        s if (1..=SRID_MAX).contains(&s) => Ok(s),
        s => Err(GeomError::InvalidSrid(s)),
    }
}

/// BGC fixed header (8 bytes, between the length field and the optional
/// bounding box)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeomHeader {
    pub version: u8,
    pub geom_type: GeomType,
    pub flags: u8,
    /// Embedded identifier; `SRID_UNKNOWN` when unspecified
    pub srid: i32,
}

impl GeomHeader {
    /// Create a header for the given type and dimensionality, no optional
    /// fields set
    pub fn new(geom_type: GeomType, dims: crate::geometry::Dims) -> Self {
        let mut header_flags = 0u8;
        if dims.has_z {
            header_flags |= flags::HAS_Z;
        }
        if dims.has_m {
            header_flags |= flags::HAS_M;
        }
        Self {
            version: GEOM_VERSION,
            geom_type,
            flags: header_flags,
            srid: SRID_UNKNOWN,
        }
    }

    /// Parse the header region (the `HEADER_SIZE` bytes after the length
    /// field), little-endian
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GeomError> {
        if bytes.len() != HEADER_SIZE {
            return Err(GeomError::MalformedBuffer(format!(
                "header must be {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let version = bytes[0];
        if version != GEOM_VERSION {
            return Err(GeomError::UnsupportedVersion {
                expected: GEOM_VERSION,
                found: version,
            });
        }

        let geom_type = GeomType::from_code(bytes[1]).ok_or_else(|| {
            GeomError::MalformedBuffer(format!("unknown geometry type code {}", bytes[1]))
        })?;

        let header_flags = bytes[2];
        if header_flags & flags::RESERVED_MASK != 0 {
            return Err(GeomError::MalformedBuffer(format!(
                "reserved flag bits set: {:#04x}",
                header_flags
            )));
        }

        if bytes[3] != 0 {
            return Err(GeomError::MalformedBuffer(
                "nonzero reserved header byte".to_string(),
            ));
        }

        let srid = i32::from_le_bytes(bytes[4..8].try_into().unwrap());

        let header = Self {
            version,
            geom_type,
            flags: header_flags,
            srid,
        };

        // The HAS_SRID bit mirrors the field; disagreement means the buffer
        // was patched by something that does not speak this format.
        if header.has_srid() != (srid != SRID_UNKNOWN) {
            return Err(GeomError::MalformedBuffer(format!(
                "HAS_SRID flag disagrees with embedded SRID {}",
                srid
            )));
        }

        Ok(header)
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0] = self.version;
        bytes[1] = self.geom_type.code();
        bytes[2] = self.flags;
        // bytes[3] stays zero
        bytes[4..8].copy_from_slice(&self.srid.to_le_bytes());
        bytes
    }

    #[inline]
    pub fn write_to_buffer(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.to_bytes());
    }

    #[inline]
    pub fn has_z(&self) -> bool {
        self.flags & flags::HAS_Z != 0
    }

    #[inline]
    pub fn has_m(&self) -> bool {
        self.flags & flags::HAS_M != 0
    }

    #[inline]
    pub fn has_bbox(&self) -> bool {
        self.flags & flags::HAS_BBOX != 0
    }

    #[inline]
    pub fn has_srid(&self) -> bool {
        self.flags & flags::HAS_SRID != 0
    }

    #[inline]
    pub fn is_solid(&self) -> bool {
        self.flags & flags::IS_SOLID != 0
    }

    pub fn dims(&self) -> crate::geometry::Dims {
        crate::geometry::Dims::new(self.has_z(), self.has_m())
    }

    /// Number of active coordinate dimensions (2, 3, or 4)
    #[inline]
    pub fn dims_count(&self) -> usize {
        self.dims().count()
    }

    /// Byte size of the cached bounding box region (zero when absent)
    #[inline]
    pub fn bbox_size(&self) -> usize {
        if self.has_bbox() {
            2 * self.dims_count() * std::mem::size_of::<f32>()
        } else {
            0
        }
    }

    /// Offset of the payload from the start of the whole buffer
    #[inline]
    pub fn payload_offset(&self) -> usize {
        BBOX_OFFSET + self.bbox_size()
    }
}
