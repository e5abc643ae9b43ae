// SPDX-License-Identifier: MIT
//! # Geometry Container
//!
//! A compact, self-describing binary container format for hierarchical
//! spatial geometries, designed for storage in a database column. The codec
//! converts between an in-memory geometry tree and a flat byte buffer while
//! guaranteeing exact round-trip fidelity and typed rejection of malformed
//! input.
//!
//! ## Key Features
//!
//! - **O(1) Field Access**: type, dimensionality, SRID, and the cached
//!   bounding box are readable without decoding the coordinate payload
//! - **In-Place SRID Patching**: the identifier sits at a fixed offset and
//!   can be rewritten without re-encoding
//! - **Optional Bounding Box Cache**: a reduced-precision box can be added
//!   to or dropped from an existing buffer, preserving every other byte
//! - **Fail-Fast Validation**: the length envelope is checked before any
//!   field is interpreted; truncated or inconsistent payloads are rejected
//!   with typed errors, never partial results
//!
//! ## Format Specification
//!
//! ```text
//! Binary Geometry Container (BGC) Format v1
//! =========================================
//!
//! Fixed region (12 bytes, little-endian):
//! - Length: total buffer size in bytes, including this field (4 bytes)
//! - Version: 1 (1 byte)
//! - Type: 1=Point .. 7=GeometryCollection (1 byte)
//! - Flags: HAS_Z, HAS_M, HAS_BBOX, HAS_SRID, IS_SOLID (1 byte)
//! - Reserved: must be zero (1 byte)
//! - SRID: embedded identifier, 0 = unspecified (4 bytes)
//!
//! Optional region:
//! - Bounding box: f32 (min,max) pairs per active dimension, present
//!   when HAS_BBOX is set
//!
//! Payload (variable size):
//! - Per node: u32 type tag, u32 element counts, f64 coordinates;
//!   collection nodes nest their children's encodings
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use geometry_container::{
//!     add_bbox, decode, encode, get_srid, set_srid, CoordSeq, Dims, Geometry, Node,
//! };
//!
//! let point = Geometry::new(
//!     Node::Point(CoordSeq::from_values(Dims::xy(), vec![1.0, 2.0]).unwrap()),
//!     Dims::xy(),
//! )
//! .with_srid(4326);
//!
//! let mut data = encode(&point).unwrap();
//! assert_eq!(get_srid(&data).unwrap(), 4326);
//!
//! // Patch the SRID without re-encoding
//! set_srid(&mut data, 3857).unwrap();
//!
//! // Cache a bounding box, then restore the original layout
//! let boxed = add_bbox(&data).unwrap();
//! let decoded = decode(&boxed).unwrap();
//! assert_eq!(decoded.node(), point.node());
//! ```

pub mod bbox;
pub mod container;
pub mod error;
pub mod format;
pub mod geometry;
pub mod reader;
pub mod writer;

// Re-export main types
pub use bbox::{BoundingBox, Range};
pub use container::{add_bbox, drop_bbox, get_srid, set_srid, SerializedGeometry};
pub use error::GeomError;
pub use format::{GeomHeader, GeomType, GEOM_VERSION, SRID_MAX, SRID_UNKNOWN};
pub use geometry::{CoordSeq, Dims, Geometry, Node};
pub use reader::decode;
pub use writer::{encode, GeometryWriter};
