// SPDX-License-Identifier: MIT
//! In-memory hierarchical geometry representation
//!
//! The tree produced by an external parser and consumed by the encoder.
//! Coordinate storage is flat: a [`CoordSeq`] holds `dims.count()` values
//! per position, so a 3DZ sequence of two points carries six `f64`s.

use serde::{Deserialize, Serialize};

use crate::error::GeomError;
use crate::format::{GeomType, SRID_UNKNOWN};

/// Dimensionality flag pair shared by every coordinate of one geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dims {
    pub has_z: bool,
    pub has_m: bool,
}

impl Dims {
    pub fn new(has_z: bool, has_m: bool) -> Self {
        Self { has_z, has_m }
    }

    /// Plain 2D coordinates
    pub fn xy() -> Self {
        Self::new(false, false)
    }

    pub fn xyz() -> Self {
        Self::new(true, false)
    }

    pub fn xym() -> Self {
        Self::new(false, true)
    }

    pub fn xyzm() -> Self {
        Self::new(true, true)
    }

    /// Number of components per coordinate (2, 3, or 4)
    #[inline]
    pub fn count(&self) -> usize {
        2 + usize::from(self.has_z) + usize::from(self.has_m)
    }
}

impl Default for Dims {
    fn default() -> Self {
        Self::xy()
    }
}

/// A flat sequence of coordinates, `dims.count()` values per position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordSeq {
    dims: Dims,
    values: Vec<f64>,
}

impl CoordSeq {
    /// Create an empty sequence
    pub fn new(dims: Dims) -> Self {
        Self {
            dims,
            values: Vec::new(),
        }
    }

    /// Create from flat values; the length must be a whole number of
    /// positions for the given dimensionality
    pub fn from_values(dims: Dims, values: Vec<f64>) -> Result<Self, GeomError> {
        if values.len() % dims.count() != 0 {
            return Err(GeomError::DimensionMismatch {
                declared: dims.count(),
                found: values.len() % dims.count(),
            });
        }
        Ok(Self { dims, values })
    }

    /// Append one position
    pub fn push(&mut self, coord: &[f64]) -> Result<(), GeomError> {
        if coord.len() != self.dims.count() {
            return Err(GeomError::DimensionMismatch {
                declared: self.dims.count(),
                found: coord.len(),
            });
        }
        self.values.extend_from_slice(coord);
        Ok(())
    }

    /// Number of positions
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len() / self.dims.count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    /// Flat coordinate values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate positions as `dims.count()`-sized slices
    pub fn positions(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.dims.count())
    }
}

/// A tagged geometry node
///
/// Multi-geometry members are stored structurally (a member point is just
/// its coordinate sequence) so that a tree can never hold a mistyped child.
/// GeometryCollection children are full nodes and may mix types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Zero (empty point) or one position
    Point(CoordSeq),
    LineString(CoordSeq),
    /// Outer ring first, then holes
    Polygon(Vec<CoordSeq>),
    MultiPoint(Vec<CoordSeq>),
    MultiLineString(Vec<CoordSeq>),
    MultiPolygon(Vec<Vec<CoordSeq>>),
    Collection(Vec<Node>),
}

impl Node {
    pub fn geom_type(&self) -> GeomType {
        match self {
            Node::Point(_) => GeomType::Point,
            Node::LineString(_) => GeomType::LineString,
            Node::Polygon(_) => GeomType::Polygon,
            Node::MultiPoint(_) => GeomType::MultiPoint,
            Node::MultiLineString(_) => GeomType::MultiLineString,
            Node::MultiPolygon(_) => GeomType::MultiPolygon,
            Node::Collection(_) => GeomType::Collection,
        }
    }

    /// Visit every coordinate sequence in the subtree, depth first
    pub(crate) fn for_each_seq<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a CoordSeq),
    {
        match self {
            Node::Point(seq) | Node::LineString(seq) => f(seq),
            Node::Polygon(rings) | Node::MultiLineString(rings) => {
                rings.iter().for_each(|s| f(s))
            }
            Node::MultiPoint(points) => points.iter().for_each(|s| f(s)),
            Node::MultiPolygon(polys) => {
                polys.iter().flatten().for_each(|s| f(s))
            }
            Node::Collection(children) => {
                for child in children {
                    child.for_each_seq(f);
                }
            }
        }
    }

    /// A node is empty when it contains no coordinates at any level;
    /// a collection whose children are all empty is itself empty
    pub fn is_empty(&self) -> bool {
        let mut any = false;
        self.for_each_seq(&mut |seq| any |= !seq.is_empty());
        !any
    }
}

/// A complete geometry: a node tree plus the attributes that travel with it
/// through the serialized form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    srid: i32,
    dims: Dims,
    solid: bool,
    node: Node,
}

impl Geometry {
    pub fn new(node: Node, dims: Dims) -> Self {
        Self {
            srid: SRID_UNKNOWN,
            dims,
            solid: false,
            node,
        }
    }

    /// Set the spatial reference identifier; validation happens at encode
    pub fn with_srid(mut self, srid: i32) -> Self {
        self.srid = srid;
        self
    }

    pub fn with_solid(mut self, solid: bool) -> Self {
        self.solid = solid;
        self
    }

    pub fn srid(&self) -> i32 {
        self.srid
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn is_solid(&self) -> bool {
        self.solid
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn geom_type(&self) -> GeomType {
        self.node.geom_type()
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_empty()
    }

    /// Check that every coordinate sequence matches the declared flags
    pub(crate) fn check_dims(&self) -> Result<(), GeomError> {
        let mut mismatch = None;
        self.node.for_each_seq(&mut |seq| {
            if mismatch.is_none() && seq.dims() != self.dims {
                mismatch = Some(seq.dims());
            }
        });
        match mismatch {
            Some(found) => Err(GeomError::DimensionMismatch {
                declared: self.dims.count(),
                found: found.count(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(dims: Dims, values: &[f64]) -> CoordSeq {
        CoordSeq::from_values(dims, values.to_vec()).unwrap()
    }

    #[test]
    fn test_dims_count() {
        assert_eq!(Dims::xy().count(), 2);
        assert_eq!(Dims::xyz().count(), 3);
        assert_eq!(Dims::xym().count(), 3);
        assert_eq!(Dims::xyzm().count(), 4);
    }

    #[test]
    fn test_coord_seq_from_values_valid() {
        let s = seq(Dims::xy(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.positions().next().unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_coord_seq_from_values_partial_position() {
        let result = CoordSeq::from_values(Dims::xyz(), vec![1.0, 2.0, 3.0, 4.0]);
        assert!(matches!(
            result.unwrap_err(),
            GeomError::DimensionMismatch { .. }
        ));
    }

    #[test]
    fn test_coord_seq_push_wrong_arity() {
        let mut s = CoordSeq::new(Dims::xy());
        assert!(s.push(&[1.0, 2.0]).is_ok());
        assert!(s.push(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_point_empty() {
        let geom = Geometry::new(Node::Point(CoordSeq::new(Dims::xy())), Dims::xy());
        assert!(geom.is_empty());
    }

    #[test]
    fn test_collection_of_empty_children_is_empty() {
        let node = Node::Collection(vec![
            Node::Point(CoordSeq::new(Dims::xy())),
            Node::LineString(CoordSeq::new(Dims::xy())),
            Node::Collection(vec![]),
        ]);
        assert!(node.is_empty());
    }

    #[test]
    fn test_collection_with_one_coordinate_not_empty() {
        let node = Node::Collection(vec![
            Node::Point(CoordSeq::new(Dims::xy())),
            Node::Point(seq(Dims::xy(), &[5.0, 6.0])),
        ]);
        assert!(!node.is_empty());
    }

    #[test]
    fn test_check_dims_mismatch() {
        let geom = Geometry::new(
            Node::LineString(seq(Dims::xyz(), &[1.0, 2.0, 3.0])),
            Dims::xy(),
        );
        assert!(matches!(
            geom.check_dims().unwrap_err(),
            GeomError::DimensionMismatch {
                declared: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn test_geom_type() {
        let geom = Geometry::new(Node::MultiPoint(vec![]), Dims::xy());
        assert_eq!(geom.geom_type(), GeomType::MultiPoint);
    }
}
