//! Property-based tests using proptest
//!
//! These tests generate many random geometry trees to check invariants the
//! codec must hold for all possible inputs: round-trip fidelity, bounding
//! box soundness, SRID normalization, extractor agreement, and rejection
//! of truncated buffers.

use proptest::prelude::*;

use geometry_container::{
    add_bbox, decode, drop_bbox, encode, get_srid, set_srid, BoundingBox, CoordSeq, Dims,
    GeomError, Geometry, GeometryWriter, Node, SerializedGeometry, SRID_UNKNOWN,
};

fn coord_value() -> impl Strategy<Value = f64> {
    -1.0e6..1.0e6f64
}

fn dims_strategy() -> impl Strategy<Value = Dims> {
    prop_oneof![
        Just(Dims::xy()),
        Just(Dims::xyz()),
        Just(Dims::xym()),
        Just(Dims::xyzm()),
    ]
}

fn srid_strategy() -> impl Strategy<Value = i32> {
    prop_oneof![Just(SRID_UNKNOWN), 1..=999_999i32]
}

fn coord_seq_strategy(dims: Dims, max_positions: usize) -> impl Strategy<Value = CoordSeq> {
    prop::collection::vec(
        prop::collection::vec(coord_value(), dims.count()),
        0..=max_positions,
    )
    .prop_map(move |positions| {
        let values: Vec<f64> = positions.into_iter().flatten().collect();
        CoordSeq::from_values(dims, values).expect("generated whole positions")
    })
}

/// Zero or one position, as a point body requires
fn point_seq_strategy(dims: Dims) -> impl Strategy<Value = CoordSeq> {
    coord_seq_strategy(dims, 1)
}

fn node_strategy(dims: Dims) -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        point_seq_strategy(dims).prop_map(Node::Point),
        coord_seq_strategy(dims, 6).prop_map(Node::LineString),
        prop::collection::vec(coord_seq_strategy(dims, 5), 0..3).prop_map(Node::Polygon),
        prop::collection::vec(point_seq_strategy(dims), 0..4).prop_map(Node::MultiPoint),
        prop::collection::vec(coord_seq_strategy(dims, 4), 0..3).prop_map(Node::MultiLineString),
        prop::collection::vec(
            prop::collection::vec(coord_seq_strategy(dims, 4), 0..3),
            0..3
        )
        .prop_map(Node::MultiPolygon),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Node::Collection)
    })
}

fn geometry_strategy() -> impl Strategy<Value = Geometry> {
    dims_strategy().prop_flat_map(|dims| {
        (node_strategy(dims), srid_strategy(), any::<bool>()).prop_map(
            move |(node, srid, solid)| {
                Geometry::new(node, dims).with_srid(srid).with_solid(solid)
            },
        )
    })
}

/// Collect every coordinate position in the tree through the public model
fn collect_positions(node: &Node, out: &mut Vec<Vec<f64>>) {
    let mut take_seq = |seq: &CoordSeq| {
        out.extend(seq.positions().map(|p| p.to_vec()));
    };
    match node {
        Node::Point(seq) | Node::LineString(seq) => take_seq(seq),
        Node::Polygon(rings) | Node::MultiLineString(rings) | Node::MultiPoint(rings) => {
            rings.iter().for_each(&mut take_seq)
        }
        Node::MultiPolygon(polys) => polys.iter().flatten().for_each(&mut take_seq),
        Node::Collection(children) => {
            for child in children {
                collect_positions(child, out);
            }
        }
    }
}

proptest! {
    /// decode(encode(g)) is structurally and numerically identical to g
    #[test]
    fn round_trip_preserves_geometry(geom in geometry_strategy()) {
        let data = encode(&geom).unwrap();
        let decoded = decode(&data).unwrap();
        prop_assert_eq!(decoded, geom);
    }

    /// A cached bounding box never changes what decodes
    #[test]
    fn round_trip_with_bbox_preserves_geometry(geom in geometry_strategy()) {
        let data = GeometryWriter::new().with_bbox(true).encode(&geom).unwrap();
        let decoded = decode(&data).unwrap();
        prop_assert_eq!(decoded, geom);
    }

    /// Removing the trailing byte must fail with MalformedBuffer, never panic
    #[test]
    fn truncation_is_rejected(geom in geometry_strategy()) {
        let data = encode(&geom).unwrap();
        let truncated = &data[..data.len() - 1];
        prop_assert!(matches!(
            decode(truncated).unwrap_err(),
            GeomError::MalformedBuffer(_)
        ));
    }

    /// Every coordinate of a non-empty geometry lies within the computed box
    #[test]
    fn bbox_contains_every_coordinate(geom in geometry_strategy()) {
        let mut positions = Vec::new();
        collect_positions(geom.node(), &mut positions);

        match BoundingBox::compute(&geom) {
            None => prop_assert!(positions.is_empty(), "only empty trees lack a box"),
            Some(bbox) => {
                prop_assert!(!positions.is_empty());
                for position in &positions {
                    prop_assert!(bbox.x.contains(position[0]));
                    prop_assert!(bbox.y.contains(position[1]));
                    let mut axis = 2;
                    if let Some(z) = bbox.z {
                        prop_assert!(z.contains(position[axis]));
                        axis += 1;
                    }
                    if let Some(m) = bbox.m {
                        prop_assert!(m.contains(position[axis]));
                    }
                }
            }
        }
    }

    /// set_srid then get_srid returns the normalized value for every valid input
    #[test]
    fn srid_patch_round_trips(geom in geometry_strategy(), srid in srid_strategy()) {
        let mut data = encode(&geom).unwrap();
        set_srid(&mut data, srid).unwrap();
        prop_assert_eq!(get_srid(&data).unwrap(), srid);

        set_srid(&mut data, -1).unwrap();
        prop_assert_eq!(get_srid(&data).unwrap(), SRID_UNKNOWN);

        // The patch must leave the geometry untouched
        let decoded = decode(&data).unwrap();
        prop_assert_eq!(decoded.node(), geom.node());
    }

    /// Fast extractors agree with full decode
    #[test]
    fn extractors_agree_with_decode(geom in geometry_strategy()) {
        let data = encode(&geom).unwrap();
        let view = SerializedGeometry::from_slice(&data).unwrap();
        let decoded = decode(&data).unwrap();

        prop_assert_eq!(view.geom_type(), decoded.geom_type());
        prop_assert_eq!(view.has_z(), decoded.dims().has_z);
        prop_assert_eq!(view.has_m(), decoded.dims().has_m);
        prop_assert_eq!(view.dims_count(), decoded.dims().count());
        prop_assert_eq!(view.srid(), decoded.srid());
        prop_assert_eq!(view.is_solid(), decoded.is_solid());
        prop_assert_eq!(view.is_empty().unwrap(), decoded.is_empty());
    }

    /// add_bbox and drop_bbox are idempotent and inverse on box-free input
    #[test]
    fn bbox_add_drop_idempotence(geom in geometry_strategy()) {
        let data = encode(&geom).unwrap();

        let once = add_bbox(&data).unwrap();
        let twice = add_bbox(&once).unwrap();
        prop_assert_eq!(&once, &twice);

        let dropped = drop_bbox(&once).unwrap();
        prop_assert_eq!(&dropped, &data);
        let dropped_again = drop_bbox(&dropped).unwrap();
        prop_assert_eq!(&dropped_again, &data);
    }

    /// get_or_compute yields the same box whether cached or not
    #[test]
    fn cached_and_computed_boxes_agree(geom in geometry_strategy()) {
        let plain = encode(&geom).unwrap();
        let boxed = add_bbox(&plain).unwrap();

        let computed = SerializedGeometry::from_slice(&plain)
            .unwrap()
            .get_or_compute_bbox()
            .unwrap();
        let cached = SerializedGeometry::from_slice(&boxed)
            .unwrap()
            .get_or_compute_bbox()
            .unwrap();
        prop_assert_eq!(cached, computed);
    }
}
