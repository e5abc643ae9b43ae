// SPDX-License-Identifier: MIT
//! Benchmark for encode/decode throughput and header fast paths

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use geometry_container::{
    add_bbox, decode, encode, get_srid, CoordSeq, Dims, Geometry, Node, SerializedGeometry,
};

fn create_test_geometry() -> Geometry {
    // A multiline with 100 segments of 100 positions each, the shape of a
    // mid-sized road network feature
    let members = (0..100)
        .map(|segment| {
            let values = (0..100)
                .flat_map(|i| {
                    let t = f64::from(i);
                    [t + f64::from(segment), t * 0.5]
                })
                .collect::<Vec<f64>>();
            CoordSeq::from_values(Dims::xy(), values).unwrap()
        })
        .collect();
    Geometry::new(Node::MultiLineString(members), Dims::xy()).with_srid(4326)
}

fn benchmark_encode(c: &mut Criterion) {
    let geom = create_test_geometry();
    c.bench_function("bgc_encode", |b| {
        b.iter(|| encode(black_box(&geom)).unwrap())
    });
}

fn benchmark_decode(c: &mut Criterion) {
    let data = encode(&create_test_geometry()).unwrap();
    c.bench_function("bgc_decode", |b| {
        b.iter(|| decode(black_box(&data)).unwrap())
    });
}

fn benchmark_fast_extractors(c: &mut Criterion) {
    let data = encode(&create_test_geometry()).unwrap();
    c.bench_function("bgc_header_reads", |b| {
        b.iter(|| {
            let view = SerializedGeometry::from_slice(black_box(&data)).unwrap();
            (view.geom_type(), view.dims_count(), get_srid(&data).unwrap())
        })
    });
}

fn benchmark_add_bbox(c: &mut Criterion) {
    let data = encode(&create_test_geometry()).unwrap();
    c.bench_function("bgc_add_bbox", |b| {
        b.iter(|| add_bbox(black_box(&data)).unwrap())
    });
}

criterion_group!(
    benches,
    benchmark_encode,
    benchmark_decode,
    benchmark_fast_extractors,
    benchmark_add_bbox
);
criterion_main!(benches);
