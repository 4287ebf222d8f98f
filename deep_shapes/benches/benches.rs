use criterion::{criterion_group, criterion_main, Bencher, BenchmarkId, Criterion};
use deep_shapes::{
    deep::{evaluate_flat, Operator},
    layout::{CellIndex, LayerIndex, Layout, RecursiveShapeSource},
    DeepShapeStore, GeometryKind,
};
use test_layouts::*;

fn bench_deep_merge(b: &mut Bencher, (layout, top, layer): &(Layout, CellIndex, LayerIndex)) {
    let source = RecursiveShapeSource::new(layout, *top, *layer);
    b.iter(|| {
        // results are cached per store
        let store = DeepShapeStore::new();
        let edges = store.deliver(&source, GeometryKind::Edges).unwrap();
        store.merged(edges).unwrap();
    })
}

fn bench_flat_merge(b: &mut Bencher, (layout, top, layer): &(Layout, CellIndex, LayerIndex)) {
    let edges = RecursiveShapeSource::new(layout, *top, *layer).flat_shapes(GeometryKind::Edges);
    b.iter(|| {
        evaluate_flat(&Operator::Merge, &edges, None).unwrap();
    })
}

fn array_merge_group(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_merge");
    let sizes = &[10, 30, 100];
    for &n in sizes {
        let input = square_array(n, 20);
        group.bench_with_input(BenchmarkId::new("deep", n), &input, bench_deep_merge);
        group.bench_with_input(BenchmarkId::new("flat", n), &input, bench_flat_merge);
    }

    group.finish();
}

criterion_group!(array_merge, array_merge_group,);
criterion_main!(array_merge);
