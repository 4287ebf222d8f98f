mod test_utils;

use deep_shapes::{
    core::math::{point, Rect},
    deep::{
        evaluate_flat, DeepError, DeepShapeStore, Materializer, Operator, StoreOptions,
    },
    geometry::{Edge, GeometryKind, Polygon, ShapeSet},
    kernel::{BooleanOp, Extension, LengthFilter, OrientationFilter, SegmentMode, SegmentSpec},
    layout::{LayerInfo, Layout, RecursiveShapeSource},
};
use rayon::prelude::*;
use test_utils::{array_of, assert_flat_equivalent, flat, hierarchy, squares};

#[test]
fn delivery_flattens_to_source() {
    let f = hierarchy();
    let store = DeepShapeStore::new();
    for (layer, kind) in [
        (f.edges, GeometryKind::Edges),
        (f.other, GeometryKind::Edges),
        (f.polygons, GeometryKind::Polygons),
        (f.polygons, GeometryKind::Edges),
    ] {
        let deep = f.deliver(&store, layer, kind);
        let expected = f.flat(layer, kind);
        let got = store.flatten(deep).unwrap();
        assert_eq!(got.count, expected.len());
        assert_eq!(got.bbox, expected.bbox());
        assert_eq!(got.shapes, expected);
        assert_eq!(store.kind(deep).unwrap(), kind);
    }
}

#[test]
fn delivery_is_idempotent() {
    let f = hierarchy();
    let store = DeepShapeStore::new();
    let first = f.deliver(&store, f.edges, GeometryKind::Edges);
    let stats = store.stats();
    let second = f.deliver(&store, f.edges, GeometryKind::Edges);
    assert_eq!(first, second);
    assert_eq!(store.stats(), stats);
    // another kind of the same layer is another layer on the same variants
    let polys = f.deliver(&store, f.edges, GeometryKind::Polygons);
    assert_ne!(first, polys);
    assert_eq!(store.stats().variants, stats.variants);
}

#[test]
fn unary_operators_match_flat() {
    let f = hierarchy();
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    let ops = [
        Operator::Merge,
        Operator::Filter(LengthFilter::new(0, 60).into()),
        Operator::Filter(LengthFilter::new(0, 60).inverted().into()),
        Operator::Filter(OrientationFilter::new(0.0, 1.0).into()),
        Operator::Filter(OrientationFilter::new(89.0, 91.0).into()),
        Operator::Filter(OrientationFilter::new(30.0, 60.0).inverted().into()),
        Operator::Segments(SegmentMode::Start, SegmentSpec::new(10, 0.0)),
        Operator::Segments(SegmentMode::End, SegmentSpec::new(0, 0.25)),
        Operator::Segments(SegmentMode::Center, SegmentSpec::new(5, 0.5)),
        Operator::Extended(Extension::new(2, 3, 4, 5)),
        Operator::Extended(Extension::new(0, 0, 10, 0).joined()),
        Operator::Extended(Extension::new(5, 5, 5, 5).joined()),
    ];
    for op in ops {
        assert_flat_equivalent(&store, &op, edges, None);
    }
}

#[test]
fn binary_operators_match_flat() {
    let f = hierarchy();
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    let other = f.deliver(&store, f.other, GeometryKind::Edges);
    let polygons = f.deliver(&store, f.polygons, GeometryKind::Polygons);

    for op in [BooleanOp::And, BooleanOp::Not, BooleanOp::Xor, BooleanOp::Or] {
        assert_flat_equivalent(&store, &Operator::Boolean(op), edges, Some(other));
        assert_flat_equivalent(&store, &Operator::Boolean(op), other, Some(edges));
    }
    for op in [
        Operator::Boolean(BooleanOp::And),
        Operator::Boolean(BooleanOp::Not),
        Operator::InsidePart,
        Operator::OutsidePart,
        Operator::Interacting { inverse: false },
        Operator::Interacting { inverse: true },
    ] {
        assert_flat_equivalent(&store, &op, edges, Some(polygons));
    }
    assert_flat_equivalent(&store, &Operator::Interacting { inverse: false }, edges, Some(other));
    assert_flat_equivalent(&store, &Operator::Interacting { inverse: true }, edges, Some(other));
    assert_flat_equivalent(&store, &Operator::PolygonEdges, polygons, None);
}

#[test]
fn edge_polygon_booleans_equal_parts() {
    let f = hierarchy();
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    let polygons = f.deliver(&store, f.polygons, GeometryKind::Polygons);

    let and = store.boolean(edges, polygons, BooleanOp::And).unwrap();
    let inside = store.inside_part(edges, polygons).unwrap();
    assert_eq!(flat(&store, and), flat(&store, inside));
    let not = store.boolean(edges, polygons, BooleanOp::Not).unwrap();
    let outside = store.outside_part(edges, polygons).unwrap();
    assert_eq!(flat(&store, not), flat(&store, outside));

    // inside and outside part tile the input
    let mut both = flat(&store, inside);
    both.extend_moved(&flat(&store, outside), point(0, 0), None);
    let merged_parts = evaluate_flat(&Operator::Merge, &both, None).unwrap();
    let merged_input = evaluate_flat(&Operator::Merge, &flat(&store, edges), None).unwrap();
    assert_eq!(merged_parts, merged_input);
}

#[test]
fn chained_results_align() {
    let f = hierarchy();
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    let other = f.deliver(&store, f.other, GeometryKind::Edges);
    let polygons = f.deliver(&store, f.polygons, GeometryKind::Polygons);

    // both operands carry specialized variants from different evaluations
    let m1 = store.merged(edges).unwrap();
    let m2 = store.merged(other).unwrap();
    for op in [BooleanOp::And, BooleanOp::Not, BooleanOp::Xor, BooleanOp::Or] {
        assert_flat_equivalent(&store, &Operator::Boolean(op), m1, Some(m2));
    }
    let inside = store.inside_part(m1, polygons).unwrap();
    assert_flat_equivalent(&store, &Operator::Interacting { inverse: false }, inside, Some(m2));
    let extended = store.extended(m1, Extension::new(1, 1, 1, 1)).unwrap();
    let contours = assert_flat_equivalent(&store, &Operator::PolygonEdges, extended, None);
    assert_flat_equivalent(&store, &Operator::Boolean(BooleanOp::Or), contours, Some(inside));
}

#[test]
fn merge_is_idempotent() {
    let f = hierarchy();
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    let once = store.merged(edges).unwrap();
    let twice = store.merged(once).unwrap();
    assert_eq!(flat(&store, once), flat(&store, twice));
}

#[test]
fn merge_joins_edges_across_cell_boundaries() {
    let f = hierarchy();
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    let merged = flat(&store, store.merged(edges).unwrap());
    // two abutting instances and a parent edge
    assert!(merged.edges().contains(&Edge::from_coords(0, 0, 260, 0)));
    // the same plus an edge of the top cell touching the array element
    assert!(merged.edges().contains(&Edge::from_coords(950, 0, 1260, 0)));
    assert!(merged.edges().contains(&Edge::from_coords(2000, 0, 2260, 0)));
}

#[test]
fn abutting_squares_merge() {
    let mut ly = Layout::new();
    let l = ly.insert_layer(LayerInfo::new(1, 0));
    let top = ly.add_cell("TOP");
    let c = ly.add_cell("SQUARE");
    ly.insert(c, l, Polygon::from_rect(&Rect::from_ltrb(0, 0, 10, 10)));
    use deep_shapes::{core::trans::Trans, layout::Instance};
    ly.add_instance(top, Instance::new(c, Trans::translation(point(0, 0))));
    ly.add_instance(top, Instance::new(c, Trans::translation(point(10, 0))));

    let store = DeepShapeStore::new();
    let edges = store
        .deliver(&RecursiveShapeSource::new(&ly, top, l), GeometryKind::Edges)
        .unwrap();
    let merged = assert_flat_equivalent(&store, &Operator::Merge, edges, None);
    let result = flat(&store, merged);
    assert_eq!(result.len(), 5);
    assert!(result.edges().contains(&Edge::from_coords(0, 0, 20, 0)));
    assert!(result.edges().contains(&Edge::from_coords(10, 0, 10, 10)));
}

#[test]
fn overlapping_squares_and() {
    let f = squares(0);
    let store = DeepShapeStore::new();
    let a = f.deliver(&store, f.edges, GeometryKind::Edges);
    let b = f.deliver(&store, f.other, GeometryKind::Edges);
    let and = assert_flat_equivalent(&store, &Operator::Boolean(BooleanOp::And), a, Some(b));
    assert_eq!(
        flat(&store, and),
        ShapeSet::Edges(vec![
            Edge::from_coords(0, 0, 0, 600),
            Edge::from_coords(0, 0, 600, 0)
        ])
    );

    let f = squares(2000);
    let store = DeepShapeStore::new();
    let a = f.deliver(&store, f.edges, GeometryKind::Edges);
    let b = f.deliver(&store, f.other, GeometryKind::Edges);
    let and = assert_flat_equivalent(&store, &Operator::Boolean(BooleanOp::And), a, Some(b));
    assert!(flat(&store, and).is_empty());
}

#[test]
fn array_variants_are_computed_once() {
    let (f, c) = array_of(Edge::from_coords(0, 0, 10, 0), 20, 100, 100);
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    let variants = store.stats().variants;
    let merged = store.merged(edges).unwrap();
    assert_eq!(store.local_computations(c), 1);
    assert_eq!(store.stats().kernel_invocations, 1);
    assert_eq!(store.stats().variants, variants);
    let result = store.flatten(merged).unwrap();
    assert_eq!(result.count, 10_000);
    assert_eq!(result.bbox, Rect::from_ltrb(0, 0, 1990, 1980));

    let filtered = store.filtered(edges, LengthFilter::new(5, 20)).unwrap();
    assert_eq!(store.local_computations(c), 2);
    assert_eq!(store.flatten(filtered).unwrap().count, 10_000);
}

#[test]
fn touching_array_needs_few_contexts() {
    let square = Polygon::from_rect(&Rect::from_ltrb(0, 0, 20, 20));
    let (f, c) = array_of(square, 20, 30, 30);
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    let variants = store.stats().variants;
    let merged = assert_flat_equivalent(&store, &Operator::Merge, edges, None);
    assert!(store.local_computations(c) <= 9);
    // corner, border and interior neighborhoods plus the top cell
    assert!(store.stats().variants - variants <= 10);
    // one edge per grid line
    assert_eq!(store.flatten(merged).unwrap().count, 62);
}

#[test]
fn joined_extension_of_abutting_tiles_stays_local() {
    let square = Polygon::from_rect(&Rect::from_ltrb(0, 0, 10, 10));
    let ext = Extension::new(1, 1, 1, 1).joined();

    let (f, _) = array_of(square.clone(), 10, 10, 10);
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    assert_flat_equivalent(&store, &Operator::Extended(ext), edges, None);

    let (f, c) = array_of(square, 10, 100, 100);
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    let before = store.stats();
    let extended = store.extended(edges, ext).unwrap();
    let after = store.stats();

    // corner, border and interior neighborhoods
    let local = store.local_computations(c);
    assert!(local > 0 && local <= 9, "{local} local computations");
    assert!(after.kernel_invocations - before.kernel_invocations <= 9);
    assert!(after.variants - before.variants <= 10);
    // grid corners branch, only the four outer corners join two edges
    assert_eq!(store.flatten(extended).unwrap().count, 4 * 100 * 100 - 4);

    let mut target = Layout::new();
    let out = target.insert_layer(LayerInfo::new(100, 0));
    let top = target.add_cell("OUT");
    Materializer::new(&store)
        .insert(extended, &mut target, top, out)
        .unwrap();
    assert!(target.cell(top).shapes(out).is_empty());
}

#[test]
fn joined_extension_ignores_neighbors_within_extension() {
    // gaps narrower than the extension do not change which edges chain
    let square = Polygon::from_rect(&Rect::from_ltrb(0, 0, 10, 10));
    let (f, c) = array_of(square, 12, 8, 8);
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    let variants = store.stats().variants;
    let ext = Operator::Extended(Extension::new(5, 5, 5, 5).joined());
    assert_flat_equivalent(&store, &ext, edges, None);
    assert_eq!(store.local_computations(c), 1);
    assert!(store.stats().variants - variants <= 1);
}

#[test]
fn rotated_and_mirrored_orientation_filter() {
    use deep_shapes::{
        core::trans::{Orientation, Trans},
        layout::Instance,
    };
    let mut ly = Layout::new();
    let l = ly.insert_layer(LayerInfo::new(1, 0));
    let top = ly.add_cell("TOP");
    let c = ly.add_cell("C");
    ly.insert(c, l, Edge::from_coords(0, 0, 100, 0));
    ly.insert(c, l, Edge::from_coords(0, 0, 50, 50));
    for (i, o) in [
        Orientation::R0,
        Orientation::R90,
        Orientation::R180,
        Orientation::R270,
        Orientation::M0,
        Orientation::M45,
        Orientation::M90,
        Orientation::M135,
    ]
    .into_iter()
    .enumerate()
    {
        ly.add_instance(
            top,
            Instance::new(c, Trans::new(o, point(300 * i as i64, 0))),
        );
    }

    let store = DeepShapeStore::new();
    let edges = store
        .deliver(&RecursiveShapeSource::new(&ly, top, l), GeometryKind::Edges)
        .unwrap();
    let horizontal = Operator::Filter(OrientationFilter::new(0.0, 1.0).into());
    let h = assert_flat_equivalent(&store, &horizontal, edges, None);
    // the long edge is horizontal in four of the eight orientations
    assert_eq!(store.flatten(h).unwrap().count, 4);
    let diagonal = Operator::Filter(OrientationFilter::new(44.0, 46.0).into());
    let d = assert_flat_equivalent(&store, &diagonal, edges, None);
    assert_eq!(store.flatten(d).unwrap().count, 4);
}

#[test]
fn region_scoped_delivery() {
    let f = hierarchy();
    let store = DeepShapeStore::new();
    let region = Rect::from_ltrb(50, -20, 1120, 120);
    let source = RecursiveShapeSource::new(&f.layout, f.top, f.edges).with_region(region);
    let edges = store.deliver(&source, GeometryKind::Edges).unwrap();
    assert_eq!(
        store.flatten(edges).unwrap().shapes,
        source.flat_shapes(GeometryKind::Edges)
    );
    assert_flat_equivalent(&store, &Operator::Merge, edges, None);

    // a different area of interest is a different hierarchy
    let full = f.deliver(&store, f.edges, GeometryKind::Edges);
    assert!(matches!(
        store.boolean(edges, full, BooleanOp::And),
        Err(DeepError::InvalidOperand(_))
    ));
    let polygons = store
        .deliver(
            &RecursiveShapeSource::new(&f.layout, f.top, f.polygons).with_region(region),
            GeometryKind::Polygons,
        )
        .unwrap();
    assert_flat_equivalent(&store, &Operator::InsidePart, edges, Some(polygons));
}

#[test]
fn flat_operands_combine_with_deep_layers() {
    let f = hierarchy();
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    let mask = ShapeSet::Polygons(vec![Polygon::from_rect(&Rect::from_ltrb(
        -100, -10, 1500, 40,
    ))]);
    let flat_mask = store.deliver_flat(edges, mask).unwrap();
    assert_flat_equivalent(&store, &Operator::InsidePart, edges, Some(flat_mask));
    let cut = ShapeSet::Edges(vec![Edge::from_coords(-1000, 0, 5000, 0)]);
    let flat_cut = store.deliver_flat(edges, cut).unwrap();
    assert_flat_equivalent(&store, &Operator::Boolean(BooleanOp::Not), edges, Some(flat_cut));
}

#[test]
fn operation_cache_reuses_results() {
    let f = hierarchy();
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    let first = store.merged(edges).unwrap();
    let stats = store.stats();
    let second = store.merged(edges).unwrap();
    assert_eq!(first, second);
    assert_eq!(store.stats(), stats);

    let a = store.filtered(edges, LengthFilter::new(0, 50)).unwrap();
    let b = store.filtered(edges, LengthFilter::new(0, 51)).unwrap();
    assert_ne!(a, b);
}

#[test]
fn missing_layer_is_empty() {
    let f = hierarchy();
    let store = DeepShapeStore::new();
    let empty = store
        .deliver(&f.source(42), GeometryKind::Edges)
        .unwrap();
    let flat_result = store.flatten(empty).unwrap();
    assert_eq!(flat_result.count, 0);
    assert!(flat_result.bbox.is_empty());
    let merged = store.merged(empty).unwrap();
    assert_eq!(store.flatten(merged).unwrap().count, 0);
}

#[test]
fn errors() {
    let f = hierarchy();
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    let polygons = f.deliver(&store, f.polygons, GeometryKind::Polygons);

    assert!(matches!(
        store.filtered(edges, LengthFilter::new(10, 5)),
        Err(DeepError::InvalidParameter(_))
    ));
    assert!(matches!(
        store.start_segments(edges, -1, 0.0),
        Err(DeepError::InvalidParameter(_))
    ));
    assert!(matches!(
        store.extended(edges, Extension::new(0, 0, -1, 0)),
        Err(DeepError::InvalidParameter(_))
    ));
    assert!(matches!(
        store.merged(polygons),
        Err(DeepError::InvalidOperand(_))
    ));
    assert!(matches!(
        store.boolean(edges, polygons, BooleanOp::Xor),
        Err(DeepError::InvalidOperand(_))
    ));
    assert!(matches!(
        store.polygon_edges(edges),
        Err(DeepError::InvalidOperand(_))
    ));

    // another top cell is another hierarchy
    let b_cell = f.layout.cell_by_name("B").unwrap();
    let below = store
        .deliver(
            &RecursiveShapeSource::new(&f.layout, b_cell, f.other),
            GeometryKind::Edges,
        )
        .unwrap();
    assert!(matches!(
        store.boolean(edges, below, BooleanOp::Or),
        Err(DeepError::InvalidOperand(_))
    ));

    let foreign_store = DeepShapeStore::new();
    let foreign = f.deliver(&foreign_store, f.other, GeometryKind::Edges);
    assert!(matches!(
        store.boolean(edges, foreign, BooleanOp::And),
        Err(DeepError::InvalidOperand(_))
    ));
    assert!(matches!(
        store.merged(foreign),
        Err(DeepError::InvalidHandle(_))
    ));
    assert!(matches!(
        store.flatten(foreign),
        Err(DeepError::InvalidHandle(_))
    ));

    store.teardown();
    assert!(store.is_torn_down());
    assert!(matches!(store.merged(edges), Err(DeepError::InvalidHandle(_))));
    assert!(matches!(store.flatten(edges), Err(DeepError::InvalidHandle(_))));
    assert!(matches!(
        store.deliver(&f.source(f.edges), GeometryKind::Edges),
        Err(DeepError::InvalidHandle(_))
    ));
    // the other store is unaffected
    assert!(foreign_store.merged(foreign).is_ok());
}

#[test]
fn limits_are_enforced() {
    let f = hierarchy();
    let store = DeepShapeStore::with_options(StoreOptions::new().with_max_variants(2));
    assert!(matches!(
        store.deliver(&f.source(f.edges), GeometryKind::Edges),
        Err(DeepError::ResourceExhausted(_))
    ));

    let store = DeepShapeStore::with_options(StoreOptions::new().with_max_working_set(3));
    assert!(matches!(
        store.deliver(&f.source(f.edges), GeometryKind::Edges),
        Err(DeepError::ResourceExhausted(_))
    ));
    // nothing was published, smaller requests still work
    assert_eq!(store.stats().layers, 0);
    let (small, _) = array_of(Edge::from_coords(0, 0, 10, 0), 20, 2, 1);
    assert!(store.deliver(&small.source(small.edges), GeometryKind::Edges).is_ok());
}

#[test]
fn materialize_round_trip() {
    let f = hierarchy();
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    let merged = store.merged(edges).unwrap();
    let polygons = f.deliver(&store, f.polygons, GeometryKind::Polygons);

    let mut target = Layout::new();
    let out_edges = target.insert_layer(LayerInfo::new(100, 0));
    let out_polygons = target.insert_layer(LayerInfo::new(101, 0));
    let out_flat = target.insert_layer(LayerInfo::new(102, 0));
    let top = target.add_cell("OUT");

    let mut materializer = Materializer::new(&store);
    materializer
        .insert(merged, &mut target, top, out_edges)
        .unwrap();
    let cells = target.cell_count();
    materializer
        .insert(polygons, &mut target, top, out_polygons)
        .unwrap();
    materializer
        .insert_flat(merged, &mut target, top, out_flat)
        .unwrap();

    let read = |layer, kind| RecursiveShapeSource::new(&target, top, layer).flat_shapes(kind);
    assert_eq!(read(out_edges, GeometryKind::Edges), flat(&store, merged));
    assert_eq!(read(out_polygons, GeometryKind::Polygons), flat(&store, polygons));
    assert_eq!(read(out_flat, GeometryKind::Edges), flat(&store, merged));

    // repeated structure stays shared: far fewer cells than placed elements
    assert!(cells > 1);
    assert!(cells < 30);
    assert!(target.cell_count() < 2 * cells + 4);
    assert!(target.cell_by_name("A").is_some());
}

#[test]
fn concurrent_requests() {
    let f = hierarchy();
    let store = DeepShapeStore::new();
    let edges = f.deliver(&store, f.edges, GeometryKind::Edges);
    let polygons = f.deliver(&store, f.polygons, GeometryKind::Polygons);
    let ops = vec![
        (Operator::Merge, None),
        (Operator::Filter(LengthFilter::new(0, 60).into()), None),
        (
            Operator::Segments(SegmentMode::Center, SegmentSpec::new(10, 0.0)),
            None,
        ),
        (Operator::Extended(Extension::new(5, 5, 5, 5)), None),
        (Operator::InsidePart, Some(polygons)),
        (Operator::Interacting { inverse: true }, Some(polygons)),
        (Operator::Boolean(BooleanOp::Not), Some(polygons)),
    ];
    let results: Vec<_> = ops
        .par_iter()
        .map(|(op, b)| store.evaluate(op, edges, *b).unwrap())
        .collect();

    let flat_edges = flat(&store, edges);
    let flat_polygons = flat(&store, polygons);
    for ((op, b), result) in ops.iter().zip(results) {
        let expected = evaluate_flat(op, &flat_edges, b.map(|_| &flat_polygons)).unwrap();
        assert_eq!(flat(&store, result), expected, "{:?}", op);
    }
}
