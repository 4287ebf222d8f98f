//! Property tests of the local kernel and of deep evaluation on random small arrays.
mod test_utils;

use deep_shapes::{
    core::math::{point, Rect},
    deep::{DeepShapeStore, Operator},
    geometry::{Edge, GeometryKind, Polygon},
    kernel::{edge_boolean, inside_part, merge_edges, outside_part, BooleanOp, Extension},
    layout::LayerInfo,
};
use proptest::prelude::*;
use test_utils::{array_of, assert_flat_equivalent};

/// Axis parallel edge with positive length inside a 100 x 100 area.
fn axis_edge() -> impl Strategy<Value = Edge> {
    (0i64..100, 0i64..100, 1i64..40, any::<bool>(), any::<bool>()).prop_map(
        |(x, y, len, vertical, reversed)| {
            let e = if vertical {
                Edge::from_coords(x, y, x, y + len)
            } else {
                Edge::from_coords(x, y, x + len, y)
            };
            if reversed {
                e.reversed()
            } else {
                e
            }
        },
    )
}

fn rect() -> impl Strategy<Value = Polygon> {
    (0i64..100, 0i64..100, 1i64..50, 1i64..50)
        .prop_map(|(l, b, w, h)| Polygon::from_rect(&Rect::from_ltrb(l, b, l + w, b + h)))
}

fn sorted(mut edges: Vec<Edge>) -> Vec<Edge> {
    edges.sort();
    edges
}

proptest! {
    #[test]
    fn inside_and_outside_partition_edges(
        edges in prop::collection::vec(axis_edge(), 1..12),
        polygons in prop::collection::vec(rect(), 0..4),
    ) {
        let mut parts = inside_part(&edges, &polygons);
        parts.extend(outside_part(&edges, &polygons));
        prop_assert_eq!(sorted(merge_edges(&parts)), sorted(merge_edges(&edges)));
    }

    #[test]
    fn xor_is_union_of_differences(
        a in prop::collection::vec(axis_edge(), 0..10),
        b in prop::collection::vec(axis_edge(), 0..10),
    ) {
        let mut diffs = edge_boolean(&a, &b, BooleanOp::Not);
        diffs.extend(edge_boolean(&b, &a, BooleanOp::Not));
        prop_assert_eq!(
            sorted(edge_boolean(&a, &b, BooleanOp::Xor)),
            sorted(merge_edges(&diffs))
        );
    }

    #[test]
    fn or_is_merge_of_both(
        a in prop::collection::vec(axis_edge(), 0..10),
        b in prop::collection::vec(axis_edge(), 0..10),
    ) {
        let both: Vec<Edge> = a.iter().chain(b.iter()).copied().collect();
        prop_assert_eq!(
            sorted(edge_boolean(&a, &b, BooleanOp::Or)),
            sorted(merge_edges(&both))
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn deep_array_matches_flat(
        edges in prop::collection::vec(axis_edge(), 1..4),
        step in 20i64..120,
        ext in 0i64..6,
    ) {
        let (mut f, c) = array_of(edges[0], step, 3, 2);
        for e in &edges[1..] {
            f.layout.insert(c, f.edges, *e);
        }
        let mask = f.layout.insert_layer(LayerInfo::new(9, 0));
        let window = Rect::new(point(30, 30), point(150, 90));
        f.layout.insert(f.top, mask, Polygon::from_rect(&window));

        let store = DeepShapeStore::new();
        let a = f.deliver(&store, f.edges, GeometryKind::Edges);
        let m = f.deliver(&store, mask, GeometryKind::Polygons);
        assert_flat_equivalent(&store, &Operator::Merge, a, None);
        assert_flat_equivalent(&store, &Operator::InsidePart, a, Some(m));
        assert_flat_equivalent(&store, &Operator::OutsidePart, a, Some(m));
        let joined = Operator::Extended(Extension::new(ext, ext, ext, 0).joined());
        assert_flat_equivalent(&store, &joined, a, None);
    }
}
