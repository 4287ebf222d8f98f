#![allow(dead_code)]
mod fixtures;

pub use fixtures::*;

use deep_shapes::{
    deep::{evaluate_flat, DeepLayer, DeepShapeStore, Operator},
    geometry::ShapeSet,
};

/// Asserts that the flattened deep result equals the flat evaluation of `op` on the flattened
/// operands (shape multiset, count and bounding box).
pub fn assert_flat_equivalent(
    store: &DeepShapeStore,
    op: &Operator,
    a: DeepLayer,
    b: Option<DeepLayer>,
) -> DeepLayer {
    let flat_a = store.flatten(a).unwrap().shapes;
    let flat_b = b.map(|b| store.flatten(b).unwrap().shapes);
    let expected = evaluate_flat(op, &flat_a, flat_b.as_ref()).unwrap();

    let result = store.evaluate(op, a, b).unwrap();
    let got = store.flatten(result).unwrap();
    assert_eq!(got.count, expected.len(), "shape count of {:?}", op);
    assert_eq!(got.bbox, expected.bbox(), "bounding box of {:?}", op);
    assert_eq!(got.shapes, expected, "shapes of {:?}", op);
    result
}

/// Flat shapes of a deep layer.
pub fn flat(store: &DeepShapeStore, layer: DeepLayer) -> ShapeSet {
    store.flatten(layer).unwrap().shapes
}
