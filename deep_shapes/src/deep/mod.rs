//! Hierarchical ("deep") shape processing.
//!
//! A [DeepShapeStore] mirrors the cell hierarchy of a source [Layout](crate::layout::Layout) as a
//! tree of cell variants and keeps the shapes of every delivered or computed layer per variant.
//! Operators evaluate on that tree and produce new [DeepLayer]s whose flattened content equals the
//! flat evaluation of the operator on the flattened inputs.
//!
//! # Examples
//!
//! ```
//! # use deep_shapes::deep::*;
//! # use deep_shapes::layout::*;
//! # use deep_shapes::geometry::*;
//! # use deep_shapes::core::{math::point, trans::Trans};
//! let mut layout = Layout::new();
//! let l1 = layout.insert_layer(LayerInfo::new(1, 0));
//! let top = layout.add_cell("TOP");
//! let a = layout.add_cell("A");
//! layout.insert(a, l1, Edge::from_coords(0, 0, 10, 0));
//! // two abutting instances: their edges merge across the cell boundary
//! layout.add_instance(top, Instance::new(a, Trans::translation(point(0, 0))));
//! layout.add_instance(top, Instance::new(a, Trans::translation(point(10, 0))));
//!
//! let store = DeepShapeStore::new();
//! let edges = store
//!     .deliver(&RecursiveShapeSource::new(&layout, top, l1), GeometryKind::Edges)
//!     .unwrap();
//! let merged = store.merged(edges).unwrap();
//! let flat = store.flatten(merged).unwrap();
//! assert_eq!(flat.shapes, ShapeSet::Edges(vec![Edge::from_coords(0, 0, 20, 0)]));
//! ```
//!
//! Variant bookkeeping and the evaluation plans are internal to the store:
//!
//! ```compile_fail
//! use deep_shapes::deep::VariantKey;
//! ```
mod engine;
mod error;
mod materialize;
mod ops;
mod options;
mod store;
mod variants;

pub use error::{DeepError, DeepResult};
pub use materialize::{FlatShapes, Materializer};
pub use ops::{evaluate_flat, Operator};
pub use options::StoreOptions;
pub use store::{DeepLayer, DeepShapeStore, StoreId, StoreStats};
