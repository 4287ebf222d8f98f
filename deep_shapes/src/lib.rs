//! Hierarchical edge and polygon processing over cell trees.
//!
//! Shapes are delivered from a [Layout](layout::Layout) into a [DeepShapeStore](deep::DeepShapeStore)
//! without flattening, operators run once per distinct cell context and the results can be
//! flattened or written back into a layout hierarchy.
extern crate static_aabb2d_index;

pub mod core;
pub mod deep;
pub mod geometry;
pub mod kernel;
pub mod layout;

pub use crate::deep::{DeepError, DeepLayer, DeepResult, DeepShapeStore, StoreOptions};
pub use crate::geometry::{Edge, GeometryKind, Polygon, Shape, ShapeSet};
