//! Integer math for database unit coordinates: points, boxes and exact rounding helpers.
mod base_math;
mod point;
mod rect;

pub use base_math::*;
pub use point::{point, Point};
pub use rect::Rect;

/// Coordinate type (database units).
pub type Coord = i64;
