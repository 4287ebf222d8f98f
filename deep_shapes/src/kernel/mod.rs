//! Local geometry kernel: flat operators on a single shape set in one coordinate system.
//!
//! Every operator is exact integer arithmetic or rounds with [round_coord](crate::core::math::round_coord),
//! so results commute with integer translation. The hierarchical engine depends on this to compute a
//! variant once and place the result wherever the variant occurs.
mod clusters;
mod edge_extend;
mod edge_filters;
mod edge_merge;
mod edge_polygon;

pub use clusters::{chain_clusters, edge_clusters, ClusterRule, UnionFind};
pub use edge_extend::{
    chain_links, extend_edges, extend_edges_joined, extend_edges_joined_within, Extension,
};
pub use edge_filters::{
    filter_edges, segment, segments, undirected_angle, EdgeFilter, LengthFilter,
    OrientationFilter, SegmentMode, SegmentSpec,
};
pub use edge_merge::{edge_boolean, merge_edges};
pub use edge_polygon::{
    edge_interacts_polygon, edge_polygon_parts, inside_part, outside_part, polygon_covers,
    select_interacting,
};

use crate::geometry::{Edge, Polygon};

/// Boolean operation between two edge sets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BooleanOp {
    /// Parts covered by both operands.
    And,
    /// Parts of the first operand not covered by the second.
    Not,
    /// Parts covered by exactly one operand.
    Xor,
    /// Parts covered by any operand.
    Or,
}

impl BooleanOp {
    #[inline]
    pub fn includes(&self, in_a: bool, in_b: bool) -> bool {
        match self {
            BooleanOp::And => in_a && in_b,
            BooleanOp::Not => in_a && !in_b,
            BooleanOp::Xor => in_a != in_b,
            BooleanOp::Or => in_a || in_b,
        }
    }
}

/// Contour edges of polygons (interior on the right side).
pub fn polygon_edges(polygons: &[Polygon]) -> Vec<Edge> {
    polygons.iter().flat_map(|p| p.edges()).collect()
}
