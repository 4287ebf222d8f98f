//! Flat shapes: edges, polygons and homogeneous shape sets.
mod edge;
mod polygon;

pub use edge::{Edge, LineKey};
pub use polygon::{contour_area2, Polygon};

use crate::core::{
    math::{Point, Rect},
    trans::ComplexTrans,
};

/// Geometry kind of a shape collection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GeometryKind {
    Edges,
    Polygons,
}

/// A single shape stored in a cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    Edge(Edge),
    Polygon(Polygon),
}

impl Shape {
    pub fn bbox(&self) -> Rect {
        match self {
            Shape::Edge(e) => e.bbox(),
            Shape::Polygon(p) => p.bbox(),
        }
    }

    pub fn transformed(&self, t: &ComplexTrans) -> Shape {
        match self {
            Shape::Edge(e) => Shape::Edge(e.transformed(t)),
            Shape::Polygon(p) => Shape::Polygon(p.transformed(t)),
        }
    }
}

impl From<Edge> for Shape {
    fn from(e: Edge) -> Self {
        Shape::Edge(e)
    }
}

impl From<Polygon> for Shape {
    fn from(p: Polygon) -> Self {
        Shape::Polygon(p)
    }
}

/// Homogeneous collection of shapes of one [GeometryKind].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShapeSet {
    Edges(Vec<Edge>),
    Polygons(Vec<Polygon>),
}

impl ShapeSet {
    pub fn empty(kind: GeometryKind) -> Self {
        match kind {
            GeometryKind::Edges => ShapeSet::Edges(Vec::new()),
            GeometryKind::Polygons => ShapeSet::Polygons(Vec::new()),
        }
    }

    #[inline]
    pub fn kind(&self) -> GeometryKind {
        match self {
            ShapeSet::Edges(_) => GeometryKind::Edges,
            ShapeSet::Polygons(_) => GeometryKind::Polygons,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match self {
            ShapeSet::Edges(v) => v.len(),
            ShapeSet::Polygons(v) => v.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Edges of the set, empty for polygon sets.
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        match self {
            ShapeSet::Edges(v) => v,
            ShapeSet::Polygons(_) => &[],
        }
    }

    /// Polygons of the set, empty for edge sets.
    #[inline]
    pub fn polygons(&self) -> &[Polygon] {
        match self {
            ShapeSet::Edges(_) => &[],
            ShapeSet::Polygons(v) => v,
        }
    }

    /// Bounding box of the shape at `index`.
    pub fn shape_bbox(&self, index: usize) -> Rect {
        match self {
            ShapeSet::Edges(v) => v[index].bbox(),
            ShapeSet::Polygons(v) => v[index].bbox(),
        }
    }

    pub fn bbox(&self) -> Rect {
        (0..self.len())
            .map(|i| self.shape_bbox(i))
            .fold(Rect::empty(), |acc, r| acc.union(&r))
    }

    /// Adds a shape converting it to the kind of this set: polygons contribute their contour
    /// edges to edge sets, loose edges are ignored by polygon sets.
    pub fn push_shape(&mut self, shape: &Shape) {
        match (self, shape) {
            (ShapeSet::Edges(v), Shape::Edge(e)) => v.push(*e),
            (ShapeSet::Edges(v), Shape::Polygon(p)) => v.extend(p.edges()),
            (ShapeSet::Polygons(v), Shape::Polygon(p)) => {
                if !p.is_degenerate() {
                    v.push(p.clone())
                }
            }
            (ShapeSet::Polygons(_), Shape::Edge(_)) => {}
        }
    }

    /// Appends the shapes of `other` translated by `d` whose boxes touch `filter` (all shapes if
    /// `filter` is `None`). Sets of a different kind are ignored.
    pub fn extend_moved(&mut self, other: &ShapeSet, d: Point, filter: Option<&Rect>) {
        let keep = |r: Rect| filter.map_or(true, |f| r.moved(d).touches(f));
        match (self, other) {
            (ShapeSet::Edges(v), ShapeSet::Edges(o)) => {
                v.extend(o.iter().filter(|e| keep(e.bbox())).map(|e| e.moved(d)))
            }
            (ShapeSet::Polygons(v), ShapeSet::Polygons(o)) => {
                v.extend(o.iter().filter(|p| keep(p.bbox())).map(|p| p.moved(d)))
            }
            _ => debug_assert!(false, "mixed geometry kinds"),
        }
    }

    pub fn moved(&self, d: Point) -> ShapeSet {
        let mut result = ShapeSet::empty(self.kind());
        result.extend_moved(self, d, None);
        result
    }

    /// Sorts the shapes into canonical order (for order independent comparison and hashing).
    pub fn sort(&mut self) {
        match self {
            ShapeSet::Edges(v) => v.sort_unstable(),
            ShapeSet::Polygons(v) => v.sort_unstable(),
        }
    }

    pub fn sorted(mut self) -> Self {
        self.sort();
        self
    }

    /// Shapes of the set as [Shape] values.
    pub fn shapes(&self) -> Vec<Shape> {
        match self {
            ShapeSet::Edges(v) => v.iter().map(|e| Shape::Edge(*e)).collect(),
            ShapeSet::Polygons(v) => v.iter().map(|p| Shape::Polygon(p.clone())).collect(),
        }
    }
}

impl From<Vec<Edge>> for ShapeSet {
    fn from(v: Vec<Edge>) -> Self {
        ShapeSet::Edges(v)
    }
}

impl From<Vec<Polygon>> for ShapeSet {
    fn from(v: Vec<Polygon>) -> Self {
        ShapeSet::Polygons(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::point;

    #[test]
    fn edge_sets_take_polygon_contours() {
        let mut set = ShapeSet::empty(GeometryKind::Edges);
        set.push_shape(&Shape::Polygon(Polygon::from_rect(&Rect::from_ltrb(
            0, 0, 10, 10,
        ))));
        set.push_shape(&Shape::Edge(Edge::from_coords(0, 0, 5, 5)));
        assert_eq!(set.len(), 5);

        let mut polys = ShapeSet::empty(GeometryKind::Polygons);
        polys.push_shape(&Shape::Edge(Edge::from_coords(0, 0, 5, 5)));
        assert!(polys.is_empty());
    }

    #[test]
    fn extend_moved_filters_by_box() {
        let src = ShapeSet::Edges(vec![
            Edge::from_coords(0, 0, 10, 0),
            Edge::from_coords(100, 0, 110, 0),
        ]);
        let mut dst = ShapeSet::empty(GeometryKind::Edges);
        dst.extend_moved(&src, point(5, 0), Some(&Rect::from_ltrb(0, -1, 20, 1)));
        assert_eq!(dst, ShapeSet::Edges(vec![Edge::from_coords(5, 0, 15, 0)]));
        assert_eq!(src.bbox(), Rect::from_ltrb(0, 0, 110, 0));
    }
}
