use crate::{
    core::math::{round_vector, Coord},
    geometry::Edge,
};

/// Selects edges by length: `min <= length < max`, inverted if `inverse` is set.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LengthFilter {
    pub min: Coord,
    pub max: Coord,
    pub inverse: bool,
}

impl LengthFilter {
    pub fn new(min: Coord, max: Coord) -> Self {
        LengthFilter {
            min,
            max,
            inverse: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.inverse = !self.inverse;
        self
    }

    pub fn selects(&self, e: &Edge) -> bool {
        let len = e.length();
        (self.min as f64 <= len && len < self.max as f64) != self.inverse
    }
}

/// Selects edges by the angle of their undirected line in degrees, normalized to `[0, 180)`:
/// `min_deg <= angle < max_deg`, inverted if `inverse` is set.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrientationFilter {
    pub min_deg: f64,
    pub max_deg: f64,
    pub inverse: bool,
}

impl OrientationFilter {
    pub fn new(min_deg: f64, max_deg: f64) -> Self {
        OrientationFilter {
            min_deg,
            max_deg,
            inverse: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.inverse = !self.inverse;
        self
    }

    pub fn selects(&self, e: &Edge) -> bool {
        let a = undirected_angle(e);
        (self.min_deg <= a && a < self.max_deg) != self.inverse
    }
}

/// Angle of the edge's line in degrees in `[0, 180)`. Axis parallel edges are exact.
pub fn undirected_angle(e: &Edge) -> f64 {
    let d = e.d();
    if d.y == 0 {
        return 0.0;
    }
    if d.x == 0 {
        return 90.0;
    }
    let mut a = (d.y as f64).atan2(d.x as f64).to_degrees();
    if a < 0.0 {
        a += 180.0;
    }
    if a >= 180.0 {
        a -= 180.0;
    }
    a
}

#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeFilter {
    Length(LengthFilter),
    Orientation(OrientationFilter),
}

impl EdgeFilter {
    pub fn selects(&self, e: &Edge) -> bool {
        match self {
            EdgeFilter::Length(f) => f.selects(e),
            EdgeFilter::Orientation(f) => f.selects(e),
        }
    }
}

impl From<LengthFilter> for EdgeFilter {
    fn from(f: LengthFilter) -> Self {
        EdgeFilter::Length(f)
    }
}

impl From<OrientationFilter> for EdgeFilter {
    fn from(f: OrientationFilter) -> Self {
        EdgeFilter::Orientation(f)
    }
}

pub fn filter_edges(edges: &[Edge], filter: &EdgeFilter) -> Vec<Edge> {
    edges.iter().filter(|e| filter.selects(e)).copied().collect()
}

/// Which part of an edge a segment is taken from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SegmentMode {
    Start,
    End,
    Center,
}

/// Segment length: the larger of the absolute `length` and `fraction` of the edge length, never
/// more than the edge itself.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentSpec {
    pub length: Coord,
    pub fraction: f64,
}

impl SegmentSpec {
    pub fn new(length: Coord, fraction: f64) -> Self {
        SegmentSpec { length, fraction }
    }
}

pub fn segment(e: &Edge, mode: SegmentMode, spec: &SegmentSpec) -> Edge {
    let l = e.length();
    if l == 0.0 {
        return *e;
    }
    let d = e.d();
    let eff = (spec.length as f64).max(spec.fraction * l).min(l);
    let along = |dist: f64| round_vector(d.x as f64 * dist / l, d.y as f64 * dist / l);
    match mode {
        SegmentMode::Start => Edge::new(e.p1, e.p1 + along(eff)),
        SegmentMode::End => Edge::new(e.p2 - along(eff), e.p2),
        SegmentMode::Center => Edge::new(
            e.p1 + along((l - eff) * 0.5),
            e.p1 + along((l + eff) * 0.5),
        ),
    }
}

pub fn segments(edges: &[Edge], mode: SegmentMode, spec: &SegmentSpec) -> Vec<Edge> {
    edges.iter().map(|e| segment(e, mode, spec)).collect()
}
