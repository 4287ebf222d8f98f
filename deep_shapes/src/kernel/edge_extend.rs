use crate::{
    core::math::{round_vector, Coord, Point},
    geometry::{contour_area2, Edge, Polygon},
};
use std::collections::HashMap;

/// Distances used to turn edges into polygons.
///
/// `begin` and `end` extend the edge along its direction, `outside` grows to the left side of
/// the edge direction (the outside of polygon contours) and `inside` to the right side. With `join`
/// set, edges forming chains (end point of one edge is the start point of exactly one other edge)
/// are turned into one polygon with mitred corners; closed chains become rings.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extension {
    pub begin: Coord,
    pub end: Coord,
    pub outside: Coord,
    pub inside: Coord,
    pub join: bool,
}

impl Extension {
    pub fn new(begin: Coord, end: Coord, outside: Coord, inside: Coord) -> Self {
        Extension {
            begin,
            end,
            outside,
            inside,
            join: false,
        }
    }

    pub fn joined(mut self) -> Self {
        self.join = true;
        self
    }
}

#[derive(Debug, Copy, Clone)]
struct Frame {
    ux: f64,
    uy: f64,
}

impl Frame {
    fn of(e: &Edge) -> Self {
        let d = e.d();
        let l = e.length();
        Frame {
            ux: d.x as f64 / l,
            uy: d.y as f64 / l,
        }
    }

    /// Left normal.
    fn normal(&self) -> (f64, f64) {
        (-self.uy, self.ux)
    }

    fn along(&self, dist: Coord) -> Point {
        round_vector(self.ux * dist as f64, self.uy * dist as f64)
    }

    fn across(&self, dist: Coord) -> Point {
        let (nx, ny) = self.normal();
        round_vector(nx * dist as f64, ny * dist as f64)
    }
}

/// Offset of a corner between two edges so both sides stay at `dist`.
fn mitre(a: &Frame, b: &Frame, dist: Coord) -> Point {
    let (ax, ay) = a.normal();
    let (bx, by) = b.normal();
    let den = 1.0 + ax * bx + ay * by;
    if den < 1e-9 {
        return a.across(dist);
    }
    let d = dist as f64;
    round_vector((ax + bx) / den * d, (ay + by) / den * d)
}

fn push_valid(out: &mut Vec<Polygon>, p: Polygon) {
    if !p.is_degenerate() && p.area2() != 0 {
        out.push(p);
    }
}

fn extend_single(e: &Edge, ext: &Extension, out: &mut Vec<Polygon>) {
    let f = Frame::of(e);
    let s = e.p1 - f.along(ext.begin);
    let t = e.p2 + f.along(ext.end);
    let o = f.across(ext.outside);
    let i = f.across(ext.inside);
    push_valid(out, Polygon::new([s + o, t + o, t - i, s - i]));
}

/// Turns every edge into a quadrilateral. Degenerate edges produce nothing.
pub fn extend_edges(edges: &[Edge], ext: &Extension) -> Vec<Polygon> {
    let mut out = Vec::new();
    for e in edges.iter().filter(|e| !e.is_degenerate()) {
        extend_single(e, ext, &mut out);
    }
    out
}

fn extend_chain(chain: &[Edge], ext: &Extension, out: &mut Vec<Polygon>) {
    let frames: Vec<Frame> = chain.iter().map(Frame::of).collect();
    let n = chain.len();
    let (first, last) = (frames[0], frames[n - 1]);

    let mut outer = Vec::with_capacity(n + 1);
    let mut inner = Vec::with_capacity(n + 1);
    let s = chain[0].p1 - first.along(ext.begin);
    outer.push(s + first.across(ext.outside));
    inner.push(s - first.across(ext.inside));
    for k in 0..n - 1 {
        let q = chain[k].p2;
        outer.push(q + mitre(&frames[k], &frames[k + 1], ext.outside));
        inner.push(q - mitre(&frames[k], &frames[k + 1], ext.inside));
    }
    let t = chain[n - 1].p2 + last.along(ext.end);
    outer.push(t + last.across(ext.outside));
    inner.push(t - last.across(ext.inside));

    outer.extend(inner.into_iter().rev());
    push_valid(out, Polygon::new(outer));
}

fn extend_loop(chain: &[Edge], ext: &Extension, out: &mut Vec<Polygon>) {
    let frames: Vec<Frame> = chain.iter().map(Frame::of).collect();
    let n = chain.len();
    let mut outer = Vec::with_capacity(n);
    let mut inner = Vec::with_capacity(n);
    for k in 0..n {
        let next = (k + 1) % n;
        let q = chain[k].p2;
        outer.push(q + mitre(&frames[k], &frames[next], ext.outside));
        inner.push(q - mitre(&frames[k], &frames[next], ext.inside));
    }
    let (hull, hole) = if contour_area2(&outer).abs() >= contour_area2(&inner).abs() {
        (outer, inner)
    } else {
        (inner, outer)
    };
    push_valid(out, Polygon::with_holes(hull, [hole]));
}

/// Unique continuation of every edge: `Some(j)` for edge `i` if `j` is the only edge starting
/// where `i` ends and `i` the only edge ending there. Degenerate edges never take part.
pub fn chain_links(edges: &[Edge]) -> Vec<Option<usize>> {
    let mut starts: HashMap<Point, Vec<usize>> = HashMap::new();
    let mut ends: HashMap<Point, usize> = HashMap::new();
    for (i, e) in edges.iter().enumerate() {
        if e.is_degenerate() {
            continue;
        }
        starts.entry(e.p1).or_default().push(i);
        *ends.entry(e.p2).or_default() += 1;
    }
    edges
        .iter()
        .enumerate()
        .map(|(i, e)| {
            if e.is_degenerate() || ends.get(&e.p2) != Some(&1) {
                return None;
            }
            match starts.get(&e.p2).map(Vec::as_slice) {
                Some(&[j]) if j != i => Some(j),
                _ => None,
            }
        })
        .collect()
}

/// Like [extend_edges] but edges forming chains are joined into one polygon per chain.
pub fn extend_edges_joined(edges: &[Edge], ext: &Extension) -> Vec<Polygon> {
    extend_edges_joined_within(edges, &[], ext)
}

/// Joined extension of `edges` where `others` only count when deciding the continuation at end
/// points (they produce no output). Links from `edges` into `others` are cut.
pub fn extend_edges_joined_within(
    edges: &[Edge],
    others: &[Edge],
    ext: &Extension,
) -> Vec<Polygon> {
    let n = edges.len();
    let links = if others.is_empty() {
        chain_links(edges)
    } else {
        let all: Vec<Edge> = edges.iter().chain(others).copied().collect();
        chain_links(&all)
    };

    let mut next: Vec<Option<usize>> = vec![None; n];
    let mut has_prev = vec![false; n];
    for (i, link) in links.into_iter().take(n).enumerate() {
        if let Some(j) = link.filter(|&j| j < n) {
            next[i] = Some(j);
            has_prev[j] = true;
        }
    }

    let mut out = Vec::new();
    let mut visited: Vec<bool> = edges.iter().map(Edge::is_degenerate).collect();
    let mut chain = Vec::new();
    for start in 0..n {
        if has_prev[start] || visited[start] {
            continue;
        }
        chain.clear();
        let mut cur = Some(start);
        while let Some(i) = cur {
            visited[i] = true;
            chain.push(edges[i]);
            cur = next[i];
        }
        extend_chain(&chain, ext, &mut out);
    }

    // what remains are closed loops
    for start in 0..n {
        if visited[start] {
            continue;
        }
        chain.clear();
        let mut cur = Some(start);
        while let Some(i) = cur.filter(|i| !visited[*i]) {
            visited[i] = true;
            chain.push(edges[i]);
            cur = next[i];
        }
        extend_loop(&chain, ext, &mut out);
    }
    out
}
