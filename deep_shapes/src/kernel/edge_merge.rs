use super::BooleanOp;
use crate::{
    core::math::{min_max, Coord, Point},
    geometry::{Edge, LineKey},
};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct LineCoverage {
    base: Option<Point>,
    // (position, delta of a, delta of b)
    events: Vec<(i128, i32, i32)>,
}

fn interval(key: &LineKey, e: &Edge) -> (i128, i128) {
    min_max(key.position(e.p1), key.position(e.p2))
}

fn point_at(key: &LineKey, base: Point, pos: i128) -> Point {
    let k = (pos - key.position(base)) / key.dir.length_squared();
    base + key.dir.scale(k as Coord)
}

fn collect_lines(a: &[Edge], b: &[Edge]) -> BTreeMap<LineKey, LineCoverage> {
    let mut lines: BTreeMap<LineKey, LineCoverage> = BTreeMap::new();
    for (edges, is_a) in [(a, true), (b, false)] {
        for e in edges {
            let Some(key) = e.line_key() else {
                continue;
            };
            let (lo, hi) = interval(&key, e);
            let line = lines.entry(key).or_default();
            line.base.get_or_insert(e.p1);
            let (da, db) = if is_a { (1, 0) } else { (0, 1) };
            line.events.push((lo, da, db));
            line.events.push((hi, -da, -db));
        }
    }
    lines
}

/// Coverage based boolean of two edge sets.
///
/// Each supporting line is treated independently: a stretch of the line is part of the result if
/// its coverage by `a` and `b` satisfies `op`. Output edges are maximal (touching stretches are
/// joined), have positive length and point along the canonical direction of their line.
pub fn edge_boolean(a: &[Edge], b: &[Edge], op: BooleanOp) -> Vec<Edge> {
    let mut result = Vec::new();
    for (key, mut line) in collect_lines(a, b) {
        let Some(base) = line.base else {
            continue;
        };
        line.events.sort_unstable_by_key(|ev| ev.0);

        let (mut ca, mut cb) = (0i32, 0i32);
        let mut run_start: Option<i128> = None;
        let mut i = 0;
        while i < line.events.len() {
            let pos = line.events[i].0;
            while i < line.events.len() && line.events[i].0 == pos {
                ca += line.events[i].1;
                cb += line.events[i].2;
                i += 1;
            }
            let included = i < line.events.len() && op.includes(ca > 0, cb > 0);
            match (run_start, included) {
                (None, true) => run_start = Some(pos),
                (Some(start), false) => {
                    result.push(Edge::new(
                        point_at(&key, base, start),
                        point_at(&key, base, pos),
                    ));
                    run_start = None;
                }
                _ => {}
            }
        }
    }
    result
}

/// Joins collinear edges that overlap or touch. Degenerate edges vanish.
pub fn merge_edges(edges: &[Edge]) -> Vec<Edge> {
    edge_boolean(edges, &[], BooleanOp::Or)
}
