//! Edge versus polygon relations: inside/outside partition and interaction tests.
//!
//! Pieces are classified at their midpoints. To keep everything in integer arithmetic midpoints
//! and polygons are evaluated in doubled coordinates.
use crate::{
    core::math::{round_div, Point, Rect},
    geometry::{Edge, Polygon, ShapeSet},
};

/// Winding number of a closed contour around `q`; `q` and the contour are given in the same
/// (possibly scaled) coordinates via `scale`.
fn winding_number(contour: &[Point], scale: i64, q: Point) -> i32 {
    let n = contour.len();
    let mut wn = 0;
    for i in 0..n {
        let a = contour[i].scale(scale);
        let b = contour[(i + 1) % n].scale(scale);
        let is_left = (b - a).perp_dot(q - a);
        if a.y <= q.y {
            if b.y > q.y && is_left > 0 {
                wn += 1;
            }
        } else if b.y <= q.y && is_left < 0 {
            wn -= 1;
        }
    }
    wn
}

/// Returns `true` if the doubled point `q2` lies inside or on the boundary of the polygon.
fn covers2(poly: &Polygon, q2: Point) -> bool {
    let bbox = poly.bbox();
    let bbox2 = Rect::new(bbox.min.scale(2), bbox.max.scale(2));
    if !bbox2.contains_point(q2) {
        return false;
    }
    if poly
        .edges()
        .any(|e| Edge::new(e.p1.scale(2), e.p2.scale(2)).contains(q2))
    {
        return true;
    }
    poly.contours().map(|c| winding_number(c, 2, q2)).sum::<i32>() != 0
}

/// Returns `true` if `p` lies inside or on the boundary of the polygon.
pub fn polygon_covers(poly: &Polygon, p: Point) -> bool {
    covers2(poly, p.scale(2))
}

/// Intersection points of `f` with `e`, rounded to the grid.
fn split_points(e: &Edge, f: &Edge, out: &mut Vec<Point>) {
    let d = e.d();
    let g = f.d();
    let w = f.p1 - e.p1;
    let den = d.perp_dot(g);
    if den == 0 {
        if w.perp_dot(d) == 0 {
            out.extend([f.p1, f.p2].into_iter().filter(|p| e.contains(*p)));
        }
        return;
    }
    let (tn, un, den) = if den < 0 {
        (-w.perp_dot(g), -w.perp_dot(d), -den)
    } else {
        (w.perp_dot(g), w.perp_dot(d), den)
    };
    if tn < 0 || tn > den || un < 0 || un > den {
        return;
    }
    out.push(Point::new(
        e.p1.x + round_div(d.x as i128 * tn, den),
        e.p1.y + round_div(d.y as i128 * tn, den),
    ));
}

/// Splits `e` at the polygon boundaries and reports maximal pieces with their classification
/// (`true` for inside or on the boundary).
fn classify_edge(e: &Edge, polygons: &[&Polygon], mut sink: impl FnMut(Edge, bool)) {
    let covered = |q2: Point| polygons.iter().any(|p| covers2(p, q2));
    if e.is_degenerate() {
        sink(*e, covered(e.p1.scale(2)));
        return;
    }

    let d = e.d();
    let len2 = d.length_squared();
    let mut splits = Vec::new();
    for p in polygons {
        for f in p.edges() {
            split_points(e, &f, &mut splits);
        }
    }
    let mut splits: Vec<(i128, Point)> = splits
        .into_iter()
        .map(|p| ((p - e.p1).dot(d), p))
        .filter(|(s, p)| *s > 0 && *s < len2 && *p != e.p1 && *p != e.p2)
        .collect();
    splits.sort_unstable();
    splits.dedup_by_key(|(_, p)| *p);

    let chain: Vec<Point> = std::iter::once(e.p1)
        .chain(splits.into_iter().map(|(_, p)| p))
        .chain(std::iter::once(e.p2))
        .collect();

    let mut run: Option<(Point, bool)> = None;
    let mut last = e.p1;
    for w in chain.windows(2) {
        let (q, r) = (w[0], w[1]);
        if q == r {
            continue;
        }
        let inside = covered(q + r);
        match run {
            Some((start, cls)) if cls != inside => {
                sink(Edge::new(start, q), cls);
                run = Some((q, inside));
            }
            None => run = Some((q, inside)),
            _ => {}
        }
        last = r;
    }
    if let Some((start, cls)) = run {
        sink(Edge::new(start, last), cls);
    }
}

fn relevant<'a>(e: &Edge, polygons: &'a [Polygon]) -> Vec<&'a Polygon> {
    let bbox = e.bbox();
    polygons
        .iter()
        .filter(|p| p.bbox().touches(&bbox))
        .collect()
}

/// Splits edges into the parts inside or on the boundary of the polygons and the parts outside.
///
/// Pieces keep the direction of their edge, and for every edge the inside and outside pieces
/// chain up to the original edge without gaps or overlaps.
pub fn edge_polygon_parts(edges: &[Edge], polygons: &[Polygon]) -> (Vec<Edge>, Vec<Edge>) {
    let mut inside = Vec::new();
    let mut outside = Vec::new();
    for e in edges {
        let polys = relevant(e, polygons);
        if polys.is_empty() {
            outside.push(*e);
            continue;
        }
        classify_edge(e, &polys, |piece, is_inside| {
            if is_inside {
                inside.push(piece)
            } else {
                outside.push(piece)
            }
        });
    }
    (inside, outside)
}

pub fn inside_part(edges: &[Edge], polygons: &[Polygon]) -> Vec<Edge> {
    edge_polygon_parts(edges, polygons).0
}

pub fn outside_part(edges: &[Edge], polygons: &[Polygon]) -> Vec<Edge> {
    edge_polygon_parts(edges, polygons).1
}

/// Returns `true` if the edge has at least one point inside or on the polygon.
pub fn edge_interacts_polygon(e: &Edge, poly: &Polygon) -> bool {
    if !e.bbox().touches(&poly.bbox()) {
        return false;
    }
    poly.edges().any(|f| f.intersects(e)) || polygon_covers(poly, e.p1)
}

/// Edges interacting with at least one shape of `mask` (or none if `inverse`). Edges interact with
/// edges sharing a point and with polygons they touch or enter.
pub fn select_interacting(edges: &[Edge], mask: &ShapeSet, inverse: bool) -> Vec<Edge> {
    edges
        .iter()
        .filter(|e| {
            let hit = match mask {
                ShapeSet::Edges(m) => m.iter().any(|f| f.intersects(e)),
                ShapeSet::Polygons(m) => m.iter().any(|p| edge_interacts_polygon(e, p)),
            };
            hit != inverse
        })
        .copied()
        .collect()
}
