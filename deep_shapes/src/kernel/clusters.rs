use super::edge_extend::chain_links;
use crate::geometry::Edge;
use std::collections::BTreeMap;

/// Disjoint set forest over `0..n`.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
        }
    }

    pub fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // smaller index becomes the root to keep results deterministic
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }

    /// Groups of members, each sorted, ordered by their first member.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..self.parent.len() {
            let r = self.find(i);
            by_root.entry(r).or_default().push(i);
        }
        by_root.into_values().collect()
    }
}

/// Rule deciding which edges influence each other's result.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ClusterRule {
    /// Edges on the same supporting line whose closed extents overlap or touch.
    Collinear,
    /// Edges linked by unique continuations, see [chain_links].
    Chains,
}

/// Connected components of `edges` under `rule`.
pub fn edge_clusters(edges: &[Edge], rule: ClusterRule) -> Vec<Vec<usize>> {
    let mut uf = UnionFind::new(edges.len());
    match rule {
        ClusterRule::Collinear => {
            let mut lines: BTreeMap<_, Vec<(i128, i128, usize)>> = BTreeMap::new();
            for (i, e) in edges.iter().enumerate() {
                if let Some(key) = e.line_key() {
                    let (s, t) = (key.position(e.p1), key.position(e.p2));
                    lines
                        .entry(key)
                        .or_default()
                        .push((s.min(t), s.max(t), i));
                }
            }
            for mut items in lines.into_values() {
                items.sort_unstable();
                let mut reach = items[0].1;
                let mut prev = items[0].2;
                for &(lo, hi, i) in &items[1..] {
                    if lo <= reach {
                        uf.union(prev, i);
                        reach = reach.max(hi);
                    } else {
                        reach = hi;
                    }
                    prev = i;
                }
            }
        }
        ClusterRule::Chains => return chain_clusters(edges, &[]),
    }
    uf.groups()
}

/// Chains of `edges` (see [chain_links]) with `hidden` edges counting at end points without being
/// grouped.
pub fn chain_clusters(edges: &[Edge], hidden: &[Edge]) -> Vec<Vec<usize>> {
    let n = edges.len();
    let all: Vec<Edge> = edges.iter().chain(hidden).copied().collect();
    let mut uf = UnionFind::new(n);
    for (i, link) in chain_links(&all).into_iter().take(n).enumerate() {
        if let Some(j) = link.filter(|&j| j < n) {
            uf.union(i, j);
        }
    }
    uf.groups()
}
