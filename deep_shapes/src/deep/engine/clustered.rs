use super::{
    space::{Elements, Node},
    Evaluation,
};
use crate::{
    core::math::{Point, Rect},
    deep::{
        error::DeepResult,
        store::LayerData,
        variants::{Context, VariantId},
    },
    geometry::{Edge, ShapeSet},
    kernel::{chain_clusters, edge_clusters, ClusterRule},
};
use num_traits::Zero;
use std::{collections::HashMap, sync::Arc};

impl Evaluation<'_> {
    /// Evaluates `node` with the operand shapes `ctx` (node coordinates) that lie outside of its
    /// subtree and touch it.
    ///
    /// Groups of shapes connected under `rule` are computed here if none of their members is
    /// part of `ctx`. The others are returned (raw, node coordinates) for the parent to take over.
    pub(super) fn clustered(
        &mut self,
        node: Node,
        ctx: Arc<Context>,
        rule: ClusterRule,
    ) -> DeepResult<(VariantId, Arc<Context>)> {
        let key = (node.id, ctx.clone());
        if let Some(hit) = self.clustered.get(&key) {
            return Ok(hit.clone());
        }

        let a = self.a.clone();
        let b = self.b.clone();
        let elements = self.elements(&node)?;
        let a_locals = a.shapes_of(node.a).cloned();
        let b_locals = match (&b, node.b) {
            (Some(b), Some(v)) => b.shapes_of(v).cloned(),
            _ => None,
        };

        let mut pool_a: Vec<Edge> = a_locals.as_ref().map_or(Vec::new(), |s| s.edges().to_vec());
        let mut pool_b: Vec<Edge> = b_locals.as_ref().map_or(Vec::new(), |s| s.edges().to_vec());
        let mut children = Vec::with_capacity(elements.items.len());
        let mut exported_below = Vec::new();
        let mut changed = false;

        for (i, el) in elements.items.iter().enumerate() {
            let footprint = el.bbox();
            if footprint.is_empty() {
                children.push((el.node.id, el.disp));
                continue;
            }

            let mut primary = ShapeSet::Edges(Vec::new());
            let mut secondary = ShapeSet::Edges(Vec::new());
            if let Some(l) = &a_locals {
                primary.extend_moved(l, Point::zero(), Some(&footprint));
            }
            if let Some(l) = &b_locals {
                secondary.extend_moved(l, Point::zero(), Some(&footprint));
            }
            primary.extend_moved(&ctx.primary, Point::zero(), Some(&footprint));
            secondary.extend_moved(&ctx.secondary, Point::zero(), Some(&footprint));
            for j in elements.query(&footprint) {
                if j == i {
                    continue;
                }
                let sibling = &elements.items[j];
                self.collect_subtree(&a, sibling.node.a, sibling.disp, &footprint, &mut primary)?;
                if let (Some(b), Some(v)) = (&b, sibling.node.b) {
                    self.collect_subtree(b, v, sibling.disp, &footprint, &mut secondary)?;
                }
            }

            let child_ctx = Context::new(primary, secondary).moved(-el.disp).sorted();
            let (id, exports) = self.clustered(el.node, Arc::new(child_ctx), rule)?;
            changed |= id != el.node.id;
            children.push((id, el.disp));
            exported_below.extend(exports.primary.edges().iter().map(|e| e.moved(el.disp)));
            pool_b.extend(exports.secondary.edges().iter().map(|e| e.moved(el.disp)));
        }

        pool_a.extend_from_slice(&exported_below);
        // edges the children computed themselves still decide chaining at our end points
        let hidden = match rule {
            ClusterRule::Chains if !pool_a.is_empty() => {
                self.kept_below(&a, &elements, &pool_a, &exported_below)?
            }
            _ => Vec::new(),
        };

        // items: own pool first, then the context
        let owned = pool_a.len() + pool_b.len();
        let mut items = pool_a;
        let first_b = items.len();
        items.extend(pool_b);
        items.extend_from_slice(ctx.primary.edges());
        items.extend_from_slice(ctx.secondary.edges());

        let (mut keep_a, mut keep_b) = (Vec::new(), Vec::new());
        let (mut export_a, mut export_b) = (Vec::new(), Vec::new());
        let clusters = match rule {
            ClusterRule::Chains => chain_clusters(&items, &hidden),
            ClusterRule::Collinear => edge_clusters(&items, rule),
        };
        for cluster in clusters {
            let open = cluster.iter().any(|&k| k >= owned);
            for k in cluster.into_iter().filter(|&k| k < owned) {
                let target = match (k < first_b, open) {
                    (true, false) => &mut keep_a,
                    (true, true) => &mut export_a,
                    (false, false) => &mut keep_b,
                    (false, true) => &mut export_b,
                };
                target.push(items[k]);
            }
        }

        let local = if keep_a.is_empty() && keep_b.is_empty() {
            None
        } else {
            let cell = self.info(node.a)?.cell;
            let second = match rule {
                ClusterRule::Chains => {
                    let mut others = export_a.clone();
                    others.extend_from_slice(ctx.primary.edges());
                    others.extend(hidden);
                    Some(ShapeSet::Edges(others))
                }
                ClusterRule::Collinear => b.as_ref().map(|_| ShapeSet::Edges(keep_b)),
            };
            Some(self.compute_local(cell, &ShapeSet::Edges(keep_a), second.as_ref()))
        };

        let id = self.result_variant(&node, &ctx, changed, &children)?;
        if let Some(local) = local {
            self.emit(id, local);
        }
        let exports = Arc::new(Context::new(
            ShapeSet::Edges(export_a),
            ShapeSet::Edges(export_b),
        ));
        self.clustered.insert(key, (id, exports.clone()));
        Ok((id, exports))
    }

    /// Edges of the child subtrees ending or starting at an end point of `pool` that were not
    /// exported into it.
    fn kept_below(
        &mut self,
        layer: &LayerData,
        elements: &Elements,
        pool: &[Edge],
        exported: &[Edge],
    ) -> DeepResult<Vec<Edge>> {
        let mut areas: HashMap<usize, Rect> = HashMap::new();
        for p in pool.iter().flat_map(|e| [e.p1, e.p2]) {
            for i in elements.query(&Rect::new(p, p)) {
                areas.entry(i).or_insert_with(Rect::empty).add_point(p);
            }
        }
        let mut near = ShapeSet::Edges(Vec::new());
        let mut areas: Vec<(usize, Rect)> = areas.into_iter().collect();
        areas.sort_unstable_by_key(|(i, _)| *i);
        for (i, area) in areas {
            let el = &elements.items[i];
            self.collect_subtree(layer, el.node.a, el.disp, &area, &mut near)?;
        }

        let mut exported_count: HashMap<Edge, usize> = HashMap::new();
        for e in exported {
            *exported_count.entry(*e).or_default() += 1;
        }
        let mut hidden = Vec::new();
        for e in near.edges() {
            match exported_count.get_mut(e) {
                Some(n) if *n > 0 => *n -= 1,
                _ => hidden.push(*e),
            }
        }
        Ok(hidden)
    }
}
