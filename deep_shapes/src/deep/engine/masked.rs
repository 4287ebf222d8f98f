use super::{
    space::{Elements, Node},
    Evaluation,
};
use crate::{
    core::math::{Point, Rect},
    deep::{
        error::{DeepError, DeepResult},
        store::LayerData,
        variants::{Context, VariantId},
    },
    geometry::ShapeSet,
};
use num_traits::Zero;
use std::sync::Arc;

impl Evaluation<'_> {
    /// Evaluates `node` against the mask shapes `ctx` (node coordinates) lying outside of its
    /// subtree.
    pub(super) fn masked(&mut self, node: Node, ctx: Arc<Context>) -> DeepResult<VariantId> {
        let key = (node.id, ctx.clone());
        if let Some(&id) = self.masked.get(&key) {
            return Ok(id);
        }

        let mask_layer = self
            .b
            .clone()
            .ok_or_else(|| DeepError::InvalidOperand("missing mask operand".to_string()))?;
        let elements = self.elements(&node)?;
        let mask_locals = node.b.and_then(|v| mask_layer.shapes_of(v).cloned());

        let mut children = Vec::with_capacity(elements.items.len());
        let mut changed = false;
        for (i, el) in elements.items.iter().enumerate() {
            if el.bbox_a.is_empty() {
                children.push((el.node.id, el.disp));
                continue;
            }
            let mask = self.mask_around(
                &elements,
                Some(i),
                &el.bbox_a,
                mask_locals.as_deref(),
                &ctx.secondary,
                &mask_layer,
            )?;
            let child_ctx = Context::new(ShapeSet::Edges(Vec::new()), mask.moved(-el.disp)).sorted();
            let id = self.masked(el.node, Arc::new(child_ctx))?;
            changed |= id != el.node.id;
            children.push((id, el.disp));
        }

        let local = match self.a.shapes_of(node.a).cloned() {
            Some(shapes) => {
                let mask = self.mask_around(
                    &elements,
                    None,
                    &shapes.bbox(),
                    mask_locals.as_deref(),
                    &ctx.secondary,
                    &mask_layer,
                )?;
                let cell = self.info(node.a)?.cell;
                Some(self.compute_local(cell, &shapes, Some(&mask)))
            }
            None => None,
        };

        let id = self.result_variant(&node, &ctx, changed, &children)?;
        if let Some(local) = local {
            self.emit(id, local);
        }
        self.masked.insert(key, id);
        Ok(id)
    }

    /// Mask shapes touching `area`: the node's own, the ones inherited from outside the node and
    /// those of the child subtrees (except `skip`).
    fn mask_around(
        &mut self,
        elements: &Elements,
        skip: Option<usize>,
        area: &Rect,
        locals: Option<&ShapeSet>,
        outer: &ShapeSet,
        layer: &LayerData,
    ) -> DeepResult<ShapeSet> {
        let mut mask = ShapeSet::empty(layer.kind);
        if area.is_empty() {
            return Ok(mask);
        }
        if let Some(locals) = locals {
            mask.extend_moved(locals, Point::zero(), Some(area));
        }
        mask.extend_moved(outer, Point::zero(), Some(area));
        for j in elements.query(area) {
            if Some(j) == skip {
                continue;
            }
            let el = &elements.items[j];
            if let Some(v) = el.node.b {
                self.collect_subtree(layer, v, el.disp, area, &mut mask)?;
            }
        }
        Ok(mask)
    }
}
