use super::Evaluation;
use crate::{
    core::math::{Coord, Point, Rect},
    deep::{
        error::{DeepError, DeepResult},
        store::LayerData,
        variants::{compact, expand, VariantId, VariantKey},
    },
    geometry::ShapeSet,
};
use static_aabb2d_index::{StaticAABB2DIndex, StaticAABB2DIndexBuilder};

/// Below this many placed elements a linear scan beats building an index.
const LINEAR_SCAN_LIMIT: usize = 16;

/// A variant occurrence of the evaluation: the variants of both operands at one place of the
/// hierarchy and the aligned variant representing the pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Node {
    pub id: VariantId,
    pub a: VariantId,
    pub b: Option<VariantId>,
}

/// Child element of a node, with the subtree boxes of both operands in the node's coordinates.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Element {
    pub node: Node,
    pub disp: Point,
    pub bbox_a: Rect,
    pub bbox_b: Rect,
}

impl Element {
    #[inline]
    pub fn bbox(&self) -> Rect {
        self.bbox_a.union(&self.bbox_b)
    }
}

/// Expanded children of a node with a spatial index over their boxes.
pub(crate) struct Elements {
    pub items: Vec<Element>,
    slots: Vec<usize>,
    index: Option<StaticAABB2DIndex<Coord>>,
}

impl Elements {
    fn new(items: Vec<Element>) -> Self {
        let slots: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.bbox().is_empty())
            .map(|(i, _)| i)
            .collect();
        let index = if slots.len() > LINEAR_SCAN_LIMIT {
            let mut builder = StaticAABB2DIndexBuilder::new(slots.len());
            for &i in &slots {
                let r = items[i].bbox();
                builder.add(r.min.x, r.min.y, r.max.x, r.max.y);
            }
            // falls back to scanning if the index cannot be built
            builder.build().ok()
        } else {
            None
        };
        Elements {
            items,
            slots,
            index,
        }
    }

    /// Indexes of the elements whose box touches `area`, ascending.
    pub fn query(&self, area: &Rect) -> Vec<usize> {
        if area.is_empty() {
            return Vec::new();
        }
        let mut found: Vec<usize> = match &self.index {
            Some(index) => index
                .query(area.min.x, area.min.y, area.max.x, area.max.y)
                .into_iter()
                .map(|k| self.slots[k])
                .collect(),
            None => self
                .slots
                .iter()
                .copied()
                .filter(|&i| self.items[i].bbox().touches(area))
                .collect(),
        };
        found.sort_unstable();
        found
    }
}

impl Evaluation<'_> {
    /// Common refinement of variant `a` (first operand) and `b` (second operand).
    pub(super) fn aligned(&mut self, a: VariantId, b: VariantId) -> DeepResult<VariantId> {
        if a == b {
            return Ok(a);
        }
        if let Some(&id) = self.aligned.get(&(a, b)) {
            return Ok(id);
        }
        let ia = self.info(a)?;
        let ib = self.info(b)?;
        if ia.base != ib.base {
            return Err(DeepError::InvalidOperand(format!(
                "operands are built on different hierarchies ({} vs. {})",
                ia.name, ib.name
            )));
        }
        let ea = expand(&ia.placements);
        let eb = expand(&ib.placements);
        if ea.len() != eb.len() {
            return Err(misaligned(&ia.name));
        }
        let mut children = Vec::with_capacity(ea.len());
        for (&(ca, da), &(cb, db)) in ea.iter().zip(&eb) {
            if da != db {
                return Err(misaligned(&ia.name));
            }
            children.push((self.aligned(ca, cb)?, da));
        }
        let id = self.store.resolve(
            VariantKey::Aligned(a, b),
            ia.cell,
            &ia.name,
            Some(compact(&children)),
        )?;
        self.aligned.insert((a, b), id);
        Ok(id)
    }

    /// Expands the children of `node`, aligning the operands element by element.
    pub(super) fn elements(&mut self, node: &Node) -> DeepResult<Elements> {
        let ia = self.info(node.a)?;
        let ea = expand(&ia.placements);
        let eb = match node.b {
            Some(b) => {
                let eb = expand(&self.info(b)?.placements);
                if eb.len() != ea.len() {
                    return Err(misaligned(&ia.name));
                }
                Some(eb)
            }
            None => None,
        };

        let mut items = Vec::with_capacity(ea.len());
        for (i, &(ca, disp)) in ea.iter().enumerate() {
            let cb = match &eb {
                Some(eb) => {
                    let (cb, db) = eb[i];
                    if db != disp {
                        return Err(misaligned(&ia.name));
                    }
                    Some(cb)
                }
                None => None,
            };
            let id = match cb {
                Some(cb) => self.aligned(ca, cb)?,
                None => ca,
            };
            let bbox_a = self.a.bbox_of(ca).moved(disp);
            let bbox_b = match (&self.b, cb) {
                (Some(b), Some(cb)) => b.bbox_of(cb).moved(disp),
                _ => Rect::empty(),
            };
            items.push(Element {
                node: Node { id, a: ca, b: cb },
                disp,
                bbox_a,
                bbox_b,
            });
        }
        Ok(Elements::new(items))
    }

    /// Appends the shapes of the subtree of `v` in `layer`, displaced by `offset`, whose boxes
    /// touch `filter`.
    pub(super) fn collect_subtree(
        &mut self,
        layer: &LayerData,
        v: VariantId,
        offset: Point,
        filter: &Rect,
        out: &mut ShapeSet,
    ) -> DeepResult<()> {
        if !layer.bbox_of(v).moved(offset).touches(filter) {
            return Ok(());
        }
        if let Some(shapes) = layer.shapes_of(v) {
            out.extend_moved(shapes, offset, Some(filter));
        }
        let info = self.info(v)?;
        for p in &info.placements {
            if !p.bbox(&layer.bbox_of(p.child)).moved(offset).touches(filter) {
                continue;
            }
            for d in p.offsets() {
                self.collect_subtree(layer, p.child, offset + d, filter, out)?;
            }
        }
        Ok(())
    }
}

fn misaligned(name: &str) -> DeepError {
    DeepError::InvalidOperand(format!("placements of the operands differ in cell {name}"))
}
