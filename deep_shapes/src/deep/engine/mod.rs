//! Hierarchical operation engine.
//!
//! Operators are evaluated bottom-up over the variant hierarchy of their operands, in one of three
//! ways picked by the dispatch table in [ops](crate::deep::ops):
//!
//! * per variant: local results only depend on local shapes, the result reuses the input
//!   hierarchy as is,
//! * masked: every primary shape is evaluated where it lives against the shapes of the second
//!   operand touching it (which may come from the parent, siblings or further out),
//! * clustered: connected groups of shapes are evaluated at the lowest occurrence containing all
//!   of their members, groups reaching into the neighborhood are passed up as raw input. Joined
//!   extension groups edges by unique continuations only, so abutting cells with branching
//!   corners still evaluate where they live.
//!
//! Occurrences of a variant seeing different neighborhoods become specialized variants, equal
//! neighborhoods share one evaluation. Binary operands are aligned to the common refinement of
//! their hierarchies first.
mod clustered;
mod masked;
mod per_variant;
mod space;

use super::{
    error::{DeepError, DeepResult},
    ops::{Operator, Plan, Strategy},
    store::{DeepLayer, DeepShapeStore, LayerData, OpCacheKey},
    variants::{compact, Context, VariantId, VariantInfo, VariantKey},
};
use crate::{
    core::math::{Coord, Point},
    geometry::{GeometryKind, ShapeSet},
    kernel::{BooleanOp, EdgeFilter, Extension, SegmentMode, SegmentSpec},
    layout::CellIndex,
};
use space::Node;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, trace};

/// State of one operator evaluation.
pub(crate) struct Evaluation<'s> {
    store: &'s DeepShapeStore,
    op: Operator,
    plan: Plan,
    a: Arc<LayerData>,
    b: Option<Arc<LayerData>>,
    /// Unique per evaluation, keeps specialized variants of different evaluations apart.
    evaluation: u64,
    infos: HashMap<VariantId, Arc<VariantInfo>>,
    aligned: HashMap<(VariantId, VariantId), VariantId>,
    masked: HashMap<(VariantId, Arc<Context>), VariantId>,
    clustered: HashMap<(VariantId, Arc<Context>), (VariantId, Arc<Context>)>,
    out: HashMap<VariantId, Arc<ShapeSet>>,
}

impl<'s> Evaluation<'s> {
    fn new(
        store: &'s DeepShapeStore,
        op: Operator,
        plan: Plan,
        a: Arc<LayerData>,
        b: Option<Arc<LayerData>>,
    ) -> Self {
        Evaluation {
            store,
            op,
            plan,
            a,
            b,
            evaluation: store.next_evaluation(),
            infos: HashMap::new(),
            aligned: HashMap::new(),
            masked: HashMap::new(),
            clustered: HashMap::new(),
            out: HashMap::new(),
        }
    }

    fn info(&mut self, v: VariantId) -> DeepResult<Arc<VariantInfo>> {
        if let Some(info) = self.infos.get(&v) {
            return Ok(info.clone());
        }
        let info = self.store.variant(v)?;
        self.infos.insert(v, info.clone());
        Ok(info)
    }

    fn b_kind(&self) -> GeometryKind {
        self.b.as_ref().map_or(GeometryKind::Edges, |b| b.kind)
    }

    /// Runs the evaluation, returning the root variant of the result.
    fn run(&mut self) -> DeepResult<VariantId> {
        let root_a = self.a.root;
        let root = match self.b.as_ref().map(|b| b.root) {
            Some(root_b) => Node {
                id: self.aligned(root_a, root_b)?,
                a: root_a,
                b: Some(root_b),
            },
            None => Node {
                id: root_a,
                a: root_a,
                b: None,
            },
        };
        match self.plan.strategy {
            Strategy::PerVariant => self.per_variant(),
            Strategy::Masked => {
                let ctx = Context::new(ShapeSet::Edges(Vec::new()), ShapeSet::empty(self.b_kind()));
                self.masked(root, Arc::new(ctx))
            }
            Strategy::Clustered { rule } => {
                let ctx = Context::new(ShapeSet::Edges(Vec::new()), ShapeSet::Edges(Vec::new()));
                self.clustered(root, Arc::new(ctx), rule).map(|(id, _)| id)
            }
        }
    }

    /// Local kernel call for one variant of `cell`.
    fn compute_local(&self, cell: CellIndex, a: &ShapeSet, b: Option<&ShapeSet>) -> ShapeSet {
        self.store.record_local(cell);
        self.op.compute(a, b).sorted()
    }

    fn emit(&mut self, v: VariantId, shapes: ShapeSet) {
        if !shapes.is_empty() {
            self.out.insert(v, Arc::new(shapes));
        }
    }

    /// Variant holding the result of `node` evaluated against `ctx`: the node itself if nothing
    /// outside of it was seen and all children kept their variants, a specialized variant
    /// otherwise.
    fn result_variant(
        &mut self,
        node: &Node,
        ctx: &Arc<Context>,
        changed: bool,
        children: &[(VariantId, Point)],
    ) -> DeepResult<VariantId> {
        if ctx.is_empty() && !changed {
            return Ok(node.id);
        }
        let info = self.info(node.a)?;
        self.store.resolve(
            VariantKey::Specialized {
                of: node.id,
                evaluation: self.evaluation,
                context: ctx.clone(),
            },
            info.cell,
            &info.name,
            Some(compact(children)),
        )
    }
}

impl DeepShapeStore {
    /// Evaluates `op` on deep layers of this store. `b` is required for binary operators and must
    /// be built on the same hierarchy (same top cell and area of interest) as `a`.
    ///
    /// Equal requests are answered from the operation cache.
    pub fn evaluate(
        &self,
        op: &Operator,
        a: DeepLayer,
        b: Option<DeepLayer>,
    ) -> DeepResult<DeepLayer> {
        if let Some(b) = b {
            if b.store_id() != a.store_id() {
                return Err(DeepError::InvalidOperand(format!(
                    "{} operands belong to different stores",
                    op.name()
                )));
            }
        }
        let data_a = self.layer_data(a)?;
        let data_b = b.map(|b| self.layer_data(b)).transpose()?;
        if op.is_binary() != data_b.is_some() {
            return Err(DeepError::InvalidOperand(format!(
                "{} takes {} operand(s)",
                op.name(),
                if op.is_binary() { 2 } else { 1 }
            )));
        }
        op.validate()?;
        let plan = op.plan(data_a.kind, data_b.as_ref().map(|d| d.kind))?;

        let key = OpCacheKey {
            op: op.key(),
            a: a.index(),
            b: b.map(|b| b.index()),
        };
        if let Some(layer) = self.cached_operation(&key) {
            trace!(op = op.name(), "operation cache hit");
            return Ok(layer);
        }
        if let Some(db) = &data_b {
            if self.base_of(data_a.root)? != self.base_of(db.root)? {
                return Err(DeepError::InvalidOperand(format!(
                    "{} operands are built on different hierarchies",
                    op.name()
                )));
            }
        }

        let mut evaluation = Evaluation::new(self, *op, plan, data_a, data_b);
        let root = evaluation.run()?;
        let data = self.make_layer(plan.output, root, evaluation.out)?;
        debug!(
            op = op.name(),
            variants = data.shapes.len(),
            shapes = data.shape_count(),
            "evaluated deep operation"
        );
        self.publish_operation(data, key)
    }

    /// Merges overlapping and touching collinear edges.
    pub fn merged(&self, edges: DeepLayer) -> DeepResult<DeepLayer> {
        self.evaluate(&Operator::Merge, edges, None)
    }

    /// Boolean of an edge layer with an edge layer, or with a polygon layer for
    /// [And](BooleanOp::And) (inside part) and [Not](BooleanOp::Not) (outside part).
    pub fn boolean(&self, a: DeepLayer, b: DeepLayer, op: BooleanOp) -> DeepResult<DeepLayer> {
        self.evaluate(&Operator::Boolean(op), a, Some(b))
    }

    pub fn inside_part(&self, edges: DeepLayer, polygons: DeepLayer) -> DeepResult<DeepLayer> {
        self.evaluate(&Operator::InsidePart, edges, Some(polygons))
    }

    pub fn outside_part(&self, edges: DeepLayer, polygons: DeepLayer) -> DeepResult<DeepLayer> {
        self.evaluate(&Operator::OutsidePart, edges, Some(polygons))
    }

    /// Edges selected by a length or orientation filter.
    pub fn filtered(
        &self,
        edges: DeepLayer,
        filter: impl Into<EdgeFilter>,
    ) -> DeepResult<DeepLayer> {
        self.evaluate(&Operator::Filter(filter.into()), edges, None)
    }

    /// Edges turned into polygons, see [Extension].
    pub fn extended(&self, edges: DeepLayer, extension: Extension) -> DeepResult<DeepLayer> {
        self.evaluate(&Operator::Extended(extension), edges, None)
    }

    pub fn start_segments(
        &self,
        edges: DeepLayer,
        length: Coord,
        fraction: f64,
    ) -> DeepResult<DeepLayer> {
        let op = Operator::Segments(SegmentMode::Start, SegmentSpec::new(length, fraction));
        self.evaluate(&op, edges, None)
    }

    pub fn end_segments(
        &self,
        edges: DeepLayer,
        length: Coord,
        fraction: f64,
    ) -> DeepResult<DeepLayer> {
        let op = Operator::Segments(SegmentMode::End, SegmentSpec::new(length, fraction));
        self.evaluate(&op, edges, None)
    }

    pub fn centers(&self, edges: DeepLayer, length: Coord, fraction: f64) -> DeepResult<DeepLayer> {
        let op = Operator::Segments(SegmentMode::Center, SegmentSpec::new(length, fraction));
        self.evaluate(&op, edges, None)
    }

    /// Edges sharing a point with an edge of `other` or touching a polygon of `other`.
    pub fn selected_interacting(&self, edges: DeepLayer, other: DeepLayer) -> DeepResult<DeepLayer> {
        self.evaluate(&Operator::Interacting { inverse: false }, edges, Some(other))
    }

    pub fn selected_not_interacting(
        &self,
        edges: DeepLayer,
        other: DeepLayer,
    ) -> DeepResult<DeepLayer> {
        self.evaluate(&Operator::Interacting { inverse: true }, edges, Some(other))
    }

    /// Contour edges of a polygon layer.
    pub fn polygon_edges(&self, polygons: DeepLayer) -> DeepResult<DeepLayer> {
        self.evaluate(&Operator::PolygonEdges, polygons, None)
    }
}
