use super::{
    error::{DeepError, DeepResult},
    ops::OpKey,
    options::StoreOptions,
    variants::{compact, Placement, VariantId, VariantInfo, VariantKey, VariantTable},
};
use crate::{
    core::{
        math::{Point, Rect},
        trans::ComplexTrans,
        Control,
    },
    geometry::{GeometryKind, Shape, ShapeSet},
    layout::{CellIndex, HierarchyVisitor, LayerIndex, Layout, LayoutId, RecursiveShapeSource},
};
use parking_lot::{Mutex, RwLock};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};
use tracing::{debug, info, trace};

/// Process wide unique identity of a [DeepShapeStore].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreId(u64);

impl StoreId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        StoreId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle of a published deep layer. Only meaningful together with the store that created it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeepLayer {
    store: StoreId,
    index: usize,
}

impl DeepLayer {
    #[inline]
    pub fn store_id(&self) -> StoreId {
        self.store
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Published (immutable) content of a deep layer.
#[derive(Debug)]
pub(crate) struct LayerData {
    pub kind: GeometryKind,
    pub root: VariantId,
    pub shapes: HashMap<VariantId, Arc<ShapeSet>>,
    /// Subtree boxes of every variant reachable from the root (missing means empty).
    pub bboxes: HashMap<VariantId, Rect>,
}

impl LayerData {
    #[inline]
    pub fn shapes_of(&self, v: VariantId) -> Option<&Arc<ShapeSet>> {
        self.shapes.get(&v)
    }

    #[inline]
    pub fn bbox_of(&self, v: VariantId) -> Rect {
        self.bboxes.get(&v).copied().unwrap_or_default()
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.values().map(|s| s.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SourceKey {
    layout: LayoutId,
    top: CellIndex,
    layer: LayerIndex,
    region: Option<Rect>,
    kind: GeometryKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct OpCacheKey {
    pub op: OpKey,
    pub a: usize,
    pub b: Option<usize>,
}

#[derive(Debug)]
enum PublishKey {
    Delivery(SourceKey),
    Operation(OpCacheKey),
    Flat,
}

#[derive(Debug, Default)]
struct LayerTable {
    layers: Vec<Arc<LayerData>>,
    deliveries: HashMap<SourceKey, usize>,
    operations: HashMap<OpCacheKey, usize>,
    working_set: usize,
}

/// Counters describing the work done by a store.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub variants: usize,
    pub layers: usize,
    pub working_set: usize,
    pub kernel_invocations: u64,
}

/// Arena owning the variant hierarchy and every deep layer built on it.
///
/// All requests take `&self`; the store is `Send + Sync` so independent requests may run on
/// different threads. Registration of variants and publication of layers are serialized by
/// write locks, published data is immutable and shared through `Arc`s.
///
/// After [teardown](DeepShapeStore::teardown) every request fails with
/// [DeepError::InvalidHandle].
#[derive(Debug)]
pub struct DeepShapeStore {
    id: StoreId,
    options: StoreOptions,
    torn_down: AtomicBool,
    variants: RwLock<VariantTable>,
    layers: RwLock<LayerTable>,
    evaluations: AtomicU64,
    kernel_invocations: AtomicU64,
    local_computations: Mutex<HashMap<CellIndex, u64>>,
}

impl Default for DeepShapeStore {
    fn default() -> Self {
        DeepShapeStore::new()
    }
}

impl DeepShapeStore {
    pub fn new() -> Self {
        DeepShapeStore::with_options(StoreOptions::default())
    }

    pub fn with_options(options: StoreOptions) -> Self {
        DeepShapeStore {
            id: StoreId::next(),
            options,
            torn_down: AtomicBool::new(false),
            variants: RwLock::new(VariantTable::new()),
            layers: RwLock::new(LayerTable::default()),
            evaluations: AtomicU64::new(0),
            kernel_invocations: AtomicU64::new(0),
            local_computations: Mutex::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn id(&self) -> StoreId {
        self.id
    }

    #[inline]
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Drops every variant and layer. Any later request (including ones with handles obtained
    /// before) fails with [DeepError::InvalidHandle].
    pub fn teardown(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
        let mut layers = self.layers.write();
        let mut variants = self.variants.write();
        info!(
            store = self.id.0,
            layers = layers.layers.len(),
            variants = variants.len(),
            "tearing down deep shape store"
        );
        *layers = LayerTable::default();
        *variants = VariantTable::new();
        self.local_computations.lock().clear();
    }

    #[inline]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    pub(crate) fn ensure_alive(&self) -> DeepResult<()> {
        if self.is_torn_down() {
            Err(DeepError::InvalidHandle(
                "the deep shape store has been torn down".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn handle(&self, index: usize) -> DeepLayer {
        DeepLayer {
            store: self.id,
            index,
        }
    }

    pub(crate) fn layer_data(&self, layer: DeepLayer) -> DeepResult<Arc<LayerData>> {
        self.ensure_alive()?;
        if layer.store != self.id {
            return Err(DeepError::InvalidHandle(format!(
                "layer {} belongs to another store",
                layer.index
            )));
        }
        self.layers
            .read()
            .layers
            .get(layer.index)
            .cloned()
            .ok_or_else(|| DeepError::InvalidHandle(format!("unknown layer {}", layer.index)))
    }

    pub(crate) fn variant(&self, id: VariantId) -> DeepResult<Arc<VariantInfo>> {
        self.variants
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| DeepError::InvalidHandle(format!("unknown variant {id}")))
    }

    pub(crate) fn base_of(&self, id: VariantId) -> DeepResult<VariantId> {
        self.variant(id).map(|v| v.base)
    }

    /// Resolves a variant key, registering the variant if it is new. Placements are `None` for
    /// base variants whose subtree is still being delivered.
    pub(crate) fn resolve(
        &self,
        key: VariantKey,
        cell: CellIndex,
        name: &Arc<str>,
        placements: Option<Vec<Placement>>,
    ) -> DeepResult<VariantId> {
        if let Some(id) = self.variants.read().lookup(&key) {
            return Ok(id);
        }
        self.ensure_alive()?;
        let mut table = self.variants.write();
        if let Some(id) = table.lookup(&key) {
            return Ok(id);
        }
        if table.len() >= self.options.max_variants {
            return Err(DeepError::ResourceExhausted(format!(
                "variant limit of {} reached",
                self.options.max_variants
            )));
        }
        let (id, _) = table.resolve(key, cell, name.clone(), placements);
        trace!(variant = id, cell, "registered variant");
        Ok(id)
    }

    fn complete_variant(&self, id: VariantId, placements: Vec<Placement>) {
        self.variants.write().complete(id, placements);
    }

    pub(crate) fn next_evaluation(&self) -> u64 {
        self.evaluations.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn record_local(&self, cell: CellIndex) {
        self.kernel_invocations.fetch_add(1, Ordering::Relaxed);
        *self.local_computations.lock().entry(cell).or_default() += 1;
    }

    /// Number of local kernel computations performed for variants of `cell` (over all layouts
    /// delivered into this store).
    pub fn local_computations(&self, cell: CellIndex) -> u64 {
        self.local_computations
            .lock()
            .get(&cell)
            .copied()
            .unwrap_or(0)
    }

    pub fn stats(&self) -> StoreStats {
        let layers = self.layers.read();
        StoreStats {
            variants: self.variants.read().len(),
            layers: layers.layers.len(),
            working_set: layers.working_set,
            kernel_invocations: self.kernel_invocations.load(Ordering::Relaxed),
        }
    }

    pub fn kind(&self, layer: DeepLayer) -> DeepResult<GeometryKind> {
        self.layer_data(layer).map(|d| d.kind)
    }

    /// Builds the subtree boxes of a layer and wraps everything for publication.
    pub(crate) fn make_layer(
        &self,
        kind: GeometryKind,
        root: VariantId,
        shapes: HashMap<VariantId, Arc<ShapeSet>>,
    ) -> DeepResult<LayerData> {
        let mut bboxes = HashMap::new();
        {
            let table = self.variants.read();
            subtree_bbox(&table, &shapes, root, &mut bboxes)?;
        }
        Ok(LayerData {
            kind,
            root,
            shapes,
            bboxes,
        })
    }

    fn publish(&self, data: LayerData, key: PublishKey) -> DeepResult<DeepLayer> {
        let mut table = self.layers.write();
        self.ensure_alive()?;
        let existing = match &key {
            PublishKey::Delivery(k) => table.deliveries.get(k).copied(),
            PublishKey::Operation(k) => table.operations.get(k).copied(),
            PublishKey::Flat => None,
        };
        if let Some(index) = existing {
            return Ok(self.handle(index));
        }
        let count = data.shape_count();
        if table.working_set + count > self.options.max_working_set {
            return Err(DeepError::ResourceExhausted(format!(
                "working set limit of {} shapes exceeded ({} stored, {} new)",
                self.options.max_working_set, table.working_set, count
            )));
        }
        let index = table.layers.len();
        table.layers.push(Arc::new(data));
        table.working_set += count;
        match key {
            PublishKey::Delivery(k) => {
                table.deliveries.insert(k, index);
            }
            PublishKey::Operation(k) => {
                table.operations.insert(k, index);
            }
            PublishKey::Flat => {}
        }
        Ok(self.handle(index))
    }

    pub(crate) fn cached_operation(&self, key: &OpCacheKey) -> Option<DeepLayer> {
        let index = self.layers.read().operations.get(key).copied()?;
        Some(self.handle(index))
    }

    pub(crate) fn publish_operation(&self, data: LayerData, key: OpCacheKey) -> DeepResult<DeepLayer> {
        self.publish(data, PublishKey::Operation(key))
    }

    /// Distributes the shapes of `source` over the variants of its hierarchy.
    ///
    /// Delivering an equal source (same layout, top cell, layer, area of interest and kind) again
    /// returns the existing layer. A layer the layout does not have yields an empty layer.
    pub fn deliver(
        &self,
        source: &RecursiveShapeSource<'_>,
        kind: GeometryKind,
    ) -> DeepResult<DeepLayer> {
        self.ensure_alive()?;
        let key = SourceKey {
            layout: source.layout().id(),
            top: source.top(),
            layer: source.layer(),
            region: source.region().copied(),
            kind,
        };
        if let Some(&index) = self.layers.read().deliveries.get(&key) {
            trace!(top = key.top, layer = key.layer, "delivery cache hit");
            return Ok(self.handle(index));
        }

        let mut builder = DeliveryBuilder::new(self, source.layout(), kind);
        source.visit(&mut builder);
        let (root, shapes) = builder.finish()?;
        let data = self.make_layer(kind, root, shapes)?;
        debug!(
            top = key.top,
            layer = key.layer,
            variants = data.bboxes.len(),
            shapes = data.shape_count(),
            "delivered deep layer"
        );
        self.publish(data, PublishKey::Delivery(key))
    }

    /// Attaches a flat shape set (root coordinates) to the root of `like`, so flat operands can be
    /// combined with deep layers of the same hierarchy.
    pub fn deliver_flat(&self, like: DeepLayer, shapes: ShapeSet) -> DeepResult<DeepLayer> {
        let like = self.layer_data(like)?;
        let kind = shapes.kind();
        let mut map = HashMap::new();
        if !shapes.is_empty() {
            map.insert(like.root, Arc::new(shapes.sorted()));
        }
        let data = self.make_layer(kind, like.root, map)?;
        self.publish(data, PublishKey::Flat)
    }
}

fn subtree_bbox(
    table: &VariantTable,
    shapes: &HashMap<VariantId, Arc<ShapeSet>>,
    v: VariantId,
    memo: &mut HashMap<VariantId, Rect>,
) -> DeepResult<Rect> {
    if let Some(r) = memo.get(&v) {
        return Ok(*r);
    }
    let info = table
        .get(v)
        .ok_or_else(|| DeepError::InvalidHandle(format!("unknown variant {v}")))?;
    let mut bbox = shapes.get(&v).map(|s| s.bbox()).unwrap_or_default();
    for p in &info.placements {
        let child = subtree_bbox(table, shapes, p.child, memo)?;
        bbox = bbox.union(&p.bbox(&child));
    }
    memo.insert(v, bbox);
    Ok(bbox)
}

struct Frame {
    variant: VariantId,
    int_disp: Point,
    elements: Vec<(VariantId, Point)>,
    shapes: ShapeSet,
}

/// Visitor building one deep layer: every occurrence is resolved to its base variant, already
/// built variants are skipped.
struct DeliveryBuilder<'s, 'l> {
    store: &'s DeepShapeStore,
    layout: &'l Layout,
    kind: GeometryKind,
    names: HashMap<CellIndex, Arc<str>>,
    stack: Vec<Frame>,
    visited: HashSet<VariantId>,
    shapes: HashMap<VariantId, Arc<ShapeSet>>,
    root: Option<VariantId>,
    error: Option<DeepError>,
}

impl<'s, 'l> DeliveryBuilder<'s, 'l> {
    fn new(store: &'s DeepShapeStore, layout: &'l Layout, kind: GeometryKind) -> Self {
        DeliveryBuilder {
            store,
            layout,
            kind,
            names: HashMap::new(),
            stack: Vec::new(),
            visited: HashSet::new(),
            shapes: HashMap::new(),
            root: None,
            error: None,
        }
    }

    fn finish(self) -> DeepResult<(VariantId, HashMap<VariantId, Arc<ShapeSet>>)> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let root = self
            .root
            .ok_or_else(|| DeepError::InvalidOperand("the source yielded no top cell".to_string()))?;
        Ok((root, self.shapes))
    }
}

impl HierarchyVisitor for DeliveryBuilder<'_, '_> {
    fn enter_cell(&mut self, cell: CellIndex, trans: &ComplexTrans, clip: Option<&Rect>) -> Control {
        if self.error.is_some() {
            return Control::Break(());
        }
        let layout = self.layout;
        let name = self
            .names
            .entry(cell)
            .or_insert_with(|| Arc::from(layout.cell(cell).name()))
            .clone();
        let key = VariantKey::base(layout.id(), cell, trans, clip);
        let id = match self.store.resolve(key, cell, &name, None) {
            Ok(id) => id,
            Err(e) => {
                self.error = Some(e);
                return Control::Break(());
            }
        };

        let int_disp = trans.int_disp();
        match self.stack.last_mut() {
            Some(parent) => parent.elements.push((id, int_disp - parent.int_disp)),
            None => self.root = Some(id),
        }
        if !self.visited.insert(id) {
            return Control::Break(());
        }
        self.stack.push(Frame {
            variant: id,
            int_disp,
            elements: Vec::new(),
            shapes: ShapeSet::empty(self.kind),
        });
        Control::Continue
    }

    fn shape(&mut self, shape: &Shape, trans: &ComplexTrans) {
        if let Some(frame) = self.stack.last_mut() {
            frame.shapes.push_shape(&shape.transformed(&trans.residual()));
        }
    }

    fn leave_cell(&mut self, _: CellIndex, _: &ComplexTrans) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        self.store
            .complete_variant(frame.variant, compact(&frame.elements));
        if !frame.shapes.is_empty() {
            self.shapes
                .insert(frame.variant, Arc::new(frame.shapes.sorted()));
        }
    }
}
