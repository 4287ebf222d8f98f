//! Source hierarchy: cells holding shapes per layer and instances of other cells.
mod shape_source;

pub use shape_source::{HierarchyVisitor, RecursiveShapeSource};

use crate::{
    core::{
        math::{Point, Rect},
        trans::{ComplexTrans, Trans},
    },
    geometry::Shape,
};
use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
};

pub type CellIndex = usize;
pub type LayerIndex = usize;

/// Process wide unique identity of a [Layout], used to key deliveries and variants.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayoutId(u64);

impl LayoutId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        LayoutId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Layer/datatype pair naming a layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerInfo {
    pub layer: u32,
    pub datatype: u32,
}

impl LayerInfo {
    pub fn new(layer: u32, datatype: u32) -> Self {
        LayerInfo { layer, datatype }
    }
}

/// Regular array repetition: element `(i, j)` is displaced by `i * a + j * b`, `i < na`, `j < nb`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrayRepetition {
    pub a: Point,
    pub b: Point,
    pub na: u32,
    pub nb: u32,
}

impl ArrayRepetition {
    pub fn new(a: Point, na: u32, b: Point, nb: u32) -> Self {
        ArrayRepetition { a, b, na, nb }
    }

    pub fn len(&self) -> usize {
        self.na as usize * self.nb as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element displacements, rows (`j`) outer and columns (`i`) inner.
    pub fn offsets(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.nb as i64).flat_map(move |j| {
            (0..self.na as i64).map(move |i| self.a.scale(i) + self.b.scale(j))
        })
    }

    /// Displacements of the corner elements (enough to bound the whole array).
    pub fn corner_offsets(&self) -> [Point; 4] {
        let i = (self.na.max(1) - 1) as i64;
        let j = (self.nb.max(1) - 1) as i64;
        [
            Point::new(0, 0),
            self.a.scale(i),
            self.b.scale(j),
            self.a.scale(i) + self.b.scale(j),
        ]
    }
}

/// Placement of a cell inside another one, optionally repeated as a regular array.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instance {
    pub cell: CellIndex,
    pub trans: Trans,
    pub array: Option<ArrayRepetition>,
}

impl Instance {
    pub fn new(cell: CellIndex, trans: Trans) -> Self {
        Instance {
            cell,
            trans,
            array: None,
        }
    }

    pub fn array(cell: CellIndex, trans: Trans, array: ArrayRepetition) -> Self {
        Instance {
            cell,
            trans,
            array: Some(array),
        }
    }

    /// Transformation of every placed element, in element order.
    pub fn element_transforms(&self) -> Vec<ComplexTrans> {
        let base = ComplexTrans::from(&self.trans);
        match &self.array {
            None => vec![base],
            Some(arr) => arr
                .offsets()
                .map(|o| ComplexTrans {
                    dx: base.dx + o.x as f64,
                    dy: base.dy + o.y as f64,
                    ..base
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cell {
    name: String,
    shapes: BTreeMap<LayerIndex, Vec<Shape>>,
    instances: Vec<Instance>,
}

impl Cell {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shapes(&self, layer: LayerIndex) -> &[Shape] {
        self.shapes.get(&layer).map_or(&[], |v| v.as_slice())
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Box of the cell's own shapes on all layers.
    fn local_bbox(&self) -> Rect {
        self.shapes
            .values()
            .flatten()
            .fold(Rect::empty(), |acc, s| acc.union(&s.bbox()))
    }
}

/// A cell hierarchy. Instances must form a directed acyclic graph.
#[derive(Debug)]
pub struct Layout {
    id: LayoutId,
    cells: Vec<Cell>,
    layers: Vec<LayerInfo>,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::new()
    }
}

impl Layout {
    pub fn new() -> Self {
        Layout {
            id: LayoutId::next(),
            cells: Vec::new(),
            layers: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> LayoutId {
        self.id
    }

    pub fn add_cell(&mut self, name: impl Into<String>) -> CellIndex {
        self.cells.push(Cell {
            name: name.into(),
            ..Default::default()
        });
        self.cells.len() - 1
    }

    #[inline]
    pub fn cell(&self, index: CellIndex) -> &Cell {
        &self.cells[index]
    }

    pub fn cell_by_name(&self, name: &str) -> Option<CellIndex> {
        self.cells.iter().position(|c| c.name == name)
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Index of the layer, registering it if needed.
    pub fn insert_layer(&mut self, info: LayerInfo) -> LayerIndex {
        match self.find_layer(&info) {
            Some(index) => index,
            None => {
                self.layers.push(info);
                self.layers.len() - 1
            }
        }
    }

    pub fn find_layer(&self, info: &LayerInfo) -> Option<LayerIndex> {
        self.layers.iter().position(|l| l == info)
    }

    pub fn layer_info(&self, layer: LayerIndex) -> Option<&LayerInfo> {
        self.layers.get(layer)
    }

    pub fn insert(&mut self, cell: CellIndex, layer: LayerIndex, shape: impl Into<Shape>) {
        self.cells[cell]
            .shapes
            .entry(layer)
            .or_default()
            .push(shape.into());
    }

    pub fn add_instance(&mut self, parent: CellIndex, instance: Instance) {
        debug_assert!(instance.cell < self.cells.len(), "unknown child cell");
        debug_assert!(instance.cell != parent, "cell instantiating itself");
        self.cells[parent].instances.push(instance);
    }

    /// Cells not instantiated by any other cell.
    pub fn top_cells(&self) -> Vec<CellIndex> {
        let mut used = vec![false; self.cells.len()];
        for c in &self.cells {
            for inst in &c.instances {
                used[inst.cell] = true;
            }
        }
        (0..self.cells.len()).filter(|i| !used[*i]).collect()
    }

    /// Bounding boxes of every cell including its subtree, over all layers.
    pub fn cell_bboxes(&self) -> Vec<Rect> {
        let mut memo: Vec<Option<Rect>> = vec![None; self.cells.len()];
        for c in 0..self.cells.len() {
            self.subtree_bbox(c, &mut memo);
        }
        memo.into_iter().map(|r| r.unwrap_or_default()).collect()
    }

    pub fn cell_bbox(&self, cell: CellIndex) -> Rect {
        let mut memo = vec![None; self.cells.len()];
        self.subtree_bbox(cell, &mut memo)
    }

    fn subtree_bbox(&self, cell: CellIndex, memo: &mut Vec<Option<Rect>>) -> Rect {
        if let Some(r) = memo[cell] {
            return r;
        }
        let c = &self.cells[cell];
        let mut bbox = c.local_bbox();
        for inst in &c.instances {
            let child = self.subtree_bbox(inst.cell, memo);
            if child.is_empty() {
                continue;
            }
            let t = ComplexTrans::from(&inst.trans);
            let placed = t.apply_rect(&child);
            match &inst.array {
                None => bbox = bbox.union(&placed),
                Some(arr) => {
                    for o in arr.corner_offsets() {
                        bbox = bbox.union(&placed.moved(o));
                    }
                }
            }
        }
        memo[cell] = Some(bbox);
        bbox
    }
}
