//! Expanding deep layers back into shapes: flat shape sets or cells of a target layout.
use super::{
    error::{DeepError, DeepResult},
    store::{DeepLayer, DeepShapeStore, LayerData},
    variants::{VariantId, VariantInfo},
};
use crate::{
    core::{
        math::{Point, Rect},
        trans::Trans,
    },
    geometry::ShapeSet,
    layout::{ArrayRepetition, CellIndex, Instance, LayerIndex, Layout, LayoutId},
};
use num_traits::Zero;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::debug;

/// Fully expanded content of a deep layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatShapes {
    /// All shapes in root coordinates, sorted.
    pub shapes: ShapeSet,
    pub count: usize,
    pub bbox: Rect,
}

struct Infos<'s> {
    store: &'s DeepShapeStore,
    cache: HashMap<VariantId, Arc<VariantInfo>>,
}

impl Infos<'_> {
    fn get(&mut self, v: VariantId) -> DeepResult<Arc<VariantInfo>> {
        if let Some(info) = self.cache.get(&v) {
            return Ok(info.clone());
        }
        let info = self.store.variant(v)?;
        self.cache.insert(v, info.clone());
        Ok(info)
    }
}

fn flatten_into(
    infos: &mut Infos<'_>,
    data: &LayerData,
    v: VariantId,
    offset: Point,
    out: &mut ShapeSet,
) -> DeepResult<()> {
    if data.bbox_of(v).is_empty() {
        return Ok(());
    }
    if let Some(shapes) = data.shapes_of(v) {
        out.extend_moved(shapes, offset, None);
    }
    let info = infos.get(v)?;
    for p in &info.placements {
        for d in p.offsets() {
            flatten_into(infos, data, p.child, offset + d, out)?;
        }
    }
    Ok(())
}

impl DeepShapeStore {
    /// Expands `layer` into absolute coordinates.
    pub fn flatten(&self, layer: DeepLayer) -> DeepResult<FlatShapes> {
        let data = self.layer_data(layer)?;
        let mut infos = Infos {
            store: self,
            cache: HashMap::new(),
        };
        let mut shapes = ShapeSet::empty(data.kind);
        flatten_into(&mut infos, &data, data.root, Point::zero(), &mut shapes)?;
        shapes.sort();
        Ok(FlatShapes {
            count: shapes.len(),
            bbox: shapes.bbox(),
            shapes,
        })
    }

    /// Inserts `layer` into `target_cell` of `layout` keeping the hierarchy, see
    /// [Materializer::insert].
    pub fn materialize(
        &self,
        layer: DeepLayer,
        layout: &mut Layout,
        target_cell: CellIndex,
        target_layer: LayerIndex,
    ) -> DeepResult<()> {
        Materializer::new(self).insert(layer, layout, target_cell, target_layer)
    }
}

type InstanceKey = (LayoutId, CellIndex, CellIndex, Point, Option<ArrayRepetition>);

/// Writes deep layers into target layouts.
///
/// Every variant with geometry in its subtree becomes one cell of the target layout and every
/// placement one instance (arrays stay arrays), so repeated structure stays shared. Cells and
/// instances are reused when several layers are inserted through the same materializer.
///
/// # Examples
///
/// ```
/// # use deep_shapes::deep::*;
/// # use deep_shapes::layout::*;
/// # use deep_shapes::geometry::*;
/// # use deep_shapes::core::{math::point, trans::Trans};
/// let mut source = Layout::new();
/// let l1 = source.insert_layer(LayerInfo::new(1, 0));
/// let top = source.add_cell("TOP");
/// let a = source.add_cell("A");
/// source.insert(a, l1, Edge::from_coords(0, 0, 10, 0));
/// source.add_instance(top, Instance::new(a, Trans::translation(point(100, 0))));
///
/// let store = DeepShapeStore::new();
/// let edges = store
///     .deliver(&RecursiveShapeSource::new(&source, top, l1), GeometryKind::Edges)
///     .unwrap();
///
/// let mut target = Layout::new();
/// let out_layer = target.insert_layer(LayerInfo::new(100, 0));
/// let out_top = target.add_cell("OUT");
/// Materializer::new(&store)
///     .insert(edges, &mut target, out_top, out_layer)
///     .unwrap();
/// assert_eq!(target.cell_count(), 2);
/// assert_eq!(target.cell(out_top).instances().len(), 1);
/// ```
pub struct Materializer<'s> {
    store: &'s DeepShapeStore,
    cells: HashMap<(LayoutId, VariantId), CellIndex>,
    instances: HashSet<InstanceKey>,
    filled: HashSet<(LayoutId, CellIndex, LayerIndex, usize)>,
}

impl<'s> Materializer<'s> {
    pub fn new(store: &'s DeepShapeStore) -> Self {
        Materializer {
            store,
            cells: HashMap::new(),
            instances: HashSet::new(),
            filled: HashSet::new(),
        }
    }

    /// Inserts the shapes of `layer` into `target_layer`: the root's shapes go to `target_cell`,
    /// everything below into cells created for the variants.
    pub fn insert(
        &mut self,
        layer: DeepLayer,
        layout: &mut Layout,
        target_cell: CellIndex,
        target_layer: LayerIndex,
    ) -> DeepResult<()> {
        let data = self.store.layer_data(layer)?;
        if target_cell >= layout.cell_count() {
            return Err(DeepError::InvalidOperand(format!(
                "target cell {target_cell} does not exist"
            )));
        }
        let mut infos = Infos {
            store: self.store,
            cache: HashMap::new(),
        };
        let mut visited = HashSet::new();
        self.fill(
            &mut infos,
            &data,
            data.root,
            layout,
            target_cell,
            (target_layer, layer.index()),
            &mut visited,
        )?;
        debug!(
            layer = layer.index(),
            variants = visited.len(),
            "materialized deep layer"
        );
        Ok(())
    }

    /// Inserts the fully expanded shapes of `layer` into `target_cell`.
    pub fn insert_flat(
        &mut self,
        layer: DeepLayer,
        layout: &mut Layout,
        target_cell: CellIndex,
        target_layer: LayerIndex,
    ) -> DeepResult<()> {
        let flat = self.store.flatten(layer)?;
        if target_cell >= layout.cell_count() {
            return Err(DeepError::InvalidOperand(format!(
                "target cell {target_cell} does not exist"
            )));
        }
        for shape in flat.shapes.shapes() {
            layout.insert(target_cell, target_layer, shape);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn fill(
        &mut self,
        infos: &mut Infos<'_>,
        data: &LayerData,
        v: VariantId,
        layout: &mut Layout,
        cell: CellIndex,
        (target_layer, layer_index): (LayerIndex, usize),
        visited: &mut HashSet<VariantId>,
    ) -> DeepResult<()> {
        if !visited.insert(v) {
            return Ok(());
        }
        if self
            .filled
            .insert((layout.id(), cell, target_layer, layer_index))
        {
            if let Some(shapes) = data.shapes_of(v) {
                for shape in shapes.shapes() {
                    layout.insert(cell, target_layer, shape);
                }
            }
        }

        let info = infos.get(v)?;
        for p in &info.placements {
            if data.bbox_of(p.child).is_empty() {
                continue;
            }
            let child_cell = self.cell_for(infos, layout, p.child)?;
            let key = (layout.id(), cell, child_cell, p.disp, p.array);
            if self.instances.insert(key) {
                let trans = Trans::translation(p.disp);
                let instance = match p.array {
                    Some(array) => Instance::array(child_cell, trans, array),
                    None => Instance::new(child_cell, trans),
                };
                layout.add_instance(cell, instance);
            }
            self.fill(
                infos,
                data,
                p.child,
                layout,
                child_cell,
                (target_layer, layer_index),
                visited,
            )?;
        }
        Ok(())
    }

    /// Target cell of a variant, created on first use. Base variants keep the source cell's name
    /// where it is free, everything else is named `<name>$<n>`.
    fn cell_for(
        &mut self,
        infos: &mut Infos<'_>,
        layout: &mut Layout,
        v: VariantId,
    ) -> DeepResult<CellIndex> {
        if let Some(&cell) = self.cells.get(&(layout.id(), v)) {
            return Ok(cell);
        }
        let info = infos.get(v)?;
        let mut name = info.name.to_string();
        if info.base != v || layout.cell_by_name(&name).is_some() {
            let mut n = 1usize;
            loop {
                name = format!("{}${}", info.name, n);
                if layout.cell_by_name(&name).is_none() {
                    break;
                }
                n += 1;
            }
        }
        let cell = layout.add_cell(name);
        self.cells.insert((layout.id(), v), cell);
        Ok(cell)
    }
}
