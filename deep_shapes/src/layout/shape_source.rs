use super::{CellIndex, LayerIndex, Layout};
use crate::{
    core::{
        math::Rect,
        trans::ComplexTrans,
        Control, ControlFlow,
    },
    geometry::{GeometryKind, Shape, ShapeSet},
};

/// Receives a depth first walk over a cell hierarchy.
pub trait HierarchyVisitor {
    /// Called when a cell occurrence is entered with its accumulated transformation. `clip` is the
    /// area of interest (root coordinates) if only part of the occurrence lies inside it. Returning
    /// [Control::Break] skips the occurrence: no shapes, children or [leave_cell] are reported.
    ///
    /// [leave_cell]: HierarchyVisitor::leave_cell
    fn enter_cell(&mut self, cell: CellIndex, trans: &ComplexTrans, clip: Option<&Rect>)
        -> Control;

    /// A shape of the current cell on the source layer (untransformed).
    fn shape(&mut self, shape: &Shape, trans: &ComplexTrans);

    fn leave_cell(&mut self, cell: CellIndex, trans: &ComplexTrans);
}

/// Depth first traversal of a layout from a top cell yielding the shapes of one layer together
/// with their accumulated transformation, optionally restricted to an area of interest.
///
/// With an area of interest only shapes whose transformed box touches the area are reported and
/// cell occurrences lying completely outside are not entered.
#[derive(Debug, Clone)]
pub struct RecursiveShapeSource<'a> {
    layout: &'a Layout,
    top: CellIndex,
    layer: LayerIndex,
    region: Option<Rect>,
    bboxes: Vec<Rect>,
}

impl<'a> RecursiveShapeSource<'a> {
    /// Source for `layer` below `top`. A layer the layout does not have yields no shapes.
    pub fn new(layout: &'a Layout, top: CellIndex, layer: LayerIndex) -> Self {
        RecursiveShapeSource {
            layout,
            top,
            layer,
            region: None,
            bboxes: Vec::new(),
        }
    }

    /// Restricts the source to shapes touching `region` (root coordinates).
    pub fn with_region(mut self, region: Rect) -> Self {
        self.region = Some(region);
        self.bboxes = self.layout.cell_bboxes();
        self
    }

    #[inline]
    pub fn layout(&self) -> &'a Layout {
        self.layout
    }

    #[inline]
    pub fn top(&self) -> CellIndex {
        self.top
    }

    #[inline]
    pub fn layer(&self) -> LayerIndex {
        self.layer
    }

    #[inline]
    pub fn region(&self) -> Option<&Rect> {
        self.region.as_ref()
    }

    /// Classifies an occurrence against the area of interest: `None` to skip it, `Some(clip)`
    /// with the clip to pass on otherwise.
    fn classify(&self, cell: CellIndex, trans: &ComplexTrans) -> Option<Option<Rect>> {
        let Some(region) = self.region else {
            return Some(None);
        };
        let bbox = trans.apply_rect(&self.bboxes[cell]);
        if !bbox.touches(&region) {
            None
        } else if region.contains_rect(&bbox) {
            Some(None)
        } else {
            Some(Some(region))
        }
    }

    pub fn visit<V: HierarchyVisitor>(&self, visitor: &mut V) {
        let root = ComplexTrans::identity();
        let clip = match self.region {
            None => None,
            Some(region) => {
                let bbox = self.bboxes[self.top];
                if region.contains_rect(&bbox) {
                    None
                } else {
                    Some(region)
                }
            }
        };
        self.visit_cell(self.top, &root, clip, visitor);
    }

    fn visit_cell<V: HierarchyVisitor>(
        &self,
        cell: CellIndex,
        trans: &ComplexTrans,
        clip: Option<Rect>,
        visitor: &mut V,
    ) {
        if visitor
            .enter_cell(cell, trans, clip.as_ref())
            .should_break()
        {
            return;
        }

        let c = self.layout.cell(cell);
        for shape in c.shapes(self.layer) {
            if let Some(region) = &clip {
                if !shape.transformed(trans).bbox().touches(region) {
                    continue;
                }
            }
            visitor.shape(shape, trans);
        }

        for inst in c.instances() {
            for element in inst.element_transforms() {
                let child_trans = trans.concat(&element);
                let child_clip = match clip {
                    None => None,
                    Some(_) => match self.classify(inst.cell, &child_trans) {
                        None => continue,
                        Some(child_clip) => child_clip,
                    },
                };
                self.visit_cell(inst.cell, &child_trans, child_clip, visitor);
            }
        }

        visitor.leave_cell(cell, trans);
    }

    /// All shapes in root coordinates, converted to `kind` (polygons contribute their contour
    /// edges to edge sets, loose edges are ignored by polygon sets). This is the flat reference
    /// every deep layer built from the source is equivalent to.
    pub fn flat_shapes(&self, kind: GeometryKind) -> ShapeSet {
        struct Collect(ShapeSet);

        impl HierarchyVisitor for Collect {
            fn enter_cell(&mut self, _: CellIndex, _: &ComplexTrans, _: Option<&Rect>) -> Control {
                Control::Continue
            }

            fn shape(&mut self, shape: &Shape, trans: &ComplexTrans) {
                self.0.push_shape(&shape.transformed(trans));
            }

            fn leave_cell(&mut self, _: CellIndex, _: &ComplexTrans) {}
        }

        let mut collect = Collect(ShapeSet::empty(kind));
        self.visit(&mut collect);
        collect.0.sorted()
    }
}
