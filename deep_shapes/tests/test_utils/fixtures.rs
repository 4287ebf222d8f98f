use deep_shapes::{
    core::{
        math::{point, Rect},
        trans::{Orientation, Trans},
    },
    deep::{DeepLayer, DeepShapeStore},
    geometry::{Edge, GeometryKind, Polygon, ShapeSet},
    layout::{
        ArrayRepetition, CellIndex, Instance, LayerIndex, LayerInfo, Layout, RecursiveShapeSource,
    },
};

/// A layout with its top cell and the layers used by the tests.
pub struct Fixture {
    pub layout: Layout,
    pub top: CellIndex,
    /// Edges plus one polygon (delivered as its contour edges).
    pub edges: LayerIndex,
    /// Edges crossing and overlapping the ones on `edges`.
    pub other: LayerIndex,
    pub polygons: LayerIndex,
}

impl Fixture {
    pub fn source(&self, layer: LayerIndex) -> RecursiveShapeSource<'_> {
        RecursiveShapeSource::new(&self.layout, self.top, layer)
    }

    pub fn deliver(
        &self,
        store: &DeepShapeStore,
        layer: LayerIndex,
        kind: GeometryKind,
    ) -> DeepLayer {
        store.deliver(&self.source(layer), kind).unwrap()
    }

    pub fn flat(&self, layer: LayerIndex, kind: GeometryKind) -> ShapeSet {
        self.source(layer).flat_shapes(kind)
    }
}

fn rect(l: i64, b: i64, r: i64, t: i64) -> Polygon {
    Polygon::from_rect(&Rect::from_ltrb(l, b, r, t))
}

/// Three levels with abutting, rotated, mirrored and magnified instances, arrays and shapes on
/// every level that interact across cell boundaries.
pub fn hierarchy() -> Fixture {
    let mut ly = Layout::new();
    let edges = ly.insert_layer(LayerInfo::new(1, 0));
    let other = ly.insert_layer(LayerInfo::new(2, 0));
    let polygons = ly.insert_layer(LayerInfo::new(3, 0));
    let top = ly.add_cell("TOP");
    let b = ly.add_cell("B");
    let a = ly.add_cell("A");

    ly.insert(a, edges, Edge::from_coords(0, 0, 100, 0));
    ly.insert(a, edges, Edge::from_coords(100, 0, 100, 50));
    ly.insert(a, edges, Edge::from_coords(0, 10, 30, 40));
    ly.insert(a, edges, rect(10, 20, 40, 45));
    ly.insert(a, other, Edge::from_coords(50, -10, 50, 60));
    ly.insert(a, other, Edge::from_coords(0, 0, 60, 0));
    ly.insert(a, polygons, rect(20, -10, 60, 30));

    // the first two instances abut, their y = 0 edges continue each other
    ly.add_instance(b, Instance::new(a, Trans::translation(point(0, 0))));
    ly.add_instance(b, Instance::new(a, Trans::translation(point(100, 0))));
    ly.add_instance(b, Instance::new(a, Trans::new(Orientation::R90, point(300, 0))));
    ly.add_instance(b, Instance::new(a, Trans::new(Orientation::M0, point(600, 100))));
    ly.add_instance(
        b,
        Instance::new(a, Trans::new(Orientation::R180, point(0, 300)).with_mag(2.0)),
    );
    ly.insert(b, edges, Edge::from_coords(200, 0, 260, 0));
    ly.insert(b, polygons, rect(80, -20, 130, 20));

    ly.add_instance(
        top,
        Instance::array(
            b,
            Trans::translation(point(0, 0)),
            ArrayRepetition::new(point(1000, 0), 3, point(0, 800), 2),
        ),
    );
    ly.add_instance(top, Instance::new(a, Trans::new(Orientation::M90, point(-200, 0))));
    ly.add_instance(
        top,
        Instance::new(a, Trans::new(Orientation::R270, point(2000, -400)).with_mag(0.5)),
    );
    ly.insert(top, edges, Edge::from_coords(-500, -5, 3000, -5));
    ly.insert(top, edges, Edge::from_coords(950, 0, 1000, 0));
    ly.insert(top, other, Edge::from_coords(0, 0, 3000, 0));
    ly.insert(top, polygons, rect(-250, -30, 1150, 15));

    Fixture {
        layout: ly,
        top,
        edges,
        other,
        polygons,
    }
}

/// `nx` by `ny` array of a cell holding `shape` on one layer.
pub fn array_of<S: Into<deep_shapes::geometry::Shape>>(
    shape: S,
    step: i64,
    nx: u32,
    ny: u32,
) -> (Fixture, CellIndex) {
    let mut ly = Layout::new();
    let layer = ly.insert_layer(LayerInfo::new(1, 0));
    let top = ly.add_cell("TOP");
    let c = ly.add_cell("C");
    ly.insert(c, layer, shape);
    ly.add_instance(
        top,
        Instance::array(
            c,
            Trans::translation(point(0, 0)),
            ArrayRepetition::new(point(step, 0), nx, point(0, step), ny),
        ),
    );
    (
        Fixture {
            layout: ly,
            top,
            edges: layer,
            other: layer,
            polygons: layer,
        },
        c,
    )
}

/// Top cell with one child holding a 1000 x 1000 square on the first layer and another child
/// holding a 600 x 600 square on the second layer, the latter placed at `offset`.
pub fn squares(offset: i64) -> Fixture {
    let mut ly = Layout::new();
    let l1 = ly.insert_layer(LayerInfo::new(1, 0));
    let l2 = ly.insert_layer(LayerInfo::new(2, 0));
    let top = ly.add_cell("TOP");
    let big = ly.add_cell("BIG");
    let small = ly.add_cell("SMALL");
    ly.insert(big, l1, rect(0, 0, 1000, 1000));
    ly.insert(small, l2, rect(0, 0, 600, 600));
    ly.add_instance(top, Instance::new(big, Trans::translation(point(0, 0))));
    ly.add_instance(
        top,
        Instance::new(small, Trans::translation(point(offset, offset))),
    );
    Fixture {
        layout: ly,
        top,
        edges: l1,
        other: l2,
        polygons: l2,
    }
}
