//! Cell variant resolution.
//!
//! A variant is an equivalence class of cell occurrences sharing one copy of local geometry.
//! Base variants come from delivery and are keyed by the occurrence transformation without its
//! integer displacement (orientation, magnification, sub-unit remainder) plus the clip of a
//! partially covered area of interest. Shapes of a variant are stored "oriented local": already
//! transformed by that residual, so every placement below a variant is a pure integer
//! displacement.
//!
//! Operators refine base variants: a *specialized* variant is a variant evaluated against a
//! specific neighborhood, an *aligned* variant is the common refinement of two variants of the
//! same base. Refined variants expand to exactly the elements of their base (same order, same
//! displacements) and only differ in which variants the elements refer to.
use crate::{
    core::{
        math::{split_fraction, Point, Rect},
        trans::{ComplexTrans, Orientation},
    },
    geometry::ShapeSet,
    layout::{ArrayRepetition, CellIndex, LayoutId},
};
use std::{collections::HashMap, sync::Arc};

pub type VariantId = usize;

/// Foreign geometry an occurrence is evaluated against, in the variant's local coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Context {
    pub primary: ShapeSet,
    pub secondary: ShapeSet,
}

impl Context {
    pub fn new(primary: ShapeSet, secondary: ShapeSet) -> Self {
        Context { primary, secondary }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }

    pub fn moved(&self, d: Point) -> Context {
        Context::new(self.primary.moved(d), self.secondary.moved(d))
    }

    pub fn sorted(mut self) -> Context {
        self.primary.sort();
        self.secondary.sort();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariantKey {
    Base {
        layout: LayoutId,
        cell: CellIndex,
        orientation: Orientation,
        mag: u64,
        dx: u64,
        dy: u64,
        /// Area of interest in variant-local coordinates if the occurrence is only partially
        /// covered by it.
        clip: Option<Rect>,
    },
    Specialized {
        of: VariantId,
        evaluation: u64,
        context: Arc<Context>,
    },
    Aligned(VariantId, VariantId),
}

impl VariantKey {
    /// Key of a delivered occurrence of `cell` with accumulated transformation `trans`.
    pub fn base(
        layout: LayoutId,
        cell: CellIndex,
        trans: &ComplexTrans,
        clip: Option<&Rect>,
    ) -> Self {
        let residual = trans.residual();
        let int_disp = trans.int_disp();
        VariantKey::Base {
            layout,
            cell,
            orientation: residual.orientation,
            mag: residual.mag.to_bits(),
            dx: split_fraction(residual.dx).1.to_bits(),
            dy: split_fraction(residual.dy).1.to_bits(),
            clip: clip.map(|c| c.moved(-int_disp)),
        }
    }
}

/// Placement of a child variant: a single displacement or a regular array of them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Placement {
    pub child: VariantId,
    pub disp: Point,
    pub array: Option<ArrayRepetition>,
}

impl Placement {
    pub fn len(&self) -> usize {
        self.array.map_or(1, |a| a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Displacement of every element (rows outer, columns inner).
    pub fn offsets(&self) -> Box<dyn Iterator<Item = Point> + '_> {
        match &self.array {
            None => Box::new(std::iter::once(self.disp)),
            Some(arr) => Box::new(arr.offsets().map(move |o| self.disp + o)),
        }
    }

    /// Box covering every element of the placement given the child's box.
    pub fn bbox(&self, child_bbox: &Rect) -> Rect {
        if child_bbox.is_empty() {
            return *child_bbox;
        }
        let placed = child_bbox.moved(self.disp);
        match &self.array {
            None => placed,
            Some(arr) => arr
                .corner_offsets()
                .iter()
                .fold(Rect::empty(), |acc, o| acc.union(&placed.moved(*o))),
        }
    }
}

/// Expands placements into `(child, displacement)` elements in canonical order.
pub fn expand(placements: &[Placement]) -> Vec<(VariantId, Point)> {
    placements
        .iter()
        .flat_map(|p| p.offsets().map(move |d| (p.child, d)))
        .collect()
}

#[derive(Debug, Copy, Clone)]
struct Run {
    child: VariantId,
    start: Point,
    step: Point,
    n: u32,
}

/// Compacts elements back into placements: runs of the same child with a constant step become
/// one dimensional arrays, consecutive equal runs with a constant offset become two dimensional
/// arrays. [expand] of the result reproduces `elements` exactly.
pub fn compact(elements: &[(VariantId, Point)]) -> Vec<Placement> {
    let mut runs: Vec<Run> = Vec::new();
    for &(child, p) in elements {
        if let Some(last) = runs.last_mut() {
            if last.child == child {
                if last.n == 1 && p != last.start {
                    last.step = p - last.start;
                    last.n = 2;
                    continue;
                }
                if last.n >= 2 && p == last.start + last.step.scale(last.n as i64) {
                    last.n += 1;
                    continue;
                }
            }
        }
        runs.push(Run {
            child,
            start: p,
            step: Point::new(0, 0),
            n: 1,
        });
    }

    let mut placements = Vec::new();
    let mut i = 0;
    while i < runs.len() {
        let r = runs[i];
        let mut b = Point::new(0, 0);
        let mut nb = 1u32;
        let mut k = i + 1;
        while k < runs.len()
            && runs[k].child == r.child
            && runs[k].n == r.n
            && runs[k].step == r.step
        {
            let delta = runs[k].start - runs[k - 1].start;
            if nb > 1 && delta != b {
                break;
            }
            b = delta;
            nb += 1;
            k += 1;
        }
        let array = if r.n == 1 && nb == 1 {
            None
        } else {
            Some(ArrayRepetition::new(r.step, r.n, b, nb))
        };
        placements.push(Placement {
            child: r.child,
            disp: r.start,
            array,
        });
        i = k;
    }
    placements
}

#[derive(Debug, Clone)]
pub struct VariantInfo {
    pub key: VariantKey,
    /// Base variant this one refines (itself for base variants).
    pub base: VariantId,
    /// Source cell of the base variant.
    pub cell: CellIndex,
    pub name: Arc<str>,
    pub placements: Vec<Placement>,
    /// `false` while a base variant is registered but its delivery has not left it yet.
    pub complete: bool,
}

/// Append-only registry of variants.
#[derive(Debug, Default)]
pub struct VariantTable {
    infos: Vec<Arc<VariantInfo>>,
    index: HashMap<VariantKey, VariantId>,
}

impl VariantTable {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    #[inline]
    pub fn get(&self, id: VariantId) -> Option<&Arc<VariantInfo>> {
        self.infos.get(id)
    }

    #[inline]
    pub fn lookup(&self, key: &VariantKey) -> Option<VariantId> {
        self.index.get(key).copied()
    }

    /// Base variant of `id` (following refinements).
    pub fn base_of(&self, id: VariantId) -> Option<VariantId> {
        self.infos.get(id).map(|i| i.base)
    }

    /// Returns the variant for `key`, registering it with the data given if it is new. The flag
    /// tells whether the variant was created.
    pub fn resolve(
        &mut self,
        key: VariantKey,
        cell: CellIndex,
        name: Arc<str>,
        placements: Option<Vec<Placement>>,
    ) -> (VariantId, bool) {
        if let Some(id) = self.lookup(&key) {
            return (id, false);
        }
        let id = self.infos.len();
        let base = match &key {
            VariantKey::Base { .. } => id,
            VariantKey::Specialized { of, .. } => self.base_of(*of).unwrap_or(*of),
            VariantKey::Aligned(a, _) => self.base_of(*a).unwrap_or(*a),
        };
        let complete = placements.is_some();
        self.infos.push(Arc::new(VariantInfo {
            key: key.clone(),
            base,
            cell,
            name,
            placements: placements.unwrap_or_default(),
            complete,
        }));
        self.index.insert(key, id);
        (id, true)
    }

    /// Records the placements of a base variant once its delivery is done with it. Later calls
    /// for a complete variant are ignored.
    pub fn complete(&mut self, id: VariantId, placements: Vec<Placement>) {
        if let Some(info) = self.infos.get_mut(id) {
            if !info.complete {
                let info = Arc::make_mut(info);
                info.placements = placements;
                info.complete = true;
            }
        }
    }
}
