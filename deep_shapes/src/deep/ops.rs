//! Operator descriptors and the dispatch table mapping operators and operand kinds to an
//! evaluation strategy.
use super::error::{DeepError, DeepResult};
use crate::{
    geometry::{GeometryKind, ShapeSet},
    kernel::{
        edge_boolean, extend_edges, extend_edges_joined_within, filter_edges, inside_part,
        merge_edges, outside_part, polygon_edges, segments, select_interacting, BooleanOp,
        ClusterRule, EdgeFilter, Extension, SegmentMode, SegmentSpec,
    },
};

/// Operators the engine evaluates on deep layers.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operator {
    /// Joins overlapping and touching collinear edges.
    Merge,
    /// Boolean between two edge layers, or between edges and polygons (`And`/`Not` only).
    Boolean(BooleanOp),
    /// Parts of edges inside or on the boundary of polygons.
    InsidePart,
    /// Parts of edges outside of polygons.
    OutsidePart,
    Filter(EdgeFilter),
    Segments(SegmentMode, SegmentSpec),
    /// Edges turned into polygons.
    Extended(Extension),
    /// Edges interacting with the edges or polygons of the second operand (or not, if `inverse`).
    Interacting { inverse: bool },
    /// Contour edges of polygons.
    PolygonEdges,
}

/// How the engine distributes an operator over the hierarchy.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Strategy {
    /// Local results only depend on local shapes.
    PerVariant,
    /// Results of every primary shape depend on the secondary operand shapes touching it.
    Masked,
    /// Results depend on connected groups of shapes, which may span cell boundaries.
    Clustered { rule: ClusterRule },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Plan {
    pub strategy: Strategy,
    pub output: GeometryKind,
}

/// Identity of an operator including its parameters, used for the operation cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct OpKey {
    name: &'static str,
    params: Vec<u64>,
}

fn invalid<T>(msg: String) -> DeepResult<T> {
    Err(DeepError::InvalidParameter(msg))
}

impl Operator {
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Merge => "merge",
            Operator::Boolean(BooleanOp::And) => "and",
            Operator::Boolean(BooleanOp::Not) => "not",
            Operator::Boolean(BooleanOp::Xor) => "xor",
            Operator::Boolean(BooleanOp::Or) => "or",
            Operator::InsidePart => "inside_part",
            Operator::OutsidePart => "outside_part",
            Operator::Filter(EdgeFilter::Length(_)) => "length_filter",
            Operator::Filter(EdgeFilter::Orientation(_)) => "orientation_filter",
            Operator::Segments(SegmentMode::Start, _) => "start_segments",
            Operator::Segments(SegmentMode::End, _) => "end_segments",
            Operator::Segments(SegmentMode::Center, _) => "centers",
            Operator::Extended(_) => "extended",
            Operator::Interacting { inverse: false } => "selected_interacting",
            Operator::Interacting { inverse: true } => "selected_not_interacting",
            Operator::PolygonEdges => "polygon_edges",
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            Operator::Boolean(_)
                | Operator::InsidePart
                | Operator::OutsidePart
                | Operator::Interacting { .. }
        )
    }

    pub(crate) fn key(&self) -> OpKey {
        let params = match self {
            Operator::Filter(EdgeFilter::Length(f)) => {
                vec![f.min as u64, f.max as u64, f.inverse as u64]
            }
            Operator::Filter(EdgeFilter::Orientation(f)) => {
                vec![f.min_deg.to_bits(), f.max_deg.to_bits(), f.inverse as u64]
            }
            Operator::Segments(_, s) => vec![s.length as u64, s.fraction.to_bits()],
            Operator::Extended(e) => vec![
                e.begin as u64,
                e.end as u64,
                e.outside as u64,
                e.inside as u64,
                e.join as u64,
            ],
            _ => Vec::new(),
        };
        OpKey {
            name: self.name(),
            params,
        }
    }

    /// Checks the operator configuration.
    pub fn validate(&self) -> DeepResult<()> {
        match self {
            Operator::Filter(EdgeFilter::Length(f)) => {
                if f.min < 0 {
                    return invalid(format!("negative minimum length {}", f.min));
                }
                if f.min > f.max {
                    return invalid(format!("inverted length range [{}, {})", f.min, f.max));
                }
            }
            Operator::Filter(EdgeFilter::Orientation(f)) => {
                if !f.min_deg.is_finite() || !f.max_deg.is_finite() {
                    return invalid("non-finite orientation range".to_string());
                }
                if f.min_deg > f.max_deg {
                    return invalid(format!(
                        "inverted orientation range [{}, {})",
                        f.min_deg, f.max_deg
                    ));
                }
            }
            Operator::Segments(_, s) => {
                if s.length < 0 {
                    return invalid(format!("negative segment length {}", s.length));
                }
                if !(0.0..=1.0).contains(&s.fraction) {
                    return invalid(format!("segment fraction {} outside [0, 1]", s.fraction));
                }
            }
            Operator::Extended(e) => {
                if e.begin < 0 || e.end < 0 || e.outside < 0 || e.inside < 0 {
                    return invalid(format!("negative extension distance in {e:?}"));
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Looks up the strategy for the operand kinds given.
    pub(crate) fn plan(&self, a: GeometryKind, b: Option<GeometryKind>) -> DeepResult<Plan> {
        use GeometryKind::{Edges, Polygons};

        let collinear = Strategy::Clustered {
            rule: ClusterRule::Collinear,
        };
        let plan = |strategy, output| Some(Plan { strategy, output });
        let found = match (self, a, b) {
            (Operator::Merge, Edges, None) => plan(collinear, Edges),
            (Operator::Boolean(_), Edges, Some(Edges)) => plan(collinear, Edges),
            (Operator::Boolean(BooleanOp::And | BooleanOp::Not), Edges, Some(Polygons)) => {
                plan(Strategy::Masked, Edges)
            }
            (Operator::InsidePart | Operator::OutsidePart, Edges, Some(Polygons)) => {
                plan(Strategy::Masked, Edges)
            }
            (Operator::Filter(_) | Operator::Segments(..), Edges, None) => {
                plan(Strategy::PerVariant, Edges)
            }
            (Operator::Extended(e), Edges, None) if e.join => plan(
                Strategy::Clustered {
                    rule: ClusterRule::Chains,
                },
                Polygons,
            ),
            (Operator::Extended(_), Edges, None) => plan(Strategy::PerVariant, Polygons),
            (Operator::Interacting { .. }, Edges, Some(_)) => plan(Strategy::Masked, Edges),
            (Operator::PolygonEdges, Polygons, None) => plan(Strategy::PerVariant, Edges),
            _ => None,
        };
        found.ok_or_else(|| {
            DeepError::InvalidOperand(format!(
                "{} is not defined for operands {:?} and {:?}",
                self.name(),
                a,
                b
            ))
        })
    }

    /// Runs the local kernel on one coordinate system. `b` is the second operand (or the mask)
    /// for binary operators. For joined extension `b` holds edges that only decide chaining at the
    /// end points of `a` and produce no output.
    pub(crate) fn compute(&self, a: &ShapeSet, b: Option<&ShapeSet>) -> ShapeSet {
        let none = ShapeSet::Edges(Vec::new());
        let b = b.unwrap_or(&none);
        match self {
            Operator::Merge => merge_edges(a.edges()).into(),
            Operator::Boolean(op) => match b {
                ShapeSet::Edges(be) => edge_boolean(a.edges(), be, *op).into(),
                ShapeSet::Polygons(bp) => match op {
                    BooleanOp::Not => outside_part(a.edges(), bp).into(),
                    _ => inside_part(a.edges(), bp).into(),
                },
            },
            Operator::InsidePart => inside_part(a.edges(), b.polygons()).into(),
            Operator::OutsidePart => outside_part(a.edges(), b.polygons()).into(),
            Operator::Filter(f) => filter_edges(a.edges(), f).into(),
            Operator::Segments(mode, spec) => segments(a.edges(), *mode, spec).into(),
            Operator::Extended(e) if e.join => {
                extend_edges_joined_within(a.edges(), b.edges(), e).into()
            }
            Operator::Extended(e) => extend_edges(a.edges(), e).into(),
            Operator::Interacting { inverse } => select_interacting(a.edges(), b, *inverse).into(),
            Operator::PolygonEdges => polygon_edges(a.polygons()).into(),
        }
    }
}

/// Evaluates `op` on flat operands after checking its parameters and operand kinds. Deep results
/// flatten to exactly this.
pub fn evaluate_flat(op: &Operator, a: &ShapeSet, b: Option<&ShapeSet>) -> DeepResult<ShapeSet> {
    op.validate()?;
    op.plan(a.kind(), b.map(|b| b.kind()))?;
    Ok(op.compute(a, b).sorted())
}
