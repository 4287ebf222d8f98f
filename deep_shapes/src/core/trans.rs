//! Fixpoint transformations: the 8 orientations of the square (rotations by multiples of 90
//! degrees, optionally mirrored at the x axis first), magnification and displacement.
use super::math::{round_coord, split_fraction, Coord, Point, Rect};

/// One of the 8 fixpoint orientations. Mirroring (at the x axis) is applied before rotation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Orientation {
    rot: u8,
    mirror: bool,
}

impl Orientation {
    pub const R0: Orientation = Orientation::new(0, false);
    pub const R90: Orientation = Orientation::new(1, false);
    pub const R180: Orientation = Orientation::new(2, false);
    pub const R270: Orientation = Orientation::new(3, false);
    pub const M0: Orientation = Orientation::new(0, true);
    pub const M45: Orientation = Orientation::new(1, true);
    pub const M90: Orientation = Orientation::new(2, true);
    pub const M135: Orientation = Orientation::new(3, true);

    /// Orientation rotating counter clockwise by `quarter_turns * 90` degrees after an optional
    /// mirror at the x axis.
    #[inline]
    pub const fn new(quarter_turns: u8, mirror: bool) -> Self {
        Orientation {
            rot: quarter_turns % 4,
            mirror,
        }
    }

    #[inline]
    pub fn quarter_turns(&self) -> u8 {
        self.rot
    }

    #[inline]
    pub fn is_mirror(&self) -> bool {
        self.mirror
    }

    /// Compact code in `0..8` (rotation in the low bits, mirror flag adds 4).
    #[inline]
    pub fn code(&self) -> u8 {
        self.rot + if self.mirror { 4 } else { 0 }
    }

    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        let y = if self.mirror { -p.y } else { p.y };
        match self.rot {
            0 => Point::new(p.x, y),
            1 => Point::new(-y, p.x),
            2 => Point::new(-p.x, -y),
            _ => Point::new(y, -p.x),
        }
    }

    #[inline]
    pub fn apply_f(&self, x: f64, y: f64) -> (f64, f64) {
        let y = if self.mirror { -y } else { y };
        match self.rot {
            0 => (x, y),
            1 => (-y, x),
            2 => (-x, -y),
            _ => (y, -x),
        }
    }

    /// Orientation equivalent to applying `inner` first and then `self`.
    #[inline]
    pub fn concat(&self, inner: &Orientation) -> Orientation {
        // M R(b) == R(-b) M
        let inner_rot = if self.mirror {
            (4 - inner.rot) % 4
        } else {
            inner.rot
        };
        Orientation::new(self.rot + inner_rot, self.mirror != inner.mirror)
    }
}

/// Simple transformation used by instances: orientation, magnification and integer displacement.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trans {
    pub orientation: Orientation,
    pub mag: f64,
    pub disp: Point,
}

impl Default for Trans {
    #[inline]
    fn default() -> Self {
        Trans::translation(Point::new(0, 0))
    }
}

impl Trans {
    #[inline]
    pub fn new(orientation: Orientation, disp: Point) -> Self {
        Trans {
            orientation,
            mag: 1.0,
            disp,
        }
    }

    #[inline]
    pub fn translation(disp: Point) -> Self {
        Trans::new(Orientation::R0, disp)
    }

    /// Same transformation with magnification `mag` (must be positive).
    #[inline]
    pub fn with_mag(mut self, mag: f64) -> Self {
        debug_assert!(mag > 0.0, "magnification must be positive");
        self.mag = mag;
        self
    }
}

/// Accumulated transformation with floating point displacement.
///
/// Points are mapped as `round(mag * orientation(p) + remainder) + floor(disp)` where
/// `remainder = disp - floor(disp)`. Splitting the integer part off first keeps the mapping
/// exactly equal to the composition of a variant-local transformation (orientation, magnification,
/// remainder) and a pure integer placement.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ComplexTrans {
    pub orientation: Orientation,
    pub mag: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Default for ComplexTrans {
    #[inline]
    fn default() -> Self {
        ComplexTrans::identity()
    }
}

impl From<&Trans> for ComplexTrans {
    #[inline]
    fn from(t: &Trans) -> Self {
        ComplexTrans {
            orientation: t.orientation,
            mag: t.mag,
            dx: t.disp.x as f64,
            dy: t.disp.y as f64,
        }
    }
}

impl ComplexTrans {
    #[inline]
    pub fn identity() -> Self {
        ComplexTrans {
            orientation: Orientation::R0,
            mag: 1.0,
            dx: 0.0,
            dy: 0.0,
        }
    }

    /// Transformation equivalent to applying `inner` first and then `self`.
    pub fn concat(&self, inner: &ComplexTrans) -> ComplexTrans {
        let (x, y) = self.orientation.apply_f(inner.dx, inner.dy);
        ComplexTrans {
            orientation: self.orientation.concat(&inner.orientation),
            mag: self.mag * inner.mag,
            dx: self.mag * x + self.dx,
            dy: self.mag * y + self.dy,
        }
    }

    /// Integer part (floor) of the displacement.
    #[inline]
    pub fn int_disp(&self) -> Point {
        Point::new(split_fraction(self.dx).0, split_fraction(self.dy).0)
    }

    /// The transformation without its integer displacement part: orientation, magnification and
    /// the sub-unit displacement remainder.
    #[inline]
    pub fn residual(&self) -> ComplexTrans {
        ComplexTrans {
            orientation: self.orientation,
            mag: self.mag,
            dx: split_fraction(self.dx).1,
            dy: split_fraction(self.dy).1,
        }
    }

    #[inline]
    pub fn is_unit_mag(&self) -> bool {
        self.mag == 1.0
    }

    pub fn apply_point(&self, p: Point) -> Point {
        let (ix, fx) = split_fraction(self.dx);
        let (iy, fy) = split_fraction(self.dy);
        if self.is_unit_mag() && fx == 0.0 && fy == 0.0 {
            return self.orientation.apply(p) + Point::new(ix, iy);
        }
        let (x, y) = self
            .orientation
            .apply_f(p.x as f64 * self.mag, p.y as f64 * self.mag);
        Point::new(round_coord(x + fx) + ix, round_coord(y + fy) + iy)
    }

    /// Conservative image of a box (every transformed and rounded point of the box lies inside).
    pub fn apply_rect(&self, r: &Rect) -> Rect {
        if r.is_empty() {
            return *r;
        }
        let corners = [
            r.min,
            r.max,
            Point::new(r.min.x, r.max.y),
            Point::new(r.max.x, r.min.y),
        ];
        let mut out = Rect::empty();
        for c in corners {
            let (x, y) = self
                .orientation
                .apply_f(c.x as f64 * self.mag, c.y as f64 * self.mag);
            let (x, y) = (x + self.dx, y + self.dy);
            out = out.union(&Rect::from_ltrb(
                x.floor() as Coord,
                y.floor() as Coord,
                x.ceil() as Coord,
                y.ceil() as Coord,
            ));
        }
        out
    }
}
