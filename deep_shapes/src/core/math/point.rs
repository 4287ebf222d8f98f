use super::Coord;
use num_traits::Zero;
use std::ops;

/// Integer point/vector in database units.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    /// Create a new point with x and y components.
    #[inline]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Point { x, y }
    }

    /// Dot product, widened so products of large coordinates do not overflow.
    #[inline]
    pub fn dot(&self, other: Self) -> i128 {
        self.x as i128 * other.x as i128 + self.y as i128 * other.y as i128
    }

    /// Compute the perpendicular dot product (`self.x * other.y - self.y * other.x`).
    #[inline]
    pub fn perp_dot(&self, other: Self) -> i128 {
        self.x as i128 * other.y as i128 - self.y as i128 * other.x as i128
    }

    /// Squared length of the vector.
    #[inline]
    pub fn length_squared(&self) -> i128 {
        self.dot(*self)
    }

    /// Euclidean length of the vector.
    #[inline]
    pub fn length(&self) -> f64 {
        (self.length_squared() as f64).sqrt()
    }

    /// Component-wise integer scaling.
    #[inline]
    pub fn scale(&self, factor: Coord) -> Self {
        Point::new(self.x * factor, self.y * factor)
    }

    /// Counter clockwise perpendicular vector.
    #[inline]
    pub fn perp(&self) -> Self {
        Point::new(-self.y, self.x)
    }
}

#[inline(always)]
pub fn point(x: Coord, y: Coord) -> Point {
    Point::new(x, y)
}

macro_rules! ImplBinaryOp {
    ($op_trait:ident, $op_func:ident, $op:tt) => {
        impl ops::$op_trait<Point> for Point {
            type Output = Point;
            #[inline]
            fn $op_func(self, rhs: Point) -> Self::Output {
                Point::new(self.x $op rhs.x, self.y $op rhs.y)
            }
        }

        impl ops::$op_trait<&Point> for Point {
            type Output = Point;
            #[inline]
            fn $op_func(self, rhs: &Point) -> Self::Output {
                Point::new(self.x $op rhs.x, self.y $op rhs.y)
            }
        }

        impl<'a, 'b> ops::$op_trait<&'b Point> for &'a Point {
            type Output = Point;
            #[inline]
            fn $op_func(self, rhs: &'b Point) -> Self::Output {
                Point::new(self.x $op rhs.x, self.y $op rhs.y)
            }
        }

        impl ops::$op_trait<Point> for &Point {
            type Output = Point;
            #[inline]
            fn $op_func(self, rhs: Point) -> Self::Output {
                Point::new(self.x $op rhs.x, self.y $op rhs.y)
            }
        }
    };
}

ImplBinaryOp!(Add, add, +);
ImplBinaryOp!(Sub, sub, -);

impl ops::AddAssign for Point {
    #[inline]
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl ops::Neg for Point {
    type Output = Point;
    #[inline]
    fn neg(self) -> Self::Output {
        Point::new(-self.x, -self.y)
    }
}

impl Zero for Point {
    #[inline]
    fn zero() -> Self {
        Point::new(0, 0)
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_binary_op {
        ($v1:ident, $v2:ident, $op:tt, $expected:expr) => {
            assert_eq!(($v1 $op $v2), $expected);
            assert_eq!((&$v1 $op $v2), $expected);
            assert_eq!(($v1 $op &$v2), $expected);
            assert_eq!((&$v1 $op &$v2), $expected);
        };
    }

    #[test]
    fn ops() {
        let v1 = point(4, 5);
        let v2 = point(1, 2);
        test_binary_op!(v1, v2, +, point(5, 7));
        test_binary_op!(v1, v2, -, point(3, 3));
        assert_eq!(-v1, point(-4, -5));
        assert_eq!(v1.perp_dot(v2), 3);
        assert_eq!(v1.dot(v2), 14);
    }

    #[test]
    fn wide_products_do_not_overflow() {
        let v = point(Coord::MAX / 2, Coord::MAX / 2);
        assert!(v.length_squared() > 0);
    }
}
