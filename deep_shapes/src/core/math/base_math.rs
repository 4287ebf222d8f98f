use super::{Coord, Point};

/// Returns the (min, max) values from `v1` and `v2`.
///
/// # Examples
///
/// ```
/// # use deep_shapes::core::math::*;
/// let (min_val, max_val) = min_max(8, 4);
/// assert_eq!(min_val, 4);
/// assert_eq!(max_val, 8);
/// ```
#[inline]
pub fn min_max<T>(v1: T, v2: T) -> (T, T)
where
    T: PartialOrd,
{
    if v1 < v2 {
        (v1, v2)
    } else {
        (v2, v1)
    }
}

/// Rounds to the nearest integer with ties going up (`floor(x + 0.5)`).
///
/// Unlike [f64::round] this commutes with integer translation, `round_coord(x + n) ==
/// round_coord(x) + n`, which every hierarchical result relies on.
///
/// # Examples
///
/// ```
/// # use deep_shapes::core::math::*;
/// assert_eq!(round_coord(2.5), 3);
/// assert_eq!(round_coord(-2.5), -2);
/// assert_eq!(round_coord(-2.6), -3);
/// ```
#[inline]
pub fn round_coord(x: f64) -> Coord {
    (x + 0.5).floor() as Coord
}

/// Exact `round_coord(num / den)` for integers, `den` must be non-zero.
///
/// # Examples
///
/// ```
/// # use deep_shapes::core::math::*;
/// assert_eq!(round_div(5, 2), 3);
/// assert_eq!(round_div(-5, 2), -2);
/// assert_eq!(round_div(7, -2), -3);
/// ```
#[inline]
pub fn round_div(num: i128, den: i128) -> Coord {
    debug_assert!(den != 0, "division by zero");
    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    (2 * num + den).div_euclid(2 * den) as Coord
}

/// Greatest common divisor of the absolute values (`gcd(0, 0) == 0`).
#[inline]
pub fn gcd(a: Coord, b: Coord) -> Coord {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Rounds a floating point vector to the integer grid.
#[inline]
pub fn round_vector(x: f64, y: f64) -> Point {
    Point::new(round_coord(x), round_coord(y))
}

/// Splits a floating point value into an integer part (floor) and a remainder in `[0, 1)`.
#[inline]
pub fn split_fraction(v: f64) -> (Coord, f64) {
    let i = v.floor();
    (i as Coord, v - i)
}
