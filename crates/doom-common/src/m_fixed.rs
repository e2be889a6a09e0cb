// m_fixed.rs — 16.16 fixed-point arithmetic
//
// All spatial coordinates, heights and velocities live in this format so
// that two runs fed the same input stay bit-identical. Multiplication wraps
// on overflow; division saturates.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Shl, Shr, Sub, SubAssign};

use crate::common::{com_dprintf, com_printf};

pub const FRACBITS: i32 = 16;
pub const FRACUNIT: i32 = 1 << FRACBITS;

/// A signed 16.16 fixed-point number.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(FRACUNIT);
    pub const MAX: Fixed = Fixed(i32::MAX);
    pub const MIN: Fixed = Fixed(i32::MIN);

    /// Whole map units to fixed point. Wraps like the C shift does.
    #[inline]
    pub const fn from_int(v: i32) -> Self {
        Fixed(v.wrapping_shl(FRACBITS as u32))
    }

    /// Truncates toward negative infinity (arithmetic shift).
    #[inline]
    pub const fn to_int(self) -> i32 {
        self.0 >> FRACBITS
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Fixed(self.0.wrapping_abs())
    }

    /// Only for display and diagnostics, never for simulation.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / FRACUNIT as f64
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({:#x} = {:.4})", self.0, self.to_f64())
    }
}

// ============================================================
// FixedMul / FixedDiv
// ============================================================

/// `(a * b) >> 16` through a 64-bit intermediate, truncated back to 32 bits.
#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    Fixed(((a.0 as i64 * b.0 as i64) >> FRACBITS) as i32)
}

/// Saturating fixed-point division.
///
/// When `|a| >> 14 >= |b|` the quotient cannot be represented and the result
/// is `MAX` or `MIN` according to the sign of `a ^ b`. Division by zero
/// falls into that case.
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if ((a.0 as i64).abs() >> 14) >= (b.0 as i64).abs() {
        com_dprintf("FixedDiv: overflow\n");
        return if (a.0 ^ b.0) < 0 { Fixed::MIN } else { Fixed::MAX };
    }
    fixed_div2(a, b)
}

fn fixed_div2(a: Fixed, b: Fixed) -> Fixed {
    let c = ((a.0 as i64) << FRACBITS) / b.0 as i64;
    if c > i32::MAX as i64 || c < i32::MIN as i64 {
        com_printf("FixedDiv: divide by zero\n");
        return if c < 0 { Fixed::MIN } else { Fixed::MAX };
    }
    Fixed(c as i32)
}

// ============================================================
// Operators
// ============================================================

impl Add for Fixed {
    type Output = Fixed;
    #[inline]
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, rhs: Fixed) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    #[inline]
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_sub(rhs.0))
    }
}

impl SubAssign for Fixed {
    #[inline]
    fn sub_assign(&mut self, rhs: Fixed) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    #[inline]
    fn neg(self) -> Fixed {
        Fixed(self.0.wrapping_neg())
    }
}

impl Mul for Fixed {
    type Output = Fixed;
    #[inline]
    fn mul(self, rhs: Fixed) -> Fixed {
        fixed_mul(self, rhs)
    }
}

/// Scale by a plain integer.
impl Mul<i32> for Fixed {
    type Output = Fixed;
    #[inline]
    fn mul(self, rhs: i32) -> Fixed {
        Fixed(self.0.wrapping_mul(rhs))
    }
}

impl Div for Fixed {
    type Output = Fixed;
    #[inline]
    fn div(self, rhs: Fixed) -> Fixed {
        fixed_div(self, rhs)
    }
}

/// Divide by a plain integer. Truncates toward zero.
impl Div<i32> for Fixed {
    type Output = Fixed;
    #[inline]
    fn div(self, rhs: i32) -> Fixed {
        Fixed(self.0.wrapping_div(rhs))
    }
}

impl Shr<u32> for Fixed {
    type Output = Fixed;
    #[inline]
    fn shr(self, rhs: u32) -> Fixed {
        Fixed(self.0 >> rhs)
    }
}

impl Shl<u32> for Fixed {
    type Output = Fixed;
    #[inline]
    fn shl(self, rhs: u32) -> Fixed {
        Fixed(self.0.wrapping_shl(rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_int_to_int() {
        assert_eq!(Fixed::from_int(3).raw(), 3 * FRACUNIT);
        assert_eq!(Fixed::from_int(-7).to_int(), -7);
        assert_eq!(Fixed(-1).to_int(), -1);
    }

    #[test]
    fn test_mul_basic() {
        let half = Fixed(FRACUNIT / 2);
        assert_eq!(fixed_mul(Fixed::from_int(10), half), Fixed::from_int(5));
        assert_eq!(Fixed::from_int(-4) * Fixed::from_int(3), Fixed::from_int(-12));
    }

    #[test]
    fn test_mul_wraps_instead_of_saturating() {
        let big = Fixed::from_int(30000);
        let product = big * big;
        let expected = ((big.0 as i64 * big.0 as i64) >> FRACBITS) as i32;
        assert_eq!(product.raw(), expected);
        assert_ne!(product, Fixed::MAX);
    }

    #[test]
    fn test_div_basic() {
        assert_eq!(Fixed::from_int(10) / Fixed::from_int(4), Fixed(10 * FRACUNIT / 4));
        assert_eq!(Fixed::from_int(-9) / Fixed::from_int(3), Fixed::from_int(-3));
    }

    #[test]
    fn test_div_by_zero_saturates() {
        assert_eq!(fixed_div(Fixed::from_int(5), Fixed::ZERO), Fixed::MAX);
        assert_eq!(fixed_div(Fixed::from_int(-5), Fixed::ZERO), Fixed::MAX);
        assert_eq!(fixed_div(Fixed::ZERO, Fixed::ZERO), Fixed::MAX);
    }

    #[test]
    fn test_div_overflow_sign_rule() {
        // |a| >> 14 >= |b|
        let a = Fixed(1 << 20);
        let b = Fixed(64);
        assert_eq!(fixed_div(a, b), Fixed::MAX);
        assert_eq!(fixed_div(-a, b), Fixed::MIN);
        assert_eq!(fixed_div(a, -b), Fixed::MIN);
        assert_eq!(fixed_div(-a, -b), Fixed::MAX);
        assert_eq!(fixed_div(Fixed::MIN, Fixed(1)), Fixed::MIN);
    }

    #[test]
    fn test_scalar_ops() {
        assert_eq!(Fixed::from_int(3) * 4, Fixed::from_int(12));
        assert_eq!(Fixed::from_int(12) / 4, Fixed::from_int(3));
        assert_eq!(Fixed::from_int(1) >> 1, Fixed(FRACUNIT / 2));
        assert_eq!(-Fixed::MIN, Fixed::MIN);
    }

    proptest! {
        #[test]
        fn prop_div_saturates_on_boundary(a in any::<i32>(), b in any::<i32>()) {
            let q = fixed_div(Fixed(a), Fixed(b));
            if ((a as i64).abs() >> 14) >= (b as i64).abs() {
                let expected = if (a ^ b) < 0 { Fixed::MIN } else { Fixed::MAX };
                prop_assert_eq!(q, expected);
            }
        }

        #[test]
        fn prop_mul_div_round_trip(
            a in -(1i32 << 22)..(1i32 << 22),
            b in FRACUNIT..(64 * FRACUNIT),
            negate in any::<bool>(),
        ) {
            let b = if negate { -b } else { b };
            let (a, b) = (Fixed(a), Fixed(b));
            let m = fixed_mul(a, b);
            let back = fixed_div(m, b);
            prop_assert!((back.raw() as i64 - a.raw() as i64).abs() <= 1);

            let again = fixed_mul(back, b);
            let tolerance = (b.raw() as i64).abs() / FRACUNIT as i64 + 1;
            prop_assert!((again.raw() as i64 - m.raw() as i64).abs() <= tolerance);
        }
    }
}
