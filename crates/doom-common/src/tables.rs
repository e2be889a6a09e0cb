// tables.rs — binary angles and the trigonometric lookup tables
//
// The full circle maps onto the whole u32 range, so angle arithmetic is
// plain modulo-2^32 wrapping. Tables are generated once at startup from
// double-precision trig and truncated to fixed point.

use std::f64::consts::PI;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::sync::OnceLock;

use crate::m_fixed::{Fixed, FRACBITS, FRACUNIT};

pub const FINEANGLES: usize = 8192;
pub const FINEMASK: usize = FINEANGLES - 1;

/// Shift from a 32-bit binary angle down to a fine table index.
pub const ANGLETOFINESHIFT: u32 = 19;

pub const SLOPERANGE: usize = 2048;
pub const SLOPEBITS: u32 = 11;
pub const DBITS: u32 = FRACBITS as u32 - SLOPEBITS;

pub const ANG45: Angle = Angle(0x2000_0000);
pub const ANG90: Angle = Angle(0x4000_0000);
pub const ANG180: Angle = Angle(0x8000_0000);
pub const ANG270: Angle = Angle(0xc000_0000);
pub const ANG1: Angle = Angle(ANG45.0 / 45);
pub const ANGLE_MAX: Angle = Angle(0xffff_ffff);

// ============================================================
// Angle
// ============================================================

/// Binary angle measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Angle(pub u32);

impl Angle {
    #[inline]
    pub const fn fine_index(self) -> usize {
        (self.0 >> ANGLETOFINESHIFT) as usize
    }

    #[inline]
    pub fn sin(self) -> Fixed {
        finesine(self.fine_index())
    }

    #[inline]
    pub fn cos(self) -> Fixed {
        finecosine(self.fine_index())
    }

    /// Tangent is periodic over a half circle; the table is indexed from -90
    /// degrees.
    #[inline]
    pub fn tan(self) -> Fixed {
        let idx = ((self + ANG90).0 >> ANGLETOFINESHIFT) as usize & (FINEANGLES / 2 - 1);
        finetangent(idx)
    }

    /// Map-thing angles are authored in whole degrees.
    pub fn from_degrees(deg: i32) -> Self {
        Angle((deg as u32).wrapping_mul(ANG1.0))
    }
}

impl Add for Angle {
    type Output = Angle;
    #[inline]
    fn add(self, rhs: Angle) -> Angle {
        Angle(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for Angle {
    #[inline]
    fn add_assign(&mut self, rhs: Angle) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl Sub for Angle {
    type Output = Angle;
    #[inline]
    fn sub(self, rhs: Angle) -> Angle {
        Angle(self.0.wrapping_sub(rhs.0))
    }
}

impl SubAssign for Angle {
    #[inline]
    fn sub_assign(&mut self, rhs: Angle) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl Neg for Angle {
    type Output = Angle;
    #[inline]
    fn neg(self) -> Angle {
        Angle(self.0.wrapping_neg())
    }
}

// ============================================================
// Lookup tables
// ============================================================

pub struct Tables {
    /// Five quarter-circles so that cosine is sine shifted by FINEANGLES/4.
    pub finesine: Vec<Fixed>,
    pub finetangent: Vec<Fixed>,
    pub tantoangle: Vec<Angle>,
}

impl Tables {
    fn generate() -> Self {
        let step = 2.0 * PI / FINEANGLES as f64;

        let finesine = (0..5 * FINEANGLES / 4)
            .map(|i| Fixed((FRACUNIT as f64 * ((i as f64 + 0.5) * step).sin()) as i32))
            .collect();

        let finetangent = (0..FINEANGLES / 2)
            .map(|i| {
                let a = (i as f64 - (FINEANGLES / 4) as f64 + 0.5) * step;
                Fixed((FRACUNIT as f64 * a.tan()) as i32)
            })
            .collect();

        let full_circle = 4_294_967_296.0f64;
        let tantoangle = (0..=SLOPERANGE)
            .map(|i| {
                let a = (i as f64 / SLOPERANGE as f64).atan();
                Angle((full_circle * a / (2.0 * PI)) as u32)
            })
            .collect();

        Self {
            finesine,
            finetangent,
            tantoangle,
        }
    }
}

static TABLES: OnceLock<Tables> = OnceLock::new();

/// The shared tables, generated on first use.
pub fn tables() -> &'static Tables {
    TABLES.get_or_init(Tables::generate)
}

#[inline]
pub fn finesine(i: usize) -> Fixed {
    tables().finesine[i & FINEMASK]
}

#[inline]
pub fn finecosine(i: usize) -> Fixed {
    tables().finesine[(i & FINEMASK) + FINEANGLES / 4]
}

#[inline]
pub fn finetangent(i: usize) -> Fixed {
    tables().finetangent[i]
}

#[inline]
pub fn tantoangle(i: usize) -> Angle {
    tables().tantoangle[i]
}

// ============================================================
// Point-to-angle approximation
// ============================================================

/// Slope index for `num / den`, clamped to `SLOPERANGE`.
pub fn slope_div(num: u32, den: u32) -> usize {
    if den < 512 {
        return SLOPERANGE;
    }
    let ans = num.wrapping_shl(3) / (den >> 8);
    (ans as usize).min(SLOPERANGE)
}

/// Angle of the vector (x, y) from the origin, resolved per octant.
pub fn point_to_angle(x: Fixed, y: Fixed) -> Angle {
    let (x, y) = (x.0, y.0);
    if x == 0 && y == 0 {
        return Angle(0);
    }

    if x >= 0 {
        let ux = x as u32;
        if y >= 0 {
            let uy = y as u32;
            if ux > uy {
                tantoangle(slope_div(uy, ux))
            } else {
                Angle(ANG90.0 - 1) - tantoangle(slope_div(ux, uy))
            }
        } else {
            let uy = y.wrapping_neg() as u32;
            if ux > uy {
                -tantoangle(slope_div(uy, ux))
            } else {
                ANG270 + tantoangle(slope_div(ux, uy))
            }
        }
    } else {
        let ux = x.wrapping_neg() as u32;
        if y >= 0 {
            let uy = y as u32;
            if ux > uy {
                Angle(ANG180.0 - 1) - tantoangle(slope_div(uy, ux))
            } else {
                ANG90 + tantoangle(slope_div(ux, uy))
            }
        } else {
            let uy = y.wrapping_neg() as u32;
            if ux > uy {
                ANG180 + tantoangle(slope_div(uy, ux))
            } else {
                Angle(ANG270.0 - 1) - tantoangle(slope_div(ux, uy))
            }
        }
    }
}

/// Angle from (x1, y1) to (x2, y2).
pub fn point_to_angle2(x1: Fixed, y1: Fixed, x2: Fixed, y2: Fixed) -> Angle {
    point_to_angle(x2 - x1, y2 - y1)
}

/// Cheap distance estimate: longer axis plus half the shorter one.
pub fn approx_distance(dx: Fixed, dy: Fixed) -> Fixed {
    let dx = dx.abs();
    let dy = dy.abs();
    if dx < dy {
        dx + dy - (dx >> 1)
    } else {
        dx + dy - (dy >> 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn near(a: Angle, b: Angle, slack: u32) -> bool {
        let d = (a - b).0;
        d <= slack || d >= 0u32.wrapping_sub(slack)
    }

    #[test]
    fn test_table_sizes() {
        let t = tables();
        assert_eq!(t.finesine.len(), 5 * FINEANGLES / 4);
        assert_eq!(t.finetangent.len(), FINEANGLES / 2);
        assert_eq!(t.tantoangle.len(), SLOPERANGE + 1);
    }

    #[test]
    fn test_known_values() {
        assert_eq!(finesine(0), Fixed(25));
        assert!((FRACUNIT - finesine(FINEANGLES / 4).0).abs() <= 1);
        assert!((FRACUNIT - Angle(0).cos().0).abs() <= 1);
        assert_eq!(tantoangle(0), Angle(0));
        assert!(near(tantoangle(SLOPERANGE), ANG45, 1));
        assert!(finetangent(0).0 < -100_000_000);
        assert!(finetangent(FINEANGLES / 2 - 1).0 > 100_000_000);
    }

    #[test]
    fn test_cosine_is_shifted_sine() {
        for i in [0usize, 1, 1000, 4096, FINEMASK] {
            assert_eq!(finecosine(i), tables().finesine[i + FINEANGLES / 4]);
        }
        assert!(ANG180.sin().0.abs() <= 26);
        assert!(ANG90.sin().0 > FRACUNIT - 2);
    }

    #[test]
    fn test_tan_half_circle_period() {
        let a = ANG45;
        assert_eq!(a.tan(), (a + ANG180).tan());
        assert!((a.tan().0 - FRACUNIT).abs() < 64);
    }

    #[test]
    fn test_point_to_angle_axes() {
        let one = Fixed::ONE;
        assert_eq!(point_to_angle(one, Fixed::ZERO), Angle(0));
        assert!(near(point_to_angle(Fixed::ZERO, one), ANG90, 1));
        assert!(near(point_to_angle(-one, Fixed::ZERO), ANG180, 1));
        assert!(near(point_to_angle(Fixed::ZERO, -one), ANG270, 1));
        assert!(near(point_to_angle(one, one), ANG45, 1 << 20));
        assert!(near(point_to_angle(-one, -one), ANG180 + ANG45, 1 << 20));
        assert_eq!(point_to_angle(Fixed::ZERO, Fixed::ZERO), Angle(0));
    }

    #[test]
    fn test_slope_div_clamps() {
        assert_eq!(slope_div(10, 100), SLOPERANGE);
        assert_eq!(slope_div(1 << 16, 1 << 16), SLOPERANGE);
        assert_eq!(slope_div(0, 1 << 16), 0);
    }

    #[test]
    fn test_approx_distance() {
        let d = approx_distance(Fixed::from_int(3), Fixed::from_int(-4));
        assert_eq!(d, Fixed::from_int(4) + Fixed::from_int(3) - Fixed::from_int(3) / 2);
    }

    #[test]
    fn test_from_degrees() {
        assert!(near(Angle::from_degrees(90), ANG90, 90));
        assert!(near(Angle::from_degrees(360), Angle(0), 360));
    }

    proptest! {
        #[test]
        fn prop_angle_wraps_modulo_full_circle(a in any::<u32>(), k in -8i64..8) {
            let turn = Angle((k.wrapping_mul(1i64 << 32)) as u32);
            prop_assert_eq!(Angle(a) + turn, Angle(a));
            prop_assert_eq!(Angle(a).sin(), (Angle(a) + turn).sin());
        }

        #[test]
        fn prop_sin_cos_unit_circle(a in any::<u32>()) {
            let s = Angle(a).sin().to_f64();
            let c = Angle(a).cos().to_f64();
            prop_assert!((s * s + c * c - 1.0).abs() < 1e-3);
        }

        #[test]
        fn prop_opposite_vectors_differ_by_half_turn(
            x in -(1i32 << 24)..(1i32 << 24),
            y in -(1i32 << 24)..(1i32 << 24),
        ) {
            prop_assume!(x.abs() >= 1024 || y.abs() >= 1024);
            let a = point_to_angle(Fixed(x), Fixed(y));
            let b = point_to_angle(Fixed(-x), Fixed(-y));
            prop_assert!(near(b - a, ANG180, 1 << 22));
        }
    }
}
