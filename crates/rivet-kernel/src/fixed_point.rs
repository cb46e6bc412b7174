//! 17.14 signed fixed-point numbers for the MLFQS load and CPU estimates.
//!
//! Every operation that divides (fixed × fixed, fixed ÷ fixed, fixed ÷ int and
//! the rounding conversion to int) rounds to the nearest representable value,
//! ties away from zero. Scheduling decisions depend on these values, so the
//! rounding has to be the same on every run.

use core::fmt;
use core::ops::{Add, Div, Mul, Neg, Sub};

/// Number of fractional bits.
pub const FRACTION_BITS: u32 = 14;

const F: i64 = 1 << FRACTION_BITS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed(i32);

/// `n / d` rounded to nearest, ties away from zero.
fn div_round(n: i64, d: i64) -> i64 {
    let half = d.abs() / 2;
    if n >= 0 {
        (n + half) / d
    } else {
        (n - half) / d
    }
}

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);

    pub const fn from_int(n: i32) -> Self {
        Fixed(n << FRACTION_BITS)
    }

    pub const fn from_raw(raw: i32) -> Self {
        Fixed(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    /// `num / den` as a fixed-point value.
    pub fn ratio(num: i32, den: i32) -> Self {
        Fixed::from_int(num) / den
    }

    /// Nearest integer, ties away from zero.
    pub fn round(self) -> i32 {
        div_round(self.0 as i64, F) as i32
    }

    /// `100 × self`, rounded. The form load averages are usually reported in.
    pub fn x100(self) -> i32 {
        (self * 100).round()
    }
}

impl Add for Fixed {
    type Output = Fixed;
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 + rhs.0)
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 - rhs.0)
    }
}

impl Mul for Fixed {
    type Output = Fixed;
    fn mul(self, rhs: Fixed) -> Fixed {
        Fixed(div_round(self.0 as i64 * rhs.0 as i64, F) as i32)
    }
}

impl Div for Fixed {
    type Output = Fixed;
    fn div(self, rhs: Fixed) -> Fixed {
        Fixed(div_round(self.0 as i64 * F, rhs.0 as i64) as i32)
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

impl Add<i32> for Fixed {
    type Output = Fixed;
    fn add(self, rhs: i32) -> Fixed {
        self + Fixed::from_int(rhs)
    }
}

impl Sub<i32> for Fixed {
    type Output = Fixed;
    fn sub(self, rhs: i32) -> Fixed {
        self - Fixed::from_int(rhs)
    }
}

impl Mul<i32> for Fixed {
    type Output = Fixed;
    fn mul(self, rhs: i32) -> Fixed {
        Fixed(self.0 * rhs)
    }
}

impl Div<i32> for Fixed {
    type Output = Fixed;
    fn div(self, rhs: i32) -> Fixed {
        Fixed(div_round(self.0 as i64, rhs as i64) as i32)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hundredths = self.x100();
        let sign = if hundredths < 0 { "-" } else { "" };
        let abs = hundredths.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn conversions_round_half_away_from_zero() {
        assert_eq!(Fixed::ratio(3, 2).round(), 2);
        assert_eq!(Fixed::ratio(-3, 2).round(), -2);
        assert_eq!(Fixed::ratio(5, 4).round(), 1);
        assert_eq!(Fixed::ratio(-5, 4).round(), -1);
        assert_eq!(Fixed::ratio(7, 4).round(), 2);
    }

    #[test]
    fn int_round_trip_is_exact() {
        for n in [-131_072 / 2, -63, -1, 0, 1, 31, 63, 65_535] {
            assert_eq!(Fixed::from_int(n).round(), n);
        }
    }

    #[test]
    fn mixed_arithmetic() {
        let x = Fixed::from_int(10);
        assert_eq!((x + 5).round(), 15);
        assert_eq!((x - 15).round(), -5);
        assert_eq!((x * 3).round(), 30);
        assert_eq!((x / 4).x100(), 250);
        assert_eq!((x / 3).x100(), 333);
        assert_eq!((-x / 3).x100(), -333);
    }

    #[test]
    fn fixed_division_rounds_the_last_bit() {
        // 1/3 in 14 fractional bits is 5461.33.., 2/3 is 10922.66..
        assert_eq!(Fixed::ratio(1, 3).raw(), 5461);
        assert_eq!(Fixed::ratio(2, 3).raw(), 10923);
        assert_eq!((Fixed::from_int(2) / Fixed::from_int(3)).raw(), 10923);
        assert_eq!((Fixed::from_int(-2) / Fixed::from_int(3)).raw(), -10923);
    }

    #[test]
    fn fixed_multiplication_rounds_the_last_bit() {
        // 0.5 ulp product: raw 1 * raw 8192 = 8192 / 16384 = 0.5 -> 1.
        assert_eq!((Fixed::from_raw(1) * Fixed::from_raw(8192)).raw(), 1);
        assert_eq!((Fixed::from_raw(-1) * Fixed::from_raw(8192)).raw(), -1);
        assert_eq!((Fixed::from_raw(1) * Fixed::from_raw(8191)).raw(), 0);
    }

    #[test]
    fn load_average_coefficients() {
        let a = Fixed::ratio(59, 60);
        let b = Fixed::ratio(1, 60);
        assert_eq!(a.raw(), 16111);
        assert_eq!(b.raw(), 273);
        assert_eq!((a + b).round(), 1);
    }

    #[test]
    fn display_shows_hundredths() {
        assert_eq!(Fixed::ratio(1, 60).to_string(), "0.02");
        assert_eq!(Fixed::ratio(-7, 4).to_string(), "-1.75");
        assert_eq!(Fixed::from_int(63).to_string(), "63.00");
    }

    proptest! {
        #[test]
        fn round_is_nearest(raw in -(1i32 << 30)..(1i32 << 30)) {
            let x = Fixed::from_raw(raw);
            let exact = raw as f64 / F as f64;
            let r = x.round() as f64;
            prop_assert!((r - exact).abs() <= 0.5);
            // ties go away from zero
            if (exact.fract().abs() - 0.5).abs() < f64::EPSILON {
                prop_assert!(r.abs() > exact.abs());
            }
        }

        #[test]
        fn multiply_is_within_half_ulp(a in -(1i32 << 20)..(1i32 << 20), b in -(1i32 << 20)..(1i32 << 20)) {
            let got = (Fixed::from_raw(a) * Fixed::from_raw(b)).raw() as f64;
            let exact = a as f64 * b as f64 / F as f64;
            prop_assert!((got - exact).abs() <= 0.5);
        }

        #[test]
        fn divide_by_int_is_within_half_ulp(a in -(1i32 << 30)..(1i32 << 30), n in 1i32..1000) {
            let got = (Fixed::from_raw(a) / n).raw() as f64;
            let exact = a as f64 / n as f64;
            prop_assert!((got - exact).abs() <= 0.5);
        }
    }
}
