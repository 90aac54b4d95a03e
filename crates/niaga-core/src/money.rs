//! # Money
//!
//! Rupiah amounts as whole integers. Rupiah has no minor unit in practice,
//! so there is nothing after the decimal point to lose; the only rounding in
//! the whole system is [`Money::prorate`], which prices loose pieces out of
//! a per-dus amount.
//!
//! ```text
//!   harga per dus   100.000     isi_per_dus 24     7 pcs
//!   7/24 × 100.000 = 29.166,67  ──prorate──►  29.167
//! ```
//!
//! ```rust
//! use niaga_core::money::Money;
//!
//! let harga = Money::from_rupiah(12_500);
//! let total = harga * 4 + Money::from_rupiah(1_000);
//! assert_eq!(total.rupiah(), 51_000);
//! assert_eq!(total.to_string(), "Rp 51.000");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Whole rupiah. Signed, because reversals and losses go below zero.
///
/// Serialises as a bare JSON number and maps to an SQLite `INTEGER`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_rupiah(rupiah: i64) -> Self {
        Money(rupiah)
    }

    #[inline]
    pub const fn rupiah(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Floors at zero. `sisa` and `kembalian` are never negative.
    #[inline]
    pub fn non_negative(self) -> Self {
        Money(self.0.max(0))
    }

    /// `self × numerator / denominator`, rounded half away from zero.
    ///
    /// Computed in `i128` so a large price times a large count cannot
    /// overflow before the division. A zero denominator yields zero.
    ///
    /// ```rust
    /// use niaga_core::money::Money;
    ///
    /// // 7 pcs of a Rp 100.000 case holding 24 pcs
    /// assert_eq!(Money::from_rupiah(100_000).prorate(7, 24).rupiah(), 29_167);
    /// ```
    pub fn prorate(&self, numerator: i64, denominator: i64) -> Money {
        if denominator == 0 {
            return Money::zero();
        }
        let product = i128::from(self.0) * i128::from(numerator);
        let divisor = i128::from(denominator);

        let magnitude = (product.abs() * 2 + divisor.abs()) / (divisor.abs() * 2);
        let signed = if (product < 0) != (divisor < 0) {
            -magnitude
        } else {
            magnitude
        };
        Money(signed as i64)
    }

    /// `self / base` in basis points, e.g. laba over omzet. `1250` is 12,50%.
    pub fn margin_bps(&self, base: Money) -> i64 {
        if base.is_zero() {
            return 0;
        }
        Money(10_000).prorate(self.0, base.0).0
    }
}

/// `Rp 1.250.000`, `-Rp 5.000`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let head = digits.len() % 3;

        if self.0 < 0 {
            f.write_str("-")?;
        }
        f.write_str("Rp ")?;
        f.write_str(&digits[..head])?;
        for (n, group) in digits.as_bytes()[head..].chunks(3).enumerate() {
            if head > 0 || n > 0 {
                f.write_str(".")?;
            }
            // Chunks of an ASCII digit string are valid UTF-8.
            f.write_str(std::str::from_utf8(group).map_err(|_| fmt::Error)?)?;
        }
        Ok(())
    }
}

macro_rules! money_binop {
    ($op:ident, $method:ident, $assign:ident, $assign_method:ident, $sym:tt) => {
        impl $op for Money {
            type Output = Money;

            #[inline]
            fn $method(self, rhs: Money) -> Money {
                Money(self.0 $sym rhs.0)
            }
        }

        impl $assign for Money {
            #[inline]
            fn $assign_method(&mut self, rhs: Money) {
                *self = *self $sym rhs;
            }
        }
    };
}

money_binop!(Add, add, AddAssign, add_assign, +);
money_binop!(Sub, sub, SubAssign, sub_assign, -);

impl Neg for Money {
    type Output = Money;

    #[inline]
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

/// Price per dus times a number of dus.
impl Mul<i64> for Money {
    type Output = Money;

    #[inline]
    fn mul(self, qty: i64) -> Money {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        Money(iter.map(|m| m.0).sum())
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_rupiah(0).to_string(), "Rp 0");
        assert_eq!(Money::from_rupiah(999).to_string(), "Rp 999");
        assert_eq!(Money::from_rupiah(1_000).to_string(), "Rp 1.000");
        assert_eq!(Money::from_rupiah(120_000).to_string(), "Rp 120.000");
        assert_eq!(Money::from_rupiah(1_250_000).to_string(), "Rp 1.250.000");
        assert_eq!(Money::from_rupiah(-5_000).to_string(), "-Rp 5.000");
    }

    #[test]
    fn test_arithmetic() {
        let dus = Money::from_rupiah(10_000);
        let diskon = Money::from_rupiah(2_500);

        assert_eq!((dus + diskon).rupiah(), 12_500);
        assert_eq!((dus - diskon).rupiah(), 7_500);
        assert_eq!((dus * 3).rupiah(), 30_000);
        assert_eq!((-dus).rupiah(), -10_000);

        let mut running = dus;
        running -= diskon;
        running += diskon * 2;
        assert_eq!(running.rupiah(), 12_500);

        let total: Money = [dus, diskon, diskon].iter().sum();
        assert_eq!(total.rupiah(), 15_000);
    }

    #[test]
    fn test_prorate_rounds_half_away_from_zero() {
        assert_eq!(Money::from_rupiah(100_000).prorate(12, 24).rupiah(), 50_000);
        // 4166,67
        assert_eq!(Money::from_rupiah(100_000).prorate(1, 24).rupiah(), 4_167);
        // 1250,5
        assert_eq!(Money::from_rupiah(10_004).prorate(1, 8).rupiah(), 1_251);
        assert_eq!(Money::from_rupiah(-10_004).prorate(1, 8).rupiah(), -1_251);
        assert_eq!(Money::from_rupiah(10_000).prorate(1, 0).rupiah(), 0);
    }

    #[test]
    fn test_margin_bps() {
        let omzet = Money::from_rupiah(300_000);
        assert_eq!(Money::from_rupiah(100_000).margin_bps(omzet), 3_333);
        assert_eq!(Money::from_rupiah(-30_000).margin_bps(omzet), -1_000);
        assert_eq!(Money::from_rupiah(5).margin_bps(Money::zero()), 0);
    }

    #[test]
    fn test_non_negative_and_ordering() {
        assert_eq!(Money::from_rupiah(-1).non_negative(), Money::zero());
        assert_eq!(Money::from_rupiah(7).non_negative().rupiah(), 7);
        assert_eq!(Money::from_rupiah(3).max(Money::from_rupiah(9)).rupiah(), 9);
        assert_eq!(Money::from_rupiah(3).min(Money::from_rupiah(9)).rupiah(), 3);
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let json = serde_json::to_string(&Money::from_rupiah(15_000)).unwrap();
        assert_eq!(json, "15000");
        let back: Money = serde_json::from_str("15000").unwrap();
        assert_eq!(back.rupiah(), 15_000);
    }
}
