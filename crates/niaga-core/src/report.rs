//! # Report Module
//!
//! Report periods and the profit-and-loss computation. The aggregation itself
//! is SQL in `niaga-db`; this module only owns the arithmetic and the period
//! rules so that the JSON reports and the xlsx exports agree.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  penjualan (Σ total, after all discounts)                               │
//! │   − hpp     (Σ total_modal)                                             │
//! │   ─────────────────────                                                 │
//! │   = laba kotor                                                          │
//! │   − pengeluaran (Σ jumlah)                                              │
//! │   ─────────────────────                                                 │
//! │   = laba bersih                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::ValidationResult;

/// Longest period a report may cover.
pub const MAX_PERIODE_DAYS: i64 = 366;

// =============================================================================
// Periode
// =============================================================================

/// An inclusive range of business dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Periode {
    #[ts(as = "String")]
    pub dari: NaiveDate,
    #[ts(as = "String")]
    pub sampai: NaiveDate,
}

impl Periode {
    /// Creates a validated period.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use niaga_core::report::Periode;
    ///
    /// let d = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
    /// assert_eq!(Periode::new(d(1, 1), d(1, 31)).unwrap().days(), 31);
    /// assert!(Periode::new(d(2, 1), d(1, 1)).is_err());
    /// ```
    pub fn new(dari: NaiveDate, sampai: NaiveDate) -> ValidationResult<Self> {
        if dari > sampai {
            return Err(ValidationError::InvalidFormat {
                field: "dari".to_string(),
                reason: "must not be after sampai".to_string(),
            });
        }

        let days = (sampai - dari).num_days() + 1;
        if days > MAX_PERIODE_DAYS {
            return Err(ValidationError::OutOfRange {
                field: "periode".to_string(),
                min: 1,
                max: MAX_PERIODE_DAYS,
            });
        }

        Ok(Periode { dari, sampai })
    }

    /// A single business date.
    pub fn day(date: NaiveDate) -> Self {
        Periode {
            dari: date,
            sampai: date,
        }
    }

    /// Resolves optional query bounds. Missing `dari` defaults to the first
    /// day of `today`'s month; missing `sampai` defaults to `today`.
    pub fn resolve(
        dari: Option<NaiveDate>,
        sampai: Option<NaiveDate>,
        today: NaiveDate,
    ) -> ValidationResult<Self> {
        let dari = dari.unwrap_or_else(|| today.with_day(1).unwrap_or(today));
        let sampai = sampai.unwrap_or(today);
        Periode::new(dari, sampai)
    }

    /// Parses `YYYY-MM-DD` query values.
    pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
            ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "expected YYYY-MM-DD".to_string(),
            }
        })
    }

    /// Number of days covered, inclusive.
    pub fn days(&self) -> i64 {
        (self.sampai - self.dari).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dari <= date && date <= self.sampai
    }

    /// `20240101-20240131`, used in export file names.
    pub fn slug(&self) -> String {
        format!(
            "{}-{}",
            self.dari.format("%Y%m%d"),
            self.sampai.format("%Y%m%d")
        )
    }
}

impl std::fmt::Display for Periode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} s/d {}",
            self.dari.format("%d-%m-%Y"),
            self.sampai.format("%d-%m-%Y")
        )
    }
}

// =============================================================================
// Laba Rugi
// =============================================================================

/// Profit and loss over a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LabaRugi {
    /// Net sales after item and nota discounts.
    pub penjualan: Money,
    /// Discounts given (already deducted from `penjualan`).
    pub diskon: Money,
    /// Cost of goods sold.
    pub hpp: Money,
    pub laba_kotor: Money,
    pub pengeluaran: Money,
    pub laba_bersih: Money,
    /// Gross margin in basis points of `penjualan`.
    pub margin_kotor_bps: i64,
    /// Net margin in basis points of `penjualan`.
    pub margin_bersih_bps: i64,
}

impl LabaRugi {
    /// ## Example
    /// ```rust
    /// use niaga_core::report::LabaRugi;
    /// use niaga_core::Money;
    ///
    /// let lr = LabaRugi::compute(
    ///     Money::from_rupiah(1_000_000),
    ///     Money::from_rupiah(20_000),
    ///     Money::from_rupiah(800_000),
    ///     Money::from_rupiah(50_000),
    /// );
    /// assert_eq!(lr.laba_kotor.rupiah(), 200_000);
    /// assert_eq!(lr.laba_bersih.rupiah(), 150_000);
    /// assert_eq!(lr.margin_bersih_bps, 1_500);
    /// ```
    pub fn compute(penjualan: Money, diskon: Money, hpp: Money, pengeluaran: Money) -> Self {
        let laba_kotor = penjualan - hpp;
        let laba_bersih = laba_kotor - pengeluaran;
        LabaRugi {
            penjualan,
            diskon,
            hpp,
            laba_kotor,
            pengeluaran,
            laba_bersih,
            margin_kotor_bps: laba_kotor.margin_bps(penjualan),
            margin_bersih_bps: laba_bersih.margin_bps(penjualan),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_periode_bounds() {
        assert!(Periode::new(date(2024, 1, 1), date(2024, 12, 31)).is_ok()); // leap year, 366 days
        assert!(Periode::new(date(2023, 1, 1), date(2024, 1, 1)).is_ok());
        assert!(Periode::new(date(2023, 1, 1), date(2024, 1, 2)).is_err());
        assert!(Periode::new(date(2024, 3, 2), date(2024, 3, 1)).is_err());
        assert_eq!(Periode::day(date(2024, 3, 1)).days(), 1);
    }

    #[test]
    fn test_periode_resolve_defaults_to_month_to_date() {
        let today = date(2024, 3, 15);
        let p = Periode::resolve(None, None, today).unwrap();
        assert_eq!(p.dari, date(2024, 3, 1));
        assert_eq!(p.sampai, today);

        let p = Periode::resolve(Some(date(2024, 2, 10)), None, today).unwrap();
        assert_eq!(p.days(), 35);
        assert!(p.contains(date(2024, 2, 29)));
        assert!(!p.contains(date(2024, 3, 16)));
    }

    #[test]
    fn test_periode_format() {
        let p = Periode::new(date(2024, 1, 5), date(2024, 1, 31)).unwrap();
        assert_eq!(p.slug(), "20240105-20240131");
        assert_eq!(p.to_string(), "05-01-2024 s/d 31-01-2024");
        assert_eq!(Periode::parse_date("dari", "2024-01-05").unwrap(), date(2024, 1, 5));
        assert!(Periode::parse_date("dari", "05/01/2024").is_err());
    }

    #[test]
    fn test_laba_rugi_with_loss() {
        let lr = LabaRugi::compute(
            Money::from_rupiah(100_000),
            Money::zero(),
            Money::from_rupiah(90_000),
            Money::from_rupiah(30_000),
        );
        assert_eq!(lr.laba_kotor.rupiah(), 10_000);
        assert_eq!(lr.laba_bersih.rupiah(), -20_000);
        assert_eq!(lr.margin_kotor_bps, 1_000);
        assert_eq!(lr.margin_bersih_bps, -2_000);

        let empty = LabaRugi::compute(Money::zero(), Money::zero(), Money::zero(), Money::zero());
        assert_eq!(empty.margin_kotor_bps, 0);
    }
}
