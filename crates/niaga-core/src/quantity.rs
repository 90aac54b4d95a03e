//! # Quantity Module
//!
//! Goods are bought and sold by the case (dus) and by the loose piece (pcs).
//! Stock is always counted in pieces; prices are always quoted per dus.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Barang: Susu UHT 200ml, isi_per_dus = 24, harga_jual = Rp 120.000     │
//! │                                                                         │
//! │  Kuantitas { dus: 2, pcs: 5 }                                           │
//! │       │                                                                 │
//! │       ├── total_pcs(24)  = 2 × 24 + 5            = 53 pcs              │
//! │       │                                                                 │
//! │       └── price_for(120.000, 24)                                        │
//! │                = 2 × 120.000 + prorate(120.000, 5, 24)                  │
//! │                = 240.000 + 25.000                = Rp 265.000          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// A dus/pcs quantity as entered at the counter.
///
/// `pcs` may exceed `isi_per_dus`; it is not normalised on input because the
/// cashier's entry is kept verbatim on the nota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Kuantitas {
    pub dus: i64,
    pub pcs: i64,
}

impl Kuantitas {
    pub const fn new(dus: i64, pcs: i64) -> Self {
        Kuantitas { dus, pcs }
    }

    /// Normalises a piece count into whole cases plus the remainder.
    ///
    /// ## Example
    /// ```rust
    /// use niaga_core::quantity::Kuantitas;
    ///
    /// assert_eq!(Kuantitas::from_pcs(53, 24), Kuantitas::new(2, 5));
    /// assert_eq!(Kuantitas::from_pcs(7, 1), Kuantitas::new(7, 0));
    /// ```
    pub fn from_pcs(total_pcs: i64, isi_per_dus: i64) -> Self {
        let isi = isi_per_dus.max(1);
        Kuantitas {
            dus: total_pcs / isi,
            pcs: total_pcs % isi,
        }
    }

    /// Total pieces represented by this quantity.
    ///
    /// Saturates at `i64::MAX` so an absurd entry fails the range check
    /// instead of wrapping.
    #[inline]
    pub fn total_pcs(&self, isi_per_dus: i64) -> i64 {
        self.dus
            .saturating_mul(isi_per_dus.max(1))
            .saturating_add(self.pcs)
    }

    /// True when nothing was entered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dus == 0 && self.pcs == 0
    }

    /// Apportions a per-dus amount over this quantity.
    ///
    /// Whole cases are charged at the full amount; loose pieces are charged
    /// `amount × pcs / isi_per_dus`, rounded once. The same function prices the
    /// sell price, the buy price (modal) and the per-dus discount so that
    /// `total − modal` always equals the line's laba exactly.
    pub fn price_for(&self, per_dus: Money, isi_per_dus: i64) -> Money {
        per_dus * self.dus + per_dus.prorate(self.pcs, isi_per_dus.max(1))
    }

    /// Adds two quantities entered for the same barang.
    pub fn combine(self, other: Kuantitas) -> Kuantitas {
        Kuantitas {
            dus: self.dus + other.dus,
            pcs: self.pcs + other.pcs,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pcs() {
        assert_eq!(Kuantitas::new(2, 5).total_pcs(24), 53);
        assert_eq!(Kuantitas::new(0, 5).total_pcs(24), 5);
        assert_eq!(Kuantitas::new(3, 0).total_pcs(1), 3);
        // isi_per_dus of zero is treated as one piece per case
        assert_eq!(Kuantitas::new(3, 1).total_pcs(0), 4);
        assert_eq!(Kuantitas::new(768_614_336_404_564_651, 0).total_pcs(24), i64::MAX);
    }

    #[test]
    fn test_price_for_splits_case_and_pieces() {
        let harga = Money::from_rupiah(120_000);
        assert_eq!(Kuantitas::new(2, 5).price_for(harga, 24).rupiah(), 265_000);
        assert_eq!(Kuantitas::new(0, 1).price_for(harga, 24).rupiah(), 5_000);
        assert_eq!(Kuantitas::new(1, 0).price_for(harga, 24).rupiah(), 120_000);
    }

    #[test]
    fn test_price_for_rounds_pieces_once() {
        // 7 of 24 at Rp 100.000 = 29166.67 → 29167
        let harga = Money::from_rupiah(100_000);
        assert_eq!(Kuantitas::new(1, 7).price_for(harga, 24).rupiah(), 129_167);
    }

    #[test]
    fn test_combine_and_empty() {
        let q = Kuantitas::new(1, 3).combine(Kuantitas::new(0, 4));
        assert_eq!(q, Kuantitas::new(1, 7));
        assert!(Kuantitas::default().is_empty());
        assert!(!q.is_empty());
    }
}
