//! # Purchase Module
//!
//! Pricing and settlement for goods received from a supplier.
//!
//! Purchases are simpler than sales: no discount, no daily limit, and the
//! price is the buy price per dus. Whatever is not paid becomes hutang on
//! the supplier.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::quantity::Kuantitas;
use crate::types::StatusBayar;
use crate::validation::{validate_price, validate_quantity};
use crate::MAX_ITEM_PCS;

/// One received line on a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseLine {
    pub barang_id: String,
    #[serde(default)]
    pub jumlah_dus: i64,
    #[serde(default)]
    pub jumlah_pcs: i64,
    /// Buy price per dus on the supplier's invoice. Falls back to the
    /// barang's current harga_beli.
    #[serde(default)]
    pub harga_beli: Option<Money>,
}

impl PurchaseLine {
    pub fn kuantitas(&self) -> Kuantitas {
        Kuantitas::new(self.jumlah_dus, self.jumlah_pcs)
    }
}

/// Priced figures for one purchase line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseLineTotals {
    pub kuantitas: Kuantitas,
    pub total_pcs: i64,
    pub harga_beli: Money,
    pub total: Money,
}

/// How the initial payment settles a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseSettlement {
    pub dibayar: Money,
    pub sisa: Money,
    pub status_bayar: StatusBayar,
}

/// Prices a purchase line.
///
/// ## Example
/// ```rust
/// use niaga_core::purchase::{price_purchase_line, PurchaseLine};
/// use niaga_core::Money;
///
/// let line = PurchaseLine {
///     barang_id: "b1".into(),
///     jumlah_dus: 10,
///     jumlah_pcs: 12,
///     harga_beli: Some(Money::from_rupiah(96_000)),
/// };
/// let t = price_purchase_line(&line, 24, Money::from_rupiah(90_000)).unwrap();
/// assert_eq!(t.total_pcs, 252);
/// assert_eq!(t.total.rupiah(), 1_008_000);
/// ```
pub fn price_purchase_line(
    line: &PurchaseLine,
    isi_per_dus: i64,
    harga_beli_default: Money,
) -> CoreResult<PurchaseLineTotals> {
    validate_quantity(line.jumlah_dus, line.jumlah_pcs)?;

    let isi = isi_per_dus.max(1);
    let kuantitas = line.kuantitas();
    let total_pcs = kuantitas.total_pcs(isi);
    if total_pcs > MAX_ITEM_PCS {
        return Err(ValidationError::OutOfRange {
            field: "jumlah".to_string(),
            min: 1,
            max: MAX_ITEM_PCS,
        }
        .into());
    }

    let harga_beli = line.harga_beli.unwrap_or(harga_beli_default);
    validate_price("harga_beli", harga_beli)?;

    Ok(PurchaseLineTotals {
        kuantitas,
        total_pcs,
        harga_beli,
        total: kuantitas.price_for(harga_beli, isi),
    })
}

/// Total of a purchase.
pub fn summarize_purchase(lines: &[PurchaseLineTotals]) -> CoreResult<Money> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    Ok(lines.iter().map(|l| l.total).sum())
}

/// Settles the initial payment. Overpaying a supplier is rejected.
pub fn settle_purchase(total: Money, dibayar: Money) -> CoreResult<PurchaseSettlement> {
    if dibayar.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "dibayar".to_string(),
            min: 0,
            max: total.rupiah(),
        }
        .into());
    }
    if dibayar > total {
        return Err(CoreError::PaymentExceedsBalance {
            jumlah: dibayar,
            sisa: total,
        });
    }

    let sisa = total - dibayar;
    Ok(PurchaseSettlement {
        dibayar,
        sisa,
        status_bayar: StatusBayar::from_sisa(sisa),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(dus: i64, pcs: i64, harga: Option<i64>) -> PurchaseLine {
        PurchaseLine {
            barang_id: "b-kopi".to_string(),
            jumlah_dus: dus,
            jumlah_pcs: pcs,
            harga_beli: harga.map(Money::from_rupiah),
        }
    }

    #[test]
    fn test_price_uses_default_buy_price() {
        let t = price_purchase_line(&line(2, 0, None), 12, Money::from_rupiah(50_000)).unwrap();
        assert_eq!(t.harga_beli.rupiah(), 50_000);
        assert_eq!(t.total.rupiah(), 100_000);
        assert_eq!(t.total_pcs, 24);
    }

    #[test]
    fn test_price_apportions_loose_pieces() {
        // 3 of 12 at Rp 50.000 = 12.500
        let t = price_purchase_line(&line(0, 3, Some(50_000)), 12, Money::zero()).unwrap();
        assert_eq!(t.total.rupiah(), 12_500);
    }

    #[test]
    fn test_invalid_lines_rejected() {
        assert!(price_purchase_line(&line(0, 0, None), 12, Money::zero()).is_err());
        assert!(price_purchase_line(&line(1, 0, Some(-1)), 12, Money::zero()).is_err());
        assert!(price_purchase_line(&line(768_614_336_404_564_651, 0, None), 12, Money::zero()).is_err());
        assert!(matches!(
            price_purchase_line(&line(1, 0, Some(crate::MAX_HARGA + 1)), 12, Money::zero()),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(matches!(summarize_purchase(&[]), Err(CoreError::EmptyCart)));
    }

    #[test]
    fn test_settle_purchase() {
        let total = Money::from_rupiah(1_000_000);

        let s = settle_purchase(total, Money::from_rupiah(400_000)).unwrap();
        assert_eq!(s.sisa.rupiah(), 600_000);
        assert_eq!(s.status_bayar, StatusBayar::BelumLunas);

        let s = settle_purchase(total, total).unwrap();
        assert_eq!(s.sisa, Money::zero());
        assert_eq!(s.status_bayar, StatusBayar::Lunas);

        assert!(matches!(
            settle_purchase(total, Money::from_rupiah(1_000_001)),
            Err(CoreError::PaymentExceedsBalance { .. })
        ));
    }
}
