//! # Checkout Module
//!
//! The pure half of the checkout/edit pipeline. The database layer reads the
//! rows inside a transaction, hands them to these functions, and writes back
//! whatever they return.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartLine[]                                                             │
//! │       │  merge_lines()      same barang + price + discount → one line  │
//! │       ▼                                                                 │
//! │  BarangSnapshot (read in the transaction)                               │
//! │       │  check_stock()      stok + returned ≥ requested                │
//! │       │  check_daily_limit() terjual + requested ≤ limit_harian         │
//! │       ▼                                                                 │
//! │  price_line()               subtotal / diskon / total / modal / laba    │
//! │       ▼                                                                 │
//! │  summarize()                header totals, nota discount               │
//! │       ▼                                                                 │
//! │  settle()                   dibayar / sisa / kembalian / status_bayar  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::quantity::Kuantitas;
use crate::types::{Barang, Customer, Metode, StatusBayar};
use crate::validation::{cart_size_ok, validate_price, validate_quantity};
use crate::MAX_ITEM_PCS;

// =============================================================================
// Inputs
// =============================================================================

/// One line of a cart as posted by the kasir screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub barang_id: String,
    #[serde(default)]
    pub jumlah_dus: i64,
    #[serde(default)]
    pub jumlah_pcs: i64,
    /// Overrides the catalogue sell price per dus (negotiated price).
    #[serde(default)]
    pub harga_jual: Option<Money>,
    /// Discount per dus, apportioned to loose pieces like the price.
    #[serde(default)]
    pub diskon_per_dus: Money,
}

impl CartLine {
    pub fn kuantitas(&self) -> Kuantitas {
        Kuantitas::new(self.jumlah_dus, self.jumlah_pcs)
    }
}

/// The barang row as read inside the checkout transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarangSnapshot {
    pub id: String,
    pub kode: String,
    pub nama: String,
    pub isi_per_dus: i64,
    pub harga_beli: Money,
    pub harga_jual: Money,
    pub stok: i64,
    pub limit_harian: i64,
}

impl From<&Barang> for BarangSnapshot {
    fn from(b: &Barang) -> Self {
        BarangSnapshot {
            id: b.id.clone(),
            kode: b.kode.clone(),
            nama: b.nama.clone(),
            isi_per_dus: b.isi_per_dus.max(1),
            harga_beli: b.harga_beli,
            harga_jual: b.harga_jual,
            stok: b.stok,
            limit_harian: b.limit_harian,
        }
    }
}

/// What settlement needs to know about the customer.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerCredit {
    pub nama: String,
    /// Zero means unlimited.
    pub limit_piutang: Money,
    /// Current receivable, excluding the nota being settled.
    pub piutang: Money,
}

impl From<&Customer> for CustomerCredit {
    fn from(c: &Customer) -> Self {
        CustomerCredit {
            nama: c.nama.clone(),
            limit_piutang: c.limit_piutang,
            piutang: c.piutang,
        }
    }
}

// =============================================================================
// Outputs
// =============================================================================

/// Priced figures for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineTotals {
    pub kuantitas: Kuantitas,
    pub total_pcs: i64,
    pub harga_jual: Money,
    pub harga_beli: Money,
    pub diskon_per_dus: Money,
    /// Sell price over the quantity, before discount.
    pub subtotal: Money,
    pub diskon: Money,
    /// `subtotal − diskon`.
    pub total: Money,
    /// Buy price over the quantity.
    pub modal: Money,
    /// `total − modal`.
    pub laba: Money,
}

/// A priced line together with the barang it was priced against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedLine {
    pub barang: BarangSnapshot,
    pub totals: LineTotals,
}

/// Header totals of a nota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutSummary {
    pub subtotal: Money,
    pub diskon_item: Money,
    pub diskon_nota: Money,
    pub total: Money,
    pub total_modal: Money,
    pub laba: Money,
}

/// How the payment at checkout settles the nota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Settlement {
    /// Amount applied to the nota (capped at the total).
    pub dibayar: Money,
    /// Outstanding balance that becomes piutang.
    pub sisa: Money,
    /// Change returned for cash overpayment.
    pub kembalian: Money,
    pub status_bayar: StatusBayar,
}

// =============================================================================
// Pipeline Steps
// =============================================================================

/// Validates the cart and merges lines for the same barang at the same price
/// and discount. Order of first appearance is preserved.
pub fn merge_lines(lines: Vec<CartLine>) -> CoreResult<Vec<CartLine>> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        validate_line(&line)?;

        match merged.iter_mut().find(|m| {
            m.barang_id == line.barang_id
                && m.harga_jual == line.harga_jual
                && m.diskon_per_dus == line.diskon_per_dus
        }) {
            Some(existing) => {
                existing.jumlah_dus += line.jumlah_dus;
                existing.jumlah_pcs += line.jumlah_pcs;
            }
            None => merged.push(line),
        }
    }

    if !cart_size_ok(merged.len()) {
        return Err(CoreError::CartTooLarge {
            max: crate::MAX_CART_ITEMS,
        });
    }

    Ok(merged)
}

fn validate_line(line: &CartLine) -> CoreResult<()> {
    if line.barang_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "barang_id".to_string(),
        }
        .into());
    }
    validate_quantity(line.jumlah_dus, line.jumlah_pcs)?;
    if let Some(harga_jual) = line.harga_jual {
        validate_price("harga_jual", harga_jual)?;
    }
    validate_price("diskon_per_dus", line.diskon_per_dus)?;
    Ok(())
}

/// Prices one line against its barang.
///
/// ## Example
/// ```rust
/// use niaga_core::checkout::{price_line, BarangSnapshot, CartLine};
/// use niaga_core::Money;
///
/// let barang = BarangSnapshot {
///     id: "b1".into(),
///     kode: "SUSU-01".into(),
///     nama: "Susu UHT".into(),
///     isi_per_dus: 24,
///     harga_beli: Money::from_rupiah(96_000),
///     harga_jual: Money::from_rupiah(120_000),
///     stok: 100,
///     limit_harian: 0,
/// };
/// let line = CartLine {
///     barang_id: "b1".into(),
///     jumlah_dus: 1,
///     jumlah_pcs: 12,
///     harga_jual: None,
///     diskon_per_dus: Money::from_rupiah(2_000),
/// };
///
/// let t = price_line(&line, &barang).unwrap();
/// assert_eq!(t.subtotal.rupiah(), 180_000); // 120.000 + 60.000
/// assert_eq!(t.diskon.rupiah(), 3_000);     //   2.000 +  1.000
/// assert_eq!(t.modal.rupiah(), 144_000);    //  96.000 + 48.000
/// assert_eq!(t.laba.rupiah(), 33_000);
/// ```
pub fn price_line(line: &CartLine, barang: &BarangSnapshot) -> CoreResult<LineTotals> {
    let isi = barang.isi_per_dus.max(1);
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

    let harga_jual = line.harga_jual.unwrap_or(barang.harga_jual);
    let subtotal = kuantitas.price_for(harga_jual, isi);
    let diskon = kuantitas.price_for(line.diskon_per_dus, isi);

    if diskon > subtotal {
        return Err(CoreError::DiscountTooLarge {
            diskon,
            harga: subtotal,
        });
    }

    let total = subtotal - diskon;
    let modal = kuantitas.price_for(barang.harga_beli, isi);

    Ok(LineTotals {
        kuantitas,
        total_pcs,
        harga_jual,
        harga_beli: barang.harga_beli,
        diskon_per_dus: line.diskon_per_dus,
        subtotal,
        diskon,
        total,
        modal,
        laba: total - modal,
    })
}

/// Sums priced lines into header totals and applies the nota discount.
///
/// The nota discount reduces laba one-for-one: it is revenue given away, not
/// a change in the cost of goods.
pub fn summarize(lines: &[LineTotals], diskon_nota: Money) -> CoreResult<CheckoutSummary> {
    if diskon_nota.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "diskon_nota".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into());
    }

    let subtotal: Money = lines.iter().map(|l| l.subtotal).sum();
    let diskon_item: Money = lines.iter().map(|l| l.diskon).sum();
    let line_total: Money = lines.iter().map(|l| l.total).sum();
    let total_modal: Money = lines.iter().map(|l| l.modal).sum();

    if diskon_nota > line_total {
        return Err(CoreError::DiscountTooLarge {
            diskon: diskon_nota,
            harga: line_total,
        });
    }

    let total = line_total - diskon_nota;

    Ok(CheckoutSummary {
        subtotal,
        diskon_item,
        diskon_nota,
        total,
        total_modal,
        laba: total - total_modal,
    })
}

/// Prices every line of a merged cart against the snapshots read for it.
///
/// Missing snapshots mean the barang does not exist or is inactive.
pub fn price_cart(
    lines: &[CartLine],
    snapshots: &BTreeMap<String, BarangSnapshot>,
    diskon_nota: Money,
) -> CoreResult<(Vec<PricedLine>, CheckoutSummary)> {
    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let barang = snapshots
            .get(&line.barang_id)
            .ok_or_else(|| CoreError::BarangNotFound(line.barang_id.clone()))?;
        let totals = price_line(line, barang)?;
        priced.push(PricedLine {
            barang: barang.clone(),
            totals,
        });
    }

    let totals: Vec<LineTotals> = priced.iter().map(|p| p.totals).collect();
    let summary = summarize(&totals, diskon_nota)?;
    Ok((priced, summary))
}

/// Pieces requested per barang across all lines (a barang can appear on more
/// than one line when the lines carry different prices).
pub fn requested_pcs(lines: &[PricedLine]) -> BTreeMap<String, i64> {
    let mut out = BTreeMap::new();
    for line in lines {
        *out.entry(line.barang.id.clone()).or_insert(0) += line.totals.total_pcs;
    }
    out
}

/// Checks that the stock covers the requested pieces.
///
/// `returned_pcs` is what an edited nota gives back before taking again.
pub fn check_stock(barang: &BarangSnapshot, requested_pcs: i64, returned_pcs: i64) -> CoreResult<()> {
    let tersedia = barang.stok + returned_pcs;
    if requested_pcs > tersedia {
        return Err(CoreError::InsufficientStock {
            kode: barang.kode.clone(),
            tersedia,
            diminta: requested_pcs,
        });
    }
    Ok(())
}

/// Checks the per-barang daily sales cap.
///
/// `sold_today_pcs` must exclude the nota being edited.
pub fn check_daily_limit(
    barang: &BarangSnapshot,
    sold_today_pcs: i64,
    requested_pcs: i64,
) -> CoreResult<()> {
    if barang.limit_harian <= 0 {
        return Ok(());
    }
    if sold_today_pcs + requested_pcs > barang.limit_harian {
        return Err(CoreError::DailyLimitExceeded {
            kode: barang.kode.clone(),
            limit: barang.limit_harian,
            terjual: sold_today_pcs,
            diminta: requested_pcs,
        });
    }
    Ok(())
}

/// Settles the amount paid against the nota total.
///
/// ## Rules
/// ```text
/// dibayar ≥ total, tunai     → lunas, kembalian = dibayar − total
/// dibayar > total, non-tunai → rejected (transfers are exact)
/// dibayar < total            → belum lunas, sisa = total − dibayar
///                              requires a customer within limit_piutang
/// ```
pub fn settle(
    total: Money,
    dibayar: Money,
    metode: Metode,
    customer: Option<&CustomerCredit>,
) -> CoreResult<Settlement> {
    if dibayar.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "dibayar".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into());
    }

    if dibayar > total && metode != Metode::Tunai {
        return Err(CoreError::PaymentExceedsBalance {
            jumlah: dibayar,
            sisa: total,
        });
    }

    let applied = dibayar.min(total);
    let kembalian = (dibayar - total).non_negative();
    let sisa = (total - applied).non_negative();

    if sisa.is_positive() {
        let customer = customer.ok_or(CoreError::CreditNotAllowed { sisa })?;
        let piutang_baru = customer.piutang + sisa;
        if customer.limit_piutang.is_positive() && piutang_baru > customer.limit_piutang {
            return Err(CoreError::CreditLimitExceeded {
                customer: customer.nama.clone(),
                limit: customer.limit_piutang,
                piutang_baru,
            });
        }
    }

    Ok(Settlement {
        dibayar: applied,
        sisa,
        kembalian,
        status_bayar: StatusBayar::from_sisa(sisa),
    })
}

/// Re-settles an edited nota against what has already been paid.
///
/// `sudah_dibayar` is what the nota currently holds, net of any kembalian
/// already handed back. When the new total falls below it, the surplus is
/// returned and reported as kembalian.
pub fn resettle(
    total: Money,
    sudah_dibayar: Money,
    customer: Option<&CustomerCredit>,
) -> CoreResult<Settlement> {
    settle(total, sudah_dibayar, Metode::Tunai, customer)
}

/// Validates a later payment against an open balance.
pub fn check_payment(jumlah: Money, sisa: Money) -> CoreResult<()> {
    if !jumlah.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "jumlah".to_string(),
        }
        .into());
    }
    if jumlah > sisa {
        return Err(CoreError::PaymentExceedsBalance { jumlah, sisa });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn susu() -> BarangSnapshot {
        BarangSnapshot {
            id: "b-susu".to_string(),
            kode: "SUSU-01".to_string(),
            nama: "Susu UHT 200ml".to_string(),
            isi_per_dus: 24,
            harga_beli: Money::from_rupiah(96_000),
            harga_jual: Money::from_rupiah(120_000),
            stok: 60,
            limit_harian: 0,
        }
    }

    fn line(barang_id: &str, dus: i64, pcs: i64) -> CartLine {
        CartLine {
            barang_id: barang_id.to_string(),
            jumlah_dus: dus,
            jumlah_pcs: pcs,
            harga_jual: None,
            diskon_per_dus: Money::zero(),
        }
    }

    fn credit(limit: i64, piutang: i64) -> CustomerCredit {
        CustomerCredit {
            nama: "Toko Maju".to_string(),
            limit_piutang: Money::from_rupiah(limit),
            piutang: Money::from_rupiah(piutang),
        }
    }

    #[test]
    fn test_profit_sums_across_dus_pcs_split() {
        let barang = susu();
        let mut l = line("b-susu", 2, 6);
        l.diskon_per_dus = Money::from_rupiah(4_000);

        let t = price_line(&l, &barang).unwrap();
        assert_eq!(t.total_pcs, 54);
        // 2 × 120.000 + 6/24 × 120.000
        assert_eq!(t.subtotal.rupiah(), 270_000);
        // 2 × 4.000 + 6/24 × 4.000
        assert_eq!(t.diskon.rupiah(), 9_000);
        assert_eq!(t.total.rupiah(), 261_000);
        // 2 × 96.000 + 6/24 × 96.000
        assert_eq!(t.modal.rupiah(), 216_000);
        assert_eq!(t.laba.rupiah(), 45_000);
        assert_eq!(t.laba, t.total - t.modal);
    }

    #[test]
    fn test_price_override_is_used() {
        let mut l = line("b-susu", 1, 0);
        l.harga_jual = Some(Money::from_rupiah(110_000));
        let t = price_line(&l, &susu()).unwrap();
        assert_eq!(t.harga_jual.rupiah(), 110_000);
        assert_eq!(t.laba.rupiah(), 14_000);
    }

    #[test]
    fn test_discount_larger_than_price_rejected() {
        let mut l = line("b-susu", 1, 0);
        l.diskon_per_dus = Money::from_rupiah(130_000);
        let err = price_line(&l, &susu()).unwrap_err();
        assert!(matches!(err, CoreError::DiscountTooLarge { .. }));
    }

    #[test]
    fn test_summarize_applies_nota_discount_to_laba() {
        let barang = susu();
        let a = price_line(&line("b-susu", 1, 0), &barang).unwrap();
        let b = price_line(&line("b-susu", 0, 12), &barang).unwrap();

        let s = summarize(&[a, b], Money::from_rupiah(5_000)).unwrap();
        assert_eq!(s.subtotal.rupiah(), 180_000);
        assert_eq!(s.diskon_item.rupiah(), 0);
        assert_eq!(s.total.rupiah(), 175_000);
        assert_eq!(s.total_modal.rupiah(), 144_000);
        assert_eq!(s.laba.rupiah(), 31_000);

        let err = summarize(&[a], Money::from_rupiah(200_000)).unwrap_err();
        assert!(matches!(err, CoreError::DiscountTooLarge { .. }));
    }

    #[test]
    fn test_merge_lines() {
        let mut discounted = line("b-susu", 0, 1);
        discounted.diskon_per_dus = Money::from_rupiah(1_000);

        let merged = merge_lines(vec![
            line("b-susu", 1, 0),
            line("b-kopi", 0, 3),
            line("b-susu", 0, 4),
            discounted,
        ])
        .unwrap();

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].kuantitas(), Kuantitas::new(1, 4));
        assert_eq!(merged[1].barang_id, "b-kopi");
        assert_eq!(merged[2].diskon_per_dus.rupiah(), 1_000);
    }

    #[test]
    fn test_merge_lines_rejects_bad_input() {
        assert!(matches!(merge_lines(vec![]), Err(CoreError::EmptyCart)));
        assert!(merge_lines(vec![line("b-susu", 0, 0)]).is_err());
        assert!(merge_lines(vec![line("b-susu", -1, 5)]).is_err());
        assert!(merge_lines(vec![line("", 1, 0)]).is_err());

        let too_many: Vec<CartLine> = (0..=crate::MAX_CART_ITEMS)
            .map(|i| line(&format!("b-{i}"), 1, 0))
            .collect();
        assert!(matches!(
            merge_lines(too_many),
            Err(CoreError::CartTooLarge { .. })
        ));
    }

    #[test]
    fn test_merge_lines_rejects_values_that_would_overflow() {
        // 768614336404564651 × 24 wraps past i64::MAX
        let err = merge_lines(vec![line("b-susu", 768_614_336_404_564_651, 0)]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { max: MAX_ITEM_PCS, .. })
        ));
        assert!(merge_lines(vec![line("b-susu", 0, i64::MAX)]).is_err());

        let mut mahal = line("b-susu", 1, 0);
        mahal.harga_jual = Some(Money::from_rupiah(i64::MAX / 2));
        assert!(matches!(
            merge_lines(vec![mahal]),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let mut diskon = line("b-susu", 1, 0);
        diskon.diskon_per_dus = Money::from_rupiah(crate::MAX_HARGA + 1);
        assert!(merge_lines(vec![diskon]).is_err());
    }

    #[test]
    fn test_price_cart_and_requested_pcs() {
        let mut snapshots = BTreeMap::new();
        snapshots.insert("b-susu".to_string(), susu());

        let mut cheaper = line("b-susu", 0, 6);
        cheaper.harga_jual = Some(Money::from_rupiah(100_000));

        let (priced, summary) =
            price_cart(&[line("b-susu", 1, 0), cheaper], &snapshots, Money::zero()).unwrap();
        assert_eq!(priced.len(), 2);
        assert_eq!(summary.total.rupiah(), 145_000);
        assert_eq!(requested_pcs(&priced).get("b-susu"), Some(&30));

        let err = price_cart(&[line("b-none", 1, 0)], &snapshots, Money::zero()).unwrap_err();
        assert!(matches!(err, CoreError::BarangNotFound(_)));
    }

    #[test]
    fn test_check_stock() {
        let barang = susu();
        assert!(check_stock(&barang, 60, 0).is_ok());
        let err = check_stock(&barang, 61, 0).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                tersedia: 60,
                diminta: 61,
                ..
            }
        ));
        // Quantity given back by an edited nota counts as available
        assert!(check_stock(&barang, 70, 10).is_ok());
    }

    #[test]
    fn test_check_daily_limit() {
        let mut barang = susu();
        assert!(check_daily_limit(&barang, 10_000, 10_000).is_ok());

        barang.limit_harian = 48;
        assert!(check_daily_limit(&barang, 24, 24).is_ok());
        let err = check_daily_limit(&barang, 24, 25).unwrap_err();
        assert!(matches!(
            err,
            CoreError::DailyLimitExceeded {
                limit: 48,
                terjual: 24,
                diminta: 25,
                ..
            }
        ));
    }

    #[test]
    fn test_settle_cash_with_change() {
        let s = settle(
            Money::from_rupiah(175_000),
            Money::from_rupiah(200_000),
            Metode::Tunai,
            None,
        )
        .unwrap();
        assert_eq!(s.dibayar.rupiah(), 175_000);
        assert_eq!(s.kembalian.rupiah(), 25_000);
        assert_eq!(s.sisa, Money::zero());
        assert_eq!(s.status_bayar, StatusBayar::Lunas);
    }

    #[test]
    fn test_settle_transfer_overpayment_rejected() {
        let err = settle(
            Money::from_rupiah(100_000),
            Money::from_rupiah(100_001),
            Metode::Transfer,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::PaymentExceedsBalance { .. }));
    }

    #[test]
    fn test_settle_credit_requires_customer() {
        let err = settle(
            Money::from_rupiah(100_000),
            Money::from_rupiah(40_000),
            Metode::Tunai,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::CreditNotAllowed { .. }));

        let s = settle(
            Money::from_rupiah(100_000),
            Money::from_rupiah(40_000),
            Metode::Tunai,
            Some(&credit(0, 1_000_000)),
        )
        .unwrap();
        assert_eq!(s.sisa.rupiah(), 60_000);
        assert_eq!(s.kembalian, Money::zero());
        assert_eq!(s.status_bayar, StatusBayar::BelumLunas);
    }

    #[test]
    fn test_settle_credit_limit() {
        // 450.000 existing + 60.000 new > 500.000
        let err = settle(
            Money::from_rupiah(100_000),
            Money::from_rupiah(40_000),
            Metode::Tempo,
            Some(&credit(500_000, 450_000)),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::CreditLimitExceeded { .. }));

        // Exactly at the limit is allowed
        assert!(settle(
            Money::from_rupiah(100_000),
            Money::from_rupiah(50_000),
            Metode::Tempo,
            Some(&credit(500_000, 450_000)),
        )
        .is_ok());
    }

    #[test]
    fn test_resettle_after_edit() {
        // Paid 100.000 by transfer, edited down to 80.000
        let s = resettle(Money::from_rupiah(80_000), Money::from_rupiah(100_000), None).unwrap();
        assert_eq!(s.dibayar.rupiah(), 80_000);
        assert_eq!(s.kembalian.rupiah(), 20_000);
        assert_eq!(s.status_bayar, StatusBayar::Lunas);

        // Edited up: the difference becomes piutang
        let s = resettle(
            Money::from_rupiah(130_000),
            Money::from_rupiah(100_000),
            Some(&credit(0, 0)),
        )
        .unwrap();
        assert_eq!(s.sisa.rupiah(), 30_000);
    }

    #[test]
    fn test_check_payment() {
        let sisa = Money::from_rupiah(50_000);
        assert!(check_payment(Money::from_rupiah(50_000), sisa).is_ok());
        assert!(check_payment(Money::zero(), sisa).is_err());
        assert!(matches!(
            check_payment(Money::from_rupiah(50_001), sisa),
            Err(CoreError::PaymentExceedsBalance { .. })
        ));
    }
}
