//! # Domain Types
//!
//! Core domain types used throughout Niaga POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Master data           Transactions                 Ledgers             │
//! │  ───────────           ────────────                 ───────             │
//! │  Barang                PenjualanHeader ─┬─ items    PembayaranPenjualan │
//! │  Customer (piutang)                     └─ payments PembayaranPembelian │
//! │  Supplier (hutang)     PembelianHeader ─┬─ items                        │
//! │  Karyawan                               └─ payments Pengeluaran         │
//! │  User                                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Sale and purchase items copy the barang's kode, nama, isi_per_dus and
//! prices at the time of the transaction. Later catalogue changes never
//! rewrite history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::quantity::Kuantitas;

// =============================================================================
// Enums
// =============================================================================

/// How a payment was made.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Metode {
    /// Cash at the counter; overpayment becomes kembalian.
    #[default]
    Tunai,
    /// Bank transfer.
    Transfer,
    /// Pay later; the whole total becomes hutang/piutang.
    Tempo,
}

/// Settlement state of a nota or purchase.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StatusBayar {
    Lunas,
    BelumLunas,
}

impl StatusBayar {
    /// Derives the status from the outstanding balance.
    pub fn from_sisa(sisa: Money) -> Self {
        if sisa.is_positive() {
            StatusBayar::BelumLunas
        } else {
            StatusBayar::Lunas
        }
    }
}

/// Lifecycle state of a transaction.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StatusTransaksi {
    #[default]
    Selesai,
    /// Cancelled; stock and balances have been reversed.
    Batal,
}

impl StatusTransaksi {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTransaksi::Selesai => "selesai",
            StatusTransaksi::Batal => "batal",
        }
    }
}

/// Access role of a login account.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access including master data deletes and user management.
    Admin,
    /// Counter access: checkout, payments, lookups.
    Kasir,
}

/// Position of an employee.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Jabatan {
    Sales,
    Kasir,
    Gudang,
    Admin,
}

// =============================================================================
// Barang
// =============================================================================

/// A product in the catalogue.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Barang {
    pub id: String,

    /// Business identifier printed on the nota.
    pub kode: String,

    pub nama: String,

    /// Display unit of a piece (pcs, botol, bungkus, ...).
    pub satuan: String,

    /// Pieces per case. Always ≥ 1.
    pub isi_per_dus: i64,

    /// Buy price per dus, updated by purchases.
    pub harga_beli: Money,

    /// Sell price per dus.
    pub harga_jual: Money,

    /// Stock in pieces.
    pub stok: i64,

    /// Maximum pieces sold per business date; 0 means no limit.
    pub limit_harian: i64,

    pub supplier_id: Option<String>,

    /// Whether the barang is sellable (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Barang {
    /// Stock expressed as dus + remaining pcs.
    pub fn stok_kuantitas(&self) -> Kuantitas {
        Kuantitas::from_pcs(self.stok, self.isi_per_dus)
    }

    /// Value of the stock on hand at buy price.
    pub fn nilai_stok(&self) -> Money {
        self.harga_beli.prorate(self.stok, self.isi_per_dus.max(1))
    }
}

// =============================================================================
// Customer / Supplier / Karyawan / User
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub kode: String,
    pub nama: String,
    pub alamat: Option<String>,
    pub telepon: Option<String>,
    /// Credit ceiling; zero means unlimited.
    pub limit_piutang: Money,
    /// Outstanding receivable across all open notas.
    pub piutang: Money,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub kode: String,
    pub nama: String,
    pub alamat: Option<String>,
    pub telepon: Option<String>,
    /// Outstanding payable across all open purchases.
    pub hutang: Money,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Karyawan {
    pub id: String,
    pub nama: String,
    pub jabatan: Jabatan,
    pub telepon: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A login account. The hash never leaves the server.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub karyawan_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Penjualan
// =============================================================================

/// A sales nota.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PenjualanHeader {
    pub id: String,
    /// `PJ-YYYYMMDD-NNNN`, sequential per business date.
    pub nomor: String,
    /// Business date (store timezone) the daily limit is counted against.
    #[ts(as = "String")]
    pub tanggal: NaiveDate,
    pub customer_id: Option<String>,
    /// Sales employee credited with the nota.
    pub karyawan_id: Option<String>,
    pub user_id: String,
    /// Σ line prices before discounts.
    pub subtotal: Money,
    /// Σ line discounts.
    pub diskon_item: Money,
    /// Discount on the whole nota.
    pub diskon_nota: Money,
    pub total: Money,
    /// Σ buy price of the goods sold (HPP).
    pub total_modal: Money,
    /// `total − total_modal`.
    pub laba: Money,
    /// Amount applied to the nota so far (never above total).
    pub dibayar: Money,
    /// Outstanding receivable, `total − dibayar`.
    pub sisa: Money,
    /// Change handed back at checkout.
    pub kembalian: Money,
    pub metode: Metode,
    pub status_bayar: StatusBayar,
    pub status: StatusTransaksi,
    pub catatan: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A line of a sales nota (snapshot of the barang at sale time).
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PenjualanItem {
    pub id: String,
    pub penjualan_id: String,
    pub barang_id: String,
    pub kode_barang: String,
    pub nama_barang: String,
    pub isi_per_dus: i64,
    pub jumlah_dus: i64,
    pub jumlah_pcs: i64,
    pub total_pcs: i64,
    /// Sell price per dus actually charged.
    pub harga_jual: Money,
    /// Buy price per dus at sale time.
    pub harga_beli: Money,
    pub diskon_per_dus: Money,
    pub subtotal: Money,
    pub diskon: Money,
    pub total: Money,
    pub modal: Money,
    pub laba: Money,
}

impl PenjualanItem {
    pub fn kuantitas(&self) -> Kuantitas {
        Kuantitas::new(self.jumlah_dus, self.jumlah_pcs)
    }
}

/// A receivable payment against a nota.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PembayaranPenjualan {
    pub id: String,
    pub penjualan_id: String,
    pub customer_id: Option<String>,
    #[ts(as = "String")]
    pub tanggal: NaiveDate,
    pub jumlah: Money,
    pub metode: Metode,
    pub catatan: Option<String>,
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A nota with its lines and payments.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PenjualanDetail {
    pub header: PenjualanHeader,
    pub customer_nama: Option<String>,
    pub items: Vec<PenjualanItem>,
    pub pembayaran: Vec<PembayaranPenjualan>,
}

// =============================================================================
// Pembelian
// =============================================================================

/// A purchase from a supplier.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PembelianHeader {
    pub id: String,
    /// `PB-YYYYMMDD-NNNN`.
    pub nomor: String,
    #[ts(as = "String")]
    pub tanggal: NaiveDate,
    pub supplier_id: String,
    /// The supplier's own invoice number.
    pub faktur_supplier: Option<String>,
    pub total: Money,
    pub dibayar: Money,
    pub sisa: Money,
    pub metode: Metode,
    pub status_bayar: StatusBayar,
    pub status: StatusTransaksi,
    pub catatan: Option<String>,
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PembelianItem {
    pub id: String,
    pub pembelian_id: String,
    pub barang_id: String,
    pub kode_barang: String,
    pub nama_barang: String,
    pub isi_per_dus: i64,
    pub jumlah_dus: i64,
    pub jumlah_pcs: i64,
    pub total_pcs: i64,
    /// Buy price per dus on this purchase.
    pub harga_beli: Money,
    pub total: Money,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PembayaranPembelian {
    pub id: String,
    pub pembelian_id: String,
    pub supplier_id: String,
    #[ts(as = "String")]
    pub tanggal: NaiveDate,
    pub jumlah: Money,
    pub metode: Metode,
    pub catatan: Option<String>,
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PembelianDetail {
    pub header: PembelianHeader,
    pub supplier_nama: String,
    pub items: Vec<PembelianItem>,
    pub pembayaran: Vec<PembayaranPembelian>,
}

// =============================================================================
// Pengeluaran
// =============================================================================

/// An operating expense (listrik, gaji, bensin, ...).
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pengeluaran {
    pub id: String,
    #[ts(as = "String")]
    pub tanggal: NaiveDate,
    pub kategori: String,
    pub keterangan: String,
    pub jumlah: Money,
    pub karyawan_id: Option<String>,
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_bayar_from_sisa() {
        assert_eq!(
            StatusBayar::from_sisa(Money::from_rupiah(1)),
            StatusBayar::BelumLunas
        );
        assert_eq!(StatusBayar::from_sisa(Money::zero()), StatusBayar::Lunas);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&StatusBayar::BelumLunas).unwrap(),
            "\"belum_lunas\""
        );
        assert_eq!(serde_json::to_string(&Metode::Tempo).unwrap(), "\"tempo\"");
        let role: Role = serde_json::from_str("\"kasir\"").unwrap();
        assert_eq!(role, Role::Kasir);
        assert_eq!(Metode::default(), Metode::Tunai);
    }

    #[test]
    fn test_barang_stock_helpers() {
        let now = Utc::now();
        let barang = Barang {
            id: "b1".to_string(),
            kode: "SUSU-01".to_string(),
            nama: "Susu UHT 200ml".to_string(),
            satuan: "kotak".to_string(),
            isi_per_dus: 24,
            harga_beli: Money::from_rupiah(96_000),
            harga_jual: Money::from_rupiah(120_000),
            stok: 53,
            limit_harian: 0,
            supplier_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(barang.stok_kuantitas(), Kuantitas::new(2, 5));
        // 53/24 × 96.000 = 212.000
        assert_eq!(barang.nilai_stok().rupiah(), 212_000);
    }
}
