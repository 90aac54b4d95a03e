//! # Domain Errors
//!
//! ```text
//!   ValidationError ──► CoreError ──► DbError::Core ──► ApiError (400)
//!   (field shape)       (store rule)   (rolled-back tx)   { success: false,
//!                                                           error: "<message>" }
//! ```
//!
//! Messages are Indonesian and shown to the kasir verbatim, so every variant
//! carries enough to say which barang or customer was the problem.

use thiserror::Error;

use crate::money::Money;

/// The request was understood but the store's rules refuse it.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Missing or inactive barang on a cart or purchase line.
    #[error("Barang tidak ditemukan: {0}")]
    BarangNotFound(String),

    #[error("Customer tidak ditemukan: {0}")]
    CustomerNotFound(String),

    #[error("Supplier tidak ditemukan: {0}")]
    SupplierNotFound(String),

    /// Counts are pieces. 2 dus of a 24-piece case against 30 in stock
    /// reports `tersedia: 30, diminta: 48`.
    #[error("Stok {kode} tidak cukup: tersedia {tersedia} pcs, diminta {diminta} pcs")]
    InsufficientStock {
        kode: String,
        tersedia: i64,
        diminta: i64,
    },

    #[error(
        "Limit harian {kode} terlampaui: limit {limit} pcs, terjual {terjual} pcs, diminta {diminta} pcs"
    )]
    DailyLimitExceeded {
        kode: String,
        limit: i64,
        terjual: i64,
        diminta: i64,
    },

    /// Walk-in sales must be paid in full.
    #[error("Penjualan belum lunas membutuhkan customer (sisa {sisa})")]
    CreditNotAllowed { sisa: Money },

    #[error("Piutang {customer} melebihi limit: limit {limit}, piutang baru {piutang_baru}")]
    CreditLimitExceeded {
        customer: String,
        limit: Money,
        piutang_baru: Money,
    },

    #[error("Diskon {diskon} melebihi harga {harga}")]
    DiscountTooLarge { diskon: Money, harga: Money },

    #[error("Keranjang kosong")]
    EmptyCart,

    #[error("Keranjang tidak boleh lebih dari {max} baris")]
    CartTooLarge { max: usize },

    #[error("Pembayaran {jumlah} melebihi sisa {sisa}")]
    PaymentExceedsBalance { jumlah: Money, sisa: Money },

    /// Editing, paying or cancelling a nota that is already `batal`.
    #[error("Transaksi {nomor} berstatus {status}, operasi tidak diizinkan")]
    InvalidStatus { nomor: String, status: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A field failed a shape check before any rule ran.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} wajib diisi")]
    Required { field: String },

    #[error("{field} minimal {min} karakter")]
    TooShort { field: String, min: usize },

    #[error("{field} maksimal {max} karakter")]
    TooLong { field: String, max: usize },

    #[error("{field} harus antara {min} dan {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} harus lebih dari nol")]
    MustBePositive { field: String },

    #[error("Format {field} tidak valid: {reason}")]
    InvalidFormat { field: String, reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
