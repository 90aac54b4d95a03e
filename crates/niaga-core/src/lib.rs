//! # niaga-core: Pure Business Logic for Niaga POS
//!
//! This crate is the **heart** of Niaga POS. It contains the store's business
//! rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Niaga POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Dashboard (React)                            │   │
//! │  │   Kasir ──► Penjualan ──► Pembelian ──► Pengeluaran ──► Laporan │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    niaga-server (axum)                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ niaga-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ checkout  │  │ validation│  │   │
//! │  │   │  Barang   │  │   Money   │  │ price_line│  │   rules   │  │   │
//! │  │   │ Penjualan │  │ Kuantitas │  │  settle   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    niaga-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, transactional checkout       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Barang, PenjualanHeader, Customer, ...)
//! - [`money`] - Integer rupiah arithmetic
//! - [`quantity`] - Case/piece (dus/pcs) quantities and price apportioning
//! - [`checkout`] - Sales pricing, stock/limit checks, payment settlement
//! - [`purchase`] - Purchase pricing and payable settlement
//! - [`report`] - Report periods and profit-and-loss summary
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//!
//! ## Example Usage
//!
//! ```rust
//! use niaga_core::money::Money;
//! use niaga_core::quantity::Kuantitas;
//!
//! // 1 case of 24 plus 6 loose pieces at Rp 120.000 per case
//! let qty = Kuantitas::new(1, 6);
//! let price = qty.price_for(Money::from_rupiah(120_000), 24);
//!
//! // 120.000 + 6/24 × 120.000 = 150.000
//! assert_eq!(price.rupiah(), 150_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod purchase;
pub mod quantity;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use quantity::Kuantitas;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single nota.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum pieces of a single barang on one line.
///
/// Guards against typing 10000 instead of 100 at the counter.
pub const MAX_ITEM_PCS: i64 = 100_000;

/// Ceiling on any per-dus price, discount or credit limit (Rp 10 miliar).
///
/// With [`MAX_ITEM_PCS`] and [`MAX_CART_ITEMS`] this keeps every nota total
/// far inside `i64`.
pub const MAX_HARGA: i64 = 10_000_000_000;

/// Default business-date offset from UTC in hours (WIB, UTC+7).
pub const DEFAULT_TZ_OFFSET_HOURS: i32 = 7;
