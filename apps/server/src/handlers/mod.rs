//! # HTTP Handlers
//!
//! One module per resource. Handlers parse the request, call one
//! repository method and wrap the result in the response envelope; all
//! business rules live below them in niaga-core and niaga-db.
//!
//! ## Access
//! ```text
//! ┌──────────────────────┬────────────────┬───────────────────────────────┐
//! │ Route group          │ Reads          │ Writes                        │
//! ├──────────────────────┼────────────────┼───────────────────────────────┤
//! │ barang, customer,    │ any login      │ any login; delete = admin     │
//! │ supplier             │                │                               │
//! │ karyawan             │ any login      │ admin                         │
//! │ users                │ admin          │ admin                         │
//! │ penjualan            │ any login      │ checkout/bayar = any login;   │
//! │                      │                │ edit/batal = admin            │
//! │ pembelian            │ any login      │ admin                         │
//! │ pengeluaran          │ any login      │ any login; delete = admin     │
//! │ laporan, dashboard   │ any login      │ -                             │
//! └──────────────────────┴────────────────┴───────────────────────────────┘
//! ```

pub mod auth;
pub mod barang;
pub mod customer;
pub mod dashboard;
pub mod karyawan;
pub mod laporan;
pub mod pembelian;
pub mod pengeluaran;
pub mod penjualan;
pub mod supplier;
pub mod users;

use crate::error::{ApiError, ApiResult};

/// Turns a missing row into a 404.
pub(crate) fn found<T>(row: Option<T>, entity: &str, id: &str) -> ApiResult<T> {
    row.ok_or_else(|| ApiError::not_found(entity, id))
}
