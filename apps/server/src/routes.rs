//! API route configuration.

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    auth, barang, customer, dashboard, karyawan, laporan, pembelian, pengeluaran, penjualan,
    supplier, users,
};
use crate::SharedState;

/// Create the router with all routes and middleware.
pub fn build_router(state: SharedState) -> Router {
    // Credentials (the session cookie) rule out a wildcard origin.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    let api = Router::new()
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/password", put(auth::change_password))
        // Master data
        .route("/barang", get(barang::list).post(barang::create))
        .route("/barang/stok-menipis", get(barang::low_stock))
        .route(
            "/barang/{id}",
            get(barang::get).put(barang::update).delete(barang::deactivate),
        )
        .route(
            "/barang/{id}/stok",
            get(barang::adjustments).post(barang::adjust_stock),
        )
        .route("/barang/{id}/terjual", get(barang::sold))
        .route("/customer", get(customer::list).post(customer::create))
        .route(
            "/customer/{id}",
            get(customer::get)
                .put(customer::update)
                .delete(customer::deactivate),
        )
        .route("/supplier", get(supplier::list).post(supplier::create))
        .route(
            "/supplier/{id}",
            get(supplier::get)
                .put(supplier::update)
                .delete(supplier::deactivate),
        )
        .route("/karyawan", get(karyawan::list).post(karyawan::create))
        .route(
            "/karyawan/{id}",
            get(karyawan::get)
                .put(karyawan::update)
                .delete(karyawan::deactivate),
        )
        .route("/users", get(users::list).post(users::create))
        .route("/users/{id}", put(users::update))
        // Penjualan
        .route("/penjualan", get(penjualan::list))
        .route(
            "/penjualan/checkout",
            get(penjualan::preview).post(penjualan::checkout),
        )
        .route(
            "/penjualan/{id}",
            get(penjualan::detail)
                .put(penjualan::edit)
                .delete(penjualan::cancel),
        )
        .route(
            "/penjualan/{id}/pembayaran",
            get(penjualan::payments).post(penjualan::add_payment),
        )
        // Pembelian
        .route("/pembelian", get(pembelian::list).post(pembelian::create))
        .route(
            "/pembelian/{id}",
            get(pembelian::detail).delete(pembelian::cancel),
        )
        .route("/pembelian/{id}/pembayaran", post(pembelian::add_payment))
        // Pengeluaran
        .route(
            "/pengeluaran",
            get(pengeluaran::list).post(pengeluaran::create),
        )
        .route(
            "/pengeluaran/{id}",
            get(pengeluaran::get)
                .put(pengeluaran::update)
                .delete(pengeluaran::delete),
        )
        // Laporan
        .route("/laporan/penjualan", get(laporan::penjualan))
        .route("/laporan/penjualan/export", get(laporan::penjualan_export))
        .route("/laporan/penjualan-barang", get(laporan::penjualan_per_barang))
        .route(
            "/laporan/penjualan-barang/export",
            get(laporan::penjualan_per_barang_export),
        )
        .route("/laporan/pembelian", get(laporan::pembelian))
        .route("/laporan/pembelian/export", get(laporan::pembelian_export))
        .route("/laporan/pengeluaran", get(laporan::pengeluaran))
        .route("/laporan/pengeluaran/export", get(laporan::pengeluaran_export))
        .route("/laporan/laba-rugi", get(laporan::laba_rugi))
        .route("/laporan/laba-rugi/export", get(laporan::laba_rugi_export))
        .route("/laporan/stok", get(laporan::stok))
        .route("/laporan/stok/export", get(laporan::stok_export))
        .route("/laporan/piutang", get(laporan::piutang))
        .route("/laporan/piutang/export", get(laporan::piutang_export))
        .route("/laporan/hutang", get(laporan::hutang))
        .route("/laporan/hutang/export", get(laporan::hutang_export))
        .route("/dashboard", get(dashboard::summary));

    Router::new()
        .nest("/api", api)
        .route("/health", get(dashboard::health))
        .with_state(state)
        // Middleware (order matters - bottom runs first)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
