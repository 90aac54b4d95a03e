//! # Laporan Repository
//!
//! Read-only reports over committed data. Every period report filters on the
//! business date (`tanggal`) and ignores cancelled transactions.

use chrono::NaiveDate;
use niaga_core::report::{LabaRugi, Periode};
use niaga_core::{Barang, Money, Pengeluaran, StatusBayar};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

// =============================================================================
// Report Rows
// =============================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PenjualanRow {
    pub nomor: String,
    pub tanggal: NaiveDate,
    pub customer: Option<String>,
    pub sales: Option<String>,
    pub subtotal: Money,
    pub diskon: Money,
    pub total: Money,
    pub total_modal: Money,
    pub laba: Money,
    pub dibayar: Money,
    pub sisa: Money,
    pub status_bayar: StatusBayar,
}

/// Sales of one barang over a period.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PenjualanPerBarang {
    pub kode: String,
    pub nama: String,
    pub total_pcs: i64,
    pub omzet: Money,
    pub modal: Money,
    pub laba: Money,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PembelianRow {
    pub nomor: String,
    pub tanggal: NaiveDate,
    pub supplier: String,
    pub faktur_supplier: Option<String>,
    pub total: Money,
    pub dibayar: Money,
    pub sisa: Money,
    pub status_bayar: StatusBayar,
}

/// A barang's stock valued at buy price.
#[derive(Debug, Clone, Serialize)]
pub struct StokRow {
    pub kode: String,
    pub nama: String,
    pub satuan: String,
    pub isi_per_dus: i64,
    pub stok: i64,
    pub stok_dus: i64,
    pub stok_pcs: i64,
    pub harga_beli: Money,
    pub harga_jual: Money,
    pub nilai_stok: Money,
}

impl From<&Barang> for StokRow {
    fn from(b: &Barang) -> Self {
        let k = b.stok_kuantitas();
        StokRow {
            kode: b.kode.clone(),
            nama: b.nama.clone(),
            satuan: b.satuan.clone(),
            isi_per_dus: b.isi_per_dus,
            stok: b.stok,
            stok_dus: k.dus,
            stok_pcs: k.pcs,
            harga_beli: b.harga_beli,
            harga_jual: b.harga_jual,
            nilai_stok: b.nilai_stok(),
        }
    }
}

/// Open receivable of one customer.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PiutangRow {
    pub customer_id: String,
    pub kode: String,
    pub nama: String,
    pub telepon: Option<String>,
    pub limit_piutang: Money,
    pub piutang: Money,
    pub nota_terbuka: i64,
    pub nota_tertua: Option<NaiveDate>,
}

/// Open payable to one supplier.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HutangRow {
    pub supplier_id: String,
    pub kode: String,
    pub nama: String,
    pub telepon: Option<String>,
    pub hutang: Money,
    pub faktur_terbuka: i64,
    pub faktur_tertua: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LaporanLabaRugi {
    pub periode: Periode,
    pub transaksi: i64,
    #[serde(flatten)]
    pub ringkasan: LabaRugi,
}

/// Today at a glance.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub tanggal: NaiveDate,
    pub omzet: Money,
    pub laba: Money,
    pub transaksi: i64,
    pub pengeluaran: Money,
    pub stok_menipis: i64,
    pub total_piutang: Money,
    pub total_hutang: Money,
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct LaporanRepository {
    pool: SqlitePool,
}

impl LaporanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LaporanRepository { pool }
    }

    pub async fn penjualan(&self, periode: &Periode) -> DbResult<Vec<PenjualanRow>> {
        debug!(%periode, "Laporan penjualan");
        let rows = sqlx::query_as::<_, PenjualanRow>(
            r#"
            SELECT p.nomor, p.tanggal, c.nama AS customer, k.nama AS sales,
                   p.subtotal, p.diskon_item + p.diskon_nota AS diskon, p.total,
                   p.total_modal, p.laba, p.dibayar, p.sisa, p.status_bayar
            FROM penjualan p
            LEFT JOIN customer c ON c.id = p.customer_id
            LEFT JOIN karyawan k ON k.id = p.karyawan_id
            WHERE p.status = 'selesai' AND p.tanggal BETWEEN ?1 AND ?2
            ORDER BY p.tanggal, p.nomor
            "#,
        )
        .bind(periode.dari)
        .bind(periode.sampai)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Sales grouped by barang, best sellers (by omzet) first.
    ///
    /// Omzet is the line total; the nota discount is not apportioned to
    /// lines.
    pub async fn penjualan_per_barang(&self, periode: &Periode) -> DbResult<Vec<PenjualanPerBarang>> {
        let rows = sqlx::query_as::<_, PenjualanPerBarang>(
            r#"
            SELECT i.kode_barang AS kode, i.nama_barang AS nama,
                   SUM(i.total_pcs) AS total_pcs,
                   SUM(i.total) AS omzet,
                   SUM(i.modal) AS modal,
                   SUM(i.laba) AS laba
            FROM penjualan_item i
            JOIN penjualan p ON p.id = i.penjualan_id
            WHERE p.status = 'selesai' AND p.tanggal BETWEEN ?1 AND ?2
            GROUP BY i.barang_id
            ORDER BY omzet DESC, kode
            "#,
        )
        .bind(periode.dari)
        .bind(periode.sampai)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn pembelian(&self, periode: &Periode) -> DbResult<Vec<PembelianRow>> {
        let rows = sqlx::query_as::<_, PembelianRow>(
            r#"
            SELECT b.nomor, b.tanggal, s.nama AS supplier, b.faktur_supplier,
                   b.total, b.dibayar, b.sisa, b.status_bayar
            FROM pembelian b
            JOIN supplier s ON s.id = b.supplier_id
            WHERE b.status = 'selesai' AND b.tanggal BETWEEN ?1 AND ?2
            ORDER BY b.tanggal, b.nomor
            "#,
        )
        .bind(periode.dari)
        .bind(periode.sampai)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn pengeluaran(&self, periode: &Periode) -> DbResult<Vec<Pengeluaran>> {
        let rows = sqlx::query_as::<_, Pengeluaran>(
            r#"
            SELECT id, tanggal, kategori, keterangan, jumlah, karyawan_id, user_id,
                   created_at, updated_at
            FROM pengeluaran
            WHERE tanggal BETWEEN ?1 AND ?2
            ORDER BY tanggal, created_at
            "#,
        )
        .bind(periode.dari)
        .bind(periode.sampai)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn laba_rugi(&self, periode: &Periode) -> DbResult<LaporanLabaRugi> {
        let (transaksi, penjualan, diskon, hpp): (i64, Money, Money, Money) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(total), 0),
                   COALESCE(SUM(diskon_item + diskon_nota), 0),
                   COALESCE(SUM(total_modal), 0)
            FROM penjualan
            WHERE status = 'selesai' AND tanggal BETWEEN ?1 AND ?2
            "#,
        )
        .bind(periode.dari)
        .bind(periode.sampai)
        .fetch_one(&self.pool)
        .await?;

        let pengeluaran: Money = sqlx::query_scalar(
            "SELECT COALESCE(SUM(jumlah), 0) FROM pengeluaran WHERE tanggal BETWEEN ?1 AND ?2",
        )
        .bind(periode.dari)
        .bind(periode.sampai)
        .fetch_one(&self.pool)
        .await?;

        Ok(LaporanLabaRugi {
            periode: *periode,
            transaksi,
            ringkasan: LabaRugi::compute(penjualan, diskon, hpp, pengeluaran),
        })
    }

    /// Current stock of every active barang.
    pub async fn stok(&self) -> DbResult<Vec<StokRow>> {
        let barang = sqlx::query_as::<_, Barang>(
            r#"
            SELECT id, kode, nama, satuan, isi_per_dus, harga_beli, harga_jual, stok,
                   limit_harian, supplier_id, is_active, created_at, updated_at
            FROM barang
            WHERE is_active = 1
            ORDER BY nama
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(barang.iter().map(StokRow::from).collect())
    }

    /// Customers with an outstanding receivable, largest first.
    pub async fn piutang(&self) -> DbResult<Vec<PiutangRow>> {
        let rows = sqlx::query_as::<_, PiutangRow>(
            r#"
            SELECT c.id AS customer_id, c.kode, c.nama, c.telepon, c.limit_piutang, c.piutang,
                   COUNT(p.id) AS nota_terbuka,
                   MIN(p.tanggal) AS nota_tertua
            FROM customer c
            LEFT JOIN penjualan p
                   ON p.customer_id = c.id AND p.status = 'selesai' AND p.sisa > 0
            WHERE c.piutang > 0
            GROUP BY c.id
            ORDER BY c.piutang DESC, c.nama
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Suppliers still owed money, largest first.
    pub async fn hutang(&self) -> DbResult<Vec<HutangRow>> {
        let rows = sqlx::query_as::<_, HutangRow>(
            r#"
            SELECT s.id AS supplier_id, s.kode, s.nama, s.telepon, s.hutang,
                   COUNT(b.id) AS faktur_terbuka,
                   MIN(b.tanggal) AS faktur_tertua
            FROM supplier s
            LEFT JOIN pembelian b
                   ON b.supplier_id = s.id AND b.status = 'selesai' AND b.sisa > 0
            WHERE s.hutang > 0
            GROUP BY s.id
            ORDER BY s.hutang DESC, s.nama
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn dashboard(&self, today: NaiveDate) -> DbResult<DashboardSummary> {
        let (transaksi, omzet, laba): (i64, Money, Money) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total), 0), COALESCE(SUM(laba), 0)
            FROM penjualan
            WHERE status = 'selesai' AND tanggal = ?1
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        let pengeluaran: Money =
            sqlx::query_scalar("SELECT COALESCE(SUM(jumlah), 0) FROM pengeluaran WHERE tanggal = ?1")
                .bind(today)
                .fetch_one(&self.pool)
                .await?;

        let stok_menipis: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM barang WHERE is_active = 1 AND stok < isi_per_dus",
        )
        .fetch_one(&self.pool)
        .await?;

        let (total_piutang, total_hutang): (Money, Money) = sqlx::query_as(
            r#"
            SELECT (SELECT COALESCE(SUM(piutang), 0) FROM customer),
                   (SELECT COALESCE(SUM(hutang), 0) FROM supplier)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardSummary {
            tanggal: today,
            omzet,
            laba,
            transaksi,
            pengeluaran,
            stok_menipis,
            total_piutang,
            total_hutang,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::pengeluaran::NewPengeluaran;
    use crate::repository::penjualan::CheckoutRequest;
    use crate::repository::test_support::{setup, susu, tanggal, toko};
    use niaga_core::checkout::CartLine;
    use niaga_core::Metode;

    fn sale(barang_id: &str, pcs: i64, customer_id: Option<&str>, dibayar: i64) -> CheckoutRequest {
        CheckoutRequest {
            items: vec![CartLine {
                barang_id: barang_id.to_string(),
                jumlah_dus: 0,
                jumlah_pcs: pcs,
                harga_jual: None,
                diskon_per_dus: Money::zero(),
            }],
            customer_id: customer_id.map(str::to_string),
            karyawan_id: None,
            diskon_nota: Money::zero(),
            dibayar: Money::from_rupiah(dibayar),
            metode: Metode::Tunai,
            catatan: None,
        }
    }

    #[tokio::test]
    async fn test_laba_rugi_ignores_cancelled_and_out_of_period() {
        let (db, admin) = setup().await;
        let b = susu(&db, 500, 0).await;
        let repo = db.penjualan();

        // 24 pcs: omzet 120.000, modal 96.000
        repo.checkout(&sale(&b.id, 24, None, 120_000), &admin.id, tanggal(10)).await.unwrap();
        let batal = repo
            .checkout(&sale(&b.id, 24, None, 120_000), &admin.id, tanggal(10))
            .await
            .unwrap();
        repo.cancel(&batal.header.id).await.unwrap();
        repo.checkout(&sale(&b.id, 24, None, 120_000), &admin.id, tanggal(20)).await.unwrap();

        db.pengeluaran()
            .create(
                &NewPengeluaran {
                    tanggal: None,
                    kategori: "listrik".to_string(),
                    keterangan: "Token".to_string(),
                    jumlah: Money::from_rupiah(4_000),
                    karyawan_id: None,
                },
                &admin.id,
                tanggal(11),
            )
            .await
            .unwrap();

        let periode = Periode::new(tanggal(1), tanggal(15)).unwrap();
        let lr = db.laporan().laba_rugi(&periode).await.unwrap();
        assert_eq!(lr.transaksi, 1);
        assert_eq!(lr.ringkasan.penjualan.rupiah(), 120_000);
        assert_eq!(lr.ringkasan.hpp.rupiah(), 96_000);
        assert_eq!(lr.ringkasan.laba_kotor.rupiah(), 24_000);
        assert_eq!(lr.ringkasan.laba_bersih.rupiah(), 20_000);

        let rows = db.laporan().penjualan(&periode).await.unwrap();
        assert_eq!(rows.len(), 1);
        let per_barang = db.laporan().penjualan_per_barang(&periode).await.unwrap();
        assert_eq!(per_barang[0].total_pcs, 24);
        assert_eq!(per_barang[0].laba.rupiah(), 24_000);
    }

    #[tokio::test]
    async fn test_piutang_and_dashboard() {
        let (db, admin) = setup().await;
        let b = susu(&db, 30, 0).await;
        let c = toko(&db, 0).await;

        db.penjualan()
            .checkout(&sale(&b.id, 12, Some(&c.id), 10_000), &admin.id, tanggal(10))
            .await
            .unwrap();

        let piutang = db.laporan().piutang().await.unwrap();
        assert_eq!(piutang.len(), 1);
        assert_eq!(piutang[0].piutang.rupiah(), 50_000);
        assert_eq!(piutang[0].nota_terbuka, 1);
        assert_eq!(piutang[0].nota_tertua, Some(tanggal(10)));

        let dash = db.laporan().dashboard(tanggal(10)).await.unwrap();
        assert_eq!(dash.transaksi, 1);
        assert_eq!(dash.omzet.rupiah(), 60_000);
        assert_eq!(dash.laba.rupiah(), 12_000);
        // 18 pcs left of isi 24
        assert_eq!(dash.stok_menipis, 1);
        assert_eq!(dash.total_piutang.rupiah(), 50_000);

        let stok = db.laporan().stok().await.unwrap();
        assert_eq!(stok[0].stok, 18);
        assert_eq!(stok[0].nilai_stok.rupiah(), 72_000);
        assert!(db.laporan().hutang().await.unwrap().is_empty());
    }
}
