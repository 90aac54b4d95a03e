//! # Seed Data Generator
//!
//! Populates a development database with master data.
//!
//! ## Usage
//! ```bash
//! # Seed ./niaga_dev.db
//! cargo run -p niaga-db --bin seed
//!
//! # Specify database path and admin password
//! cargo run -p niaga-db --bin seed -- --db ./data/niaga.db --password rahasia123
//! ```
//!
//! ## Generated Data
//! - An `admin` login and a `kasir` login
//! - Suppliers and the goods they deliver (`{SUPPLIER}-{NN}` kode)
//! - Customers with and without a credit limit
//! - Sales and warehouse employees

use niaga_core::{Jabatan, Money, Role};
use niaga_db::repository::barang::NewBarang;
use niaga_db::repository::customer::NewCustomer;
use niaga_db::repository::karyawan::NewKaryawan;
use niaga_db::repository::supplier::NewSupplier;
use niaga_db::repository::user::NewUser;
use niaga_db::{Database, DbConfig};
use std::env;

/// Goods per supplier: (nama, satuan, isi per dus, harga beli per dus).
const CATALOGUE: &[(&str, &str, &[(&str, &str, i64, i64)])] = &[
    (
        "Sumber Rejeki",
        "SRJ",
        &[
            ("Susu UHT Coklat 200ml", "kotak", 24, 96_000),
            ("Susu UHT Full Cream 200ml", "kotak", 24, 96_000),
            ("Teh Kotak 300ml", "kotak", 24, 72_000),
            ("Air Mineral 600ml", "botol", 24, 48_000),
            ("Kopi Susu Kaleng 240ml", "kaleng", 24, 150_000),
        ],
    ),
    (
        "Makmur Jaya",
        "MKJ",
        &[
            ("Mie Goreng Instan", "bungkus", 40, 112_000),
            ("Mie Kuah Ayam Bawang", "bungkus", 40, 104_000),
            ("Kecap Manis 135ml", "sachet", 48, 96_000),
            ("Minyak Goreng 1L", "pouch", 12, 186_000),
            ("Gula Pasir 1kg", "pack", 20, 330_000),
        ],
    ),
    (
        "Berkah Abadi",
        "BKA",
        &[
            ("Sabun Mandi 85g", "batang", 72, 216_000),
            ("Pasta Gigi 190g", "tube", 36, 378_000),
            ("Deterjen Bubuk 800g", "pack", 12, 228_000),
            ("Tisu Wajah 250 lembar", "pack", 24, 240_000),
        ],
    ),
];

const CUSTOMERS: &[(&str, &str, i64)] = &[
    ("C-001", "Toko Maju", 5_000_000),
    ("C-002", "Warung Bu Sri", 1_000_000),
    ("C-003", "Kios Pak Darto", 0),
];

const KARYAWAN: &[(&str, Jabatan)] = &[
    ("Budi Santoso", Jabatan::Sales),
    ("Siti Aminah", Jabatan::Kasir),
    ("Agus Wibowo", Jabatan::Gudang),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./niaga_dev.db");
    let mut password = String::from("admin12345");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Niaga POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>         Database file path (default: ./niaga_dev.db)");
                println!("  -p, --password <PASS>   Password for admin and kasir (default: admin12345)");
                println!("  -h, --help              Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Niaga POS Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.users().get_by_username("admin").await?.is_some() {
        println!("⚠ Database already has an admin user");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    let mut sales_id = None;
    for (nama, jabatan) in KARYAWAN {
        let k = db
            .karyawan()
            .create(&NewKaryawan {
                nama: nama.to_string(),
                jabatan: *jabatan,
                telepon: None,
            })
            .await?;
        if *jabatan == Jabatan::Sales {
            sales_id.get_or_insert(k.id);
        }
    }
    println!("✓ {} karyawan", KARYAWAN.len());

    for (username, role) in [("admin", Role::Admin), ("kasir", Role::Kasir)] {
        db.users()
            .create(&NewUser {
                username: username.to_string(),
                password: password.clone(),
                role,
                karyawan_id: None,
            })
            .await?;
    }
    println!("✓ users: admin, kasir");

    let mut barang_count = 0;
    for (idx, (nama, prefix, goods)) in CATALOGUE.iter().enumerate() {
        let supplier = db
            .suppliers()
            .create(&NewSupplier {
                kode: format!("S-{:03}", idx + 1),
                nama: format!("CV {}", nama),
                alamat: None,
                telepon: None,
            })
            .await?;

        for (n, (nama_barang, satuan, isi, harga_beli)) in goods.iter().enumerate() {
            // 25% markup, rounded to the next Rp 500
            let harga_jual = (harga_beli * 125 / 100 + 499) / 500 * 500;
            let input = NewBarang {
                kode: format!("{}-{:02}", prefix, n + 1),
                nama: nama_barang.to_string(),
                satuan: Some(satuan.to_string()),
                isi_per_dus: *isi,
                harga_beli: Money::from_rupiah(*harga_beli),
                harga_jual: Money::from_rupiah(harga_jual),
                stok: isi * (5 + (n as i64 * 3) % 10),
                limit_harian: if n == 0 { isi * 10 } else { 0 },
                supplier_id: Some(supplier.id.clone()),
            };

            if let Err(e) = db.barang().create(&input).await {
                eprintln!("Failed to insert {}: {}", input.kode, e);
                continue;
            }
            barang_count += 1;
        }
    }
    println!("✓ {} suppliers, {} barang", CATALOGUE.len(), barang_count);

    for (kode, nama, limit) in CUSTOMERS {
        db.customers()
            .create(&NewCustomer {
                kode: kode.to_string(),
                nama: nama.to_string(),
                alamat: None,
                telepon: None,
                limit_piutang: Money::from_rupiah(*limit),
            })
            .await?;
    }
    println!("✓ {} customers", CUSTOMERS.len());

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());
    if let Some(id) = sales_id {
        println!("  Sales karyawan id: {}", id);
    }

    Ok(())
}
