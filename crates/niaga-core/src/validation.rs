//! # Field Validation
//!
//! Shape checks on master data and cart input, run before anything touches
//! the database. Rules that need stored rows (stock, credit, daily limits)
//! live in the checkout and purchase pipelines instead.
//!
//! ```text
//!   JSON body ──serde──► typed input ──validate_*──► repository ──► SQLite
//!                                                        │        (UNIQUE,
//!                                                        ▼         FK, CHECK)
//!                                              checkout / purchase rules
//! ```
//!
//! ```rust
//! use niaga_core::validation::{validate_kode, validate_quantity};
//!
//! validate_kode("SUSU-01").unwrap();
//! validate_quantity(2, 5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_CART_ITEMS, MAX_HARGA, MAX_ITEM_PCS};

pub type ValidationResult<T> = Result<T, ValidationError>;

const KODE_MAX: usize = 30;
const NAMA_MAX: usize = 150;
const USERNAME_LEN: (usize, usize) = (3, 50);
const PASSWORD_LEN: (usize, usize) = (8, 128);
const ISI_PER_DUS_MAX: i64 = 10_000;
const SEARCH_MAX: usize = 100;

fn required(field: &str) -> ValidationError {
    ValidationError::Required {
        field: field.to_string(),
    }
}

fn too_long(field: &str, max: usize) -> ValidationError {
    ValidationError::TooLong {
        field: field.to_string(),
        max,
    }
}

fn out_of_range(field: &str, min: i64, max: i64) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min,
        max,
    }
}

// =============================================================================
// Text
// =============================================================================

/// Codes for barang, customer and supplier.
///
/// Non-empty after trimming, at most 30 characters, and only letters,
/// digits, `-`, `_` and `.` so codes print cleanly on receipts.
///
/// ```rust
/// use niaga_core::validation::validate_kode;
///
/// assert!(validate_kode("SUSU-01").is_ok());
/// assert!(validate_kode("").is_err());
/// assert!(validate_kode("ada spasi").is_err());
/// ```
pub fn validate_kode(kode: &str) -> ValidationResult<()> {
    validate_text("kode", kode, KODE_MAX)?;

    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '-' | '_' | '.');
    if kode.trim().chars().all(allowed) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "kode".to_string(),
            reason: "hanya huruf, angka, '-', '_' dan '.'".to_string(),
        })
    }
}

pub fn validate_nama(nama: &str) -> ValidationResult<()> {
    validate_text("nama", nama, NAMA_MAX)
}

/// Required text, trimmed, capped at `max` characters.
pub fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();
    if value.is_empty() {
        Err(required(field))
    } else if value.chars().count() > max {
        Err(too_long(field, max))
    } else {
        Ok(())
    }
}

/// Alamat, telepon, catatan: absent is fine, long is not.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(text) if text.chars().count() > max => Err(too_long(field, max)),
        _ => Ok(()),
    }
}

/// Lowercase ASCII letters, digits, `.`, `_`, `-`; 3 to 50 long.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();
    let (min, max) = USERNAME_LEN;

    if username.len() < min {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min,
        });
    }
    if username.len() > max {
        return Err(too_long("username", max));
    }

    let allowed =
        |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-');
    if !username.chars().all(allowed) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "hanya huruf kecil, angka, '.', '_' dan '-'".to_string(),
        });
    }
    Ok(())
}

/// Length only. Argon2 does the rest.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let (min, max) = PASSWORD_LEN;
    let len = password.chars().count();

    if len < min {
        Err(ValidationError::TooShort {
            field: "password".to_string(),
            min,
        })
    } else if len > max {
        Err(too_long("password", max))
    } else {
        Ok(())
    }
}

/// List search box. Empty means "no filter"; returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();
    if query.chars().count() > SEARCH_MAX {
        return Err(too_long("q", SEARCH_MAX));
    }
    Ok(query.to_string())
}

// =============================================================================
// Numbers
// =============================================================================

/// One cart or purchase line: `dus` cases plus `pcs` loose pieces.
///
/// Neither part may be negative, at least one must be non-zero, and each is
/// capped at [`MAX_ITEM_PCS`].
pub fn validate_quantity(dus: i64, pcs: i64) -> ValidationResult<()> {
    if dus < 0 || pcs < 0 {
        return Err(out_of_range("jumlah", 0, MAX_ITEM_PCS));
    }
    if dus == 0 && pcs == 0 {
        return Err(ValidationError::MustBePositive {
            field: "jumlah".to_string(),
        });
    }
    if dus.max(pcs) > MAX_ITEM_PCS {
        return Err(out_of_range("jumlah", 1, MAX_ITEM_PCS));
    }
    Ok(())
}

/// Catalogue prices. Zero is allowed for free goods.
///
/// ```rust
/// use niaga_core::validation::validate_price;
/// use niaga_core::Money;
///
/// assert!(validate_price("harga_jual", Money::zero()).is_ok());
/// assert!(validate_price("harga_jual", Money::from_rupiah(-1)).is_err());
/// assert!(validate_price("harga_jual", Money::from_rupiah(10_000_000_001)).is_err());
/// ```
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if (0..=MAX_HARGA).contains(&price.rupiah()) {
        Ok(())
    } else {
        Err(out_of_range(field, 0, MAX_HARGA))
    }
}

/// Payments and expenses must move money.
pub fn validate_payment_amount(jumlah: Money) -> ValidationResult<()> {
    if jumlah.is_positive() {
        Ok(())
    } else {
        Err(ValidationError::MustBePositive {
            field: "jumlah".to_string(),
        })
    }
}

pub fn validate_isi_per_dus(isi: i64) -> ValidationResult<()> {
    if (1..=ISI_PER_DUS_MAX).contains(&isi) {
        Ok(())
    } else {
        Err(out_of_range("isi_per_dus", 1, ISI_PER_DUS_MAX))
    }
}

/// Counts such as `limit_harian` or a counted stock figure.
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        Err(out_of_range(field, 0, i64::MAX))
    } else {
        Ok(())
    }
}

#[inline]
pub fn cart_size_ok(lines: usize) -> bool {
    lines <= MAX_CART_ITEMS
}
