//! Input normalisation and shared field rules for request bodies.
//!
//! Normalisation runs during deserialization so that validation and the
//! database only ever see cleaned values (trimmed names, lowercase emails,
//! `None` instead of empty optional strings).

use std::borrow::Cow;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use validator::ValidationError;

pub fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

pub fn trimmed_lowercase<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_lowercase())
}

/// Trimmed optional string; blank becomes `None`.
pub fn optional_trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// Trimmed optional string that keeps blanks, so length rules still apply
/// to a field that was sent.
pub fn present_trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|v| v.trim().to_string()))
}

/// Three-state field for partial updates, used with `#[serde(default)]`:
/// absent → `None`, `null`/blank → `Some(None)` (clear), value → `Some(Some(v))`.
pub fn clearable_trimmed<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    optional_trimmed(deserializer).map(Some)
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Product prices are non-negative amounts.
pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(invalid("price", "price must be greater than or equal to 0"));
    }
    if *price > Decimal::new(99_999_999_99, 2) {
        return Err(invalid("price", "price must be less than 100000000"));
    }
    Ok(())
}

/// Image locations are either absolute http(s) URLs or root-relative paths
/// served by the storefront (e.g. `/images/products/latte.jpg`).
pub fn validate_image_url(value: &str) -> Result<(), ValidationError> {
    let message = "imageUrl must be an http(s) URL or start with \"/\"";

    if value.len() > 500 {
        return Err(invalid("image_url", "imageUrl must be at most 500 characters"));
    }
    if value.starts_with('/') {
        return Ok(());
    }

    let lower = value.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Err(invalid("image_url", message));
    }
    match url::Url::parse(value) {
        Ok(parsed) if parsed.host_str().is_some() => Ok(()),
        _ => Err(invalid("image_url", message)),
    }
}

/// One-time codes are exactly six ASCII digits.
pub fn validate_otp_code(value: &str) -> Result<(), ValidationError> {
    if value.len() == 6 && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(invalid("otp", "otp must be a 6-digit code"))
    }
}

/// Build a case-insensitive substring pattern for `ILIKE`, matching `%`, `_`
/// and `\` in the search text literally.
pub fn like_pattern(q: &str) -> String {
    let mut pattern = String::with_capacity(q.len() + 2);
    pattern.push('%');
    for ch in q.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
