use lazy_static::lazy_static;
use regex::Regex;

use crate::core::error::{AppError, Result};

lazy_static! {
    /// Regex for validating category slugs
    /// Must be lowercase alphanumeric with hyphens
    /// - Valid: "beleza", "corte-de-cabelo", "aulas-123"
    /// - Invalid: "-beleza", "beleza-", "corte--cabelo", "Beleza", "corte_cabelo"
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();

    /// Regex for translation language codes ("pt", "en", "pt-BR")
    pub static ref LANGUAGE_REGEX: Regex = Regex::new(r"^[a-z]{2}(?:-[A-Z]{2})?$").unwrap();
}

/// Parse a query-string integer that must be `>= 0`.
pub fn parse_non_negative(field: &str, raw: &str) -> Result<i64> {
    let value = raw.trim().parse::<i64>().map_err(|_| {
        AppError::Validation(format!("{} must be a non-negative integer", field))
    })?;

    if value < 0 {
        return Err(AppError::Validation(format!(
            "{} must be a non-negative integer",
            field
        )));
    }

    Ok(value)
}

/// Parse a query-string boolean flag (`true`/`false`, `1`/`0`).
pub fn parse_flag(field: &str, raw: Option<&str>) -> Result<bool> {
    match raw.map(str::trim) {
        None => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(AppError::Validation(format!(
            "{} must be true or false, got '{}'",
            field, other
        ))),
    }
}
