//! Field-level input rules for the search and newsletter forms.
//!
//! Every `clean_*` function takes the raw submitted text and returns either
//! the cleaned value or a [`ValidationError`] whose [`code`](ValidationError::code)
//! names the rule that failed. Surrounding whitespace is stripped before any
//! rule runs.

use crate::models::Publisher;
use regex::Regex;
use std::net::IpAddr;
use std::num::IntErrorKind;
use std::sync::OnceLock;
use thiserror::Error;

pub const SEARCH_MAX_CHARS: usize = 100;
pub const NAME_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 254;

/// Characters (and one two-character sequence) refused in search text.
const FORBIDDEN_SEARCH_CHARS: [char; 5] = ['<', '>', '"', '\'', ';'];
const FORBIDDEN_SEARCH_SEQUENCE: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Este campo es obligatorio.")]
    Required,
    #[error("Asegúrese de que este valor tenga como máximo {max} caracteres (tiene {actual}).")]
    MaxLength { max: usize, actual: usize },
    #[error("La búsqueda contiene caracteres no permitidos.")]
    InvalidChars,
    #[error("El nombre contiene caracteres no permitidos.")]
    InvalidName,
    #[error("El email es demasiado largo.")]
    EmailTooLong,
    #[error("Introduzca una dirección de correo electrónico válida.")]
    InvalidEmail,
    #[error("Escoja una opción válida. Esa opción no está entre las disponibles.")]
    InvalidChoice,
    #[error("Introduzca un número entero.")]
    InvalidInteger,
    #[error("Asegúrese de que este valor es mayor o igual a {0}.")]
    MinValue(i64),
}

impl ValidationError {
    /// Stable failure name, used by templates and tests.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Required => "required",
            ValidationError::MaxLength { .. } => "max_length",
            ValidationError::InvalidChars => "invalid_chars",
            ValidationError::InvalidName => "invalid_name",
            ValidationError::EmailTooLong => "email_too_long",
            ValidationError::InvalidEmail => "invalid_email",
            ValidationError::InvalidChoice => "invalid_choice",
            ValidationError::InvalidInteger => "invalid",
            ValidationError::MinValue(_) => "min_value",
        }
    }
}

pub type Cleaned<T> = Result<T, ValidationError>;

/// Search text. Blank input means "no search" and yields `None`.
pub fn clean_search(raw: &str) -> Cleaned<Option<String>> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    check_max_length(value, SEARCH_MAX_CHARS)?;
    if value.contains(FORBIDDEN_SEARCH_CHARS) || value.contains(FORBIDDEN_SEARCH_SEQUENCE) {
        return Err(ValidationError::InvalidChars);
    }
    Ok(Some(value.to_string()))
}

/// Display name for the newsletter: letters (Spanish accented vowels and ñ
/// included), whitespace, apostrophe, period and hyphen.
pub fn clean_name(raw: &str) -> Cleaned<String> {
    let value = required(raw)?;
    check_max_length(value, NAME_MAX_CHARS)?;
    if !name_regex().is_match(value) {
        return Err(ValidationError::InvalidName);
    }
    Ok(value.to_string())
}

/// Email address. Length is checked before syntax so an oversized address is
/// always reported as `email_too_long`.
pub fn clean_email(raw: &str) -> Cleaned<String> {
    let value = required(raw)?;
    if value.chars().count() > EMAIL_MAX_CHARS {
        return Err(ValidationError::EmailTooLong);
    }
    if !is_valid_email(value) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(value.to_string())
}

/// Minimum stock filter. Blank means absent; `0` is a real filter. A
/// whole-number decimal such as `5.0` counts as `5`, and values too large for
/// an `i64` saturate, since no stock can reach them anyway.
pub fn clean_min_stock(raw: &str) -> Cleaned<Option<i64>> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let value = strip_zero_fraction(value);
    let parsed = match value.parse::<i64>() {
        Ok(parsed) => parsed,
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => return Err(ValidationError::MinValue(0)),
            _ => return Err(ValidationError::InvalidInteger),
        },
    };
    if parsed < 0 {
        return Err(ValidationError::MinValue(0));
    }
    Ok(Some(parsed))
}

/// `"5.000"` → `"5"`. Any other fraction is left for the integer parse to
/// reject.
fn strip_zero_fraction(value: &str) -> &str {
    match value.split_once('.') {
        Some((whole, fraction)) if fraction.chars().all(|c| c == '0') => whole,
        _ => value,
    }
}

/// Publisher selector. Must name one of `choices` by id; blank means all.
pub fn clean_publisher(raw: &str, choices: &[Publisher]) -> Cleaned<Option<i64>> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let id: i64 = value.parse().map_err(|_| ValidationError::InvalidChoice)?;
    if choices.iter().any(|publisher| publisher.id == id) {
        Ok(Some(id))
    } else {
        Err(ValidationError::InvalidChoice)
    }
}

/// HTML checkbox semantics: absent or unchecked is false.
pub fn clean_checkbox(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|value| value.trim().to_ascii_lowercase()).as_deref(),
        Some("on" | "true" | "1" | "yes")
    )
}

fn required(raw: &str) -> Cleaned<&str> {
    let value = raw.trim();
    if value.is_empty() {
        Err(ValidationError::Required)
    } else {
        Ok(value)
    }
}

fn check_max_length(value: &str, max: usize) -> Cleaned<()> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::MaxLength { max, actual });
    }
    Ok(())
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-záéíóúñA-ZÁÉÍÓÚÑ\s.'-]+$").expect("valid name regex"))
}

fn email_user_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)^(?:[-!#$%&'*+/=?^_`{}|~0-9a-z]+(?:\.[-!#$%&'*+/=?^_`{}|~0-9a-z]+)*|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f!#-\[\]-\x7f]|\\[\x01-\x09\x0b\x0c\x0d-\x7f])*")$"#,
        )
        .expect("valid email user regex")
    })
}

/// Dot-separated hostname labels (non-ASCII letters allowed) ending in an
/// alphabetic or punycode top-level label, with an optional trailing dot.
fn email_domain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:[a-z0-9\x{a1}-\x{ffff}](?:[a-z0-9\x{a1}-\x{ffff}-]{0,61}[a-z0-9\x{a1}-\x{ffff}])?\.)+(?:[a-z\x{a1}-\x{ffff}][a-z\x{a1}-\x{ffff}-]{0,61}[a-z\x{a1}-\x{ffff}]|xn--[a-z0-9]{1,59})\.?$",
        )
        .expect("valid email domain regex")
    })
}

fn is_valid_email(value: &str) -> bool {
    let Some((user, domain)) = value.rsplit_once('@') else {
        return false;
    };
    if user.is_empty() || !email_user_regex().is_match(user) {
        return false;
    }
    if domain.eq_ignore_ascii_case("localhost") {
        return true;
    }
    if let Some(literal) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        let literal = literal.strip_prefix("IPv6:").unwrap_or(literal);
        return literal.parse::<IpAddr>().is_ok();
    }
    email_domain_regex().is_match(domain)
}
