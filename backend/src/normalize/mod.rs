//! Field normalizers for spreadsheet values.
//!
//! Spreadsheet exports are inconsistent: client names arrive as numbers
//! (`470.0`), statuses arrive in several languages and casings, and status
//! columns are sometimes merged with numeric columns. These functions map
//! any JSON value to a canonical form. They are total: every input,
//! including `null`, yields a value.

use serde_json::Value;

use crate::models::{ClientStatus, PaymentStatus};

/// Fallback name for a client that cannot be identified.
pub const UNKNOWN_CLIENT: &str = "Unknown";

const PAID_VALUES: &[&str] = &[
    "paid", "pagado", "pagada", "complete", "completo", "completa", "completed", "liquidado",
    "liquidada", "settled",
];

/// Normalize a client name.
///
/// Numbers (and strings holding only a number) become `"Client {n}"`, other
/// strings are trimmed, anything else becomes [`UNKNOWN_CLIENT`].
///
/// # Example
/// ```
/// use serde_json::json;
/// use flow_import::normalize::sanitize_client_name;
///
/// assert_eq!(sanitize_client_name(&json!(470.0)), "Client 470");
/// assert_eq!(sanitize_client_name(&json!("  Primo ")), "Primo");
/// assert_eq!(sanitize_client_name(&json!(null)), "Unknown");
/// ```
pub fn sanitize_client_name(value: &Value) -> String {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) => format!("Client {}", format_number(f)),
            None => format!("Client {}", n),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return UNKNOWN_CLIENT.to_string();
            }
            match parse_plain_number(trimmed) {
                Some(f) => format!("Client {}", format_number(f)),
                None => trimmed.to_string(),
            }
        }
        _ => UNKNOWN_CLIENT.to_string(),
    }
}

/// Normalize a sale payment status.
///
/// Only the paid vocabulary maps to [`PaymentStatus::Complete`]; pending
/// wording, unknown wording and non-strings all count as still owed.
pub fn normalize_sale_status(value: &Value) -> PaymentStatus {
    let Some(text) = as_lower_text(value) else {
        return PaymentStatus::Pending;
    };
    if PAID_VALUES.contains(&text.as_str()) {
        PaymentStatus::Complete
    } else {
        PaymentStatus::Pending
    }
}

/// Normalize a client account status.
///
/// Numeric input comes from a status column merged with a numeric column and
/// is treated as active, as is anything unrecognized.
pub fn normalize_client_status(value: &Value) -> ClientStatus {
    if value.is_number() {
        return ClientStatus::Active;
    }
    match as_lower_text(value).as_deref() {
        Some("inactive" | "inactivo" | "inactiva" | "0") => ClientStatus::Inactive,
        Some("pending" | "pendiente") => ClientStatus::Pending,
        _ => ClientStatus::Active,
    }
}

/// Trimmed distributor name.
pub fn sanitize_distributor(value: &str) -> String {
    value.trim().to_string()
}

/// Parse a string that contains nothing but a number.
///
/// Accepts an optional sign and decimal part; rejects anything else
/// (`"470"` and `"470.0"` parse, `"470 B"` does not).
pub fn parse_plain_number(s: &str) -> Option<f64> {
    let digits = s.strip_prefix(&['-', '+'][..]).unwrap_or(s);
    let valid = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|c| *c == '.').count() <= 1
        && digits.chars().any(|c| c.is_ascii_digit());
    if !valid {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Format a number without a trailing `.0` for integral values.
fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

fn as_lower_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_lowercase()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
