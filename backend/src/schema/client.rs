//! Client schema.
//!
//! A negative debt in the spreadsheet means the client overpaid. Instead of
//! rejecting the record, the debt is cleared and the amount moves to
//! `creditBalance` with a note explaining where it came from.

use serde_json::Value;

use super::{Field, RecordReader, Schema};
use crate::error::SchemaResult;
use crate::models::{Client, EntityKind};
use crate::normalize::{normalize_client_status, sanitize_client_name};

const ID: Field = Field::new("id", &[]);
const NAME: Field = Field::new("name", &["nombre"]);
const PHONE: Field = Field::new("phone", &["telefono"]);
const DEBT: Field = Field::new("debt", &["adeudo"]);
const TOTAL_PURCHASED: Field = Field::new("totalPurchased", &["totalComprado"]);
const TOTAL_PAID: Field = Field::new("totalPaid", &["totalAbonado"]);
const STATUS: Field = Field::new("status", &["estado"]);
const NOTES: Field = Field::new("notes", &["observaciones"]);

/// Parse a raw client.
///
/// Required: `name`, `debt`. The name goes through the same sanitizer as
/// sale client names so numeric names match across sheets.
pub fn parse_client(raw: &Value) -> SchemaResult<Client> {
    let mut r = RecordReader::new(raw)?;

    let id = r.optional_string(&ID);
    let name = if r.is_present(&NAME) {
        sanitize_client_name(r.raw(&NAME).unwrap_or(&Value::Null))
    } else {
        r.required_string(&NAME)
    };
    let phone = r.optional_string(&PHONE);
    let raw_debt = r.required_number(&DEBT);
    let total_purchased = r.optional_amount(&TOTAL_PURCHASED).unwrap_or(0.0);
    let total_paid = r.optional_amount(&TOTAL_PAID).unwrap_or(0.0);
    let status = normalize_client_status(r.raw(&STATUS).unwrap_or(&Value::Null));
    let notes = r.optional_string(&NOTES).unwrap_or_default();

    r.finish()?;

    let (debt, credit_balance, notes) = if raw_debt < 0.0 {
        let credit = raw_debt.abs();
        let note = format!("Credit balance: ${:.2}", credit);
        let notes = if notes.is_empty() {
            note
        } else {
            format!("{} | {}", notes, note)
        };
        (0.0, Some(credit), notes)
    } else {
        (raw_debt, None, notes)
    };

    Ok(Client {
        id,
        name,
        phone,
        debt,
        total_purchased,
        total_paid,
        status,
        credit_balance,
        notes,
    })
}

impl Schema for Client {
    const KIND: EntityKind = EntityKind::Client;

    fn parse(raw: &Value) -> SchemaResult<Self> {
        parse_client(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClientStatus;
    use serde_json::json;

    #[test]
    fn test_negative_debt_becomes_credit_balance() {
        let raw = json!({"nombre": "Primo", "adeudo": -3000, "totalAbonado": 3000});
        let client = parse_client(&raw).unwrap();
        assert_eq!(client.name, "Primo");
        assert_eq!(client.debt, 0.0);
        assert_eq!(client.credit_balance, Some(3000.0));
        assert_eq!(client.notes, "Credit balance: $3000.00");
        assert_eq!(client.total_paid, 3000.0);
        assert_eq!(client.status, ClientStatus::Active);
    }

    #[test]
    fn test_existing_notes_kept() {
        let raw = json!({"name": "Ax", "debt": -10.5, "observaciones": "VIP"});
        let client = parse_client(&raw).unwrap();
        assert_eq!(client.notes, "VIP | Credit balance: $10.50");
    }

    #[test]
    fn test_numeric_name_and_status() {
        let raw = json!({"id": "C1", "nombre": 470, "adeudo": 100, "estado": 2500});
        let client = parse_client(&raw).unwrap();
        assert_eq!(client.name, "Client 470");
        assert_eq!(client.status, ClientStatus::Active);
        assert_eq!(client.credit_balance, None);
        assert_eq!(client.reference(), "C1");
    }

    #[test]
    fn test_missing_name_and_debt() {
        let raw = json!({"id": "C2"});
        let err = parse_client(&raw).unwrap_err();
        let fields: Vec<&str> = err.problems.iter().map(|p| p.field()).collect();
        assert_eq!(fields, vec!["name", "debt"]);
    }

    #[test]
    fn test_negative_totals_rejected() {
        let raw = json!({"name": "Bo", "debt": 0, "totalComprado": -1});
        assert!(parse_client(&raw).is_err());
    }
}
