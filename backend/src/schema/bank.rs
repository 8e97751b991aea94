//! Bank schema.

use serde_json::Value;

use super::{parse_nested, Field, RecordReader, Schema};
use crate::error::{FieldError, SchemaResult};
use crate::models::{Bank, BankRecord, EntityKind, RecordKind};

const CURRENT_CAPITAL: Field = Field::new("currentCapital", &["capitalActual"]);
const HISTORICAL: Field = Field::new("historical", &["historico"]);
const RECORDS: Field = Field::new("records", &["registros"]);
const INCOMES: Field = Field::new("incomes", &["ingresos"]);
const EXPENSES: Field = Field::new("expenses", &["gastos"]);
const TRANSFERS: Field = Field::new("transfers", &["transferencias"]);

const RECORD_ID: Field = Field::new("id", &[]);
const RECORD_DATE: Field = Field::new("date", &["fecha"]);
const RECORD_TYPE: Field = Field::new("type", &["tipo"]);
const RECORD_CONCEPT: Field = Field::new("concept", &["concepto"]);
const RECORD_AMOUNT: Field = Field::new("amount", &["monto"]);
const RECORD_CATEGORY: Field = Field::new("category", &["categoria"]);

const DEFAULT_CATEGORY: &str = "General";

/// Parse a raw bank object (one value of the `banks` map).
///
/// Required: `currentCapital`. `historical` defaults to the current capital.
/// The `incomes`, `expenses` and `transfers` arrays are carried through.
pub fn parse_bank(raw: &Value) -> SchemaResult<Bank> {
    let mut r = RecordReader::new(raw)?;

    let current_capital = r.required_number(&CURRENT_CAPITAL);
    let historical = r.optional_number(&HISTORICAL).unwrap_or(current_capital);
    let records = parse_nested(&mut r, &RECORDS, parse_bank_record);
    let incomes = r.array(&INCOMES).to_vec();
    let expenses = r.array(&EXPENSES).to_vec();
    let transfers = r.array(&TRANSFERS).to_vec();

    r.finish()?;

    Ok(Bank {
        current_capital,
        historical,
        records,
        incomes,
        expenses,
        transfers,
    })
}

/// Parse one ledger record. `type` accepts `income`/`expense` and the
/// spreadsheet's `Ingreso`/`Egreso`, case-insensitively.
pub fn parse_bank_record(raw: &Value) -> SchemaResult<BankRecord> {
    let mut r = RecordReader::new(raw)?;

    let id = r.optional_string(&RECORD_ID);
    let date = r.optional_string(&RECORD_DATE);
    let kind = match r.optional_string(&RECORD_TYPE) {
        Some(text) => match parse_record_kind(&text) {
            Some(kind) => Some(kind),
            None => {
                r.push(FieldError::UnknownVariant {
                    field: RECORD_TYPE.name.to_string(),
                    value: text,
                    allowed: "income, expense",
                });
                None
            }
        },
        None => {
            r.required_string(&RECORD_TYPE);
            None
        }
    };
    let concept = r.optional_string(&RECORD_CONCEPT).unwrap_or_default();
    let amount = r.required_number(&RECORD_AMOUNT);
    let category = r
        .optional_string(&RECORD_CATEGORY)
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    r.finish()?;

    Ok(BankRecord {
        id,
        date,
        kind: kind.unwrap_or(RecordKind::Income),
        concept,
        amount,
        category,
    })
}

fn parse_record_kind(text: &str) -> Option<RecordKind> {
    match text.trim().to_lowercase().as_str() {
        "income" | "ingreso" => Some(RecordKind::Income),
        "expense" | "egreso" | "gasto" => Some(RecordKind::Expense),
        _ => None,
    }
}

impl Schema for Bank {
    const KIND: EntityKind = EntityKind::Bank;

    fn parse(raw: &Value) -> SchemaResult<Self> {
        parse_bank(raw)
    }
}
