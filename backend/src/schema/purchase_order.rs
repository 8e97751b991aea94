//! Purchase order schema.
//!
//! `unitCost`, `totalCost` and `debt` are derived from the other columns when
//! the spreadsheet leaves them empty. Declared values are kept as-is; the
//! consistency pass compares them against the derived ones.

use serde_json::Value;

use super::sale::parse_line_item;
use super::{parse_nested, Field, RecordReader, Schema};
use crate::error::{FieldError, SchemaResult};
use crate::models::{EntityKind, PurchaseOrder};
use crate::normalize::sanitize_distributor;

const ID: Field = Field::new("id", &[]);
const DATE: Field = Field::new("date", &["fecha"]);
const DISTRIBUTOR: Field = Field::new("distributor", &["distribuidor"]);
const QUANTITY: Field = Field::new("quantity", &["cantidad"]);
const DISTRIBUTOR_COST: Field = Field::new("distributorCost", &["costoDistribuidor"]);
const TRANSPORT_COST: Field = Field::new("transportCost", &["costoTransporte"]);
const UNIT_COST: Field = Field::new("unitCost", &["costoPorUnidad"]);
const TOTAL_COST: Field = Field::new("totalCost", &["costoTotal"]);
const PAID_AMOUNT: Field = Field::new("paidAmount", &["pagado"]);
const DEBT: Field = Field::new("debt", &["adeudo"]);
const STOCK: Field = Field::new("stock", &[]);
const PRODUCTS: Field = Field::new("products", &["productos"]);

/// Parse a raw purchase order.
///
/// Required: `id`, `distributor`, `quantity`, `distributorCost`.
pub fn parse_purchase_order(raw: &Value) -> SchemaResult<PurchaseOrder> {
    let mut r = RecordReader::new(raw)?;

    let id = r.required_string(&ID);
    let date = r.optional_date(&DATE);
    let distributor = match r.raw(&DISTRIBUTOR) {
        Some(Value::String(s)) if !s.trim().is_empty() => sanitize_distributor(s),
        Some(Value::String(_)) | None => {
            r.push(FieldError::Missing {
                field: DISTRIBUTOR.name.to_string(),
            });
            String::new()
        }
        Some(_) => r.required_string(&DISTRIBUTOR),
    };
    let quantity = r.required_amount(&QUANTITY);
    let distributor_cost = r.required_amount(&DISTRIBUTOR_COST);
    let transport_cost = r.optional_number(&TRANSPORT_COST).unwrap_or(0.0);
    let unit_cost = r
        .optional_amount(&UNIT_COST)
        .unwrap_or(distributor_cost + transport_cost);
    let total_cost = r.optional_amount(&TOTAL_COST).unwrap_or(unit_cost * quantity);
    let paid_amount = r.optional_amount(&PAID_AMOUNT).unwrap_or(0.0);
    let debt = r
        .optional_amount(&DEBT)
        .unwrap_or((total_cost - paid_amount).max(0.0));
    let stock = r.optional_amount(&STOCK).unwrap_or(0.0);
    let products = parse_nested(&mut r, &PRODUCTS, parse_line_item);

    r.finish()?;

    Ok(PurchaseOrder {
        id,
        date,
        distributor,
        quantity,
        distributor_cost,
        transport_cost,
        unit_cost,
        total_cost,
        paid_amount,
        debt,
        stock,
        products,
    })
}

impl Schema for PurchaseOrder {
    const KIND: EntityKind = EntityKind::PurchaseOrder;

    fn parse(raw: &Value) -> SchemaResult<Self> {
        parse_purchase_order(raw)
    }
}
