//! Warehouse schema.

use serde_json::Value;

use super::{parse_nested, Field, RecordReader, Schema};
use crate::error::SchemaResult;
use crate::models::{EntityKind, IncomingRecord, OutgoingRecord, Warehouse};
use crate::normalize::{sanitize_client_name, sanitize_distributor};

const INCOMING: Field = Field::new("incoming", &["ingresos", "incomingRecords"]);
const OUTGOING: Field = Field::new("outgoing", &["salidas", "outgoingRecords"]);
const CURRENT_STOCK: Field = Field::new("currentStock", &["stockActual"]);

const ID: Field = Field::new("id", &[]);
const DATE: Field = Field::new("date", &["fecha"]);
const DISTRIBUTOR: Field = Field::new("distributor", &["distribuidor"]);
const CLIENT: Field = Field::new("client", &["cliente"]);
const QUANTITY: Field = Field::new("quantity", &["cantidad"]);
const PURCHASE_ORDER: Field = Field::new("purchaseOrder", &["oc"]);
const CONCEPT: Field = Field::new("concept", &["concepto"]);

/// Parse the raw warehouse object.
///
/// `currentStock` is derived from the movements when not declared.
pub fn parse_warehouse(raw: &Value) -> SchemaResult<Warehouse> {
    let mut r = RecordReader::new(raw)?;

    let incoming_records = parse_nested(&mut r, &INCOMING, parse_incoming);
    let outgoing_records = parse_nested(&mut r, &OUTGOING, parse_outgoing);
    let declared_stock = r.optional_amount(&CURRENT_STOCK);

    r.finish()?;

    let mut warehouse = Warehouse {
        incoming_records,
        outgoing_records,
        current_stock: 0.0,
    };
    warehouse.current_stock = declared_stock.unwrap_or_else(|| warehouse.derived_stock());
    Ok(warehouse)
}

fn parse_incoming(raw: &Value) -> SchemaResult<IncomingRecord> {
    let mut r = RecordReader::new(raw)?;
    let id = r.required_string(&ID);
    let date = r.optional_string(&DATE);
    let distributor = r
        .optional_string(&DISTRIBUTOR)
        .map(|d| sanitize_distributor(&d))
        .unwrap_or_default();
    let quantity = r.required_amount(&QUANTITY);
    let purchase_order = r.optional_string(&PURCHASE_ORDER).unwrap_or_default();
    r.finish()?;
    Ok(IncomingRecord {
        id,
        date,
        distributor,
        quantity,
        purchase_order,
    })
}

fn parse_outgoing(raw: &Value) -> SchemaResult<OutgoingRecord> {
    let mut r = RecordReader::new(raw)?;
    let id = r.required_string(&ID);
    let date = r.optional_string(&DATE);
    let client = sanitize_client_name(r.raw(&CLIENT).unwrap_or(&Value::Null));
    let quantity = r.required_amount(&QUANTITY);
    let concept = r.optional_string(&CONCEPT).unwrap_or_default();
    r.finish()?;
    Ok(OutgoingRecord {
        id,
        date,
        client,
        quantity,
        concept,
    })
}

impl Schema for Warehouse {
    const KIND: EntityKind = EntityKind::Warehouse;

    fn parse(raw: &Value) -> SchemaResult<Self> {
        parse_warehouse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_derived_stock() {
        let raw = json!({
            "ingresos": [
                {"id": "I1", "fecha": "2025-08-01", "distribuidor": "PACMAN", "cantidad": 423, "oc": "OC0001"},
                {"id": "I2", "distribuidor": "Q-MAYA", "cantidad": 100}
            ],
            "salidas": [
                {"id": "S1", "cliente": 470, "cantidad": 150}
            ]
        });
        let warehouse = parse_warehouse(&raw).unwrap();
        assert_eq!(warehouse.incoming_records.len(), 2);
        assert_eq!(warehouse.outgoing_records[0].client, "Client 470");
        assert_eq!(warehouse.incoming_records[0].purchase_order, "OC0001");
        assert_eq!(warehouse.current_stock, 373.0);
    }

    #[test]
    fn test_declared_stock_kept() {
        let raw = json!({"incoming": [], "outgoing": [], "currentStock": 12});
        assert_eq!(parse_warehouse(&raw).unwrap().current_stock, 12.0);
    }

    #[test]
    fn test_empty_object_is_valid() {
        let warehouse = parse_warehouse(&json!({})).unwrap();
        assert_eq!(warehouse, Warehouse::default());
    }

    #[test]
    fn test_movement_without_id() {
        let raw = json!({"salidas": [{"cliente": "Ax", "cantidad": 1}]});
        let err = parse_warehouse(&raw).unwrap_err();
        assert_eq!(err.problems[0].field(), "outgoing[0].id");
    }
}
