//! Sale schema.

use serde_json::Value;

use super::{parse_nested, Field, RecordReader, Schema};
use crate::error::SchemaResult;
use crate::models::{EntityKind, LineItem, Sale};
use crate::normalize::{normalize_sale_status, sanitize_client_name};

const ID: Field = Field::new("id", &[]);
const DATE: Field = Field::new("date", &["fecha"]);
const PURCHASE_ORDER_REF: Field = Field::new("purchaseOrderRef", &["ocRelacionada", "oc"]);
const CLIENT: Field = Field::new("client", &["cliente"]);
const DESTINATION: Field = Field::new("destination", &["destino"]);
const QUANTITY: Field = Field::new("quantity", &["cantidad"]);
const UNIT_PRICE: Field = Field::new("unitPrice", &["precioVenta"]);
const TOTAL_AMOUNT: Field = Field::new("totalAmount", &["totalVenta"]);
const VAULT_COST: Field = Field::new("vaultCost", &["costoBoveda"]);
const FREIGHT: Field = Field::new("freight", &["fletes"]);
const PROFIT: Field = Field::new("profit", &["utilidades"]);
const PAYMENT_STATUS: Field = Field::new("paymentStatus", &["estadoPago"]);
const DEBT: Field = Field::new("debt", &["adeudo"]);
const CONCEPT: Field = Field::new("concept", &["concepto"]);
const PRODUCTS: Field = Field::new("products", &["productos"]);

const ITEM_NAME: Field = Field::new("name", &["nombre"]);
const ITEM_QUANTITY: Field = Field::new("quantity", &["cantidad"]);
const ITEM_PRICE: Field = Field::new("price", &["precio"]);

/// Parse a raw sale.
///
/// Required: `id`, `quantity`, `unitPrice`, `totalAmount`. The client name
/// and payment status are normalized and never fail.
pub fn parse_sale(raw: &Value) -> SchemaResult<Sale> {
    let mut r = RecordReader::new(raw)?;

    let id = r.required_string(&ID);
    let date = r.optional_date(&DATE);
    let purchase_order_ref = r.optional_string(&PURCHASE_ORDER_REF);
    let client = sanitize_client_name(r.raw(&CLIENT).unwrap_or(&Value::Null));
    let destination = r.optional_string(&DESTINATION);
    let quantity = r.required_amount(&QUANTITY);
    let unit_price = r.required_amount(&UNIT_PRICE);
    let total_amount = r.required_amount(&TOTAL_AMOUNT);
    let vault_cost = r.optional_number(&VAULT_COST).unwrap_or(0.0);
    let freight = r.optional_number(&FREIGHT).unwrap_or(0.0);
    let profit = r.optional_number(&PROFIT);
    let payment_status = normalize_sale_status(r.raw(&PAYMENT_STATUS).unwrap_or(&Value::Null));
    let debt = r.optional_amount(&DEBT).unwrap_or(0.0);
    let concept = r.optional_string(&CONCEPT).unwrap_or_default();
    let products = parse_nested(&mut r, &PRODUCTS, parse_line_item);

    r.finish()?;

    Ok(Sale {
        id,
        date,
        purchase_order_ref,
        client,
        destination,
        quantity,
        unit_price,
        total_amount,
        vault_cost,
        freight,
        profit,
        payment_status,
        debt,
        concept,
        products,
    })
}

/// Parse a product line shared by sales and purchase orders.
pub fn parse_line_item(raw: &Value) -> SchemaResult<LineItem> {
    let mut r = RecordReader::new(raw)?;
    let name = r.required_string(&ITEM_NAME);
    let quantity = r.required_amount(&ITEM_QUANTITY);
    let price = r.required_amount(&ITEM_PRICE);
    r.finish()?;
    Ok(LineItem {
        name,
        quantity,
        price,
    })
}

impl Schema for Sale {
    const KIND: EntityKind = EntityKind::Sale;

    fn parse(raw: &Value) -> SchemaResult<Self> {
        parse_sale(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use crate::models::PaymentStatus;
    use serde_json::json;

    #[test]
    fn test_spreadsheet_sale_normalized() {
        let raw = json!({
            "id": "V001",
            "client": 470.0,
            "totalVenta": 945000,
            "cantidad": 150,
            "precioVenta": 6300,
            "estadoPago": "Pagado",
            "adeudo": 0
        });
        let sale = parse_sale(&raw).unwrap();
        assert_eq!(sale.id, "V001");
        assert_eq!(sale.client, "Client 470");
        assert_eq!(sale.payment_status, PaymentStatus::Complete);
        assert_eq!(sale.total_amount, 945000.0);
        assert_eq!(sale.debt, 0.0);
        assert_eq!(sale.purchase_order_ref, None);
    }

    #[test]
    fn test_missing_id_fails() {
        let raw = json!({"cantidad": 1, "precioVenta": 10, "totalVenta": 10});
        let err = parse_sale(&raw).unwrap_err();
        assert_eq!(err.problems, vec![FieldError::Missing { field: "id".into() }]);
    }

    #[test]
    fn test_non_numeric_quantity_fails() {
        let raw = json!({"id": "V2", "cantidad": "lots", "precioVenta": 10, "totalVenta": 10});
        let err = parse_sale(&raw).unwrap_err();
        assert_eq!(err.problems[0].field(), "quantity");
    }

    #[test]
    fn test_defaults() {
        let raw = json!({"id": "V3", "quantity": 2, "unitPrice": 5, "totalAmount": 10});
        let sale = parse_sale(&raw).unwrap();
        assert_eq!(sale.client, "Unknown");
        assert_eq!(sale.payment_status, PaymentStatus::Pending);
        assert_eq!(sale.vault_cost, 0.0);
        assert!(sale.products.is_empty());
        assert!(sale.profit.is_none());
    }

    #[test]
    fn test_bad_product_line_reported_with_path() {
        let raw = json!({
            "id": "V4", "quantity": 2, "unitPrice": 5, "totalAmount": 10,
            "productos": [{"nombre": "Caja", "cantidad": 2, "precio": 5}, {"nombre": "X", "cantidad": -1, "precio": 1}]
        });
        let err = parse_sale(&raw).unwrap_err();
        assert_eq!(err.problems.len(), 1);
        assert_eq!(err.problems[0].field(), "products[1].quantity");
    }

    #[test]
    fn test_negative_debt_rejected() {
        let raw = json!({"id": "V5", "quantity": 1, "unitPrice": 1, "totalAmount": 1, "debt": -5});
        assert!(parse_sale(&raw).is_err());
    }
}
