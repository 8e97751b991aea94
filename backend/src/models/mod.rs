//! Canonical entities produced by the schema layer.
//!
//! Everything downstream of the schemas sees only these types:
//!
//! - [`Sale`] - A sale with its normalized client and payment status
//! - [`Client`] - A client account with debt or credit balance
//! - [`PurchaseOrder`] - A purchase from a distributor
//! - [`Bank`] - A bank ledger with its declared capital
//! - [`Warehouse`] - Stock movements in and out
//!
//! Distributors are passed through as raw JSON (see [`distributor_name`]).

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Entity Kind
// =============================================================================

/// The entity an issue record refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Sale,
    Client,
    PurchaseOrder,
    Bank,
    Warehouse,
}

impl EntityKind {
    /// Prefix for synthetic identifiers of records without an id.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Client => "client",
            Self::PurchaseOrder => "purchase-order",
            Self::Bank => "bank",
            Self::Warehouse => "warehouse",
        }
    }

    /// Human-readable label used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Client => "client",
            Self::PurchaseOrder => "purchase order",
            Self::Bank => "bank",
            Self::Warehouse => "warehouse",
        }
    }
}

// =============================================================================
// Status Enums
// =============================================================================

/// Payment status of a sale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Still owed, fully or partially.
    #[default]
    Pending,
    /// Fully paid.
    Complete,
}

/// Account status of a client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

/// Direction of a bank ledger record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Income,
    Expense,
}

// =============================================================================
// Sale
// =============================================================================

/// A product line on a sale or purchase order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    pub quantity: f64,
    pub price: f64,
}

/// A validated sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Purchase order this sale draws stock from (soft reference).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_order_ref: Option<String>,
    /// Normalized client name (soft reference to [`Client::name`]).
    pub client: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub vault_cost: f64,
    pub freight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit: Option<f64>,
    pub payment_status: PaymentStatus,
    pub debt: f64,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub concept: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub products: Vec<LineItem>,
}

impl Sale {
    /// Amount implied by quantity and unit price.
    pub fn expected_total(&self) -> f64 {
        self.quantity * self.unit_price
    }

    pub fn is_pending(&self) -> bool {
        self.payment_status == PaymentStatus::Pending
    }
}

// =============================================================================
// Client
// =============================================================================

/// A validated client account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Outstanding debt, never negative.
    pub debt: f64,
    pub total_purchased: f64,
    pub total_paid: f64,
    pub status: ClientStatus,
    /// Set when the spreadsheet carried a negative debt (client overpaid).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_balance: Option<f64>,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub notes: String,
}

impl Client {
    /// Debt as the spreadsheet declared it: negative when the client has credit.
    pub fn signed_balance(&self) -> f64 {
        self.debt - self.credit_balance.unwrap_or(0.0)
    }

    /// Identifier used in issue records: the id when present, else the name.
    pub fn reference(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

// =============================================================================
// Purchase Order
// =============================================================================

/// A validated purchase order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Distributor name (soft reference).
    pub distributor: String,
    pub quantity: f64,
    pub distributor_cost: f64,
    pub transport_cost: f64,
    pub unit_cost: f64,
    pub total_cost: f64,
    pub paid_amount: f64,
    pub debt: f64,
    pub stock: f64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub products: Vec<LineItem>,
}

impl PurchaseOrder {
    pub fn expected_unit_cost(&self) -> f64 {
        self.distributor_cost + self.transport_cost
    }

    pub fn expected_total_cost(&self) -> f64 {
        self.unit_cost * self.quantity
    }

    pub fn expected_debt(&self) -> f64 {
        (self.total_cost - self.paid_amount).max(0.0)
    }
}

// =============================================================================
// Bank
// =============================================================================

/// One movement in a bank ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BankRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub concept: String,
    pub amount: f64,
    pub category: String,
}

/// A validated bank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bank {
    pub current_capital: f64,
    /// Historical capital; defaults to the current capital.
    pub historical: f64,
    pub records: Vec<BankRecord>,
    #[serde(default)]
    pub incomes: Vec<Value>,
    #[serde(default)]
    pub expenses: Vec<Value>,
    #[serde(default)]
    pub transfers: Vec<Value>,
}

impl Bank {
    /// Income minus expense over the whole ledger.
    pub fn ledger_balance(&self) -> f64 {
        self.records.iter().fold(0.0, |acc, r| match r.kind {
            RecordKind::Income => acc + r.amount,
            RecordKind::Expense => acc - r.amount,
        })
    }
}

// =============================================================================
// Warehouse
// =============================================================================

/// Stock received from a distributor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncomingRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub distributor: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub purchase_order: String,
}

/// Stock handed out to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub client: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub concept: String,
}

/// The validated warehouse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub incoming_records: Vec<IncomingRecord>,
    pub outgoing_records: Vec<OutgoingRecord>,
    pub current_stock: f64,
}

impl Warehouse {
    /// Stock implied by the movements.
    pub fn derived_stock(&self) -> f64 {
        let incoming: f64 = self.incoming_records.iter().map(|r| r.quantity).sum();
        let outgoing: f64 = self.outgoing_records.iter().map(|r| r.quantity).sum();
        incoming - outgoing
    }
}

// =============================================================================
// Distributor
// =============================================================================

/// Name of a pass-through distributor record.
///
/// Accepts `{ "name": .. }`, `{ "nombre": .. }` or a bare string.
pub fn distributor_name(value: &Value) -> Option<String> {
    let name = match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("nombre"))
            .and_then(Value::as_str),
        _ => None,
    }?;
    let trimmed = name.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(kind: RecordKind, amount: f64) -> BankRecord {
        BankRecord {
            id: None,
            date: None,
            kind,
            concept: String::new(),
            amount,
            category: "General".into(),
        }
    }

    #[test]
    fn test_ledger_balance() {
        let bank = Bank {
            current_capital: 0.0,
            historical: 0.0,
            records: vec![
                record(RecordKind::Income, 10_000.0),
                record(RecordKind::Income, 250.0),
                record(RecordKind::Expense, 200.0),
            ],
            incomes: vec![],
            expenses: vec![],
            transfers: vec![],
        };
        assert_eq!(bank.ledger_balance(), 10_050.0);
    }

    #[test]
    fn test_client_signed_balance() {
        let client = Client {
            id: None,
            name: "Primo".into(),
            phone: None,
            debt: 0.0,
            total_purchased: 0.0,
            total_paid: 3000.0,
            status: ClientStatus::Active,
            credit_balance: Some(3000.0),
            notes: String::new(),
        };
        assert_eq!(client.signed_balance(), -3000.0);
        assert_eq!(client.reference(), "Primo");
    }

    #[test]
    fn test_distributor_name_shapes() {
        assert_eq!(distributor_name(&json!({"name": " PACMAN "})), Some("PACMAN".into()));
        assert_eq!(distributor_name(&json!({"nombre": "Q-MAYA"})), Some("Q-MAYA".into()));
        assert_eq!(distributor_name(&json!("Valle")), Some("Valle".into()));
        assert_eq!(distributor_name(&json!({"name": ""})), None);
        assert_eq!(distributor_name(&json!(42)), None);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_value(PaymentStatus::Complete).unwrap(), json!("complete"));
        assert_eq!(serde_json::to_value(ClientStatus::Inactive).unwrap(), json!("inactive"));
        assert_eq!(serde_json::to_value(RecordKind::Expense).unwrap(), json!("expense"));
    }
}
