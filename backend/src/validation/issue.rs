//! Issue records: the stable error/warning shape handed to callers.
//!
//! ```json
//! { "type": "MissingPurchaseOrderReference", "severity": "WARNING",
//!   "entity": "sale", "id": "V001", "message": "...",
//!   "details": { "purchaseOrderRef": "OC-999" },
//!   "recommendation": "..." }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::models::EntityKind;

/// Severity of an issue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Record excluded from the import.
    Error,
    /// Informational; nothing excluded.
    Warning,
}

/// Every issue type the validator emits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IssueType {
    // Layer 1 errors
    SaleValidation,
    ClientValidation,
    PurchaseOrderValidation,
    BankValidation,
    WarehouseValidation,

    // Layer 1 warnings (single-record consistency)
    TotalAmountMismatch,
    PaidSaleWithDebt,
    CreditBalanceDetected,
    ClientBalanceMismatch,
    UnitCostMismatch,
    TotalCostMismatch,
    OrderDebtMismatch,
    WarehouseStockMismatch,

    // Layer 3 warnings (cross-entity)
    MissingPurchaseOrderReference,
    MissingClientReference,
    DebtMismatch,
    ClientWithDebtButNoSales,
    MissingDistributorReference,
    InconsistentBankBalance,
}

impl IssueType {
    /// Validation error type for records of `kind`.
    pub fn validation_error(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Sale => Self::SaleValidation,
            EntityKind::Client => Self::ClientValidation,
            EntityKind::PurchaseOrder => Self::PurchaseOrderValidation,
            EntityKind::Bank => Self::BankValidation,
            EntityKind::Warehouse => Self::WarehouseValidation,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SaleValidation => "SaleValidation",
            Self::ClientValidation => "ClientValidation",
            Self::PurchaseOrderValidation => "PurchaseOrderValidation",
            Self::BankValidation => "BankValidation",
            Self::WarehouseValidation => "WarehouseValidation",
            Self::TotalAmountMismatch => "TotalAmountMismatch",
            Self::PaidSaleWithDebt => "PaidSaleWithDebt",
            Self::CreditBalanceDetected => "CreditBalanceDetected",
            Self::ClientBalanceMismatch => "ClientBalanceMismatch",
            Self::UnitCostMismatch => "UnitCostMismatch",
            Self::TotalCostMismatch => "TotalCostMismatch",
            Self::OrderDebtMismatch => "OrderDebtMismatch",
            Self::WarehouseStockMismatch => "WarehouseStockMismatch",
            Self::MissingPurchaseOrderReference => "MissingPurchaseOrderReference",
            Self::MissingClientReference => "MissingClientReference",
            Self::DebtMismatch => "DebtMismatch",
            Self::ClientWithDebtButNoSales => "ClientWithDebtButNoSales",
            Self::MissingDistributorReference => "MissingDistributorReference",
            Self::InconsistentBankBalance => "InconsistentBankBalance",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error or warning about the imported data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Position of the record in its input collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl Issue {
    pub fn error(kind: IssueType, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Error, message)
    }

    pub fn warning(kind: IssueType, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warning, message)
    }

    fn new(kind: IssueType, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            entity: None,
            id: None,
            index: None,
            message: message.into(),
            details: None,
            recommendation: None,
        }
    }

    pub fn with_entity(mut self, entity: EntityKind) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Errors and warnings collected by one validation step.
///
/// Steps return their own log and the caller merges them; there is no
/// shared accumulator, so steps can run on separate tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueLog {
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl IssueLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// File an issue under errors or warnings according to its severity.
    pub fn push(&mut self, issue: Issue) {
        if issue.is_error() {
            self.errors.push(issue);
        } else {
            self.warnings.push(issue);
        }
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    /// Append another log, keeping its order after ours.
    pub fn merge(&mut self, other: IssueLog) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Count issues per type.
pub fn count_by_type<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> BTreeMap<IssueType, usize> {
    let mut counts = BTreeMap::new();
    for issue in issues {
        *counts.entry(issue.kind).or_insert(0) += 1;
    }
    counts
}

/// Round a money amount to cents for issue details.
pub fn cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_serialization_shape() {
        let issue = Issue::warning(IssueType::MissingPurchaseOrderReference, "missing OC")
            .with_entity(EntityKind::Sale)
            .with_id("V001")
            .with_details(json!({"purchaseOrderRef": "OC-999"}));
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "MissingPurchaseOrderReference",
                "severity": "WARNING",
                "entity": "sale",
                "id": "V001",
                "message": "missing OC",
                "details": {"purchaseOrderRef": "OC-999"}
            })
        );
    }

    #[test]
    fn test_error_severity_and_index() {
        let issue = Issue::error(IssueType::SaleValidation, "bad").with_index(3);
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["severity"], "ERROR");
        assert_eq!(value["index"], 3);
        assert_eq!(value["type"], IssueType::SaleValidation.as_str());
    }

    #[test]
    fn test_log_routes_by_severity() {
        let mut log = IssueLog::new();
        log.push(Issue::error(IssueType::ClientValidation, "e"));
        log.push(Issue::warning(IssueType::DebtMismatch, "w"));
        log.push(Issue::warning(IssueType::DebtMismatch, "w2"));
        assert_eq!(log.errors.len(), 1);
        assert_eq!(log.warnings.len(), 2);

        let counts = count_by_type(&log.warnings);
        assert_eq!(counts[&IssueType::DebtMismatch], 2);
    }

    #[test]
    fn test_cents() {
        assert_eq!(cents(1050.004), 1050.0);
        assert_eq!(cents(0.125), 0.13);
    }
}
