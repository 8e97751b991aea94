//! Single-record consistency checks.
//!
//! Run by the Layer-1 validator right after a record parses. Each check
//! compares fields of one record against each other and reports a
//! `WARNING` when they disagree by more than the configured tolerance:
//! `|actual - expected| > tolerance`. A value exactly at the tolerance passes.

use serde_json::json;

use super::issue::{cents, Issue, IssueType};
use crate::config::ValidatorConfig;
use crate::models::{Client, EntityKind, PaymentStatus, PurchaseOrder, Sale, Warehouse};

/// Business-rule checks for a parsed entity.
pub trait ConsistencyCheck {
    fn check(&self, config: &ValidatorConfig) -> Vec<Issue>;
}

/// Whether `actual` is further than `tolerance` from `expected`.
pub fn exceeds(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() > tolerance
}

fn mismatch_details(declared: f64, calculated: f64) -> serde_json::Value {
    json!({
        "declared": cents(declared),
        "calculated": cents(calculated),
        "difference": cents((declared - calculated).abs()),
    })
}

impl ConsistencyCheck for Sale {
    fn check(&self, config: &ValidatorConfig) -> Vec<Issue> {
        let mut issues = Vec::new();

        let expected = self.expected_total();
        if exceeds(self.total_amount, expected, config.money_tolerance) {
            issues.push(
                Issue::warning(
                    IssueType::TotalAmountMismatch,
                    format!(
                        "Sale total ${:.2} differs from quantity x unit price ${:.2}",
                        self.total_amount, expected
                    ),
                )
                .with_entity(EntityKind::Sale)
                .with_id(&self.id)
                .with_details(mismatch_details(self.total_amount, expected))
                .with_recommendation("Check the sale price and quantity formulas in the spreadsheet"),
            );
        }

        if self.payment_status == PaymentStatus::Complete && self.debt > config.money_tolerance {
            issues.push(
                Issue::warning(
                    IssueType::PaidSaleWithDebt,
                    format!("Sale is marked paid but still carries debt of ${:.2}", self.debt),
                )
                .with_entity(EntityKind::Sale)
                .with_id(&self.id)
                .with_details(json!({ "debt": cents(self.debt) }))
                .with_recommendation("Either the payment status or the debt column is wrong"),
            );
        }

        issues
    }
}

impl ConsistencyCheck for Client {
    fn check(&self, config: &ValidatorConfig) -> Vec<Issue> {
        let mut issues = Vec::new();

        if let Some(credit) = self.credit_balance.filter(|c| *c > 0.0) {
            issues.push(
                Issue::warning(
                    IssueType::CreditBalanceDetected,
                    format!("Client has a credit balance of ${:.2}", credit),
                )
                .with_entity(EntityKind::Client)
                .with_id(self.reference())
                .with_details(json!({ "name": self.name, "creditBalance": cents(credit) }))
                .with_recommendation("Check whether the client overpaid or a payment was recorded twice"),
            );
        }

        // Only meaningful when the sheet declared the totals.
        if self.total_purchased > 0.0 || self.total_paid > 0.0 {
            let declared = self.signed_balance();
            let expected = self.total_purchased - self.total_paid;
            if exceeds(declared, expected, config.money_tolerance) {
                issues.push(
                    Issue::warning(
                        IssueType::ClientBalanceMismatch,
                        format!(
                            "Client balance ${:.2} differs from purchased minus paid ${:.2}",
                            declared, expected
                        ),
                    )
                    .with_entity(EntityKind::Client)
                    .with_id(self.reference())
                    .with_details(mismatch_details(declared, expected))
                    .with_recommendation("Check the client's payments and purchase totals"),
                );
            }
        }

        issues
    }
}

impl ConsistencyCheck for PurchaseOrder {
    fn check(&self, config: &ValidatorConfig) -> Vec<Issue> {
        let tolerance = config.money_tolerance;
        let checks = [
            (IssueType::UnitCostMismatch, "Unit cost", self.unit_cost, self.expected_unit_cost(), "distributor + transport cost"),
            (IssueType::TotalCostMismatch, "Total cost", self.total_cost, self.expected_total_cost(), "quantity x unit cost"),
            (IssueType::OrderDebtMismatch, "Order debt", self.debt, self.expected_debt(), "total cost - paid"),
        ];

        checks
            .into_iter()
            .filter(|(_, _, declared, expected, _)| exceeds(*declared, *expected, tolerance))
            .map(|(kind, what, declared, expected, formula)| {
                Issue::warning(
                    kind,
                    format!("{} ${:.2} differs from {} ${:.2}", what, declared, formula, expected),
                )
                .with_entity(EntityKind::PurchaseOrder)
                .with_id(&self.id)
                .with_details(mismatch_details(declared, expected))
                .with_recommendation("Check the cost formulas of this purchase order")
            })
            .collect()
    }
}

impl ConsistencyCheck for Warehouse {
    fn check(&self, config: &ValidatorConfig) -> Vec<Issue> {
        let derived = self.derived_stock();
        if !exceeds(self.current_stock, derived, config.stock_tolerance) {
            return Vec::new();
        }
        vec![Issue::warning(
            IssueType::WarehouseStockMismatch,
            format!(
                "Declared stock {} differs from incoming minus outgoing {}",
                self.current_stock, derived
            ),
        )
        .with_entity(EntityKind::Warehouse)
        .with_details(json!({
            "declared": self.current_stock,
            "calculated": derived,
            "difference": (self.current_stock - derived).abs(),
        }))
        .with_recommendation("Look for warehouse movements missing from the spreadsheet")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{parse_client, parse_purchase_order, parse_sale, parse_warehouse};
    use serde_json::json;

    fn sale_with_total(total: f64) -> Sale {
        parse_sale(&json!({
            "id": "V1", "cantidad": 150, "precioVenta": 6300, "totalVenta": total,
            "estadoPago": "Pendiente", "adeudo": total
        }))
        .unwrap()
    }

    #[test]
    fn test_total_tolerance_boundary() {
        let config = ValidatorConfig::default();
        assert!(sale_with_total(945_000.0).check(&config).is_empty());
        assert!(sale_with_total(945_001.0).check(&config).is_empty());

        let issues = sale_with_total(945_001.01).check(&config);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueType::TotalAmountMismatch);
    }

    #[test]
    fn test_paid_sale_with_debt() {
        let sale = parse_sale(&json!({
            "id": "V2", "quantity": 1, "unitPrice": 100, "totalAmount": 100,
            "paymentStatus": "Pagado", "debt": 40
        }))
        .unwrap();
        let issues = sale.check(&ValidatorConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueType::PaidSaleWithDebt);
    }

    #[test]
    fn test_client_credit_balance_warning() {
        let client = parse_client(&json!({"nombre": "Primo", "adeudo": -3000, "totalAbonado": 3000})).unwrap();
        let issues = client.check(&ValidatorConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueType::CreditBalanceDetected);
        assert_eq!(issues[0].id.as_deref(), Some("Primo"));
    }

    #[test]
    fn test_client_balance_mismatch() {
        let client = parse_client(&json!({
            "name": "Ax", "debt": 500, "totalPurchased": 1000, "totalPaid": 200
        }))
        .unwrap();
        let issues = client.check(&ValidatorConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueType::ClientBalanceMismatch);
        assert_eq!(issues[0].details.as_ref().unwrap()["difference"], 300.0);
    }

    #[test]
    fn test_client_without_totals_not_compared() {
        let client = parse_client(&json!({"name": "Bo", "debt": 500})).unwrap();
        assert!(client.check(&ValidatorConfig::default()).is_empty());
    }

    #[test]
    fn test_order_cost_mismatches() {
        let order = parse_purchase_order(&json!({
            "id": "OC1", "distributor": "PACMAN", "quantity": 10,
            "distributorCost": 100, "transportCost": 10, "unitCost": 100,
            "totalCost": 1000, "paidAmount": 0, "debt": 1000
        }))
        .unwrap();
        let issues = order.check(&ValidatorConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueType::UnitCostMismatch);
        assert!(issues[0].message.contains("$100.00"));
        assert!(issues[0].message.contains("$110.00"));
    }

    #[test]
    fn test_consistent_order() {
        let order = parse_purchase_order(&json!({
            "id": "OC2", "distributor": "PACMAN", "quantity": 10, "distributorCost": 100
        }))
        .unwrap();
        assert!(order.check(&ValidatorConfig::default()).is_empty());
    }

    #[test]
    fn test_warehouse_stock_mismatch() {
        let warehouse = parse_warehouse(&json!({
            "incoming": [{"id": "I1", "quantity": 10}],
            "outgoing": [{"id": "S1", "quantity": 4}],
            "currentStock": 7
        }))
        .unwrap();
        let issues = warehouse.check(&ValidatorConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueType::WarehouseStockMismatch);
    }
}
