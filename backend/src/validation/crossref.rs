//! Layer 3: cross-entity reference and balance checks.
//!
//! Runs once every Layer-1 collection is done and only reads the validated
//! data. All findings are warnings: references between sheets are soft and
//! a missing client or distributor is created downstream on import.

use serde_json::json;
use std::collections::{BTreeMap, HashSet};

use super::consistency::exceeds;
use super::issue::{cents, Issue, IssueLog, IssueType};
use super::validator::ImportData;
use crate::config::ValidatorConfig;
use crate::models::{distributor_name, Bank, Client, EntityKind, PurchaseOrder, Sale};

/// Run every cross-entity check, in a fixed order.
pub fn cross_validate(data: &ImportData, config: &ValidatorConfig) -> IssueLog {
    let mut log = IssueLog::new();
    log.extend(check_purchase_order_refs(&data.sales, &data.purchase_orders));
    log.extend(check_client_refs(&data.sales, &data.clients));
    log.extend(check_client_debts(&data.sales, &data.clients, config));
    log.extend(check_distributor_refs(&data.purchase_orders, &data.distributors));
    log.extend(check_bank_balances(&data.banks, config));
    log
}

/// One warning per sale whose `purchaseOrderRef` names no validated order.
pub fn check_purchase_order_refs(sales: &[Sale], orders: &[PurchaseOrder]) -> Vec<Issue> {
    let ids: HashSet<&str> = orders.iter().map(|o| o.id.as_str()).collect();

    sales
        .iter()
        .filter_map(|sale| {
            let reference = sale.purchase_order_ref.as_deref()?;
            if ids.contains(reference) {
                return None;
            }
            Some(
                Issue::warning(
                    IssueType::MissingPurchaseOrderReference,
                    format!("Sale references purchase order \"{}\" which does not exist", reference),
                )
                .with_entity(EntityKind::Sale)
                .with_id(&sale.id)
                .with_details(json!({ "client": sale.client, "purchaseOrderRef": reference }))
                .with_recommendation("Check whether the purchase order was deleted or the id is mistyped"),
            )
        })
        .collect()
}

/// Sales whose client is not in the client sheet.
pub fn check_client_refs(sales: &[Sale], clients: &[Client]) -> Vec<Issue> {
    let names: HashSet<&str> = clients.iter().map(|c| c.name.as_str()).collect();

    sales
        .iter()
        .filter(|sale| !names.contains(sale.client.as_str()))
        .map(|sale| {
            Issue::warning(
                IssueType::MissingClientReference,
                format!("Sale references client \"{}\" which is not in the client list", sale.client),
            )
            .with_entity(EntityKind::Sale)
            .with_id(&sale.id)
            .with_details(json!({ "client": sale.client }))
            .with_recommendation("The client will be created automatically on import; review its data")
        })
        .collect()
}

/// Declared client debt against the debt of the client's pending sales.
pub fn check_client_debts(sales: &[Sale], clients: &[Client], config: &ValidatorConfig) -> Vec<Issue> {
    // client name -> pending debt; presence means the client has sales at all
    let mut pending_debt: BTreeMap<&str, f64> = BTreeMap::new();
    for sale in sales {
        let total = pending_debt.entry(sale.client.as_str()).or_insert(0.0);
        if sale.is_pending() {
            *total += sale.debt;
        }
    }

    let mut issues = Vec::new();
    for client in clients {
        match pending_debt.get(client.name.as_str()) {
            None if client.debt > 0.0 => issues.push(
                Issue::warning(
                    IssueType::ClientWithDebtButNoSales,
                    format!("Client owes ${:.2} but has no recorded sales", client.debt),
                )
                .with_entity(EntityKind::Client)
                .with_id(client.reference())
                .with_details(json!({ "name": client.name, "debt": cents(client.debt) }))
                .with_recommendation("Check whether the debt comes from older sales that were not imported"),
            ),
            None => {}
            Some(&calculated) => {
                if exceeds(calculated, client.debt, config.money_tolerance) {
                    issues.push(
                        Issue::warning(
                            IssueType::DebtMismatch,
                            format!(
                                "Calculated debt ${:.2} differs from declared debt ${:.2}",
                                calculated, client.debt
                            ),
                        )
                        .with_entity(EntityKind::Client)
                        .with_id(client.reference())
                        .with_details(json!({
                            "name": client.name,
                            "calculatedDebt": cents(calculated),
                            "declaredDebt": cents(client.debt),
                            "difference": cents((calculated - client.debt).abs()),
                        }))
                        .with_recommendation("Check the debt formulas in the spreadsheet or look for unrecorded payments"),
                    );
                }
            }
        }
    }
    issues
}

/// Purchase orders whose distributor is not in the distributor list.
pub fn check_distributor_refs(orders: &[PurchaseOrder], distributors: &[serde_json::Value]) -> Vec<Issue> {
    let names: HashSet<String> = distributors.iter().filter_map(distributor_name).collect();

    orders
        .iter()
        .filter(|order| !names.contains(&order.distributor))
        .map(|order| {
            Issue::warning(
                IssueType::MissingDistributorReference,
                format!(
                    "Purchase order references distributor \"{}\" which is not in the list",
                    order.distributor
                ),
            )
            .with_entity(EntityKind::PurchaseOrder)
            .with_id(&order.id)
            .with_details(json!({ "distributor": order.distributor }))
            .with_recommendation("The distributor will be created automatically on import")
        })
        .collect()
}

/// Ledger balance against declared capital, with the wide bank tolerance.
pub fn check_bank_balances(banks: &BTreeMap<String, Bank>, config: &ValidatorConfig) -> Vec<Issue> {
    banks
        .iter()
        .filter_map(|(name, bank)| {
            let calculated = bank.ledger_balance();
            if !exceeds(calculated, bank.current_capital, config.bank_tolerance) {
                return None;
            }
            Some(
                Issue::warning(
                    IssueType::InconsistentBankBalance,
                    format!(
                        "Calculated balance ${:.2} differs from current capital ${:.2}",
                        calculated, bank.current_capital
                    ),
                )
                .with_entity(EntityKind::Bank)
                .with_id(name.as_str())
                .with_details(json!({
                    "currentCapital": cents(bank.current_capital),
                    "calculatedBalance": cents(calculated),
                    "difference": cents((calculated - bank.current_capital).abs()),
                }))
                .with_recommendation("May come from an opening balance or unrecorded transfers"),
            )
        })
        .collect()
}
