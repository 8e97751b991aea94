//! Import validator: Layer 1 per collection, then Layer 3 across entities.
//!
//! # Example
//!
//! ```rust,ignore
//! use flow_import::{ImportPayload, ImportValidator};
//!
//! let payload = ImportPayload::from_value(raw)?;
//! let validator = ImportValidator::default();
//! let result = validator.validate_all(&payload);
//! let report = validator.generate_report(&result);
//! println!("{} errors, {} warnings", report.summary.total_errors, report.summary.total_warnings);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};

use super::consistency::ConsistencyCheck;
use super::crossref::cross_validate;
use super::issue::{Issue, IssueLog};
use super::report::{build_report, ValidationReport};
use super::typecheck::{validate_banks, validate_collection, validate_warehouse, CollectionOutcome};
use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::config::ValidatorConfig;
use crate::models::{Bank, Client, PurchaseOrder, Sale, Warehouse};
use crate::payload::ImportPayload;
use crate::schema::Schema;

/// Validated entities, ready for the dashboard store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportData {
    pub sales: Vec<Sale>,
    pub clients: Vec<Client>,
    pub purchase_orders: Vec<PurchaseOrder>,
    pub banks: BTreeMap<String, Bank>,
    pub warehouse: Warehouse,
    pub distributors: Vec<Value>,
}

/// Processed and validated counts for one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub processed: usize,
    pub validated: usize,
}

impl CollectionStats {
    fn of<T>(outcome: &CollectionOutcome<T>) -> Self {
        Self {
            processed: outcome.processed,
            validated: outcome.validated.len(),
        }
    }

    /// Records that failed their schema.
    pub fn rejected(&self) -> usize {
        self.processed - self.validated
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseStats {
    pub incoming: usize,
    pub outgoing: usize,
    pub current_stock: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub sales: CollectionStats,
    pub clients: CollectionStats,
    pub purchase_orders: CollectionStats,
    pub banks: CollectionStats,
    pub warehouse: WarehouseStats,
    pub distributors: usize,
}

/// Output of [`ImportValidator::validate_all`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// `true` iff there are no errors; warnings do not count.
    pub success: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub data: ImportData,
    pub stats: ImportStats,
}

/// Layer-1 outcomes, one per collection.
struct TypeCheckOutcome {
    sales: CollectionOutcome<Sale>,
    clients: CollectionOutcome<Client>,
    purchase_orders: CollectionOutcome<PurchaseOrder>,
    banks: CollectionOutcome<(String, Bank)>,
    warehouse: (Warehouse, IssueLog),
}

/// Runs the validation layers with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct ImportValidator {
    config: ValidatorConfig,
}

impl ImportValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate every collection, one after the other.
    pub fn validate_all(&self, payload: &ImportPayload) -> ValidationResult {
        log_info("Layer 1: type validation");
        self.log_tolerances();
        let outcome = TypeCheckOutcome {
            sales: validate_collection(&payload.sales, &self.config),
            clients: validate_collection(&payload.clients, &self.config),
            purchase_orders: validate_collection(&payload.purchase_orders, &self.config),
            banks: validate_banks(&payload.banks),
            warehouse: validate_warehouse(payload.warehouse.as_ref(), &self.config),
        };
        self.cross_reference(outcome, payload.distributors.clone())
    }

    /// Same as [`ImportValidator::validate_all`] with each Layer-1
    /// collection on its own blocking task.
    ///
    /// Outcomes are merged in the same fixed order after all tasks join, so
    /// the result is identical to the sequential one. Only fails if a task
    /// panicked.
    pub async fn validate_all_concurrent(&self, payload: ImportPayload) -> Result<ValidationResult, JoinError> {
        log_info("Layer 1: type validation (concurrent)");
        self.log_tolerances();
        let payload = Arc::new(payload);
        let config = Arc::new(self.config.clone());

        let sales = spawn_collection::<Sale>(&payload, &config, |p| p.sales.as_slice());
        let clients = spawn_collection::<Client>(&payload, &config, |p| p.clients.as_slice());
        let orders = spawn_collection::<PurchaseOrder>(&payload, &config, |p| p.purchase_orders.as_slice());
        let banks = {
            let payload = Arc::clone(&payload);
            tokio::task::spawn_blocking(move || validate_banks(&payload.banks))
        };
        let warehouse = {
            let payload = Arc::clone(&payload);
            let config = Arc::clone(&config);
            tokio::task::spawn_blocking(move || validate_warehouse(payload.warehouse.as_ref(), &config))
        };

        let (sales, clients, purchase_orders, banks, warehouse) =
            tokio::try_join!(sales, clients, orders, banks, warehouse)?;

        let outcome = TypeCheckOutcome {
            sales,
            clients,
            purchase_orders,
            banks,
            warehouse,
        };
        Ok(self.cross_reference(outcome, payload.distributors.clone()))
    }

    /// Build the report (summary and recommendations) for a result.
    pub fn generate_report(&self, result: &ValidationResult) -> ValidationReport {
        build_report(result, &self.config.rules)
    }

    /// Merge Layer-1 outcomes in entity order, then run Layer 3.
    fn log_tolerances(&self) {
        log_info_indent(
            format!(
                "Tolerances: money ${:.2}, bank ${:.2}, stock {}",
                self.config.money_tolerance, self.config.bank_tolerance, self.config.stock_tolerance
            ),
            1,
        );
    }

    fn cross_reference(&self, outcome: TypeCheckOutcome, distributors: Vec<Value>) -> ValidationResult {
        let TypeCheckOutcome {
            sales,
            clients,
            purchase_orders,
            banks,
            warehouse: (warehouse, warehouse_issues),
        } = outcome;

        let stats = ImportStats {
            sales: CollectionStats::of(&sales),
            clients: CollectionStats::of(&clients),
            purchase_orders: CollectionStats::of(&purchase_orders),
            banks: CollectionStats::of(&banks),
            warehouse: WarehouseStats {
                incoming: warehouse.incoming_records.len(),
                outgoing: warehouse.outgoing_records.len(),
                current_stock: warehouse.current_stock,
            },
            distributors: distributors.len(),
        };

        let mut issues = IssueLog::new();
        issues.merge(sales.issues);
        issues.merge(clients.issues);
        issues.merge(purchase_orders.issues);
        issues.merge(banks.issues);
        issues.merge(warehouse_issues);

        let data = ImportData {
            sales: sales.validated,
            clients: clients.validated,
            purchase_orders: purchase_orders.validated,
            banks: banks.validated.into_iter().collect(),
            warehouse,
            distributors,
        };

        log_info("Layer 3: cross-reference validation");
        let cross = cross_validate(&data, &self.config);
        if cross.warnings.is_empty() {
            log_success("Cross-reference check: no warnings");
        } else {
            log_warning(format!("Cross-reference check: {} warnings", cross.warnings.len()));
        }
        issues.merge(cross);

        let success = issues.errors.is_empty();
        if success {
            log_success(format!("Validation passed with {} warnings", issues.warnings.len()));
        } else {
            log_error(format!(
                "Validation found {} errors and {} warnings",
                issues.errors.len(),
                issues.warnings.len()
            ));
        }

        ValidationResult {
            success,
            errors: issues.errors,
            warnings: issues.warnings,
            data,
            stats,
        }
    }
}

fn spawn_collection<T>(
    payload: &Arc<ImportPayload>,
    config: &Arc<ValidatorConfig>,
    select: fn(&ImportPayload) -> &[Value],
) -> JoinHandle<CollectionOutcome<T>>
where
    T: Schema + ConsistencyCheck + Send + 'static,
{
    let payload = Arc::clone(payload);
    let config = Arc::clone(config);
    tokio::task::spawn_blocking(move || validate_collection::<T>(select(&payload), &config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;
    use crate::validation::issue::{IssueType, Severity};
    use crate::validation::report::Priority;
    use serde_json::json;

    fn validate(raw: Value) -> ValidationResult {
        let payload = ImportPayload::from_value(raw).unwrap();
        ImportValidator::default().validate_all(&payload)
    }

    fn mixed_payload() -> Value {
        json!({
            "ventas": [
                {"id": "V001", "cliente": 470.0, "cantidad": 150, "precioVenta": 6300,
                 "totalVenta": 945000, "estadoPago": "Pendiente", "adeudo": 945000, "oc": "OC0001"},
                {"id": "V002", "cliente": "Ax", "cantidad": 10, "precioVenta": 100,
                 "totalVenta": 1000, "estadoPago": "Pagado", "oc": "OC-999"},
                {"cliente": "Ax", "cantidad": 1, "precioVenta": 1, "totalVenta": 1}
            ],
            "clientes": [
                {"nombre": 470, "adeudo": 945000},
                {"nombre": "Primo", "adeudo": -3000},
                {"adeudo": 10}
            ],
            "ordenesCompra": [
                {"id": "OC0001", "distribuidor": "PACMAN", "cantidad": 423, "costoDistribuidor": 6100}
            ],
            "bancos": {
                "Azteca": {"capitalActual": 10000, "registros": [
                    {"tipo": "Ingreso", "monto": 10050}
                ]}
            },
            "almacen": {
                "ingresos": [{"id": "I1", "distribuidor": "PACMAN", "cantidad": 423, "oc": "OC0001"}],
                "salidas": [{"id": "S1", "cliente": 470, "cantidad": 150}]
            },
            "distribuidores": [{"nombre": "PACMAN"}]
        })
    }

    #[test]
    fn test_numeric_client_normalized() {
        let result = validate(json!({
            "ventas": [{"id": "V1", "cliente": 470.0, "cantidad": 150, "precioVenta": 6300, "totalVenta": 945000}]
        }));
        assert!(result.success);
        assert_eq!(result.data.sales[0].client, "Client 470");
        assert_eq!(result.data.sales[0].payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_negative_debt_becomes_credit() {
        let result = validate(json!({"clientes": [{"nombre": "Primo", "adeudo": -3000}]}));
        assert!(result.success);
        let client = &result.data.clients[0];
        assert_eq!(client.debt, 0.0);
        assert_eq!(client.credit_balance, Some(3000.0));
        assert!(client.notes.contains("Credit balance: $3000.00"));
    }

    #[test]
    fn test_missing_purchase_order_warning() {
        let result = validate(json!({
            "ventas": [{"id": "V001", "oc": "OC-999", "cantidad": 1, "precioVenta": 10, "totalVenta": 10}],
            "ordenesCompra": []
        }));
        assert!(result.success);
        let missing: Vec<_> = result
            .warnings
            .iter()
            .filter(|w| w.kind == IssueType::MissingPurchaseOrderReference)
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id.as_deref(), Some("V001"));
    }

    #[test]
    fn test_sale_without_id_rejected() {
        let result = validate(json!({
            "ventas": [
                {"cantidad": 1, "precioVenta": 10, "totalVenta": 10},
                {"id": "V2", "cantidad": 1, "precioVenta": 10, "totalVenta": 10}
            ]
        }));
        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, IssueType::SaleValidation);
        assert_eq!(result.errors[0].severity, Severity::Error);
        assert_eq!(result.data.sales.len(), 1);
        assert_eq!(result.stats.sales, CollectionStats { processed: 2, validated: 1 });
    }

    #[test]
    fn test_bank_within_tolerance() {
        let result = validate(json!({
            "bancos": {"Azteca": {"capitalActual": 10000, "registros": [
                {"tipo": "Ingreso", "monto": 10000},
                {"tipo": "Ingreso", "monto": 250},
                {"tipo": "Egreso", "monto": 200}
            ]}}
        }));
        assert!(result
            .warnings
            .iter()
            .all(|w| w.kind != IssueType::InconsistentBankBalance));
    }

    #[test]
    fn test_mixed_payload() {
        let result = validate(mixed_payload());
        assert!(!result.success);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].kind, IssueType::SaleValidation);
        assert_eq!(result.errors[1].kind, IssueType::ClientValidation);

        assert_eq!(result.stats.sales.rejected(), 1);
        assert_eq!(result.stats.clients.rejected(), 1);
        assert_eq!(result.stats.warehouse.incoming, 1);
        assert_eq!(result.stats.warehouse.current_stock, 273.0);
        assert_eq!(result.stats.distributors, 1);

        let kinds: Vec<_> = result.warnings.iter().map(|w| w.kind).collect();
        assert!(kinds.contains(&IssueType::CreditBalanceDetected));
        assert!(kinds.contains(&IssueType::MissingPurchaseOrderReference));
        assert!(kinds.contains(&IssueType::MissingClientReference));
        assert!(!kinds.contains(&IssueType::DebtMismatch));
        assert!(!kinds.contains(&IssueType::MissingDistributorReference));
    }

    #[test]
    fn test_partition_per_collection() {
        let result = validate(mixed_payload());
        for stats in [result.stats.sales, result.stats.clients, result.stats.purchase_orders, result.stats.banks] {
            assert!(stats.validated <= stats.processed);
        }
        let rejected = result.stats.sales.rejected()
            + result.stats.clients.rejected()
            + result.stats.purchase_orders.rejected()
            + result.stats.banks.rejected();
        assert_eq!(rejected, result.errors.len());
    }

    #[test]
    fn test_idempotent() {
        let first = validate(mixed_payload());
        let second = validate(mixed_payload());
        assert_eq!(first.errors, second.errors);
        assert_eq!(first.warnings, second.warnings);
        assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn test_tolerance_boundary() {
        let sale = |total: f64| {
            json!({"ventas": [{"id": "V1", "cantidad": 150, "precioVenta": 6300, "totalVenta": total}]})
        };
        let mismatches = |result: ValidationResult| {
            result
                .warnings
                .iter()
                .filter(|w| w.kind == IssueType::TotalAmountMismatch)
                .count()
        };
        assert_eq!(mismatches(validate(sale(945_001.0))), 0);
        assert_eq!(mismatches(validate(sale(945_001.01))), 1);
    }

    #[test]
    fn test_report_from_result() {
        let validator = ImportValidator::default();
        let payload = ImportPayload::from_value(mixed_payload()).unwrap();
        let result = validator.validate_all(&payload);
        let report = validator.generate_report(&result);

        assert_eq!(report.summary.total_errors, 2);
        assert!(!report.summary.is_valid);
        assert_eq!(report.errors, result.errors);
        // one client error and one missing purchase order
        let priorities: Vec<_> = report.recommendations.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![Priority::High, Priority::Low]);

        let value = serde_json::to_value(&report).unwrap();
        assert!(value["summary"]["timestamp"].is_string());
        assert_eq!(value["stats"]["sales"]["processed"], 3);
    }

    #[test]
    fn test_serialized_result_shape() {
        let result = validate(mixed_payload());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], false);
        assert!(value["data"]["purchaseOrders"].is_array());
        assert!(value["data"]["banks"]["Azteca"].is_object());
        assert_eq!(value["data"]["warehouse"]["currentStock"], 273.0);
        assert_eq!(value["errors"][0]["severity"], "ERROR");
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let validator = ImportValidator::default();
        let payload = ImportPayload::from_value(mixed_payload()).unwrap();

        let sequential = validator.validate_all(&payload);
        let concurrent = validator.validate_all_concurrent(payload).await.unwrap();
        assert_eq!(sequential, concurrent);
    }

    #[tokio::test]
    async fn test_concurrent_empty_payload() {
        let result = ImportValidator::default()
            .validate_all_concurrent(ImportPayload::default())
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.warnings.is_empty());
        assert_eq!(result.data, ImportData::default());
    }

    #[test]
    fn test_logs_active_tolerances() {
        use crate::api::logs::LOG_BROADCASTER;
        use tokio::sync::broadcast::error::TryRecvError;

        let mut rx = LOG_BROADCASTER.subscribe();
        let config = ValidatorConfig::default().with_money_tolerance(0.5).unwrap();
        ImportValidator::new(config).validate_all(&ImportPayload::default());

        let mut seen = false;
        loop {
            match rx.try_recv() {
                Ok(entry) => seen |= entry.message.starts_with("Tolerances: money $0.50"),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        assert!(seen);
    }

    #[test]
    fn test_null_collections_validate_as_empty() {
        let result = validate(json!({
            "ventas": null,
            "clientes": [{"nombre": "Primo", "adeudo": 0}],
            "bancos": null
        }));
        assert!(result.success);
        assert_eq!(result.stats.sales.processed, 0);
        assert_eq!(result.stats.clients.validated, 1);
        assert!(result.data.banks.is_empty());
    }
}
