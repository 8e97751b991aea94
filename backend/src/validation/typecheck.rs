//! Layer 1: per-collection type validation.
//!
//! Each raw record goes through its schema. Records that parse are kept and
//! run through their [`ConsistencyCheck`]; records that fail become one
//! `ERROR` issue each and are dropped. Iteration never stops early.

use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::consistency::ConsistencyCheck;
use super::issue::{Issue, IssueLog, IssueType};
use crate::api::logs::{log_success_indent, log_warning_indent};
use crate::config::ValidatorConfig;
use crate::error::SchemaValidationError;
use crate::models::{Bank, EntityKind, Warehouse};
use crate::schema::{raw_id, Schema};

/// What validating one collection produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionOutcome<T> {
    pub validated: Vec<T>,
    pub issues: IssueLog,
    /// Number of raw records looked at.
    pub processed: usize,
}

impl<T> CollectionOutcome<T> {
    fn new(capacity: usize) -> Self {
        Self {
            validated: Vec::with_capacity(capacity),
            issues: IssueLog::new(),
            processed: 0,
        }
    }
}

/// Validate an array collection (sales, clients, purchase orders).
pub fn validate_collection<T>(raw: &[Value], config: &ValidatorConfig) -> CollectionOutcome<T>
where
    T: Schema + ConsistencyCheck,
{
    let mut outcome = CollectionOutcome::new(raw.len());

    for (index, record) in raw.iter().enumerate() {
        outcome.processed += 1;
        match T::parse(record) {
            Ok(entity) => {
                outcome.issues.extend(entity.check(config));
                outcome.validated.push(entity);
            }
            Err(err) => {
                let id = raw_id(record).unwrap_or_else(|| synthetic_id(T::KIND, index));
                outcome
                    .issues
                    .push(schema_error(T::KIND, &err).with_id(id).with_index(index));
            }
        }
    }

    log_outcome(T::KIND, outcome.validated.len(), outcome.processed);
    outcome
}

/// Validate the `banks` map. Each value is parsed on its own; the bank name
/// is the issue id and no index is reported.
pub fn validate_banks(raw: &BTreeMap<String, Value>) -> CollectionOutcome<(String, Bank)> {
    let mut outcome = CollectionOutcome::new(raw.len());

    for (name, record) in raw {
        outcome.processed += 1;
        match Bank::parse(record) {
            Ok(bank) => outcome.validated.push((name.clone(), bank)),
            Err(err) => outcome.issues.push(
                schema_error(EntityKind::Bank, &err).with_id(name.as_str()),
            ),
        }
    }

    log_outcome(EntityKind::Bank, outcome.validated.len(), outcome.processed);
    outcome
}

/// Validate the warehouse object. Absent means an empty warehouse; a
/// warehouse that fails its schema is reported and replaced by an empty one.
pub fn validate_warehouse(raw: Option<&Value>, config: &ValidatorConfig) -> (Warehouse, IssueLog) {
    let mut issues = IssueLog::new();
    let Some(raw) = raw.filter(|v| !v.is_null()) else {
        return (Warehouse::default(), issues);
    };

    match Warehouse::parse(raw) {
        Ok(warehouse) => {
            issues.extend(warehouse.check(config));
            log_success_indent(
                format!(
                    "Warehouse: {} incoming, {} outgoing",
                    warehouse.incoming_records.len(),
                    warehouse.outgoing_records.len()
                ),
                1,
            );
            (warehouse, issues)
        }
        Err(err) => {
            issues.push(schema_error(EntityKind::Warehouse, &err));
            log_warning_indent("Warehouse: invalid, using an empty warehouse", 1);
            (Warehouse::default(), issues)
        }
    }
}

fn schema_error(kind: EntityKind, err: &SchemaValidationError) -> Issue {
    Issue::error(
        IssueType::validation_error(kind),
        format!("Invalid {}: {}", kind.label(), err),
    )
    .with_entity(kind)
    .with_details(json!(err.details()))
}

fn synthetic_id(kind: EntityKind, index: usize) -> String {
    format!("{}-{}", kind.slug(), index)
}

fn log_outcome(kind: EntityKind, validated: usize, processed: usize) {
    let label = collection_label(kind);
    let line = format!("{}: {}/{} validated", label, validated, processed);
    if validated == processed {
        log_success_indent(line, 1);
    } else {
        log_warning_indent(line, 1);
    }
}

fn collection_label(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Sale => "Sales",
        EntityKind::Client => "Clients",
        EntityKind::PurchaseOrder => "Purchase orders",
        EntityKind::Bank => "Banks",
        EntityKind::Warehouse => "Warehouse",
    }
}
