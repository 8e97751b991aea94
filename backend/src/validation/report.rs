//! Validation report: summary, stats, issues and recommendations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::issue::{count_by_type, Issue, IssueType};
use super::validator::{ImportStats, ValidationResult};
use crate::config::RecommendationRules;

/// Recommendation priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
    Info,
}

/// A human-readable suggestion derived from the issue counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub priority: Priority,
    pub message: String,
}

impl Recommendation {
    fn new(priority: Priority, message: impl Into<String>) -> Self {
        Self {
            priority,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_errors: usize,
    pub total_warnings: usize,
    pub is_valid: bool,
    pub timestamp: DateTime<Utc>,
}

/// Full report, serializable for download.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub summary: ReportSummary,
    pub stats: ImportStats,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub recommendations: Vec<Recommendation>,
}

/// Build the report for a validation result.
pub fn build_report(result: &ValidationResult, rules: &RecommendationRules) -> ValidationReport {
    ValidationReport {
        summary: ReportSummary {
            total_errors: result.errors.len(),
            total_warnings: result.warnings.len(),
            is_valid: result.errors.is_empty(),
            timestamp: Utc::now(),
        },
        stats: result.stats.clone(),
        errors: result.errors.clone(),
        warnings: result.warnings.clone(),
        recommendations: recommendations(&result.errors, &result.warnings, rules),
    }
}

/// Apply the rule table to the issue counts.
///
/// A rule fires when the count of its issue type is strictly above its
/// threshold. When no rule fires, a single `INFO` entry says the data is
/// ready to import.
pub fn recommendations(errors: &[Issue], warnings: &[Issue], rules: &RecommendationRules) -> Vec<Recommendation> {
    let error_counts = count_by_type(errors);
    let warning_counts = count_by_type(warnings);
    let count = |counts: &BTreeMap<IssueType, usize>, kind: IssueType| {
        counts.get(&kind).copied().unwrap_or(0)
    };

    let mut out = Vec::new();

    let sale_errors = count(&error_counts, IssueType::SaleValidation);
    if sale_errors > rules.sale_errors {
        out.push(Recommendation::new(
            Priority::High,
            format!(
                "{} sales have validation errors. Review the spreadsheet and fix the data before importing.",
                sale_errors
            ),
        ));
    }

    let client_errors = count(&error_counts, IssueType::ClientValidation);
    if client_errors > rules.client_errors {
        out.push(Recommendation::new(
            Priority::High,
            format!(
                "{} clients have validation errors. Check the debt fields and calculations.",
                client_errors
            ),
        ));
    }

    let debt_mismatches = count(&warning_counts, IssueType::DebtMismatch);
    if debt_mismatches > rules.debt_mismatches {
        out.push(Recommendation::new(
            Priority::Medium,
            format!(
                "{} clients have a calculated debt that differs from the declared one. Review payments and debt formulas.",
                debt_mismatches
            ),
        ));
    }

    let missing_orders = count(&warning_counts, IssueType::MissingPurchaseOrderReference);
    if missing_orders > rules.missing_purchase_orders {
        out.push(Recommendation::new(
            Priority::Low,
            format!(
                "{} sales reference purchase orders that do not exist. Check for deleted orders or mistyped ids.",
                missing_orders
            ),
        ));
    }

    if out.is_empty() {
        out.push(Recommendation::new(
            Priority::Info,
            "All data is consistent and ready to import.",
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(kind: IssueType, n: usize) -> Vec<Issue> {
        (0..n).map(|_| Issue::error(kind, "e")).collect()
    }

    fn warnings(kind: IssueType, n: usize) -> Vec<Issue> {
        (0..n).map(|_| Issue::warning(kind, "w")).collect()
    }

    #[test]
    fn test_clean_data_is_ready() {
        let recs = recommendations(&[], &[], &RecommendationRules::default());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, Priority::Info);
    }

    #[test]
    fn test_sale_error_threshold() {
        let rules = RecommendationRules::default();
        let recs = recommendations(&errors(IssueType::SaleValidation, 5), &[], &rules);
        assert_eq!(recs[0].priority, Priority::Info);

        let recs = recommendations(&errors(IssueType::SaleValidation, 6), &[], &rules);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, Priority::High);
        assert!(recs[0].message.starts_with("6 sales"));
    }

    #[test]
    fn test_single_client_error_is_high() {
        let recs = recommendations(
            &errors(IssueType::ClientValidation, 1),
            &[],
            &RecommendationRules::default(),
        );
        assert_eq!(recs[0].priority, Priority::High);
    }

    #[test]
    fn test_warning_rules() {
        let mut w = warnings(IssueType::DebtMismatch, 4);
        w.extend(warnings(IssueType::MissingPurchaseOrderReference, 1));
        let recs = recommendations(&[], &w, &RecommendationRules::default());
        let priorities: Vec<_> = recs.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![Priority::Medium, Priority::Low]);
    }

    #[test]
    fn test_unlisted_warnings_still_ready() {
        let w = warnings(IssueType::MissingClientReference, 10);
        let recs = recommendations(&[], &w, &RecommendationRules::default());
        assert_eq!(recs[0].priority, Priority::Info);
    }

    #[test]
    fn test_priority_serialization() {
        assert_eq!(serde_json::to_value(Priority::High).unwrap(), "HIGH");
        assert_eq!(serde_json::to_value(Priority::Info).unwrap(), "INFO");
    }
}
