//! Three-layer import validation.
//!
//! # Layers
//!
//! ## Layer 1: type validation ([`typecheck`])
//! - Every raw record goes through its entity schema
//! - Failures become `ERROR` issues and the record is dropped
//! - Parsed records get single-record consistency checks ([`consistency`])
//!
//! ## Layer 3: cross-reference validation ([`crossref`])
//! - Runs after every collection is validated
//! - Checks references and balances between entities, warnings only
//!
//! The [`report`] module turns a result into a summary with prioritized
//! recommendations.
//!
//! # Example
//!
//! ```rust,ignore
//! use flow_import::{ImportPayload, ImportValidator, ValidatorConfig};
//!
//! let validator = ImportValidator::new(ValidatorConfig::default());
//! let result = validator.validate_all(&payload);
//! assert_eq!(result.success, result.errors.is_empty());
//! ```

pub mod consistency;
pub mod crossref;
pub mod issue;
pub mod report;
pub mod typecheck;
pub mod validator;

pub use consistency::ConsistencyCheck;
pub use crossref::cross_validate;
pub use issue::{Issue, IssueLog, IssueType, Severity};
pub use report::{build_report, Priority, Recommendation, ReportSummary, ValidationReport};
pub use typecheck::{validate_banks, validate_collection, validate_warehouse, CollectionOutcome};
pub use validator::{CollectionStats, ImportData, ImportStats, ImportValidator, ValidationResult, WarehouseStats};
