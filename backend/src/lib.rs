//! # flow-import - Spreadsheet import validation for FlowDistributor
//!
//! Validates the JSON exported from the FlowDistributor spreadsheet (sales,
//! clients, purchase orders, banks, warehouse) before it reaches the
//! dashboard's financial records.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  JSON file  │────▶│   Layer 1   │────▶│   Layer 3   │────▶│   Report    │
//! │  (payload)  │     │ (schemas)   │     │ (cross-ref) │     │ (summary)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flow_import::{load_payload_file, ImportValidator};
//!
//! let payload = load_payload_file("export.json")?;
//! let validator = ImportValidator::default();
//! let result = validator.validate_all(&payload);
//! println!("{} errors, {} warnings", result.errors.len(), result.warnings.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Tolerances and recommendation thresholds
//! - [`models`] - Canonical entities (Sale, Client, PurchaseOrder, Bank, Warehouse)
//! - [`normalize`] - Field normalizers
//! - [`schema`] - Per-entity schemas (raw JSON to typed entity)
//! - [`payload`] - Import payload loading
//! - [`validation`] - Layer 1, Layer 3 and the report
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod normalize;
pub mod payload;
pub mod schema;

// Validation
pub mod validation;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    FieldError,
    ImportError,
    SchemaValidationError,
    ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Bank,
    BankRecord,
    Client,
    ClientStatus,
    EntityKind,
    PaymentStatus,
    PurchaseOrder,
    Sale,
    Warehouse,
};

// =============================================================================
// Re-exports - Payload
// =============================================================================

pub use payload::{load_payload_file, parse_payload_bytes, ImportPayload};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use config::ValidatorConfig;
pub use validation::{
    ImportData,
    ImportStats,
    ImportValidator,
    Issue,
    IssueType,
    Priority,
    Severity,
    ValidationReport,
    ValidationResult,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ValidateResponse, ValidateStatus};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
