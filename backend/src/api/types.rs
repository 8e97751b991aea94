//! REST API types.
//!
//! `POST /api/validate` answers with the validated data and the full report
//! in one response, so the dashboard can show the review screen without a
//! second round trip.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::validation::{ValidationReport, ValidationResult};

/// Overall outcome shown to the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidateStatus {
    /// No errors and no warnings.
    Ready,
    /// No errors, some warnings to review.
    Warning,
    /// At least one record was rejected.
    Error,
}

impl ValidateStatus {
    pub fn of(result: &ValidationResult) -> Self {
        if !result.errors.is_empty() {
            Self::Error
        } else if !result.warnings.is_empty() {
            Self::Warning
        } else {
            Self::Ready
        }
    }
}

/// Response to `POST /api/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    /// Unique job identifier
    pub job_id: String,
    pub status: ValidateStatus,
    pub result: ValidationResult,
    pub report: ValidationReport,
}

impl ValidateResponse {
    pub fn new(result: ValidationResult, report: ValidationReport) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            status: ValidateStatus::of(&result),
            result,
            report,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "result": null,
        "report": null
    })
}
