//! Validator configuration.
//!
//! Defaults match the import rules used by the dashboard. Every value can be
//! overridden through `FLOW_IMPORT_*` environment variables (a `.env` file is
//! loaded by the CLI through `dotenvy`) and the tolerances through CLI flags.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

/// Default HTTP port for `flow-import serve`.
pub const DEFAULT_PORT: u16 = 3000;

/// Maximum accepted request body for `POST /api/validate` (in bytes).
///
/// 25 MB.
pub const MAX_PAYLOAD_SIZE: usize = 25 * 1024 * 1024;

/// Tolerances and recommendation thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorConfig {
    /// Absolute tolerance for money comparisons within a record or between
    /// a client and its sales.
    pub money_tolerance: f64,

    /// Tolerance between a bank ledger and its declared capital. Wider than
    /// the money tolerance since opening balances are not in the ledger.
    pub bank_tolerance: f64,

    /// Tolerance between declared and derived warehouse stock (units).
    pub stock_tolerance: f64,

    /// Recommendation thresholds.
    pub rules: RecommendationRules,
}

/// Counts above which the report emits a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRules {
    /// Sale validation errors above this count → HIGH.
    pub sale_errors: usize,
    /// Client validation errors above this count → HIGH.
    pub client_errors: usize,
    /// Debt mismatch warnings above this count → MEDIUM.
    pub debt_mismatches: usize,
    /// Missing purchase order references above this count → LOW.
    pub missing_purchase_orders: usize,
}

impl Default for RecommendationRules {
    fn default() -> Self {
        Self {
            sale_errors: 5,
            client_errors: 0,
            debt_mismatches: 3,
            missing_purchase_orders: 0,
        }
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            money_tolerance: 1.0,
            bank_tolerance: 100.0,
            stock_tolerance: 0.0,
            rules: RecommendationRules::default(),
        }
    }
}

impl ValidatorConfig {
    /// Defaults overridden by `FLOW_IMPORT_*` environment variables.
    ///
    /// | Variable                              | Field                          |
    /// |---------------------------------------|--------------------------------|
    /// | `FLOW_IMPORT_MONEY_TOLERANCE`         | `money_tolerance`              |
    /// | `FLOW_IMPORT_BANK_TOLERANCE`          | `bank_tolerance`               |
    /// | `FLOW_IMPORT_STOCK_TOLERANCE`         | `stock_tolerance`              |
    /// | `FLOW_IMPORT_SALE_ERROR_THRESHOLD`    | `rules.sale_errors`            |
    /// | `FLOW_IMPORT_CLIENT_ERROR_THRESHOLD`  | `rules.client_errors`          |
    /// | `FLOW_IMPORT_DEBT_MISMATCH_THRESHOLD` | `rules.debt_mismatches`        |
    /// | `FLOW_IMPORT_MISSING_OC_THRESHOLD`    | `rules.missing_purchase_orders`|
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ValidatorConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mut config = Self::default();
        override_tolerance(&lookup, "FLOW_IMPORT_MONEY_TOLERANCE", &mut config.money_tolerance)?;
        override_tolerance(&lookup, "FLOW_IMPORT_BANK_TOLERANCE", &mut config.bank_tolerance)?;
        override_tolerance(&lookup, "FLOW_IMPORT_STOCK_TOLERANCE", &mut config.stock_tolerance)?;
        override_value(&lookup, "FLOW_IMPORT_SALE_ERROR_THRESHOLD", &mut config.rules.sale_errors)?;
        override_value(&lookup, "FLOW_IMPORT_CLIENT_ERROR_THRESHOLD", &mut config.rules.client_errors)?;
        override_value(&lookup, "FLOW_IMPORT_DEBT_MISMATCH_THRESHOLD", &mut config.rules.debt_mismatches)?;
        override_value(&lookup, "FLOW_IMPORT_MISSING_OC_THRESHOLD", &mut config.rules.missing_purchase_orders)?;
        Ok(config)
    }

    pub fn with_money_tolerance(mut self, tolerance: f64) -> ConfigResult<Self> {
        self.money_tolerance = check_tolerance("money_tolerance", tolerance)?;
        Ok(self)
    }

    pub fn with_bank_tolerance(mut self, tolerance: f64) -> ConfigResult<Self> {
        self.bank_tolerance = check_tolerance("bank_tolerance", tolerance)?;
        Ok(self)
    }
}

fn override_value<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) -> ConfigResult<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(key) {
        *target = raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

fn override_tolerance(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut f64,
) -> ConfigResult<()> {
    override_value(lookup, key, target)?;
    check_tolerance(key, *target)?;
    Ok(())
}

/// NaN would make every comparison pass; negatives flag exact matches.
fn check_tolerance(key: &str, tolerance: f64) -> ConfigResult<f64> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: tolerance.to_string(),
            reason: "tolerance must be a finite number >= 0".to_string(),
        });
    }
    Ok(tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ValidatorConfig::default();
        assert_eq!(config.money_tolerance, 1.0);
        assert_eq!(config.bank_tolerance, 100.0);
        assert_eq!(config.rules.sale_errors, 5);
        assert_eq!(config.rules.debt_mismatches, 3);
    }

    #[test]
    fn test_overrides() {
        let config = ValidatorConfig::from_lookup(lookup(&[
            ("FLOW_IMPORT_BANK_TOLERANCE", "250"),
            ("FLOW_IMPORT_SALE_ERROR_THRESHOLD", " 10 "),
        ]))
        .unwrap();
        assert_eq!(config.bank_tolerance, 250.0);
        assert_eq!(config.rules.sale_errors, 10);
        assert_eq!(config.money_tolerance, 1.0);
    }

    #[test]
    fn test_invalid_override() {
        let err = ValidatorConfig::from_lookup(lookup(&[("FLOW_IMPORT_MONEY_TOLERANCE", "abc")]))
            .unwrap_err();
        assert!(err.to_string().contains("FLOW_IMPORT_MONEY_TOLERANCE"));

        let err = ValidatorConfig::from_lookup(lookup(&[("FLOW_IMPORT_MONEY_TOLERANCE", "-1")]))
            .unwrap_err();
        assert!(err.to_string().contains(">= 0"));
    }

    #[test]
    fn test_flag_tolerances_checked() {
        let err = ValidatorConfig::default()
            .with_money_tolerance(f64::NAN)
            .unwrap_err();
        assert!(err.to_string().contains("money_tolerance"));

        let err = ValidatorConfig::default()
            .with_bank_tolerance(-1.0)
            .unwrap_err();
        assert!(err.to_string().contains(">= 0"));

        let config = ValidatorConfig::default()
            .with_money_tolerance(0.0)
            .and_then(|c| c.with_bank_tolerance(250.0))
            .unwrap();
        assert_eq!(config.money_tolerance, 0.0);
        assert_eq!(config.bank_tolerance, 250.0);
    }
}
