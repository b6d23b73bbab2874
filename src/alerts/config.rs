//! Check definitions

use std::path::Path;

use serde::{Deserialize, Serialize};

/// A named comparison between a column's distinct values and an allow-list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDefinition {
    /// Human-readable name, used as the alert type
    pub name: String,
    /// SQL returning the observed values
    pub query: String,
    /// Result column holding the observed values
    pub column: String,
    /// Allowed values
    pub expected: Vec<String>,
}

impl CheckDefinition {
    /// Create a new check definition
    pub fn new<I, S>(
        name: impl Into<String>,
        query: impl Into<String>,
        column: impl Into<String>,
        expected: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            query: query.into(),
            column: column.into(),
            expected: expected.into_iter().map(Into::into).collect(),
        }
    }
}

/// The checks run when no checks file is configured
pub fn default_checks() -> Vec<CheckDefinition> {
    vec![
        CheckDefinition::new(
            "Ensure valid payment type",
            "SELECT distinct payment_type FROM order_payments",
            "payment_type",
            ["boleto", "credit_card", "debit_card", "voucher"],
        ),
        CheckDefinition::new(
            "Ensure valid order status",
            "SELECT distinct order_status FROM orders",
            "order_status",
            [
                "approved",
                "canceled",
                "created",
                "delivered",
                "invoiced",
                "processing",
                "shipped",
            ],
        ),
    ]
}

/// Load check definitions from a JSON array on disk
pub fn load_checks(path: impl AsRef<Path>) -> Result<Vec<CheckDefinition>, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let checks: Vec<CheckDefinition> = serde_json::from_str(&raw)?;

    if checks.is_empty() {
        return Err(ConfigError::NoChecks(path.display().to_string()));
    }
    if let Some(check) = checks.iter().find(|c| c.expected.is_empty()) {
        return Err(ConfigError::EmptyExpected(check.name.clone()));
    }

    Ok(checks)
}

/// Check configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid checks file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No checks defined in {0}")]
    NoChecks(String),

    #[error("Check '{0}' has an empty expected set")]
    EmptyExpected(String),
}
