//! Sequential check-and-alert runs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::checker::evaluate;
use super::config::{CheckDefinition, ConfigError};
use super::notifier::{DeliveryOutcome, Notifier, NotifierError, WebhookTransport};
use crate::config::{FailurePolicy, RunConfig};
use crate::secrets::{resolve_webhook_url, SecretError, SecretStore};
use crate::warehouse::{Warehouse, WarehouseError};

/// Result of a single check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckStatus {
    /// Observed values matched the allow-list
    Passed,
    /// An alert was sent
    Alerted {
        message: String,
        delivery: DeliveryOutcome,
    },
    /// The check could not complete (isolated failures only)
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub check: String,
    #[serde(flatten)]
    pub status: CheckStatus,
}

/// Summary of one run over the configured checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<CheckOutcome>,
}

impl RunReport {
    pub fn alerts_sent(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, CheckStatus::Alerted { .. }))
            .count()
    }

    /// Names of checks that failed to complete
    pub fn failed_checks(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, CheckStatus::Failed { .. }))
            .map(|o| o.check.clone())
            .collect()
    }

    /// Turn isolated failures back into an error
    pub fn into_result(self) -> Result<Self, RunError> {
        let failed = self.failed_checks();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(RunError::ChecksFailed(failed))
        }
    }
}

/// Runs checks one after another against a warehouse
pub struct CheckRunner {
    warehouse: Arc<dyn Warehouse>,
    notifier: Notifier,
    database: String,
    failure_policy: FailurePolicy,
}

impl CheckRunner {
    pub fn new(
        warehouse: Arc<dyn Warehouse>,
        notifier: Notifier,
        database: impl Into<String>,
    ) -> Self {
        Self {
            warehouse,
            notifier,
            database: database.into(),
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Run every check in order.
    ///
    /// Under [`FailurePolicy::FailFast`] the first fault ends the run; alerts
    /// already sent stay sent. Under [`FailurePolicy::Isolate`] the fault is
    /// recorded and the next check runs.
    pub async fn run(&self, checks: &[CheckDefinition]) -> Result<RunReport, RunError> {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(checks.len());

        for check in checks {
            let status = match self.run_check(check).await {
                Ok(status) => status,
                Err(e) if self.failure_policy == FailurePolicy::Isolate => {
                    tracing::error!(check = %check.name, error = %e, "Check failed");
                    CheckStatus::Failed {
                        error: e.to_string(),
                    }
                }
                Err(e) => return Err(e),
            };
            outcomes.push(CheckOutcome {
                check: check.name.clone(),
                status,
            });
        }

        Ok(RunReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        })
    }

    /// Query, compare and (if needed) alert for a single check
    pub async fn run_check(&self, check: &CheckDefinition) -> Result<CheckStatus, RunError> {
        let current = self
            .warehouse
            .run_query(&check.query, &self.database)
            .await
            .and_then(|result| result.column_values(&check.column))
            .map_err(|source| RunError::Query {
                check: check.name.clone(),
                source,
            })?;

        match evaluate(&check.name, &current, &check.expected) {
            Some(message) => {
                let delivery =
                    self.notifier
                        .dispatch(&message)
                        .await
                        .map_err(|source| RunError::Delivery {
                            check: check.name.clone(),
                            source,
                        })?;
                Ok(CheckStatus::Alerted { message, delivery })
            }
            None => {
                tracing::info!(check = %check.name, "No outliers found. Skipping alert.");
                Ok(CheckStatus::Passed)
            }
        }
    }
}

/// Resolve the webhook, then run the configured checks once
pub async fn run_once(
    config: &RunConfig,
    secrets: &dyn SecretStore,
    warehouse: Arc<dyn Warehouse>,
    transport: Arc<dyn WebhookTransport>,
) -> Result<RunReport, RunError> {
    let webhook_url = resolve_webhook_url(secrets, &config.secret_name, &config.secret_key).await?;
    let checks = config.checks()?;

    tracing::info!(
        checks = checks.len(),
        database = %config.database,
        policy = ?config.failure_policy,
        "Starting data quality run"
    );

    let runner = CheckRunner::new(warehouse, Notifier::new(transport, webhook_url), &config.database)
        .with_failure_policy(config.failure_policy);
    let report = runner.run(&checks).await?;

    tracing::info!(
        alerts = report.alerts_sent(),
        failed = report.failed_checks().len(),
        "Data quality run finished"
    );
    Ok(report)
}

/// Run errors
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),

    #[error("Check '{check}' query failed: {source}")]
    Query {
        check: String,
        #[source]
        source: WarehouseError,
    },

    #[error("Check '{check}' alert delivery failed: {source}")]
    Delivery {
        check: String,
        #[source]
        source: NotifierError,
    },

    #[error("Checks failed: {}", .0.join(", "))]
    ChecksFailed(Vec<String>),
}
