//! Runtime configuration
//!
//! Environment variables (defaults in parentheses):
//! - DQ_SECRET_NAME: Secrets Manager secret holding the webhook (slack-webhook)
//! - DQ_SECRET_KEY: Key of the webhook URL inside the secret (hook_url)
//! - DQ_DATABASE: Warehouse database the checks query (ecommerce)
//! - DQ_ATHENA_WORKGROUP: Athena workgroup (primary)
//! - DQ_ATHENA_OUTPUT_LOCATION: S3 output location (workgroup default)
//! - DQ_ATHENA_POLL_INTERVAL_MS: Query state poll interval (500)
//! - DQ_FAILURE_POLICY: `fail-fast` or `isolate` (fail-fast)
//! - DQ_CHECKS_FILE: JSON file of check definitions (built-in checks)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::alerts::config::{default_checks, load_checks, CheckDefinition, ConfigError};
use crate::warehouse::AthenaConfig;

/// What to do when a check cannot run to completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the run on the first failing check
    #[default]
    FailFast,
    /// Record the failure and continue with the next check
    Isolate,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "isolate" => Ok(FailurePolicy::Isolate),
            other => Err(format!("unknown failure policy: {}", other)),
        }
    }
}

/// Configuration for one check-and-alert run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub secret_name: String,
    pub secret_key: String,
    pub database: String,
    pub athena: AthenaConfig,
    pub failure_policy: FailurePolicy,
    pub checks_file: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            secret_name: "slack-webhook".to_string(),
            secret_key: "hook_url".to_string(),
            database: "ecommerce".to_string(),
            athena: AthenaConfig::default(),
            failure_policy: FailurePolicy::default(),
            checks_file: None,
        }
    }
}

impl RunConfig {
    /// Build the configuration from `DQ_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let poll_interval = match var("DQ_ATHENA_POLL_INTERVAL_MS").map(|v| v.parse::<u64>()) {
            Some(Ok(ms)) => Duration::from_millis(ms),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Invalid DQ_ATHENA_POLL_INTERVAL_MS, using default");
                defaults.athena.poll_interval
            }
            None => defaults.athena.poll_interval,
        };

        let failure_policy = match var("DQ_FAILURE_POLICY").map(|v| v.parse::<FailurePolicy>()) {
            Some(Ok(policy)) => policy,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Invalid DQ_FAILURE_POLICY, using default");
                defaults.failure_policy
            }
            None => defaults.failure_policy,
        };

        Self {
            secret_name: var("DQ_SECRET_NAME").unwrap_or(defaults.secret_name),
            secret_key: var("DQ_SECRET_KEY").unwrap_or(defaults.secret_key),
            database: var("DQ_DATABASE").unwrap_or(defaults.database),
            athena: AthenaConfig {
                workgroup: var("DQ_ATHENA_WORKGROUP").unwrap_or(defaults.athena.workgroup),
                output_location: var("DQ_ATHENA_OUTPUT_LOCATION"),
                poll_interval,
            },
            failure_policy,
            checks_file: var("DQ_CHECKS_FILE").map(PathBuf::from),
        }
    }

    /// The checks to run: the checks file if configured, the built-in table otherwise
    pub fn checks(&self) -> Result<Vec<CheckDefinition>, ConfigError> {
        match &self.checks_file {
            Some(path) => load_checks(path),
            None => Ok(default_checks()),
        }
    }
}

/// Load shared AWS configuration from the default provider chain
pub async fn load_aws_config() -> aws_config::SdkConfig {
    aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await
}
