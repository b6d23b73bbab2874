//! dq-alerts: scheduled data-quality checks
//!
//! Each check queries the warehouse for the distinct values of one
//! categorical column, compares them with a hand-maintained allow-list and
//! posts a message to a webhook when outliers appear.
//!
//! # Components
//!
//! - **Checker**: pure comparison and message formatting ([`alerts::evaluate`])
//! - **Notifier**: single-shot webhook delivery ([`alerts::Notifier`])
//! - **Runner**: sequential query → compare → notify over a check table
//! - **Collaborators**: [`secrets::SecretStore`] for the webhook URL and
//!   [`warehouse::Warehouse`] for queries, with AWS implementations
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dq_alerts::alerts::{run_once, HttpTransport};
//! use dq_alerts::config::{load_aws_config, RunConfig};
//! use dq_alerts::secrets::AwsSecretsManager;
//! use dq_alerts::warehouse::AthenaWarehouse;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::from_env();
//! let aws = load_aws_config().await;
//! let secrets = AwsSecretsManager::new(&aws);
//! let warehouse = Arc::new(AthenaWarehouse::new(&aws, config.athena.clone()));
//!
//! let report = run_once(&config, &secrets, warehouse, Arc::new(HttpTransport::new())).await?;
//! println!("alerts sent: {}", report.alerts_sent());
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod config;
pub mod logging;
pub mod secrets;
pub mod warehouse;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use alerts::{evaluate, CheckDefinition, Notifier, RunError, RunReport};
pub use config::{FailurePolicy, RunConfig};
