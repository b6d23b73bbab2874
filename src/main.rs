//! dq-alerts local runner
//!
//! Run with: cargo run
//!
//! Performs one pass over the configured checks and exits. Configuration
//! comes from `DQ_*` environment variables (see [`dq_alerts::config`]) plus:
//! - DQ_WEBHOOK_URL: Webhook to post to, bypassing Secrets Manager
//! - RUST_LOG: Log level (default: dq_alerts=info)
//! - AWS_REGION / AWS_PROFILE: Standard AWS SDK settings

use std::sync::Arc;

use dq_alerts::alerts::{run_once, HttpTransport};
use dq_alerts::config::{load_aws_config, RunConfig};
use dq_alerts::logging::{self, LogFormat};
use dq_alerts::secrets::{AwsSecretsManager, EnvSecretStore, WEBHOOK_URL_ENV};
use dq_alerts::warehouse::AthenaWarehouse;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init(LogFormat::Local);

    let config = RunConfig::from_env();

    tracing::info!("dq-alerts configuration:");
    tracing::info!("  Database: {}", config.database);
    tracing::info!("  Athena workgroup: {}", config.athena.workgroup);
    match &config.checks_file {
        Some(path) => tracing::info!("  Checks: {}", path.display()),
        None => tracing::info!("  Checks: built-in"),
    }
    tracing::info!("  Failure policy: {:?}", config.failure_policy);

    let aws = load_aws_config().await;
    let warehouse = Arc::new(AthenaWarehouse::new(&aws, config.athena.clone()));
    let transport = Arc::new(HttpTransport::new());

    let env_secrets = EnvSecretStore::from_env(config.secret_key.clone());
    let report = if env_secrets.is_configured() {
        tracing::info!("  Webhook: {}", WEBHOOK_URL_ENV);
        run_once(&config, &env_secrets, warehouse, transport).await?
    } else {
        tracing::info!("  Webhook: secret {}", config.secret_name);
        let secrets = AwsSecretsManager::new(&aws);
        run_once(&config, &secrets, warehouse, transport).await?
    };

    report.into_result()?;
    Ok(())
}
