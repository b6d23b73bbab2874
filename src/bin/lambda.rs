//! dq-alerts Lambda handler
//!
//! Deployed behind a scheduled trigger; every invocation performs one pass
//! over the configured checks and returns the run report. The webhook URL
//! always comes from Secrets Manager. See [`dq_alerts::config`] for the
//! `DQ_*` environment variables.

use std::sync::Arc;

use dq_alerts::alerts::{run_once, HttpTransport, RunReport, WebhookTransport};
use dq_alerts::config::{load_aws_config, RunConfig};
use dq_alerts::logging::{self, LogFormat};
use dq_alerts::secrets::{AwsSecretsManager, SecretStore};
use dq_alerts::warehouse::{AthenaWarehouse, Warehouse};
use lambda_runtime::{service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init(LogFormat::Lambda);

    let config = RunConfig::from_env();
    let aws = load_aws_config().await;
    let secrets = AwsSecretsManager::new(&aws);
    let warehouse: Arc<dyn Warehouse> = Arc::new(AthenaWarehouse::new(&aws, config.athena.clone()));
    let transport: Arc<dyn WebhookTransport> = Arc::new(HttpTransport::new());

    let config = &config;
    let secrets = &secrets;
    lambda_runtime::run(service_fn(|event: LambdaEvent<serde_json::Value>| {
        let warehouse = Arc::clone(&warehouse);
        let transport = Arc::clone(&transport);
        async move { handle(event, config, secrets, warehouse, transport).await }
    }))
    .await
}

async fn handle(
    event: LambdaEvent<serde_json::Value>,
    config: &RunConfig,
    secrets: &dyn SecretStore,
    warehouse: Arc<dyn Warehouse>,
    transport: Arc<dyn WebhookTransport>,
) -> Result<RunReport, Error> {
    tracing::info!(request_id = %event.context.request_id, "Starting scheduled run");

    let report = run_once(config, secrets, warehouse, transport)
        .await?
        .into_result()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use dq_alerts::alerts::{default_checks, DeliveryOutcome, NotifierError};
    use dq_alerts::config::FailurePolicy;
    use dq_alerts::secrets::SecretError;
    use dq_alerts::warehouse::{QueryResult, WarehouseError};
    use lambda_runtime::Context;
    use serde_json::json;

    /// Answers every built-in check with its own allow-list, except `failing`
    struct CleanWarehouse {
        failing: Option<String>,
    }

    #[async_trait]
    impl Warehouse for CleanWarehouse {
        async fn run_query(&self, sql: &str, _database: &str) -> Result<QueryResult, WarehouseError> {
            if self.failing.as_deref() == Some(sql) {
                return Err(WarehouseError::QueryFailed(format!("failed: {}", sql)));
            }
            let check = default_checks()
                .into_iter()
                .find(|check| check.query == sql)
                .ok_or_else(|| WarehouseError::QueryFailed(format!("no result for: {}", sql)))?;
            Ok(QueryResult::new(
                vec![check.column],
                check.expected.into_iter().map(|v| vec![Some(v)]).collect(),
            ))
        }
    }

    struct OkTransport;

    #[async_trait]
    impl WebhookTransport for OkTransport {
        async fn post_json(
            &self,
            _url: &str,
            _payload: &serde_json::Value,
        ) -> Result<DeliveryOutcome, NotifierError> {
            Ok(DeliveryOutcome {
                status_code: 200,
                reason: "OK".to_string(),
            })
        }
    }

    struct WebhookSecret;

    #[async_trait]
    impl SecretStore for WebhookSecret {
        async fn get_secret(&self, name: &str) -> Result<HashMap<String, String>, SecretError> {
            if name != "slack-webhook" {
                return Err(SecretError::NotFound(name.to_string()));
            }
            Ok(HashMap::from([(
                "hook_url".to_string(),
                "https://hooks.example.com/T1".to_string(),
            )]))
        }
    }

    fn event() -> LambdaEvent<serde_json::Value> {
        LambdaEvent::new(json!({}), Context::default())
    }

    #[tokio::test]
    async fn test_handle_returns_report() {
        let config = RunConfig::default();
        let report = handle(
            event(),
            &config,
            &WebhookSecret,
            Arc::new(CleanWarehouse { failing: None }),
            Arc::new(OkTransport),
        )
        .await
        .unwrap();

        let body = serde_json::to_value(&report).unwrap();
        let outcomes = body["outcomes"].as_array().unwrap();
        assert_eq!(outcomes.len(), default_checks().len());
        for outcome in outcomes {
            assert_eq!(outcome["status"], "passed");
        }
        assert_eq!(report.alerts_sent(), 0);
    }

    #[tokio::test]
    async fn test_handle_fails_on_isolated_failure() {
        let config = RunConfig {
            failure_policy: FailurePolicy::Isolate,
            ..Default::default()
        };
        let failing = default_checks()[0].query.clone();

        let result = handle(
            event(),
            &config,
            &WebhookSecret,
            Arc::new(CleanWarehouse {
                failing: Some(failing),
            }),
            Arc::new(OkTransport),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_handle_fails_without_webhook_secret() {
        let config = RunConfig {
            secret_name: "missing".to_string(),
            ..Default::default()
        };
        let result = handle(
            event(),
            &config,
            &WebhookSecret,
            Arc::new(CleanWarehouse { failing: None }),
            Arc::new(OkTransport),
        )
        .await;
        assert!(result.is_err());
    }
}
