//! AWS Secrets Manager secret store

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use tracing::{debug, debug_span, Instrument};

use super::{parse_secret_json, SecretError, SecretStore};

/// Secret store reading JSON secrets from AWS Secrets Manager
pub struct AwsSecretsManager {
    client: SecretsManagerClient,
}

impl std::fmt::Debug for AwsSecretsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretsManager").finish_non_exhaustive()
    }
}

impl AwsSecretsManager {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: SecretsManagerClient::new(sdk_config),
        }
    }
}

#[async_trait]
impl SecretStore for AwsSecretsManager {
    async fn get_secret(&self, name: &str) -> Result<HashMap<String, String>, SecretError> {
        let span = debug_span!("aws.secret.get", secret.name = name);

        async move {
            let response = self
                .client
                .get_secret_value()
                .secret_id(name)
                .send()
                .await
                .map_err(|e| {
                    let not_found = e
                        .as_service_error()
                        .is_some_and(|se| se.is_resource_not_found_exception());
                    if not_found {
                        SecretError::NotFound(name.to_string())
                    } else {
                        SecretError::Request(DisplayErrorContext(e).to_string())
                    }
                })?;

            let raw = response
                .secret_string()
                .map(ToString::to_string)
                .or_else(|| {
                    response
                        .secret_binary()
                        .map(|blob| String::from_utf8_lossy(blob.as_ref()).to_string())
                })
                .ok_or_else(|| SecretError::Malformed(format!("{}: secret has no value", name)))?;

            let secret = parse_secret_json(name, &raw)?;
            debug!(keys = secret.len(), "Fetched secret");
            Ok(secret)
        }
        .instrument(span)
        .await
    }
}
