//! Secret store access
//!
//! The webhook URL is the only secret a run needs. It is fetched once at
//! start-up through a [`SecretStore`] and never written anywhere.

pub mod aws;

pub use aws::AwsSecretsManager;

use std::collections::HashMap;

use async_trait::async_trait;

/// Environment variable read by [`EnvSecretStore`]
pub const WEBHOOK_URL_ENV: &str = "DQ_WEBHOOK_URL";

/// Key-value secret store
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the named secret as a key-value mapping
    async fn get_secret(&self, name: &str) -> Result<HashMap<String, String>, SecretError>;
}

/// Serves the webhook URL from the environment under a single key.
/// Meant for local runs; any secret name resolves to the same mapping.
#[derive(Clone)]
pub struct EnvSecretStore {
    key: String,
    url: Option<String>,
}

impl std::fmt::Debug for EnvSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvSecretStore")
            .field("key", &self.key)
            .field("configured", &self.url.is_some())
            .finish()
    }
}

impl EnvSecretStore {
    /// Read `DQ_WEBHOOK_URL` from the process environment
    pub fn from_env(key: impl Into<String>) -> Self {
        Self::from_lookup(key, |name| std::env::var(name).ok())
    }

    fn from_lookup(key: impl Into<String>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            key: key.into(),
            url: lookup(WEBHOOK_URL_ENV).filter(|v| !v.is_empty()),
        }
    }

    /// Whether the override variable is set
    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret(&self, name: &str) -> Result<HashMap<String, String>, SecretError> {
        let url = self
            .url
            .clone()
            .ok_or_else(|| SecretError::NotFound(format!("{} (env {})", name, WEBHOOK_URL_ENV)))?;
        Ok(HashMap::from([(self.key.clone(), url)]))
    }
}

/// Fetch `name` from `store` and extract the webhook URL under `key`.
/// The value is returned exactly as stored; blank values count as missing.
pub async fn resolve_webhook_url(
    store: &dyn SecretStore,
    name: &str,
    key: &str,
) -> Result<String, SecretError> {
    let secret = store.get_secret(name).await?;
    match secret.get(key) {
        Some(url) if !url.trim().is_empty() => Ok(url.clone()),
        _ => Err(SecretError::MissingKey {
            secret: name.to_string(),
            key: key.to_string(),
        }),
    }
}

/// Parse a JSON object secret into a string mapping
pub(crate) fn parse_secret_json(
    name: &str,
    raw: &str,
) -> Result<HashMap<String, String>, SecretError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| SecretError::Malformed(format!("{}: {}", name, e)))?;
    let serde_json::Value::Object(map) = value else {
        return Err(SecretError::Malformed(format!(
            "{}: expected a JSON object",
            name
        )));
    };

    Ok(map
        .into_iter()
        .map(|(k, v)| {
            let v = match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (k, v)
        })
        .collect())
}

/// Secret store errors
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Secret store request failed: {0}")]
    Request(String),

    #[error("Malformed secret {0}")]
    Malformed(String),

    #[error("Secret {secret} has no value for key {key}")]
    MissingKey { secret: String, key: String },
}
