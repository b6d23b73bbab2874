//! In-memory collaborators for tests

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::alerts::notifier::{DeliveryOutcome, NotifierError, WebhookTransport};
use crate::secrets::{SecretError, SecretStore};
use crate::warehouse::{QueryResult, Warehouse, WarehouseError};

/// Warehouse answering known SQL strings with canned results
#[derive(Default)]
pub struct MemoryWarehouse {
    results: HashMap<String, QueryResult>,
    failing: HashSet<String>,
    queries: Mutex<Vec<(String, String)>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `sql` with a single string column
    pub fn with_column(mut self, sql: &str, column: &str, values: &[&str]) -> Self {
        let result = QueryResult::new(
            vec![column.to_string()],
            values.iter().map(|v| vec![Some(v.to_string())]).collect(),
        );
        self.results.insert(sql.to_string(), result);
        self
    }

    /// Fail `sql` with a query error
    pub fn with_failure(mut self, sql: &str) -> Self {
        self.failing.insert(sql.to_string());
        self
    }

    /// Executed `(sql, database)` pairs in order
    pub fn queries(&self) -> Vec<(String, String)> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn run_query(&self, sql: &str, database: &str) -> Result<QueryResult, WarehouseError> {
        self.queries
            .lock()
            .push((sql.to_string(), database.to_string()));

        if self.failing.contains(sql) {
            return Err(WarehouseError::QueryFailed(format!("failed: {}", sql)));
        }
        self.results
            .get(sql)
            .cloned()
            .ok_or_else(|| WarehouseError::QueryFailed(format!("no result for: {}", sql)))
    }
}

/// Transport that records payloads and answers with a fixed status
pub struct RecordingTransport {
    outcome: DeliveryOutcome,
    sent: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingTransport {
    pub fn new(status_code: u16, reason: &str) -> Self {
        Self {
            outcome: DeliveryOutcome {
                status_code,
                reason: reason.to_string(),
            },
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Recorded `(url, payload)` pairs in order
    pub fn sent(&self) -> Vec<(String, serde_json::Value)> {
        self.sent.lock().clone()
    }

    /// Recorded message texts in order
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|(_, payload)| payload["text"].as_str().map(String::from))
            .collect()
    }
}

#[async_trait]
impl WebhookTransport for RecordingTransport {
    async fn post_json(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<DeliveryOutcome, NotifierError> {
        self.sent
            .lock()
            .push((url.to_string(), payload.clone()));
        Ok(self.outcome.clone())
    }
}

/// Transport whose every send fails at the connection level
pub struct FailingTransport;

#[async_trait]
impl WebhookTransport for FailingTransport {
    async fn post_json(
        &self,
        _url: &str,
        _payload: &serde_json::Value,
    ) -> Result<DeliveryOutcome, NotifierError> {
        Err(NotifierError::Transport("connection refused".to_string()))
    }
}

/// Secret store holding a single named secret
pub struct MapSecretStore {
    name: String,
    values: HashMap<String, String>,
}

impl MapSecretStore {
    pub fn new<'a>(name: &str, values: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            name: name.to_string(),
            values: values
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl SecretStore for MapSecretStore {
    async fn get_secret(&self, name: &str) -> Result<HashMap<String, String>, SecretError> {
        if name == self.name {
            Ok(self.values.clone())
        } else {
            Err(SecretError::NotFound(name.to_string()))
        }
    }
}
