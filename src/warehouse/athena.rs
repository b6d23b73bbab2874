//! Amazon Athena warehouse

use std::time::Duration;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{QueryExecutionContext, QueryExecutionState, ResultConfiguration};
use aws_sdk_athena::Client as AthenaClient;
use tracing::{debug, info_span, Instrument};

use super::{QueryResult, Warehouse, WarehouseError};

/// Athena execution settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AthenaConfig {
    pub workgroup: String,
    /// S3 location for query output; the workgroup default when unset
    pub output_location: Option<String>,
    /// Delay between query state polls
    pub poll_interval: Duration,
}

impl Default for AthenaConfig {
    fn default() -> Self {
        Self {
            workgroup: "primary".to_string(),
            output_location: None,
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Warehouse backed by Athena queries
pub struct AthenaWarehouse {
    client: AthenaClient,
    config: AthenaConfig,
}

impl std::fmt::Debug for AthenaWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AthenaWarehouse")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AthenaWarehouse {
    pub fn new(sdk_config: &SdkConfig, config: AthenaConfig) -> Self {
        Self {
            client: AthenaClient::new(sdk_config),
            config,
        }
    }

    async fn start(&self, sql: &str, database: &str) -> Result<String, WarehouseError> {
        let output = self
            .client
            .start_query_execution()
            .query_string(sql)
            .query_execution_context(QueryExecutionContext::builder().database(database).build())
            .work_group(&self.config.workgroup)
            .set_result_configuration(
                self.config
                    .output_location
                    .as_ref()
                    .map(|location| ResultConfiguration::builder().output_location(location).build()),
            )
            .send()
            .await
            .map_err(|e| WarehouseError::Request(DisplayErrorContext(e).to_string()))?;

        output
            .query_execution_id()
            .map(ToString::to_string)
            .ok_or_else(|| WarehouseError::MalformedResult("missing query execution id".to_string()))
    }

    /// Poll until the execution reaches a terminal state
    async fn wait(&self, execution_id: &str) -> Result<(), WarehouseError> {
        loop {
            let output = self
                .client
                .get_query_execution()
                .query_execution_id(execution_id)
                .send()
                .await
                .map_err(|e| WarehouseError::Request(DisplayErrorContext(e).to_string()))?;

            let status = output.query_execution().and_then(|q| q.status());
            let state = status.and_then(|s| s.state());
            let reason = status.and_then(|s| s.state_change_reason());

            if let Some(done) = terminal_state(state, reason) {
                return done;
            }

            debug!(execution_id, state = ?state, "Query still running");
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn fetch(&self, execution_id: &str) -> Result<QueryResult, WarehouseError> {
        let mut result = QueryResult::default();
        let mut first_page = true;

        let mut pages = self
            .client
            .get_query_results()
            .query_execution_id(execution_id)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| WarehouseError::Request(DisplayErrorContext(e).to_string()))?;
            let Some(result_set) = page.result_set() else {
                continue;
            };

            let columns: Vec<String> = result_set
                .result_set_metadata()
                .map(|meta| meta.column_info().iter().map(|c| c.name().to_string()).collect())
                .unwrap_or_default();
            let rows: Vec<Vec<Option<String>>> = result_set
                .rows()
                .iter()
                .map(|row| {
                    row.data()
                        .iter()
                        .map(|datum| datum.var_char_value().map(ToString::to_string))
                        .collect()
                })
                .collect();

            append_page(&mut result, columns, rows, first_page);
            first_page = false;
        }

        Ok(result)
    }
}

#[async_trait]
impl Warehouse for AthenaWarehouse {
    async fn run_query(&self, sql: &str, database: &str) -> Result<QueryResult, WarehouseError> {
        let span = info_span!("athena.query", database, workgroup = %self.config.workgroup);

        async move {
            let execution_id = self.start(sql, database).await?;
            debug!(execution_id = %execution_id, sql, "Started query");

            self.wait(&execution_id).await?;
            let result = self.fetch(&execution_id).await?;

            debug!(
                execution_id = %execution_id,
                rows = result.rows.len(),
                "Fetched query results"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }
}

/// `Some` once the execution can no longer change state
fn terminal_state(
    state: Option<&QueryExecutionState>,
    reason: Option<&str>,
) -> Option<Result<(), WarehouseError>> {
    match state {
        Some(QueryExecutionState::Succeeded) => Some(Ok(())),
        Some(QueryExecutionState::Failed) => Some(Err(WarehouseError::QueryFailed(
            reason.unwrap_or("query failed").to_string(),
        ))),
        Some(QueryExecutionState::Cancelled) => Some(Err(WarehouseError::QueryFailed(
            reason.unwrap_or("query cancelled").to_string(),
        ))),
        _ => None,
    }
}

/// Merge one result page. Athena repeats the column names as the first row of
/// the first page for SELECT statements.
fn append_page(
    result: &mut QueryResult,
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    first_page: bool,
) {
    if result.columns.is_empty() {
        result.columns = columns;
    }

    let mut rows = rows.into_iter().peekable();
    if first_page {
        let is_header = rows.peek().is_some_and(|row| {
            row.len() == result.columns.len()
                && row
                    .iter()
                    .zip(&result.columns)
                    .all(|(cell, column)| cell.as_deref() == Some(column.as_str()))
        });
        if is_header {
            rows.next();
        }
    }
    result.rows.extend(rows);
}
