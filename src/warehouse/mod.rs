//! Warehouse access for checks
//!
//! A check only needs one column of strings back from its query; the
//! [`Warehouse`] trait keeps the query engine behind that boundary.

pub mod athena;

pub use athena::{AthenaConfig, AthenaWarehouse};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Rendering of SQL NULL cells in extracted columns
pub const NULL_VALUE: &str = "NULL";

/// Query engine holding the monitored tables
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Execute `sql` against `database` and return the full result set
    async fn run_query(&self, sql: &str, database: &str) -> Result<QueryResult, WarehouseError>;
}

/// Tabular query result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Result rows; `None` is SQL NULL
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    /// Values of `column` in row order
    pub fn column_values(&self, column: &str) -> Result<Vec<String>, WarehouseError> {
        let col_idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| WarehouseError::ColumnNotFound(column.to_string()))?;

        self.rows
            .iter()
            .map(|row| match row.get(col_idx) {
                Some(Some(value)) => Ok(value.clone()),
                Some(None) => Ok(NULL_VALUE.to_string()),
                None => Err(WarehouseError::MalformedResult(format!(
                    "row has {} cells, expected at least {}",
                    row.len(),
                    col_idx + 1
                ))),
            })
            .collect()
    }
}

/// Warehouse errors
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    #[error("Warehouse request failed: {0}")]
    Request(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Malformed result: {0}")]
    MalformedResult(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(columns: Vec<&str>, rows: Vec<Vec<Option<&str>>>) -> QueryResult {
        QueryResult::new(
            columns.into_iter().map(String::from).collect(),
            rows.into_iter()
                .map(|row| row.into_iter().map(|c| c.map(String::from)).collect())
                .collect(),
        )
    }

    #[test]
    fn test_column_values() {
        let result = make_result(
            vec!["order_id", "order_status"],
            vec![
                vec![Some("1"), Some("delivered")],
                vec![Some("2"), Some("shipped")],
                vec![Some("3"), Some("delivered")],
            ],
        );
        assert_eq!(
            result.column_values("order_status").unwrap(),
            vec!["delivered", "shipped", "delivered"]
        );
    }

    #[test]
    fn test_column_values_null() {
        let result = make_result(vec!["payment_type"], vec![vec![Some("voucher")], vec![None]]);
        assert_eq!(
            result.column_values("payment_type").unwrap(),
            vec!["voucher", NULL_VALUE]
        );
    }

    #[test]
    fn test_column_values_empty_result() {
        let result = make_result(vec!["payment_type"], vec![]);
        assert!(result.column_values("payment_type").unwrap().is_empty());
    }

    #[test]
    fn test_column_not_found() {
        let result = make_result(vec!["payment_type"], vec![vec![Some("boleto")]]);
        match result.column_values("order_status") {
            Err(WarehouseError::ColumnNotFound(column)) => assert_eq!(column, "order_status"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_short_row() {
        let result = make_result(vec!["a", "b"], vec![vec![Some("x")]]);
        assert!(matches!(
            result.column_values("b"),
            Err(WarehouseError::MalformedResult(_))
        ));
    }
}
