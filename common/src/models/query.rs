//! SQL statement and query outcome models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Message carried by every [`QueryFailure`].
pub const QUERY_FAILED_MESSAGE: &str = "SQL Query Failed.";

/// A single SQL statement plus its positional text parameters (`$1`, `$2`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    pub text: String,
    pub binds: Vec<String>,
}

impl SqlStatement {
    /// A statement executed exactly as written.
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            binds: Vec::new(),
        }
    }

    /// A statement with positional parameters bound at execution time.
    pub fn with_binds(text: impl Into<String>, binds: Vec<String>) -> Self {
        Self {
            text: text.into(),
            binds,
        }
    }
}

/// Rows returned by a successful statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct QueryResult {
    /// Column information, in select-list order.
    pub columns: Vec<ColumnInfo>,

    /// Row data (each row is a vector of JSON values).
    pub rows: Vec<Vec<serde_json::Value>>,

    /// Number of rows returned.
    #[serde(default)]
    pub row_count: usize,

    /// Query execution time in milliseconds.
    #[serde(default)]
    pub execution_time_ms: u64,
}

/// Column information in query result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type.
    pub data_type: String,
}

impl QueryResult {
    /// Builds a result from column names and rows; `row_count` follows `rows`.
    pub fn from_rows(columns: Vec<ColumnInfo>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self {
            row_count: rows.len(),
            columns,
            rows,
            execution_time_ms: 0,
        }
    }

    /// Column names in select-list order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Value at row 0, column 0, if any.
    pub fn first_value(&self) -> Option<&serde_json::Value> {
        self.rows.first().and_then(|row| row.first())
    }
}

/// A failed statement: fixed message plus the underlying error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QueryFailure {
    pub message: String,
    pub details: String,
}

impl QueryFailure {
    pub fn new(details: impl Into<String>) -> Self {
        Self {
            message: QUERY_FAILED_MESSAGE.to_string(),
            details: details.into(),
        }
    }
}

/// Outcome of running one statement. Exactly one variant is populated.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Success(QueryResult),
    Failure(QueryFailure),
}
