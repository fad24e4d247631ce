//! Query executor.
//!
//! The only error-recovery point of the pipeline: anything that goes wrong
//! while running a statement becomes a [`QueryOutcome::Failure`] instead of
//! an `Err`.

use std::time::Duration;

use common::errors::AppError;
use common::models::query::{QueryFailure, QueryOutcome, SqlStatement};

use crate::pool_manager::QueryBackend;

/// Runs statements against the pool with a bounded execution time.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    timeout: Duration,
}

impl QueryExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Executes one statement and captures its outcome.
    pub async fn execute(&self, statement: &SqlStatement, pool: &dyn QueryBackend) -> QueryOutcome {
        tracing::info!(sql = %statement.text, binds = statement.binds.len(), "执行 SQL");

        match tokio::time::timeout(self.timeout, pool.run(statement)).await {
            Ok(Ok(result)) => {
                tracing::info!(
                    row_count = result.row_count,
                    duration_ms = result.execution_time_ms,
                    "SQL 执行成功"
                );
                QueryOutcome::Success(result)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "SQL 执行失败");
                QueryOutcome::Failure(QueryFailure::new(failure_details(e)))
            }
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "SQL 执行超时");
                QueryOutcome::Failure(QueryFailure::new(format!(
                    "query timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }
}

/// Driver text without our own error prefix.
fn failure_details(error: AppError) -> String {
    match error {
        AppError::DatabaseQuery(details) | AppError::DatabaseConnection(details) => details,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{table, StubBackend};
    use serde_json::json;

    fn executor() -> QueryExecutor {
        QueryExecutor::new(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_success_carries_rows() {
        let backend = StubBackend::answering(table(&["n"], vec![vec![json!(1)], vec![json!(2)]]));

        let outcome = executor().execute(&SqlStatement::raw("SELECT n FROM t"), backend.as_ref()).await;

        match outcome {
            QueryOutcome::Success(result) => {
                assert_eq!(result.row_count, 2);
                assert_eq!(result.rows[1][0], json!(2));
            }
            QueryOutcome::Failure(f) => panic!("unexpected failure: {:?}", f),
        }
        assert_eq!(backend.statements(), vec![SqlStatement::raw("SELECT n FROM t")]);
    }

    #[tokio::test]
    async fn test_error_becomes_failure() {
        let backend = StubBackend::failing("syntax error at or near \"SELEC\"");

        let outcome = executor().execute(&SqlStatement::raw("SELEC 1"), backend.as_ref()).await;

        match outcome {
            QueryOutcome::Failure(failure) => {
                assert_eq!(failure.message, "SQL Query Failed.");
                assert_eq!(failure.details, "syntax error at or near \"SELEC\"");
            }
            QueryOutcome::Success(_) => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_timeout_becomes_failure() {
        let backend = StubBackend::slow(Duration::from_millis(500));
        let executor = QueryExecutor::new(Duration::from_millis(20));

        let outcome = executor.execute(&SqlStatement::raw("SELECT pg_sleep(1)"), backend.as_ref()).await;

        match outcome {
            QueryOutcome::Failure(failure) => assert!(failure.details.contains("timed out")),
            QueryOutcome::Success(_) => panic!("expected timeout"),
        }
    }
}
