//! Tag-based strategy routing.
//!
//! Each webhook tag selects how the statement is built. Tag and parameter
//! checks happen before the pool is touched, so a bad request never reaches
//! the database.

use std::str::FromStr;
use std::sync::Arc;

use common::errors::{AppError, AppResult};
use common::models::query::{QueryOutcome, SqlStatement};
use common::models::webhook::{SessionInfo, WebhookResponse};
use serde_json::Value;

use crate::executor::QueryExecutor;
use crate::formatter::{extract_scalar, format_as_table};
use crate::pool_manager::PoolManager;
use crate::response_builder;

/// Nearest investments to the search phrase by embedding distance.
pub const SEMANTIC_SEARCH_SQL: &str = "SELECT ticker, etf, rating, analysis, \
     analysis_embedding <=> google_ml.embedding('textembedding-gecko@003', $1::text)::vector AS distance \
     FROM investments \
     ORDER BY distance \
     LIMIT 5";

/// Asks the database to translate a question into SQL.
pub const NL_TO_SQL_SQL: &str = "SELECT alloydb_ai_nl.get_sql(nl_query => $1::text)";

/// Execution strategy selected by the webhook tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Caller supplies the SQL, executed verbatim.
    Static,
    /// Caller supplies a search phrase for the vector-similarity query.
    Parameterized,
    /// Caller supplies a question; the generated SQL is reported, not run.
    Natural,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Static => "static",
            Tag::Parameterized => "parameterized",
            Tag::Natural => "natural",
        }
    }

    /// Session parameter this strategy reads.
    pub fn required_parameter(&self) -> &'static str {
        match self {
            Tag::Static => "sql",
            Tag::Parameterized => "sql_investment_search_phrase",
            Tag::Natural => "nl_query",
        }
    }

    fn error_title(&self) -> &'static str {
        match self {
            Tag::Natural => response_builder::GENERATION_ERROR_TITLE,
            Tag::Static | Tag::Parameterized => response_builder::EXECUTION_ERROR_TITLE,
        }
    }
}

impl FromStr for Tag {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(Tag::Static),
            "parameterized" => Ok(Tag::Parameterized),
            "natural" => Ok(Tag::Natural),
            other => Err(AppError::UnknownTag(other.to_string())),
        }
    }
}

/// Statement prepared for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub tag: Tag,
    pub statement: SqlStatement,
}

/// Resolves the tag and builds its statement from session parameters.
///
/// Caller text is bound as `$1` on the phrase and question paths; only the
/// `static` path runs caller SQL as written.
pub fn plan(tag: &str, session: &SessionInfo) -> AppResult<Plan> {
    let tag: Tag = tag.parse()?;
    let input = required_text(tag, session)?;

    let statement = match tag {
        Tag::Static => SqlStatement::raw(input),
        Tag::Parameterized => SqlStatement::with_binds(SEMANTIC_SEARCH_SQL, vec![input.to_string()]),
        Tag::Natural => SqlStatement::with_binds(NL_TO_SQL_SQL, vec![input.to_string()]),
    };

    Ok(Plan { tag, statement })
}

fn required_text(tag: Tag, session: &SessionInfo) -> AppResult<&str> {
    let key = tag.required_parameter();
    match session.parameter(key) {
        Some(Value::String(text)) => Ok(text.as_str()),
        None | Some(Value::Null) => Err(AppError::MissingParameter {
            tag: tag.as_str().to_string(),
            key: key.to_string(),
        }),
        Some(_) => Err(AppError::InvalidParameter {
            key: key.to_string(),
        }),
    }
}

/// Dispatches webhook calls to their strategy.
pub struct StrategyRouter {
    pools: Arc<PoolManager>,
    executor: QueryExecutor,
}

impl StrategyRouter {
    pub fn new(pools: Arc<PoolManager>, executor: QueryExecutor) -> Self {
        Self { pools, executor }
    }

    /// Runs the strategy for `tag` and shapes its outcome.
    ///
    /// # Errors
    /// Unknown tags, missing parameters and pool construction failures are
    /// returned as `Err`. Query failures are rendered into the response.
    pub async fn route(&self, tag: &str, session: &SessionInfo) -> AppResult<WebhookResponse> {
        let plan = plan(tag, session)?;
        tracing::info!(tag = plan.tag.as_str(), "路由 Webhook 请求");

        let pool = self.pools.get_pool().await?;
        let outcome = self.executor.execute(&plan.statement, pool.as_ref()).await;

        let response = match outcome {
            QueryOutcome::Failure(failure) => response_builder::error(plan.tag.error_title(), &failure),
            QueryOutcome::Success(result) => match plan.tag {
                Tag::Natural => response_builder::generated_sql(&extract_scalar(&result), result.row_count),
                Tag::Static | Tag::Parameterized => {
                    response_builder::table(&format_as_table(&result), result.row_count)
                }
            },
        };
        Ok(response)
    }
}
