//! Test doubles for the database seam.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::config::DatabaseSettings;
use common::errors::{AppError, AppResult};
use common::models::query::{ColumnInfo, QueryResult, SqlStatement};
use serde_json::Value;

use crate::pool_manager::{Connector, QueryBackend};

pub fn settings() -> DatabaseSettings {
    DatabaseSettings::from_lookup(|key| match key {
        "REGION" => Some("us-central1".to_string()),
        "PROJECT_ID" => Some("test-project".to_string()),
        "ALLOYDB_PASSWORD" => Some("secret".to_string()),
        _ => None,
    })
    .unwrap()
}

/// Builds a result from column names and rows.
pub fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> QueryResult {
    QueryResult::from_rows(
        columns
            .iter()
            .map(|name| ColumnInfo {
                name: name.to_string(),
                data_type: "TEXT".to_string(),
            })
            .collect(),
        rows,
    )
}

/// Backend that replays scripted answers and records every statement.
pub struct StubBackend {
    answers: Mutex<VecDeque<AppResult<QueryResult>>>,
    delay: Option<Duration>,
    statements: Mutex<Vec<SqlStatement>>,
}

impl StubBackend {
    pub fn new(answers: Vec<AppResult<QueryResult>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            delay: None,
            statements: Mutex::new(Vec::new()),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn answering(result: QueryResult) -> Arc<Self> {
        Self::new(vec![Ok(result)])
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::new(vec![Err(AppError::DatabaseQuery(message.to_string()))])
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(VecDeque::new()),
            delay: Some(delay),
            statements: Mutex::new(Vec::new()),
        })
    }

    pub fn statements(&self) -> Vec<SqlStatement> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryBackend for StubBackend {
    async fn run(&self, statement: &SqlStatement) -> AppResult<QueryResult> {
        self.statements.lock().unwrap().push(statement.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.answers.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(QueryResult::default()))
    }
}

/// Connector that hands out one backend and counts constructions.
pub struct CountingConnector {
    backend: Arc<StubBackend>,
    delay: Option<Duration>,
    constructions: AtomicUsize,
}

impl CountingConnector {
    pub fn new(backend: Arc<StubBackend>) -> Self {
        Self {
            backend,
            delay: None,
            constructions: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for CountingConnector {
    async fn connect(&self, _settings: &DatabaseSettings) -> AppResult<Arc<dyn QueryBackend>> {
        self.constructions.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let backend: Arc<dyn QueryBackend> = self.backend.clone();
        Ok(backend)
    }
}

/// Connector whose instance is unreachable.
pub struct FailingConnector;

#[async_trait]
impl Connector for FailingConnector {
    async fn connect(&self, _settings: &DatabaseSettings) -> AppResult<Arc<dyn QueryBackend>> {
        Err(AppError::DatabaseConnection("connection refused".to_string()))
    }
}
