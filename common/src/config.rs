//! Configuration loading.
//!
//! Everything is read from the process environment exactly once at startup.
//! Required values that are missing produce [`AppError::Config`], which the
//! binary treats as fatal.

use crate::errors::{AppError, AppResult};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

const DEFAULT_CLUSTER: &str = "alloydb-cluster";
const DEFAULT_INSTANCE: &str = "alloydb-instance";
const DEFAULT_DATABASE: &str = "ragdemos";
const DEFAULT_USER: &str = "postgres";
const DEFAULT_DB_HOST: &str = "127.0.0.1";
const DEFAULT_DB_PORT: u16 = 5432;

/// Server-side settings for a running service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service_name: String,
    pub host: String,
    pub port: u16,
    /// Upper bound of pooled database connections.
    pub max_connections: u32,
    /// Seconds to wait when acquiring a pooled connection.
    pub connect_timeout_secs: u64,
    /// Seconds a single statement may run before it is abandoned.
    pub query_timeout_secs: u64,
}

impl AppConfig {
    /// Loads server settings for the named service from the environment.
    pub fn load_with_service(service_name: &str) -> Self {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Loads server settings through an arbitrary key lookup.
    pub fn from_lookup<F>(service_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            service_name: service_name.to_string(),
            host: lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, "SERVER_PORT", DEFAULT_PORT),
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            connect_timeout_secs: parse_or(
                &lookup,
                "DB_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            ),
            query_timeout_secs: parse_or(&lookup, "QUERY_TIMEOUT_SECS", DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup("webhook-service", |_| None)
    }
}

/// Connection parameters for the managed AlloyDB instance.
#[derive(Clone)]
pub struct DatabaseSettings {
    pub region: String,
    pub project_id: String,
    pub cluster: String,
    pub instance: String,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Address of the secure-connection endpoint (auth proxy) in front of the instance.
    pub host: String,
    pub port: u16,
}

impl DatabaseSettings {
    /// Reads connector settings from the environment.
    ///
    /// # Errors
    /// Returns `AppError::Config` when `REGION`, `PROJECT_ID` or
    /// `ALLOYDB_PASSWORD` is missing.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads connector settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::Config(format!("missing required environment variable {}", key)))
        };
        let optional = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            region: required("REGION")?,
            project_id: required("PROJECT_ID")?,
            password: required("ALLOYDB_PASSWORD")?,
            cluster: optional("ALLOYDB_CLUSTER", DEFAULT_CLUSTER),
            instance: optional("ALLOYDB_INSTANCE", DEFAULT_INSTANCE),
            database: optional("ALLOYDB_DATABASE", DEFAULT_DATABASE),
            user: optional("ALLOYDB_USER", DEFAULT_USER),
            host: optional("ALLOYDB_HOST", DEFAULT_DB_HOST),
            port: parse_or(&lookup, "ALLOYDB_PORT", DEFAULT_DB_PORT),
        })
    }

    /// Fully qualified AlloyDB instance URI.
    pub fn instance_uri(&self) -> String {
        format!(
            "projects/{}/locations/{}/clusters/{}/instances/{}",
            self.project_id, self.region, self.cluster, self.instance
        )
    }
}

// The password never reaches logs.
impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("instance_uri", &self.instance_uri())
            .field("database", &self.database)
            .field("user", &self.user)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}
