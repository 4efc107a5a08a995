//! SurrealDB connection management.

use std::env;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::schema::run_migrations;

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket URL (e.g., `127.0.0.1:8000`).
    pub url: String,
    /// SurrealDB namespace.
    pub namespace: String,
    /// SurrealDB database name.
    pub database: String,
    /// Root username for authentication.
    pub username: String,
    /// Root password for authentication.
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "streamgate".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Build a configuration from `STREAMGATE_DB_*` environment
    /// variables, falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            url: get("STREAMGATE_DB_URL").unwrap_or(defaults.url),
            namespace: get("STREAMGATE_DB_NAMESPACE").unwrap_or(defaults.namespace),
            database: get("STREAMGATE_DB_DATABASE").unwrap_or(defaults.database),
            username: get("STREAMGATE_DB_USERNAME").unwrap_or(defaults.username),
            password: get("STREAMGATE_DB_PASSWORD").unwrap_or(defaults.password),
        }
    }
}

/// Manages a connection to SurrealDB.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Connect to SurrealDB using the provided configuration.
    ///
    /// Authenticates as root, selects the configured namespace and
    /// database, and returns a ready-to-use manager.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("Successfully connected to SurrealDB");

        Ok(Self { db })
    }

    /// Bring the connected database up to the current schema version.
    pub async fn migrate(&self) -> Result<(), DbError> {
        run_migrations(&self.db).await
    }

    /// Round-trip query confirming the connection is usable.
    pub async fn health_check(&self) -> Result<(), DbError> {
        self.db.query("RETURN 1").await?.check()?;
        Ok(())
    }

    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn lookup_overrides_defaults_per_key() {
        let vars: HashMap<&str, &str> = [
            ("STREAMGATE_DB_URL", "db.internal:8000"),
            ("STREAMGATE_DB_DATABASE", "staging"),
        ]
        .into();
        let config = DbConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.url, "db.internal:8000");
        assert_eq!(config.database, "staging");
        // Unset keys keep their defaults.
        assert_eq!(config.namespace, "streamgate");
        assert_eq!(config.username, "root");
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = DbConfig::from_lookup(|_| None);
        assert_eq!(config.url, DbConfig::default().url);
        assert_eq!(config.namespace, "streamgate");
    }
}
