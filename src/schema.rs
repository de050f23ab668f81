//! Schema snapshot captured once at startup
//!
//! The snapshot grounds every translation prompt in the live shape of the
//! database. It is taken once and never refreshed.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::backend::{GraphBackend, GraphError, Record};

pub const VERSION_QUERY: &str = "CALL dbms.components() YIELD name, versions WHERE name = 'Neo4j Kernel' RETURN versions[0] AS version";
pub const SCHEMA_QUERY: &str = "CALL db.schema.visualization()";
pub const STATS_QUERY: &str = "CALL db.stats.retrieve('GRAPH COUNTS')";
pub const INDEXES_QUERY: &str = "SHOW INDEXES";
pub const CONSTRAINTS_QUERY: &str = "SHOW CONSTRAINTS";

/// Snapshot capture errors. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// No kernel version row: unreachable server or unsupported edition
    #[error("Database version unavailable: server unreachable or unsupported edition")]
    VersionUnavailable,

    /// An introspection statement failed
    #[error("Introspection statement `{statement}` failed: {source}")]
    Introspection {
        statement: &'static str,
        source: GraphError,
    },
}

pub type SchemaResult<T> = Result<T, SchemaError>;

/// Immutable description of the database shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    /// Neo4j kernel version
    pub version: String,
    /// Rows of `db.schema.visualization()`
    pub schema: Vec<Record>,
    /// Rows of the graph-count statistics
    pub stats: Vec<Record>,
    /// Index descriptors
    pub indexes: Vec<Record>,
    /// Constraint descriptors
    pub constraints: Vec<Record>,
}

impl SchemaSnapshot {
    /// Run the five introspection statements through `backend` and collect
    /// the results.
    pub async fn capture(backend: &dyn GraphBackend) -> SchemaResult<Self> {
        let version_rows = introspect(backend, VERSION_QUERY).await?;
        let version = version_rows
            .first()
            .and_then(|row| row.get("version"))
            .and_then(|v| v.as_str())
            .ok_or(SchemaError::VersionUnavailable)?
            .to_string();

        let schema = introspect(backend, SCHEMA_QUERY).await?;
        let stats = introspect(backend, STATS_QUERY).await?;
        let indexes = introspect(backend, INDEXES_QUERY).await?;
        let constraints = introspect(backend, CONSTRAINTS_QUERY).await?;

        info!(
            "Captured schema snapshot: Neo4j {}, {} schema record(s), {} index(es), {} constraint(s)",
            version,
            schema.len(),
            indexes.len(),
            constraints.len()
        );

        Ok(Self {
            version,
            schema,
            stats,
            indexes,
            constraints,
        })
    }

    /// Compact JSON of the schema graph, as embedded in prompts
    pub fn schema_json(&self) -> String {
        serde_json::to_string(&self.schema).unwrap_or_default()
    }

    /// Compact JSON of the statistics, as embedded in prompts
    pub fn stats_json(&self) -> String {
        serde_json::to_string(&self.stats).unwrap_or_default()
    }
}

async fn introspect(backend: &dyn GraphBackend, statement: &'static str) -> SchemaResult<Vec<Record>> {
    backend
        .run(statement)
        .await
        .map_err(|source| SchemaError::Introspection { statement, source })
}
