//! Graph database backends
//!
//! `GraphBackend` is the seam between the assistant and the database's query
//! engine: Cypher text goes in, ordered rows come out. `Neo4jBackend` speaks
//! Bolt to a running Neo4j server; tests plug in in-memory doubles.

mod columns;
pub mod neo4j;

use async_trait::async_trait;
use thiserror::Error;

pub use neo4j::Neo4jBackend;

/// One result row. Keys keep the column order of the statement's projection.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Errors raised by a graph backend
#[derive(Error, Debug)]
pub enum GraphError {
    /// Could not reach or authenticate against the server
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server rejected or failed the statement
    #[error("{0}")]
    Query(String),

    /// A row could not be converted into a record
    #[error("Row decoding error: {0}")]
    Decode(String),

    /// The statement did not finish within the configured timeout
    #[error("Query timed out after {0}s")]
    Timeout(u64),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Unified interface to a Cypher-speaking graph database.
///
/// Every call runs in its own session which is released before the call
/// returns, whether the statement succeeded, returned nothing, or failed.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Run one statement and materialize all of its rows in server order
    async fn run(&self, cypher: &str) -> GraphResult<Vec<Record>>;
}
