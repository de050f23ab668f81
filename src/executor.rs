//! Query execution with uniform success/failure capture

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::{GraphBackend, Record};

/// Minimal existence query used as the connectivity probe
pub const PROBE_QUERY: &str = "MATCH () RETURN 1 LIMIT 1";

/// Outcome of running one statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionResult {
    /// All rows, in the order the database returned them
    Success { rows: Vec<Record> },
    /// Driver or server error message
    Failure { error_message: String },
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }
}

/// Runs statements against a backend, never letting an error escape.
///
/// Every backend error becomes `ExecutionResult::Failure`, so callers only
/// ever branch on a result shape.
#[derive(Clone)]
pub struct QueryExecutor {
    backend: Arc<dyn GraphBackend>,
}

impl QueryExecutor {
    pub fn new(backend: Arc<dyn GraphBackend>) -> Self {
        Self { backend }
    }

    /// Run one statement and materialize its rows
    pub async fn execute(&self, cypher: &str) -> ExecutionResult {
        match self.backend.run(cypher).await {
            Ok(rows) => {
                debug!("Execution succeeded with {} row(s)", rows.len());
                ExecutionResult::Success { rows }
            }
            Err(e) => {
                warn!("Execution failed: {}", e);
                ExecutionResult::Failure {
                    error_message: e.to_string(),
                }
            }
        }
    }

    /// Cheap liveness check run before accepting user input
    pub async fn probe(&self) -> ExecutionResult {
        self.execute(PROBE_QUERY).await
    }

    /// Backend this executor runs against
    pub fn backend(&self) -> &dyn GraphBackend {
        self.backend.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GraphError, GraphResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct ScriptedBackend {
        seen: Mutex<Vec<String>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl GraphBackend for ScriptedBackend {
        async fn run(&self, cypher: &str) -> GraphResult<Vec<Record>> {
            self.seen.lock().unwrap().push(cypher.to_string());
            match &self.fail_with {
                Some(msg) => Err(GraphError::Query(msg.clone())),
                None => {
                    let mut row = Record::new();
                    row.insert("1".to_string(), json!(1));
                    Ok(vec![row])
                }
            }
        }
    }

    #[tokio::test]
    async fn test_success_is_captured() {
        let backend = Arc::new(ScriptedBackend {
            seen: Mutex::new(Vec::new()),
            fail_with: None,
        });
        let executor = QueryExecutor::new(backend.clone());

        let result = executor.execute("RETURN 1").await;
        match result {
            ExecutionResult::Success { rows } => assert_eq!(rows.len(), 1),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_driver_error_becomes_failure() {
        let backend = Arc::new(ScriptedBackend {
            seen: Mutex::new(Vec::new()),
            fail_with: Some("Invalid input 'RETRN'".to_string()),
        });
        let executor = QueryExecutor::new(backend);

        let result = executor.execute("RETRN 1").await;
        assert_eq!(
            result,
            ExecutionResult::Failure {
                error_message: "Invalid input 'RETRN'".to_string()
            }
        );
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn test_probe_runs_capped_existence_query() {
        let backend = Arc::new(ScriptedBackend {
            seen: Mutex::new(Vec::new()),
            fail_with: None,
        });
        let executor = QueryExecutor::new(backend.clone());

        assert!(executor.probe().await.is_success());
        assert_eq!(*backend.seen.lock().unwrap(), vec![PROBE_QUERY.to_string()]);
    }

    #[tokio::test]
    async fn test_probe_failure_is_not_an_error() {
        let backend = Arc::new(ScriptedBackend {
            seen: Mutex::new(Vec::new()),
            fail_with: Some("Connection refused".to_string()),
        });
        let executor = QueryExecutor::new(backend);

        assert!(!executor.probe().await.is_success());
    }
}
