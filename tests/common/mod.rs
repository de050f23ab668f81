//! In-memory doubles for the completion service and the graph backend

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use neo4j_assistant::schema::{
    CONSTRAINTS_QUERY, INDEXES_QUERY, SCHEMA_QUERY, STATS_QUERY, VERSION_QUERY,
};
use neo4j_assistant::{
    CompletionRequest, CompletionService, GraphBackend, GraphError, GraphResult, NLQError,
    NLQResult, OutputSink, Record, SchemaSnapshot,
};
use serde_json::{json, Value};

/// Completion service replaying scripted replies in order
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> NLQResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| NLQError::ApiError("no scripted reply left".to_string()))
    }
}

/// Graph backend answering known statements and recording every call
#[derive(Default)]
pub struct ScriptedGraph {
    answers: Mutex<HashMap<String, Result<Vec<Record>, String>>>,
    statements: Mutex<Vec<String>>,
}

impl ScriptedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, statement: &str, rows: Vec<Record>) -> Self {
        self.answers
            .lock()
            .unwrap()
            .insert(statement.to_string(), Ok(rows));
        self
    }

    pub fn with_error(self, statement: &str, message: &str) -> Self {
        self.answers
            .lock()
            .unwrap()
            .insert(statement.to_string(), Err(message.to_string()));
        self
    }

    /// Answers for the probe and all five introspection statements
    pub fn with_introspection(self) -> Self {
        self.with_rows(neo4j_assistant::executor::PROBE_QUERY, vec![record(&[("1", json!(1))])])
            .with_rows(VERSION_QUERY, vec![record(&[("version", json!("5.20.0"))])])
            .with_rows(
                SCHEMA_QUERY,
                vec![record(&[
                    (
                        "nodes",
                        json!([
                            {"id": -10, "labels": ["Person"], "properties": {"name": "Person"}},
                            {"id": -20, "labels": ["Movie"], "properties": {"name": "Movie"}},
                        ]),
                    ),
                    (
                        "relationships",
                        json!([
                            {"id": -1, "type": "ACTED_IN", "start": -10, "end": -20, "properties": {}},
                        ]),
                    ),
                ])],
            )
            .with_rows(
                STATS_QUERY,
                vec![record(&[("nodes", json!([{"label": "Person", "count": 3}]))])],
            )
            .with_rows(INDEXES_QUERY, vec![record(&[("name", json!("person_name"))])])
            .with_rows(
                CONSTRAINTS_QUERY,
                vec![record(&[
                    ("name", json!("movie_title")),
                    ("type", json!("UNIQUENESS")),
                ])],
            )
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    /// Statements other than the probe and introspection calls
    pub fn user_statements(&self) -> Vec<String> {
        let startup = [
            neo4j_assistant::executor::PROBE_QUERY,
            VERSION_QUERY,
            SCHEMA_QUERY,
            STATS_QUERY,
            INDEXES_QUERY,
            CONSTRAINTS_QUERY,
        ];
        self.statements()
            .into_iter()
            .filter(|s| !startup.contains(&s.as_str()))
            .collect()
    }
}

#[async_trait]
impl GraphBackend for ScriptedGraph {
    async fn run(&self, cypher: &str) -> GraphResult<Vec<Record>> {
        self.statements.lock().unwrap().push(cypher.to_string());
        match self.answers.lock().unwrap().get(cypher) {
            Some(Ok(rows)) => Ok(rows.clone()),
            Some(Err(message)) => Err(GraphError::Query(message.clone())),
            None => Err(GraphError::Query(format!("Invalid input: {}", cypher))),
        }
    }
}

/// Build a record with columns in the given order
pub fn record(columns: &[(&str, Value)]) -> Record {
    let mut row = Record::new();
    for (name, value) in columns {
        row.insert(name.to_string(), value.clone());
    }
    row
}

pub fn snapshot() -> SchemaSnapshot {
    SchemaSnapshot {
        version: "5.20.0".to_string(),
        schema: vec![record(&[
            (
                "nodes",
                json!([{"id": -10, "labels": ["Person"], "properties": {"name": "Person"}}]),
            ),
            ("relationships", json!([])),
        ])],
        stats: vec![record(&[("nodes", json!([{"label": "Person", "count": 3}]))])],
        indexes: Vec::new(),
        constraints: Vec::new(),
    }
}

pub fn generated(cypher: &str, explanation: &str) -> String {
    json!({ "cypher": cypher, "explanation": explanation }).to_string()
}

pub fn clarification(question: &str) -> String {
    json!({ "clarification": question }).to_string()
}

/// Cloneable in-memory writer
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Sink capturing messages and prompts separately
pub fn capture_sink() -> (OutputSink, SharedBuffer, SharedBuffer) {
    let messages = SharedBuffer::default();
    let prompts = SharedBuffer::default();
    let sink = OutputSink::with_writers(
        Some(Box::new(messages.clone())),
        Box::new(prompts.clone()),
        None,
    );
    (sink, messages, prompts)
}
