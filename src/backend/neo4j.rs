//! Neo4jBackend — Bolt client for a running Neo4j server

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use neo4rs::{query, BoltMap, BoltNode, BoltPath, BoltType, ConfigBuilder, Graph, Row};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::columns::column_order;
use super::{GraphBackend, GraphError, GraphResult, Record};
use crate::config::AssistantConfig;

/// Backend that executes statements against Neo4j over Bolt.
///
/// The driver pool is capped at a single connection: the assistant never has
/// more than one statement in flight.
pub struct Neo4jBackend {
    graph: Graph,
    timeout: Duration,
}

impl Neo4jBackend {
    /// Connect to the server described by `config`.
    ///
    /// The configured timeout bounds both the initial handshake and every
    /// statement run afterwards.
    pub async fn connect(config: &AssistantConfig) -> GraphResult<Self> {
        let timeout = Duration::from_secs(config.timeout);
        info!("Connecting to Neo4j at {} as {}", config.neo4j_uri, config.neo4j_user);

        let driver_config = ConfigBuilder::default()
            .uri(config.neo4j_uri.as_str())
            .user(config.neo4j_user.as_str())
            .password(config.neo4j_password.as_deref().unwrap_or_default())
            .db(config.neo4j_database.as_str())
            .max_connections(1)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = tokio::time::timeout(timeout, Graph::connect(driver_config))
            .await
            .map_err(|_| GraphError::Timeout(config.timeout))?
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        Ok(Self { graph, timeout })
    }

    async fn fetch_all(&self, cypher: &str) -> GraphResult<Vec<Record>> {
        let mut stream = self
            .graph
            .execute(query(cypher))
            .await
            .map_err(|e| GraphError::Query(e.to_string()))?;

        let columns = column_order(cypher);
        let mut rows = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| GraphError::Query(e.to_string()))?
        {
            rows.push(row_to_record(&row, &columns)?);
        }
        Ok(rows)
    }
}

#[async_trait]
impl GraphBackend for Neo4jBackend {
    async fn run(&self, cypher: &str) -> GraphResult<Vec<Record>> {
        debug!("Running statement: {}", cypher);
        // The stream holds the pooled connection; dropping it on any exit
        // path hands the session back.
        let rows = tokio::time::timeout(self.timeout, self.fetch_all(cypher))
            .await
            .map_err(|_| GraphError::Timeout(self.timeout.as_secs()))??;
        debug!("Statement returned {} row(s)", rows.len());
        Ok(rows)
    }
}

/// Convert one row, laying out `columns` first and any other field after
/// them by name.
fn row_to_record(row: &Row, columns: &[String]) -> GraphResult<Record> {
    let mut fields: HashMap<String, BoltType> = row
        .to_strict()
        .map_err(|e| GraphError::Decode(e.to_string()))?;

    let mut record = Record::new();
    for column in columns {
        if let Some(value) = fields.remove(column) {
            record.insert(column.clone(), bolt_to_json(&value));
        }
    }

    let mut rest: Vec<(String, BoltType)> = fields.into_iter().collect();
    rest.sort_by(|a, b| a.0.cmp(&b.0));
    for (column, value) in rest {
        record.insert(column, bolt_to_json(&value));
    }
    Ok(record)
}

/// JSON form of a Bolt value.
///
/// Graph elements keep their identity: nodes carry labels, relationships
/// carry their type and endpoint ids, paths are broken into segments.
/// Temporal values become ISO-8601 strings.
fn bolt_to_json(value: &BoltType) -> Value {
    match value {
        BoltType::Null(_) => Value::Null,
        BoltType::String(s) => Value::String(s.value.clone()),
        BoltType::Boolean(b) => Value::Bool(b.value),
        BoltType::Integer(i) => Value::from(i.value),
        BoltType::Float(f) => json!(f.value),
        BoltType::List(list) => Value::Array(list.value.iter().map(bolt_to_json).collect()),
        BoltType::Map(map) => Value::Object(map_to_json(map)),
        BoltType::Node(node) => node_to_json(node),
        BoltType::Relation(rel) => json!({
            "id": rel.id.value,
            "type": rel.typ.value,
            "start": rel.start_node_id.value,
            "end": rel.end_node_id.value,
            "properties": Value::Object(map_to_json(&rel.properties)),
        }),
        BoltType::UnboundedRelation(rel) => json!({
            "id": rel.id.value,
            "type": rel.typ.value,
            "properties": Value::Object(map_to_json(&rel.properties)),
        }),
        BoltType::Path(path) => path_to_json(path),
        BoltType::Point2D(p) => json!({ "srid": p.sr_id.value, "x": p.x.value, "y": p.y.value }),
        BoltType::Point3D(p) => json!({
            "srid": p.sr_id.value,
            "x": p.x.value,
            "y": p.y.value,
            "z": p.z.value,
        }),
        BoltType::Bytes(bytes) => Value::Array(bytes.value.iter().map(|b| Value::from(*b)).collect()),
        BoltType::Date(_)
        | BoltType::Time(_)
        | BoltType::LocalTime(_)
        | BoltType::DateTime(_)
        | BoltType::LocalDateTime(_)
        | BoltType::DateTimeZoneId(_)
        | BoltType::Duration(_) => temporal_to_json(value),
    }
}

/// Map entries sorted by key; Bolt maps carry no order of their own
fn map_to_json(map: &BoltMap) -> Record {
    let mut entries: Vec<_> = map.value.iter().collect();
    entries.sort_by(|a, b| a.0.value.cmp(&b.0.value));
    entries
        .into_iter()
        .map(|(key, value)| (key.value.clone(), bolt_to_json(value)))
        .collect()
}

fn node_to_json(node: &BoltNode) -> Value {
    let labels: Vec<Value> = node.labels.value.iter().map(bolt_to_json).collect();
    json!({
        "id": node.id.value,
        "labels": labels,
        "properties": Value::Object(map_to_json(&node.properties)),
    })
}

/// A path as its start-to-end segments. `indices` alternates a 1-based,
/// direction-signed relationship index and a node index.
fn path_to_json(path: &BoltPath) -> Value {
    let nodes = path.nodes();
    let rels = path.rels();
    let indices: Vec<i64> = path.indices().iter().map(|i| i.value).collect();

    let mut segments = Vec::new();
    let mut current = 0usize;
    for pair in indices.chunks(2) {
        let [rel_index, node_index] = pair else {
            break;
        };
        let rel = (rel_index.unsigned_abs() as usize)
            .checked_sub(1)
            .and_then(|i| rels.get(i));
        let next = usize::try_from(*node_index).ok();
        let (Some(rel), Some(next)) = (rel, next) else {
            break;
        };
        let (Some(from), Some(to)) = (nodes.get(current), nodes.get(next)) else {
            break;
        };

        let (start, end) = if *rel_index > 0 {
            (from.id.value, to.id.value)
        } else {
            (to.id.value, from.id.value)
        };
        segments.push(json!({
            "start": node_to_json(from),
            "relationship": {
                "id": rel.id.value,
                "type": rel.typ.value,
                "start": start,
                "end": end,
                "properties": Value::Object(map_to_json(&rel.properties)),
            },
            "end": node_to_json(to),
        }));
        current = next;
    }

    let nodes: Vec<Value> = nodes.iter().map(node_to_json).collect();
    json!({ "nodes": nodes, "segments": segments })
}

fn temporal_to_json(value: &BoltType) -> Value {
    let text = match value {
        BoltType::Date(d) => NaiveDate::try_from(d).map(|d| d.to_string()).ok(),
        BoltType::DateTime(d) => DateTime::<FixedOffset>::try_from(d)
            .map(|dt| dt.to_rfc3339())
            .ok(),
        BoltType::DateTimeZoneId(d) => DateTime::<FixedOffset>::try_from(d)
            .map(|dt| format!("{}[{}]", dt.to_rfc3339(), d.tz_id()))
            .ok(),
        BoltType::LocalDateTime(d) => NaiveDateTime::try_from(d)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            .ok(),
        BoltType::Time(_) | BoltType::LocalTime(_) => {
            <(NaiveTime, Option<FixedOffset>)>::try_from(value.clone())
                .map(|(time, offset)| match offset {
                    Some(offset) => format!("{}{}", time, offset),
                    None => time.to_string(),
                })
                .ok()
        }
        BoltType::Duration(_) => Duration::try_from(value.clone())
            .map(|d| format!("PT{}S", d.as_secs_f64()))
            .ok(),
        _ => None,
    };
    text.map(Value::String).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo4rs::{
        BoltInteger, BoltList, BoltRelation, BoltString, BoltUnboundedRelation,
    };

    fn row(fields: Vec<(&str, BoltType)>) -> Row {
        let mut names = BoltList::new();
        let mut data = BoltList::new();
        for (name, value) in fields {
            names.push(BoltType::String(BoltString::new(name)));
            data.push(value);
        }
        Row::new(names, data)
    }

    fn text(value: &str) -> BoltType {
        BoltType::String(BoltString::new(value))
    }

    fn properties(entries: &[(&str, BoltType)]) -> BoltMap {
        let mut map = BoltMap::new();
        for (key, value) in entries {
            map.put(BoltString::new(key), value.clone());
        }
        map
    }

    fn node(id: i64, label: &str, name: &str) -> BoltNode {
        BoltNode::new(
            BoltInteger::new(id),
            BoltList::from(vec![text(label)]),
            properties(&[("name", text(name))]),
        )
    }

    #[test]
    fn test_columns_follow_the_statement() {
        let statement = "SHOW INDEXES";
        let columns = column_order(statement);
        let fields: Vec<(&str, BoltType)> = [
            "id",
            "name",
            "state",
            "populationPercent",
            "type",
            "entityType",
            "labelsOrTypes",
            "properties",
        ]
        .into_iter()
        .map(|name| (name, text(name)))
        .collect();

        let record = row_to_record(&row(fields), &columns).unwrap();

        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "id",
                "name",
                "state",
                "populationPercent",
                "type",
                "entityType",
                "labelsOrTypes",
                "properties",
            ]
        );
    }

    #[test]
    fn test_projection_order_then_leftovers_by_name() {
        let columns = column_order("MATCH (p:Person) RETURN p.name AS name, p.born AS born");
        let fields = vec![
            ("zeta", BoltType::Integer(BoltInteger::new(1))),
            ("born", BoltType::Integer(BoltInteger::new(1964))),
            ("alpha", BoltType::Integer(BoltInteger::new(2))),
            ("name", text("Keanu Reeves")),
        ];

        let record = row_to_record(&row(fields), &columns).unwrap();

        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "born", "alpha", "zeta"]);
        assert_eq!(record["born"], json!(1964));
    }

    #[test]
    fn test_schema_visualization_keeps_labels_and_relationship_types() {
        let acted_in = BoltRelation {
            id: BoltInteger::new(-1),
            start_node_id: BoltInteger::new(-10),
            end_node_id: BoltInteger::new(-20),
            typ: BoltString::new("ACTED_IN"),
            properties: BoltMap::new(),
        };
        let fields = vec![
            (
                "nodes",
                BoltType::List(BoltList::from(vec![
                    BoltType::Node(node(-10, "Person", "Person")),
                    BoltType::Node(node(-20, "Movie", "Movie")),
                ])),
            ),
            ("relationships", BoltType::List(BoltList::from(vec![BoltType::Relation(acted_in)]))),
        ];

        let record = row_to_record(&row(fields), &column_order("CALL db.schema.visualization()")).unwrap();

        assert_eq!(
            record["relationships"],
            json!([{ "id": -1, "type": "ACTED_IN", "start": -10, "end": -20, "properties": {} }])
        );
        assert_eq!(record["nodes"][0]["labels"], json!(["Person"]));
        assert_eq!(record["nodes"][1]["properties"]["name"], json!("Movie"));
        assert!(serde_json::to_string(&record).unwrap().starts_with(r#"{"nodes":"#));
    }

    #[test]
    fn test_path_is_split_into_segments() {
        let path = BoltPath {
            nodes: BoltList::from(vec![
                BoltType::Node(node(1, "Person", "Keanu")),
                BoltType::Node(node(2, "Movie", "The Matrix")),
            ]),
            rels: BoltList::from(vec![BoltType::UnboundedRelation(BoltUnboundedRelation::new(
                BoltInteger::new(7),
                BoltString::new("ACTED_IN"),
                BoltMap::new(),
            ))]),
            indices: BoltList::from(vec![
                BoltType::Integer(BoltInteger::new(1)),
                BoltType::Integer(BoltInteger::new(1)),
            ]),
        };

        let value = bolt_to_json(&BoltType::Path(path));

        let segment = &value["segments"][0];
        assert_eq!(segment["relationship"]["type"], json!("ACTED_IN"));
        assert_eq!(segment["relationship"]["start"], json!(1));
        assert_eq!(segment["relationship"]["end"], json!(2));
        assert_eq!(segment["end"]["labels"], json!(["Movie"]));
    }

    #[test]
    fn test_temporal_and_scalar_values() {
        let released = DateTime::parse_from_rfc3339("2024-05-01T10:30:00+02:00").unwrap();
        let fields = vec![
            ("released", BoltType::from(released)),
            ("day", BoltType::from(NaiveDate::from_ymd_opt(1999, 3, 31).unwrap())),
            ("rating", BoltType::from(8.7_f64)),
            ("seen", BoltType::from(true)),
            ("tags", BoltType::from(vec!["sci-fi", "action"])),
            ("missing", BoltType::Null(neo4rs::BoltNull)),
        ];

        let record = row_to_record(
            &row(fields),
            &column_order("RETURN released, day, rating, seen, tags, missing"),
        )
        .unwrap();

        assert_eq!(record["released"], json!("2024-05-01T10:30:00+02:00"));
        assert_eq!(record["day"], json!("1999-03-31"));
        assert_eq!(record["rating"], json!(8.7));
        assert_eq!(record["seen"], json!(true));
        assert_eq!(record["tags"], json!(["sci-fi", "action"]));
        assert_eq!(record["missing"], Value::Null);
    }
}
