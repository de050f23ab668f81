//! Result rendering for the output sinks

use comfy_table::{ContentArrangement, Table};
use serde::{Deserialize, Serialize};

use crate::backend::Record;

/// How result rows are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON array of row objects
    #[default]
    Json,
    Table,
    Csv,
}

/// Render `rows` in database order, without filtering
pub fn render_rows(rows: &[Record], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(rows).unwrap_or_default(),
        OutputFormat::Csv => {
            let columns = columns(rows);
            let mut lines = vec![columns.join(",")];
            for row in rows {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| row.get(c).map(format_csv_value).unwrap_or_default())
                    .collect();
                lines.push(cells.join(","));
            }
            lines.join("\n")
        }
        OutputFormat::Table => {
            let columns = columns(rows);
            if columns.is_empty() {
                return "(no results)".to_string();
            }

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(&columns);
            for row in rows {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| row.get(c).map(format_table_value).unwrap_or_default())
                    .collect();
                table.add_row(cells);
            }
            format!("{}\n{} row(s)", table, rows.len())
        }
    }
}

/// Column names in first-seen order across all rows
fn columns(rows: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for key in rows.iter().flat_map(|row| row.keys()) {
        if !columns.contains(key) {
            columns.push(key.clone());
        }
    }
    columns
}

fn format_table_value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
            serde_json::to_string(v).unwrap_or_default()
        }
    }
}

fn format_csv_value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "".to_string(),
        serde_json::Value::String(s) => {
            if s.contains(',') || s.contains('"') || s.contains('\n') {
                format!("\"{}\"", s.replace('"', "\"\""))
            } else {
                s.clone()
            }
        }
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => {
            let json = serde_json::to_string(v).unwrap_or_default();
            format!("\"{}\"", json.replace('"', "\"\""))
        }
    }
}
