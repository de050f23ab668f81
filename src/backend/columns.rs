//! Result column order recovered from statement text
//!
//! The Bolt driver hands each row back as a hash map, so the order in which
//! the server reported its columns is gone once a row is decoded. It is
//! rebuilt from the projection of the statement itself: the last top-level
//! `RETURN` or `YIELD` clause, one column per item, named by its alias or
//! by the expression text as written.

/// Columns of fixed-shape statements that carry no projection clause
const KNOWN_COLUMNS: &[(&str, &[&str])] = &[
    (
        "SHOW INDEXES",
        &[
            "id",
            "name",
            "state",
            "populationPercent",
            "type",
            "entityType",
            "labelsOrTypes",
            "properties",
            "indexProvider",
            "owningConstraint",
            "lastRead",
            "readCount",
        ],
    ),
    (
        "SHOW CONSTRAINTS",
        &[
            "id",
            "name",
            "type",
            "entityType",
            "labelsOrTypes",
            "properties",
            "ownedIndex",
            "propertyType",
        ],
    ),
    ("CALL db.schema.visualization", &["nodes", "relationships"]),
    ("CALL db.stats.retrieve", &["section", "data"]),
];

/// Keywords that close a projection list
const PROJECTION_END: &[&str] = &["ORDER", "SKIP", "LIMIT", "WHERE", "UNION"];

/// Column names `statement` produces, in server order. Empty when unknown.
pub fn column_order(statement: &str) -> Vec<String> {
    let statement = statement.trim().trim_end_matches(';').trim_end();
    let columns = projection_columns(statement);
    if !columns.is_empty() {
        return columns;
    }
    KNOWN_COLUMNS
        .iter()
        .find(|(prefix, _)| {
            statement
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        })
        .map(|(_, columns)| columns.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default()
}

fn projection_columns(statement: &str) -> Vec<String> {
    let mask = top_level(statement);
    let words = words(statement, &mask);
    let is = |word: &(usize, usize), keyword: &str| statement[word.0..word.1].eq_ignore_ascii_case(keyword);

    let Some(clause) = words.iter().rposition(|w| is(w, "RETURN") || is(w, "YIELD")) else {
        return Vec::new();
    };
    let following = &words[clause + 1..];
    let end = following
        .iter()
        .find(|w| PROJECTION_END.iter().any(|keyword| is(w, keyword)))
        .map(|w| w.0)
        .unwrap_or(statement.len());
    let start = match following.first() {
        Some(word) if word.1 <= end && is(word, "DISTINCT") => word.1,
        _ => words[clause].1,
    };

    let bytes = statement.as_bytes();
    let mut columns = Vec::new();
    let mut item_start = start;
    for i in start..=end {
        if i == end || (mask[i] && bytes[i] == b',') {
            if let Some(column) = column_name(statement, item_start, i, &words) {
                columns.push(column);
            }
            item_start = i + 1;
        }
    }
    columns
}

/// Name of the projection item spanning `from..to`
fn column_name(statement: &str, from: usize, to: usize, words: &[(usize, usize)]) -> Option<String> {
    let item = statement[from..to].trim();
    if item.is_empty() || item == "*" {
        return None;
    }
    let alias = words
        .iter()
        .filter(|w| w.0 >= from && w.1 <= to)
        .filter(|w| statement[w.0..w.1].eq_ignore_ascii_case("AS"))
        .last();
    let name = match alias {
        Some(word) => statement[word.1..to].trim(),
        None => item,
    };
    Some(name.trim_matches('`').to_string())
}

/// Per byte: true outside any bracket pair and any quoted text
fn top_level(text: &str) -> Vec<bool> {
    let bytes = text.as_bytes();
    let mut mask = vec![false; bytes.len()];
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == b'\\' && q != b'`' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                _ => mask[i] = depth == 0,
            },
        }
        i += 1;
    }
    mask
}

/// Byte ranges of the top-level words of `text`
fn words(text: &str, mask: &[bool]) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let is_word = |i: usize| mask[i] && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'_' | b'$' | b'.'));
    let mut words = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if is_word(i) {
            let start = i;
            while i < bytes.len() && is_word(i) {
                i += 1;
            }
            words.push((start, i));
        } else {
            i += 1;
        }
    }
    words
}
