use crate::storage::Storage;
use crate::Article;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Keys whose presence marks an object as an embedded article record.
const RECORD_KEYS: [&str; 3] = ["uuid", "title", "author"];

/// Read and parse a corpus through `storage`. An unreadable or unparseable
/// corpus is an error; individual bad records are not.
pub fn load_corpus(storage: &dyn Storage, path: &str) -> Result<Vec<Article>> {
    let payload = storage.read_to_string(path)?;
    let articles = parse_corpus(&payload).with_context(|| format!("parsing corpus {path}"))?;
    tracing::info!(path, articles = articles.len(), "corpus loaded");
    Ok(articles)
}

/// Accepts a JSON array of records, a single record object, or JSON Lines.
pub fn parse_corpus(payload: &str) -> Result<Vec<Article>> {
    let err = match serde_json::from_str::<Value>(payload) {
        Ok(value) => return Ok(top_level_records(value)),
        Err(err) => err,
    };

    let mut articles = Vec::new();
    let mut saw_line = false;
    let mut parsed_line = false;
    for (lineno, line) in payload.lines().enumerate() {
        if line.trim().is_empty() { continue; }
        saw_line = true;
        match serde_json::from_str::<Value>(line) {
            Ok(value) => {
                parsed_line = true;
                articles.extend(top_level_records(value));
            }
            Err(e) => tracing::warn!(line = lineno + 1, error = %e, "skipping malformed corpus line"),
        }
    }
    if saw_line && !parsed_line {
        return Err(err).context("corpus is neither JSON nor JSON Lines");
    }
    Ok(articles)
}

fn top_level_records(value: Value) -> Vec<Article> {
    match value {
        Value::Array(items) => items.into_iter().filter_map(record_from_value).collect(),
        Value::Object(_) => record_from_value(value).into_iter().collect(),
        other => {
            tracing::warn!(kind = kind_of(&other), "corpus holds no records");
            Vec::new()
        }
    }
}

fn record_from_value(value: Value) -> Option<Article> {
    if !value.is_object() {
        tracing::warn!(kind = kind_of(&value), "skipping non-object corpus record");
        return None;
    }
    match Article::deserialize(value) {
        Ok(article) => Some(article),
        Err(e) => {
            tracing::warn!(error = %e, "skipping malformed corpus record");
            None
        }
    }
}

/// Walk an arbitrary JSON tree and collect every object carrying `uuid`,
/// `title` and `author`. Other objects and lists are searched recursively;
/// a matching object is taken whole and not searched further.
pub fn extract_articles(value: &Value) -> Vec<Article> {
    let mut out = Vec::new();
    walk(value, &mut out);
    out
}

fn walk(value: &Value, out: &mut Vec<Article>) {
    match value {
        Value::Object(map) if is_record(map) => match Article::deserialize(value) {
            Ok(article) => out.push(article),
            Err(e) => tracing::warn!(error = %e, "skipping malformed embedded record"),
        },
        Value::Object(map) => map.values().for_each(|v| walk(v, out)),
        Value::Array(items) => items.iter().for_each(|v| walk(v, out)),
        _ => {}
    }
}

fn is_record(map: &Map<String, Value>) -> bool {
    RECORD_KEYS.iter().all(|key| map.contains_key(*key))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
