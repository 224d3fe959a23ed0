use crate::storage::Storage;
use crate::InvertedIndex;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use std::io::Write;

pub const INDEX_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_articles: usize,
    pub num_terms: usize,
    pub num_postings: usize,
    pub created_at: String,
    pub version: u32,
}

impl MetaFile {
    pub fn describe(index: &InvertedIndex, num_articles: usize) -> Result<Self> {
        Ok(Self {
            num_articles,
            num_terms: index.num_terms(),
            num_postings: index.num_postings(),
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .context("formatting index timestamp")?,
            version: INDEX_VERSION,
        })
    }
}

/// `inverted_index.json` -> `inverted_index.meta.json`.
pub fn meta_path(index_path: &str) -> String {
    let stem = index_path.strip_suffix(".json").unwrap_or(index_path);
    format!("{stem}.meta.json")
}

/// Serialize an index as one JSON document, four-space indented, with
/// non-ASCII text written as-is.
pub fn write_index<W: Write>(writer: W, index: &InvertedIndex) -> Result<()> {
    let mut ser = Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"    "));
    index.serialize(&mut ser)?;
    let mut writer = ser.into_inner();
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn index_to_json(index: &InvertedIndex) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_index(&mut buf, index)?;
    Ok(buf)
}

pub fn save_index(storage: &dyn Storage, path: &str, index: &InvertedIndex) -> Result<()> {
    storage.write(path, &index_to_json(index)?)
}

pub fn load_index(storage: &dyn Storage, path: &str) -> Result<InvertedIndex> {
    let json = storage.read_to_string(path)?;
    let index: InvertedIndex = serde_json::from_str(&json).with_context(|| format!("parsing index {path}"))?;
    tracing::info!(path, num_terms = index.num_terms(), "index loaded");
    Ok(index)
}

pub fn save_meta(storage: &dyn Storage, index_path: &str, meta: &MetaFile) -> Result<()> {
    let json = serde_json::to_string_pretty(meta)?;
    storage.write(&meta_path(index_path), json.as_bytes())
}

pub fn load_meta(storage: &dyn Storage, index_path: &str) -> Result<MetaFile> {
    let path = meta_path(index_path);
    let json = storage.read_to_string(&path)?;
    let meta = serde_json::from_str(&json).with_context(|| format!("parsing {path}"))?;
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_path_replaces_extension() {
        assert_eq!(meta_path("inverted_index.json"), "inverted_index.meta.json");
        assert_eq!(meta_path("out/index"), "out/index.meta.json");
    }

    #[test]
    fn writes_four_space_indent_and_raw_unicode() {
        let mut index = InvertedIndex::new();
        index.push("倒排", crate::Posting { uuid: "1".into(), title: "倒排 索引".into(), author: "".into() });
        let text = String::from_utf8(index_to_json(&index).unwrap()).unwrap();
        assert!(text.contains("\n    \"倒排\": ["));
        assert!(text.ends_with("}\n"));
    }
}
