//! Streaming map and reduce stages of the distributed build.
//!
//! The mapper turns one corpus shard into `token<TAB>posting-json` lines; the
//! hosting framework groups lines by token; the reducer concatenates every
//! posting it receives into one `{token: [posting, ...]}` document. Both
//! stages are stateless across tasks and safe to re-run.

use crate::builder::article_postings;
use crate::corpus::extract_articles;
use crate::persist::{load_index, save_index, save_meta, write_index, MetaFile};
use crate::storage::Storage;
use crate::{InvertedIndex, Posting};
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::io::{BufRead, Read, Write};

pub const KEY_DELIMITER: char = '\t';

/// Map one shard payload to its `(token, posting)` pairs. The payload is read
/// as a single JSON document; failing that, as JSON Lines, which is what a
/// line-split shard looks like. Records are located anywhere in the tree.
pub fn map_payload(payload: &str) -> Vec<(String, Posting)> {
    let articles = match serde_json::from_str::<Value>(payload) {
        Ok(value) => extract_articles(&value),
        Err(err) => {
            tracing::debug!(error = %err, "shard is not one JSON document, reading as lines");
            let mut articles = Vec::new();
            for line in payload.lines().filter(|l| !l.trim().is_empty()) {
                match serde_json::from_str::<Value>(line) {
                    Ok(value) => articles.extend(extract_articles(&value)),
                    Err(e) => tracing::warn!(error = %e, line, "skipping malformed input line"),
                }
            }
            articles
        }
    };
    articles.iter().flat_map(article_postings).collect()
}

pub fn format_pair(token: &str, posting: &Posting) -> Result<String> {
    Ok(format!("{token}{KEY_DELIMITER}{}", serde_json::to_string(posting)?))
}

pub fn parse_pair(line: &str) -> Result<(String, Posting)> {
    let (token, json) = line
        .trim()
        .split_once(KEY_DELIMITER)
        .ok_or_else(|| anyhow!("missing tab delimiter"))?;
    let posting: Posting = serde_json::from_str(json).context("invalid posting")?;
    Ok((token.to_string(), posting))
}

/// Read a whole shard from `input` and write one line per pair to `output`.
/// Lines that are not UTF-8 are dropped before mapping. Returns the number of
/// lines written.
pub fn run_mapper<R: Read, W: Write>(mut input: R, mut output: W) -> Result<usize> {
    let mut raw = Vec::new();
    input.read_to_end(&mut raw).context("reading mapper input")?;
    let payload = match String::from_utf8(raw) {
        Ok(payload) => payload,
        Err(err) => utf8_lines(&err.into_bytes()),
    };
    let pairs = map_payload(&payload);
    for (token, posting) in &pairs {
        writeln!(output, "{}", format_pair(token, posting)?)?;
    }
    output.flush()?;
    tracing::info!(pairs = pairs.len(), "map finished");
    Ok(pairs.len())
}

fn utf8_lines(raw: &[u8]) -> String {
    let mut kept = Vec::new();
    for (lineno, line) in raw.split(|b| *b == b'\n').enumerate() {
        match std::str::from_utf8(line) {
            Ok(line) => kept.push(line),
            Err(e) => tracing::warn!(line = lineno + 1, error = %e, "dropping non-UTF-8 input line"),
        }
    }
    kept.join("\n")
}

/// Accumulates mapper lines. Arrival order is whatever the shuffle delivers;
/// postings are appended as they come.
#[derive(Debug, Default)]
pub struct Reducer {
    index: InvertedIndex,
    skipped: usize,
}

impl Reducer {
    pub fn new() -> Self { Self::default() }

    pub fn push_line(&mut self, line: &str) {
        if line.trim().is_empty() { return; }
        match parse_pair(line) {
            Ok((token, posting)) => self.index.push(token, posting),
            Err(err) => {
                self.skipped += 1;
                tracing::warn!(line, error = %format!("{err:#}"), "skipping unparseable line");
            }
        }
    }

    /// Like `push_line`, for raw bytes off the stream. Non-UTF-8 lines are
    /// logged and counted as skipped.
    pub fn push_bytes(&mut self, line: &[u8]) {
        match std::str::from_utf8(line) {
            Ok(line) => self.push_line(line),
            Err(e) => {
                self.skipped += 1;
                tracing::warn!(line = %String::from_utf8_lossy(line), error = %e, "skipping non-UTF-8 line");
            }
        }
    }

    pub fn skipped(&self) -> usize { self.skipped }

    pub fn finish(self) -> InvertedIndex { self.index }
}

pub fn reduce_lines<I, S>(lines: I) -> InvertedIndex
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut reducer = Reducer::new();
    for line in lines {
        reducer.push_line(line.as_ref());
    }
    reducer.finish()
}

/// Reduce every line of `input` and write the resulting index document to
/// `output`.
pub fn run_reducer<R: BufRead, W: Write>(input: R, output: W) -> Result<InvertedIndex> {
    let mut reducer = Reducer::new();
    for line in input.split(b'\n') {
        reducer.push_bytes(&line.context("reading reducer input")?);
    }
    let skipped = reducer.skipped();
    let index = reducer.finish();
    write_index(output, &index)?;
    tracing::info!(num_terms = index.num_terms(), num_postings = index.num_postings(), skipped, "reduce finished");
    Ok(index)
}

/// Combine the partial documents of several reducers by concatenating
/// posting lists.
pub fn merge_indexes<I: IntoIterator<Item = InvertedIndex>>(parts: I) -> InvertedIndex {
    let mut merged = InvertedIndex::new();
    for part in parts {
        merged.extend(part);
    }
    merged
}

/// Merge reducer outputs stored at `inputs` into one index at `output`,
/// with its meta sidecar. The article count is the number of distinct
/// uuids among the merged postings.
pub fn merge_files(storage: &dyn Storage, inputs: &[String], output: &str) -> Result<(InvertedIndex, MetaFile)> {
    let parts = inputs
        .iter()
        .map(|path| load_index(storage, path))
        .collect::<Result<Vec<_>>>()?;
    let index = merge_indexes(parts);
    let meta = MetaFile::describe(&index, index.num_articles())?;
    save_index(storage, output, &index)?;
    save_meta(storage, output, &meta)?;
    tracing::info!(parts = inputs.len(), num_terms = index.num_terms(), output, "merge complete");
    Ok((index, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::load_meta;
    use crate::FsStorage;
    use tempfile::tempdir;

    const GO_1: &str = "go\t{\"uuid\":\"1\",\"title\":\"T\",\"author\":\"A\"}\n";

    fn posting(uuid: &str) -> Posting {
        Posting { uuid: uuid.into(), title: "T".into(), author: "A".into() }
    }

    #[test]
    fn pair_line_format() {
        let line = format_pair("go", &posting("1")).unwrap();
        assert_eq!(line, "go\t{\"uuid\":\"1\",\"title\":\"T\",\"author\":\"A\"}");
        assert_eq!(parse_pair(&line).unwrap(), ("go".to_string(), posting("1")));
    }

    #[test]
    fn parse_rejects_bad_lines() {
        assert!(parse_pair("no delimiter here").is_err());
        assert!(parse_pair("go\t{not json}").is_err());
        assert!(parse_pair("go\t{\"uuid\":\"1\",\"title\":\"T\"}").is_err());
    }

    #[test]
    fn map_emits_one_pair_per_occurrence() {
        let pairs = map_payload(r#"[{"uuid":"1","title":"Go go","author":"Rob"}]"#);
        let tokens: Vec<_> = pairs.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tokens, vec!["go", "go", "rob"]);
    }

    #[test]
    fn map_reads_line_split_shards() {
        let payload = "{\"uuid\":\"1\",\"title\":\"A\",\"author\":\"x\"}\n{broken\n{\"uuid\":\"2\",\"title\":\"B\",\"author\":\"y\"}\n";
        assert_eq!(map_payload(payload).len(), 4);
    }

    #[test]
    fn map_of_garbage_is_empty() {
        assert!(map_payload("<<not json>>").is_empty());
    }

    #[test]
    fn reducer_skips_and_counts_bad_lines() {
        let mut reducer = Reducer::new();
        reducer.push_line("go\t{\"uuid\":\"1\",\"title\":\"T\",\"author\":\"A\"}");
        reducer.push_line("garbage");
        reducer.push_line("");
        reducer.push_line("go\t{\"uuid\":\"1\",\"title\":\"T\",\"author\":\"A\"}\n");
        assert_eq!(reducer.skipped(), 1);
        assert_eq!(reducer.finish().get("go").unwrap().len(), 2);
    }

    #[test]
    fn reducer_stream_survives_non_utf8_line() {
        let mut input = GO_1.as_bytes().to_vec();
        input.extend_from_slice(b"bad\xff\xfeline\n");
        input.extend_from_slice(GO_1.as_bytes());
        let mut out = Vec::new();
        let index = run_reducer(input.as_slice(), &mut out).unwrap();
        assert_eq!(index.get("go").unwrap().len(), 2);
        let written: InvertedIndex = serde_json::from_slice(&out).unwrap();
        assert_eq!(written, index);
    }

    #[test]
    fn reducer_counts_non_utf8_as_skipped() {
        let mut reducer = Reducer::new();
        reducer.push_bytes(b"go\t\xff");
        reducer.push_bytes(GO_1.as_bytes());
        assert_eq!(reducer.skipped(), 1);
    }

    #[test]
    fn mapper_drops_only_non_utf8_records() {
        let mut input = b"{\"uuid\":\"1\",\"title\":\"Go\",\"author\":\"Rob\"}\n".to_vec();
        input.extend_from_slice(b"{\"uuid\":\"2\",\"title\":\"\xff\xfe\",\"author\":\"x\"}\n");
        let mut out = Vec::new();
        let written = run_mapper(input.as_slice(), &mut out).unwrap();
        assert_eq!(written, 2);
        let out = String::from_utf8(out).unwrap();
        assert!(out.lines().all(|l| l.contains("\"uuid\":\"1\"")));
    }

    #[test]
    fn merge_files_writes_matching_meta() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::open(dir.path()).unwrap();
        storage.write("part-0.json", b"{\"go\": [{\"uuid\":\"1\",\"title\":\"Go\",\"author\":\"Rob\"}]}").unwrap();
        storage
            .write(
                "part-1.json",
                b"{\"go\": [{\"uuid\":\"2\",\"title\":\"Go\",\"author\":\"Ann\"}], \"rob\": [{\"uuid\":\"1\",\"title\":\"Go\",\"author\":\"Rob\"}]}",
            )
            .unwrap();

        let inputs = vec!["part-0.json".to_string(), "part-1.json".to_string()];
        let (index, _) = merge_files(&storage, &inputs, "inverted_index.json").unwrap();
        let meta = load_meta(&storage, "inverted_index.json").unwrap();
        assert_eq!(meta.num_terms, index.num_terms());
        assert_eq!(meta.num_postings, 3);
        assert_eq!(meta.num_articles, 2);
        assert!(!meta.created_at.is_empty());
    }

    #[test]
    fn merge_concatenates_parts() {
        let a = reduce_lines(["go\t{\"uuid\":\"1\",\"title\":\"T\",\"author\":\"A\"}"]);
        let b = reduce_lines(["go\t{\"uuid\":\"2\",\"title\":\"T\",\"author\":\"A\"}"]);
        let merged = merge_indexes([a, b]);
        let ids: Vec<_> = merged.get("go").unwrap().iter().map(|p| p.uuid.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
