use serde::{Deserialize, Deserializer, Serialize};
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

/// A corpus record. Absent or null fields are normalized to empty strings on
/// ingestion so nothing downstream deals with optional fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub uuid: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub author: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub text: String,
}

fn string_or_empty<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

/// Denormalized snapshot of the fields used for matching and display.
/// All three fields are required when read back from mapper output or a
/// persisted index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Posting {
    pub uuid: String,
    pub title: String,
    pub author: String,
}

impl From<&Article> for Posting {
    fn from(article: &Article) -> Self {
        Self { uuid: article.uuid.clone(), title: article.title.clone(), author: article.author.clone() }
    }
}

/// Word -> postings, one posting per occurrence of the word in an article's
/// title and author. Serialized as a plain JSON object keyed by word.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvertedIndex {
    postings: BTreeMap<String, Vec<Posting>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, token: impl Into<String>, posting: Posting) {
        self.postings.entry(token.into()).or_default().push(posting);
    }

    pub fn get(&self, token: &str) -> Option<&[Posting]> {
        self.postings.get(token).map(Vec::as_slice)
    }

    /// Concatenates `other`'s posting lists onto ours. Postings are never merged.
    pub fn extend(&mut self, other: InvertedIndex) {
        for (token, postings) in other.postings {
            self.postings.entry(token).or_default().extend(postings);
        }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<Posting>> {
        self.postings.iter()
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn num_postings(&self) -> usize {
        self.postings.values().map(Vec::len).sum()
    }

    /// Distinct article uuids referenced by any posting.
    pub fn num_articles(&self) -> usize {
        self.postings.values().flatten().map(|p| p.uuid.as_str()).collect::<BTreeSet<_>>().len()
    }

    pub fn is_empty(&self) -> bool { self.postings.is_empty() }
}

impl<'a> IntoIterator for &'a InvertedIndex {
    type Item = (&'a String, &'a Vec<Posting>);
    type IntoIter = btree_map::Iter<'a, String, Vec<Posting>>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

/// A hydrated search hit, built from the live article rather than the
/// posting's snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub uuid: String,
    pub title: String,
    pub author: String,
    pub url: String,
    pub text: String,
}

impl From<&Article> for QueryResult {
    fn from(article: &Article) -> Self {
        Self {
            uuid: article.uuid.clone(),
            title: article.title.clone(),
            author: article.author.clone(),
            url: article.url.clone(),
            text: article.text.clone(),
        }
    }
}
