use crate::corpus::load_corpus;
use crate::persist::load_index;
use crate::storage::Storage;
use crate::tokenizer::tokenize;
use crate::{Article, ArticleLookup, ArticleStore, InvertedIndex, QueryResult};
use anyhow::Result;

/// Resolve `query` against `index`, hydrating each posting from `articles`.
///
/// Results follow query-token order, then posting order. Nothing is
/// deduplicated: an article matched by two query words, or twice by one,
/// appears once per posting. Postings whose article is gone are skipped.
pub fn search<L>(query: &str, index: &InvertedIndex, articles: &L) -> Vec<QueryResult>
where
    L: ArticleLookup + ?Sized,
{
    let mut results = Vec::new();
    for token in tokenize(query) {
        let Some(postings) = index.get(&token) else { continue };
        for posting in postings {
            match articles.lookup(&posting.uuid) {
                Some(article) => results.push(QueryResult::from(article)),
                None => tracing::debug!(uuid = %posting.uuid, token = %token, "posting references missing article"),
            }
        }
    }
    results
}

/// Immutable index + corpus pair loaded once and shared by every query.
#[derive(Debug, Clone)]
pub struct SearchSnapshot {
    index: InvertedIndex,
    articles: ArticleStore,
}

impl SearchSnapshot {
    pub fn new(index: InvertedIndex, articles: ArticleStore) -> Self {
        Self { index, articles }
    }

    /// Load both inputs through `storage`. Either one missing or unreadable
    /// fails the whole open.
    pub fn open(storage: &dyn Storage, index_path: &str, corpus_path: &str) -> Result<Self> {
        let index = load_index(storage, index_path)?;
        let articles = ArticleStore::new(load_corpus(storage, corpus_path)?);
        if index.is_empty() || articles.is_empty() {
            tracing::warn!(index_path, corpus_path, "search snapshot has an empty index or corpus");
        }
        tracing::info!(num_terms = index.num_terms(), num_articles = articles.len(), "search snapshot ready");
        Ok(Self::new(index, articles))
    }

    pub fn search(&self, query: &str) -> Vec<QueryResult> {
        search(query, &self.index, &self.articles)
    }

    pub fn article(&self, uuid: &str) -> Option<&Article> { self.articles.lookup(uuid) }
}
