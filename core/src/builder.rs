use crate::tokenizer::tokenize;
use crate::{Article, InvertedIndex, Posting};

/// Every `(token, posting)` pair one article contributes: one per word
/// occurrence in `title` followed by `author`. A word repeated across or
/// within the two fields yields one posting per occurrence.
pub fn article_postings(article: &Article) -> Vec<(String, Posting)> {
    let posting = Posting::from(article);
    tokenize(&format!("{} {}", article.title, article.author))
        .into_iter()
        .map(|token| (token, posting.clone()))
        .collect()
}

/// Single-node build: append each article's postings to the bucket of its
/// tokens, in corpus order.
pub fn build_index<'a, I>(articles: I) -> InvertedIndex
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut index = InvertedIndex::new();
    let mut num_articles = 0usize;
    for article in articles {
        tracing::debug!(uuid = %article.uuid, "indexing article");
        for (token, posting) in article_postings(article) {
            index.push(token, posting);
        }
        num_articles += 1;
    }
    tracing::info!(num_articles, num_terms = index.num_terms(), num_postings = index.num_postings(), "index built");
    index
}
