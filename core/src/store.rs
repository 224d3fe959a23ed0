use crate::Article;
use std::collections::HashMap;

/// Read-only lookup from article uuid to the full record.
pub trait ArticleLookup {
    fn lookup(&self, uuid: &str) -> Option<&Article>;
}

/// In-memory article table built once from a loaded corpus.
#[derive(Debug, Default, Clone)]
pub struct ArticleStore {
    articles: HashMap<String, Article>,
}

impl ArticleStore {
    /// When the corpus repeats a uuid, the first record wins.
    pub fn new<I: IntoIterator<Item = Article>>(articles: I) -> Self {
        let mut map = HashMap::new();
        for article in articles {
            map.entry(article.uuid.clone()).or_insert(article);
        }
        Self { articles: map }
    }

    pub fn len(&self) -> usize { self.articles.len() }

    pub fn is_empty(&self) -> bool { self.articles.is_empty() }
}

impl ArticleLookup for ArticleStore {
    fn lookup(&self, uuid: &str) -> Option<&Article> { self.articles.get(uuid) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(uuid: &str, title: &str) -> Article {
        Article { uuid: uuid.into(), title: title.into(), ..Default::default() }
    }

    #[test]
    fn first_record_wins_on_duplicate_uuid() {
        let store = ArticleStore::new(vec![article("1", "first"), article("1", "second")]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup("1").map(|a| a.title.as_str()), Some("first"));
    }

    #[test]
    fn missing_uuid_is_absent() {
        let store = ArticleStore::new(vec![article("1", "x")]);
        assert!(store.lookup("2").is_none());
    }
}
