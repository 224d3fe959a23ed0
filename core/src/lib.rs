pub mod builder;
pub mod corpus;
pub mod index;
pub mod mapreduce;
pub mod persist;
pub mod query;
pub mod storage;
pub mod store;
pub mod tokenizer;

pub use builder::{article_postings, build_index};
pub use index::{Article, InvertedIndex, Posting, QueryResult};
pub use query::{search, SearchSnapshot};
pub use storage::{FsStorage, Storage};
pub use store::{ArticleLookup, ArticleStore};
