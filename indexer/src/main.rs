use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use index_core::corpus::load_corpus;
use index_core::mapreduce::{merge_files, run_mapper, run_reducer};
use index_core::persist::{save_index, save_meta, MetaFile};
use index_core::{build_index, FsStorage, SearchSnapshot};
use tracing_subscriber::{fmt, EnvFilter};

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query the article word index", long_about = None)]
struct Cli {
    /// Storage root; every other path is relative to it
    #[arg(long, env = "INDEX_ROOT", default_value = ".", global = true)]
    root: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from the whole corpus in one pass
    Build {
        /// Corpus path (JSON array, object or JSON Lines)
        #[arg(long, env = "CORPUS_PATH", default_value = "input.json")]
        input: String,
        /// Index output path
        #[arg(long, env = "INDEX_PATH", default_value = "inverted_index.json")]
        output: String,
    },
    /// Map stage: read one shard on stdin, write `token<TAB>posting` lines to stdout
    Map,
    /// Reduce stage: read grouped mapper lines on stdin, write the index document to stdout
    Reduce,
    /// Concatenate several reducer outputs into one index
    Merge {
        /// Reducer output paths
        #[arg(long, required = true, num_args = 1..)]
        inputs: Vec<String>,
        /// Merged index path
        #[arg(long, env = "INDEX_PATH", default_value = "inverted_index.json")]
        output: String,
    },
    /// Run a single query and print matching articles as JSON lines
    Query {
        #[arg(long, env = "INDEX_PATH", default_value = "inverted_index.json")]
        index: String,
        #[arg(long, env = "CORPUS_PATH", default_value = "input.json")]
        corpus: String,
        /// Query words
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
}

fn main() -> Result<()> {
    // stdout carries map/reduce data, so diagnostics go to stderr.
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build(&cli.root, &input, &output),
        Commands::Map => {
            let stdout = io::stdout();
            run_mapper(io::stdin().lock(), BufWriter::new(stdout.lock()))?;
            Ok(())
        }
        Commands::Reduce => {
            let stdout = io::stdout();
            run_reducer(io::stdin().lock(), BufWriter::new(stdout.lock()))?;
            Ok(())
        }
        Commands::Merge { inputs, output } => merge(&cli.root, &inputs, &output),
        Commands::Query { index, corpus, query } => run_query(&cli.root, &index, &corpus, &query.join(" ")),
    }
}

fn build(root: &Path, input: &str, output: &str) -> Result<()> {
    let storage = FsStorage::open(root)?;
    let articles = load_corpus(&storage, input)?;
    let index = build_index(&articles);
    save_index(&storage, output, &index)?;
    save_meta(&storage, output, &MetaFile::describe(&index, articles.len())?)?;
    tracing::info!(output, "index build complete");
    storage.close();
    Ok(())
}

fn merge(root: &Path, inputs: &[String], output: &str) -> Result<()> {
    let storage = FsStorage::open(root)?;
    merge_files(&storage, inputs, output)?;
    storage.close();
    Ok(())
}

fn run_query(root: &Path, index: &str, corpus: &str, query: &str) -> Result<()> {
    let storage = FsStorage::open(root)?;
    let snapshot = SearchSnapshot::open(&storage, index, corpus)?;
    storage.close();

    let results = snapshot.search(query);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for result in &results {
        serde_json::to_writer(&mut out, result).context("writing result")?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    tracing::info!(query, hits = results.len(), "query complete");
    Ok(())
}
