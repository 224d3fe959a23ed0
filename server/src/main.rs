use anyhow::Result;
use axum::Router;
use clap::Parser;
use server::{build_app, SourceConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Storage root holding the index and corpus
    #[arg(long, env = "INDEX_ROOT", default_value = ".")]
    root: PathBuf,
    /// Index path relative to the root
    #[arg(long, env = "INDEX_PATH", default_value = "inverted_index.json")]
    index: String,
    /// Corpus path relative to the root
    #[arg(long, env = "CORPUS_PATH", default_value = "input.json")]
    corpus: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 5000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = SourceConfig { root: args.root, index_path: args.index, corpus_path: args.corpus };
    let app: Router = build_app(&config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
