use anyhow::Result;
use axum::Router;
use clap::Parser;
use search_core::{NormalizerConfig, StemmerKind};
use server::{build_app, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Corpus file or directory (.json/.jsonl/.txt)
    #[arg(long, default_value = "./corpus")]
    corpus: PathBuf,
    /// Stemming strategy shared by indexing and querying
    #[arg(long, default_value_t = StemmerKind::Identity)]
    stemmer: StemmerKind,
    /// Apply NFKC folding before lower-casing
    #[arg(long, default_value_t = false)]
    unicode_fold: bool,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let normalizer = NormalizerConfig { stemmer: args.stemmer, unicode_fold: args.unicode_fold };
    let config = ServerConfig::from_env(Some(args.corpus), normalizer);
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
