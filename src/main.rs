//! PIPILA CLI - main entry point
//!
//! Unified interface for corpus download, indexing, and retrieval.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use pipila::{commands, metrics, Config};

#[derive(Parser)]
#[command(name = "pipila")]
#[command(about = "Financial document RAG pipeline", long_about = None)]
#[command(version)]
struct Cli {
    /// Address to expose Prometheus metrics (e.g., 0.0.0.0:9898)
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and unpack the document corpus
    Download {
        /// Archive URL (falls back to CORPUS_URL / config.yml)
        #[arg(long)]
        url: Option<String>,

        /// Target directory for the unpacked corpus
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Index documents into the vector collection
    Ingest {
        /// Documents directory (defaults to config)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Documents per embedding batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Use the local hashing embedder instead of OpenAI
        #[arg(long, default_value_t = false)]
        local_embeddings: bool,
    },

    /// Retrieve the nearest chunks for a query
    Query {
        /// Search query
        query: String,

        /// Number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Use the local hashing embedder instead of OpenAI
        #[arg(long, default_value_t = false)]
        local_embeddings: bool,
    },

    /// Answer a question with retrieved context and Gemini
    Ask {
        /// The question to answer
        question: String,

        /// Context chunks to retrieve
        #[arg(short, long)]
        limit: Option<usize>,

        /// Use the local hashing embedder instead of OpenAI
        #[arg(long, default_value_t = false)]
        local_embeddings: bool,
    },

    /// Show vector collection statistics
    Stats,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Download { .. } => "download",
            Commands::Ingest { .. } => "ingest",
            Commands::Query { .. } => "query",
            Commands::Ask { .. } => "ask",
            Commands::Stats => "stats",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pipila=info".parse()?))
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr.as_deref() {
        match addr.parse::<SocketAddr>() {
            Ok(socket) => metrics::spawn_metrics_server(socket),
            Err(err) => warn!(%addr, "Invalid metrics address: {}", err),
        }
    }

    let command_name = cli.command.name();
    metrics::record_command_start(command_name);
    let start = Instant::now();

    let result = execute_command(cli.command).await;

    metrics::record_command_result(command_name, start.elapsed(), result.is_ok());

    result
}

async fn execute_command(command: Commands) -> anyhow::Result<()> {
    let config = Config::new();

    match command {
        Commands::Download { url, output_dir } => {
            commands::download::run(&config, url, output_dir).await?;
        }
        Commands::Ingest {
            dir,
            batch_size,
            local_embeddings,
        } => {
            commands::ingest::run(&config, dir, batch_size, local_embeddings).await?;
        }
        Commands::Query {
            query,
            limit,
            local_embeddings,
        } => {
            commands::query::run(&config, &query, limit, local_embeddings).await?;
        }
        Commands::Ask {
            question,
            limit,
            local_embeddings,
        } => {
            commands::query::ask(&config, &question, limit, local_embeddings).await?;
        }
        Commands::Stats => {
            // Dimension is display-only here; the collection stores the truth.
            commands::stats::run(&config, 1536).await?;
        }
    }

    Ok(())
}
