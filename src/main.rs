//! finrag: hybrid retrieval and knowledge-graph context for financial RAG

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use finrag::config::{Config, LogFormat};
use std::path::PathBuf;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "finrag")]
#[command(about = "Hybrid retrieval and knowledge-graph context for financial documents")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "finrag.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Index a JSONL corpus and run a hybrid query against it
    Search {
        /// JSONL corpus (one document per line)
        corpus: PathBuf,

        /// Search query
        query: String,

        /// Number of results
        #[arg(short, long)]
        top_k: Option<usize>,

        /// Include knowledge-graph context
        #[arg(short, long)]
        graph: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Query the knowledge graph
    Graph {
        /// Query text
        query: String,

        /// Maximum matched entities
        #[arg(short, long)]
        max_nodes: Option<usize>,

        /// Also list related entities
        #[arg(short, long)]
        related: bool,

        /// Related-entity depth (defaults to [graph] max_depth; implies --related)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List paths between two knowledge-graph entities
    Paths {
        /// Source entity id
        source: String,

        /// Target entity id
        target: String,

        /// Maximum paths (defaults to [graph] max_paths)
        #[arg(short = 'n', long)]
        max_paths: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `init` must work without a config file
    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    // Setup logging
    let log_level = config.logging.level.raised_by(cli.verbose).to_tracing();
    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr);
    match config.logging.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }

    match cli.command {
        Commands::Init { path, force } => commands::init::init_config(path, force),
        Commands::Search {
            corpus,
            query,
            top_k,
            graph,
            format,
        } => commands::search::search_corpus(config, corpus, query, top_k, graph, format).await,
        Commands::Graph {
            query,
            max_nodes,
            related,
            depth,
            format,
        } => commands::graph::query_graph(config, query, max_nodes, related, depth, format),
        Commands::Paths {
            source,
            target,
            max_paths,
            format,
        } => commands::graph::find_paths(config, source, target, max_paths, format),
    }
}
