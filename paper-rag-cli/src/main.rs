//! paper-rag CLI: build the index, measure retrieval, ask questions, serve HTTP.

mod commands;
mod settings;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// Citation-grounded question answering over academic papers
#[derive(Parser, Debug)]
#[command(name = "paper-rag", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chunk, embed and index the paper corpus
    Ingest {
        /// Maximum number of papers to read (0 reads all)
        #[arg(long)]
        limit: Option<usize>,

        /// Drop the existing collection before indexing
        #[arg(long)]
        fresh: bool,
    },
    /// Measure Hit@k of retrieval against the gold judgments
    Eval {
        /// Maximum number of judged queries to evaluate
        #[arg(long, default_value_t = 100)]
        num_eval: usize,

        /// Number of context units retrieved per query
        #[arg(long, default_value_t = 5)]
        k: usize,
    },
    /// Answer a single question and print its citations
    Ask {
        question: String,

        /// Number of context units shown to the model
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Serve the /health, /retrieve and /query endpoints
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    match cli.command {
        Commands::Ingest { limit, fresh } => {
            let limit = match limit {
                Some(0) => None,
                Some(n) => Some(n),
                None => settings.doc_limit,
            };
            commands::ingest(&settings, limit, fresh).await
        }
        Commands::Eval { num_eval, k } => commands::eval(&settings, num_eval, k).await,
        Commands::Ask { question, top_k } => {
            let top_k = top_k.unwrap_or(settings.top_k);
            commands::ask(&settings, &question, top_k).await
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| settings.host.clone());
            let port = port.unwrap_or(settings.port);
            commands::serve(&settings, host, port).await
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_eval_defaults() {
        let cli = Cli::try_parse_from(["paper-rag", "eval"]).unwrap();
        assert!(matches!(cli.command, Commands::Eval { num_eval: 100, k: 5 }));
    }

    #[test]
    fn parses_ingest_flags() {
        let cli = Cli::try_parse_from(["paper-rag", "ingest", "--limit", "10", "--fresh"]).unwrap();
        assert!(matches!(cli.command, Commands::Ingest { limit: Some(10), fresh: true }));
    }
}
