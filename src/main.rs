use clap::{Parser, Subcommand};
use curriculum_rag::Result;
use curriculum_rag::commands::{ask, clear_index, ingest, show_status};
use curriculum_rag::config::{run_interactive_config, show_config};
use curriculum_rag::retriever::DEFAULT_TOP_K;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "curriculum-rag")]
#[command(about = "Subject-scoped retrieval over curriculum textbooks with admission gating")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding service, classifier, and admission gate
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Build the index from curriculum documents
    Ingest {
        /// Document files or directories to index. Filenames follow the
        /// <subject>_<name> convention unless --subject is given.
        paths: Vec<PathBuf>,
        /// Subject label applied to every listed document
        #[arg(long)]
        subject: Option<String>,
    },
    /// Ask a question and print the retrieved curriculum context
    Ask {
        /// The question to answer
        question: String,
        /// Curriculum subject the question belongs to
        #[arg(long)]
        subject: String,
        /// Number of context chunks to retrieve
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        limit: usize,
    },
    /// Delete the persisted index
    Clear,
    /// Show connectivity and index health
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Ingest { paths, subject } => {
            ingest(paths, subject).await?;
        }
        Commands::Ask {
            question,
            subject,
            limit,
        } => {
            ask(question, subject, limit).await?;
        }
        Commands::Clear => {
            clear_index().await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}
