use thiserror::Error;

pub type Result<T> = std::result::Result<T, CurriculumError>;

#[derive(Error, Debug)]
pub enum CurriculumError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Index has not been built")]
    NotInitialized,

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod gate;
pub mod index;
pub mod indexer;
pub mod pipeline;
pub mod retriever;
