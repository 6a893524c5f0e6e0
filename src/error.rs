//! Error types for quill

use std::io;

use crate::DocId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Analyzer error: {0}")]
    Analyzer(String),

    #[error("Malformed libsvm line: {0}")]
    Libsvm(String),

    #[error("Invalid document id: {0}")]
    InvalidDocId(DocId),

    #[error("Index corruption: {0}")]
    Corruption(String),

    #[error("Indexing worker panicked")]
    WorkerPanic,
}

pub type Result<T> = std::result::Result<T, Error>;
