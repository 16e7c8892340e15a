//! Error types for the `paper-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while ingesting, retrieving, answering or evaluating.
#[derive(Debug, Error)]
pub enum RagError {
    /// A configuration problem: an unresolvable corpus root or invalid parameters.
    ///
    /// `checked` lists every path that was tried, when the error comes from path
    /// resolution.
    #[error("Configuration error: {message}")]
    Configuration {
        /// A description of the problem.
        message: String,
        /// Paths that were checked before giving up.
        checked: Vec<PathBuf>,
    },

    /// The corpus root exists but holds no per-paper records.
    #[error("Corpus not found at {}", path.display())]
    CorpusNotFound {
        /// The directory that was expected to contain records.
        path: PathBuf,
    },

    /// Papers were read but none of them produced a retrievable section.
    #[error("No documents loaded from corpus ({papers} papers read)")]
    EmptyCorpus {
        /// Number of paper records that were read.
        papers: usize,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation function failed or returned an error.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The generator that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A file could not be read or written.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A file did not contain valid JSON of the expected shape.
    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl RagError {
    /// Shorthand for a parameter-validation [`RagError::Configuration`] error.
    pub fn config(message: impl Into<String>) -> Self {
        RagError::Configuration { message: message.into(), checked: Vec::new() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
