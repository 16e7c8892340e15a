//! Environment-driven settings.
//!
//! Every option is read from a `PAPER_RAG_*` variable (a `.env` file in the
//! working directory is loaded first, when present). Unset or unparseable
//! values fall back to the defaults below.

use std::path::PathBuf;
use std::str::FromStr;

use paper_rag::config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_TOP_K};
use paper_rag::{RagConfig, Result};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub raw_data_dir: PathBuf,
    pub index_path: PathBuf,
    pub collection: String,
    pub ollama_host: String,
    pub ollama_model: String,
    pub embed_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    /// Papers read by a default `ingest`; `None` reads the whole corpus.
    pub doc_limit: Option<usize>,
    pub host: String,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            raw_data_dir: PathBuf::from("data/open_ragbench_raw"),
            index_path: PathBuf::from("db/open_ragbench_arxiv.json"),
            collection: "open_ragbench_arxiv".to_string(),
            ollama_host: "http://localhost:11434".to_string(),
            ollama_model: "llama3.2:3b".to_string(),
            embed_model: "all-minilm".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            doc_limit: Some(100),
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Settings {
    /// Load settings from the process environment, after reading `.env` if present.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!(error = %e, "failed to read .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str, default: String| lookup(key).filter(|v| !v.is_empty()).unwrap_or(default);

        let doc_limit = match parsed::<usize>(&lookup, "PAPER_RAG_DOC_LIMIT") {
            Some(0) => None,
            Some(n) => Some(n),
            None => defaults.doc_limit,
        };

        Self {
            raw_data_dir: PathBuf::from(text(
                "PAPER_RAG_RAW_DATA_DIR",
                defaults.raw_data_dir.display().to_string(),
            )),
            index_path: PathBuf::from(text(
                "PAPER_RAG_INDEX_PATH",
                defaults.index_path.display().to_string(),
            )),
            collection: text("PAPER_RAG_COLLECTION", defaults.collection),
            ollama_host: text("PAPER_RAG_OLLAMA_HOST", defaults.ollama_host),
            ollama_model: text("PAPER_RAG_OLLAMA_MODEL", defaults.ollama_model),
            embed_model: text("PAPER_RAG_EMBED_MODEL", defaults.embed_model),
            chunk_size: parsed(&lookup, "PAPER_RAG_CHUNK_SIZE").unwrap_or(defaults.chunk_size),
            chunk_overlap: parsed(&lookup, "PAPER_RAG_CHUNK_OVERLAP").unwrap_or(defaults.chunk_overlap),
            top_k: parsed(&lookup, "PAPER_RAG_TOP_K").unwrap_or(defaults.top_k),
            doc_limit,
            host: text("PAPER_RAG_HOST", defaults.host),
            port: parsed(&lookup, "PAPER_RAG_PORT").unwrap_or(defaults.port),
        }
    }

    /// The validated chunking/retrieval configuration.
    pub fn rag_config(&self) -> Result<RagConfig> {
        RagConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.top_k)
            .build()
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}
