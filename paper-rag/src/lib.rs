//! # paper-rag
//!
//! Citation-grounded question answering over a corpus of academic papers.
//!
//! Papers are normalised into per-section [`ContextUnit`]s, split into
//! overlapping [`Chunk`]s, embedded and stored in a [`VectorIndex`]. At query
//! time a [`Retriever`] finds the nearest chunks, [`build_prompt`] numbers them
//! as citable blocks, and a [`Generator`] writes the answer. The [`Evaluator`]
//! measures Hit@k of the retriever against gold relevance judgments.
//!
//! The embedding model, the language model and the vector store are
//! collaborators behind the [`Embedder`], [`Generator`] and [`VectorStore`]
//! traits. [`InMemoryVectorStore`] is always available; Ollama clients are
//! behind the `ollama` feature.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use paper_rag::*;
//!
//! let index = VectorIndex::new(Arc::new(InMemoryVectorStore::new()), embedder, "papers");
//! let ingestion = IngestionPipeline::new(Arc::new(RecursiveChunker::new(900, 150)), index.clone());
//! let report = ingestion.ingest(&corpus_root, Some(100)).await?;
//!
//! let service = RagService::new(Retriever::new(index), generator);
//! let answer = service.answer("What problem does the paper address?", 5).await?;
//! ```

pub mod answer;
pub mod chunking;
pub mod config;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod error;
pub mod eval;
pub mod generation;
pub mod index;
pub mod ingest;
pub mod inmemory;
pub mod prompt;
pub mod retriever;
pub mod vectorstore;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(test)]
pub(crate) mod test_support;

pub use answer::{Answer, RagService};
pub use chunking::{Chunker, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use corpus::{CorpusLoader, default_root_candidates, resolve_corpus_root};
pub use document::{Chunk, ContextItem, ContextUnit, Paper, SearchResult, Section};
pub use embedding::Embedder;
pub use error::{RagError, Result};
pub use eval::{Evaluator, HitRateReport, Judgments, QueryRecord, RelevanceJudgment, load_eval_inputs};
pub use generation::Generator;
pub use index::VectorIndex;
pub use ingest::{IngestionPipeline, IngestionReport};
pub use inmemory::InMemoryVectorStore;
pub use prompt::{FALLBACK_ANSWER, build_prompt};
pub use retriever::Retriever;
pub use vectorstore::VectorStore;
