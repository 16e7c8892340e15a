//! Ingestion pipeline: load → flatten → chunk → embed → store.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::chunking::Chunker;
use crate::corpus::CorpusLoader;
use crate::document::ContextUnit;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// Counts describing one ingestion run.
///
/// Every field reflects what was actually processed, not configured limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionReport {
    /// Paper records successfully read.
    pub papers_processed: usize,
    /// Non-empty sections turned into context units.
    pub sections_loaded: usize,
    /// Chunks embedded and written to the index.
    pub chunks_indexed: usize,
}

/// Orchestrates corpus loading, chunking and indexing.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = IngestionPipeline::new(Arc::new(RecursiveChunker::new(900, 150)), index);
/// let report = pipeline.ingest(&corpus_root, Some(100)).await?;
/// ```
pub struct IngestionPipeline {
    chunker: Arc<dyn Chunker>,
    index: VectorIndex,
}

impl IngestionPipeline {
    /// Create a pipeline writing into `index`.
    pub fn new(chunker: Arc<dyn Chunker>, index: VectorIndex) -> Self {
        Self { chunker, index }
    }

    /// The index this pipeline writes into.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Ingest up to `limit` papers from a resolved corpus root.
    ///
    /// # Errors
    ///
    /// - [`RagError::CorpusNotFound`] if the root holds no paper records
    /// - [`RagError::EmptyCorpus`] if no paper has a non-empty section
    /// - embedding or store errors from the index
    pub async fn ingest(&self, corpus_root: &Path, limit: Option<usize>) -> Result<IngestionReport> {
        let loader = CorpusLoader::new(corpus_root);
        let (papers_processed, units) = loader.load_context_units(limit)?;
        if units.is_empty() {
            error!(root = %corpus_root.display(), papers_processed, "no documents loaded from corpus");
            return Err(RagError::EmptyCorpus { papers: papers_processed });
        }

        let mut report = self.ingest_units(&units).await?;
        report.papers_processed = papers_processed;

        info!(
            papers_processed = report.papers_processed,
            sections_loaded = report.sections_loaded,
            chunks_indexed = report.chunks_indexed,
            collection = %self.index.collection(),
            "ingestion complete"
        );
        Ok(report)
    }

    /// Chunk and index context units the caller already holds.
    ///
    /// The returned report has `papers_processed` set to the number of distinct
    /// `doc_id`s among `units`.
    pub async fn ingest_units(&self, units: &[ContextUnit]) -> Result<IngestionReport> {
        if units.is_empty() {
            return Err(RagError::EmptyCorpus { papers: 0 });
        }

        self.index.ensure_collection().await?;
        let chunks = self.chunker.chunk_units(units);
        let chunks_indexed = self.index.upsert(chunks).await?;

        let mut doc_ids: Vec<&str> = units.iter().map(|u| u.doc_id.as_str()).collect();
        doc_ids.sort_unstable();
        doc_ids.dedup();

        Ok(IngestionReport {
            papers_processed: doc_ids.len(),
            sections_loaded: units.len(),
            chunks_indexed,
        })
    }
}
