//! Query-time retrieval over the vector index.

use tracing::info;

use crate::config::DEFAULT_TOP_K;
use crate::document::{ContextUnit, SearchResult};
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// Embeds a question and returns the nearest context units.
///
/// Results are not deduplicated by `(doc_id, section_id)`: several chunks of
/// one section may each occupy a slot.
#[derive(Clone)]
pub struct Retriever {
    index: VectorIndex,
}

impl Retriever {
    /// Create a retriever over `index`.
    pub fn new(index: VectorIndex) -> Self {
        Self { index }
    }

    /// The index searched by this retriever.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Return up to `top_k` context units ranked nearest-first.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if `top_k == 0`, otherwise any
    /// embedding or search error from the index.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<ContextUnit>> {
        let results = self.retrieve_scored(question, top_k).await?;
        Ok(results.iter().map(|r| r.chunk.to_context_unit()).collect())
    }

    /// Like [`retrieve`](Self::retrieve) with the default `top_k`.
    pub async fn retrieve_default(&self, question: &str) -> Result<Vec<ContextUnit>> {
        self.retrieve(question, DEFAULT_TOP_K).await
    }

    /// Return the raw search results, including similarity scores.
    pub async fn retrieve_scored(&self, question: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(RagError::config("top_k must be greater than zero"));
        }

        let results = self.index.search(question, top_k).await?;
        info!(top_k, result_count = results.len(), "retrieval completed");
        Ok(results)
    }
}
