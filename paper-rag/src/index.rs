//! The vector index: a [`VectorStore`] collection bound to an [`Embedder`].
//!
//! This is the capability the rest of the pipeline talks to. It hides the
//! embedding step on both sides: [`VectorIndex::upsert`] embeds chunk content
//! before persisting, and [`VectorIndex::search`] embeds the query text before
//! the nearest-neighbour lookup.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::document::{Chunk, SearchResult};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Number of chunk texts sent to the embedder per call during upsert.
pub const EMBED_BATCH_SIZE: usize = 64;

/// A named collection in a vector store, with the embedder used to fill and query it.
#[derive(Clone)]
pub struct VectorIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
}

impl VectorIndex {
    /// Bind `collection` in `store` to `embedder`.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        collection: impl Into<String>,
    ) -> Self {
        Self { store, embedder, collection: collection.into() }
    }

    /// The collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// The embedder used for chunks and queries.
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Create the collection if it does not exist yet.
    pub async fn ensure_collection(&self) -> Result<()> {
        self.store.create_collection(&self.collection, self.embedder.dimensions()).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "failed to create collection");
            e
        })
    }

    /// Drop every entry and recreate the collection empty.
    pub async fn reset(&self) -> Result<()> {
        self.store.delete_collection(&self.collection).await?;
        self.ensure_collection().await?;
        info!(collection = %self.collection, "reset collection");
        Ok(())
    }

    /// Number of entries in the collection.
    pub async fn len(&self) -> Result<usize> {
        self.store.count(&self.collection).await
    }

    /// Whether the collection holds no entries.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Embed each chunk's content and persist the chunks.
    ///
    /// Chunks sharing an id within one call collapse to the last of them, since
    /// the store would keep only that one. Returns the number of distinct
    /// entries written. An empty input is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the embedder fails or returns the wrong
    /// number of vectors, or the store's error if persisting fails.
    pub async fn upsert(&self, mut chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let submitted = chunks.len();
        let mut seen = HashSet::new();
        chunks.reverse();
        chunks.retain(|chunk| seen.insert(chunk.id.clone()));
        chunks.reverse();
        if chunks.len() < submitted {
            warn!(
                collection = %self.collection,
                replaced = submitted - chunks.len(),
                "chunks share ids; later chunks replace earlier ones"
            );
        }

        for batch in chunks.chunks_mut(EMBED_BATCH_SIZE) {
            let texts: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
                error!(collection = %self.collection, error = %e, "embedding failed during upsert");
                e
            })?;

            if embeddings.len() != batch.len() {
                return Err(RagError::Embedding {
                    provider: "index".to_string(),
                    message: format!(
                        "expected {} embeddings, embedder returned {}",
                        batch.len(),
                        embeddings.len()
                    ),
                });
            }

            for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
                chunk.embedding = embedding;
            }
            debug!(collection = %self.collection, batch_size = batch.len(), "embedded batch");
        }

        self.store.upsert(&self.collection, &chunks).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "upsert failed");
            e
        })?;

        Ok(chunks.len())
    }

    /// Embed `query` and return the `k` nearest entries, nearest first.
    ///
    /// A collection that is empty or was never created yields no results.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        self.ensure_collection().await?;
        if self.is_empty().await? {
            debug!(collection = %self.collection, "search on empty collection");
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during search");
            e
        })?;

        let results = self.store.search(&self.collection, &embedding, k).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "vector store search failed");
            e
        })?;

        debug!(collection = %self.collection, result_count = results.len(), "search completed");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ContextUnit;
    use crate::inmemory::InMemoryVectorStore;
    use crate::test_support::{KeywordEmbedder, unit};

    fn fresh_index(collection: &str) -> VectorIndex {
        VectorIndex::new(Arc::new(InMemoryVectorStore::new()), Arc::new(KeywordEmbedder), collection)
    }

    fn chunk_of(unit: &ContextUnit) -> Chunk {
        Chunk::from_unit(unit, 0, unit.content.clone())
    }

    #[tokio::test]
    async fn colliding_ids_count_once_and_last_wins() {
        let index = fresh_index("papers");
        index.ensure_collection().await.unwrap();

        let earlier = chunk_of(&unit("X", 0, "earlier record text"));
        let later = chunk_of(&unit("X", 0, "later record text"));
        let written = index.upsert(vec![earlier, later]).await.unwrap();

        assert_eq!(written, 1);
        assert_eq!(index.len().await.unwrap(), 1);
        let results = index.search("later record text", 5).await.unwrap();
        assert_eq!(results[0].chunk.content, "later record text");
    }

    #[tokio::test]
    async fn searching_a_collection_never_created_is_empty() {
        let index = fresh_index("never");
        assert!(index.search("anything", 5).await.unwrap().is_empty());
        assert!(index.is_empty().await.unwrap());
    }
}
