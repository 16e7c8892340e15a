//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by
//! insertion-ordered vectors protected by a `tokio::sync::RwLock`. Its contents
//! can be written to and restored from a JSON snapshot so an index built by one
//! process can be served by another.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "InMemory";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    dimensions: usize,
    chunks: Vec<Chunk>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl Collection {
    fn new(dimensions: usize) -> Self {
        Self { dimensions, ..Self::default() }
    }

    fn reindex(&mut self) {
        self.positions =
            self.chunks.iter().enumerate().map(|(i, chunk)| (chunk.id.clone(), i)).collect();
    }
}

/// An in-memory vector store using cosine similarity for search.
///
/// Chunks are kept in insertion order per collection; upserting an existing id
/// replaces the stored chunk in its original slot.
///
/// # Example
///
/// ```rust,ignore
/// use paper_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("papers", 384).await?;
/// store.save("db/papers.json").await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

fn missing_collection(collection: &str) -> RagError {
    RagError::VectorStore {
        backend: BACKEND.to_string(),
        message: format!("collection '{collection}' does not exist"),
    }
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from a snapshot written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the file cannot be read and [`RagError::Json`]
    /// if it is not a valid snapshot.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| RagError::Io { path: path.to_path_buf(), source })?;
        let mut collections: HashMap<String, Collection> = serde_json::from_slice(&bytes)
            .map_err(|source| RagError::Json { path: path.to_path_buf(), source })?;
        for collection in collections.values_mut() {
            collection.reindex();
        }

        info!(path = %path.display(), collection_count = collections.len(), "loaded vector store snapshot");
        Ok(Self { collections: RwLock::new(collections) })
    }

    /// Write every collection to a JSON snapshot, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the snapshot cannot be written.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let io_err = |source| RagError::Io { path: path.to_path_buf(), source };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let collections = self.collections.read().await;
        let bytes = serde_json::to_vec(&*collections)
            .map_err(|source| RagError::Json { path: path.to_path_buf(), source })?;
        tokio::fs::write(path, bytes).await.map_err(io_err)?;

        debug!(path = %path.display(), "saved vector store snapshot");
        Ok(())
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_insert_with(|| Collection::new(dimensions));
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing_collection(collection))?;

        if let Some(bad) = chunks
            .iter()
            .find(|c| store.dimensions > 0 && c.embedding.len() != store.dimensions)
        {
            return Err(RagError::VectorStore {
                backend: BACKEND.to_string(),
                message: format!(
                    "chunk '{}' has {} dimensions, collection '{collection}' expects {}",
                    bad.id,
                    bad.embedding.len(),
                    store.dimensions
                ),
            });
        }

        for chunk in chunks {
            match store.positions.get(&chunk.id) {
                Some(&slot) => store.chunks[slot] = chunk.clone(),
                None => {
                    store.positions.insert(chunk.id.clone(), store.chunks.len());
                    store.chunks.push(chunk.clone());
                }
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing_collection(collection))?;

        let mut scored: Vec<SearchResult> = store
            .chunks
            .iter()
            .map(|chunk| {
                let score = cosine_similarity(&chunk.embedding, embedding);
                SearchResult { chunk: chunk.clone(), score }
            })
            .collect();

        // `sort_by` is stable, so equal scores stay in insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|store| store.chunks.len())
            .ok_or_else(|| missing_collection(collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            content: format!("content of {id}"),
            doc_id: "doc".to_string(),
            section_id: 0,
            title: String::new(),
            chunk_index: 0,
            embedding,
        }
    }

    #[test]
    fn cosine_of_orthogonal_and_zero_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn ties_resolve_by_insertion_order() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        store
            .upsert(
                "c",
                &[chunk("z", vec![1.0, 0.0]), chunk("a", vec![1.0, 0.0]), chunk("m", vec![0.0, 1.0])],
            )
            .await
            .unwrap();

        let results = store.search("c", &[1.0, 0.0], 3).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, ["z", "a", "m"]);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_ids_in_place() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        store.upsert("c", &[chunk("a", vec![1.0, 0.0]), chunk("b", vec![1.0, 0.0])]).await.unwrap();
        store.upsert("c", &[chunk("a", vec![1.0, 0.0])]).await.unwrap();

        assert_eq!(store.count("c").await.unwrap(), 2);
        let results = store.search("c", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results[0].chunk.id, "a");
    }

    #[tokio::test]
    async fn empty_upsert_and_empty_search() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        store.upsert("c", &[]).await.unwrap();
        assert!(store.search("c", &[1.0, 0.0], 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_wrong_dimensions_and_unknown_collections() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 3).await.unwrap();
        assert!(store.upsert("c", &[chunk("a", vec![1.0])]).await.is_err());
        assert!(store.search("missing", &[1.0], 1).await.is_err());
    }

    #[tokio::test]
    async fn snapshot_round_trip_preserves_order_and_replacement() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested/index.json");

        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        store.upsert("c", &[chunk("a", vec![1.0, 0.0]), chunk("b", vec![1.0, 0.0])]).await.unwrap();
        store.save(&path).await.unwrap();

        let restored = InMemoryVectorStore::load(&path).await.unwrap();
        restored.upsert("c", &[chunk("b", vec![1.0, 0.0])]).await.unwrap();
        assert_eq!(restored.count("c").await.unwrap(), 2);
        let results = restored.search("c", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results[0].chunk.id, "a");
    }
}
