//! Shared deterministic collaborators for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use paper_rag::{Embedder, Generator, InMemoryVectorStore, VectorIndex};
use serde_json::Value;

pub const DIMS: usize = 1024;

/// Bag-of-words embedder: each lowercase word bumps one hashed dimension.
pub struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> paper_rag::Result<Vec<f32>> {
        let mut v = vec![0.0f32; DIMS];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf29ce484222325u64, |acc, b| (acc ^ b as u64).wrapping_mul(0x100000001b3));
            v[(hash % DIMS as u64) as usize] += 1.0;
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }
}

/// Echoes the number of context blocks it was shown.
pub struct CountingGenerator;

#[async_trait]
impl Generator for CountingGenerator {
    async fn generate(&self, prompt: &str) -> paper_rag::Result<String> {
        let blocks = prompt.matches("(Doc: ").count();
        Ok(format!("Answer grounded in {blocks} blocks [1]."))
    }
}

pub fn memory_index(collection: &str) -> VectorIndex {
    VectorIndex::new(Arc::new(InMemoryVectorStore::new()), Arc::new(KeywordEmbedder), collection)
}

/// Write one paper record per `(file_stem, record)` under `<root>/corpus/`.
pub fn write_corpus(root: &Path, papers: &[(&str, Value)]) {
    let corpus = root.join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    for (stem, record) in papers {
        fs::write(corpus.join(format!("{stem}.json")), record.to_string()).unwrap();
    }
}
