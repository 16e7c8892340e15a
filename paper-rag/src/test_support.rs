//! Deterministic collaborators for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::document::{Chunk, ContextUnit};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::generation::Generator;
use crate::index::VectorIndex;
use crate::inmemory::InMemoryVectorStore;

pub const DIMS: usize = 1024;

/// Bag-of-words embedder: each lowercase word bumps one hashed dimension.
pub struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
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

/// Returns a fixed answer and records every prompt it receives.
#[derive(Default)]
pub struct RecordingGenerator {
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("The paper addresses slow attention [1].".to_string())
    }
}

/// Always fails with a non-generation error, to check error mapping.
pub struct BrokenGenerator;

#[async_trait]
impl Generator for BrokenGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(RagError::VectorStore { backend: "test".into(), message: "boom".into() })
    }
}

pub fn unit(doc_id: &str, section_id: usize, content: &str) -> ContextUnit {
    ContextUnit {
        content: content.to_string(),
        doc_id: doc_id.to_string(),
        section_id,
        title: format!("Title of {doc_id}"),
    }
}

/// An in-memory index holding one chunk per given unit.
pub async fn index_with(units: &[ContextUnit]) -> VectorIndex {
    let index = VectorIndex::new(Arc::new(InMemoryVectorStore::new()), Arc::new(KeywordEmbedder), "test");
    index.ensure_collection().await.unwrap();
    let chunks = units.iter().map(|u| Chunk::from_unit(u, 0, u.content.clone())).collect();
    index.upsert(chunks).await.unwrap();
    index
}
