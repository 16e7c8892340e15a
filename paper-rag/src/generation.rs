//! Generator trait for turning a prompt into answer text.

use async_trait::async_trait;

use crate::error::Result;

/// A language model that completes a prompt.
///
/// Generation is treated as nondeterministic and potentially slow. Nothing in
/// this crate retries a failed call; implementations report failures as
/// [`RagError::Generation`](crate::RagError::Generation).
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce the raw answer text for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
