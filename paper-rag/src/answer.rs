//! Answer assembly: retrieve → prompt → generate.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::document::ContextItem;
use crate::error::{RagError, Result};
use crate::generation::Generator;
use crate::prompt::build_prompt;
use crate::retriever::Retriever;

/// A generated answer plus exactly the context the generator was shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// The generator's text, returned as-is.
    pub answer: String,
    /// Context blocks in prompt order; block `[i]` is `context[i - 1]`.
    pub context: Vec<ContextItem>,
}

/// Question answering over a [`Retriever`] and a [`Generator`].
///
/// # Example
///
/// ```rust,ignore
/// let service = RagService::new(Retriever::new(index), Arc::new(generator));
/// let answer = service.answer("What problem does the paper address?", 5).await?;
/// for (i, item) in answer.context.iter().enumerate() {
///     println!("[{}] {} §{}", i + 1, item.doc_id, item.section_id);
/// }
/// ```
#[derive(Clone)]
pub struct RagService {
    retriever: Retriever,
    generator: Arc<dyn Generator>,
}

impl RagService {
    /// Create a service from its collaborators.
    pub fn new(retriever: Retriever, generator: Arc<dyn Generator>) -> Self {
        Self { retriever, generator }
    }

    /// The retriever backing this service.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Retrieve context without generating, as plain context items.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<ContextItem>> {
        let units = self.retriever.retrieve(question, top_k).await?;
        Ok(units.into_iter().map(ContextItem::from).collect())
    }

    /// Answer `question` from the `top_k` nearest context units.
    ///
    /// # Errors
    ///
    /// Retrieval errors propagate unchanged; a generator failure surfaces as
    /// [`RagError::Generation`]. Nothing is retried.
    pub async fn answer(&self, question: &str, top_k: usize) -> Result<Answer> {
        let context = self.retrieve(question, top_k).await?;
        let prompt = build_prompt(question, &context);

        let answer = self.generator.generate(&prompt).await.map_err(|e| {
            error!(error = %e, "generation failed");
            match e {
                RagError::Generation { .. } => e,
                other => RagError::Generation {
                    provider: "generator".to_string(),
                    message: other.to_string(),
                },
            }
        })?;

        info!(context_count = context.len(), answer_len = answer.len(), "answer generated");
        Ok(Answer { answer, context })
    }
}
