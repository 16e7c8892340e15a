//! Request and response bodies for the HTTP routes.

use paper_rag::ContextItem;
use paper_rag::config::DEFAULT_TOP_K;
use serde::{Deserialize, Serialize};

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// Body of `POST /retrieve` and `POST /query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveResponse {
    pub context: Vec<ContextItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub context: Vec<ContextItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
