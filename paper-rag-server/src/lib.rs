//! `paper-rag-server` exposes retrieval and citation-grounded answering over HTTP.
//!
//! Routes: `GET /health`, `POST /retrieve`, `POST /query`.

pub mod protocol;
pub mod server;

pub use server::{AppState, ServerConfig, app_router, run_server};
