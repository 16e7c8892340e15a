use std::sync::Arc;

use async_trait::async_trait;
use paper_rag::{
    Chunk, ContextUnit, Embedder, Generator, InMemoryVectorStore, RagError, RagService, Retriever,
    VectorIndex,
};
use paper_rag_server::{AppState, app_router, protocol::QueryResponse};
use serde_json::{Value, json};

const DIMS: usize = 256;

struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> paper_rag::Result<Vec<f32>> {
        let mut v = vec![0.0f32; DIMS];
        for word in text.split_whitespace() {
            let hash = word.bytes().fold(7u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            v[(hash % DIMS as u64) as usize] += 1.0;
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }
}

struct FixedGenerator;

#[async_trait]
impl Generator for FixedGenerator {
    async fn generate(&self, _prompt: &str) -> paper_rag::Result<String> {
        Ok("Quadratic attention cost limits context length [1].".to_string())
    }
}

struct DownGenerator;

#[async_trait]
impl Generator for DownGenerator {
    async fn generate(&self, _prompt: &str) -> paper_rag::Result<String> {
        Err(RagError::Generation { provider: "test".into(), message: "model offline".into() })
    }
}

async fn service(generator: Arc<dyn Generator>) -> RagService {
    let index = VectorIndex::new(Arc::new(InMemoryVectorStore::new()), Arc::new(KeywordEmbedder), "papers");
    index.ensure_collection().await.expect("create collection");

    let units = [
        ("2401.1", 0, "attention cost grows quadratically with length"),
        ("2401.1", 2, "we propose a linear kernel"),
        ("2401.2", 0, "protein folding with diffusion"),
    ];
    let chunks = units
        .iter()
        .map(|(doc_id, section_id, content)| {
            let unit = ContextUnit {
                content: content.to_string(),
                doc_id: doc_id.to_string(),
                section_id: *section_id,
                title: format!("Paper {doc_id}"),
            };
            Chunk::from_unit(&unit, 0, unit.content.clone())
        })
        .collect();
    index.upsert(chunks).await.expect("upsert");

    RagService::new(Retriever::new(index), generator)
}

async fn spawn_server(generator: Arc<dyn Generator>) -> (String, tokio::task::JoinHandle<()>) {
    let app = app_router(AppState::new(service(generator).await));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

#[tokio::test]
async fn health_reports_ok() {
    let (base, handle) = spawn_server(Arc::new(FixedGenerator)).await;

    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .expect("health response")
        .json()
        .await
        .expect("health json");
    assert_eq!(body, json!({"status": "ok"}));

    handle.abort();
}

#[tokio::test]
async fn retrieve_returns_ranked_context_with_default_top_k() {
    let (base, handle) = spawn_server(Arc::new(FixedGenerator)).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/retrieve"))
        .json(&json!({"question": "attention cost grows quadratically with length"}))
        .send()
        .await
        .expect("retrieve response");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("retrieve json");
    let context = body["context"].as_array().expect("context array");
    assert_eq!(context.len(), 3);
    assert_eq!(context[0]["doc_id"], "2401.1");
    assert_eq!(context[0]["section_id"], 0);
    assert_eq!(context[0]["title"], "Paper 2401.1");
    assert_eq!(context[0]["text"], "attention cost grows quadratically with length");

    handle.abort();
}

#[tokio::test]
async fn query_returns_answer_and_context() {
    let (base, handle) = spawn_server(Arc::new(FixedGenerator)).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/query"))
        .json(&json!({"question": "we propose a linear kernel", "top_k": 1}))
        .send()
        .await
        .expect("query response");
    assert!(response.status().is_success());

    let body: QueryResponse = response.json().await.expect("query json");
    assert_eq!(body.answer, "Quadratic attention cost limits context length [1].");
    assert_eq!(body.context.len(), 1);
    assert_eq!((body.context[0].doc_id.as_str(), body.context[0].section_id), ("2401.1", 2));

    handle.abort();
}

#[tokio::test]
async fn generation_failure_is_bad_gateway() {
    let (base, handle) = spawn_server(Arc::new(DownGenerator)).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/query"))
        .json(&json!({"question": "anything"}))
        .send()
        .await
        .expect("query response");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);

    let body: Value = response.json().await.expect("error json");
    assert!(body["error"].as_str().unwrap_or_default().contains("model offline"));

    handle.abort();
}

#[tokio::test]
async fn zero_top_k_and_blank_questions_are_bad_requests() {
    let (base, handle) = spawn_server(Arc::new(FixedGenerator)).await;
    let client = reqwest::Client::new();

    for body in [json!({"question": "attention", "top_k": 0}), json!({"question": "   "})] {
        let response = client
            .post(format!("{base}/retrieve"))
            .json(&body)
            .send()
            .await
            .expect("retrieve response");
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    handle.abort();
}
