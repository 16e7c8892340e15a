//! Subcommand implementations.

use std::sync::Arc;

use anyhow::{Context, bail};
use paper_rag::ollama::{OllamaEmbedder, OllamaGenerator};
use paper_rag::{
    Evaluator, InMemoryVectorStore, IngestionPipeline, RagService, RecursiveChunker, Retriever,
    VectorIndex, default_root_candidates, load_eval_inputs, resolve_corpus_root,
};
use paper_rag_server::{AppState, ServerConfig, run_server};
use tracing::info;

use crate::settings::Settings;

/// Build an index over the persisted snapshot, if one exists.
async fn open_store(settings: &Settings, fresh: bool) -> anyhow::Result<Arc<InMemoryVectorStore>> {
    if !fresh && settings.index_path.exists() {
        let store = InMemoryVectorStore::load(&settings.index_path).await?;
        return Ok(Arc::new(store));
    }
    Ok(Arc::new(InMemoryVectorStore::new()))
}

fn vector_index(settings: &Settings, store: Arc<InMemoryVectorStore>) -> VectorIndex {
    let embedder = OllamaEmbedder::new(&settings.ollama_host, &settings.embed_model);
    VectorIndex::new(store, Arc::new(embedder), &settings.collection)
}

/// Open the persisted index for querying, failing if nothing was ingested.
async fn existing_index(settings: &Settings) -> anyhow::Result<VectorIndex> {
    if !settings.index_path.exists() {
        bail!(
            "no index at {}; run `paper-rag ingest` first",
            settings.index_path.display()
        );
    }
    let index = vector_index(settings, open_store(settings, false).await?);
    index.ensure_collection().await?;
    Ok(index)
}

fn rag_service(settings: &Settings, index: VectorIndex) -> RagService {
    let generator = OllamaGenerator::new(&settings.ollama_host, &settings.ollama_model);
    RagService::new(Retriever::new(index), Arc::new(generator))
}

pub async fn ingest(settings: &Settings, limit: Option<usize>, fresh: bool) -> anyhow::Result<()> {
    let config = settings.rag_config()?;
    let root = resolve_corpus_root(&default_root_candidates(&settings.raw_data_dir))?;
    info!(root = %root.display(), ?limit, fresh, "starting ingestion");

    let store = open_store(settings, fresh).await?;
    let index = vector_index(settings, Arc::clone(&store));
    if fresh {
        index.reset().await?;
    }

    let chunker = RecursiveChunker::new(config.chunk_size, config.chunk_overlap);
    let report = IngestionPipeline::new(Arc::new(chunker), index).ingest(&root, limit).await?;

    store
        .save(&settings.index_path)
        .await
        .with_context(|| format!("saving index to {}", settings.index_path.display()))?;

    println!("Ingestion complete.");
    println!("Papers processed: {}", report.papers_processed);
    println!("Sections loaded: {}", report.sections_loaded);
    println!("Chunks indexed: {}", report.chunks_indexed);
    println!("Index saved to {}", settings.index_path.display());
    Ok(())
}

pub async fn eval(settings: &Settings, num_eval: usize, k: usize) -> anyhow::Result<()> {
    let root = resolve_corpus_root(&default_root_candidates(&settings.raw_data_dir))?;
    let (queries, judgments) = load_eval_inputs(&root)?;
    info!(queries = queries.len(), judgments = judgments.len(), "loaded evaluation inputs");

    let evaluator = Evaluator::new(Retriever::new(existing_index(settings).await?));
    let report = evaluator.evaluate(&queries, &judgments, k, num_eval).await?;
    println!("{report}");
    Ok(())
}

pub async fn ask(settings: &Settings, question: &str, top_k: usize) -> anyhow::Result<()> {
    let service = rag_service(settings, existing_index(settings).await?);
    let answer = service.answer(question, top_k).await?;

    println!("{}", answer.answer);
    if !answer.context.is_empty() {
        println!();
        for (i, item) in answer.context.iter().enumerate() {
            println!("[{}] {} (section {}) {}", i + 1, item.doc_id, item.section_id, item.title);
        }
    }
    Ok(())
}

pub async fn serve(settings: &Settings, host: String, port: u16) -> anyhow::Result<()> {
    let service = rag_service(settings, existing_index(settings).await?);
    run_server(ServerConfig { host, port }, AppState::new(service)).await
}
