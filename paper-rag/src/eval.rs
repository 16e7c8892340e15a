//! Retrieval evaluation: Hit@k against gold relevance judgments.
//!
//! Query and judgment files come in several shapes, so records are read as
//! loose JSON and each logical field is resolved through an ordered list of
//! accepted names; the first name present with a non-null value wins.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{RagError, Result};
use crate::retriever::Retriever;

/// Accepted names for a query's id.
pub const QUERY_ID_FIELDS: &[&str] = &["query_id", "qid", "id", "uuid"];
/// Accepted names for a query's question text.
pub const QUERY_TEXT_FIELDS: &[&str] = &["text", "query", "question"];
/// Accepted names for the relevant document in a self-identifying judgment.
pub const JUDGMENT_DOC_FIELDS: &[&str] = &["doc_id", "document_id", "corpus_id", "doc"];
/// Accepted names for the relevant document in a judgment keyed by query id.
pub const KEYED_JUDGMENT_DOC_FIELDS: &[&str] = &["doc_id", "id", "document_id", "corpus_id"];
/// Accepted names for the relevant section.
pub const SECTION_FIELDS: &[&str] = &["section_id", "sec_id", "section", "passage_id"];

/// File name of the query set under the corpus root.
pub const QUERIES_FILE: &str = "queries.json";
/// File name of the relevance judgments under the corpus root.
pub const QRELS_FILE: &str = "qrels.json";

/// One evaluation question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// Identifier matched against the judgments.
    pub query_id: String,
    /// The question sent to the retriever.
    pub text: String,
}

/// The gold `(doc_id, section_id)` for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceJudgment {
    /// The judged query.
    pub query_id: String,
    /// Paper holding the relevant section.
    pub doc_id: String,
    /// Position of the relevant section within that paper.
    pub section_id: usize,
}

/// Judgments keyed by query id, at most one per query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Judgments {
    by_query: HashMap<String, RelevanceJudgment>,
}

impl Judgments {
    /// Normalise a parsed qrels document.
    ///
    /// Two shapes are understood: an object mapping query id to one judgment
    /// (or a list of them, of which the first is used), and a flat list of
    /// judgments that each name their query id. Within the flat list the first
    /// judgment for a query wins. Any other shape yields an empty set.
    pub fn from_value(value: &Value) -> Self {
        let mut by_query = HashMap::new();

        match value {
            Value::Object(entries) => {
                for (query_id, rel) in entries {
                    let rel = match rel {
                        Value::Array(items) => items.first(),
                        other => Some(other),
                    };
                    let Some(record) = rel.and_then(Value::as_object) else { continue };
                    let Some(doc_id) = pick_first(record, KEYED_JUDGMENT_DOC_FIELDS).and_then(as_id) else {
                        continue;
                    };
                    let section_id = match pick_first(record, SECTION_FIELDS) {
                        None => 0,
                        Some(v) => match as_section(v) {
                            Some(section_id) => section_id,
                            None => continue,
                        },
                    };
                    by_query.insert(
                        query_id.clone(),
                        RelevanceJudgment { query_id: query_id.clone(), doc_id, section_id },
                    );
                }
            }
            Value::Array(items) => {
                for record in items.iter().filter_map(Value::as_object) {
                    let query_id = pick_first(record, QUERY_ID_FIELDS).and_then(as_id);
                    let doc_id = pick_first(record, JUDGMENT_DOC_FIELDS).and_then(as_id);
                    let section_id = pick_first(record, SECTION_FIELDS).and_then(as_section);
                    let (Some(query_id), Some(doc_id), Some(section_id)) = (query_id, doc_id, section_id)
                    else {
                        continue;
                    };
                    by_query
                        .entry(query_id.clone())
                        .or_insert(RelevanceJudgment { query_id, doc_id, section_id });
                }
            }
            _ => warn!("unrecognised qrels shape, using an empty judgment set"),
        }

        Self { by_query }
    }

    /// The judgment for `query_id`, if any.
    pub fn get(&self, query_id: &str) -> Option<&RelevanceJudgment> {
        self.by_query.get(query_id)
    }

    pub fn len(&self) -> usize {
        self.by_query.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_query.is_empty()
    }
}

impl FromIterator<RelevanceJudgment> for Judgments {
    fn from_iter<I: IntoIterator<Item = RelevanceJudgment>>(iter: I) -> Self {
        let mut by_query = HashMap::new();
        for judgment in iter {
            by_query.entry(judgment.query_id.clone()).or_insert(judgment);
        }
        Self { by_query }
    }
}

/// Resolve the first accepted field present in `record` with a non-null value.
pub fn pick_first<'a>(record: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a Value> {
    fields.iter().find_map(|field| record.get(*field).filter(|v| !v.is_null()))
}

fn as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Question text; numbers are accepted and stringified.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Section ids may be integers, whole-number strings, or non-negative floats
/// (truncated toward zero).
fn as_section(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(n) => usize::try_from(n).ok(),
            None => n
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as usize),
        },
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read queries from a parsed queries document, in source order.
///
/// Accepts a list of query records or an object mapping query id to a record
/// or to the question text. Queries without a resolvable id or text are dropped.
pub fn parse_queries(value: &Value) -> Vec<QueryRecord> {
    let queries: Vec<QueryRecord> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|record| {
                let query_id = pick_first(record, QUERY_ID_FIELDS).and_then(as_id)?;
                let text = pick_first(record, QUERY_TEXT_FIELDS).and_then(as_text)?;
                Some(QueryRecord { query_id, text })
            })
            .collect(),
        Value::Object(entries) => entries
            .iter()
            .filter_map(|(query_id, record)| {
                let text = match record {
                    Value::Object(fields) => pick_first(fields, QUERY_TEXT_FIELDS).and_then(as_text)?,
                    other => as_text(other)?,
                };
                Some(QueryRecord { query_id: query_id.clone(), text })
            })
            .collect(),
        _ => Vec::new(),
    };

    debug!(query_count = queries.len(), "parsed queries");
    queries
}

fn read_json(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(RagError::CorpusNotFound { path: path.to_path_buf() });
    }
    let raw = fs::read_to_string(path).map_err(|source| RagError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw).map_err(|source| RagError::Json { path: path.to_path_buf(), source })
}

/// Load `queries.json` and `qrels.json` from a corpus root.
///
/// # Errors
///
/// Returns [`RagError::CorpusNotFound`] naming the first missing file, or an
/// I/O or JSON error if a file cannot be read.
pub fn load_eval_inputs(root: &Path) -> Result<(Vec<QueryRecord>, Judgments)> {
    let queries = parse_queries(&read_json(&root.join(QUERIES_FILE))?);
    let judgments = Judgments::from_value(&read_json(&root.join(QRELS_FILE))?);
    info!(query_count = queries.len(), judgment_count = judgments.len(), "loaded evaluation inputs");
    Ok((queries, judgments))
}

/// Result of a Hit@k evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRateReport {
    /// Queries whose gold section appeared in the retrieved context.
    pub hits: usize,
    /// Queries actually evaluated.
    pub total: usize,
    /// `hits / max(total, 1)`.
    pub rate: f64,
    /// The `top_k` used for retrieval.
    pub k: usize,
}

impl HitRateReport {
    fn new(hits: usize, total: usize, k: usize) -> Self {
        Self { hits, total, rate: hits as f64 / total.max(1) as f64, k }
    }
}

impl fmt::Display for HitRateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hit@{}: {}/{} = {:.3}", self.k, self.hits, self.total, self.rate)
    }
}

/// Replays queries against a [`Retriever`] and scores them against judgments.
#[derive(Clone)]
pub struct Evaluator {
    retriever: Retriever,
}

impl Evaluator {
    pub fn new(retriever: Retriever) -> Self {
        Self { retriever }
    }

    /// Compute Hit@`top_k` over at most `num_eval` judged queries.
    ///
    /// Queries are taken in order; those without a judgment are skipped and do
    /// not count toward `num_eval`. A query is a hit when any retrieved unit has
    /// exactly the judged `doc_id` and `section_id`.
    ///
    /// # Errors
    ///
    /// Propagates retrieval failures.
    pub async fn evaluate(
        &self,
        queries: &[QueryRecord],
        judgments: &Judgments,
        top_k: usize,
        num_eval: usize,
    ) -> Result<HitRateReport> {
        let mut hits = 0;
        let mut total = 0;

        for query in queries {
            if total >= num_eval {
                break;
            }
            let Some(gold) = judgments.get(&query.query_id) else {
                debug!(query_id = %query.query_id, "no judgment, skipping query");
                continue;
            };

            let retrieved = self.retriever.retrieve(&query.text, top_k).await?;
            let hit = retrieved
                .iter()
                .any(|unit| unit.doc_id == gold.doc_id && unit.section_id == gold.section_id);

            total += 1;
            if hit {
                hits += 1;
            }
            debug!(query_id = %query.query_id, hit, "evaluated query");
        }

        let report = HitRateReport::new(hits, total, top_k);
        info!(hits, total, rate = report.rate, k = top_k, "evaluation complete");
        Ok(report)
    }
}
