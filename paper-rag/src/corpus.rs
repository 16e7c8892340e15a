//! Corpus discovery and paper record loading.
//!
//! A corpus root holds one JSON record per paper under `corpus/`. Records are
//! read in filename order so that ingestion runs are reproducible, and each one
//! is normalised into a [`Paper`] with best-effort defaulting: a missing `id`
//! falls back to the file stem, missing `title`/`sections`/`text`/`tables`
//! default to empty, and sections that are not objects are kept as empty
//! placeholders so positional `section_id`s stay aligned with the source.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::{ContextUnit, Paper, Section};
use crate::error::{RagError, Result};

/// Directory under the corpus root holding per-paper records.
pub const CORPUS_DIR: &str = "corpus";

/// Candidate corpus roots under a raw dataset directory, primary layout first.
pub fn default_root_candidates(raw_data_dir: impl AsRef<Path>) -> Vec<PathBuf> {
    let base = raw_data_dir.as_ref();
    vec![base.join("official").join("pdf").join("arxiv"), base.join("pdf").join("arxiv")]
}

/// Return the first candidate path that exists.
///
/// # Errors
///
/// Returns [`RagError::Configuration`] naming every checked path when none exist.
pub fn resolve_corpus_root(candidates: &[PathBuf]) -> Result<PathBuf> {
    if let Some(found) = candidates.iter().find(|path| path.exists()) {
        debug!(root = %found.display(), "resolved corpus root");
        return Ok(found.clone());
    }

    let listing = candidates
        .iter()
        .map(|path| format!("  {}", path.display()))
        .collect::<Vec<_>>()
        .join("\n");
    Err(RagError::Configuration {
        message: format!("could not find corpus directory. Checked:\n{listing}"),
        checked: candidates.to_vec(),
    })
}

/// List `*.json` files directly inside `dir`, sorted by filename, keeping at most `limit`.
pub fn discover_paper_files(dir: impl AsRef<Path>, limit: Option<usize>) -> Vec<PathBuf> {
    let mut files = WalkDir::new(dir.as_ref())
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();

    files.sort();
    if let Some(limit) = limit {
        files.truncate(limit);
    }
    files
}

#[derive(Debug, Deserialize)]
struct PaperRecord {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<Value>,
    #[serde(default)]
    sections: Option<Vec<Value>>,
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn section_from_value(value: &Value) -> Section {
    let Some(object) = value.as_object() else {
        return Section::default();
    };

    let text = object.get("text").and_then(Value::as_str).unwrap_or_default().to_string();
    let tables = object
        .get("tables")
        .and_then(Value::as_object)
        .map(|tables| {
            tables
                .iter()
                .map(|(name, table)| {
                    let rendered = match table {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (name.clone(), rendered)
                })
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();

    Section { text, tables }
}

/// Parse one paper record from raw JSON, using `fallback_id` when it has no usable `id`.
pub fn parse_paper(raw: &str, fallback_id: &str) -> serde_json::Result<Paper> {
    let record: PaperRecord = serde_json::from_str(raw)?;
    let id = record.id.as_ref().and_then(scalar_to_string).unwrap_or_else(|| fallback_id.to_string());
    let title = match record.title {
        Some(Value::String(title)) => title,
        _ => String::new(),
    };
    let sections = record.sections.unwrap_or_default().iter().map(section_from_value).collect();
    Ok(Paper { id, title, sections })
}

/// Reads paper records from a resolved corpus root.
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    root: PathBuf,
}

impl CorpusLoader {
    /// Create a loader for an already-resolved corpus root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a loader for the first existing candidate root.
    ///
    /// # Errors
    ///
    /// See [`resolve_corpus_root`].
    pub fn resolve(candidates: &[PathBuf]) -> Result<Self> {
        resolve_corpus_root(candidates).map(Self::new)
    }

    /// The corpus root this loader reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load up to `limit` papers in filename order.
    ///
    /// Records that cannot be read or parsed are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::CorpusNotFound`] if `corpus/` is missing or holds no records.
    pub fn load_papers(&self, limit: Option<usize>) -> Result<Vec<Paper>> {
        let corpus_dir = self.root.join(CORPUS_DIR);
        if !corpus_dir.is_dir() {
            return Err(RagError::CorpusNotFound { path: corpus_dir });
        }

        let files = discover_paper_files(&corpus_dir, limit);
        if files.is_empty() {
            return Err(RagError::CorpusNotFound { path: corpus_dir });
        }

        let mut papers = Vec::with_capacity(files.len());
        let mut ids = HashSet::new();
        for path in files {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string();
            let raw = match fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable paper record");
                    continue;
                }
            };
            match parse_paper(&raw, &stem) {
                Ok(paper) => {
                    if !ids.insert(paper.id.clone()) {
                        warn!(
                            path = %path.display(),
                            doc_id = %paper.id,
                            "duplicate paper id; its sections replace the earlier record's"
                        );
                    }
                    papers.push(paper);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping malformed paper record");
                }
            }
        }

        info!(root = %self.root.display(), paper_count = papers.len(), "loaded papers");
        Ok(papers)
    }

    /// Load papers and flatten them into context units.
    ///
    /// Returns the number of papers read alongside the units.
    pub fn load_context_units(&self, limit: Option<usize>) -> Result<(usize, Vec<ContextUnit>)> {
        let papers = self.load_papers(limit)?;
        let units = papers.iter().flat_map(Paper::context_units).collect();
        Ok((papers.len(), units))
    }
}
