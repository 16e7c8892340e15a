//! Data types for papers, context units, chunks, and search results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One source document, as loaded from the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paper {
    /// Stable identifier; the record's `id` or, failing that, its file stem.
    pub id: String,
    /// Paper title, possibly empty.
    pub title: String,
    /// Addressable sections in source order.
    pub sections: Vec<Section>,
}

/// One addressable unit within a [`Paper`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// Prose text, possibly empty.
    pub text: String,
    /// Rendered tables keyed by table name.
    pub tables: BTreeMap<String, String>,
}

impl Section {
    /// Prose followed by every table as a `[TABLE]` block, whitespace-trimmed.
    ///
    /// An empty result means the section carries nothing worth indexing.
    pub fn rendered_text(&self) -> String {
        let text = self.text.trim();
        if self.tables.is_empty() {
            return text.to_string();
        }

        let tables = self
            .tables
            .values()
            .map(|table| format!("[TABLE]\n{table}"))
            .collect::<Vec<_>>()
            .join("\n\n");
        format!("{text}\n\n{tables}").trim().to_string()
    }
}

impl Paper {
    /// Flatten into one [`ContextUnit`] per section with non-empty rendered text.
    ///
    /// `section_id` is the section's position in [`Paper::sections`], so skipped
    /// sections leave gaps in the numbering.
    pub fn context_units(&self) -> Vec<ContextUnit> {
        self.sections
            .iter()
            .enumerate()
            .filter_map(|(section_id, section)| {
                let content = section.rendered_text();
                if content.is_empty() {
                    return None;
                }
                Some(ContextUnit {
                    content,
                    doc_id: self.id.clone(),
                    section_id,
                    title: self.title.clone(),
                })
            })
            .collect()
    }
}

/// The retrievable granule: a piece of one section plus its provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextUnit {
    /// The text content.
    pub content: String,
    /// The parent paper's id.
    pub doc_id: String,
    /// Position of the source section within its paper.
    pub section_id: usize,
    /// The parent paper's title.
    pub title: String,
}

/// A bounded slice of a [`ContextUnit`], with its vector embedding once indexed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier: `{doc_id}:{section_id}:{chunk_index}`.
    pub id: String,
    /// The chunk text.
    pub content: String,
    /// Inherited from the source unit.
    pub doc_id: String,
    /// Inherited from the source unit.
    pub section_id: usize,
    /// Inherited from the source unit.
    pub title: String,
    /// Position of this chunk within its source unit.
    pub chunk_index: usize,
    /// The vector embedding for `content`; empty until the chunk is indexed.
    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Create an un-embedded chunk carrying `unit`'s metadata.
    pub fn from_unit(unit: &ContextUnit, chunk_index: usize, content: String) -> Self {
        Self {
            id: format!("{}:{}:{chunk_index}", unit.doc_id, unit.section_id),
            content,
            doc_id: unit.doc_id.clone(),
            section_id: unit.section_id,
            title: unit.title.clone(),
            chunk_index,
            embedding: Vec::new(),
        }
    }

    /// Rehydrate the chunk as a [`ContextUnit`].
    pub fn to_context_unit(&self) -> ContextUnit {
        ContextUnit {
            content: self.content.clone(),
            doc_id: self.doc_id.clone(),
            section_id: self.section_id,
            title: self.title.clone(),
        }
    }
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// Plain structured context as shown to the generator and returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextItem {
    /// The source paper's id.
    pub doc_id: String,
    /// Position of the source section within its paper.
    pub section_id: usize,
    /// The source paper's title.
    pub title: String,
    /// The retrieved chunk text.
    #[serde(alias = "content")]
    pub text: String,
}

impl From<ContextUnit> for ContextItem {
    fn from(unit: ContextUnit) -> Self {
        Self { doc_id: unit.doc_id, section_id: unit.section_id, title: unit.title, text: unit.content }
    }
}
