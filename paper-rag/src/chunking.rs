//! Context unit chunking.
//!
//! [`RecursiveChunker`] splits on the strongest boundary available in a piece of
//! text (paragraph, line, sentence, word, character), recursing into weaker
//! boundaries only for pieces that still exceed the chunk size. Small pieces are
//! then merged greedily back up to the chunk size, carrying a tail of at most
//! `chunk_overlap` characters from one chunk into the next.
//!
//! All lengths are counted in `char`s, never bytes.

use std::collections::VecDeque;

use crate::document::{Chunk, ContextUnit};

/// Boundaries tried in order, strongest first. The empty separator splits
/// between every character and always applies.
pub const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// A strategy for splitting context units into chunks.
///
/// Implementations produce [`Chunk`]s with content and metadata but no embeddings.
/// Embeddings are attached later by the vector index.
pub trait Chunker: Send + Sync {
    /// Split a single context unit into chunks.
    fn chunk(&self, unit: &ContextUnit) -> Vec<Chunk>;

    /// Split every unit, preserving input order.
    fn chunk_units(&self, units: &[ContextUnit]) -> Vec<Chunk> {
        units.iter().flat_map(|unit| self.chunk(unit)).collect()
    }
}

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// # Example
///
/// ```rust,ignore
/// use paper_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(900, 150);
/// let chunks = chunker.chunk(&unit);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — maximum number of characters shared by consecutive chunks
    ///
    /// Callers are expected to pass validated values (see [`RagConfig::validate`](crate::RagConfig::validate)).
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size: chunk_size.max(1), chunk_overlap }
    }

    /// Split raw text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if char_len(text) <= self.chunk_size {
            return if text.is_empty() { Vec::new() } else { vec![text.to_string()] };
        }
        split_recursive(text, self.chunk_size, self.chunk_overlap, &SEPARATORS)
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, unit: &ContextUnit) -> Vec<Chunk> {
        self.split_text(&unit.content)
            .into_iter()
            .enumerate()
            .map(|(i, content)| Chunk::from_unit(unit, i, content))
            .collect()
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split on the first separator present in `text`, recursing into any piece
/// that is still larger than `chunk_size`.
fn split_recursive(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    let (separator, weaker) = match separators.iter().position(|s| s.is_empty() || text.contains(s)) {
        Some(i) => (separators[i], &separators[i + 1..]),
        None => ("", &[][..]),
    };

    let mut chunks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for piece in split_keeping_separator(text, separator) {
        if char_len(piece) <= chunk_size {
            pending.push(piece);
            continue;
        }

        if !pending.is_empty() {
            chunks.extend(merge_pieces(&pending, chunk_size, chunk_overlap));
            pending.clear();
        }
        chunks.extend(split_recursive(piece, chunk_size, chunk_overlap, weaker));
    }

    if !pending.is_empty() {
        chunks.extend(merge_pieces(&pending, chunk_size, chunk_overlap));
    }

    chunks
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
///
/// The empty separator yields one segment per character.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect();
    }

    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Greedily merge pieces (each at most `chunk_size`) into chunks.
///
/// When a chunk is emitted, pieces are dropped from the front of the window
/// until what remains fits in `chunk_overlap` and leaves room for the next
/// piece; that remainder opens the following chunk.
fn merge_pieces(pieces: &[&str], chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<(&str, usize)> = VecDeque::new();
    let mut total = 0;

    for &piece in pieces {
        let len = char_len(piece);
        if total + len > chunk_size && !window.is_empty() {
            push_joined(&mut chunks, &window);
            while total > chunk_overlap || (total > 0 && total + len > chunk_size) {
                let Some((_, front_len)) = window.pop_front() else { break };
                total -= front_len;
            }
        }
        window.push_back((piece, len));
        total += len;
    }

    push_joined(&mut chunks, &window);
    chunks
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<(&str, usize)>) {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
