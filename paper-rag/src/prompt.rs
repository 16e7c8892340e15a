//! Citation-numbered prompt construction.
//!
//! The instruction text below is part of the answer contract: it tells the
//! model to stay inside the given context, to abstain with [`FALLBACK_ANSWER`],
//! to keep answers to 3–4 sentences and to cite blocks in brackets. Editing it
//! changes the citation and abstention behaviour of every answer.

use crate::document::ContextItem;

/// The sentence the model is told to emit when the context is insufficient.
pub const FALLBACK_ANSWER: &str = "I don’t know based on the provided documents.";

/// Render one context item as `[i] (Doc: <doc_id>, Section: <section_id>)\n<text>`.
pub fn render_block(index: usize, item: &ContextItem) -> String {
    format!("[{index}] (Doc: {}, Section: {})\n{}", item.doc_id, item.section_id, item.text)
}

/// Number context items from 1 in their given order and join them with blank lines.
pub fn render_context(context: &[ContextItem]) -> String {
    context
        .iter()
        .enumerate()
        .map(|(i, item)| render_block(i + 1, item))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the full prompt for `question` over already-ranked `context`.
///
/// Output depends only on the inputs, byte for byte.
pub fn build_prompt(question: &str, context: &[ContextItem]) -> String {
    let context_text = render_context(context);
    format!(
        "You are an expert research assistant.

Your task is to answer the question by identifying:
1. The core research problem or limitation motivating the paper.
2. Why existing approaches are insufficient.

Use ONLY the provided context.
You may combine multiple context blocks to infer the answer.

If the problem cannot be identified, say:
\"{FALLBACK_ANSWER}\"

If the problem is strongly supported by the context, state it confidently.
Avoid speculative language when evidence is clear.

Write a concise, technical answer (3–4 sentences max).
Cite document IDs in brackets.

Question:
{question}

Context:
{context_text}

Answer:"
    )
}
