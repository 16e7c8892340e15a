//! Property tests for chunk size bounds and metadata inheritance.

use paper_rag::{Chunker, ContextUnit, RecursiveChunker};
use proptest::prelude::*;

/// Text built from words, sentence ends, line and paragraph breaks, with some
/// multi-byte characters mixed in.
fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            4 => "[a-zé]{1,12}".prop_map(|w| format!("{w} ")),
            1 => Just(". ".to_string()),
            1 => Just("\n".to_string()),
            1 => Just("\n\n".to_string()),
            1 => "[a-z]{20,80}",
        ],
        0..200,
    )
    .prop_map(|parts| parts.concat())
}

/// Numbered tokens (`t0000`, `t0001`, ...) joined by random separators, so any
/// text shared by the end of one chunk and the start of the next is real overlap.
fn arb_numbered_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![4 => Just(" "), 1 => Just(". "), 1 => Just("\n"), 1 => Just("\n\n")],
        1..300,
    )
    .prop_map(|separators| {
        separators.iter().enumerate().map(|(i, sep)| format!("t{i:04}{sep}")).collect()
    })
}

/// Length in chars of the longest suffix of `a` that is also a prefix of `b`.
fn shared_boundary(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    (1..=b_chars.len().min(a.chars().count()))
        .rev()
        .find(|&k| a.ends_with(&b_chars[..k].iter().collect::<String>()))
        .unwrap_or(0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn consecutive_chunks_overlap_at_most_chunk_overlap(
        text in arb_numbered_text(),
        chunk_size in 20usize..300,
        overlap_ratio in 0usize..90,
    ) {
        let chunk_overlap = chunk_size * overlap_ratio / 100;
        let chunks = RecursiveChunker::new(chunk_size, chunk_overlap).split_text(&text);

        let mut from = 0;
        for chunk in &chunks {
            let found = text[from..].find(chunk.as_str());
            prop_assert!(found.is_some(), "chunk {:?} not found in source order", chunk);
            from += found.unwrap_or_default() + 1;
        }
        for pair in chunks.windows(2) {
            let overlap = shared_boundary(&pair[0], &pair[1]);
            prop_assert!(
                overlap <= chunk_overlap,
                "overlap {} exceeds {} between {:?} and {:?}",
                overlap,
                chunk_overlap,
                pair[0],
                pair[1],
            );
        }
    }

    #[test]
    fn chunks_never_exceed_chunk_size(
        text in arb_text(),
        chunk_size in 20usize..300,
        overlap_ratio in 0usize..90,
    ) {
        let chunk_overlap = chunk_size * overlap_ratio / 100;
        let unit = ContextUnit {
            content: text,
            doc_id: "2402.00042".to_string(),
            section_id: 7,
            title: "Sparse Things".to_string(),
        };

        let chunks = RecursiveChunker::new(chunk_size, chunk_overlap).chunk(&unit);
        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert!(chunk.content.chars().count() <= chunk_size);
            prop_assert!(!chunk.content.is_empty());
            prop_assert_eq!(&chunk.doc_id, &unit.doc_id);
            prop_assert_eq!(chunk.section_id, unit.section_id);
            prop_assert_eq!(&chunk.title, &unit.title);
            prop_assert_eq!(chunk.chunk_index, i);
        }
    }

    #[test]
    fn short_content_is_kept_whole(text in "[a-z .\n]{1,100}") {
        let unit = ContextUnit {
            content: text.clone(),
            doc_id: "d".to_string(),
            section_id: 0,
            title: String::new(),
        };
        let chunks = RecursiveChunker::new(100, 20).chunk(&unit);
        prop_assert_eq!(chunks.len(), 1);
        prop_assert_eq!(&chunks[0].content, &text);
    }
}
