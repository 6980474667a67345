//! Property tests for chunk coverage and chunk counts.

use aiact_rag::chunking::{Chunker, FixedSizeChunker, SentenceChunker};
use aiact_rag::document::{Chunk, Document};
use proptest::prelude::*;

/// Every character position in `[0, len)` is inside at least one chunk, and
/// each chunk's text is exactly the slice it claims to cover.
fn assert_covers(text: &str, chunks: &[Chunk]) -> Result<(), TestCaseError> {
    let chars: Vec<char> = text.chars().collect();
    let mut covered_to = 0;
    for chunk in chunks {
        prop_assert!(chunk.source_offset <= covered_to, "gap before offset {}", chunk.source_offset);
        let expected: String = chars[chunk.source_offset..chunk.end_offset()].iter().collect();
        prop_assert_eq!(&chunk.text, &expected);
        covered_to = covered_to.max(chunk.end_offset());
    }
    prop_assert_eq!(covered_to, chars.len());
    Ok(())
}

fn arb_window() -> impl Strategy<Value = (usize, usize)> {
    (1usize..60).prop_flat_map(|size| (Just(size), 0..size))
}

/// **Property: fixed-size coverage and count**
/// *For any* text and `0 <= overlap < size`, the fixed-size chunker SHALL
/// cover the whole text with windows of at most `size` characters, and for
/// text longer than `size` SHALL produce `ceil((len - overlap) / (size - overlap))` chunks.
mod prop_fixed_size {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn covers_text_with_expected_count(
            text in "\\PC{0,400}",
            (size, overlap) in arb_window(),
        ) {
            let chunker = FixedSizeChunker::new(size, overlap).unwrap();
            let chunks = chunker.chunk(&Document::new("doc", text.clone()));
            let len = text.chars().count();

            assert_covers(&text, &chunks)?;
            prop_assert!(chunks.iter().all(|c| c.length <= size));

            let expected = match len {
                0 => 0,
                n if n <= size => 1,
                n => (n - overlap).div_ceil(size - overlap),
            };
            prop_assert_eq!(chunks.len(), expected);

            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.metadata.chunk_index, i);
                prop_assert_eq!(chunk.metadata.total_chunks, chunks.len());
            }
        }

        #[test]
        fn chunking_is_deterministic(text in "[a-z .]{0,200}", (size, overlap) in arb_window()) {
            let chunker = FixedSizeChunker::new(size, overlap).unwrap();
            let document = Document::new("doc", text);
            prop_assert_eq!(chunker.chunk(&document), chunker.chunk(&document));
        }
    }
}

/// **Property: sentence chunker coverage**
/// *For any* text, the sentence chunker SHALL produce contiguous slices that
/// cover the whole text and never exceed `size` characters.
mod prop_sentence {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn covers_text_within_size(
            text in "([A-Za-zé ]{0,40}[.!?] ){0,12}[A-Za-z ]{0,30}",
            (size, overlap) in arb_window(),
        ) {
            let chunker = SentenceChunker::new(size, overlap).unwrap();
            let chunks = chunker.chunk(&Document::new("doc", text.clone()));

            assert_covers(&text, &chunks)?;
            prop_assert!(chunks.iter().all(|c| c.length <= size));
            for pair in chunks.windows(2) {
                prop_assert!(pair[0].source_offset < pair[1].source_offset);
            }
        }
    }
}
