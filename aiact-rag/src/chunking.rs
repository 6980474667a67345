//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`] - fixed character windows with a fixed stride (the default)
//! - [`SentenceChunker`] - packs whole sentences into windows, falling back to
//!   fixed windows for sentences longer than the chunk size
//!
//! Both work on characters, never bytes, and every chunk is a contiguous
//! slice of the source: each input character lands in at least one chunk.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::{RagConfig, validate_window};
use crate::document::{Chunk, ChunkMetadata, Document};
use crate::error::Result;

static ARTICLE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\barticle\s+(\d+)").expect("unreachable error: invalid article pattern")
});

const PAGE_BREAK: char = '\x0c';

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// Windows start every `chunk_size - chunk_overlap` characters; the last one
/// may be shorter. For text of `n > chunk_size` characters this produces
/// `ceil((n - overlap) / (chunk_size - overlap))` chunks, and exactly one
/// chunk otherwise.
///
/// # Example
///
/// ```rust,ignore
/// use aiact_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(1000, 200)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`](crate::RagError::Config) unless
    /// `0 <= chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_window(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let len = document.text.chars().count();
        let spans = fixed_windows(0, len, self.chunk_size, self.chunk_overlap);
        build_chunks(document, &spans)
    }
}

/// Fixed windows over the character range `[start, end)`.
fn fixed_windows(start: usize, end: usize, size: usize, overlap: usize) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    if start >= end {
        return spans;
    }
    let step = size - overlap;
    let mut from = start;
    loop {
        let to = (from + size).min(end);
        spans.push((from, to));
        if to >= end {
            break;
        }
        from += step;
    }
    spans
}

/// Packs whole sentences into windows of at most `chunk_size` characters.
///
/// A sentence ends after `.`, `!` or `?` followed by whitespace; the
/// whitespace stays with the sentence before it. Each window after the first
/// starts with the trailing sentences of the previous window that fit in
/// `chunk_overlap` characters.
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SentenceChunker {
    /// Create a new `SentenceChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`](crate::RagError::Config) unless
    /// `0 <= chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_window(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    fn windows(&self, sentences: &[(usize, usize)]) -> Vec<(usize, usize)> {
        let (size, overlap) = (self.chunk_size, self.chunk_overlap);
        let mut spans = Vec::new();
        let mut i = 0;

        while i < sentences.len() {
            let (start, first_end) = sentences[i];
            if first_end - start > size {
                spans.extend(fixed_windows(start, first_end, size, overlap));
                i += 1;
                continue;
            }

            let mut last = i;
            while last + 1 < sentences.len() && sentences[last + 1].1 - start <= size {
                last += 1;
            }
            let end = sentences[last].1;
            spans.push((start, end));

            let next = last + 1;
            if next >= sentences.len() {
                break;
            }

            // Walk back over sentences that fit in the overlap while the next
            // window still has room for the first unseen sentence.
            let mut resume = next;
            while resume > i + 1
                && end - sentences[resume - 1].0 <= overlap
                && sentences[next].1 - sentences[resume - 1].0 <= size
            {
                resume -= 1;
            }
            i = resume;
        }

        spans
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let sentences = sentence_spans(&document.text);
        let spans = self.windows(&sentences);
        build_chunks(document, &spans)
    }
}

/// Character spans of the sentences in `text`, covering it end to end.
fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let terminal = matches!(chars[i], '.' | '!' | '?');
        if terminal && chars.get(i + 1).is_some_and(|c| c.is_whitespace()) {
            let mut end = i + 1;
            while end < chars.len() && chars[end].is_whitespace() {
                end += 1;
            }
            spans.push((start, end));
            start = end;
            i = end;
        } else {
            i += 1;
        }
    }
    if start < chars.len() {
        spans.push((start, chars.len()));
    }
    spans
}

/// Turn character spans into chunks with ids and metadata.
fn build_chunks(document: &Document, spans: &[(usize, usize)]) -> Vec<Chunk> {
    let text = &document.text;
    // byte offset of every char boundary, including the end
    let boundaries: Vec<usize> =
        text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let paginated = text.contains(PAGE_BREAK);
    let total_chunks = spans.len();

    spans
        .iter()
        .enumerate()
        .map(|(chunk_index, &(start, end))| {
            let (from, to) = (boundaries[start], boundaries[end]);
            let slice = &text[from..to];
            let page = paginated.then(|| page_at(text, from));
            let length = end - start;
            Chunk {
                id: Chunk::stable_id(&document.id, start, length),
                document_id: document.id.clone(),
                text: slice.to_string(),
                source_offset: start,
                length,
                metadata: ChunkMetadata {
                    article_ref: detect_article_ref(slice),
                    page,
                    chunk_index,
                    total_chunks,
                },
            }
        })
        .collect()
}

/// 1-based page of the byte position `at`. Page breaks right at `at` count
/// as already passed.
fn page_at(text: &str, at: usize) -> u32 {
    let body = text[at..].trim_start_matches(PAGE_BREAK);
    let start = text.len() - body.len();
    let breaks = text[..start].matches(PAGE_BREAK).count();
    u32::try_from(breaks).map_or(u32::MAX, |b| b.saturating_add(1))
}

/// The first article mention in `text`, normalised to `Article <n>`.
pub fn detect_article_ref(text: &str) -> Option<String> {
    ARTICLE_REF.captures(text).map(|caps| format!("Article {}", &caps[1]))
}

/// Normalise extracted text before chunking.
///
/// Runs of whitespace collapse to one space and control characters are
/// dropped. Leading and trailing spaces are removed, but form feeds always
/// survive as page separators, including one at the very start.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        if c == PAGE_BREAK {
            pending_space = false;
            out.push(c);
        } else if c.is_whitespace() {
            pending_space = true;
        } else if c.is_control() {
            continue;
        } else {
            if pending_space && !out.is_empty() && !out.ends_with(PAGE_BREAK) {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::new("doc", text)
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunker = FixedSizeChunker::new(10, 2).unwrap();
        assert!(chunker.chunk(&doc("")).is_empty());
        let chunker = SentenceChunker::new(10, 2).unwrap();
        assert!(chunker.chunk(&doc("")).is_empty());
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = FixedSizeChunker::new(100, 20).unwrap().chunk(&doc("short text"));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short text");
        assert_eq!(chunks[0].metadata.total_chunks, 1);
    }

    #[test]
    fn fixed_windows_use_stride() {
        let chunks = FixedSizeChunker::new(4, 1).unwrap().chunk(&doc("abcdefghij"));
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["abcd", "defg", "ghij"]);
        assert_eq!(chunks[1].source_offset, 3);
        assert_eq!(chunks[2].metadata.chunk_index, 2);
    }

    #[test]
    fn invalid_window_is_rejected() {
        assert!(FixedSizeChunker::new(10, 10).is_err());
        assert!(SentenceChunker::new(0, 0).is_err());
    }

    #[test]
    fn multibyte_text_splits_on_chars() {
        let chunks = FixedSizeChunker::new(3, 1).unwrap().chunk(&doc("äöüßéè"));
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["äöü", "üßé", "éè"]);
    }

    #[test]
    fn detects_article_reference_and_page() {
        let text = "Title page\x0cArticle 5(1)(h) prohibits real-time remote biometric identification.";
        let chunks = FixedSizeChunker::new(200, 0).unwrap().chunk(&doc(text));
        assert_eq!(chunks[0].metadata.article_ref.as_deref(), Some("Article 5"));
        assert_eq!(chunks[0].metadata.page, Some(1));

        let chunks = FixedSizeChunker::new(11, 0).unwrap().chunk(&doc(text));
        assert_eq!(chunks[1].metadata.page, Some(2));
        assert_eq!(detect_article_ref("see ARTICLE 6 and Article 7"), Some("Article 6".into()));
        assert_eq!(detect_article_ref("no reference here"), None);
    }

    #[test]
    fn no_page_without_form_feeds() {
        let chunks = FixedSizeChunker::new(50, 0).unwrap().chunk(&doc("plain text"));
        assert_eq!(chunks[0].metadata.page, None);
    }

    #[test]
    fn sentence_chunker_keeps_sentences_whole() {
        let text = "First one. Second one. Third one. Fourth one.";
        let chunks = SentenceChunker::new(24, 12).unwrap().chunk(&doc(text));
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["First one. Second one. ", "Second one. Third one. ", "Third one. Fourth one."]);
    }

    #[test]
    fn sentence_chunker_splits_long_sentences() {
        let text = "Tiny. abcdefghijklmnopqrstuvwxyz";
        let chunks = SentenceChunker::new(10, 2).unwrap().chunk(&doc(text));
        assert_eq!(chunks[0].text, "Tiny. ");
        assert!(chunks.iter().all(|c| c.length <= 10));
        assert_eq!(chunks.last().map(|c| c.end_offset()), Some(text.chars().count()));
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Article\t 5 \n\n prohibits\u{0}  "), "Article 5 prohibits");
        assert_eq!(clean_text("page one \x0c page two"), "page one\x0cpage two");
    }

    #[test]
    fn leading_page_break_keeps_page_numbers() {
        let cleaned = clean_text("\x0c  Article 5 prohibits certain practices. \x0cArticle 6 classifies. ");
        assert_eq!(cleaned, "\x0cArticle 5 prohibits certain practices.\x0cArticle 6 classifies.");

        let chunks = FixedSizeChunker::new(20, 0).unwrap().chunk(&doc(&cleaned));
        assert_eq!(chunks[0].metadata.page, Some(2));
        assert_eq!(chunks.last().unwrap().metadata.page, Some(3));
    }
}
