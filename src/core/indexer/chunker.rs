//! Page-attributed word-window chunking.
//!
//! Concatenates page text in page order, remembers the source page
//! of every word, and emits fixed-size word windows where each
//! window starts `chunk_words - overlap_words` words after the
//! previous one. Words are whitespace-delimited tokens, so the
//! chunker never splits inside a UTF-8 sequence.
//!
//! # Example
//!
//! ```
//! use coursealign::core::indexer::Chunker;
//! use coursealign::core::types::PageText;
//!
//! let chunker = Chunker::new(600, 150);
//! let words = vec!["cell"; 1800].join(" ");
//! let chunks = chunker.chunk_pages(&[PageText::new(1, words)]);
//!
//! assert_eq!(chunks.len(), 4);
//! assert!(chunks.iter().all(|c| c.page_start == 1 && c.page_end == 1));
//! ```

use crate::core::types::{ChunkCandidate, PageText};

/// Word-window chunker.
///
/// All sizes are measured in **words**.
#[derive(Debug, Clone)]
pub struct Chunker {
    /// Number of words per chunk
    chunk_words: usize,

    /// Number of words shared by consecutive chunks
    overlap_words: usize,
}

impl Chunker {
    /// Create a new chunker with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_words` is 0 or if `overlap_words >= chunk_words`.
    /// Callers taking user input should run
    /// [`validate_window`](crate::core::config::validate_window) first.
    pub fn new(chunk_words: usize, overlap_words: usize) -> Self {
        assert!(chunk_words > 0, "chunk_words must be > 0");
        assert!(
            overlap_words < chunk_words,
            "overlap_words must be < chunk_words"
        );

        Self {
            chunk_words,
            overlap_words,
        }
    }

    pub fn chunk_words(&self) -> usize {
        self.chunk_words
    }

    pub fn overlap_words(&self) -> usize {
        self.overlap_words
    }

    /// Words between the starts of consecutive windows
    pub fn stride(&self) -> usize {
        self.chunk_words - self.overlap_words
    }

    /// Chunk extracted pages into overlapping windows.
    ///
    /// Pages are consumed in slice order. The last window may be
    /// shorter than `chunk_words`; emission stops as soon as a window
    /// reaches the final word. Pages without words contribute nothing.
    ///
    /// # Returns
    ///
    /// Candidates whose `page_start`/`page_end` are the lowest and
    /// highest page touched by any word of the window. Empty input
    /// yields no candidates.
    pub fn chunk_pages(&self, pages: &[PageText]) -> Vec<ChunkCandidate> {
        let words: Vec<(&str, u32)> = pages
            .iter()
            .flat_map(|page| {
                page.text
                    .split_whitespace()
                    .map(move |word| (word, page.page_number))
            })
            .collect();

        if words.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::with_capacity(self.expected_chunks(words.len()));
        let mut start = 0;

        loop {
            let end = (start + self.chunk_words).min(words.len());
            let window = &words[start..end];

            let mut page_start = u32::MAX;
            let mut page_end = 0;
            for &(_, page) in window {
                page_start = page_start.min(page);
                page_end = page_end.max(page);
            }

            let text = window
                .iter()
                .map(|&(word, _)| word)
                .collect::<Vec<_>>()
                .join(" ");

            chunks.push(ChunkCandidate {
                text,
                page_start,
                page_end,
                word_count: window.len(),
            });

            if end == words.len() {
                break;
            }
            start += self.stride();
        }

        chunks
    }

    /// Number of windows `chunk_pages` emits for `total_words` words
    pub fn expected_chunks(&self, total_words: usize) -> usize {
        if total_words == 0 {
            return 0;
        }
        if total_words <= self.chunk_words {
            return 1;
        }
        1 + (total_words - self.chunk_words).div_ceil(self.stride())
    }
}
