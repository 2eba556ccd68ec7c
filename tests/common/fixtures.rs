// Test fixtures for integration testing

use coursealign::core::embedding::Embedder;
use coursealign::core::error::{CourseAlignError, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Vocabulary for topic pages; topics share no words
#[allow(dead_code)]
pub const TOPICS: &[(&str, &[&str])] = &[
    (
        "photosynthesis",
        &["photosynthesis", "chlorophyll", "sunlight", "glucose", "stomata"],
    ),
    (
        "mitosis",
        &["mitosis", "chromosome", "spindle", "centromere", "telophase"],
    ),
    (
        "enzymes",
        &["enzyme", "substrate", "catalyst", "activation", "inhibitor"],
    ),
];

/// `count` distinct words `{prefix}{start}`, `{prefix}{start+1}`, ...
#[allow(dead_code)]
pub fn numbered_words(prefix: &str, start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("{prefix}{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One page per topic, each `words_per_page` words of that topic's vocabulary
#[allow(dead_code)]
pub fn topic_pages(words_per_page: usize) -> Vec<String> {
    TOPICS
        .iter()
        .map(|(_, vocab)| {
            (0..words_per_page)
                .map(|i| vocab[i % vocab.len()])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Textbook written to disk as a form-feed separated text export
#[allow(dead_code)]
pub struct TestTextbook {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestTextbook {
    #[allow(dead_code)]
    pub fn with_pages<S: AsRef<str>>(file_name: &str, pages: &[S]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join(file_name);
        let contents = pages
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join("\x0c");
        std::fs::write(&path, contents).expect("Failed to write textbook");
        Self { dir, path }
    }

    /// The three topic pages, 700 words each
    #[allow(dead_code)]
    pub fn biology() -> Self {
        Self::with_pages("biology.txt", &topic_pages(700))
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Returns the same vector for every input, so every score ties
#[allow(dead_code)]
pub struct ConstantEmbedder {
    pub dimension: usize,
}

impl Embedder for ConstantEmbedder {
    fn model_name(&self) -> &str {
        "constant"
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0; self.dimension]).collect())
    }
}

/// Succeeds for the first `succeed_calls` calls, then fails
#[allow(dead_code)]
pub struct FailingEmbedder {
    pub succeed_calls: usize,
    pub calls: AtomicUsize,
}

impl FailingEmbedder {
    #[allow(dead_code)]
    pub fn after(succeed_calls: usize) -> Self {
        Self {
            succeed_calls,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Embedder for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing"
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.succeed_calls {
            return Err(CourseAlignError::Embedding(
                "provider unavailable".to_string(),
            ));
        }
        Ok(texts.iter().map(|_| vec![0.5; 4]).collect())
    }
}
