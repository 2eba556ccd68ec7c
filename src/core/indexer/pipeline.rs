//! Indexing pipeline orchestration.
//!
//! Coordinates the in-memory half of a build:
//! 1. Extract page text
//! 2. Chunk pages into overlapping windows
//! 3. Embed chunks in provider-sized batches
//!
//! Persisting the result is the storage layer's job. Nothing here
//! touches disk, so an error at any stage leaves prior state alone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::config::validate_window;
use crate::core::embedding::{check_vectors, Embedder};
use crate::core::error::{CourseAlignError, Result};
use crate::core::indexer::extractor::{self, Document};
use crate::core::indexer::Chunker;
use crate::core::types::Chunk;

/// Shared cancellation switch for one build
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Caller controls for a build; both are honored only before the swap
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub cancel: CancelFlag,
    pub timeout: Option<Duration>,
}

impl BuildOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fail with `BuildCancelled` if cancelled or past the deadline
    pub fn checkpoint(&self, started: Instant, stage: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(CourseAlignError::BuildCancelled(format!(
                "cancelled during {stage}"
            )));
        }
        if let Some(timeout) = self.timeout {
            if started.elapsed() > timeout {
                return Err(CourseAlignError::BuildCancelled(format!(
                    "timed out after {timeout:?} during {stage}"
                )));
            }
        }
        Ok(())
    }
}

/// Chunks and their vectors, ready to be persisted
#[derive(Debug, Clone)]
pub struct PreparedIndex {
    pub pages_indexed: usize,
    pub chunks: Vec<Chunk>,
    pub vectors: Vec<Vec<f32>>,
    pub dimension: usize,
    pub model: String,
}

/// Orchestrates the indexing pipeline
pub struct IndexingPipeline {
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl std::fmt::Debug for IndexingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexingPipeline")
            .field("chunker", &self.chunker)
            .field("embedder", &self.embedder.model_name())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl IndexingPipeline {
    /// Create a new indexing pipeline
    ///
    /// # Arguments
    ///
    /// * `chunk_words` - Words per chunk window (600-900)
    /// * `overlap_words` - Words shared by consecutive chunks
    /// * `embedder` - Provider used for every chunk
    /// * `batch_size` - Texts per provider call
    pub fn new(
        chunk_words: usize,
        overlap_words: usize,
        embedder: Arc<dyn Embedder>,
        batch_size: usize,
    ) -> Result<Self> {
        validate_window(chunk_words, overlap_words)?;
        if batch_size == 0 {
            return Err(CourseAlignError::ConfigError(
                "Embedding batch size must be non-zero".to_string(),
            ));
        }

        Ok(Self {
            chunker: Chunker::new(chunk_words, overlap_words),
            embedder,
            batch_size,
        })
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Extract, chunk and embed a document for `collection_id`
    ///
    /// `started` anchors the build deadline so storage time counts
    /// against the same timeout.
    pub fn prepare(
        &self,
        collection_id: &str,
        document: &Document,
        options: &BuildOptions,
        started: Instant,
    ) -> Result<PreparedIndex> {
        options.checkpoint(started, "extraction")?;

        let pages = extractor::extract(document)?;
        tracing::info!("Extracted {} pages from {}", pages.len(), document.name);

        let candidates = self.chunker.chunk_pages(&pages);
        if candidates.is_empty() {
            return Err(CourseAlignError::Extraction(format!(
                "{} produced no chunks",
                document.name
            )));
        }
        tracing::info!(
            "Chunked {} into {} chunks ({} words, {} overlap)",
            document.name,
            candidates.len(),
            self.chunker.chunk_words(),
            self.chunker.overlap_words()
        );

        let chunks: Vec<Chunk> = candidates
            .into_iter()
            .enumerate()
            .map(|(i, candidate)| candidate.into_chunk(i, collection_id))
            .collect();

        let vectors = self.embed_chunks(&chunks, options, started)?;
        let dimension = check_vectors(&vectors, chunks.len())?;

        Ok(PreparedIndex {
            pages_indexed: pages.len(),
            chunks,
            vectors,
            dimension,
            model: self.embedder.model_name().to_string(),
        })
    }

    fn embed_chunks(
        &self,
        chunks: &[Chunk],
        options: &BuildOptions,
        started: Instant,
    ) -> Result<Vec<Vec<f32>>> {
        let total_batches = chunks.len().div_ceil(self.batch_size);
        let mut vectors = Vec::with_capacity(chunks.len());

        for (batch_idx, batch) in chunks.chunks(self.batch_size).enumerate() {
            options.checkpoint(started, "embedding")?;

            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let batch_vectors = self.embedder.embed(&texts)?;
            check_vectors(&batch_vectors, texts.len())?;

            tracing::debug!(
                "Embedded batch {}/{} ({} chunks)",
                batch_idx + 1,
                total_batches,
                batch.len()
            );
            vectors.extend(batch_vectors);
        }

        Ok(vectors)
    }
}
