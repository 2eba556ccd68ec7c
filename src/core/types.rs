//! Core data types for the CourseAlign retrieval core.
//!
//! This module defines the data structures shared by the indexer,
//! the storage layer and the retriever: pages, chunks, scored
//! results, build summaries, and request/response shapes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Similarity function recorded in an index at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    InnerProduct,
}

impl SimilarityMetric {
    /// Tag stored in the vector index header
    pub fn as_u32(self) -> u32 {
        match self {
            SimilarityMetric::Cosine => 0,
            SimilarityMetric::InnerProduct => 1,
        }
    }

    pub fn from_u32(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(SimilarityMetric::Cosine),
            1 => Some(SimilarityMetric::InnerProduct),
            _ => None,
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityMetric::Cosine => write!(f, "cosine"),
            SimilarityMetric::InnerProduct => write!(f, "inner_product"),
        }
    }
}

/// Text of one source page, 1-indexed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

impl PageText {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// A chunk produced by the chunker, before it is assigned to a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkCandidate {
    /// Window words joined by single spaces
    pub text: String,

    /// Lowest source page touched by any word in the window
    pub page_start: u32,

    /// Highest source page touched by any word in the window
    pub page_end: u32,

    /// Number of words in the window
    pub word_count: usize,
}

impl ChunkCandidate {
    /// Promote a candidate into a persisted chunk
    pub fn into_chunk(self, chunk_id: usize, collection_id: &str) -> Chunk {
        Chunk {
            chunk_id,
            text: self.text,
            page_start: self.page_start,
            page_end: self.page_end,
            collection_id: collection_id.to_string(),
            word_count: self.word_count,
        }
    }
}

/// The atomic retrievable unit, one record of the metadata store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk's vector in the index
    pub chunk_id: usize,

    /// The actual text content
    pub text: String,

    /// First source page (inclusive)
    pub page_start: u32,

    /// Last source page (inclusive)
    pub page_end: u32,

    /// Owning collection (course code)
    pub collection_id: String,

    /// Number of words in `text`
    pub word_count: usize,
}

impl Chunk {
    /// Page citation in the form "p. 12" or "pp. 45-47"
    pub fn citation(&self) -> String {
        if self.page_start == self.page_end {
            format!("p. {}", self.page_start)
        } else {
            format!("pp. {}-{}", self.page_start, self.page_end)
        }
    }
}

/// A retrieved chunk with its similarity score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// 1-based position in the ranking
    pub rank: usize,

    /// Similarity score (higher = more similar)
    pub score: f32,

    pub chunk: Chunk,
}

/// Ranked results for one query of a multi-query retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResults {
    pub query: String,
    pub results: Vec<ScoredChunk>,
}

/// Statistics from a successful build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    /// Collection identifier (course code)
    pub collection_id: String,

    /// Number of pages returned by extraction
    pub pages_indexed: usize,

    /// Number of chunks (and vectors) persisted
    pub chunks_indexed: usize,

    /// Embedding dimension of the index
    pub dimension: usize,

    /// Generation that became live
    pub generation: String,

    /// Build duration in milliseconds
    pub duration_ms: u64,
}

/// Request to retrieve passages from a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalRequest {
    /// Collection identifier (course code)
    pub collection_id: String,

    /// Query text (a concept, or a slide's text)
    pub query: String,

    /// Number of results to return (optional)
    pub top_k: Option<usize>,
}

/// Response from a retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResponse {
    pub collection_id: String,

    /// Original query string
    pub query: String,

    pub results: Vec<ScoredChunk>,

    /// Number of results returned
    pub count: usize,

    /// Query duration in milliseconds
    pub duration_ms: u64,
}

/// Indexing status of a course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseStatus {
    pub course_code: String,

    /// Title from the course registry, if configured
    pub title: Option<String>,

    /// Whether a live index exists
    pub indexed: bool,

    /// Chunk count of the live index
    pub chunks: Option<usize>,

    /// Whether the course appears in the configured registry
    pub registered: bool,
}
