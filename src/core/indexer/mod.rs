//! Document indexing module.
//!
//! Turns a textbook into embedded, page-attributed chunks:
//!
//! - Page text extraction (PDF, plain text, markdown)
//! - Word-window chunking with fixed overlap
//! - Batched embedding with cancellation and deadline checks
//!
//! The output is handed to the storage layer, which persists it
//! as a new generation and swaps it live.

pub mod chunker;
pub mod extractor;
pub mod pipeline;

pub use chunker::Chunker;
pub use extractor::{Document, DocumentFormat, PageExtractor};
pub use pipeline::{BuildOptions, CancelFlag, IndexingPipeline, PreparedIndex};
