//! CourseAlign - textbook retrieval for course planning
//!
//! Indexes a course textbook into overlapping word-window chunks,
//! embeds every chunk, and answers similarity queries with
//! page-level citations.
//!
//! # Architecture
//!
//! - **core**: Domain logic
//!   - config, error, types, xdg
//!   - embedding (OpenAI-compatible API, local hashing)
//!   - indexer (page extraction, chunking, pipeline)
//!   - storage (generations, flat vector index, validation)
//!   - search (retriever, handle cache)
//!   - services (unified service container)
//!
//! - **cli**: Command-line adapter (depends on core)
//!
//! # Key Features
//!
//! - Word-window chunking with configurable overlap (600-900 words)
//! - Page-range citations for every chunk
//! - Atomic rebuilds: readers see the old or new collection, never a mix
//! - Deterministic ranking with stable tie-breaks

// Core domain logic
pub mod core;

// Command-line adapter
pub mod cli;

// Re-export commonly used types for convenience
pub use core::config::Config;
pub use core::error::{CourseAlignError, Result};
pub use core::services::Services;
pub use core::storage::{CollectionMetadata, StorageManager};
pub use core::types::*;
