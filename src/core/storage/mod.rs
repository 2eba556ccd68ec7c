//! Storage layer for embedded textbook collections.
//!
//! This module persists built collections and loads them back for
//! retrieval. Every build produces an immutable generation; a
//! per-collection `CURRENT` pointer names the live one.
//!
//! # Architecture
//!
//! - **FlatIndex**: exact vector index with a fixed similarity metric
//! - **chunk_store**: line-delimited chunk records
//! - **StorageManager**: generations, atomic swap, build locking
//! - **MetadataValidator**: consistency reports
//!
//! # Collection Storage Structure
//!
//! ```text
//! {storage_root}/collections/
//! ├── {course}/
//! │   ├── CURRENT                 # live generation name
//! │   └── generations/
//! │       ├── {generation}/
//! │       │   ├── index.vec       # header + N vectors
//! │       │   ├── chunks.jsonl    # N records, chunk_id == line
//! │       │   └── meta.json       # collection metadata
//! │       └── {previous}/         # kept for in-flight readers
//! ```

pub mod chunk_store;
mod collection;
mod validator;
pub mod vector_index;

pub use collection::{
    validate_collection_id, ChunkingConfig, CollectionHandle, CollectionMetadata, StorageManager,
    SCHEMA_VERSION,
};
pub use validator::{MetadataValidator, ValidationReport};
pub use vector_index::FlatIndex;
