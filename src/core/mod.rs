//! Core domain logic (adapter-agnostic)
//!
//! This module contains all indexing and retrieval logic that is
//! independent of the command-line surface.
//!
//! # Architecture
//!
//! - **config**: Configuration loading (TOML + environment)
//! - **error**: Error types and Result alias
//! - **types**: Domain data structures
//! - **xdg**: XDG directory handling
//! - **embedding**: Embedding providers (remote API, local hashing)
//! - **indexer**: Page extraction, overlapping chunking, build pipeline
//! - **storage**: Generation-based collection storage and validation
//! - **search**: Similarity retrieval with citation metadata
//! - **services**: Unified service container

pub mod config;
pub mod embedding;
pub mod error;
pub mod indexer;
pub mod search;
pub mod services;
pub mod storage;
pub mod types;
pub mod xdg;

// Re-export key types for convenience
pub use config::Config;
pub use error::{CourseAlignError, Result};
pub use services::Services;
