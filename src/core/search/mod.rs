//! Search module for embedding similarity retrieval.
//!
//! This module answers queries against built collections, reusing
//! loaded collections through a generation-aware handle cache.

mod cache;
mod retriever;

pub use cache::HandleCache;
pub use retriever::Retriever;
