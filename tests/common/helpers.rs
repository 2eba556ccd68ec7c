// Test helper functions

use coursealign::core::config::{Config, EmbeddingProvider};
use coursealign::core::embedding::Embedder;
use coursealign::core::indexer::Document;
use coursealign::core::services::Services;
use coursealign::core::types::BuildSummary;
use std::sync::Arc;
use tempfile::TempDir;

use super::fixtures::numbered_words;

fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.storage.index_dir = temp_dir.path().to_path_buf();
    config.embedding.provider = EmbeddingProvider::Hashing;
    config.embedding.hashing_dimension = 128;
    config.indexing.chunk_words = 600;
    config.indexing.overlap_words = 150;
    config
}

/// Create test services backed by the hashing embedder and temporary storage
///
/// Keep the returned TempDir alive for the duration of the test.
#[allow(dead_code)]
pub fn create_test_services() -> (Arc<Services>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let services = Services::new(test_config(&temp_dir)).expect("Failed to create services");
    (Arc::new(services), temp_dir)
}

/// Create test services around a custom embedder
#[allow(dead_code)]
pub fn create_test_services_with(embedder: Arc<dyn Embedder>) -> (Arc<Services>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let services = Services::with_embedder(test_config(&temp_dir), embedder);
    (Arc::new(services), temp_dir)
}

/// Build a collection from in-memory pages
#[allow(dead_code)]
pub fn build_from_pages<S: AsRef<str>>(
    services: &Services,
    collection_id: &str,
    pages: &[S],
) -> BuildSummary {
    let document = Document::from_pages("textbook.txt", pages);
    services
        .build(collection_id, &document)
        .expect("Build should succeed")
}

/// Build a single-page collection of `words` distinct words
#[allow(dead_code)]
pub fn build_numbered(services: &Services, collection_id: &str, words: usize) -> BuildSummary {
    build_from_pages(services, collection_id, &[numbered_words("w", 0, words)])
}

/// Assert that a build summary is internally plausible
#[allow(dead_code)]
pub fn assert_valid_summary(summary: &BuildSummary) {
    assert!(
        summary.pages_indexed > 0,
        "Expected pages_indexed > 0, got {}",
        summary.pages_indexed
    );
    assert!(
        summary.chunks_indexed > 0,
        "Expected chunks_indexed > 0, got {}",
        summary.chunks_indexed
    );
    assert!(
        summary.dimension > 0,
        "Expected dimension > 0, got {}",
        summary.dimension
    );
    assert!(!summary.generation.is_empty(), "Expected a generation name");
}
