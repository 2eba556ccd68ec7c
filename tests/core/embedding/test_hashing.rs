// Integration tests for the offline hashing embedder

use coursealign::core::config::{EmbeddingConfig, EmbeddingProvider};
use coursealign::core::embedding::{self, Embedder, HashingEmbedder};

#[test]
fn test_provider_from_config() {
    let config = EmbeddingConfig {
        provider: EmbeddingProvider::Hashing,
        hashing_dimension: 64,
        ..EmbeddingConfig::default()
    };

    let embedder = embedding::from_config(&config).unwrap();

    assert_eq!(embedder.model_name(), "hashing-fnv1a-64");
    assert_eq!(embedder.embed_one("cell wall").unwrap().len(), 64);
}

#[test]
fn test_vectors_are_unit_length() {
    let embedder = HashingEmbedder::new(32);
    let texts = vec![
        "The mitochondria is the powerhouse of the cell".to_string(),
        "ATP synthase".to_string(),
    ];

    for vector in embedder.embed(&texts).unwrap() {
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}

#[test]
fn test_case_and_punctuation_insensitive() {
    let embedder = HashingEmbedder::new(64);

    let a = embedder.embed_one("Cell Membrane!").unwrap();
    let b = embedder.embed_one("cell, membrane").unwrap();

    assert_eq!(a, b);
}

#[test]
fn test_same_text_same_vector_across_instances() {
    let first = HashingEmbedder::new(128).embed_one("krebs cycle").unwrap();
    let second = HashingEmbedder::new(128).embed_one("krebs cycle").unwrap();
    assert_eq!(first, second);
}
