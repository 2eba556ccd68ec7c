//! Embedding providers.
//!
//! The same provider (and model) must embed both the chunks at
//! build time and the queries at retrieval time. Providers are
//! synchronous; async callers run them on a blocking thread.
//!
//! - **openai**: OpenAI-compatible `/embeddings` HTTP endpoint
//! - **hashing**: deterministic local feature hashing

pub mod hashing;
pub mod openai;

use std::sync::Arc;

use crate::core::config::{EmbeddingConfig, EmbeddingProvider};
use crate::core::error::{CourseAlignError, Result};

pub use hashing::HashingEmbedder;
pub use openai::OpenAiEmbedder;

/// Maps texts to fixed-dimension vectors
pub trait Embedder: Send + Sync {
    /// Model identifier recorded with every build
    fn model_name(&self) -> &str;

    /// Embed texts, one vector per input in input order
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| CourseAlignError::Embedding("Provider returned no vector".to_string()))
    }
}

/// Build the embedder selected by configuration
pub fn from_config(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider {
        EmbeddingProvider::OpenAi => Ok(Arc::new(OpenAiEmbedder::from_config(config)?)),
        EmbeddingProvider::Hashing => {
            if config.hashing_dimension == 0 {
                return Err(CourseAlignError::ConfigError(
                    "Hashing dimension must be non-zero".to_string(),
                ));
            }
            Ok(Arc::new(HashingEmbedder::new(config.hashing_dimension)))
        }
    }
}

/// Check provider output: one vector per input, one shared non-zero
/// dimension, finite components
pub fn check_vectors(vectors: &[Vec<f32>], expected: usize) -> Result<usize> {
    if vectors.len() != expected {
        return Err(CourseAlignError::Embedding(format!(
            "Mismatch between request and response counts: {} vs {}",
            expected,
            vectors.len()
        )));
    }

    let dimension = vectors.first().map(|v| v.len()).unwrap_or(0);
    if expected > 0 && dimension == 0 {
        return Err(CourseAlignError::Embedding(
            "Provider returned empty vectors".to_string(),
        ));
    }

    for (i, vector) in vectors.iter().enumerate() {
        if vector.len() != dimension {
            return Err(CourseAlignError::Embedding(format!(
                "Vector {} has dimension {}, expected {}",
                i,
                vector.len(),
                dimension
            )));
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(CourseAlignError::Embedding(format!(
                "Vector {i} contains non-finite values"
            )));
        }
    }

    Ok(dimension)
}
