//! Config command - show current configuration

use crate::cli::OutputFormat;
use crate::core::services::Services;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Also list the course registry
    #[arg(long, short = 'a')]
    pub all: bool,
}

/// Configuration response
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub index_dir: String,
    pub config_file: String,
    pub indexing: IndexingInfo,
    pub embedding: EmbeddingInfo,
    pub search: SearchInfo,
    pub build_timeout_sec: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courses: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct IndexingInfo {
    pub chunk_words: usize,
    pub overlap_words: usize,
    pub max_document_size_mb: usize,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingInfo {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub api_key_env: String,
    pub api_key_set: bool,
    pub batch_size: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchInfo {
    pub default_k: usize,
    pub max_query_length: usize,
    pub metric: String,
}

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = &services.config;
    let xdg = crate::core::xdg::XdgDirs::new();

    let response = ConfigResponse {
        index_dir: services.storage.storage_root().to_string_lossy().into_owned(),
        config_file: xdg.config_file().to_string_lossy().into_owned(),
        indexing: IndexingInfo {
            chunk_words: config.indexing.chunk_words,
            overlap_words: config.indexing.overlap_words,
            max_document_size_mb: config.indexing.max_document_size_mb,
        },
        embedding: EmbeddingInfo {
            provider: config.embedding.provider.to_string(),
            model: services.embedder.model_name().to_string(),
            base_url: config.embedding.base_url.clone(),
            api_key_env: config.embedding.api_key_env.clone(),
            api_key_set: std::env::var(&config.embedding.api_key_env).is_ok(),
            batch_size: config.embedding.batch_size,
        },
        search: SearchInfo {
            default_k: config.search.default_k,
            max_query_length: config.search.max_query_length,
            metric: config.search.metric.to_string(),
        },
        build_timeout_sec: config.limits.build_timeout_sec,
        courses: args.all.then(|| config.courses.keys().cloned().collect()),
    };

    match format {
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  index_dir: {}", response.index_dir);
            println!("  config_file: {}", response.config_file);
            println!("  indexing:");
            println!("    chunk_words: {}", response.indexing.chunk_words);
            println!("    overlap_words: {}", response.indexing.overlap_words);
            println!(
                "    max_document_size_mb: {}",
                response.indexing.max_document_size_mb
            );
            println!("  embedding:");
            println!("    provider: {}", response.embedding.provider);
            println!("    model: {}", response.embedding.model);
            println!("    base_url: {}", response.embedding.base_url);
            println!(
                "    api_key_env: {} ({})",
                response.embedding.api_key_env,
                if response.embedding.api_key_set {
                    "set"
                } else {
                    "unset"
                }
            );
            println!("    batch_size: {}", response.embedding.batch_size);
            println!("  search:");
            println!("    default_k: {}", response.search.default_k);
            println!("    max_query_length: {}", response.search.max_query_length);
            println!("    metric: {}", response.search.metric);
            println!("  build_timeout_sec: {}", response.build_timeout_sec);
            if let Some(courses) = &response.courses {
                println!("  courses: {}", courses.join(", "));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
