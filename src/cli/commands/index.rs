//! Index command - build a course collection from a textbook

use crate::cli::output::{colors, format_duration};
use crate::cli::OutputFormat;
use crate::core::indexer::{BuildOptions, CancelFlag, Document};
use crate::core::services::Services;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the index command
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Path to the textbook (.pdf, .txt, .md)
    pub path: PathBuf,

    /// Course code the collection is stored under
    #[arg(long, short = 'c')]
    pub course: String,

    /// Words per chunk (600-900, default from config)
    #[arg(long)]
    pub chunk_words: Option<usize>,

    /// Words shared by consecutive chunks (default from config)
    #[arg(long)]
    pub overlap_words: Option<usize>,

    /// Suppress progress output
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

/// Indexing result response
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub course: String,
    pub path: String,
    pub pages_indexed: usize,
    pub chunks_indexed: usize,
    pub dimension: usize,
    pub generation: String,
    pub duration_secs: f64,
}

/// Execute the index command
pub async fn execute(
    args: IndexArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.path.canonicalize().map_err(|e| {
        format!(
            "Invalid path '{}': {}. Make sure the file exists and is accessible.",
            args.path.display(),
            e
        )
    })?;

    if !path.is_file() {
        return Err(format!(
            "Path '{}' is not a file. Pass the textbook PDF or text export.",
            path.display()
        )
        .into());
    }

    services.check_course(&args.course)?;
    let pipeline = services.create_pipeline(args.chunk_words, args.overlap_words)?;
    let document = Document::from_path(&path, services.config.indexing.max_document_size_mb)?;

    if !args.quiet && format == OutputFormat::Human {
        eprintln!(
            "Indexing {} as '{}' ({} words, {} overlap)...",
            colors::file_path(&path.display().to_string()),
            colors::course_id(&args.course),
            pipeline.chunker().chunk_words(),
            pipeline.chunker().overlap_words()
        );
    }

    let cancel = CancelFlag::new();
    let options = BuildOptions::default().with_cancel(cancel.clone());
    let build_services = Arc::clone(services);
    let course = args.course.clone();
    let mut build = tokio::task::spawn_blocking(move || {
        build_services.build_with(&course, &document, &pipeline, &options)
    });

    let summary = tokio::select! {
        result = &mut build => result??,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            if format == OutputFormat::Human {
                eprintln!("{}", colors::warning("Cancelling build..."));
            }
            build.await??
        }
    };

    let response = IndexResponse {
        course: summary.collection_id,
        path: path.to_string_lossy().into_owned(),
        pages_indexed: summary.pages_indexed,
        chunks_indexed: summary.chunks_indexed,
        dimension: summary.dimension,
        generation: summary.generation,
        duration_secs: summary.duration_ms as f64 / 1000.0,
    };

    match format {
        OutputFormat::Human => {
            println!(
                "{} {} pages ({} chunks, dim {}) in {}",
                colors::success("Indexed"),
                colors::number(&response.pages_indexed.to_string()),
                colors::number(&response.chunks_indexed.to_string()),
                colors::number(&response.dimension.to_string()),
                colors::number(&format_duration(response.duration_secs))
            );
            println!("Generation: {}", colors::dim(&response.generation));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
