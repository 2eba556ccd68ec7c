//! Course commands - list courses, show collection info
//!
//! - `list-courses`: registered courses merged with indexed collections
//! - `get-course-info`: metadata of one indexed collection

use crate::cli::output::{colors, format_bytes, format_relative_time};
use crate::cli::OutputFormat;
use crate::core::services::Services;
use crate::core::types::CourseStatus;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for list-courses
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show courses with a live index
    #[arg(long)]
    pub indexed: bool,
}

/// Arguments for get-course-info
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Course code
    pub course: String,
}

/// Course list response
#[derive(Debug, Serialize)]
pub struct CourseListResponse {
    pub count: usize,
    pub courses: Vec<CourseStatus>,
}

/// Detailed collection info
#[derive(Debug, Serialize)]
pub struct CourseInfoResponse {
    pub course: String,
    pub title: Option<String>,
    pub source_document: String,
    pub pages: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub embedding_model: String,
    pub metric: String,
    pub size_bytes: u64,
    pub created_at: String,
    pub indexed_at: String,
    pub generation: String,
    pub chunking: ChunkingInfo,
}

#[derive(Debug, Serialize)]
pub struct ChunkingInfo {
    pub chunk_words: usize,
    pub overlap_words: usize,
}

/// Execute list-courses command
pub async fn execute_list(
    args: ListArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut courses = services.course_statuses()?;
    if args.indexed {
        courses.retain(|c| c.indexed);
    }

    let response = CourseListResponse {
        count: courses.len(),
        courses,
    };

    match format {
        OutputFormat::Human => {
            if response.courses.is_empty() {
                println!(
                    "No courses found. Run '{}' to index a textbook.",
                    colors::label("coursealign index-textbook <path> -c <course>")
                );
            } else {
                println!(
                    "{} ({}):",
                    colors::label("Courses"),
                    colors::number(&response.count.to_string())
                );
                for course in &response.courses {
                    let status = match course.chunks {
                        Some(chunks) => format!(
                            "{} chunks",
                            colors::number(&chunks.to_string())
                        ),
                        None => colors::warning("not indexed").to_string(),
                    };
                    let registry = if course.registered {
                        String::new()
                    } else {
                        colors::dim(" (unregistered)").to_string()
                    };
                    println!(
                        "  {:<12} {:<36} {}{}",
                        colors::course_id(&course.course_code),
                        course.title.as_deref().unwrap_or("-"),
                        status,
                        registry
                    );
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Execute get-course-info command
pub async fn execute_info(
    args: InfoArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = services
        .storage
        .get_collection_metadata(&args.course)
        .map_err(|e| {
            if e.is_not_found() {
                format!(
                    "Course '{}' is not indexed. Run 'coursealign list-courses' to see indexed courses.",
                    args.course
                )
            } else {
                e.to_string()
            }
        })?;

    let response = CourseInfoResponse {
        title: services.config.course_title(&metadata.id).map(str::to_string),
        course: metadata.id,
        source_document: metadata.source_document,
        pages: metadata.pages_indexed,
        chunks: metadata.chunks_indexed,
        dimension: metadata.dimension,
        embedding_model: metadata.embedding_model,
        metric: metadata.metric.to_string(),
        size_bytes: metadata.index_size_bytes,
        created_at: metadata.created_at.to_rfc3339(),
        indexed_at: metadata.last_indexed_at.to_rfc3339(),
        generation: metadata.generation,
        chunking: ChunkingInfo {
            chunk_words: metadata.chunking.chunk_words,
            overlap_words: metadata.chunking.overlap_words,
        },
    };

    match format {
        OutputFormat::Human => {
            println!(
                "{}: {}",
                colors::label("Course"),
                colors::course_id(&response.course)
            );
            if let Some(title) = &response.title {
                println!("  {}: {}", colors::label("Title"), title);
            }
            println!(
                "  {}: {}",
                colors::label("Source"),
                colors::file_path(&response.source_document)
            );
            println!(
                "  {}: {} pages, {} chunks",
                colors::label("Indexed"),
                colors::number(&response.pages.to_string()),
                colors::number(&response.chunks.to_string())
            );
            println!(
                "  {}: {} (dim {}, {})",
                colors::label("Embedding"),
                response.embedding_model,
                response.dimension,
                response.metric
            );
            println!(
                "  {}: {} words, {} overlap",
                colors::label("Chunking"),
                response.chunking.chunk_words,
                response.chunking.overlap_words
            );
            println!(
                "  {}: {}",
                colors::label("Size"),
                colors::number(&format_bytes(response.size_bytes))
            );
            println!(
                "  {}: {} ({})",
                colors::label("Last indexed"),
                response.indexed_at,
                format_relative_time(&metadata.last_indexed_at)
            );
            println!(
                "  {}: {}",
                colors::label("Generation"),
                colors::dim(&response.generation)
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
