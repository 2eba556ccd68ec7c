//! Retrieve command - similarity search over a course collection

use crate::cli::output::{colors, truncate_line};
use crate::cli::OutputFormat;
use crate::core::services::Services;
use crate::core::types::{QueryResults, ScoredChunk};
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the retrieve command
#[derive(Args, Debug)]
pub struct RetrieveArgs {
    /// Query text; pass several to retrieve for each independently
    #[arg(required = true)]
    pub queries: Vec<String>,

    /// Course collection to search
    #[arg(long, short = 'c')]
    pub course: String,

    /// Results per query (default from config)
    #[arg(long, short = 'k')]
    pub top_k: Option<usize>,

    /// Only show citations (no passage text)
    #[arg(long)]
    pub citations_only: bool,
}

/// Retrieval result item
#[derive(Debug, Serialize)]
pub struct RetrieveResultItem {
    pub rank: usize,
    pub score: f32,
    pub chunk_id: usize,
    pub page_start: u32,
    pub page_end: u32,
    pub citation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Results for one query
#[derive(Debug, Serialize)]
pub struct RetrieveQueryOutput {
    pub query: String,
    pub count: usize,
    pub results: Vec<RetrieveResultItem>,
}

/// Retrieve response
#[derive(Debug, Serialize)]
pub struct RetrieveResponseOutput {
    pub course: String,
    pub queries: Vec<RetrieveQueryOutput>,
}

fn to_item(scored: &ScoredChunk, citations_only: bool) -> RetrieveResultItem {
    RetrieveResultItem {
        rank: scored.rank,
        score: scored.score,
        chunk_id: scored.chunk.chunk_id,
        page_start: scored.chunk.page_start,
        page_end: scored.chunk.page_end,
        citation: scored.chunk.citation(),
        text: (!citations_only).then(|| scored.chunk.text.clone()),
    }
}

fn to_output(results: QueryResults, citations_only: bool) -> RetrieveQueryOutput {
    RetrieveQueryOutput {
        count: results.results.len(),
        results: results
            .results
            .iter()
            .map(|r| to_item(r, citations_only))
            .collect(),
        query: results.query,
    }
}

/// Execute the retrieve command
pub async fn execute(
    args: RetrieveArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let search_services = Arc::clone(services);
    let course = args.course.clone();
    let queries = args.queries.clone();
    let top_k = args.top_k;

    let results = tokio::task::spawn_blocking(move || {
        if let [query] = queries.as_slice() {
            search_services
                .retrieve(&course, query, top_k)
                .map(|response| {
                    vec![QueryResults {
                        query: response.query,
                        results: response.results,
                    }]
                })
        } else {
            search_services.retrieve_many(&course, &queries, top_k)
        }
    })
    .await?
    .map_err(|e| {
        if e.is_not_found() {
            format!(
                "{e}. Run 'coursealign list-courses' to see indexed courses, \
                 or 'coursealign index-textbook' to build this one."
            )
        } else {
            e.to_string()
        }
    })?;

    let output = RetrieveResponseOutput {
        course: args.course.clone(),
        queries: results
            .into_iter()
            .map(|r| to_output(r, args.citations_only))
            .collect(),
    };

    match format {
        OutputFormat::Human => {
            for query in &output.queries {
                if output.queries.len() > 1 {
                    println!("{} {}", colors::label("Query:"), query.query);
                }
                if query.results.is_empty() {
                    println!(
                        "No passages found in '{}'",
                        colors::course_id(&output.course)
                    );
                    continue;
                }
                println!(
                    "Found {} passage(s) in '{}':\n",
                    colors::number(&query.count.to_string()),
                    colors::course_id(&output.course)
                );
                for result in &query.results {
                    println!(
                        "[{}] {} {}",
                        colors::rank(&result.rank.to_string()),
                        colors::citation(&result.citation),
                        colors::dim(&format!("(score: {:.3})", result.score))
                    );
                    if let Some(text) = &result.text {
                        println!("    {}", colors::dim(&truncate_line(text, 300)));
                    }
                    println!();
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
