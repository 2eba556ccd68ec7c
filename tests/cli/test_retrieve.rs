//! Tests for retrieve CLI command
//!
//! - Single and multiple queries
//! - Citation-only output
//! - Error cases (unknown course, zero k, blank query)

use crate::cli::test_helpers::{create_cli_test_services, setup_indexed_course};
use coursealign::cli::commands::retrieve::{execute, RetrieveArgs};
use coursealign::cli::OutputFormat;

fn args(queries: &[&str], course: &str, top_k: Option<usize>) -> RetrieveArgs {
    RetrieveArgs {
        queries: queries.iter().map(|q| q.to_string()).collect(),
        course: course.to_string(),
        top_k,
        citations_only: false,
    }
}

#[tokio::test]
async fn test_retrieve_human() {
    let (services, _temp) = setup_indexed_course("BIO200");

    let result = execute(
        args(&["chlorophyll"], "BIO200", Some(3)),
        &services,
        OutputFormat::Human,
    )
    .await;

    assert!(result.is_ok(), "Retrieve should succeed: {:?}", result.err());
}

#[tokio::test]
async fn test_retrieve_json_many_queries() {
    let (services, _temp) = setup_indexed_course("BIO200");

    let result = execute(
        args(&["chlorophyll", "spindle", "catalyst"], "BIO200", Some(2)),
        &services,
        OutputFormat::Json,
    )
    .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_retrieve_citations_only() {
    let (services, _temp) = setup_indexed_course("BIO200");
    let mut retrieve_args = args(&["glucose"], "BIO200", None);
    retrieve_args.citations_only = true;

    assert!(execute(retrieve_args, &services, OutputFormat::Human)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_retrieve_unknown_course() {
    let (services, _temp) = create_cli_test_services();

    let err = execute(args(&["anything"], "HIS300", None), &services, OutputFormat::Human)
        .await
        .unwrap_err()
        .to_string();

    assert!(err.contains("list-courses"), "unexpected error: {err}");
}

#[tokio::test]
async fn test_retrieve_zero_k() {
    let (services, _temp) = setup_indexed_course("BIO200");

    let result = execute(args(&["glucose"], "BIO200", Some(0)), &services, OutputFormat::Json).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_retrieve_blank_query() {
    let (services, _temp) = setup_indexed_course("BIO200");

    let result = execute(args(&["  "], "BIO200", Some(3)), &services, OutputFormat::Json).await;

    assert!(result.is_err());
}
