//! Tests for verify-course CLI command

use crate::cli::test_helpers::setup_indexed_course;
use coursealign::cli::commands::verify::{execute, VerifyArgs};
use coursealign::cli::OutputFormat;

#[tokio::test]
async fn test_verify_consistent_course() {
    let (services, _temp) = setup_indexed_course("BIO200");

    let result = execute(
        VerifyArgs {
            course: Some("BIO200".to_string()),
        },
        &services,
        OutputFormat::Human,
    )
    .await;

    assert!(result.is_ok(), "Verify should succeed: {:?}", result.err());
}

#[tokio::test]
async fn test_verify_all_json() {
    let (services, _temp) = setup_indexed_course("BIO200");

    let result = execute(VerifyArgs { course: None }, &services, OutputFormat::Json).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_verify_detects_damage() {
    let (services, _temp) = setup_indexed_course("BIO200");
    let (_, chunks_path, _) = services.storage.artifact_paths("BIO200").unwrap();
    std::fs::write(&chunks_path, "").unwrap();

    let err = execute(VerifyArgs { course: None }, &services, OutputFormat::Human)
        .await
        .unwrap_err()
        .to_string();

    assert!(err.contains("inconsistent"), "unexpected error: {err}");
}
