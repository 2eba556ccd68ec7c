//! Tests for list-courses and get-course-info CLI commands

use crate::cli::test_helpers::{create_cli_test_services, setup_indexed_course};
use coursealign::cli::commands::courses::{execute_info, execute_list, InfoArgs, ListArgs};
use coursealign::cli::OutputFormat;

#[tokio::test]
async fn test_list_courses_empty() {
    let (services, _temp) = create_cli_test_services();

    let result = execute_list(ListArgs { indexed: false }, &services, OutputFormat::Human).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_list_courses_with_collection() {
    let (services, _temp) = setup_indexed_course("BIO200");

    for format in [OutputFormat::Human, OutputFormat::Json] {
        let result = execute_list(ListArgs { indexed: true }, &services, format).await;
        assert!(result.is_ok());
    }

    let statuses = services.course_statuses().unwrap();
    assert_eq!(statuses.len(), 1);
    assert!(statuses[0].indexed);
}

#[tokio::test]
async fn test_course_info() {
    let (services, _temp) = setup_indexed_course("BIO200");

    for format in [OutputFormat::Human, OutputFormat::Json] {
        let result = execute_info(
            InfoArgs {
                course: "BIO200".to_string(),
            },
            &services,
            format,
        )
        .await;
        assert!(result.is_ok(), "Info should succeed: {:?}", result.err());
    }
}

#[tokio::test]
async fn test_course_info_not_indexed() {
    let (services, _temp) = create_cli_test_services();

    let err = execute_info(
        InfoArgs {
            course: "HIS300".to_string(),
        },
        &services,
        OutputFormat::Human,
    )
    .await
    .unwrap_err()
    .to_string();

    assert!(err.contains("not indexed"), "unexpected error: {err}");
}
