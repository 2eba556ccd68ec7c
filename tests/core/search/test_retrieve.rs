// Integration tests for ranked retrieval

use crate::common::{
    build_from_pages, build_numbered, create_test_services, create_test_services_with,
    topic_pages, ConstantEmbedder,
};
use coursealign::core::error::CourseAlignError;
use std::sync::Arc;

#[test]
fn test_top_k_limits_results() {
    let (services, _temp) = create_test_services();
    build_numbered(&services, "CS101", 1800);

    let response = services.retrieve("CS101", "w1 w2 w3", Some(2)).unwrap();

    assert_eq!(response.count, 2);
    assert_eq!(response.results.len(), 2);
    assert_eq!(response.collection_id, "CS101");
    assert_eq!(response.query, "w1 w2 w3");
}

#[test]
fn test_top_k_above_collection_size_returns_all() {
    let (services, _temp) = create_test_services();
    build_numbered(&services, "CS101", 1800);

    let response = services.retrieve("CS101", "w5", Some(100)).unwrap();

    assert_eq!(response.count, 4);
    let mut ids: Vec<usize> = response.results.iter().map(|r| r.chunk.chunk_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 2, 3]);
}

#[test]
fn test_default_k_from_config() {
    let (services, _temp) = create_test_services();
    build_numbered(&services, "CS101", 9000);

    let response = services.retrieve("CS101", "w100", None).unwrap();

    assert_eq!(response.count, services.config.search.default_k);
}

#[test]
fn test_topic_query_cites_topic_page() {
    let (services, _temp) = create_test_services();
    build_from_pages(&services, "BIO200", &topic_pages(700));

    let photosynthesis = services
        .retrieve("BIO200", "chlorophyll sunlight", Some(1))
        .unwrap();
    assert_eq!(photosynthesis.results[0].chunk.citation(), "p. 1");

    let enzymes = services
        .retrieve("BIO200", "enzyme substrate catalyst", Some(1))
        .unwrap();
    assert_eq!(enzymes.results[0].chunk.citation(), "p. 3");

    let mitosis = services
        .retrieve("BIO200", "mitosis spindle", Some(1))
        .unwrap();
    let chunk = &mitosis.results[0].chunk;
    assert!(chunk.page_start <= 2 && chunk.page_end >= 2);
}

#[test]
fn test_scores_descend_and_ranks_are_sequential() {
    let (services, _temp) = create_test_services();
    build_from_pages(&services, "BIO200", &topic_pages(700));

    let response = services
        .retrieve("BIO200", "glucose stomata", Some(10))
        .unwrap();

    for (i, result) in response.results.iter().enumerate() {
        assert_eq!(result.rank, i + 1);
    }
    for pair in response.results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn test_equal_scores_ordered_by_chunk_id() {
    let (services, _temp) = create_test_services_with(Arc::new(ConstantEmbedder { dimension: 8 }));
    build_numbered(&services, "CS101", 4650);

    let response = services.retrieve("CS101", "anything", Some(5)).unwrap();

    let ids: Vec<usize> = response.results.iter().map(|r| r.chunk.chunk_id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    assert!(response
        .results
        .iter()
        .all(|r| r.score == response.results[0].score));
}

#[test]
fn test_repeated_query_is_identical() {
    let (services, _temp) = create_test_services();
    build_from_pages(&services, "BIO200", &topic_pages(700));

    let first = services.retrieve("BIO200", "telophase", Some(5)).unwrap();
    let second = services.retrieve("BIO200", "telophase", Some(5)).unwrap();

    let project = |r: &coursealign::RetrievalResponse| -> Vec<(usize, f32)> {
        r.results.iter().map(|s| (s.chunk.chunk_id, s.score)).collect()
    };
    assert_eq!(project(&first), project(&second));
}

#[test]
fn test_zero_top_k_rejected() {
    let (services, _temp) = create_test_services();
    build_numbered(&services, "CS101", 700);

    let err = services.retrieve("CS101", "w1", Some(0)).unwrap_err();

    assert!(matches!(err, CourseAlignError::InvalidQuery(_)));
    assert!(err.is_bad_request());
}

#[test]
fn test_blank_query_rejected() {
    let (services, _temp) = create_test_services();
    build_numbered(&services, "CS101", 700);

    for query in ["", "   ", "\n\t"] {
        let err = services.retrieve("CS101", query, Some(3)).unwrap_err();
        assert!(matches!(err, CourseAlignError::InvalidQuery(_)));
    }
}

#[test]
fn test_invalid_query_checked_before_collection() {
    let (services, _temp) = create_test_services();

    // Collection does not exist, but the query is rejected first
    let err = services.retrieve("CS101", "", Some(3)).unwrap_err();
    assert!(matches!(err, CourseAlignError::InvalidQuery(_)));
}

#[test]
fn test_invalid_query_list_checked_before_collection() {
    let (services, _temp) = create_test_services();

    let blank = vec!["chlorophyll".to_string(), "   ".to_string()];
    let err = services.retrieve_many("CS101", &blank, Some(3)).unwrap_err();
    assert!(matches!(err, CourseAlignError::InvalidQuery(_)));
    assert!(err.is_bad_request());

    let err = services.retrieve_many("CS101", &[], Some(3)).unwrap_err();
    assert!(matches!(err, CourseAlignError::InvalidQuery(_)));

    let queries = vec!["chlorophyll".to_string()];
    let err = services.retrieve_many("CS101", &queries, Some(0)).unwrap_err();
    assert!(matches!(err, CourseAlignError::InvalidQuery(_)));

    // Valid input reaches the missing collection
    let err = services.retrieve_many("CS101", &queries, Some(3)).unwrap_err();
    assert!(matches!(err, CourseAlignError::CollectionNotFound(_)));
}

#[test]
fn test_overlong_query_rejected() {
    let (services, _temp) = create_test_services();
    build_numbered(&services, "CS101", 700);

    let query = "a".repeat(services.config.search.max_query_length + 1);
    let err = services.retrieve("CS101", &query, Some(3)).unwrap_err();
    assert!(matches!(err, CourseAlignError::InvalidQuery(_)));
}

#[test]
fn test_retrieve_many_matches_single_queries() {
    let (services, _temp) = create_test_services();
    build_from_pages(&services, "BIO200", &topic_pages(700));

    let queries = vec!["chlorophyll".to_string(), "inhibitor".to_string()];
    let batch = services.retrieve_many("BIO200", &queries, Some(2)).unwrap();

    assert_eq!(batch.len(), 2);
    for (results, query) in batch.iter().zip(&queries) {
        assert_eq!(&results.query, query);
        let single = services.retrieve("BIO200", query, Some(2)).unwrap();
        let batch_ids: Vec<usize> = results.results.iter().map(|r| r.chunk.chunk_id).collect();
        let single_ids: Vec<usize> = single.results.iter().map(|r| r.chunk.chunk_id).collect();
        assert_eq!(batch_ids, single_ids);
    }
}

#[test]
fn test_retrieve_many_rejects_empty_list() {
    let (services, _temp) = create_test_services();
    build_numbered(&services, "CS101", 700);

    let err = services.retrieve_many("CS101", &[], Some(2)).unwrap_err();
    assert!(matches!(err, CourseAlignError::InvalidQuery(_)));
}

#[test]
fn test_results_carry_citation_fields() {
    let (services, _temp) = create_test_services();
    build_from_pages(&services, "BIO200", &topic_pages(700));

    let response = services.retrieve("BIO200", "catalyst", Some(5)).unwrap();

    for result in &response.results {
        let chunk = &result.chunk;
        assert_eq!(chunk.collection_id, "BIO200");
        assert!(chunk.page_start >= 1);
        assert!(chunk.page_start <= chunk.page_end);
        assert!(chunk.page_end <= 3);
        assert!(!chunk.text.is_empty());
    }
}
