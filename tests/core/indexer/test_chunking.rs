// Integration tests for chunking through a full build

use crate::common::{build_from_pages, build_numbered, create_test_services, numbered_words};
use coursealign::core::indexer::{Chunker, Document};
use coursealign::core::types::PageText;

#[test]
fn test_1800_words_build_four_chunks() {
    let (services, _temp) = create_test_services();

    let summary = build_numbered(&services, "CS101", 1800);

    assert_eq!(summary.chunks_indexed, 4);
    assert_eq!(summary.pages_indexed, 1);

    let handle = services.retriever.load("CS101").unwrap();
    let counts: Vec<usize> = handle.chunks.iter().map(|c| c.word_count).collect();
    assert_eq!(counts, vec![600, 600, 600, 450]);
}

#[test]
fn test_consecutive_chunks_share_overlap() {
    let (services, _temp) = create_test_services();
    build_numbered(&services, "CS101", 2000);

    let handle = services.retriever.load("CS101").unwrap();
    for pair in handle.chunks.windows(2) {
        let left: Vec<&str> = pair[0].text.split(' ').collect();
        let right: Vec<&str> = pair[1].text.split(' ').collect();
        assert_eq!(&left[left.len() - 150..], &right[..150]);
    }
}

#[test]
fn test_chunk_ids_dense_and_ordered() {
    let (services, _temp) = create_test_services();
    build_numbered(&services, "CS101", 5000);

    let handle = services.retriever.load("CS101").unwrap();
    for (i, chunk) in handle.chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_id, i);
        assert_eq!(chunk.collection_id, "CS101");
    }
    assert_eq!(handle.index.len(), handle.chunks.len());
}

#[test]
fn test_expected_chunk_count_formula() {
    let chunker = Chunker::new(600, 150);

    for words in [1, 599, 600, 601, 1050, 1051, 1800, 10_000] {
        let pages = vec![PageText::new(1, numbered_words("w", 0, words))];
        assert_eq!(
            chunker.chunk_pages(&pages).len(),
            chunker.expected_chunks(words),
            "chunk count for {words} words"
        );
    }
}

#[test]
fn test_page_ranges_cover_boundaries() {
    let (services, _temp) = create_test_services();
    let pages = vec![
        numbered_words("a", 0, 500),
        numbered_words("b", 0, 500),
        numbered_words("c", 0, 500),
    ];
    build_from_pages(&services, "BIO200", &pages);

    let handle = services.retriever.load("BIO200").unwrap();
    let ranges: Vec<(u32, u32)> = handle
        .chunks
        .iter()
        .map(|c| (c.page_start, c.page_end))
        .collect();

    // Windows [0, 600), [450, 1050), [900, 1500) over 500-word pages
    assert_eq!(ranges, vec![(1, 2), (1, 3), (2, 3)]);
    assert_eq!(handle.chunks[0].citation(), "pp. 1-2");
}

#[test]
fn test_short_document_single_chunk() {
    let (services, _temp) = create_test_services();

    let summary = build_numbered(&services, "CS101", 42);

    assert_eq!(summary.chunks_indexed, 1);
    let handle = services.retriever.load("CS101").unwrap();
    assert_eq!(handle.chunks[0].word_count, 42);
    assert_eq!(handle.chunks[0].citation(), "p. 1");
}

#[test]
fn test_build_window_override() {
    let (services, _temp) = create_test_services();
    let pipeline = services.create_pipeline(Some(900), Some(0)).unwrap();
    let document = Document::from_pages("book.txt", &[numbered_words("w", 0, 1800)]);

    let summary = services
        .build_with("CS101", &document, &pipeline, &Default::default())
        .unwrap();

    assert_eq!(summary.chunks_indexed, 2);
    let metadata = services.storage.get_collection_metadata("CS101").unwrap();
    assert_eq!(metadata.chunking.chunk_words, 900);
    assert_eq!(metadata.chunking.overlap_words, 0);
}

#[test]
fn test_window_outside_bounds_rejected() {
    let (services, _temp) = create_test_services();

    assert!(services.create_pipeline(Some(599), None).is_err());
    assert!(services.create_pipeline(Some(901), None).is_err());
    assert!(services.create_pipeline(Some(600), Some(600)).is_err());
}
