// Integration tests for document loading and page extraction

use crate::common::{create_test_services, TestTextbook};
use coursealign::core::error::CourseAlignError;
use coursealign::core::indexer::extractor::extract;
use coursealign::core::indexer::{Document, DocumentFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};

/// Minimal PDF with one text line per page
fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for line in lines {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}

#[test]
fn test_pdf_pages_numbered_from_one() {
    let bytes = pdf_with_pages(&["chlorophyll absorbs light", "spindle fibres attach"]);
    let document = Document::new("bio.pdf", DocumentFormat::Pdf, bytes);

    let pages = extract(&document).unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].page_number, 1);
    assert_eq!(pages[1].page_number, 2);
    assert!(pages[0].text.contains("chlorophyll"));
    assert!(pages[1].text.contains("spindle"));
}

#[test]
fn test_pdf_file_builds_collection() {
    let (services, _temp) = create_test_services();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bio.pdf");
    std::fs::write(&path, pdf_with_pages(&["osmosis", "diffusion"])).unwrap();

    let document = Document::from_path(&path, 10).unwrap();
    let summary = services.build("BIO200", &document).unwrap();

    assert_eq!(summary.pages_indexed, 2);
    assert_eq!(summary.chunks_indexed, 1);
    let metadata = services.storage.get_collection_metadata("BIO200").unwrap();
    assert_eq!(metadata.source_document, "bio.pdf");
}

#[test]
fn test_text_export_pages() {
    let book = TestTextbook::with_pages("book.txt", &["first page", "", "third page"]);
    let document = Document::from_path(book.path(), 10).unwrap();

    let pages = extract(&document).unwrap();

    assert_eq!(pages.len(), 3);
    assert_eq!(pages[2].page_number, 3);
    assert_eq!(pages[2].text, "third page");
}

#[test]
fn test_markdown_is_text() {
    let book = TestTextbook::with_pages("notes.md", &["# Cells\n\nThe cell is the unit of life."]);
    let document = Document::from_path(book.path(), 10).unwrap();
    assert_eq!(document.format, DocumentFormat::Text);
}

#[test]
fn test_unsupported_extension() {
    let book = TestTextbook::with_pages("slides.pptx", &["binary"]);
    let err = Document::from_path(book.path(), 10).unwrap_err();
    assert!(matches!(err, CourseAlignError::Extraction(_)));
}

#[test]
fn test_corrupt_pdf_fails_build() {
    let (services, _temp) = create_test_services();
    let document = Document::new("broken.pdf", DocumentFormat::Pdf, b"%PDF-1.4 garbage".to_vec());

    let err = services.build("BIO200", &document).unwrap_err();

    assert!(matches!(err, CourseAlignError::Extraction(_)));
    assert!(!services.storage.collection_exists("BIO200"));
}

#[test]
fn test_blank_document_fails_build() {
    let (services, _temp) = create_test_services();
    let document = Document::from_pages("blank.txt", &["   ", "\n\n"]);

    let err = services.build("BIO200", &document).unwrap_err();

    assert!(matches!(err, CourseAlignError::Extraction(_)));
    assert!(err.is_bad_request());
}
