//! PDF extraction against documents built in-memory with lopdf.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use plagiscope_common::PlagiscopeError;
use plagiscope_ingestion::{extract_text, UploadedFile};

/// Build a PDF with one page per entry; each page shows its lines via Tj.
fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
        ];
        for line in *lines {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
        }
        operations.push(Operation::new("ET", vec![]));
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
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

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

#[test]
fn test_pdf_pages_are_extracted_in_order() {
    let bytes = build_pdf(&[&["First", "page"], &["Second", "page"]]);
    let file = UploadedFile::new("essay.pdf", Some("application/pdf".to_string()), bytes);

    let text = extract_text(&file).unwrap();
    let first = text.find("First").expect("first page text");
    let second = text.find("Second").expect("second page text");
    assert!(first < second);
    assert!(text.contains("\n\n"), "pages are separated by a blank line: {text:?}");
}

#[test]
fn test_pdf_without_text_is_rejected() {
    let bytes = build_pdf(&[&[]]);
    let file = UploadedFile::new("scan.pdf", Some("application/pdf".to_string()), bytes);

    let err = extract_text(&file).unwrap_err();
    assert!(matches!(err, PlagiscopeError::Extraction(_)));
    assert!(err.user_message().contains("text-based"));
}

#[tokio::test]
async fn test_async_extraction_matches_sync() {
    let bytes = build_pdf(&[&["Async", "extraction"]]);
    let file = UploadedFile::new("a.pdf", None, bytes);

    let sync_text = extract_text(&file).unwrap();
    let async_text = plagiscope_ingestion::extract_text_async(file).await.unwrap();
    assert_eq!(sync_text, async_text);
}
