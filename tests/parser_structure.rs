mod common;

use common::PdfBuilder;
use glean::{Error, Reader};

#[test]
fn rejects_non_pdf_input() {
    let err = Reader::new(b"GIF89a definitely not a pdf".to_vec()).unwrap_err();
    assert!(matches!(err, Error::Malformed(_)));
    assert!(err.to_string().contains("header"));
}

#[test]
fn rejects_missing_eof_marker() {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog >>");
    let mut data = b.finish("");
    let eof = data.len() - b"%%EOF\n".len();
    data.truncate(eof);
    let err = Reader::new(data).unwrap_err();
    assert!(matches!(err, Error::Malformed(_)));
    assert!(err.to_string().contains("%%EOF"));
}

#[test]
fn rejects_missing_startxref() {
    let data = b"%PDF-1.4\n1 0 obj null endobj\n%%EOF\n".to_vec();
    let err = Reader::new(data).unwrap_err();
    assert!(matches!(err, Error::Malformed(_)));
    assert!(err.to_string().contains("startxref"));
}

#[test]
fn open_missing_file_reports_io_error() {
    let err = Reader::open("/does/not/exist.pdf").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn trailer_traversal_is_check_free() {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    b.object(2, "<< /Type /Pages /Kids [] /Count 0 >>");
    let data = b.finish("");
    let r = Reader::new(data).expect("open");

    // Present chain.
    assert_eq!(r.trailer().key("Root").key("Type").name(), "Catalog");
    // Absent chains keep yielding null values, never panicking.
    let ghost = r.trailer().key("Nope").key("Deeper").index(3).key("More");
    assert!(ghost.is_null());
    assert_eq!(ghost.int64(), 0);
    assert_eq!(ghost.name(), "");
}

#[test]
fn zero_page_document_has_no_text() {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    b.object(2, "<< /Type /Pages /Kids [] /Count 0 >>");
    let data = b.finish("");
    let r = Reader::new(data).expect("open");
    assert_eq!(r.n_pages(), 0);
    assert!(r.text().expect("text").is_empty());
}

#[test]
fn nested_page_tree_counts_through_intermediate_nodes() {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    b.object(
        2,
        "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 3 \
         /Resources << /Font << /F1 9 0 R >> >> >>",
    );
    b.object(3, "<< /Type /Pages /Parent 2 0 R /Kids [5 0 R 6 0 R] /Count 2 >>");
    b.object(4, "<< /Type /Page /Parent 2 0 R /Contents 7 0 R >>");
    b.object(5, "<< /Type /Page /Parent 3 0 R /Contents 8 0 R >>");
    b.object(6, "<< /Type /Page /Parent 3 0 R /Contents 10 0 R >>");
    b.stream(7, "", b"BT /F1 9 Tf 10 10 Td (third) Tj ET");
    b.stream(8, "", b"BT /F1 9 Tf 10 10 Td (first) Tj ET");
    b.stream(10, "", b"BT /F1 9 Tf 10 10 Td (second) Tj ET");
    b.object(9, "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>");
    let data = b.finish("");

    let r = Reader::new(data).expect("open");
    assert_eq!(r.n_pages(), 3);
    assert_eq!(r.page(1).expect("page").string(), "first");
    assert_eq!(r.page(2).expect("page").string(), "second");
    assert_eq!(r.page(3).expect("page").string(), "third");
}
