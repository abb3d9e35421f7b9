//! Plain-text extraction from uploaded documents and reference files.
//! PDFs go through lopdf page by page; everything else is decoded as text.

use lopdf::Document as PdfDoc;
use plagiscope_common::{PlagiscopeError, Result};

const PDF_MIME: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF-";

/// A file as received from the upload surface.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    /// Declared MIME type, if the client sent one.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    PlainText,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), content_type, bytes }
    }

    /// The declared type decides; name and magic bytes are only consulted
    /// when no usable type was declared.
    pub fn format(&self) -> DocumentFormat {
        let declared = self
            .content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or("").trim().to_lowercase())
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

        match declared {
            Some(ct) if ct == PDF_MIME => DocumentFormat::Pdf,
            Some(_) => DocumentFormat::PlainText,
            None => {
                if self.name.to_lowercase().ends_with(".pdf") || self.bytes.starts_with(PDF_MAGIC) {
                    DocumentFormat::Pdf
                } else {
                    DocumentFormat::PlainText
                }
            }
        }
    }
}

/// Produce the plain text of an uploaded file.
pub fn extract_text(file: &UploadedFile) -> Result<String> {
    match file.format() {
        DocumentFormat::Pdf => {
            let text = extract_pdf_text(&file.bytes)?;
            tracing::debug!(file = %file.name, chars = text.len(), "PDF text extracted");
            Ok(text)
        }
        DocumentFormat::PlainText => Ok(String::from_utf8_lossy(&file.bytes).into_owned()),
    }
}

/// Same as [`extract_text`], run on the blocking pool so PDF parsing does not
/// stall the runtime.
pub async fn extract_text_async(file: UploadedFile) -> Result<String> {
    tokio::task::spawn_blocking(move || extract_text(&file))
        .await
        .map_err(|e| PlagiscopeError::Extraction(format!("extraction worker failed: {e}")))?
}

/// Extract text from PDF bytes: items within a page are joined by a single
/// space, pages by a blank line.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let pdf = PdfDoc::load_mem(bytes)
        .map_err(|e| PlagiscopeError::Extraction(format!("unable to open PDF: {e}")))?;

    // get_pages is keyed by page number, so iteration is already in page order
    let mut pages: Vec<String> = Vec::new();
    for page_num in pdf.get_pages().keys() {
        let raw = pdf.extract_text(&[*page_num]).map_err(|e| {
            PlagiscopeError::Extraction(format!("unable to read page {page_num}: {e}"))
        })?;
        pages.push(join_page_items(&raw));
    }

    if pages.iter().all(|p| p.is_empty()) {
        return Err(PlagiscopeError::Extraction(
            "no text found in PDF (is it a scanned or image-only document?)".to_string(),
        ));
    }

    Ok(pages.join("\n\n"))
}

fn join_page_items(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, ct: Option<&str>, bytes: &[u8]) -> UploadedFile {
        UploadedFile::new(name, ct.map(str::to_string), bytes.to_vec())
    }

    #[test]
    fn test_declared_pdf_type_wins() {
        assert_eq!(file("essay.txt", Some("application/pdf"), b"").format(), DocumentFormat::Pdf);
    }

    #[test]
    fn test_other_declared_types_are_text() {
        assert_eq!(file("essay.pdf", Some("text/markdown"), b"").format(), DocumentFormat::PlainText);
        assert_eq!(file("x.docx", Some("application/msword"), b"").format(), DocumentFormat::PlainText);
    }

    #[test]
    fn test_untyped_upload_falls_back_to_name_and_magic() {
        assert_eq!(file("essay.PDF", None, b"").format(), DocumentFormat::Pdf);
        assert_eq!(
            file("upload", Some("application/octet-stream"), b"%PDF-1.7 ...").format(),
            DocumentFormat::Pdf
        );
        assert_eq!(file("notes", None, b"hello").format(), DocumentFormat::PlainText);
    }

    #[test]
    fn test_plain_text_is_returned_verbatim() {
        let f = file("a.txt", Some("text/plain; charset=utf-8"), "Line one\n\nLine two".as_bytes());
        assert_eq!(extract_text(&f).unwrap(), "Line one\n\nLine two");
    }

    #[test]
    fn test_corrupt_pdf_is_extraction_error() {
        let f = file("broken.pdf", Some("application/pdf"), b"%PDF-1.4 garbage without xref");
        let err = extract_text(&f).unwrap_err();
        assert!(matches!(err, PlagiscopeError::Extraction(_)));
    }

    #[test]
    fn test_join_page_items_collapses_whitespace() {
        assert_eq!(join_page_items("Hello\nWorld  \n\n again\n"), "Hello World again");
    }
}
