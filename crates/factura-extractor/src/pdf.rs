//! Text layer extraction from digital PDFs
//!
//! Scanned invoices without a text layer yield empty pages; there is no OCR.

use crate::error::ExtractorError;
use std::path::Path;
use tracing::debug;

/// Extract the text of every page, joined with newlines
pub fn extract_text(pdf_bytes: &[u8]) -> Result<String, ExtractorError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        .map_err(|e| ExtractorError::Pdf(e.to_string()))?;

    debug!("Extracted {} PDF page(s)", pages.len());

    Ok(join_pages(&pages))
}

/// Read a PDF file and extract its text
pub fn extract_text_from_path(path: impl AsRef<Path>) -> Result<String, ExtractorError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| ExtractorError::Pdf(format!("Failed to read {}: {}", path.display(), e)))?;
    extract_text(&bytes)
}

fn join_pages(pages: &[String]) -> String {
    pages.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A one-page PDF showing `text` in Helvetica
    fn make_test_pdf(text: &str) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });

        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            page.set("Parent", pages_id);
        }

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
    fn test_extract_text_from_digital_pdf() {
        let text = extract_text(&make_test_pdf("ABC123456XY1 Total 1160.00")).unwrap();
        assert!(text.contains("ABC123456XY1"), "got: {text}");
    }

    #[test]
    fn test_garbage_bytes_are_pdf_error() {
        let result = extract_text(b"definitely not a pdf");
        assert!(matches!(result, Err(ExtractorError::Pdf(_))));
    }

    #[test]
    fn test_extract_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.pdf");
        std::fs::write(&path, make_test_pdf("FHM190118EN7")).unwrap();

        let text = extract_text_from_path(&path).unwrap();
        assert!(text.contains("FHM190118EN7"));
    }

    #[test]
    fn test_missing_file_is_pdf_error() {
        let result = extract_text_from_path("/nonexistent/invoice.pdf");
        assert!(matches!(result, Err(ExtractorError::Pdf(_))));
    }

    #[test]
    fn test_empty_pages_still_joined() {
        let pages = vec!["first".to_string(), String::new(), "third".to_string()];
        assert_eq!(join_pages(&pages), "first\n\nthird");
    }
}
