//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::error::Result;
use crate::output::Formatter;
use factura_domain::{CompletionProvider, InvoiceExtraction};
use factura_extractor::Extractor;
use factura_llm::LlmError;
use std::path::Path;

/// Whether a path names a PDF file, by extension
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Extract one invoice file: PDFs by their text layer, anything else as text.
pub async fn extract_file<P>(path: &Path, extractor: &Extractor<P>) -> Result<InvoiceExtraction>
where
    P: CompletionProvider<Error = LlmError> + Send + Sync,
{
    let extraction = if is_pdf(path) {
        let bytes = tokio::fs::read(path).await?;
        extractor.extract_pdf(bytes).await?
    } else {
        let text = tokio::fs::read_to_string(path).await?;
        extractor.extract(&text).await?
    };
    Ok(extraction)
}

/// Execute the extract command.
pub async fn execute_extract<P>(
    args: ExtractArgs,
    extractor: &Extractor<P>,
    formatter: &Formatter,
) -> Result<()>
where
    P: CompletionProvider<Error = LlmError> + Send + Sync,
{
    let extraction = extract_file(&args.file, extractor).await?;
    println!(
        "{}",
        formatter.format_extraction(&args.file.display().to_string(), &extraction)?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use factura_extractor::{ExtractorConfig, ExtractorError};
    use factura_llm::MockProvider;

    const ANSWER: &str = r#"{"pdf_billed_company_name": "Acme", "pdf_billing_company_name": "Home",
        "pdf_provider_bill_uuid": "0", "pdf_currency_code": "USD", "pdf_sub_total": "10.50",
        "pdf_traslado": 0, "pdf_retencion": 0, "pdf_total": 10.5}"#;

    fn extractor() -> Extractor<MockProvider> {
        Extractor::new(MockProvider::new(ANSWER), ExtractorConfig::default()).unwrap()
    }

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("a.pdf")));
        assert!(is_pdf(Path::new("dir/B.PDF")));
        assert!(!is_pdf(Path::new("a.txt")));
        assert!(!is_pdf(Path::new("pdf")));
    }

    #[tokio::test]
    async fn test_extract_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.txt");
        std::fs::write(&path, "Emisor ABC123456XY1\nReceptor FHM190118EN7").unwrap();

        let extraction = extract_file(&path, &extractor()).await.unwrap();
        assert_eq!(extraction.fields.subtotal, 10.5);
        assert!(extraction.errors.invoice_uuid);
        assert!(!extraction.errors.receiver_tax_id);
    }

    #[tokio::test]
    async fn test_extract_empty_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "\n\n").unwrap();

        let result = extract_file(&path, &extractor()).await;
        assert!(matches!(
            result,
            Err(CliError::Extractor(ExtractorError::EmptyInput))
        ));
    }

    #[tokio::test]
    async fn test_extract_missing_file() {
        let result = extract_file(Path::new("/nonexistent/invoice.txt"), &extractor()).await;
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
