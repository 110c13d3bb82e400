//! Batch command implementation.

use crate::cli::BatchArgs;
use crate::commands::extract::{extract_file, is_pdf};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use factura_domain::{CompletionProvider, InvoiceExtraction};
use factura_extractor::Extractor;
use factura_llm::LlmError;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Outcome of one invoice in a batch
#[derive(Debug)]
pub struct BatchEntry {
    /// Invoice file
    pub path: PathBuf,
    /// Extraction, or the message of the error that stopped it
    pub outcome: std::result::Result<InvoiceExtraction, String>,
}

/// Per-invoice outcomes of a batch run, in file name order
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per PDF found
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    /// Invoices attempted
    pub fn processed(&self) -> usize {
        self.entries.len()
    }

    /// Invoices that could not be extracted
    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_err()).count()
    }

    /// Extracted invoices with at least one flagged field
    pub fn invoices_with_flags(&self) -> usize {
        self.extractions().filter(|x| x.errors.any()).count()
    }

    /// Flagged fields across all extracted invoices
    pub fn total_flagged_fields(&self) -> usize {
        self.extractions().map(|x| x.errors.count()).sum()
    }

    fn extractions(&self) -> impl Iterator<Item = &InvoiceExtraction> {
        self.entries.iter().filter_map(|e| e.outcome.as_ref().ok())
    }
}

/// PDF files directly inside `dir`, sorted by path
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CliError::InvalidInput(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_pdf(&path) {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

/// Extract every PDF in `dir`, one after another
///
/// A failing invoice is recorded and the run continues.
pub async fn run_batch<P>(dir: &Path, extractor: &Extractor<P>) -> Result<BatchReport>
where
    P: CompletionProvider<Error = LlmError> + Send + Sync,
{
    let mut report = BatchReport::default();

    for path in list_pdfs(dir)? {
        let outcome = extract_file(&path, extractor).await.map_err(|e| {
            warn!("Failed to extract {}: {}", path.display(), e);
            e.to_string()
        });
        report.entries.push(BatchEntry { path, outcome });
    }

    Ok(report)
}

/// Execute the batch command.
pub async fn execute_batch<P>(
    args: BatchArgs,
    extractor: &Extractor<P>,
    formatter: &Formatter,
) -> Result<()>
where
    P: CompletionProvider<Error = LlmError> + Send + Sync,
{
    let report = run_batch(&args.dir, extractor).await?;

    if report.entries.is_empty() {
        println!(
            "{}",
            formatter.warning(&format!("No PDF invoices in {}", args.dir.display()))
        );
        return Ok(());
    }

    for entry in &report.entries {
        let source = entry.path.display().to_string();
        let rendered = match &entry.outcome {
            Ok(extraction) => formatter.format_extraction(&source, extraction)?,
            Err(message) => formatter.failure(&source, message)?,
        };
        println!("{}", rendered);
    }

    println!("{}", formatter.format_batch_summary(&report)?);
    Ok(())
}
