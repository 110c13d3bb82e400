//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::parse_completion;
use crate::pdf;
use crate::prompt::PromptBuilder;
use crate::reconciler::Reconciler;
use crate::scanner::TaxIdScanner;
use factura_domain::{CompletionProvider, InvoiceExtraction};
use factura_llm::LlmError;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The Extractor turns invoice text into reconciled fields and flags
///
/// Holds no mutable state: one instance can serve concurrent extractions.
pub struct Extractor<P> {
    provider: P,
    scanner: TaxIdScanner,
    reconciler: Reconciler,
    config: ExtractorConfig,
}

impl<P> Extractor<P>
where
    P: CompletionProvider<Error = LlmError> + Send + Sync,
{
    /// Create a new Extractor, validating the configuration
    pub fn new(provider: P, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        Ok(Self {
            provider,
            scanner: TaxIdScanner::new(),
            reconciler: Reconciler::new(config.home_tax_id()),
            config,
        })
    }

    /// The completion provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract fields from invoice text
    pub async fn extract(&self, text: &str) -> Result<InvoiceExtraction, ExtractorError> {
        if text.trim().is_empty() {
            return Err(ExtractorError::EmptyInput);
        }

        let length = text.chars().count();
        if length > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(length, self.config.max_text_length));
        }

        let start_time = Instant::now();
        let candidates = self.scanner.scan(text);

        info!(
            "Starting extraction with model '{}': text length {}, {} tax ID candidate(s)",
            self.provider.model_name(),
            length,
            candidates.len()
        );

        let prompt = self.build_prompt(text);
        debug!("Prompt length: {} chars", prompt.len());

        let max_attempts = self.config.max_attempts;
        let mut attempt = 0;

        let fields = loop {
            attempt += 1;

            let response = self.provider.complete(&prompt).await?;
            debug!("Completion length: {} chars", response.len());

            match parse_completion(&response) {
                Ok(fields) => break fields,
                Err(e) if attempt < max_attempts => {
                    warn!(
                        "Attempt {}/{} returned malformed JSON: {}",
                        attempt, max_attempts, e
                    );
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{} returned malformed JSON, giving up: {}",
                        attempt, max_attempts, e
                    );
                    return Err(ExtractorError::MalformedJson {
                        attempts: attempt,
                        reason: e.to_string(),
                        last_response: response,
                    });
                }
            }
        };

        let extraction = self.reconciler.reconcile(&fields, &candidates)?;

        info!(
            "Extraction complete after {} attempt(s): {} flagged field(s) in {} ms",
            attempt,
            extraction.errors.count(),
            start_time.elapsed().as_millis()
        );

        Ok(extraction)
    }

    /// Extract fields from the bytes of a PDF invoice
    pub async fn extract_pdf(&self, pdf_bytes: Vec<u8>) -> Result<InvoiceExtraction, ExtractorError> {
        let text = tokio::task::spawn_blocking(move || pdf::extract_text(&pdf_bytes))
            .await
            .map_err(|e| ExtractorError::Pdf(format!("Task join error: {}", e)))??;

        self.extract(&text).await
    }

    fn build_prompt(&self, text: &str) -> String {
        let builder = PromptBuilder::new(text);
        match self.config.currencies.as_slice() {
            [primary, secondary] => builder.with_currencies(primary, secondary).build(),
            _ => builder.build(),
        }
    }
}
