//! Factura Extractor
//!
//! Turns the text of one invoice into ten reconciled fields plus a flag per
//! field marking where nothing was found.
//!
//! # Architecture
//!
//! ```text
//! text ─┬─ PromptBuilder ─ CompletionProvider ─ parse_completion ─┬─ Reconciler ─ InvoiceExtraction
//!       └─ TaxIdScanner ────────────────────────────────────────────┘
//! ```
//!
//! The completion and parse steps are retried together, with the same
//! prompt, while the answer holds no JSON object. Tax IDs are never taken
//! from the model: they come from a regex scan of the raw text, and the
//! configured home tax ID decides who is the receiver.
//!
//! # Example Usage
//!
//! ```no_run
//! use factura_extractor::{Extractor, ExtractorConfig};
//! use factura_llm::{ChatCompletionProvider, ChatConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = ChatCompletionProvider::new(ChatConfig::with_api_key("sk-..."))?;
//! let extractor = Extractor::new(provider, ExtractorConfig::default())?;
//!
//! let result = extractor.extract("FACTURA ... FHM190118EN7 ... Total 1,160.00").await?;
//!
//! println!("{}", serde_json::to_string_pretty(&result.fields)?);
//! println!("Flagged: {:?}", result.flagged_fields());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod parser;
pub mod pdf;
mod prompt;
mod reconciler;
mod scanner;


pub use config::{ExtractorConfig, DEFAULT_HOME_TAX_ID};
pub use error::{ExtractorError, ParseError};
pub use extractor::Extractor;
pub use parser::{parse_completion, FieldMap};
pub use prompt::PromptBuilder;
pub use reconciler::Reconciler;
pub use scanner::{is_tax_id, TaxIdScanner};
