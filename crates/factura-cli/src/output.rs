//! Output formatting for the CLI.

use crate::commands::batch::BatchReport;
use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use factura_domain::{FieldName, InvoiceExtraction};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format one invoice's fields and flags.
    pub fn format_extraction(&self, source: &str, extraction: &InvoiceExtraction) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let value = serde_json::json!({
                    "path": source,
                    "resultado": extraction.fields,
                    "errores": extraction.errors,
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Table => Ok(self.format_extraction_table(source, extraction)),
        }
    }

    fn format_extraction_table(&self, source: &str, extraction: &InvoiceExtraction) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value", "Flag"]);

        for field in FieldName::ALL {
            let flag = if extraction.errors.get(field) {
                self.colorize("missing", "red")
            } else {
                self.colorize("ok", "green")
            };
            builder.push_record([
                field.as_str().to_string(),
                extraction.fields.display_value(field),
                flag,
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        format!(
            "{}\n{}\n{}",
            self.info(source),
            table,
            self.flag_summary(extraction)
        )
    }

    /// One-line summary of the flagged fields.
    pub fn flag_summary(&self, extraction: &InvoiceExtraction) -> String {
        let flagged = extraction.flagged_fields();
        if flagged.is_empty() {
            return self.success("All fields found");
        }

        let names: Vec<&str> = flagged.iter().map(FieldName::as_str).collect();
        self.warning(&format!(
            "{} field(s) flagged: {}",
            flagged.len(),
            names.join(", ")
        ))
    }

    /// Format the totals of a batch run.
    pub fn format_batch_summary(&self, report: &BatchReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "invoices_processed": report.processed(),
                "invoices_with_flags": report.invoices_with_flags(),
                "total_flagged_fields": report.total_flagged_fields(),
                "failures": report.failures(),
            }))?),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Invoices", "With flags", "Flagged fields", "Failures"]);
                builder.push_record([
                    report.processed().to_string(),
                    report.invoices_with_flags().to_string(),
                    report.total_flagged_fields().to_string(),
                    report.failures().to_string(),
                ]);

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a per-invoice failure.
    pub fn failure(&self, source: &str, message: &str) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "path": source,
                "status": "error",
                "message": message,
            }))?),
            OutputFormat::Table => Ok(self.error(&format!("{}: {}", source, message))),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
