//! Prompt construction for invoice field extraction

use factura_domain::FieldName;

/// Builds the extraction prompt for one invoice
pub struct PromptBuilder {
    text: String,
    primary_currency: String,
    secondary_currency: String,
}

impl PromptBuilder {
    /// Create a new prompt builder with the default currencies
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            primary_currency: "USD".to_string(),
            secondary_currency: "MXN".to_string(),
        }
    }

    /// Set the two currency codes the model standardizes to
    pub fn with_currencies(
        mut self,
        primary: impl Into<String>,
        secondary: impl Into<String>,
    ) -> Self {
        self.primary_currency = primary.into();
        self.secondary_currency = secondary.into();
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. What to extract
        prompt.push_str("Extract the following fields from this invoice:\n\n");
        for field in FieldName::MODEL_SUPPLIED {
            prompt.push_str(&format!(
                "- {} (if it is absent, use 0)\n",
                self.describe(field)
            ));
        }

        // 2. The invoice itself
        prompt.push_str("\nInvoice:\n");
        prompt.push_str("---\n");
        prompt.push_str(&self.text);
        prompt.push_str("\n---\n\n");

        // 3. Output format
        prompt.push_str(OUTPUT_INSTRUCTIONS);
        prompt.push_str("\n\n{\n");
        let shape: Vec<String> = FieldName::MODEL_SUPPLIED
            .iter()
            .map(|field| {
                let kind = if field.is_numeric() { "float" } else { "string" };
                format!("    \"{}\": \"{}\"", field.as_str(), kind)
            })
            .collect();
        prompt.push_str(&shape.join(",\n"));
        prompt.push_str("\n}\n");

        prompt
    }

    fn describe(&self, field: FieldName) -> String {
        match field {
            FieldName::IssuerName => "Name of the company issuing the invoice".to_string(),
            FieldName::ReceiverName => {
                "Name of the company the invoice is addressed to".to_string()
            }
            FieldName::InvoiceUuid => {
                "Invoice UUID (if it is lowercase, convert it to uppercase)".to_string()
            }
            FieldName::CurrencyCode => format!(
                "Currency (standardize it to {} or {})",
                self.primary_currency, self.secondary_currency
            ),
            FieldName::Subtotal => "Subtotal".to_string(),
            FieldName::TaxTransferred => "Tax transferred (IVA trasladado)".to_string(),
            FieldName::TaxWithheld => "Tax withheld (IVA retenido)".to_string(),
            FieldName::Total => "Total".to_string(),
            FieldName::IssuerTaxId | FieldName::ReceiverTaxId => field.as_str().to_string(),
        }
    }
}

const OUTPUT_INSTRUCTIONS: &str = "Respond only with a valid JSON object, without any additional text or comments.
Use exactly this structure, with the amounts as numbers:";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text_between_delimiters() {
        let prompt = PromptBuilder::new("FACTURA 001\nTotal 100.00").build();
        assert!(prompt.contains("---\nFACTURA 001\nTotal 100.00\n---\n"));
    }

    #[test]
    fn test_prompt_names_the_eight_requested_fields() {
        let prompt = PromptBuilder::new("x").build();
        for name in [
            "pdf_billed_company_name",
            "pdf_billing_company_name",
            "pdf_provider_bill_uuid",
            "pdf_currency_code",
            "pdf_sub_total",
            "pdf_traslado",
            "pdf_retencion",
            "pdf_total",
        ] {
            assert!(prompt.contains(&format!("\"{}\"", name)), "missing {}", name);
        }
        assert!(!prompt.contains("pdf_billed_company_rfc"));
        assert!(!prompt.contains("pdf_billing_company_rfc"));
    }

    #[test]
    fn test_prompt_declares_value_kinds() {
        let prompt = PromptBuilder::new("x").build();
        assert!(prompt.contains("\"pdf_total\": \"float\""));
        assert!(prompt.contains("\"pdf_currency_code\": \"string\""));
    }

    #[test]
    fn test_prompt_placeholder_and_uuid_rules() {
        let prompt = PromptBuilder::new("x").build();
        assert_eq!(prompt.matches("(if it is absent, use 0)").count(), 8);
        assert!(prompt.contains("convert it to uppercase"));
        assert!(prompt.contains("Respond only with a valid JSON object"));
    }

    #[test]
    fn test_prompt_currencies() {
        let prompt = PromptBuilder::new("x").build();
        assert!(prompt.contains("standardize it to USD or MXN"));

        let prompt = PromptBuilder::new("x").with_currencies("EUR", "GBP").build();
        assert!(prompt.contains("standardize it to EUR or GBP"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let builder = PromptBuilder::new("same text");
        assert_eq!(builder.build(), builder.build());
    }
}
