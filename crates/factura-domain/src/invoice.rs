//! Invoice module - extracted fields and their companion error flags
//!
//! `ExtractedFields` and `ErrorFlags` are two structs with the same ten
//! members under the same serde names, so every serialized pair has
//! identical key sets.

use crate::field::{FieldName, PLACEHOLDER};
use serde::{Deserialize, Serialize};

/// A token with the fixed tax-identifier shape (RFC)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxId(String);

impl TaxId {
    /// Wrap a string already known to have the tax-ID shape
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TaxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TaxId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Value of a tax-ID field
///
/// The issuer field holds every non-home candidate found in the text, so it
/// is a list when anything was found and the placeholder otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaxIdField {
    /// A single identifier, or the placeholder `"0"`
    Single(String),
    /// Several candidate identifiers, in sorted order
    Many(Vec<String>),
}

impl TaxIdField {
    /// The "not found" value
    pub fn placeholder() -> Self {
        TaxIdField::Single(PLACEHOLDER.to_string())
    }

    /// Whether this is the placeholder. A list is never a placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, TaxIdField::Single(value) if value == PLACEHOLDER)
    }
}

impl std::fmt::Display for TaxIdField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaxIdField::Single(value) => f.write_str(value),
            TaxIdField::Many(values) => f.write_str(&values.join(", ")),
        }
    }
}

/// The ten extracted invoice fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// Issuer name
    #[serde(rename = "pdf_billed_company_name")]
    pub issuer_name: String,

    /// Issuer tax ID(s)
    #[serde(rename = "pdf_billed_company_rfc")]
    pub issuer_tax_id: TaxIdField,

    /// Receiver name
    #[serde(rename = "pdf_billing_company_name")]
    pub receiver_name: String,

    /// Receiver tax ID
    #[serde(rename = "pdf_billing_company_rfc")]
    pub receiver_tax_id: TaxIdField,

    /// Invoice UUID
    #[serde(rename = "pdf_provider_bill_uuid")]
    pub invoice_uuid: String,

    /// Currency code
    #[serde(rename = "pdf_currency_code")]
    pub currency_code: String,

    /// Subtotal
    #[serde(rename = "pdf_sub_total")]
    pub subtotal: f64,

    /// Tax collected
    #[serde(rename = "pdf_traslado")]
    pub tax_transferred: f64,

    /// Tax withheld
    #[serde(rename = "pdf_retencion")]
    pub tax_withheld: f64,

    /// Total
    #[serde(rename = "pdf_total")]
    pub total: f64,
}

impl ExtractedFields {
    /// Whether the given field holds the placeholder value
    pub fn is_placeholder(&self, field: FieldName) -> bool {
        match field {
            FieldName::IssuerName => self.issuer_name == PLACEHOLDER,
            FieldName::IssuerTaxId => self.issuer_tax_id.is_placeholder(),
            FieldName::ReceiverName => self.receiver_name == PLACEHOLDER,
            FieldName::ReceiverTaxId => self.receiver_tax_id.is_placeholder(),
            FieldName::InvoiceUuid => self.invoice_uuid == PLACEHOLDER,
            FieldName::CurrencyCode => self.currency_code == PLACEHOLDER,
            FieldName::Subtotal => self.subtotal == 0.0,
            FieldName::TaxTransferred => self.tax_transferred == 0.0,
            FieldName::TaxWithheld => self.tax_withheld == 0.0,
            FieldName::Total => self.total == 0.0,
        }
    }

    /// Build the companion flags: true wherever the value is the placeholder
    pub fn error_flags(&self) -> ErrorFlags {
        ErrorFlags {
            issuer_name: self.is_placeholder(FieldName::IssuerName),
            issuer_tax_id: self.is_placeholder(FieldName::IssuerTaxId),
            receiver_name: self.is_placeholder(FieldName::ReceiverName),
            receiver_tax_id: self.is_placeholder(FieldName::ReceiverTaxId),
            invoice_uuid: self.is_placeholder(FieldName::InvoiceUuid),
            currency_code: self.is_placeholder(FieldName::CurrencyCode),
            subtotal: self.is_placeholder(FieldName::Subtotal),
            tax_transferred: self.is_placeholder(FieldName::TaxTransferred),
            tax_withheld: self.is_placeholder(FieldName::TaxWithheld),
            total: self.is_placeholder(FieldName::Total),
        }
    }

    /// Render a field for display
    pub fn display_value(&self, field: FieldName) -> String {
        match field {
            FieldName::IssuerName => self.issuer_name.clone(),
            FieldName::IssuerTaxId => self.issuer_tax_id.to_string(),
            FieldName::ReceiverName => self.receiver_name.clone(),
            FieldName::ReceiverTaxId => self.receiver_tax_id.to_string(),
            FieldName::InvoiceUuid => self.invoice_uuid.clone(),
            FieldName::CurrencyCode => self.currency_code.clone(),
            FieldName::Subtotal => format!("{:.2}", self.subtotal),
            FieldName::TaxTransferred => format!("{:.2}", self.tax_transferred),
            FieldName::TaxWithheld => format!("{:.2}", self.tax_withheld),
            FieldName::Total => format!("{:.2}", self.total),
        }
    }
}

/// Per-field "missing or unreliable" flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorFlags {
    /// Issuer name missing
    #[serde(rename = "pdf_billed_company_name")]
    pub issuer_name: bool,

    /// Issuer tax ID missing
    #[serde(rename = "pdf_billed_company_rfc")]
    pub issuer_tax_id: bool,

    /// Receiver name missing
    #[serde(rename = "pdf_billing_company_name")]
    pub receiver_name: bool,

    /// Receiver tax ID missing
    #[serde(rename = "pdf_billing_company_rfc")]
    pub receiver_tax_id: bool,

    /// Invoice UUID missing
    #[serde(rename = "pdf_provider_bill_uuid")]
    pub invoice_uuid: bool,

    /// Currency code missing
    #[serde(rename = "pdf_currency_code")]
    pub currency_code: bool,

    /// Subtotal missing
    #[serde(rename = "pdf_sub_total")]
    pub subtotal: bool,

    /// Tax collected missing
    #[serde(rename = "pdf_traslado")]
    pub tax_transferred: bool,

    /// Tax withheld missing
    #[serde(rename = "pdf_retencion")]
    pub tax_withheld: bool,

    /// Total missing
    #[serde(rename = "pdf_total")]
    pub total: bool,
}

impl ErrorFlags {
    /// Get the flag for a field
    pub fn get(&self, field: FieldName) -> bool {
        match field {
            FieldName::IssuerName => self.issuer_name,
            FieldName::IssuerTaxId => self.issuer_tax_id,
            FieldName::ReceiverName => self.receiver_name,
            FieldName::ReceiverTaxId => self.receiver_tax_id,
            FieldName::InvoiceUuid => self.invoice_uuid,
            FieldName::CurrencyCode => self.currency_code,
            FieldName::Subtotal => self.subtotal,
            FieldName::TaxTransferred => self.tax_transferred,
            FieldName::TaxWithheld => self.tax_withheld,
            FieldName::Total => self.total,
        }
    }

    /// Iterate flags in canonical field order
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, bool)> + '_ {
        FieldName::ALL.into_iter().map(move |field| (field, self.get(field)))
    }

    /// Number of flagged fields
    pub fn count(&self) -> usize {
        self.iter().filter(|(_, flagged)| *flagged).count()
    }

    /// Whether any field is flagged
    pub fn any(&self) -> bool {
        self.count() > 0
    }
}

/// Result of one extraction: the data and its error flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceExtraction {
    /// Extracted values
    pub fields: ExtractedFields,
    /// Placeholder flags for `fields`
    pub errors: ErrorFlags,
}

impl InvoiceExtraction {
    /// Pair fields with the flags derived from them
    pub fn new(fields: ExtractedFields) -> Self {
        let errors = fields.error_flags();
        Self { fields, errors }
    }

    /// Names of the flagged fields, in canonical order
    pub fn flagged_fields(&self) -> Vec<FieldName> {
        self.errors
            .iter()
            .filter(|(_, flagged)| *flagged)
            .map(|(field, _)| field)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::collections::BTreeSet;

    fn all_placeholders() -> ExtractedFields {
        ExtractedFields {
            issuer_name: "0".to_string(),
            issuer_tax_id: TaxIdField::placeholder(),
            receiver_name: "0".to_string(),
            receiver_tax_id: TaxIdField::placeholder(),
            invoice_uuid: "0".to_string(),
            currency_code: "0".to_string(),
            subtotal: 0.0,
            tax_transferred: 0.0,
            tax_withheld: 0.0,
            total: 0.0,
        }
    }

    fn keys(value: &Value) -> BTreeSet<String> {
        value.as_object().unwrap().keys().cloned().collect()
    }

    #[test]
    fn test_fields_and_flags_share_keys() {
        let extraction = InvoiceExtraction::new(all_placeholders());
        let fields = serde_json::to_value(&extraction.fields).unwrap();
        let flags = serde_json::to_value(&extraction.errors).unwrap();

        assert_eq!(keys(&fields).len(), 10);
        assert_eq!(keys(&fields), keys(&flags));

        let expected: BTreeSet<String> =
            FieldName::ALL.iter().map(|f| f.as_str().to_string()).collect();
        assert_eq!(keys(&fields), expected);
    }

    #[test]
    fn test_all_placeholders_flag_everything() {
        let extraction = InvoiceExtraction::new(all_placeholders());
        assert_eq!(extraction.errors.count(), 10);
        assert_eq!(extraction.flagged_fields(), FieldName::ALL.to_vec());
    }

    #[test]
    fn test_issuer_list_is_never_placeholder() {
        let mut fields = all_placeholders();
        fields.issuer_tax_id = TaxIdField::Many(vec!["ABC123456XY1".to_string()]);
        fields.total = 1160.0;

        let flags = fields.error_flags();
        assert!(!flags.issuer_tax_id);
        assert!(!flags.total);
        assert!(flags.subtotal);
        assert_eq!(flags.count(), 8);
    }

    #[test]
    fn test_tax_id_field_serializes_untagged() {
        let single = serde_json::to_value(TaxIdField::placeholder()).unwrap();
        assert_eq!(single, Value::String("0".to_string()));

        let many = serde_json::to_value(TaxIdField::Many(vec!["A".into(), "B".into()])).unwrap();
        assert_eq!(many, serde_json::json!(["A", "B"]));

        let parsed: TaxIdField = serde_json::from_value(serde_json::json!(["X"])).unwrap();
        assert_eq!(parsed, TaxIdField::Many(vec!["X".to_string()]));
    }

    #[test]
    fn test_display_value_formats_amounts() {
        let mut fields = all_placeholders();
        fields.total = 1160.5;
        assert_eq!(fields.display_value(FieldName::Total), "1160.50");
        assert_eq!(fields.display_value(FieldName::CurrencyCode), "0");
    }

    #[test]
    fn test_tax_id_ordering() {
        let mut ids = vec![TaxId::new("ZZZ010101AAA"), TaxId::new("ABC123456XY1")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "ABC123456XY1");
    }
}
