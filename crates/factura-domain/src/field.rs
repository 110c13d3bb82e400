//! Field module - the fixed vocabulary of extracted invoice fields

use serde::{Deserialize, Serialize};

/// Literal marking a field the model (or the scanner) could not find.
///
/// String fields carry `"0"`, numeric fields carry `0.0`. This is a domain
/// convention, not an absence: every field is always present.
pub const PLACEHOLDER: &str = "0";

/// One of the ten extracted invoice fields
///
/// The wire names (`pdf_*`) are the contract shared with the completion
/// prompt and with downstream consumers; they must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldName {
    /// Issuer (the company emitting the invoice)
    #[serde(rename = "pdf_billed_company_name")]
    IssuerName,

    /// Issuer tax ID(s), taken from the raw-text scan
    #[serde(rename = "pdf_billed_company_rfc")]
    IssuerTaxId,

    /// Receiver (the company the invoice is addressed to)
    #[serde(rename = "pdf_billing_company_name")]
    ReceiverName,

    /// Receiver tax ID, pinned from the configured home tax ID
    #[serde(rename = "pdf_billing_company_rfc")]
    ReceiverTaxId,

    /// Invoice UUID (fiscal folio)
    #[serde(rename = "pdf_provider_bill_uuid")]
    InvoiceUuid,

    /// Currency code
    #[serde(rename = "pdf_currency_code")]
    CurrencyCode,

    /// Subtotal amount
    #[serde(rename = "pdf_sub_total")]
    Subtotal,

    /// Tax collected (transferred) amount
    #[serde(rename = "pdf_traslado")]
    TaxTransferred,

    /// Tax withheld amount
    #[serde(rename = "pdf_retencion")]
    TaxWithheld,

    /// Total amount
    #[serde(rename = "pdf_total")]
    Total,
}

impl FieldName {
    /// All fields in canonical order
    pub const ALL: [FieldName; 10] = [
        FieldName::IssuerName,
        FieldName::IssuerTaxId,
        FieldName::ReceiverName,
        FieldName::ReceiverTaxId,
        FieldName::InvoiceUuid,
        FieldName::CurrencyCode,
        FieldName::Subtotal,
        FieldName::TaxTransferred,
        FieldName::TaxWithheld,
        FieldName::Total,
    ];

    /// Fields the completion model is asked for (tax IDs come from the scan)
    pub const MODEL_SUPPLIED: [FieldName; 8] = [
        FieldName::IssuerName,
        FieldName::ReceiverName,
        FieldName::InvoiceUuid,
        FieldName::CurrencyCode,
        FieldName::Subtotal,
        FieldName::TaxTransferred,
        FieldName::TaxWithheld,
        FieldName::Total,
    ];

    /// Get the wire name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::IssuerName => "pdf_billed_company_name",
            FieldName::IssuerTaxId => "pdf_billed_company_rfc",
            FieldName::ReceiverName => "pdf_billing_company_name",
            FieldName::ReceiverTaxId => "pdf_billing_company_rfc",
            FieldName::InvoiceUuid => "pdf_provider_bill_uuid",
            FieldName::CurrencyCode => "pdf_currency_code",
            FieldName::Subtotal => "pdf_sub_total",
            FieldName::TaxTransferred => "pdf_traslado",
            FieldName::TaxWithheld => "pdf_retencion",
            FieldName::Total => "pdf_total",
        }
    }

    /// Parse a field from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == s)
    }

    /// Whether the field holds an amount (coerced to `f64`)
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldName::Subtotal
                | FieldName::TaxTransferred
                | FieldName::TaxWithheld
                | FieldName::Total
        )
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown field: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for field in FieldName::ALL {
            assert_eq!(FieldName::parse(field.as_str()), Some(field));
        }
        assert_eq!(FieldName::parse("pdf_unknown"), None);
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&FieldName::TaxWithheld).unwrap();
        assert_eq!(json, "\"pdf_retencion\"");
    }

    #[test]
    fn test_numeric_fields() {
        let numeric: Vec<_> = FieldName::ALL.iter().filter(|f| f.is_numeric()).collect();
        assert_eq!(numeric.len(), 4);
        assert!(!FieldName::CurrencyCode.is_numeric());
    }

    #[test]
    fn test_model_supplied_excludes_tax_ids() {
        assert!(!FieldName::MODEL_SUPPLIED.contains(&FieldName::IssuerTaxId));
        assert!(!FieldName::MODEL_SUPPLIED.contains(&FieldName::ReceiverTaxId));
    }
}
