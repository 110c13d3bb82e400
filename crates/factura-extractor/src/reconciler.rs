//! Merge model-supplied fields with scanned tax-ID candidates

use crate::error::ExtractorError;
use crate::parser::FieldMap;
use factura_domain::{ExtractedFields, FieldName, InvoiceExtraction, TaxId, TaxIdField, PLACEHOLDER};
use serde_json::Value;

/// Builds the final field set from a parsed completion and the scan result
///
/// Tax IDs never come from the model. When the home tax ID is among the
/// candidates the home organization is the receiver; every other candidate
/// is attributed to the issuer.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    home_tax_id: Option<TaxId>,
}

impl Reconciler {
    /// Create a reconciler; `None` disables the home tax ID rule
    pub fn new(home_tax_id: Option<TaxId>) -> Self {
        Self { home_tax_id }
    }

    /// Reconcile one invoice
    pub fn reconcile(
        &self,
        fields: &FieldMap,
        candidates: &[TaxId],
    ) -> Result<InvoiceExtraction, ExtractorError> {
        let (issuer_tax_id, receiver_tax_id) = self.assign_tax_ids(candidates);

        let extracted = ExtractedFields {
            issuer_name: text_field(fields, FieldName::IssuerName)?,
            issuer_tax_id,
            receiver_name: text_field(fields, FieldName::ReceiverName)?,
            receiver_tax_id,
            invoice_uuid: text_field(fields, FieldName::InvoiceUuid)?,
            currency_code: text_field(fields, FieldName::CurrencyCode)?,
            subtotal: numeric_field(fields, FieldName::Subtotal)?,
            tax_transferred: numeric_field(fields, FieldName::TaxTransferred)?,
            tax_withheld: numeric_field(fields, FieldName::TaxWithheld)?,
            total: numeric_field(fields, FieldName::Total)?,
        };

        Ok(InvoiceExtraction::new(extracted))
    }

    fn assign_tax_ids(&self, candidates: &[TaxId]) -> (TaxIdField, TaxIdField) {
        let home = self
            .home_tax_id
            .as_ref()
            .filter(|home| candidates.contains(home));

        let receiver = match home {
            Some(home) => TaxIdField::Single(home.to_string()),
            None => TaxIdField::placeholder(),
        };

        let remaining: Vec<String> = candidates
            .iter()
            .filter(|candidate| Some(*candidate) != home)
            .map(TaxId::to_string)
            .collect();

        let issuer = if remaining.is_empty() {
            TaxIdField::placeholder()
        } else {
            TaxIdField::Many(remaining)
        };

        (issuer, receiver)
    }
}

fn lookup(fields: &FieldMap, field: FieldName) -> Result<&Value, ExtractorError> {
    fields
        .get(field.as_str())
        .ok_or(ExtractorError::MissingField(field))
}

fn text_field(fields: &FieldMap, field: FieldName) -> Result<String, ExtractorError> {
    match lookup(fields, field)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(PLACEHOLDER.to_string()),
        other => Err(ExtractorError::Coercion {
            field,
            value: other.to_string(),
        }),
    }
}

fn numeric_field(fields: &FieldMap, field: FieldName) -> Result<f64, ExtractorError> {
    let value = lookup(fields, field)?;
    let coerced = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    // "NaN" and "inf" parse as f64 but have no JSON number form
    coerced.filter(|v| v.is_finite()).ok_or_else(|| ExtractorError::Coercion {
        field,
        value: value.to_string(),
    })
}
