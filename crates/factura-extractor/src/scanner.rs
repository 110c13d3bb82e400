//! Tax-ID scanning over raw invoice text

use factura_domain::TaxId;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// 3-4 letters (Ñ and & included), 6 digits, 3 alphanumerics, whole token
static TAX_ID_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-ZÑ&]{3,4}[0-9]{6}[A-Z0-9]{3}$").expect("tax ID pattern is valid")
});

/// Whether a token has the tax-ID shape in full
pub fn is_tax_id(token: &str) -> bool {
    TAX_ID_SHAPE.is_match(token)
}

/// Finds tax-ID candidates in invoice text
///
/// Tokens are whitespace-separated and taken verbatim: `RFC:ABC123456XY1`
/// or `ABC123456XY1,` do not match. Matching is case-sensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxIdScanner;

impl TaxIdScanner {
    /// Create a scanner
    pub fn new() -> Self {
        Self
    }

    /// Deduplicated candidates in lexicographic order
    pub fn scan(&self, text: &str) -> Vec<TaxId> {
        let candidates: BTreeSet<&str> = text
            .split_whitespace()
            .filter(|token| is_tax_id(token))
            .collect();

        if candidates.is_empty() {
            warn!("No tax ID candidates found in invoice text");
        } else {
            debug!("Found {} tax ID candidate(s)", candidates.len());
        }

        candidates.into_iter().map(TaxId::new).collect()
    }
}
