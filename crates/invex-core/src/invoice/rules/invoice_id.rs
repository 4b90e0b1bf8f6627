//! Invoice number extraction.

use lazy_static::lazy_static;
use tracing::trace;

use super::patterns::{INVOICE_ID_LABELED, INVOICE_ID_LOOSE, INVOICE_ID_QUOTED};
use super::{first_match, ExtractionMatch, FieldExtractor, Normalize, PatternRule};
use crate::invoice::segment::SegmentedText;

lazy_static! {
    /// Invoice ID rules in priority order.
    pub static ref INVOICE_ID_RULES: Vec<PatternRule> = vec![
        PatternRule::new("receipt_no_quoted", INVOICE_ID_QUOTED, 1, Normalize::CollapseLineBreaks),
        PatternRule::new("invoice_no_labeled", INVOICE_ID_LABELED, 1, Normalize::CollapseLineBreaks),
        PatternRule::new("invoice_loose", INVOICE_ID_LOOSE, 1, Normalize::CollapseLineBreaks),
    ];
}

/// Invoice ID field extractor.
pub struct InvoiceIdExtractor;

impl InvoiceIdExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InvoiceIdExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for InvoiceIdExtractor {
    type Output = String;

    fn extract(&self, doc: &SegmentedText<'_>) -> Option<ExtractionMatch<String>> {
        let found = first_match(&INVOICE_ID_RULES, doc.text());
        if let Some(m) = &found {
            trace!("Invoice ID {:?} from rule {}", m.value, m.rule);
        }
        found
    }
}

/// Extract the invoice ID from raw text.
pub fn extract_invoice_id(text: &str) -> Option<String> {
    InvoiceIdExtractor::new()
        .extract(&SegmentedText::new(text))
        .map(|m| m.value)
}
