//! Invoice date extraction.
//!
//! Dates are returned as printed; OCR output is too inconsistent to
//! normalize reliably into a calendar date.

use lazy_static::lazy_static;
use tracing::trace;

use super::patterns::{DATE_DAY_MONTH_YEAR, DATE_LABELED, DATE_MONTH_FIRST, DATE_QUOTED};
use super::{first_match, ExtractionMatch, FieldExtractor, Normalize, PatternRule};
use crate::invoice::segment::SegmentedText;

lazy_static! {
    /// Invoice date rules in priority order.
    pub static ref DATE_RULES: Vec<PatternRule> = vec![
        PatternRule::new("document_date_quoted", DATE_QUOTED, 1, Normalize::CollapseLineBreaks),
        PatternRule::new("date_labeled", DATE_LABELED, 1, Normalize::Trim),
        PatternRule::new("day_month_year", &DATE_DAY_MONTH_YEAR, 0, Normalize::Trim),
        PatternRule::new("month_day_year", &DATE_MONTH_FIRST, 0, Normalize::Trim),
    ];
}

/// Date field extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = String;

    fn extract(&self, doc: &SegmentedText<'_>) -> Option<ExtractionMatch<String>> {
        let found = first_match(&DATE_RULES, doc.text());
        if let Some(m) = &found {
            trace!("Invoice date {:?} from rule {}", m.value, m.rule);
        }
        found
    }
}

/// Extract the invoice date from raw text.
pub fn extract_invoice_date(text: &str) -> Option<String> {
    DateExtractor::new()
        .extract(&SegmentedText::new(text))
        .map(|m| m.value)
}
