//! Total amount extraction.
//!
//! Two phases: look near a total keyword first, then fall back to the
//! largest monetary value anywhere in the text.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::trace;

use super::patterns::MONEY;
use super::{contains_any, ExtractionMatch, FieldExtractor};
use crate::invoice::segment::SegmentedText;
use crate::models::config::ExtractionConfig;

/// Total amount field extractor.
pub struct AmountExtractor {
    keywords: Vec<String>,
    window: usize,
}

impl AmountExtractor {
    /// Create an extractor with the default keyword set and window.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            keywords: config.total_keywords.clone(),
            window: config.amount_window,
        }
    }

    /// Search keyword lines and the `window` lines after each one.
    pub fn contextual(&self, lines: &[&str]) -> Option<ExtractionMatch<Decimal>> {
        for (idx, line) in lines.iter().enumerate() {
            if !contains_any(line, &self.keywords) {
                continue;
            }

            let end = idx.saturating_add(self.window).saturating_add(1).min(lines.len());
            for candidate in &lines[idx..end] {
                if let Some(amount) = find_amounts(candidate).into_iter().next() {
                    trace!("Total amount {} near keyword line {}", amount, idx);
                    return Some(ExtractionMatch::new(amount, "total_keyword_window", *candidate));
                }
            }
        }
        None
    }

    /// The largest monetary value in `text`.
    pub fn largest(&self, text: &str) -> Option<ExtractionMatch<Decimal>> {
        let max = find_amounts(text).into_iter().max()?;
        trace!("Total amount {} as largest value", max);
        Some(ExtractionMatch::new(max, "largest_amount", max.to_string()))
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = Decimal;

    fn extract(&self, doc: &SegmentedText<'_>) -> Option<ExtractionMatch<Decimal>> {
        self.contextual(doc.lines())
            .or_else(|| self.largest(doc.text()))
    }
}

/// All monetary values in `text`, in order of appearance.
pub fn find_amounts(text: &str) -> Vec<Decimal> {
    MONEY
        .captures_iter(text)
        .filter_map(|caps| parse_amount(&caps[1]))
        .collect()
}

/// Parse an amount such as `1,234.56` or `₹ 99.00`.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    Decimal::from_str(&cleaned).ok()
}

/// Format an amount with exactly two decimals and no grouping.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

/// Extract the total amount from raw text.
pub fn extract_total_amount(text: &str) -> Option<String> {
    AmountExtractor::new()
        .extract(&SegmentedText::new(text))
        .map(|m| format_amount(m.value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), Some(Decimal::from_str("1234.56").unwrap()));
        assert_eq!(parse_amount("₹ 99.00"), Some(Decimal::from_str("99.00").unwrap()));
        assert_eq!(parse_amount("12,345,678.90"), Some(Decimal::from_str("12345678.90").unwrap()));
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::from_str("1234.56").unwrap()), "1234.56");
        assert_eq!(format_amount(Decimal::from_str("999.9").unwrap()), "999.90");
    }

    #[test]
    fn test_payment_amount_line() {
        assert_eq!(
            extract_total_amount("Payment Amount   INR 1,234.56"),
            Some("1234.56".to_string())
        );
    }

    #[test]
    fn test_amount_on_following_line() {
        let text = "Item A 10.00\nGrand Total\n\nINR\n2,500.00\nThank you";
        let m = AmountExtractor::new().extract(&SegmentedText::new(text)).unwrap();
        assert_eq!(m.rule, "total_keyword_window");
        assert_eq!(format_amount(m.value), "2500.00");
    }

    #[test]
    fn test_window_limit() {
        let text = "Total\n\n\n\n\n50.00\n7.00";
        let extractor = AmountExtractor::new();
        let doc = SegmentedText::new(text);
        assert!(extractor.contextual(doc.lines()).is_none());
        assert_eq!(format_amount(extractor.extract(&doc).unwrap().value), "50.00");
    }

    #[test]
    fn test_keyword_line_without_amount_moves_on() {
        let text = "Total\nqty\nx\ny\nz\nAmount Due: 80.00\n900.00";
        assert_eq!(extract_total_amount(text), Some("80.00".to_string()));
    }

    #[test]
    fn test_fallback_picks_largest() {
        let text = "Widget 45.00\nGadget 999.99\nShipping 12.50";
        let m = AmountExtractor::new().extract(&SegmentedText::new(text)).unwrap();
        assert_eq!(m.rule, "largest_amount");
        assert_eq!(format_amount(m.value), "999.99");
    }

    #[test]
    fn test_configured_window() {
        let config = ExtractionConfig {
            amount_window: 4,
            ..Default::default()
        };
        let text = "Total\n\n\n\n50.00";
        let extractor = AmountExtractor::from_config(&config);
        assert!(extractor.contextual(SegmentedText::new(text).lines()).is_some());
    }

    #[test]
    fn test_unbounded_window() {
        let config = ExtractionConfig {
            amount_window: usize::MAX,
            ..Default::default()
        };
        let m = AmountExtractor::from_config(&config)
            .extract(&SegmentedText::new("Total 5.00"))
            .unwrap();
        assert_eq!(m.rule, "total_keyword_window");
        assert_eq!(format_amount(m.value), "5.00");
    }

    #[test]
    fn test_no_amounts() {
        assert_eq!(extract_total_amount(""), None);
        assert_eq!(extract_total_amount("Total due upon receipt"), None);
    }
}
