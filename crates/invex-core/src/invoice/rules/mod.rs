//! Rule-based field extractors for OCR'd invoices.
//!
//! Each extractor is an ordered list of independent rules tried until one
//! produces a value. Rules are data, so every rule can be tested alone.

pub mod amounts;
pub mod dates;
pub mod invoice_id;
pub mod parties;
pub mod patterns;

pub use amounts::{extract_total_amount, find_amounts, format_amount, parse_amount, AmountExtractor};
pub use dates::{extract_invoice_date, DateExtractor, DATE_RULES};
pub use invoice_id::{extract_invoice_id, InvoiceIdExtractor, INVOICE_ID_RULES};
pub use parties::{
    AddressCleaner, KeywordLayout, PartyBlock, PartyExtractor, PartyLayout, PartyRole,
};

use regex::Regex;

use super::segment::SegmentedText;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from segmented text.
    fn extract(&self, doc: &SegmentedText<'_>) -> Option<ExtractionMatch<Self::Output>>;
}

/// An extracted value with the rule and text that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Name of the rule that fired.
    pub rule: &'static str,
    /// Source text that was consumed.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, rule: &'static str, source: impl Into<String>) -> Self {
        Self {
            value,
            rule,
            source: source.into(),
        }
    }
}

/// Cleanup applied to a captured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalize {
    /// Trim surrounding whitespace.
    Trim,
    /// Replace each run of line breaks with one space, then trim.
    CollapseLineBreaks,
}

impl Normalize {
    pub fn apply(self, raw: &str) -> String {
        match self {
            Normalize::Trim => raw.trim().to_string(),
            Normalize::CollapseLineBreaks => raw
                .split(['\r', '\n'])
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// A pattern plus the capture group holding the value.
#[derive(Debug)]
pub struct PatternRule {
    /// Short identifier used in logs and matches.
    pub name: &'static str,
    /// Compiled pattern.
    pub pattern: Regex,
    /// Capture group index; 0 takes the whole match.
    pub group: usize,
    /// Cleanup applied to the capture.
    pub normalize: Normalize,
}

impl PatternRule {
    /// Build a rule from a pattern known to be valid.
    ///
    /// Only called while initializing static rule tables.
    pub(crate) fn new(name: &'static str, pattern: &str, group: usize, normalize: Normalize) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
            group,
            normalize,
        }
    }

    /// Apply this rule alone.
    pub fn apply(&self, text: &str) -> Option<ExtractionMatch<String>> {
        let caps = self.pattern.captures(text)?;
        let raw = caps.get(self.group)?;
        let value = self.normalize.apply(raw.as_str());
        if value.is_empty() {
            return None;
        }
        let whole = caps.get(0).map_or("", |m| m.as_str());
        Some(ExtractionMatch::new(value, self.name, whole))
    }
}

/// Run `rules` in order and return the first non-empty capture.
pub fn first_match(rules: &[PatternRule], text: &str) -> Option<ExtractionMatch<String>> {
    rules.iter().find_map(|rule| rule.apply(text))
}

/// Case-insensitive substring test against a keyword set.
pub fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    let lower = haystack.to_lowercase();
    keywords
        .iter()
        .any(|kw| !kw.is_empty() && lower.contains(&kw.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_line_breaks() {
        assert_eq!(Normalize::CollapseLineBreaks.apply(" 12\nNov\r\n\n2024 "), "12 Nov 2024");
        assert_eq!(Normalize::Trim.apply("  INV-1 \n"), "INV-1");
    }

    #[test]
    fn test_first_match_order() {
        let rules = [
            PatternRule::new("never", r"zzz(\d+)", 1, Normalize::Trim),
            PatternRule::new("digits", r"(\d+)", 1, Normalize::Trim),
            PatternRule::new("word", r"([a-z]+)", 1, Normalize::Trim),
        ];

        let m = first_match(&rules, "abc 42").unwrap();
        assert_eq!(m.value, "42");
        assert_eq!(m.rule, "digits");
        assert_eq!(m.source, "42");
    }

    #[test]
    fn test_blank_capture_falls_through() {
        let rules = [
            PatternRule::new("blank", r#""([^"]*)""#, 1, Normalize::Trim),
            PatternRule::new("digits", r"(\d+)", 1, Normalize::Trim),
        ];

        assert_eq!(first_match(&rules, r#"" " 7"#).unwrap().value, "7");
    }

    #[test]
    fn test_contains_any() {
        let keywords = vec!["bill to".to_string(), "customer".to_string()];
        assert!(contains_any("BILL TO: Jane", &keywords));
        assert!(contains_any("Customer Copy", &keywords));
        assert!(!contains_any("Billing", &keywords));
        assert!(!contains_any("anything", &[String::new()]));
    }
}
