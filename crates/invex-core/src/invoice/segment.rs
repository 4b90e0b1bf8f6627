//! Paragraph and line views over raw OCR text.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// One or more blank (or whitespace-only) lines.
    static ref BLANK_LINES: Regex = Regex::new(r"\r?\n(?:[ \t]*\r?\n)+").unwrap();
}

/// OCR text split into paragraph blocks and lines.
///
/// Paragraphs never contain blank lines and are never empty. Lines keep
/// empty entries so positions match the input line for line.
#[derive(Debug, Clone, Default)]
pub struct SegmentedText<'a> {
    text: &'a str,
    paragraphs: Vec<&'a str>,
    lines: Vec<&'a str>,
}

impl<'a> SegmentedText<'a> {
    /// Segment raw OCR text.
    pub fn new(text: &'a str) -> Self {
        let paragraphs = BLANK_LINES
            .split(text)
            .map(|p| p.trim_matches(|c| c == '\n' || c == '\r'))
            .filter(|p| !p.trim().is_empty())
            .collect();

        Self {
            text,
            paragraphs,
            lines: text.lines().collect(),
        }
    }

    /// The unsegmented text.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Paragraph blocks in reading order.
    pub fn paragraphs(&self) -> &[&'a str] {
        &self.paragraphs
    }

    /// Paragraph at `index`, if present.
    pub fn paragraph(&self, index: usize) -> Option<&'a str> {
        self.paragraphs.get(index).copied()
    }

    /// All lines, including empty ones.
    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_split() {
        let doc = SegmentedText::new("Acme Corp\n1 Main St\n\nBill To:\nJohn\n\n\n\nTotal 5.00\n\n");

        assert_eq!(
            doc.paragraphs(),
            &["Acme Corp\n1 Main St", "Bill To:\nJohn", "Total 5.00"]
        );
    }

    #[test]
    fn test_whitespace_only_lines_separate_paragraphs() {
        let doc = SegmentedText::new("Acme\n   \nCustomer\r\n\r\nTotal");
        assert_eq!(doc.paragraphs(), &["Acme", "Customer", "Total"]);
    }

    #[test]
    fn test_leading_blank_lines_are_not_a_paragraph() {
        let doc = SegmentedText::new("\n\n\nAcme Corp\nStreet");
        assert_eq!(doc.paragraph(0), Some("Acme Corp\nStreet"));
        assert_eq!(doc.paragraphs().len(), 1);
    }

    #[test]
    fn test_lines_keep_empty_entries() {
        let doc = SegmentedText::new("a\n\nb\r\nc");
        assert_eq!(doc.lines(), &["a", "", "b", "c"]);
    }

    #[test]
    fn test_empty_text() {
        let doc = SegmentedText::new("");
        assert!(doc.paragraphs().is_empty());
        assert!(doc.lines().is_empty());
        assert_eq!(doc.paragraph(0), None);
    }
}
