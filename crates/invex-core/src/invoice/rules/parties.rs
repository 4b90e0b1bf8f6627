//! Supplier and customer block extraction.
//!
//! Which paragraph belongs to which party is decided by a [`PartyLayout`];
//! turning a paragraph into a name and an address is shared by both roles.

use std::sync::Arc;

use tracing::trace;

use super::{contains_any, ExtractionMatch, FieldExtractor};
use crate::invoice::segment::SegmentedText;
use crate::models::config::{CustomerFallback, ExtractionConfig};

/// Name and cleaned address of one party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyBlock {
    /// First non-blank line of the block, trimmed.
    pub name: String,
    /// Remaining address lines joined with `\n`; may be empty.
    pub address: String,
}

/// Policy deciding which paragraphs hold the supplier and the customer.
pub trait PartyLayout: Send + Sync {
    /// Index of the supplier paragraph.
    fn supplier_block(&self, doc: &SegmentedText<'_>) -> Option<usize>;

    /// Index of the customer paragraph.
    fn customer_block(&self, doc: &SegmentedText<'_>) -> Option<usize>;
}

/// Supplier is the first paragraph; customer is the first later paragraph
/// mentioning a bill-to style keyword.
#[derive(Debug, Clone)]
pub struct KeywordLayout {
    keywords: Vec<String>,
    fallback: CustomerFallback,
}

impl KeywordLayout {
    pub fn new(keywords: Vec<String>, fallback: CustomerFallback) -> Self {
        Self { keywords, fallback }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.customer_keywords.clone(), config.customer_fallback)
    }
}

impl Default for KeywordLayout {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl PartyLayout for KeywordLayout {
    fn supplier_block(&self, doc: &SegmentedText<'_>) -> Option<usize> {
        (!doc.paragraphs().is_empty()).then_some(0)
    }

    fn customer_block(&self, doc: &SegmentedText<'_>) -> Option<usize> {
        // Paragraph 0 is the supplier's.
        let matched = doc
            .paragraphs()
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, p)| contains_any(p, &self.keywords))
            .map(|(idx, _)| idx);

        match (matched, self.fallback) {
            (Some(idx), _) => Some(idx),
            (None, CustomerFallback::SecondParagraph) if doc.paragraphs().len() > 1 => Some(1),
            (None, _) => None,
        }
    }
}

/// Drops non-address lines and caps the block length.
#[derive(Debug, Clone)]
pub struct AddressCleaner {
    reject_keywords: Vec<String>,
    max_lines: usize,
}

impl AddressCleaner {
    pub fn new(reject_keywords: Vec<String>, max_lines: usize) -> Self {
        Self {
            reject_keywords,
            max_lines,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.address_reject_keywords.clone(), config.max_address_lines)
    }

    /// Whether a line should be kept in an address.
    pub fn keeps(&self, line: &str) -> bool {
        !line.trim().is_empty() && !contains_any(line, &self.reject_keywords)
    }

    /// Clean address lines into one block.
    pub fn clean<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> String {
        lines
            .into_iter()
            .filter(|line| self.keeps(line))
            .map(str::trim)
            .take(self.max_lines)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Split a paragraph into a party name and cleaned address.
    pub fn split_block(&self, paragraph: &str) -> Option<PartyBlock> {
        let mut lines = paragraph.lines().skip_while(|l| l.trim().is_empty());
        let name = lines.next()?.trim().to_string();

        Some(PartyBlock {
            name,
            address: self.clean(lines),
        })
    }
}

impl Default for AddressCleaner {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

/// Which party an extractor looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyRole {
    Supplier,
    Customer,
}

/// Extracts one party's block through a shared layout policy.
pub struct PartyExtractor {
    role: PartyRole,
    layout: Arc<dyn PartyLayout>,
    cleaner: AddressCleaner,
}

impl PartyExtractor {
    pub fn new(role: PartyRole, layout: Arc<dyn PartyLayout>, cleaner: AddressCleaner) -> Self {
        Self {
            role,
            layout,
            cleaner,
        }
    }

    /// Supplier extractor with the default keyword layout.
    pub fn supplier() -> Self {
        Self::new(
            PartyRole::Supplier,
            Arc::new(KeywordLayout::default()),
            AddressCleaner::default(),
        )
    }

    /// Customer extractor with the default keyword layout.
    pub fn customer() -> Self {
        Self::new(
            PartyRole::Customer,
            Arc::new(KeywordLayout::default()),
            AddressCleaner::default(),
        )
    }
}

impl FieldExtractor for PartyExtractor {
    type Output = PartyBlock;

    fn extract(&self, doc: &SegmentedText<'_>) -> Option<ExtractionMatch<PartyBlock>> {
        let idx = match self.role {
            PartyRole::Supplier => self.layout.supplier_block(doc),
            PartyRole::Customer => self.layout.customer_block(doc),
        }?;
        let paragraph = doc.paragraph(idx)?;
        let block = self.cleaner.split_block(paragraph)?;

        trace!("{:?} block from paragraph {}: {:?}", self.role, idx, block.name);

        let rule = match self.role {
            PartyRole::Supplier => "supplier_paragraph",
            PartyRole::Customer => "customer_paragraph",
        };
        Some(ExtractionMatch::new(block, rule, paragraph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(extractor: &PartyExtractor, text: &str) -> Option<PartyBlock> {
        extractor.extract(&SegmentedText::new(text)).map(|m| m.value)
    }

    #[test]
    fn test_supplier_filters_contact_lines() {
        let block = extract(
            &PartyExtractor::supplier(),
            "Acme Corp\nPhone: 555-1234\n221B Baker St\nGSTIN: XX123",
        )
        .unwrap();

        assert_eq!(
            block,
            PartyBlock {
                name: "Acme Corp".to_string(),
                address: "221B Baker St".to_string(),
            }
        );
    }

    #[test]
    fn test_address_capped() {
        let text = "Acme\nl1\nl2\nE-mail: a@b.c\nl3\nl4\nl5\nl6\nl7";
        let block = extract(&PartyExtractor::supplier(), text).unwrap();
        assert_eq!(block.address, "l1\nl2\nl3\nl4\nl5");
    }

    #[test]
    fn test_address_may_be_empty() {
        let block = extract(&PartyExtractor::supplier(), "Acme Corp\nContact: Bob").unwrap();
        assert_eq!(block.name, "Acme Corp");
        assert_eq!(block.address, "");
    }

    #[test]
    fn test_customer_found_by_keyword() {
        let text = "Acme Corp\nMain St\n\nInvoice No 5\n\nBilled To:\nJane Doe\n12 Elm Rd\n\nTotal 5.00";
        let block = extract(&PartyExtractor::customer(), text).unwrap();
        assert_eq!(block.name, "Billed To:");
        assert_eq!(block.address, "Jane Doe\n12 Elm Rd");
    }

    #[test]
    fn test_customer_skips_supplier_paragraph() {
        let text = "Acme Customer Services\nMain St\n\nNothing here";
        assert_eq!(extract(&PartyExtractor::customer(), text), None);
    }

    #[test]
    fn test_customer_absent_without_keyword() {
        let text = "Acme Corp\n\nJane Doe\n12 Elm Rd";
        assert_eq!(extract(&PartyExtractor::customer(), text), None);
    }

    #[test]
    fn test_second_paragraph_fallback() {
        let layout = KeywordLayout::new(vec!["bill to".to_string()], CustomerFallback::SecondParagraph);
        let extractor = PartyExtractor::new(PartyRole::Customer, Arc::new(layout), AddressCleaner::default());

        let block = extract(&extractor, "Acme Corp\n\nJane Doe\n12 Elm Rd").unwrap();
        assert_eq!(block.name, "Jane Doe");

        assert_eq!(extract(&extractor, "Acme Corp\nMain St"), None);
    }

    #[test]
    fn test_no_paragraphs() {
        assert_eq!(extract(&PartyExtractor::supplier(), ""), None);
        assert_eq!(extract(&PartyExtractor::customer(), "\n\n"), None);
    }

    #[test]
    fn test_custom_layout() {
        struct LastIsSupplier;
        impl PartyLayout for LastIsSupplier {
            fn supplier_block(&self, doc: &SegmentedText<'_>) -> Option<usize> {
                doc.paragraphs().len().checked_sub(1)
            }
            fn customer_block(&self, _doc: &SegmentedText<'_>) -> Option<usize> {
                None
            }
        }

        let extractor = PartyExtractor::new(
            PartyRole::Supplier,
            Arc::new(LastIsSupplier),
            AddressCleaner::default(),
        );
        let block = extract(&extractor, "Header\n\nFooter Ltd\nDock 4").unwrap();
        assert_eq!(block.name, "Footer Ltd");
        assert_eq!(block.address, "Dock 4");
    }
}
