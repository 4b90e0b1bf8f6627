//! Heuristic invoice parser running every field extractor over one text.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::models::config::ExtractionConfig;
use crate::models::invoice::ExtractionResult;

use super::rules::{
    format_amount, AddressCleaner, AmountExtractor, DateExtractor, FieldExtractor,
    InvoiceIdExtractor, KeywordLayout, PartyExtractor, PartyLayout, PartyRole,
};
use super::segment::SegmentedText;

/// Trait for invoice parsing.
///
/// Parsing never fails: fields no rule matches are left as `None`.
pub trait InvoiceParser {
    /// Parse invoice fields from OCR text.
    fn parse(&self, text: &str) -> ExtractionResult;
}

/// Rule-based parser for noisy OCR text.
///
/// Holds only immutable configuration, so one instance can serve any
/// number of threads.
pub struct HeuristicInvoiceParser {
    supplier: PartyExtractor,
    customer: PartyExtractor,
    invoice_id: InvoiceIdExtractor,
    date: DateExtractor,
    amount: AmountExtractor,
}

impl HeuristicInvoiceParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    /// Create a parser from extraction settings.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::with_layout(config, Arc::new(KeywordLayout::from_config(config)))
    }

    /// Create a parser with a custom party layout policy.
    pub fn with_layout(config: &ExtractionConfig, layout: Arc<dyn PartyLayout>) -> Self {
        let cleaner = AddressCleaner::from_config(config);
        Self {
            supplier: PartyExtractor::new(PartyRole::Supplier, Arc::clone(&layout), cleaner.clone()),
            customer: PartyExtractor::new(PartyRole::Customer, layout, cleaner),
            invoice_id: InvoiceIdExtractor::new(),
            date: DateExtractor::new(),
            amount: AmountExtractor::from_config(config),
        }
    }
}

impl Default for HeuristicInvoiceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceParser for HeuristicInvoiceParser {
    fn parse(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();

        info!("Parsing invoice from {} characters of text", text.len());

        let doc = SegmentedText::new(text);
        debug!(
            "Segmented into {} paragraphs, {} lines",
            doc.paragraphs().len(),
            doc.lines().len()
        );

        let supplier = self.supplier.extract(&doc).map(|m| m.value);
        let customer = self.customer.extract(&doc).map(|m| m.value);
        let invoice_id = self.invoice_id.extract(&doc);
        let invoice_date = self.date.extract(&doc);
        let total = self.amount.extract(&doc);

        for (field, rule) in [
            ("Invoice ID", invoice_id.as_ref().map(|m| m.rule)),
            ("Invoice Date", invoice_date.as_ref().map(|m| m.rule)),
            ("Total Amount", total.as_ref().map(|m| m.rule)),
        ] {
            if let Some(rule) = rule {
                debug!("{} matched by rule {}", field, rule);
            }
        }

        let (supplier_name, supplier_address) = match supplier {
            Some(block) => (Some(block.name), Some(block.address)),
            None => (None, None),
        };
        let (customer_name, customer_address) = match customer {
            Some(block) => (Some(block.name), Some(block.address)),
            None => (None, None),
        };

        let result = ExtractionResult {
            supplier_name,
            supplier_address,
            customer_name,
            customer_address,
            invoice_id: invoice_id.map(|m| m.value),
            invoice_date: invoice_date.map(|m| m.value),
            total_amount: total.map(|m| format_amount(m.value)),
        };

        let missing = result.missing_fields();
        if !missing.is_empty() {
            debug!("No match for: {}", missing.join(", "));
        }
        debug!("Parsed invoice in {:?}", start.elapsed());

        result
    }
}

/// Parse invoice fields with the default configuration.
pub fn extract(text: &str) -> ExtractionResult {
    HeuristicInvoiceParser::new().parse(text)
}
