//! Invoice field extraction module.

mod parser;
pub mod rules;
pub mod segment;

pub use parser::{extract, HeuristicInvoiceParser, InvoiceParser};
pub use segment::SegmentedText;
