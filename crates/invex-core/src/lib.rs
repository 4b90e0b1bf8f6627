//! Core library for scanned invoice extraction.
//!
//! This crate provides:
//! - PDF rasterizing of the first page
//! - OCR through a pluggable text recognizer
//! - Heuristic invoice field extraction from noisy OCR text
//! - A pipeline tying the three together

pub mod error;
pub mod models;
pub mod pdf;
pub mod ocr;
pub mod invoice;
pub mod pipeline;

pub use error::{InvexError, OcrError, PdfError, Result};
pub use models::config::InvexConfig;
pub use models::invoice::ExtractionResult;
pub use pdf::{LopdfRasterizer, PageRasterizer};
pub use ocr::{TextBox, TextRecognizer};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use invoice::{extract, HeuristicInvoiceParser, InvoiceParser};
pub use pipeline::{DocumentProcessor, InvoicePipeline};
