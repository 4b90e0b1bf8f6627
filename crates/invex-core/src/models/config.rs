//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the invex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvexConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Invoice field extraction configuration.
    pub extraction: ExtractionConfig,

    /// HTTP service configuration.
    pub server: ServerConfig,

    /// Model configuration.
    pub models: ModelConfig,
}

/// OCR text layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Keep `[UNK]` markers emitted by the recognizer instead of blanking them.
    pub keep_unk: bool,

    /// A vertical gap larger than this multiple of the median row height
    /// starts a new paragraph.
    pub paragraph_gap_ratio: f32,

    /// Boxes whose top edges are within this many pixels share a row.
    pub row_tolerance: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            keep_unk: false,
            paragraph_gap_ratio: 1.5,
            row_tolerance: 20.0,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering the first page to an image.
    pub render_dpi: u32,

    /// Use the embedded text layer instead of OCR when it is long enough.
    pub prefer_embedded_text: bool,

    /// Minimum text length to accept the embedded text layer.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            prefer_embedded_text: false,
            min_text_length: 50,
        }
    }
}

/// What to do when no paragraph carries a bill-to style keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerFallback {
    /// Leave the customer fields absent.
    #[default]
    Absent,
    /// Use the second paragraph.
    SecondParagraph,
}

/// Invoice field extraction configuration.
///
/// Keyword lists are matched case-insensitively as substrings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Lines containing any of these are dropped from address blocks.
    pub address_reject_keywords: Vec<String>,

    /// Maximum number of lines kept in an address block.
    pub max_address_lines: usize,

    /// Keywords that mark the billed party's paragraph.
    pub customer_keywords: Vec<String>,

    /// Policy when no paragraph matches `customer_keywords`.
    pub customer_fallback: CustomerFallback,

    /// Keywords that mark a line near the total amount.
    pub total_keywords: Vec<String>,

    /// Number of lines after a keyword line searched for an amount.
    pub amount_window: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            address_reject_keywords: strings(&["gstin", "pan", "email", "e-mail", "phone", "contact"]),
            max_address_lines: 5,
            customer_keywords: strings(&[
                "bill to",
                "billed to",
                "ship to",
                "deliver to",
                "customer",
                "sold to",
            ]),
            customer_fallback: CustomerFallback::Absent,
            total_keywords: strings(&[
                "grand total",
                "total amount",
                "amount due",
                "amount payable",
                "total",
                "net amount",
                "payment amount",
            ]),
            amount_window: 3,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// HTTP service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,

    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Model file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl InvexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "extraction": { "customer_fallback": "second_paragraph", "amount_window": 4 } }"#;
        let config: InvexConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.extraction.customer_fallback, CustomerFallback::SecondParagraph);
        assert_eq!(config.extraction.amount_window, 4);
        assert_eq!(config.extraction.max_address_lines, 5);
        assert_eq!(config.pdf.render_dpi, 300);
        assert!(config.extraction.total_keywords.contains(&"grand total".to_string()));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = InvexConfig::default();
        config.server.bind = "0.0.0.0:8080".to_string();
        config.save(&path).unwrap();

        let loaded = InvexConfig::from_file(&path).unwrap();
        assert_eq!(loaded.server.bind, "0.0.0.0:8080");
    }
}
