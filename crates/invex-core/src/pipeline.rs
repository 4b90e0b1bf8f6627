//! Document pipeline: PDF bytes to extracted invoice fields.

use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::{InvexError, Result};
use crate::invoice::{HeuristicInvoiceParser, InvoiceParser};
use crate::models::config::{ExtractionConfig, PdfConfig};
use crate::models::invoice::ExtractionResult;
use crate::ocr::TextRecognizer;
use crate::pdf::{extract_embedded_text, PageRasterizer};

/// Anything that can turn an uploaded document into invoice fields.
pub trait DocumentProcessor: Send + Sync {
    /// Process a PDF document.
    fn process_document(&self, data: &[u8]) -> Result<ExtractionResult>;

    /// Process an already decoded page image.
    fn process_image(&self, image: &DynamicImage) -> Result<ExtractionResult>;

    /// Parse text that was recognized elsewhere.
    fn process_text(&self, text: &str) -> ExtractionResult;
}

/// Rasterize page 1, OCR it, then parse the text.
pub struct InvoicePipeline<R, O> {
    rasterizer: R,
    recognizer: O,
    parser: HeuristicInvoiceParser,
    pdf: PdfConfig,
}

impl<R: PageRasterizer, O: TextRecognizer> InvoicePipeline<R, O> {
    /// Create a pipeline with default settings.
    pub fn new(rasterizer: R, recognizer: O) -> Self {
        Self::with_config(rasterizer, recognizer, PdfConfig::default(), &ExtractionConfig::default())
    }

    pub fn with_config(
        rasterizer: R,
        recognizer: O,
        pdf: PdfConfig,
        extraction: &ExtractionConfig,
    ) -> Self {
        Self::with_parser(rasterizer, recognizer, pdf, HeuristicInvoiceParser::from_config(extraction))
    }

    /// Use a preconfigured parser, e.g. one with a custom party layout.
    pub fn with_parser(
        rasterizer: R,
        recognizer: O,
        pdf: PdfConfig,
        parser: HeuristicInvoiceParser,
    ) -> Self {
        Self {
            rasterizer,
            recognizer,
            parser,
            pdf,
        }
    }

    fn embedded_text(&self, data: &[u8]) -> Option<String> {
        if !self.pdf.prefer_embedded_text {
            return None;
        }
        match extract_embedded_text(data) {
            Ok(text) if text.trim().len() >= self.pdf.min_text_length => Some(text),
            Ok(_) => {
                debug!("Embedded text too short, falling back to OCR");
                None
            }
            Err(e) => {
                warn!("Embedded text extraction failed, falling back to OCR: {}", e);
                None
            }
        }
    }
}

impl<R: PageRasterizer, O: TextRecognizer> DocumentProcessor for InvoicePipeline<R, O> {
    fn process_document(&self, data: &[u8]) -> Result<ExtractionResult> {
        if data.is_empty() {
            return Err(InvexError::Input("empty document".to_string()));
        }

        let start = Instant::now();

        if let Some(text) = self.embedded_text(data) {
            info!("Using embedded text layer ({} chars)", text.len());
            return Ok(self.process_text(&text));
        }

        let image = self.rasterizer.rasterize_first_page(data, self.pdf.render_dpi)?;
        debug!(
            "Rasterized first page to {}x{} in {:?}",
            image.width(),
            image.height(),
            start.elapsed()
        );

        let text = self.recognizer.recognize(&image)?;
        if text.trim().is_empty() {
            warn!("OCR produced no text");
        }

        let result = self.process_text(&text);
        info!("Processed document in {:?}", start.elapsed());
        Ok(result)
    }

    fn process_image(&self, image: &DynamicImage) -> Result<ExtractionResult> {
        let text = self.recognizer.recognize(&image.to_rgb8())?;
        Ok(self.process_text(&text))
    }

    fn process_text(&self, text: &str) -> ExtractionResult {
        self.parser.parse(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OcrError, PdfError};
    use crate::pdf;
    use image::RgbImage;

    struct FixedRasterizer(bool);

    impl PageRasterizer for FixedRasterizer {
        fn rasterize_first_page(&self, _data: &[u8], dpi: u32) -> pdf::Result<RgbImage> {
            assert_eq!(dpi, 300);
            if self.0 {
                Ok(RgbImage::new(4, 4))
            } else {
                Err(PdfError::NoPages)
            }
        }
    }

    struct FixedOcr(std::result::Result<&'static str, &'static str>);

    impl TextRecognizer for FixedOcr {
        fn recognize(&self, _image: &RgbImage) -> std::result::Result<String, OcrError> {
            self.0
                .map(str::to_string)
                .map_err(|e| OcrError::Recognition(e.to_string()))
        }
    }

    #[test]
    fn test_document_to_fields() {
        let pipeline = InvoicePipeline::new(
            FixedRasterizer(true),
            FixedOcr(Ok("Acme Corp\n1 Main St\n\nInvoice No: A-100\nTotal 12.00")),
        );

        let result = pipeline.process_document(b"%PDF-1.5").unwrap();
        assert_eq!(result.supplier_name.as_deref(), Some("Acme Corp"));
        assert_eq!(result.invoice_id.as_deref(), Some("A-100"));
        assert_eq!(result.total_amount.as_deref(), Some("12.00"));
    }

    #[test]
    fn test_empty_upload_is_input_error() {
        let pipeline = InvoicePipeline::new(FixedRasterizer(true), FixedOcr(Ok("")));
        assert!(pipeline.process_document(b"").unwrap_err().is_input());
    }

    #[test]
    fn test_document_error() {
        let pipeline = InvoicePipeline::new(FixedRasterizer(false), FixedOcr(Ok("x")));
        let err = pipeline.process_document(b"garbage").unwrap_err();
        assert!(matches!(err, InvexError::Pdf(PdfError::NoPages)));
    }

    #[test]
    fn test_ocr_error() {
        let pipeline = InvoicePipeline::new(FixedRasterizer(true), FixedOcr(Err("model crashed")));
        let err = pipeline.process_document(b"%PDF").unwrap_err();
        assert!(matches!(err, InvexError::Ocr(_)));
    }

    #[test]
    fn test_blank_ocr_text_is_not_an_error() {
        let pipeline = InvoicePipeline::new(FixedRasterizer(true), FixedOcr(Ok("")));
        let result = pipeline.process_document(b"%PDF").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_process_image() {
        let pipeline = InvoicePipeline::new(FixedRasterizer(false), FixedOcr(Ok("Acme\n\nTotal 3.50")));
        let image = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let result = pipeline.process_image(&image).unwrap();
        assert_eq!(result.total_amount.as_deref(), Some("3.50"));
    }
}
