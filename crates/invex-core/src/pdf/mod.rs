//! PDF rasterizing for scanned invoices.

mod rasterizer;

pub use rasterizer::LopdfRasterizer;

use crate::error::PdfError;
use image::RgbImage;
use tracing::debug;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Turns document bytes into a pixel image of the first page.
pub trait PageRasterizer: Send + Sync {
    /// Render page 1 at the given resolution.
    fn rasterize_first_page(&self, data: &[u8], dpi: u32) -> Result<RgbImage>;
}

/// Extract the embedded text layer, if the PDF has one.
pub fn extract_embedded_text(data: &[u8]) -> Result<String> {
    let text = pdf_extract::extract_text_from_mem(data)
        .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
    debug!("Embedded text layer: {} chars", text.len());
    Ok(text)
}
