//! OCR collaborator: turns a page image into plain text.

mod layout;
#[cfg(feature = "native")]
mod pure_engine;

pub use layout::layout_text;
#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Recognizes the text on a page image.
///
/// Output lines follow reading order, with a blank line between blocks of
/// text that are visually separated on the page.
pub trait TextRecognizer: Send + Sync {
    /// Recognize text; an image without text yields an empty string.
    fn recognize(&self, image: &RgbImage) -> Result<String, OcrError>;
}

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Axis-aligned box from its corners.
    pub fn from_rect(x0: f32, y0: f32, x1: f32, y1: f32, text: impl Into<String>) -> Self {
        Self {
            bbox: [x0, y0, x1, y0, x1, y1, x0, y1],
            text: text.into(),
            confidence: 1.0,
        }
    }

    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_of_rotated_quad() {
        let tb = TextBox {
            bbox: [10.0, 5.0, 50.0, 0.0, 55.0, 20.0, 12.0, 25.0],
            text: "x".into(),
            confidence: 0.9,
        };
        assert_eq!(tb.rect(), (10.0, 0.0, 55.0, 25.0));
    }
}
