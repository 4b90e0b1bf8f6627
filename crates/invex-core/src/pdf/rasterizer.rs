//! First-page rasterizing using lopdf.
//!
//! A scanned invoice page is one embedded image, so the page is rendered by
//! decoding its largest image XObject and scaling it to the page's MediaBox
//! at the requested DPI.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{PageRasterizer, Result};
use crate::error::PdfError;

/// Largest rendered side in pixels; guards against absurd MediaBox values.
const MAX_RENDER_SIDE: f32 = 12_000.0;

/// Page rasterizer backed by lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfRasterizer;

impl LopdfRasterizer {
    pub fn new() -> Self {
        Self
    }

    fn load(&self, data: &[u8]) -> Result<Document> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        Ok(doc)
    }

    /// All decodable images referenced by a page's resources.
    fn page_images(&self, doc: &Document, page_id: ObjectId) -> Vec<DynamicImage> {
        let mut images = Vec::new();

        let Some(Object::Dictionary(resources)) = inherited_attribute(doc, page_id, b"Resources")
        else {
            return images;
        };

        if let Ok(xobjects) = resources.get(b"XObject") {
            if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                for (name, obj_ref) in xobj_dict.iter() {
                    if let Ok((_, obj)) = doc.dereference(obj_ref) {
                        match decode_image(doc, obj) {
                            Some(img) => images.push(img),
                            None => trace!("Skipped XObject {}", String::from_utf8_lossy(name)),
                        }
                    }
                }
            }
        }

        images
    }
}

impl PageRasterizer for LopdfRasterizer {
    fn rasterize_first_page(&self, data: &[u8], dpi: u32) -> Result<RgbImage> {
        let doc = self.load(data)?;

        let pages = doc.get_pages();
        let (&number, &page_id) = pages.iter().next().ok_or(PdfError::NoPages)?;
        debug!("Rasterizing page {} of {}", number, pages.len());

        let image = self
            .page_images(&doc, page_id)
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
            .ok_or_else(|| {
                PdfError::ImageExtraction(format!("no decodable image on page {}", number))
            })?;

        let image = match page_size_px(&doc, page_id, dpi) {
            Some((width, height)) if (width, height) != (image.width(), image.height()) => {
                trace!(
                    "Scaling {}x{} page image to {}x{} at {} DPI",
                    image.width(),
                    image.height(),
                    width,
                    height,
                    dpi
                );
                image.resize_exact(width, height, FilterType::Triangle)
            }
            _ => image,
        };

        Ok(image.to_rgb8())
    }
}

/// Look up a page attribute, following `Parent` links for inherited values.
fn inherited_attribute(doc: &Document, node_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = node_id;
    // Page trees are shallow; the bound stops reference cycles.
    for _ in 0..32 {
        let Ok(Object::Dictionary(dict)) = doc.get_object(current) else {
            return None;
        };

        if let Ok(value) = dict.get(key) {
            return doc.dereference(value).ok().map(|(_, obj)| obj.clone());
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current = *parent_id,
            _ => return None,
        }
    }
    None
}

/// Page size in pixels at `dpi`, from the MediaBox.
fn page_size_px(doc: &Document, page_id: ObjectId, dpi: u32) -> Option<(u32, u32)> {
    let Some(Object::Array(media_box)) = inherited_attribute(doc, page_id, b"MediaBox") else {
        return None;
    };
    let coords: Vec<f32> = media_box.iter().filter_map(number).collect();
    let &[x0, y0, x1, y1] = coords.as_slice() else {
        return None;
    };

    let scale = dpi as f32 / 72.0;
    let width = ((x1 - x0).abs() * scale).round();
    let height = ((y1 - y0).abs() * scale).round();

    if width < 1.0 || height < 1.0 || width > MAX_RENDER_SIDE || height > MAX_RENDER_SIDE {
        return None;
    }
    Some((width as u32, height as u32))
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn decode_image(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    // Check if it's an image XObject
    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;

    trace!("Found image object: {}x{}", width, height);

    if let Ok(filter) = dict.get(b"Filter") {
        let filter_name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.last().and_then(|o| o.as_name().ok()),
            _ => None,
        };

        match filter_name {
            Some(b"DCTDecode") => {
                // JPEG data is decoded by the image crate from the raw stream
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Unsupported image filter {:?}", filter_name.map(String::from_utf8_lossy));
                return None;
            }
            _ => {}
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    decode_raw(&data, width, height, color_space(doc, dict), bits)
}

fn color_space<'a>(doc: &'a Document, dict: &'a Dictionary) -> &'a [u8] {
    dict.get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB")
}

fn decode_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: i64,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = (width as usize).checked_mul(height as usize)?;
    let rgb_len = pixels.checked_mul(3)?;

    match color_space {
        b"DeviceRGB" | b"RGB" | b"CalRGB" if data.len() >= rgb_len => {
            RgbImage::from_raw(width, height, data[..rgb_len].to_vec()).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" | b"CalGray" if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode image: colorspace={}, data_len={}",
                String::from_utf8_lossy(color_space),
                data.len()
            );
            None
        }
    }
}
