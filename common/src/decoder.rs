//! QR image decoder

use crate::error::DecodeError;
use crate::types::DecodeResult;
use image::RgbaImage;
use rqrr::PreparedImage;

/// In-place pass over the RGBA surface before detection
pub type Preprocess = fn(&mut RgbaImage);

#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder {
    preprocess: Option<Preprocess>,
}

impl QrDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preprocess(preprocess: Preprocess) -> Self {
        Self {
            preprocess: Some(preprocess),
        }
    }

    /// Decode encoded image bytes (PNG, JPEG, ...)
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<DecodeResult, DecodeError> {
        let mut surface = image::load_from_memory(bytes)?.to_rgba8();
        if let Some(preprocess) = self.preprocess {
            preprocess(&mut surface);
        }
        let (width, height) = surface.dimensions();
        decode_rgba(width, height, surface.as_raw())
    }
}

/// Decode encoded image bytes with the default decoder
pub fn decode_bytes(bytes: &[u8]) -> Result<DecodeResult, DecodeError> {
    QrDecoder::new().decode_bytes(bytes)
}

/// Decode a raw RGBA pixel buffer of the given dimensions
pub fn decode_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<DecodeResult, DecodeError> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4));
    if expected != Some(rgba.len()) {
        return Err(DecodeError::BufferSize {
            width,
            height,
            expected: expected.unwrap_or(usize::MAX),
            actual: rgba.len(),
        });
    }
    if width == 0 || height == 0 {
        return Ok(DecodeResult::NotFound);
    }

    let w = width as usize;
    let mut prepared =
        PreparedImage::prepare_from_greyscale(w, height as usize, |x, y| luminance(rgba, (y * w + x) * 4));

    let text = prepared
        .detect_grids()
        .iter()
        .find_map(|grid| grid.decode().ok())
        .map(|(_, content)| content);

    Ok(match text {
        Some(text) => DecodeResult::Decoded { text },
        None => DecodeResult::NotFound,
    })
}

/// BT.601 luma, composited over white so transparent backgrounds read as light
fn luminance(rgba: &[u8], base: usize) -> u8 {
    let r = rgba[base] as u32;
    let g = rgba[base + 1] as u32;
    let b = rgba[base + 2] as u32;
    let a = rgba[base + 3] as u32;
    let luma = (r * 299 + g * 587 + b * 114) / 1000;
    ((luma * a + 255 * (255 - a)) / 255) as u8
}
