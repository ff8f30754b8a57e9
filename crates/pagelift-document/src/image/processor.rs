// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image loading and grayscale conversion. Decoding is done by the `image`
// crate; everything downstream works on 8-bit grayscale.

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use pagelift_core::error::{PageliftError, Result};
use tracing::{debug, info, instrument};

/// A decoded source image (scan, photo or rendered page).
///
/// ```ignore
/// let gray = ImageProcessor::open("scan.png")?.to_gray();
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|err| {
            debug!(error = %err, "Image decode failed");
            PageliftError::InvalidInput(format!(
                "Could not load image file '{}'.",
                display_name(path)
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| PageliftError::ImageError(format!("failed to decode image: {err}")))?;
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    // -- Conversion -----------------------------------------------------------

    /// Convert to 8-bit grayscale with the BT.601 luma weights
    /// (0.299 R + 0.587 G + 0.114 B). Alpha is ignored.
    pub fn to_gray(&self) -> GrayImage {
        to_gray(&self.image)
    }
}

/// BT.601 grayscale conversion of any decoded image.
pub fn to_gray(image: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = image {
        return gray.clone();
    }
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Encode a grayscale image as PNG bytes.
pub fn encode_png(gray: &GrayImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    gray.write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| PageliftError::ImageError(format!("PNG encoding failed: {err}")))?;
    Ok(buffer)
}

/// File name for messages, falling back to the full path.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn gray_uses_bt601_weights() {
        let rgb = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        });
        let gray = ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(rgb)).to_gray();
        assert_eq!(gray.get_pixel(0, 0).0[0], 76);
        assert_eq!(gray.get_pixel(1, 0).0[0], 150);
        assert_eq!(gray.get_pixel(2, 0).0[0], 29);
    }

    #[test]
    fn png_bytes_decode_back() {
        let gray = GrayImage::from_fn(7, 5, |x, y| Luma([(x * 30 + y) as u8]));
        let bytes = encode_png(&gray).unwrap();
        let decoded = ImageProcessor::from_bytes(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (7, 5));
        assert_eq!(decoded.to_gray(), gray);
    }

    #[test]
    fn missing_file_is_invalid_input() {
        let err = ImageProcessor::open("/nonexistent/scan.png").err().unwrap();
        assert!(matches!(err, PageliftError::InvalidInput(_)));
        assert!(err.to_string().contains("'scan.png'"));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(ImageProcessor::from_bytes(b"not an image").is_err());
    }
}
