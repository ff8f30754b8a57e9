// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page renderer boundary: the capability traits a PDF backend implements
// and the normalisation of whatever pixel layout it produces into RGB.

use std::path::Path;

use image::RgbImage;
use pagelift_core::error::{PageliftError, Result};
use tracing::{debug, instrument};

/// Message for a page index outside the document.
const INVALID_PAGE: &str = "Invalid PDF document or page index.";

/// Channel layout of a rendered buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Gray,
    Rgb,
    Rgba,
    Bgr,
    Bgra,
}

impl PixelLayout {
    /// Bytes per pixel.
    pub fn channels(&self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb | Self::Bgr => 3,
            Self::Rgba | Self::Bgra => 4,
        }
    }
}

/// A row-major 8-bit pixel buffer as produced by a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPixmap {
    width: u32,
    height: u32,
    layout: PixelLayout,
    samples: Vec<u8>,
}

impl RawPixmap {
    /// Wrap a buffer, checking that its length matches the dimensions.
    pub fn new(width: u32, height: u32, layout: PixelLayout, samples: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * layout.channels();
        if samples.len() != expected {
            return Err(PageliftError::ImageError(format!(
                "pixel buffer holds {} bytes, expected {expected} for {width}x{height} {layout:?}",
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            layout,
            samples,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Convert to RGB. Alpha is composited over a white page and BGR orders
    /// are swapped.
    pub fn into_rgb(self) -> Result<RgbImage> {
        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        match self.layout {
            PixelLayout::Rgb => rgb = self.samples,
            PixelLayout::Gray => {
                for &v in &self.samples {
                    rgb.extend_from_slice(&[v, v, v]);
                }
            }
            PixelLayout::Bgr => {
                for px in self.samples.chunks_exact(3) {
                    rgb.extend_from_slice(&[px[2], px[1], px[0]]);
                }
            }
            PixelLayout::Rgba => {
                for px in self.samples.chunks_exact(4) {
                    let a = px[3];
                    rgb.extend_from_slice(&[over_white(px[0], a), over_white(px[1], a), over_white(px[2], a)]);
                }
            }
            PixelLayout::Bgra => {
                for px in self.samples.chunks_exact(4) {
                    let a = px[3];
                    rgb.extend_from_slice(&[over_white(px[2], a), over_white(px[1], a), over_white(px[0], a)]);
                }
            }
        }
        RgbImage::from_raw(self.width, self.height, rgb).ok_or_else(|| {
            PageliftError::ImageError("rendered buffer does not match its dimensions".into())
        })
    }
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let (c, a) = (channel as u32, alpha as u32);
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

// -- Capabilities -------------------------------------------------------------

/// An open paginated document.
///
/// The underlying handle is released when the value is dropped.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Rasterize page `index` (0-based) at `dpi`.
    fn render_page(&self, index: usize, dpi: u32) -> Result<RawPixmap>;
}

/// Opens documents from the filesystem.
pub trait DocumentOpener {
    /// Open `path`. A missing file is [`PageliftError::DocumentNotFound`]; a
    /// corrupted or encrypted one is [`PageliftError::DocumentUnreadable`].
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>>;
}

/// Render one page and normalise it to RGB.
///
/// Every failure is reported as [`PageliftError::PageRender`] carrying the
/// 1-based page number, so callers can record it against that page alone.
#[instrument(skip(source), fields(page = index + 1))]
pub fn render_page_image<S: PageSource + ?Sized>(
    source: &S,
    index: usize,
    dpi: u32,
) -> Result<RgbImage> {
    let page = index + 1;
    if index >= source.page_count() {
        return Err(PageliftError::PageRender {
            page,
            reason: INVALID_PAGE.into(),
        });
    }

    let pixmap = source.render_page(index, dpi).map_err(|err| match err {
        render @ PageliftError::PageRender { .. } => render,
        other => PageliftError::PageRender {
            page,
            reason: other.to_string(),
        },
    })?;
    debug!(width = pixmap.width(), height = pixmap.height(), layout = ?pixmap.layout(), "Page rendered");

    pixmap.into_rgb().map_err(|err| PageliftError::PageRender {
        page,
        reason: err.to_string(),
    })
}
