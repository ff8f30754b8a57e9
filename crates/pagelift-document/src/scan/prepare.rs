// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region preprocessing: turn a line or block of the page into the image the
// recognition engine sees.

use image::GrayImage;
use imageproc::filter::median_filter;
use pagelift_core::{BoundingBox, RecognitionConfig};
use tracing::{debug, instrument};

use crate::image::ops;
use crate::scan::binarize;
use crate::scan::mask::BinaryMask;

/// Background value used for padding.
const PAPER_WHITE: u8 = 255;

/// Regions this thin or thinner are skipped.
const MIN_REGION_SIDE: u32 = 3;

/// Prepare one region of a grayscale page for recognition.
///
/// With `custom_binarize` set, the region is reduced to dark ink on white
/// using `page_mask` when available (otherwise a global threshold over the
/// region alone), optionally opened to drop speckle. Otherwise the grayscale
/// pixels are denoised, contrast-normalised and sharpened. Both paths then
/// upscale short regions and pad with white.
///
/// Returns `None` for regions too small to read or outside the page.
#[instrument(skip_all, fields(region = %bounds, custom = config.custom_binarize))]
pub fn prepare_region(
    gray: &GrayImage,
    page_mask: Option<&BinaryMask>,
    bounds: BoundingBox,
    config: &RecognitionConfig,
) -> Option<GrayImage> {
    if bounds.width <= MIN_REGION_SIDE || bounds.height <= MIN_REGION_SIDE {
        debug!("Region too small; skipped");
        return None;
    }
    let bounds = bounds.clamp_to(gray.width(), gray.height())?;
    let roi = ops::crop(gray, bounds)?;

    let prepared = if config.custom_binarize {
        binarized_region(&roi, page_mask, bounds, config)
    } else {
        enhance_gray(&roi, config)
    };

    let prepared = if config.upscale {
        ops::upscale_to_height(&prepared, config.target_text_height, config.max_upscale_factor)
    } else {
        prepared
    };

    Some(ops::pad(&prepared, config.padding, PAPER_WHITE))
}

/// Prepare a whole page for recognition when no usable regions were found:
/// the grayscale enhancement chain plus padding, at the original size.
#[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
pub fn prepare_page(gray: &GrayImage, config: &RecognitionConfig) -> GrayImage {
    ops::pad(&enhance_gray(gray, config), config.padding, PAPER_WHITE)
}

fn binarized_region(
    roi: &GrayImage,
    page_mask: Option<&BinaryMask>,
    bounds: BoundingBox,
    config: &RecognitionConfig,
) -> GrayImage {
    let mut ink = match page_mask.and_then(|mask| mask.crop(bounds)) {
        Some(mask) => mask,
        None => binarize::otsu(roi),
    };

    let kernel = config.opening_kernel_width;
    if config.opening_on_binary && kernel > 0 && ink.width() > kernel {
        ink = ink.open(kernel, 1);
    }

    ink.to_ink_on_white()
}

fn enhance_gray(gray: &GrayImage, config: &RecognitionConfig) -> GrayImage {
    let mut out = gray.clone();
    if config.denoise && config.denoise_strength > 0 {
        out = median_filter(&out, config.denoise_strength, config.denoise_strength);
    }
    if config.contrast_normalize {
        out = ops::clahe(&out, config.clahe_clip_limit, config.clahe_tile_grid);
    }
    if config.sharpen {
        out = ops::sharpen(&out);
    }
    out
}
