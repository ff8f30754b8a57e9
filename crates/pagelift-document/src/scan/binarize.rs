// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binarization: locally adaptive (Sauvola) thresholding with a global Otsu
// fallback. Both produce a mask where ink is FOREGROUND.

use image::GrayImage;
use imageproc::filter::filter3x3;
use pagelift_core::BinarizationConfig;
use tracing::{debug, info, instrument, warn};

use crate::scan::mask::BinaryMask;

/// 3x3 Gaussian, `[1 2 1]` outer `[1 2 1]` over 16.
const PRE_BLUR_KERNEL: [f32; 9] = [
    0.0625, 0.125, 0.0625, //
    0.125, 0.25, 0.125, //
    0.0625, 0.125, 0.0625,
];

/// Which thresholding method produced a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarizationMethod {
    Sauvola,
    Otsu,
}

/// Binarize a grayscale page, falling back to a global Otsu threshold when the
/// adaptive threshold cannot run. Never fails.
#[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
pub fn binarize(gray: &GrayImage, config: &BinarizationConfig) -> (BinaryMask, BinarizationMethod) {
    let blurred;
    let source = if config.pre_blur && gray.width() > 0 && gray.height() > 0 {
        blurred = pre_blur(gray);
        &blurred
    } else {
        gray
    };

    match sauvola(source, config.window_size, config.k, config.r) {
        Some(mask) => {
            info!(foreground = mask.count(), "Sauvola binarization complete");
            (mask, BinarizationMethod::Sauvola)
        }
        None => {
            warn!("Sauvola binarization unavailable; falling back to Otsu");
            (otsu(source), BinarizationMethod::Otsu)
        }
    }
}

/// Smooth scanner noise before thresholding. Border pixels are replicated.
fn pre_blur(gray: &GrayImage) -> GrayImage {
    filter3x3::<_, f32, u8>(gray, &PRE_BLUR_KERNEL)
}

/// Sauvola local thresholding.
///
/// For each pixel the mean `m` and standard deviation `s` of a
/// `window_size` x `window_size` neighbourhood (border-replicated, forced odd)
/// are computed; the pixel is ink when its value is at most
/// `m * (1 + k * (s / r - 1))`.
///
/// Returns `None` for an empty image or degenerate parameters.
pub fn sauvola(gray: &GrayImage, window_size: u32, k: f64, r: f64) -> Option<BinaryMask> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 || window_size == 0 {
        return None;
    }
    if !r.is_finite() || r <= 0.0 || !k.is_finite() {
        return None;
    }

    let window = if window_size % 2 == 0 { window_size + 1 } else { window_size };
    let half = (window / 2) as i64;
    let area = (window as f64) * (window as f64);
    let (w, h) = (width as usize, height as usize);
    let raw = gray.as_raw();

    let clamp_x = |x: i64| x.clamp(0, w as i64 - 1) as usize;
    let clamp_y = |y: i64| y.clamp(0, h as i64 - 1) as usize;

    // Column sums over the current vertical window, slid one row at a time.
    let mut col_sum = vec![0u64; w];
    let mut col_sq = vec![0u64; w];
    for dy in -half..=half {
        let row = &raw[clamp_y(dy) * w..clamp_y(dy) * w + w];
        for (x, &v) in row.iter().enumerate() {
            col_sum[x] += v as u64;
            col_sq[x] += (v as u64) * (v as u64);
        }
    }

    let mut mask = BinaryMask::new(width, height);
    for y in 0..h {
        if y > 0 {
            let leaving = clamp_y(y as i64 - 1 - half);
            let entering = clamp_y(y as i64 + half);
            for x in 0..w {
                let out_v = raw[leaving * w + x] as u64;
                let in_v = raw[entering * w + x] as u64;
                col_sum[x] = col_sum[x] + in_v - out_v;
                col_sq[x] = col_sq[x] + in_v * in_v - out_v * out_v;
            }
        }

        let mut sum: u64 = (-half..=half).map(|dx| col_sum[clamp_x(dx)]).sum();
        let mut sq: u64 = (-half..=half).map(|dx| col_sq[clamp_x(dx)]).sum();
        for x in 0..w {
            if x > 0 {
                let leaving = clamp_x(x as i64 - 1 - half);
                let entering = clamp_x(x as i64 + half);
                sum = sum + col_sum[entering] - col_sum[leaving];
                sq = sq + col_sq[entering] - col_sq[leaving];
            }
            let mean = sum as f64 / area;
            let variance = (sq as f64 / area - mean * mean).max(0.0);
            let threshold = mean * (1.0 + k * (variance.sqrt() / r - 1.0));
            if raw[y * w + x] as f64 <= threshold {
                mask.set(x as u32, y as u32, true);
            }
        }
    }

    Some(mask)
}

/// Global Otsu threshold: pixels at or below the threshold are ink.
pub fn otsu(gray: &GrayImage) -> BinaryMask {
    let threshold = otsu_threshold(gray);
    debug!(threshold, "Otsu threshold computed");
    BinaryMask::from_fn(gray.width(), gray.height(), |x, y| {
        gray.get_pixel(x, y).0[0] <= threshold
    })
}

/// Compute the Otsu threshold for a grayscale image.
///
/// Finds the threshold value that maximises the between-class variance of the
/// dark and light pixel groups.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total_pixels = gray.width() as u64 * gray.height() as u64;
    if total_pixels == 0 {
        return 128;
    }

    let sum_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut sum_background = 0.0f64;
    let mut weight_background = 0u64;
    let mut max_variance = 0.0f64;
    let mut best_threshold = 0u8;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total_pixels - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += t as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_total - sum_background) / weight_foreground as f64;
        let between_variance = weight_background as f64
            * weight_foreground as f64
            * (mean_background - mean_foreground).powi(2);

        if between_variance > max_variance {
            max_variance = between_variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn page_with_bar() -> GrayImage {
        GrayImage::from_fn(60, 40, |x, y| {
            if (10..50).contains(&x) && (18..22).contains(&y) {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn output_matches_input_dimensions() {
        let gray = page_with_bar();
        for window in [3, 15, 21, 51] {
            let mask = sauvola(&gray, window, 0.2, 128.0).unwrap();
            assert_eq!((mask.width(), mask.height()), gray.dimensions());
        }
    }

    #[test]
    fn sauvola_is_deterministic() {
        let gray = GrayImage::from_fn(37, 23, |x, y| Luma([((x * 31 + y * 17) % 256) as u8]));
        let a = sauvola(&gray, 21, 0.2, 128.0).unwrap();
        let b = sauvola(&gray, 21, 0.2, 128.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn even_window_behaves_like_next_odd() {
        let gray = page_with_bar();
        assert_eq!(sauvola(&gray, 20, 0.2, 128.0), sauvola(&gray, 21, 0.2, 128.0));
    }

    #[test]
    fn dark_bar_becomes_foreground() {
        let mask = sauvola(&page_with_bar(), 21, 0.2, 128.0).unwrap();
        assert!(mask.is_foreground(30, 20));
        assert!(!mask.is_foreground(30, 5));
        assert!(!mask.is_foreground(2, 2));
    }

    #[test]
    fn blank_page_has_no_foreground() {
        let gray = GrayImage::from_pixel(50, 30, Luma([255]));
        assert_eq!(sauvola(&gray, 21, 0.2, 128.0).unwrap().count(), 0);
    }

    #[test]
    fn degenerate_input_returns_none() {
        assert!(sauvola(&GrayImage::new(0, 0), 21, 0.2, 128.0).is_none());
        assert!(sauvola(&page_with_bar(), 21, 0.2, 0.0).is_none());
        assert!(sauvola(&page_with_bar(), 21, f64::NAN, 128.0).is_none());
    }

    #[test]
    fn fallback_to_otsu_marks_ink() {
        let config = BinarizationConfig {
            r: -1.0,
            pre_blur: false,
            ..Default::default()
        };
        let (mask, method) = binarize(&page_with_bar(), &config);
        assert_eq!(method, BinarizationMethod::Otsu);
        assert_eq!(mask.count(), 40 * 4);
        assert!(mask.is_foreground(10, 18));
    }

    #[test]
    fn empty_image_still_binarizes() {
        let (mask, method) = binarize(&GrayImage::new(0, 0), &BinarizationConfig::default());
        assert_eq!(method, BinarizationMethod::Otsu);
        assert!(mask.is_empty());
    }

    #[test]
    fn pre_blur_spreads_one_pixel_over_its_neighbours() {
        let mut gray = GrayImage::from_pixel(5, 5, Luma([255]));
        gray.put_pixel(2, 2, Luma([0]));
        let out = pre_blur(&gray);
        assert_eq!(out.get_pixel(2, 2).0[0], 191);
        assert_eq!(out.get_pixel(1, 2).0[0], 223);
        assert_eq!(out.get_pixel(1, 1).0[0], 239);
        // Outside the 3x3 footprint.
        assert_eq!(out.get_pixel(0, 2).0[0], 255);
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn otsu_splits_bimodal_histogram() {
        let gray = GrayImage::from_fn(10, 10, |x, _| Luma([if x < 5 { 40 } else { 210 }]));
        let t = otsu_threshold(&gray);
        assert!((40..210).contains(&t));
    }
}
