// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grayscale pixel operations used to prepare regions for recognition.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::filter::filter3x3;
use pagelift_core::BoundingBox;

/// Copy the pixels of `bounds` (clamped to the image).
pub fn crop(gray: &GrayImage, bounds: BoundingBox) -> Option<GrayImage> {
    let b = bounds.clamp_to(gray.width(), gray.height())?;
    Some(imageops::crop_imm(gray, b.x, b.y, b.width, b.height).to_image())
}

/// Surround the image with a constant border of `padding` pixels.
pub fn pad(gray: &GrayImage, padding: u32, value: u8) -> GrayImage {
    let mut canvas = GrayImage::from_pixel(
        gray.width() + 2 * padding,
        gray.height() + 2 * padding,
        Luma([value]),
    );
    imageops::replace(&mut canvas, gray, padding as i64, padding as i64);
    canvas
}

/// Enlarge an image whose height is below `target_height`, by at most
/// `max_factor`. Scales of 1.01 or less are not worth resampling and return
/// the input unchanged.
pub fn upscale_to_height(gray: &GrayImage, target_height: u32, max_factor: f32) -> GrayImage {
    let height = gray.height();
    if height == 0 || target_height <= height {
        return gray.clone();
    }
    let scale = (target_height as f32 / height as f32).min(max_factor);
    if scale <= 1.01 {
        return gray.clone();
    }
    let new_w = ((gray.width() as f32 * scale) as u32).max(1);
    let new_h = ((height as f32 * scale) as u32).max(1);
    imageops::resize(gray, new_w, new_h, FilterType::Lanczos3)
}

/// Sharpen with the unity-sum kernel `[-1 -1 -1; -1 9 -1; -1 -1 -1]`.
/// Border pixels are replicated.
pub fn sharpen(gray: &GrayImage) -> GrayImage {
    const KERNEL: [i32; 9] = [-1, -1, -1, -1, 9, -1, -1, -1, -1];
    filter3x3::<_, i32, u8>(gray, &KERNEL)
}

/// Contrast-limited adaptive histogram equalisation.
///
/// The image is split into a `grid` x `grid` layout of tiles. Each tile's
/// histogram is clipped at `clip_limit` times its mean bin height, the excess
/// spread evenly over all bins, and turned into a lookup table. Every pixel is
/// mapped by bilinear interpolation between the four nearest tile tables.
pub fn clahe(gray: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 || grid == 0 {
        return gray.clone();
    }
    let tiles_x = grid.min(w);
    let tiles_y = grid.min(h);
    let tile_w = w.div_ceil(tiles_x);
    let tile_h = h.div_ceil(tiles_y);

    let mut luts = vec![[0u8; 256]; (tiles_x * tiles_y) as usize];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);
            luts[(ty * tiles_x + tx) as usize] = tile_lut(gray, x0..x1, y0..y1, clip_limit);
        }
    }

    GrayImage::from_fn(w, h, |x, y| {
        let v = gray.get_pixel(x, y).0[0] as usize;

        // Position relative to tile centres.
        let gx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
        let gy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let tx0 = gx.floor().clamp(0.0, (tiles_x - 1) as f32) as u32;
        let ty0 = gy.floor().clamp(0.0, (tiles_y - 1) as f32) as u32;
        let tx1 = (tx0 + 1).min(tiles_x - 1);
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let fx = (gx - tx0 as f32).clamp(0.0, 1.0);
        let fy = (gy - ty0 as f32).clamp(0.0, 1.0);

        let lut = |tx: u32, ty: u32| luts[(ty * tiles_x + tx) as usize][v] as f32;
        let top = lut(tx0, ty0) * (1.0 - fx) + lut(tx1, ty0) * fx;
        let bottom = lut(tx0, ty1) * (1.0 - fx) + lut(tx1, ty1) * fx;
        let value = top * (1.0 - fy) + bottom * fy;
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

fn tile_lut(
    gray: &GrayImage,
    xs: std::ops::Range<u32>,
    ys: std::ops::Range<u32>,
    clip_limit: f32,
) -> [u8; 256] {
    let mut histogram = [0u32; 256];
    for y in ys.clone() {
        for x in xs.clone() {
            histogram[gray.get_pixel(x, y).0[0] as usize] += 1;
        }
    }
    let area = (xs.len() * ys.len()) as u32;
    let mut lut = [0u8; 256];
    if area == 0 {
        return lut;
    }

    if clip_limit > 0.0 {
        let limit = ((clip_limit * area as f32 / 256.0) as u32).max(1);
        let mut excess = 0u32;
        for bin in histogram.iter_mut() {
            if *bin > limit {
                excess += *bin - limit;
                *bin = limit;
            }
        }
        let share = excess / 256;
        let remainder = (excess % 256) as usize;
        for (i, bin) in histogram.iter_mut().enumerate() {
            *bin += share;
            if i < remainder {
                *bin += 1;
            }
        }
    }

    let scale = 255.0 / area as f32;
    let mut cumulative = 0u32;
    for (i, &count) in histogram.iter().enumerate() {
        cumulative += count;
        lut[i] = (cumulative as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}
