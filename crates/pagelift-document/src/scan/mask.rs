// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binary foreground/background masks and the rectangular morphology the block
// detector runs on them.

use image::{GrayImage, Luma};
use pagelift_core::BoundingBox;

/// Sample value of a foreground (ink) pixel.
pub const FOREGROUND: u8 = 255;
/// Sample value of a background pixel.
pub const BACKGROUND: u8 = 0;

/// A foreground/background mask with the same dimensions as its source image.
///
/// Every pixel is either [`FOREGROUND`] or [`BACKGROUND`]; constructors
/// normalise any non-zero sample to [`FOREGROUND`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    image: GrayImage,
}

impl BinaryMask {
    // -- Construction ---------------------------------------------------------

    /// An all-background mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    /// Build a mask from a predicate over pixel coordinates.
    pub fn from_fn(width: u32, height: u32, mut is_foreground: impl FnMut(u32, u32) -> bool) -> Self {
        let image = GrayImage::from_fn(width, height, |x, y| {
            Luma([if is_foreground(x, y) { FOREGROUND } else { BACKGROUND }])
        });
        Self { image }
    }

    /// Wrap a grayscale image, treating every non-zero sample as foreground.
    pub fn from_image(mut image: GrayImage) -> Self {
        for pixel in image.pixels_mut() {
            if pixel.0[0] != BACKGROUND {
                pixel.0[0] = FOREGROUND;
            }
        }
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y).0[0] == FOREGROUND
    }

    pub fn set(&mut self, x: u32, y: u32, foreground: bool) {
        let value = if foreground { FOREGROUND } else { BACKGROUND };
        self.image.put_pixel(x, y, Luma([value]));
    }

    /// Mark every pixel of `bounds` (clamped to the mask) as foreground.
    pub fn fill(&mut self, bounds: BoundingBox) {
        let Some(b) = bounds.clamp_to(self.width(), self.height()) else {
            return;
        };
        for y in b.y..b.bottom() {
            for x in b.x..b.right() {
                self.image.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
    }

    /// Total number of foreground pixels.
    pub fn count(&self) -> u64 {
        self.image.as_raw().iter().filter(|&&v| v == FOREGROUND).count() as u64
    }

    /// Foreground fraction of the whole mask (0.0 for an empty mask).
    pub fn density(&self) -> f64 {
        let area = self.width() as u64 * self.height() as u64;
        if area == 0 {
            return 0.0;
        }
        self.count() as f64 / area as f64
    }

    /// Per-row foreground counts, top to bottom.
    pub fn row_counts(&self) -> Vec<u32> {
        let width = self.width() as usize;
        if width == 0 {
            return vec![0; self.height() as usize];
        }
        self.image
            .as_raw()
            .chunks_exact(width)
            .map(|row| row.iter().filter(|&&v| v == FOREGROUND).count() as u32)
            .collect()
    }

    /// Per-column foreground counts over the rows `rows.start..rows.end`.
    pub fn column_counts(&self, rows: std::ops::Range<u32>) -> Vec<u32> {
        let mut counts = vec![0u32; self.width() as usize];
        let end = rows.end.min(self.height());
        for y in rows.start.min(end)..end {
            for (x, count) in counts.iter_mut().enumerate() {
                if self.is_foreground(x as u32, y) {
                    *count += 1;
                }
            }
        }
        counts
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Copy of the pixels inside `bounds`, clamped to the mask. Returns `None`
    /// when the box lies entirely outside.
    pub fn crop(&self, bounds: BoundingBox) -> Option<BinaryMask> {
        let b = bounds.clamp_to(self.width(), self.height())?;
        let image = image::imageops::crop_imm(&self.image, b.x, b.y, b.width, b.height).to_image();
        Some(Self { image })
    }

    /// Render as dark ink on a white page: foreground becomes 0, background 255.
    pub fn to_ink_on_white(&self) -> GrayImage {
        let mut out = self.image.clone();
        for pixel in out.pixels_mut() {
            pixel.0[0] = FOREGROUND - pixel.0[0];
        }
        out
    }

    /// Summed-area table of foreground pixels for constant-time box counts.
    pub fn ink_table(&self) -> InkTable {
        InkTable::new(self)
    }

    // -- Morphology -----------------------------------------------------------

    /// Dilate with a `kernel_w` x `kernel_h` rectangle, `iterations` times.
    pub fn dilate(&self, kernel_w: u32, kernel_h: u32, iterations: u32) -> Self {
        let mut out = self.clone();
        for _ in 0..iterations {
            out = out.rect_pass(kernel_w, kernel_h, WindowOp::Any);
        }
        out
    }

    /// Erode with a `kernel_w` x `kernel_h` rectangle, `iterations` times.
    /// Pixels outside the mask count as foreground.
    pub fn erode(&self, kernel_w: u32, kernel_h: u32, iterations: u32) -> Self {
        let mut out = self.clone();
        for _ in 0..iterations {
            out = out.rect_pass(kernel_w, kernel_h, WindowOp::All);
        }
        out
    }

    /// Morphological closing: `iterations` dilations followed by as many
    /// erosions.
    pub fn close(&self, kernel_w: u32, kernel_h: u32, iterations: u32) -> Self {
        self.dilate(kernel_w, kernel_h, iterations)
            .erode(kernel_w, kernel_h, iterations)
    }

    /// Morphological opening: erosion followed by dilation.
    pub fn open(&self, kernel_w: u32, kernel_h: u32) -> Self {
        self.erode(kernel_w, kernel_h, 1).dilate(kernel_w, kernel_h, 1)
    }

    /// A rectangular structuring element is separable, so one pass along each
    /// axis gives the same result as the full 2-D window.
    fn rect_pass(&self, kernel_w: u32, kernel_h: u32, op: WindowOp) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        let (w, h) = (self.width() as usize, self.height() as usize);
        let src = self.image.as_raw();
        let mut horizontal = vec![BACKGROUND; w * h];
        let mut scratch = Vec::with_capacity(w.max(h) + 1);

        if kernel_w > 1 {
            for y in 0..h {
                let row = &src[y * w..(y + 1) * w];
                window_line(row, &mut horizontal[y * w..(y + 1) * w], kernel_w, op, &mut scratch);
            }
        } else {
            horizontal.copy_from_slice(src);
        }

        let mut out = horizontal.clone();
        if kernel_h > 1 {
            let mut column = vec![BACKGROUND; h];
            let mut result = vec![BACKGROUND; h];
            for x in 0..w {
                for y in 0..h {
                    column[y] = horizontal[y * w + x];
                }
                window_line(&column, &mut result, kernel_h, op, &mut scratch);
                for y in 0..h {
                    out[y * w + x] = result[y];
                }
            }
        }

        match GrayImage::from_raw(self.width(), self.height(), out) {
            Some(image) => Self { image },
            None => self.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowOp {
    /// Foreground if any pixel in the window is foreground (dilation).
    Any,
    /// Foreground if every in-bounds pixel in the window is foreground (erosion).
    All,
}

/// Apply a 1-D window of length `kernel` along `line`, anchored at the kernel
/// centre. `scratch` is reused for the prefix sums.
fn window_line(line: &[u8], out: &mut [u8], kernel: u32, op: WindowOp, scratch: &mut Vec<u32>) {
    let n = line.len();
    let kernel = kernel as usize;
    let left = kernel / 2;
    let right = kernel - 1 - left;

    scratch.clear();
    scratch.push(0);
    let mut running = 0u32;
    for &v in line {
        if v == FOREGROUND {
            running += 1;
        }
        scratch.push(running);
    }

    for i in 0..n {
        let lo = i.saturating_sub(left);
        let hi = (i + right).min(n - 1);
        let count = scratch[hi + 1] - scratch[lo];
        let hit = match op {
            WindowOp::Any => count > 0,
            WindowOp::All => count as usize == hi + 1 - lo,
        };
        out[i] = if hit { FOREGROUND } else { BACKGROUND };
    }
}

// -- Ink counting -------------------------------------------------------------

/// Summed-area table of foreground pixels.
///
/// `sums[y * (width+1) + x]` holds the number of foreground pixels in the
/// rectangle [0, 0) to (x, y), with a zero-padded first row and column.
#[derive(Debug, Clone)]
pub struct InkTable {
    width: u32,
    height: u32,
    sums: Vec<u64>,
}

impl InkTable {
    fn new(mask: &BinaryMask) -> Self {
        let (w, h) = (mask.width(), mask.height());
        let stride = (w + 1) as usize;
        let mut sums = vec![0u64; stride * (h + 1) as usize];

        for y in 0..h {
            let mut row_sum = 0u64;
            for x in 0..w {
                if mask.is_foreground(x, y) {
                    row_sum += 1;
                }
                let idx = (y + 1) as usize * stride + (x + 1) as usize;
                let above = y as usize * stride + (x + 1) as usize;
                sums[idx] = row_sum + sums[above];
            }
        }

        Self {
            width: w,
            height: h,
            sums,
        }
    }

    /// Foreground pixels inside `bounds`, clamped to the mask.
    pub fn count(&self, bounds: &BoundingBox) -> u64 {
        let Some(b) = bounds.clamp_to(self.width, self.height) else {
            return 0;
        };
        let stride = (self.width + 1) as usize;
        let (x1, y1) = (b.x as usize, b.y as usize);
        let (x2, y2) = (b.right() as usize, b.bottom() as usize);
        self.sums[y2 * stride + x2] + self.sums[y1 * stride + x1]
            - self.sums[y1 * stride + x2]
            - self.sums[y2 * stride + x1]
    }

    /// Foreground fraction of `bounds` (0.0 when it lies outside the mask).
    pub fn density(&self, bounds: &BoundingBox) -> f64 {
        match bounds.clamp_to(self.width, self.height) {
            Some(b) => self.count(&b) as f64 / b.area() as f64,
            None => 0.0,
        }
    }
}
