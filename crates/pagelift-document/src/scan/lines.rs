// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line segmentation: split a block into text lines with a horizontal ink
// projection profile.

use pagelift_core::config::LineSegmentationConfig;
use pagelift_core::{BoundingBox, TextLine};
use tracing::{debug, instrument};

use crate::scan::mask::BinaryMask;

/// Split one block into text lines.
///
/// `block_mask` holds the block's own pixels (cropped from the page mask) and
/// `block` its position on the page. Lines span the full block width and are
/// returned top to bottom in page coordinates.
#[instrument(skip_all, fields(block = %block))]
pub fn segment_lines(
    block_mask: &BinaryMask,
    block: BoundingBox,
    config: &LineSegmentationConfig,
) -> Vec<TextLine> {
    if block_mask.is_empty() {
        return Vec::new();
    }
    let (w, h) = (block_mask.width(), block_mask.height());

    if h < config.tiny_block_height || w < config.tiny_block_width {
        return whole_block(block_mask, block, config);
    }

    let projection = block_mask.row_counts();
    let noise_floor = (w as f64 * config.row_noise_fraction).max(1.0);
    let meaningful: Vec<f64> = projection
        .iter()
        .map(|&c| c as f64)
        .filter(|&c| c > noise_floor)
        .collect();
    if meaningful.len() < config.min_meaningful_rows {
        return whole_block(block_mask, block, config);
    }

    let mean = meaningful.iter().sum::<f64>() / meaningful.len() as f64;
    let threshold = (mean * config.threshold_fraction).max(config.min_threshold);
    let min_line_height = config
        .min_line_height
        .max(h / config.line_height_divisor.max(1));

    let runs = line_runs(&projection, threshold, min_line_height);
    debug!(threshold, candidates = runs.len(), "Projection profile scanned");

    let mut lines = Vec::with_capacity(runs.len());
    for (start, end) in runs {
        let line_height = end - start;
        if line_height == 0 {
            continue;
        }
        let strip = &projection[start as usize..end as usize];
        let ink: u64 = strip.iter().map(|&c| c as u64).sum();
        let min_ink = (line_height as f64 * w as f64 * config.min_strip_ink_fraction).max(1.0);
        if (ink as f64) < min_ink {
            continue;
        }

        let min_column = (config.min_column_run_fraction * line_height as f64).max(1.0);
        let has_stroke = block_mask
            .column_counts(start..end)
            .iter()
            .any(|&c| c as f64 > min_column);
        if !has_stroke {
            continue;
        }

        let (mut y, mut height) = (start, line_height);
        let first = strip.iter().position(|&c| c > 0);
        let last = strip.iter().rposition(|&c| c > 0);
        if let (Some(first), Some(last)) = (first, last) {
            let tight = (last - first + 1) as u32;
            if tight >= min_line_height / 2 {
                y = start + first as u32;
                height = tight;
            }
        }

        lines.push(TextLine {
            bounds: BoundingBox::new(block.x, block.y + y, w, height),
        });
    }

    debug!(lines = lines.len(), "Lines segmented");
    lines
}

/// Runs of consecutive rows above `threshold`, as `(start, end)` row ranges,
/// keeping only runs at least `min_height` rows tall. A run still open at the
/// last row extends to the end of the block.
fn line_runs(projection: &[u32], threshold: f64, min_height: u32) -> Vec<(u32, u32)> {
    let mut runs = Vec::new();
    let last = projection.len().saturating_sub(1);
    let mut start: Option<usize> = None;

    for (i, &value) in projection.iter().enumerate() {
        let above = value as f64 > threshold;
        match start {
            None if above => {
                start = Some(i);
            }
            Some(s) if !above || i == last => {
                let end = if i == last && above { i + 1 } else { i };
                if end - s >= min_height as usize {
                    runs.push((s as u32, end as u32));
                }
                start = None;
            }
            _ => {}
        }
    }

    runs
}

fn whole_block(
    block_mask: &BinaryMask,
    block: BoundingBox,
    config: &LineSegmentationConfig,
) -> Vec<TextLine> {
    if block_mask.density() > config.min_block_density {
        vec![TextLine { bounds: block }]
    } else {
        Vec::new()
    }
}
