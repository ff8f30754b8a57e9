// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-page pipeline: binarize, find blocks, split them into lines,
// recognise each line and clean the transcript. Pages without usable lines are
// recognised whole.

use image::GrayImage;
use pagelift_core::error::{PageliftError, Result};
use pagelift_core::{BoundingBox, PipelineConfig, TextBlock, TextLine};
use tracing::{debug, info, instrument, warn};

use crate::recognize::engine::RecognitionEngine;
use crate::recognize::regions::{recognize_page, recognize_regions};
use crate::scan::binarize::{BinarizationMethod, binarize};
use crate::scan::blocks::detect_blocks;
use crate::scan::lines::segment_lines;
use crate::scan::mask::BinaryMask;
use crate::text::clean;

/// Layout found on one page.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub mask: BinaryMask,
    pub method: BinarizationMethod,
    pub blocks: Vec<TextBlock>,
    /// Lines of every block, block by block, top to bottom within a block.
    pub lines: Vec<TextLine>,
}

/// Binarize a page and locate its blocks and lines.
#[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
pub fn analyze_page(gray: &GrayImage, config: &PipelineConfig) -> PageLayout {
    let (mask, method) = binarize(gray, &config.binarization);
    let blocks = detect_blocks(&mask, &config.strategies, &config.block_acceptance);

    let mut lines = Vec::new();
    for block in &blocks {
        let Some(block_mask) = mask.crop(block.bounds) else {
            continue;
        };
        let found = segment_lines(&block_mask, block.bounds, &config.lines);
        if found.is_empty() {
            debug!(block = %block.bounds, "Block has no lines; skipped");
            continue;
        }
        lines.extend(found);
    }

    info!(blocks = blocks.len(), lines = lines.len(), method = ?method, "Page layout analysed");
    PageLayout {
        mask,
        method,
        blocks,
        lines,
    }
}

/// Extract the text of one grayscale page.
///
/// A missing recognition engine is an error; failures on individual lines
/// leave a marker in the text instead.
#[instrument(skip_all, fields(width = gray.width(), height = gray.height(), lang = %config.recognition.language))]
pub fn process_gray<E: RecognitionEngine + ?Sized>(
    engine: &E,
    gray: &GrayImage,
    config: &PipelineConfig,
) -> Result<String> {
    if gray.width() == 0 || gray.height() == 0 {
        return Err(PageliftError::InvalidInput("image has no pixels".into()));
    }

    let layout = analyze_page(gray, config);
    let raw = if layout.lines.is_empty() {
        if layout.blocks.is_empty() {
            warn!("No text blocks found; recognising the whole page");
        } else {
            warn!(blocks = layout.blocks.len(), "No text lines found; recognising the whole page");
        }
        recognize_page(engine, gray, &config.recognition)?
    } else {
        let regions: Vec<BoundingBox> = layout.lines.iter().map(|line| line.bounds).collect();
        recognize_regions(engine, gray, Some(&layout.mask), &regions, &config.recognition)?
    };

    let text = clean(&raw);
    debug!(chars = text.len(), "Page transcript cleaned");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedEngine, glyph_row_image};
    use image::Luma;
    use pagelift_core::PageSegMode;

    #[test]
    fn glyph_row_is_one_block_and_one_line() {
        let layout = analyze_page(&glyph_row_image(), &PipelineConfig::default());
        assert_eq!(layout.method, BinarizationMethod::Sauvola);
        assert_eq!(layout.blocks.len(), 1);
        assert_eq!(layout.lines.len(), 1);

        let line = layout.lines[0].bounds;
        assert!((88..=92).contains(&line.y), "line starts at {}", line.y);
        assert!((108..=112).contains(&line.bottom()), "line ends at {}", line.bottom());
    }

    #[test]
    fn lines_are_recognised_one_by_one() {
        let engine = ScriptedEngine::new([Reply::Text("  hello \t world \n".into())]);
        let text = process_gray(&engine, &glyph_row_image(), &PipelineConfig::default()).unwrap();
        assert_eq!(text, "hello world");
        assert_eq!(engine.modes(), [PageSegMode::SingleLine]);
    }

    #[test]
    fn blank_page_falls_back_to_whole_page() {
        let blank = GrayImage::from_pixel(400, 200, Luma([255]));
        let layout = analyze_page(&blank, &PipelineConfig::default());
        assert!(layout.blocks.is_empty());

        let engine = ScriptedEngine::new([]);
        let text = process_gray(&engine, &blank, &PipelineConfig::default()).unwrap();
        assert!(text.is_empty());
        assert_eq!(engine.modes(), [PageSegMode::SingleBlock]);
    }

    #[test]
    fn empty_image_is_invalid_input() {
        let engine = ScriptedEngine::new([]);
        let result = process_gray(&engine, &GrayImage::new(0, 0), &PipelineConfig::default());
        assert!(matches!(result, Err(PageliftError::InvalidInput(_))));
        assert_eq!(engine.calls(), 0);
    }

    #[test]
    fn missing_engine_is_an_error() {
        let engine = ScriptedEngine::new([Reply::Missing]);
        let result = process_gray(&engine, &glyph_row_image(), &PipelineConfig::default());
        assert!(matches!(result, Err(PageliftError::EngineUnavailable)));
    }
}
