// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.
//
// Every threshold here is an empirically tuned heuristic carried over for
// behavioural compatibility. None of them is a validated constant: treat them
// as knobs, not as facts about documents.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PageliftError, Result};
use crate::types::PageSegMode;

/// Resolution PDF pages are rasterised at.
pub const PDF_RENDER_DPI: u32 = 300;

/// Settings handed to the recognition engine and the region preprocessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Engine language code (e.g. `eng`, `deu`, `eng+fra`).
    pub language: String,
    /// Layout hint for individual line regions.
    pub line_mode: PageSegMode,
    /// Layout hint for whole-page fallback recognition.
    pub page_mode: PageSegMode,
    /// Resolution hint passed to the engine.
    pub dpi: u32,
    /// Engine mode (Tesseract `--oem`).
    pub engine_mode: u8,
    pub preserve_interword_spaces: bool,

    // -- Grayscale-enhancement path --
    pub denoise: bool,
    /// Radius of the denoising filter. Zero disables it.
    pub denoise_strength: u32,
    pub contrast_normalize: bool,
    pub clahe_clip_limit: f32,
    pub clahe_tile_grid: u32,
    pub sharpen: bool,

    // -- Custom-binarized path --
    pub custom_binarize: bool,
    pub opening_on_binary: bool,
    pub opening_kernel_width: u32,

    // -- Shared --
    pub upscale: bool,
    pub target_text_height: u32,
    pub max_upscale_factor: f32,
    pub padding: u32,
    /// Per-region engine timeout in seconds. `None` waits indefinitely.
    pub engine_timeout_secs: Option<u64>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: "eng".into(),
            line_mode: PageSegMode::SingleLine,
            page_mode: PageSegMode::SingleBlock,
            dpi: 300,
            engine_mode: 3,
            preserve_interword_spaces: true,
            denoise: true,
            denoise_strength: 1,
            contrast_normalize: true,
            clahe_clip_limit: 2.0,
            clahe_tile_grid: 6,
            sharpen: true,
            custom_binarize: false,
            opening_on_binary: false,
            opening_kernel_width: 3,
            upscale: true,
            target_text_height: 35,
            max_upscale_factor: 3.0,
            padding: 10,
            engine_timeout_secs: None,
        }
    }
}

impl RecognitionConfig {
    /// Same settings with a different language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn engine_timeout(&self) -> Option<Duration> {
        self.engine_timeout_secs.map(Duration::from_secs)
    }
}

/// Parameters of the locally adaptive (Sauvola) threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarizationConfig {
    /// Side of the square neighbourhood. Even values are bumped to odd.
    pub window_size: u32,
    /// Sensitivity to local contrast.
    pub k: f64,
    /// Expected dynamic range of the standard deviation.
    pub r: f64,
    /// Apply a 3x3 Gaussian blur before thresholding.
    pub pre_blur: bool,
}

impl Default for BinarizationConfig {
    fn default() -> Self {
        Self {
            window_size: 21,
            k: 0.2,
            r: 128.0,
            pre_blur: true,
        }
    }
}

/// One heuristic configuration tried by the block detector.
///
/// Kernel sides are `max(min, image_side / factor)`, forced odd.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyProfile {
    pub name: String,
    pub dilate_w_factor: u32,
    pub dilate_h_factor: u32,
    pub dilate_min_w: u32,
    pub dilate_min_h: u32,
    pub dilate_iterations: u32,
    pub close_w_factor: u32,
    pub close_h_factor: u32,
    pub close_min_w: u32,
    pub close_min_h: u32,
    pub close_iterations: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub min_area: f64,
    /// Minimum ink density for an accepted block.
    pub density_threshold: f64,
    /// Logo/header candidates sparser than this are discarded.
    pub logo_max_density: f64,
}

impl StrategyProfile {
    /// The reference profiles, in priority order.
    pub fn reference_profiles() -> Vec<StrategyProfile> {
        vec![
            StrategyProfile {
                name: "Default".into(),
                dilate_w_factor: 70,
                dilate_h_factor: 300,
                dilate_min_w: 15,
                dilate_min_h: 3,
                dilate_iterations: 1,
                close_w_factor: 50,
                close_h_factor: 80,
                close_min_w: 15,
                close_min_h: 10,
                close_iterations: 1,
                min_width: 20,
                min_height: 10,
                min_area: 200.0,
                density_threshold: 0.01,
                logo_max_density: 0.15,
            },
            StrategyProfile {
                name: "AggressiveHorizontal".into(),
                dilate_w_factor: 40,
                dilate_h_factor: 400,
                dilate_min_w: 25,
                dilate_min_h: 2,
                dilate_iterations: 1,
                close_w_factor: 30,
                close_h_factor: 60,
                close_min_w: 30,
                close_min_h: 15,
                close_iterations: 2,
                min_width: 15,
                min_height: 8,
                min_area: 150.0,
                density_threshold: 0.008,
                logo_max_density: 0.10,
            },
            StrategyProfile {
                name: "SmallerComponents".into(),
                dilate_w_factor: 100,
                dilate_h_factor: 500,
                dilate_min_w: 10,
                dilate_min_h: 1,
                dilate_iterations: 1,
                close_w_factor: 80,
                close_h_factor: 100,
                close_min_w: 10,
                close_min_h: 5,
                close_iterations: 1,
                min_width: 10,
                min_height: 5,
                min_area: 100.0,
                density_threshold: 0.015,
                logo_max_density: 0.20,
            },
            StrategyProfile {
                name: "StrongerBlockClosing".into(),
                dilate_w_factor: 90,
                dilate_h_factor: 300,
                dilate_min_w: 10,
                dilate_min_h: 3,
                dilate_iterations: 1,
                close_w_factor: 40,
                close_h_factor: 30,
                close_min_w: 20,
                close_min_h: 20,
                close_iterations: 2,
                min_width: 20,
                min_height: 10,
                min_area: 200.0,
                density_threshold: 0.01,
                logo_max_density: 0.15,
            },
        ]
    }

    /// Dilation kernel (width, height) for an image of the given size.
    pub fn dilate_kernel(&self, image_width: u32, image_height: u32) -> (u32, u32) {
        (
            kernel_side(image_width, self.dilate_w_factor, self.dilate_min_w),
            kernel_side(image_height, self.dilate_h_factor, self.dilate_min_h),
        )
    }

    /// Closing kernel (width, height) for an image of the given size.
    pub fn close_kernel(&self, image_width: u32, image_height: u32) -> (u32, u32) {
        (
            kernel_side(image_width, self.close_w_factor, self.close_min_w),
            kernel_side(image_height, self.close_h_factor, self.close_min_h),
        )
    }
}

fn kernel_side(image_side: u32, factor: u32, floor: u32) -> u32 {
    let side = floor.max(image_side / factor.max(1)).max(1);
    if side % 2 == 0 { side + 1 } else { side }
}

/// Geometry gates shared by every strategy profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockAcceptance {
    /// Blocks covering this fraction of the page or more are rejected.
    pub max_area_fraction: f64,
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
    /// Logo/header candidates start above this fraction of the page height...
    pub logo_top_fraction: f64,
    /// ...are shorter than this fraction of the page height...
    pub logo_max_height_fraction: f64,
    /// ...wider than this fraction of the page width...
    pub logo_min_width_fraction: f64,
    /// ...wider than this aspect ratio...
    pub logo_min_aspect_ratio: f64,
    /// ...and smaller than this fraction of the page area.
    pub logo_max_area_fraction: f64,
}

impl Default for BlockAcceptance {
    fn default() -> Self {
        Self {
            max_area_fraction: 0.95,
            min_aspect_ratio: 0.05,
            max_aspect_ratio: 75.0,
            logo_top_fraction: 0.15,
            logo_max_height_fraction: 0.10,
            logo_min_width_fraction: 0.15,
            logo_min_aspect_ratio: 2.0,
            logo_max_area_fraction: 0.10,
        }
    }
}

/// Thresholds of the projection-profile line segmenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineSegmentationConfig {
    /// Blocks shorter than this are returned whole.
    pub tiny_block_height: u32,
    /// Blocks narrower than this are returned whole.
    pub tiny_block_width: u32,
    /// Ink density a whole-block fallback must exceed.
    pub min_block_density: f64,
    /// Rows with less ink than this fraction of the width are noise.
    pub row_noise_fraction: f64,
    pub min_meaningful_rows: usize,
    /// Line threshold as a fraction of the mean meaningful-row ink.
    pub threshold_fraction: f64,
    pub min_threshold: f64,
    pub min_line_height: u32,
    /// Minimum line height is also `block_height / line_height_divisor`.
    pub line_height_divisor: u32,
    /// Minimum ink pixels in a line strip, as a fraction of its area.
    pub min_strip_ink_fraction: f64,
    /// Some column must carry more ink than this fraction of the line height.
    pub min_column_run_fraction: f64,
}

impl Default for LineSegmentationConfig {
    fn default() -> Self {
        Self {
            tiny_block_height: 5,
            tiny_block_width: 10,
            min_block_density: 0.01,
            row_noise_fraction: 0.005,
            min_meaningful_rows: 3,
            threshold_fraction: 0.25,
            min_threshold: 1.0,
            min_line_height: 3,
            line_height_divisor: 50,
            min_strip_ink_fraction: 0.002,
            min_column_run_fraction: 0.03,
        }
    }
}

/// Complete, immutable configuration threaded through every pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub binarization: BinarizationConfig,
    pub strategies: Vec<StrategyProfile>,
    pub block_acceptance: BlockAcceptance,
    pub lines: LineSegmentationConfig,
    pub recognition: RecognitionConfig,
    /// DPI used when rasterising PDF pages.
    pub render_dpi: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            binarization: BinarizationConfig::default(),
            strategies: StrategyProfile::reference_profiles(),
            block_acceptance: BlockAcceptance::default(),
            lines: LineSegmentationConfig::default(),
            recognition: RecognitionConfig::default(),
            render_dpi: PDF_RENDER_DPI,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        info!(path = %path.display(), strategies = config.strategies.len(), "Configuration loaded");
        Ok(config)
    }

    /// Write this configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        debug!(path = %path.as_ref().display(), "Configuration saved");
        Ok(())
    }

    /// Reject configurations no stage can work with.
    pub fn validate(&self) -> Result<()> {
        if self.binarization.window_size == 0 {
            return Err(PageliftError::InvalidInput(
                "binarization window size must be positive".into(),
            ));
        }
        if self.binarization.r <= 0.0 {
            return Err(PageliftError::InvalidInput(
                "binarization dynamic range must be positive".into(),
            ));
        }
        if self.strategies.is_empty() {
            return Err(PageliftError::InvalidInput(
                "at least one strategy profile is required".into(),
            ));
        }
        if self.recognition.language.trim().is_empty() {
            return Err(PageliftError::InvalidInput(
                "recognition language must not be empty".into(),
            ));
        }
        if self.render_dpi == 0 {
            return Err(PageliftError::InvalidInput("render DPI must be positive".into()));
        }
        Ok(())
    }
}
