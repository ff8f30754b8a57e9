// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagelift extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::error::PageliftError;

/// Axis-aligned rectangle in source-image pixel coordinates.
///
/// Width and height are always positive for boxes produced by the pipeline;
/// consumers still clamp against the image they crop from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width divided by height (0.0 for a zero-height box).
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    /// Intersect with an image of the given size. Returns `None` if nothing
    /// of the box lies inside the image.
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<Self> {
        let x1 = self.x.min(image_width);
        let y1 = self.y.min(image_height);
        let x2 = self.right().min(image_width);
        let y2 = self.bottom().min(image_height);
        if x1 >= x2 || y1 >= y2 {
            return None;
        }
        Some(Self::new(x1, y1, x2 - x1, y2 - y1))
    }

    /// Whether `other` lies entirely within this box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "x{} y{} w{} h{}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// A text-bearing region found by block detection, tagged with the strategy
/// profile that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub bounds: BoundingBox,
    pub profile: String,
}

/// A single text line inside a block, in global image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLine {
    pub bounds: BoundingBox,
}

/// Recognition-engine layout hint (Tesseract `--psm` values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSegMode {
    /// Fully automatic page segmentation, no orientation detection.
    Auto,
    /// A single uniform block of text.
    SingleBlock,
    /// A single text line.
    SingleLine,
    /// A single word.
    SingleWord,
    /// As much text as possible, in no particular order.
    SparseText,
}

impl PageSegMode {
    /// Numeric value passed to the engine.
    pub fn as_psm(&self) -> u8 {
        match self {
            Self::Auto => 3,
            Self::SingleBlock => 6,
            Self::SingleLine => 7,
            Self::SingleWord => 8,
            Self::SparseText => 11,
        }
    }
}

/// Input kinds the host-facing API accepts, inferred from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    Image,
    Pdf,
}

impl FileKind {
    /// Infer the input kind from a file extension (case-insensitive, no dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "bmp" | "tif" | "tiff" => Some(Self::Image),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Classification of a failed extraction, mirroring the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Null, malformed or unreadable input.
    InvalidInput,
    /// Not an image or PDF.
    UnsupportedFile,
    /// The recognition engine is not installed.
    EngineUnavailable,
    /// The engine ran but failed on the whole image.
    Recognition,
    /// The document is missing, corrupted or encrypted.
    DocumentUnreadable,
    /// A single page could not be rendered.
    PageRender,
    /// Anything else (I/O, serialization).
    Internal,
}

impl From<&PageliftError> for FailureKind {
    fn from(err: &PageliftError) -> Self {
        match err {
            PageliftError::InvalidInput(_)
            | PageliftError::ImageError(_)
            | PageliftError::Binarization(_) => Self::InvalidInput,
            PageliftError::UnsupportedFile(_) => Self::UnsupportedFile,
            PageliftError::EngineUnavailable => Self::EngineUnavailable,
            PageliftError::Recognition(_) => Self::Recognition,
            PageliftError::DocumentNotFound(_)
            | PageliftError::DocumentUnreadable(_)
            | PageliftError::RendererUnavailable(_) => Self::DocumentUnreadable,
            PageliftError::PageRender { .. } => Self::PageRender,
            PageliftError::Io(_) | PageliftError::Serialization(_) => Self::Internal,
        }
    }
}

/// A classified failure with a message suitable for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of an extraction: text (possibly empty, meaning nothing was found)
/// or a classified failure. Exactly one of the two is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionResult {
    Text(String),
    Failed(ExtractionFailure),
}

impl ExtractionResult {
    /// Build a failed result from a pipeline error.
    pub fn from_error(err: &PageliftError) -> Self {
        Self::Failed(ExtractionFailure {
            kind: FailureKind::from(err),
            message: err.to_string(),
        })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ExtractionFailure> {
        match self {
            Self::Text(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl From<crate::error::Result<String>> for ExtractionResult {
    fn from(result: crate::error::Result<String>) -> Self {
        match result {
            Ok(text) => Self::Text(text),
            Err(err) => Self::from_error(&err),
        }
    }
}

/// Progress notifications emitted by multi-page jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressEvent {
    /// About to process page `current` (1-indexed) of `total`.
    Page { current: usize, total: usize },
    /// All pages processed.
    Finished { pages: usize },
    /// The job stopped early.
    Failed { message: String },
}

impl std::fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Page { current, total } => {
                write!(f, "Processing PDF Page {current}/{total}...")
            }
            Self::Finished { pages } => write!(f, "Finished processing {pages} PDF pages."),
            Self::Failed { message } => write!(f, "Error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_trims_to_image() {
        let bbox = BoundingBox::new(90, 40, 20, 20);
        assert_eq!(bbox.clamp_to(100, 50), Some(BoundingBox::new(90, 40, 10, 10)));
    }

    #[test]
    fn clamp_outside_is_none() {
        let bbox = BoundingBox::new(120, 10, 5, 5);
        assert_eq!(bbox.clamp_to(100, 50), None);
    }

    #[test]
    fn file_kind_from_extension() {
        assert_eq!(FileKind::from_extension("PNG"), Some(FileKind::Image));
        assert_eq!(FileKind::from_extension("tif"), Some(FileKind::Image));
        assert_eq!(FileKind::from_extension("pdf"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_extension("docx"), None);
    }

    #[test]
    fn extraction_result_has_exactly_one_side() {
        let ok = ExtractionResult::Text(String::new());
        assert_eq!(ok.text(), Some(""));
        assert!(ok.error().is_none());

        let failed = ExtractionResult::from_error(&PageliftError::EngineUnavailable);
        assert!(failed.text().is_none());
        assert_eq!(
            failed.error().map(|f| f.kind),
            Some(FailureKind::EngineUnavailable)
        );
    }

    #[test]
    fn progress_messages() {
        let event = ProgressEvent::Page {
            current: 2,
            total: 5,
        };
        assert_eq!(event.to_string(), "Processing PDF Page 2/5...");
        assert_eq!(
            ProgressEvent::Finished { pages: 5 }.to_string(),
            "Finished processing 5 PDF pages."
        );
    }

    #[test]
    fn psm_values() {
        assert_eq!(PageSegMode::SingleLine.as_psm(), 7);
        assert_eq!(PageSegMode::SingleBlock.as_psm(), 6);
    }
}
