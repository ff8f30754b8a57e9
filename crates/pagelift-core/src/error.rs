// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagelift.

use thiserror::Error;

/// Top-level error type for all Pagelift operations.
#[derive(Debug, Error)]
pub enum PageliftError {
    // -- Input errors --
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    /// Both the adaptive and the global threshold failed. Never surfaced while
    /// the global fallback can still produce a mask.
    #[error("binarization failed: {0}")]
    Binarization(String),

    // -- Recognition errors --
    #[error(
        "Tesseract Error: Executable not found. Ensure Tesseract is installed and in your system's PATH."
    )]
    EngineUnavailable,

    #[error("recognition failed: {0}")]
    Recognition(String),

    // -- Document errors --
    #[error("PDF Error: File not found at '{0}'.")]
    DocumentNotFound(String),

    #[error(
        "PDF Error: Cannot open or read '{0}'. File may be corrupted or password-protected."
    )]
    DocumentUnreadable(String),

    #[error("Error rendering PDF page {page}: {reason}")]
    PageRender { page: usize, reason: String },

    #[error("PDF rendering is not available: {0}")]
    RendererUnavailable(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PageliftError {
    /// Whether this error must abort a whole multi-page job rather than just
    /// the page it occurred on.
    pub fn is_fatal_to_job(&self) -> bool {
        matches!(
            self,
            Self::EngineUnavailable | Self::DocumentNotFound(_) | Self::DocumentUnreadable(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PageliftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_unavailable_is_fatal() {
        assert!(PageliftError::EngineUnavailable.is_fatal_to_job());
        assert!(PageliftError::DocumentUnreadable("a.pdf".into()).is_fatal_to_job());
    }

    #[test]
    fn page_render_is_not_fatal() {
        let err = PageliftError::PageRender {
            page: 2,
            reason: "bad xref".into(),
        };
        assert!(!err.is_fatal_to_job());
        assert_eq!(err.to_string(), "Error rendering PDF page 2: bad xref");
    }
}
