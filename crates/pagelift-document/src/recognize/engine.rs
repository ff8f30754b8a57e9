// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The recognition-engine boundary: one prepared grayscale image in, text or a
// typed failure out.

use std::time::Duration;

use image::GrayImage;
use pagelift_core::{PageSegMode, RecognitionConfig};
use thiserror::Error;

/// Parameters for one engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionRequest {
    pub language: String,
    pub mode: PageSegMode,
    pub dpi: u32,
    pub engine_mode: u8,
    pub preserve_interword_spaces: bool,
    /// Kill the engine if it runs longer than this.
    pub timeout: Option<Duration>,
}

impl RecognitionRequest {
    /// Request for a single line or block region.
    pub fn for_region(config: &RecognitionConfig) -> Self {
        Self::with_mode(config, config.line_mode)
    }

    /// Request for whole-page recognition.
    pub fn for_page(config: &RecognitionConfig) -> Self {
        Self::with_mode(config, config.page_mode)
    }

    fn with_mode(config: &RecognitionConfig, mode: PageSegMode) -> Self {
        Self {
            language: config.language.clone(),
            mode,
            dpi: config.dpi,
            engine_mode: config.engine_mode,
            preserve_interword_spaces: config.preserve_interword_spaces,
            timeout: config.engine_timeout(),
        }
    }
}

/// Failure reported by a recognition engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    /// The engine is not installed; no region can succeed.
    #[error("recognition engine not found")]
    EngineMissing,

    #[error("{reason}")]
    Failed { reason: String },

    #[error("engine timed out after {}s", after.as_secs())]
    TimedOut { after: Duration },
}

/// How a caller should react to a [`RecognitionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Abort the whole job.
    Fatal,
    /// Mark this region and move on.
    Recoverable,
}

impl RecognitionError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::EngineMissing => ErrorClass::Fatal,
            Self::Failed { .. } | Self::TimedOut { .. } => ErrorClass::Recoverable,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }
}

/// Anything that can turn a prepared image into text.
pub trait RecognitionEngine {
    fn recognize(
        &self,
        image: &GrayImage,
        request: &RecognitionRequest,
    ) -> Result<String, RecognitionError>;
}

impl<T: RecognitionEngine + ?Sized> RecognitionEngine for &T {
    fn recognize(
        &self,
        image: &GrayImage,
        request: &RecognitionRequest,
    ) -> Result<String, RecognitionError> {
        (**self).recognize(image, request)
    }
}

impl<T: RecognitionEngine + ?Sized> RecognitionEngine for Box<T> {
    fn recognize(
        &self,
        image: &GrayImage,
        request: &RecognitionRequest,
    ) -> Result<String, RecognitionError> {
        (**self).recognize(image, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_a_missing_engine_is_fatal() {
        assert!(RecognitionError::EngineMissing.is_fatal());
        assert!(!RecognitionError::Failed { reason: "x".into() }.is_fatal());
        let timeout = RecognitionError::TimedOut {
            after: Duration::from_secs(5),
        };
        assert_eq!(timeout.class(), ErrorClass::Recoverable);
        assert_eq!(timeout.to_string(), "engine timed out after 5s");
    }

    #[test]
    fn requests_follow_config() {
        let config = RecognitionConfig {
            engine_timeout_secs: Some(9),
            ..RecognitionConfig::default().with_language("deu")
        };
        let region = RecognitionRequest::for_region(&config);
        assert_eq!(region.mode, PageSegMode::SingleLine);
        assert_eq!(region.language, "deu");
        assert_eq!(region.timeout, Some(Duration::from_secs(9)));
        assert_eq!(RecognitionRequest::for_page(&config).mode, PageSegMode::SingleBlock);
    }
}
