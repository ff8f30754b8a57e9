// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagelift-document: Text extraction for scanned images and PDF pages.
//
// Provides image loading and grayscale conversion, a scanning pipeline
// (adaptive binarization, morphological block detection, projection-profile
// line segmentation, region enhancement), a recognition-engine boundary with a
// Tesseract adapter, transcript cleanup, a page-renderer boundary, and the
// multi-page document aggregator.

pub mod extract;
pub mod image;
pub mod pdf;
pub mod pipeline;
pub mod recognize;
pub mod scan;
pub mod text;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the primary structs so callers can use `pagelift_document::Extractor` etc.
pub use extract::{CancellationFlag, Extractor, NoProgress, ProgressSink, suggested_output_name};
pub use image::processor::ImageProcessor;
pub use pdf::render::{DocumentOpener, PageSource, PixelLayout, RawPixmap};
pub use recognize::engine::{RecognitionEngine, RecognitionError, RecognitionRequest};
pub use recognize::tesseract::TesseractEngine;
pub use scan::mask::BinaryMask;
pub use text::clean;

#[cfg(feature = "pdfium")]
pub use pdf::pdfium::PdfiumOpener;

