// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition: the engine boundary, the Tesseract adapter and the per-page
// region driver.

pub mod engine;
pub mod regions;
pub mod tesseract;

pub use engine::{ErrorClass, RecognitionEngine, RecognitionError, RecognitionRequest};
pub use regions::{recognize_page, recognize_regions};
pub use tesseract::TesseractEngine;
