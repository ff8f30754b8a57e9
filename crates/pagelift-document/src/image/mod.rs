// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: decoding, grayscale conversion and the pixel operations used
// by the region preprocessor.

pub mod ops;
pub mod processor;

pub use processor::ImageProcessor;
