// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: binarization, block detection, line segmentation and
// region preparation.

pub mod binarize;
pub mod blocks;
pub mod lines;
pub mod mask;
pub mod prepare;

pub use binarize::{BinarizationMethod, binarize};
pub use blocks::detect_blocks;
pub use lines::segment_lines;
pub use mask::BinaryMask;
pub use prepare::{prepare_page, prepare_region};
