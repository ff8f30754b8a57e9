// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: the page-renderer boundary and the optional PDFium backend.

pub mod render;

#[cfg(feature = "pdfium")]
pub mod pdfium;

pub use render::{DocumentOpener, PageSource, PixelLayout, RawPixmap, render_page_image};

#[cfg(feature = "pdfium")]
pub use self::pdfium::PdfiumOpener;
