// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF rasterization with PDFium through `pdfium-render`. Available with the
// `pdfium` feature; the PDFium shared library is looked up next to the
// executable first, then on the system library path.

use std::path::Path;

use pagelift_core::error::{PageliftError, Result};
use pdfium_render::prelude::*;
use tracing::{debug, info, instrument};

use crate::image::processor::display_name;
use crate::pdf::render::{DocumentOpener, PageSource, PixelLayout, RawPixmap};

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Opens PDF documents with a bound PDFium library.
pub struct PdfiumOpener {
    pdfium: Pdfium,
}

impl PdfiumOpener {
    /// Bind to the PDFium library.
    #[instrument]
    pub fn new() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| PageliftError::RendererUnavailable(err.to_string()))?;
        info!("PDFium bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl DocumentOpener for PdfiumOpener {
    #[instrument(skip_all, fields(path = %path.display()))]
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>> {
        if !path.exists() {
            return Err(PageliftError::DocumentNotFound(path.display().to_string()));
        }
        let name = display_name(path);
        let document = self.pdfium.load_pdf_from_file(path, None).map_err(|err| {
            debug!(error = %err, "PDFium could not load document");
            PageliftError::DocumentUnreadable(name.clone())
        })?;
        info!(pages = document.pages().len() as usize, "PDF opened");
        Ok(Box::new(PdfiumDocument { document, name }))
    }
}

/// An open PDFium document. Dropping it closes the document.
struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    name: String,
}

impl PageSource for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    #[instrument(skip(self), fields(document = %self.name))]
    fn render_page(&self, index: usize, dpi: u32) -> Result<RawPixmap> {
        let page_error = |reason: String| PageliftError::PageRender {
            page: index + 1,
            reason,
        };
        let page_index = index
            .try_into()
            .map_err(|_| page_error("Invalid PDF document or page index.".into()))?;
        let page = self
            .document
            .pages()
            .get(page_index)
            .map_err(|err| page_error(err.to_string()))?;

        let config = PdfRenderConfig::new()
            .scale_page_by_factor(dpi as f32 / POINTS_PER_INCH)
            .render_form_data(true)
            .render_annotations(true);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|err| page_error(err.to_string()))?;

        let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
        RawPixmap::new(width, height, PixelLayout::Rgba, bitmap.as_rgba_bytes())
            .map_err(|err| page_error(err.to_string()))
    }
}

impl Drop for PdfiumDocument<'_> {
    fn drop(&mut self) {
        debug!(document = %self.name, "PDF closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        // Needs a PDFium library on this machine.
        let Ok(opener) = PdfiumOpener::new() else {
            return;
        };
        let result = opener.open(Path::new("/nonexistent/pagelift/report.pdf"));
        assert!(matches!(result, Err(PageliftError::DocumentNotFound(_))));
    }

    #[test]
    fn garbage_is_unreadable() {
        let Ok(opener) = PdfiumOpener::new() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.7 this is not a document").unwrap();
        match opener.open(&path) {
            Err(PageliftError::DocumentUnreadable(name)) => assert_eq!(name, "broken.pdf"),
            Err(other) => panic!("expected an unreadable document, got {other}"),
            Ok(_) => panic!("garbage opened as a PDF"),
        }
    }
}
