// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host-facing extraction API: single images, single pages and whole
// documents, with progress reporting and between-page cancellation.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use image::{DynamicImage, GrayImage};
use pagelift_core::error::{PageliftError, Result};
use pagelift_core::{ExtractionResult, FileKind, PipelineConfig, ProgressEvent};
use tracing::{debug, error, info, instrument, warn};

use crate::image::processor::{ImageProcessor, display_name, to_gray};
use crate::pdf::render::{DocumentOpener, PageSource, render_page_image};
use crate::pipeline::process_gray;
use crate::recognize::engine::RecognitionEngine;

/// Fallback name when the source path has no usable stem.
const DEFAULT_OUTPUT_NAME: &str = "extracted_text.txt";

// -- Progress and cancellation ------------------------------------------------

/// Receives progress events from multi-page jobs.
pub trait ProgressSink {
    fn report(&mut self, event: ProgressEvent);
}

impl<F: FnMut(ProgressEvent)> ProgressSink for F {
    fn report(&mut self, event: ProgressEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _event: ProgressEvent) {}
}

/// Set from any thread to stop a document job before its next page.
#[derive(Debug, Default)]
pub struct CancellationFlag(AtomicBool);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// -- Extractor ----------------------------------------------------------------

/// Runs the page pipeline with one recognition engine and configuration.
///
/// ```ignore
/// let extractor = Extractor::new(TesseractEngine::default(), PipelineConfig::default());
/// let result = extractor.extract_from_image_file("scan.png", "eng");
/// ```
pub struct Extractor<E> {
    engine: E,
    config: PipelineConfig,
}

impl<E: RecognitionEngine> Extractor<E> {
    pub fn new(engine: E, config: PipelineConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn config_for(&self, lang: &str) -> PipelineConfig {
        let mut config = self.config.clone();
        config.recognition.language = lang.to_string();
        config
    }

    // -- Single image ---------------------------------------------------------

    /// Extract text from an image file.
    #[instrument(skip_all, fields(path = %path.as_ref().display(), lang = %lang))]
    pub fn extract_from_image_file(&self, path: impl AsRef<Path>, lang: &str) -> ExtractionResult {
        let config = self.config_for(lang);
        let result = ImageProcessor::open(path.as_ref())
            .and_then(|image| process_gray(&self.engine, &image.to_gray(), &config));
        finish_single(result)
    }

    /// Extract text from an already-decoded image with the configured
    /// language. `source_name` only labels log output.
    #[instrument(skip_all, fields(source = source_name, width = image.width(), height = image.height()))]
    pub fn extract_from_image(&self, image: &DynamicImage, source_name: &str) -> ExtractionResult {
        finish_single(process_gray(&self.engine, &to_gray(image), &self.config))
    }

    // -- Documents ------------------------------------------------------------

    /// Extract text from page `index` (0-based) of an open document. The
    /// document stays open.
    #[instrument(skip_all, fields(page = index + 1, lang = %lang))]
    pub fn extract_from_page(&self, source: &dyn PageSource, index: usize, lang: &str) -> ExtractionResult {
        let config = self.config_for(lang);
        finish_single(self.page_text(source, index, &config))
    }

    /// Extract text from every page of the document at `path`.
    ///
    /// Pages are headed `--- Page N ---` (or `--- Page N (No text found) ---`)
    /// and a page that fails is replaced by `--- Error on Page N: <message> ---`.
    /// A missing engine or an unreadable document fails the whole job. The
    /// document is closed before this returns.
    #[instrument(skip_all, fields(path = %path.display(), lang = %lang))]
    pub fn extract_from_document(
        &self,
        opener: &dyn DocumentOpener,
        path: &Path,
        lang: &str,
        progress: &mut dyn ProgressSink,
        cancel: Option<&CancellationFlag>,
    ) -> ExtractionResult {
        let config = self.config_for(lang);
        let document = match opener.open(path) {
            Ok(document) => document,
            Err(err) => {
                error!(error = %err, "Could not open document");
                progress.report(ProgressEvent::Failed {
                    message: err.to_string(),
                });
                return ExtractionResult::from_error(&err);
            }
        };

        let total = document.page_count();
        info!(pages = total, document = %display_name(path), "Processing document");

        let mut segments = Vec::with_capacity(total);
        for index in 0..total {
            let page = index + 1;
            if cancel.is_some_and(CancellationFlag::is_cancelled) {
                warn!(pages_done = index, "Document job cancelled");
                segments.push(format!("--- Cancelled after page {index} ---"));
                break;
            }

            progress.report(ProgressEvent::Page {
                current: page,
                total,
            });
            match self.page_text(document.as_ref(), index, &config) {
                Ok(text) if text.is_empty() => {
                    segments.push(format!("--- Page {page} (No text found) ---"));
                }
                Ok(text) => segments.push(format!("--- Page {page} ---\n\n{text}")),
                Err(err) if err.is_fatal_to_job() => {
                    error!(page, error = %err, "Aborting document job");
                    progress.report(ProgressEvent::Failed {
                        message: err.to_string(),
                    });
                    return ExtractionResult::from_error(&err);
                }
                Err(err) => {
                    warn!(page, error = %err, "Page failed; continuing");
                    segments.push(format!("--- Error on Page {page}: {err} ---"));
                }
            }
        }
        drop(document);

        progress.report(ProgressEvent::Finished { pages: total });
        ExtractionResult::Text(segments.join("\n\n").trim().to_string())
    }

    /// Extract from an image or PDF, chosen by file extension. PDFs need an
    /// `opener`.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn extract_from_path(
        &self,
        opener: Option<&dyn DocumentOpener>,
        path: &Path,
        lang: &str,
        progress: &mut dyn ProgressSink,
        cancel: Option<&CancellationFlag>,
    ) -> ExtractionResult {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        match FileKind::from_extension(&extension) {
            Some(FileKind::Image) => self.extract_from_image_file(path, lang),
            Some(FileKind::Pdf) => match opener {
                Some(opener) => self.extract_from_document(opener, path, lang, progress, cancel),
                None => ExtractionResult::from_error(&PageliftError::RendererUnavailable(
                    "this build has no PDF renderer".into(),
                )),
            },
            None => {
                ExtractionResult::from_error(&PageliftError::UnsupportedFile(display_name(path)))
            }
        }
    }

    fn page_text(&self, source: &dyn PageSource, index: usize, config: &PipelineConfig) -> Result<String> {
        let rgb = render_page_image(source, index, config.render_dpi)?;
        let gray: GrayImage = to_gray(&DynamicImage::ImageRgb8(rgb));
        debug!(page = index + 1, "Page rasterised");
        process_gray(&self.engine, &gray, config)
    }
}

fn finish_single(result: Result<String>) -> ExtractionResult {
    if let Err(err) = &result {
        warn!(error = %err, "Extraction failed");
    }
    ExtractionResult::from(result)
}

/// File name to offer when saving a transcript: `<stem>_ocr.txt`, or
/// `<stem>_page<N>_ocr.txt` for the single page at 0-based `page`.
pub fn suggested_output_name(path: &Path, page: Option<usize>) -> String {
    let Some(stem) = path.file_stem().map(|stem| stem.to_string_lossy()) else {
        return DEFAULT_OUTPUT_NAME.to_string();
    };
    match page {
        Some(index) => format!("{stem}_page{}_ocr.txt", index + 1),
        None => format!("{stem}_ocr.txt"),
    }
}
