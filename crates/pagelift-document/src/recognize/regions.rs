// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Drive the engine over the regions of one page.

use image::GrayImage;
use pagelift_core::error::{PageliftError, Result};
use pagelift_core::{BoundingBox, RecognitionConfig};
use tracing::{debug, error, instrument, warn};

use crate::recognize::engine::{RecognitionEngine, RecognitionError, RecognitionRequest};
use crate::scan::mask::BinaryMask;
use crate::scan::prepare::{prepare_page, prepare_region};

/// Recognise every region of a page and join the non-empty results with
/// newlines, in region order.
///
/// A region the engine fails on is replaced by an `[OCR Error ROI <i>]`
/// marker. A missing engine aborts immediately with
/// [`PageliftError::EngineUnavailable`].
#[instrument(skip_all, fields(regions = regions.len(), lang = %config.language))]
pub fn recognize_regions<E: RecognitionEngine + ?Sized>(
    engine: &E,
    gray: &GrayImage,
    page_mask: Option<&BinaryMask>,
    regions: &[BoundingBox],
    config: &RecognitionConfig,
) -> Result<String> {
    let request = RecognitionRequest::for_region(config);
    let mut outputs = Vec::with_capacity(regions.len());

    for (i, region) in regions.iter().enumerate() {
        let Some(prepared) = prepare_region(gray, page_mask, *region, config) else {
            continue;
        };
        match engine.recognize(&prepared, &request) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    outputs.push(text.to_string());
                }
            }
            Err(err) if err.is_fatal() => {
                error!("Recognition engine not found");
                return Err(PageliftError::EngineUnavailable);
            }
            Err(err) => {
                warn!(
                    roi = i,
                    region = %region,
                    lang = %config.language,
                    shape = ?prepared.dimensions(),
                    error = %err,
                    "Recognition failed on region"
                );
                outputs.push(format!("[OCR Error ROI {i}]"));
            }
        }
    }

    debug!(outputs = outputs.len(), "Regions recognised");
    Ok(outputs.join("\n"))
}

/// Recognise a whole page as one block, for pages where no regions were
/// found.
#[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
pub fn recognize_page<E: RecognitionEngine + ?Sized>(
    engine: &E,
    gray: &GrayImage,
    config: &RecognitionConfig,
) -> Result<String> {
    let prepared = prepare_page(gray, config);
    engine
        .recognize(&prepared, &RecognitionRequest::for_page(config))
        .map(|text| text.trim().to_string())
        .map_err(|err| match err {
            RecognitionError::EngineMissing => PageliftError::EngineUnavailable,
            RecognitionError::Failed { reason } => PageliftError::Recognition(reason),
            timed_out @ RecognitionError::TimedOut { .. } => {
                PageliftError::Recognition(timed_out.to_string())
            }
        })
}
