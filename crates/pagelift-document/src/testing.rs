// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test doubles and synthetic pages shared by the unit tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{GrayImage, Luma};
use pagelift_core::error::{PageliftError, Result};
use pagelift_core::{BoundingBox, PageSegMode};

use crate::pdf::render::{DocumentOpener, PageSource, PixelLayout, RawPixmap};
use crate::recognize::engine::{RecognitionEngine, RecognitionError, RecognitionRequest};
use crate::scan::mask::BinaryMask;

// -- Synthetic pages ----------------------------------------------------------

pub const PAGE_WIDTH: u32 = 400;
pub const PAGE_HEIGHT: u32 = 200;

/// Ten 12x20 glyph boxes, 28 px apart from x = 60, on rows 90..110.
pub fn glyph_boxes() -> Vec<BoundingBox> {
    (0..10).map(|i| BoundingBox::new(60 + 28 * i, 90, 12, 20)).collect()
}

/// A 400x200 mask holding one row of glyphs.
pub fn glyph_row_mask() -> BinaryMask {
    let mut mask = BinaryMask::new(PAGE_WIDTH, PAGE_HEIGHT);
    for glyph in glyph_boxes() {
        mask.fill(glyph);
    }
    mask
}

/// A white 400x200 page with one row of black glyphs.
pub fn glyph_row_image() -> GrayImage {
    let mut gray = GrayImage::from_pixel(PAGE_WIDTH, PAGE_HEIGHT, Luma([255]));
    for glyph in glyph_boxes() {
        for y in glyph.y..glyph.bottom() {
            for x in glyph.x..glyph.right() {
                gray.put_pixel(x, y, Luma([0]));
            }
        }
    }
    gray
}

// -- Recognition engine -------------------------------------------------------

/// What a [`ScriptedEngine`] answers to one call.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
    TimeOut,
    Missing,
}

/// Engine answering from a fixed script; an exhausted script answers with
/// empty text.
pub struct ScriptedEngine {
    replies: Mutex<VecDeque<Reply>>,
    modes: Mutex<Vec<PageSegMode>>,
}

impl ScriptedEngine {
    pub fn new<const N: usize>(replies: [Reply; N]) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            modes: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.modes.lock().unwrap().len()
    }

    /// Page-segmentation mode of every call, in order.
    pub fn modes(&self) -> Vec<PageSegMode> {
        self.modes.lock().unwrap().clone()
    }
}

impl RecognitionEngine for ScriptedEngine {
    fn recognize(
        &self,
        _image: &GrayImage,
        request: &RecognitionRequest,
    ) -> std::result::Result<String, RecognitionError> {
        self.modes.lock().unwrap().push(request.mode);
        match self.replies.lock().unwrap().pop_front() {
            None => Ok(String::new()),
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail) => Err(RecognitionError::Failed {
                reason: "scripted failure".into(),
            }),
            Some(Reply::TimeOut) => Err(RecognitionError::TimedOut {
                after: Duration::from_secs(1),
            }),
            Some(Reply::Missing) => Err(RecognitionError::EngineMissing),
        }
    }
}

// -- Documents ----------------------------------------------------------------

/// One page of a [`MockDocument`].
#[derive(Debug, Clone)]
pub enum MockPage {
    Pixels(RawPixmap),
    Broken,
}

impl MockPage {
    pub const WIDTH: u32 = 120;
    pub const HEIGHT: u32 = 80;

    /// A white RGBA page.
    pub fn blank() -> Self {
        let samples = vec![255; (Self::WIDTH * Self::HEIGHT * 4) as usize];
        match RawPixmap::new(Self::WIDTH, Self::HEIGHT, PixelLayout::Rgba, samples) {
            Ok(pixmap) => Self::Pixels(pixmap),
            Err(_) => Self::Broken,
        }
    }
}

/// In-memory document that records when it is dropped.
pub struct MockDocument {
    pages: Vec<MockPage>,
    closed: Arc<AtomicBool>,
}

impl MockDocument {
    pub fn new(pages: Vec<MockPage>) -> Self {
        Self {
            pages,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl PageSource for MockDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn render_page(&self, index: usize, _dpi: u32) -> Result<RawPixmap> {
        match self.pages.get(index) {
            Some(MockPage::Pixels(pixmap)) => Ok(pixmap.clone()),
            Some(MockPage::Broken) => Err(PageliftError::ImageError("corrupt content stream".into())),
            None => Err(PageliftError::PageRender {
                page: index + 1,
                reason: "no such page".into(),
            }),
        }
    }
}

impl Drop for MockDocument {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Opens a fresh [`MockDocument`] with the same pages on every call.
pub struct MockOpener {
    pages: Vec<MockPage>,
    unreadable: bool,
    opened: AtomicUsize,
    closed: Arc<AtomicBool>,
}

impl MockOpener {
    pub fn new(pages: Vec<MockPage>) -> Self {
        Self {
            pages,
            unreadable: false,
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// An opener whose documents can never be read.
    pub fn unreadable() -> Self {
        Self {
            unreadable: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Whether the last opened document has been dropped.
    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl DocumentOpener for MockOpener {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>> {
        if self.unreadable {
            return Err(PageliftError::DocumentUnreadable(path.display().to_string()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.closed.store(false, Ordering::SeqCst);
        Ok(Box::new(MockDocument {
            pages: self.pages.clone(),
            closed: Arc::clone(&self.closed),
        }))
    }
}
