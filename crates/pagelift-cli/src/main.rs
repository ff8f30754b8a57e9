// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagelift command-line entry point.
//
// Extracts text from an image or PDF and prints it (or writes it to a file).
// Logging goes to stderr through `tracing`; set `RUST_LOG` to adjust.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use pagelift_core::error::{PageliftError, Result};
use pagelift_core::human_errors::humanize_error;
use pagelift_core::{ExtractionResult, FileKind, PipelineConfig, ProgressEvent};
use pagelift_document::{
    DocumentOpener, Extractor, PdfiumOpener, RecognitionEngine, RecognitionError, TesseractEngine,
    suggested_output_name,
};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "pagelift", version)]
#[command(about = "Extract text from scanned images and PDF pages")]
struct Args {
    /// Image (PNG, JPEG, BMP, TIFF) or PDF to read.
    #[arg(required_unless_present_any = ["list_languages", "print_config"])]
    input: Option<PathBuf>,

    /// Recognition language, e.g. `eng` or `eng+deu`.
    #[arg(short, long)]
    lang: Option<String>,

    /// Read only this page of a PDF (1-based).
    #[arg(long)]
    page: Option<usize>,

    /// JSON pipeline configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tesseract executable.
    #[arg(long, default_value = "tesseract")]
    tesseract: PathBuf,

    /// Kill the engine after this many seconds on a single region.
    #[arg(long)]
    timeout: Option<u64>,

    /// Binarize regions before recognition instead of enhancing grayscale.
    #[arg(long)]
    custom_binarize: bool,

    /// Write the transcript to this file.
    #[arg(short, long, conflicts_with = "save")]
    output: Option<PathBuf>,

    /// Write the transcript next to the input as `<name>_ocr.txt`.
    #[arg(long)]
    save: bool,

    /// List installed Tesseract languages and exit.
    #[arg(long)]
    list_languages: bool,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("error: {}\n  {}\n  ({err})", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

/// Run one command. Failures of the extraction itself are reported here and
/// turned into a failing exit code; setup errors are returned.
fn run(args: &Args) -> Result<ExitCode> {
    let config = effective_config(args)?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    let tesseract = TesseractEngine::new(&args.tesseract);
    if args.list_languages {
        for language in tesseract.list_languages().map_err(engine_error)? {
            println!("{language}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let Some(input) = args.input.as_deref() else {
        return Err(PageliftError::InvalidInput("no input file given".into()));
    };
    let engine = check_engine(tesseract)?;
    let lang = config.recognition.language.clone();
    let extractor = Extractor::new(engine, config);

    let is_pdf = input
        .extension()
        .and_then(|ext| FileKind::from_extension(&ext.to_string_lossy()))
        == Some(FileKind::Pdf);
    let opener = if is_pdf { Some(PdfiumOpener::new()?) } else { None };

    let result = match (args.page, opener.as_ref()) {
        (Some(0), _) => {
            return Err(PageliftError::InvalidInput("pages are numbered from 1".into()));
        }
        (Some(page), Some(opener)) => {
            let document = opener.open(input)?;
            extractor.extract_from_page(document.as_ref(), page - 1, &lang)
        }
        (_, opener) => {
            let mut progress = |event: ProgressEvent| info!("{event}");
            extractor.extract_from_path(
                opener.map(|o| o as &dyn DocumentOpener),
                input,
                &lang,
                &mut progress,
                None,
            )
        }
    };

    let text = match result {
        ExtractionResult::Text(text) => text,
        ExtractionResult::Failed(failure) => {
            error!(kind = ?failure.kind, "Extraction failed");
            eprintln!("error: {}", failure.message);
            return Ok(ExitCode::FAILURE);
        }
    };
    if text.is_empty() {
        warn!("No text found");
    }

    match output_path(args, input) {
        Some(path) => {
            std::fs::write(&path, &text)?;
            info!(path = %path.display(), chars = text.len(), "Transcript written");
        }
        None => println!("{text}"),
    }
    Ok(ExitCode::SUCCESS)
}

/// Load the configuration file (if any) and apply command-line overrides.
fn effective_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(lang) = &args.lang {
        config.recognition.language = lang.clone();
    }
    if let Some(secs) = args.timeout {
        config.recognition.engine_timeout_secs = Some(secs);
    }
    if args.custom_binarize {
        config.recognition.custom_binarize = true;
    }
    config.validate()?;
    Ok(config)
}

/// Check that the Tesseract executable can be run.
fn check_engine(tesseract: TesseractEngine) -> Result<Box<dyn RecognitionEngine>> {
    match tesseract.version() {
        Ok(version) => info!(%version, "Recognition engine found"),
        Err(RecognitionError::EngineMissing) => return Err(PageliftError::EngineUnavailable),
        Err(err) => warn!(error = %err, "Could not query the Tesseract version"),
    }
    Ok(Box::new(tesseract))
}

fn engine_error(err: RecognitionError) -> PageliftError {
    match err {
        RecognitionError::EngineMissing => PageliftError::EngineUnavailable,
        other => PageliftError::Recognition(other.to_string()),
    }
}

/// Where to write the transcript, if not to stdout.
fn output_path(args: &Args, input: &Path) -> Option<PathBuf> {
    if let Some(path) = &args.output {
        return Some(path.clone());
    }
    if !args.save {
        return None;
    }
    let name = suggested_output_name(input, args.page.map(|page| page.saturating_sub(1)));
    Some(input.with_file_name(name))
}
