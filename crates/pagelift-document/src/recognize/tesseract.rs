// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract command-line adapter.
//
// Each call writes the prepared image to a temporary PNG and runs
//
// ```sh
// tesseract <image.png> stdout -l <lang> --oem <n> --psm <n> --dpi <n> \
//     -c preserve_interword_spaces=1
// ```
//
// reading the recognised text from stdout.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use image::GrayImage;
use tracing::{debug, instrument, warn};

use crate::image::processor::encode_png;
use crate::recognize::engine::{RecognitionEngine, RecognitionError, RecognitionRequest};

/// How often a child with a deadline is polled.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs the `tesseract` executable.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    program: PathBuf,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TesseractEngine {
    /// Use a specific executable (a bare name is looked up on `PATH`).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// First line of `tesseract --version`, e.g. `tesseract 5.3.4`.
    #[instrument(skip(self), fields(program = %self.program.display()))]
    pub fn version(&self) -> Result<String, RecognitionError> {
        let mut command = Command::new(&self.program);
        command.arg("--version");
        let output = run(&mut command, None)?;
        if !output.status.success() {
            return Err(RecognitionError::Failed {
                reason: output.stderr_text(),
            });
        }
        // Older releases print the banner on stderr.
        let banner = if output.stdout.is_empty() {
            output.stderr_text()
        } else {
            output.stdout_text()
        };
        Ok(banner.lines().next().unwrap_or_default().trim().to_string())
    }

    /// Installed language codes, sorted.
    #[instrument(skip(self), fields(program = %self.program.display()))]
    pub fn list_languages(&self) -> Result<Vec<String>, RecognitionError> {
        let mut command = Command::new(&self.program);
        command.arg("--list-langs");
        let output = run(&mut command, None)?;
        if !output.status.success() {
            return Err(RecognitionError::Failed {
                reason: output.stderr_text(),
            });
        }
        Ok(parse_language_list(&output.stdout_text()))
    }

    fn arguments(input: &Path, request: &RecognitionRequest) -> Vec<String> {
        let mut args = vec![
            input.display().to_string(),
            "stdout".into(),
            "-l".into(),
            request.language.clone(),
            "--oem".into(),
            request.engine_mode.to_string(),
            "--psm".into(),
            request.mode.as_psm().to_string(),
            "--dpi".into(),
            request.dpi.to_string(),
        ];
        if request.preserve_interword_spaces {
            args.push("-c".into());
            args.push("preserve_interword_spaces=1".into());
        }
        args
    }
}

impl RecognitionEngine for TesseractEngine {
    #[instrument(skip_all, fields(width = image.width(), height = image.height(), lang = %request.language))]
    fn recognize(
        &self,
        image: &GrayImage,
        request: &RecognitionRequest,
    ) -> Result<String, RecognitionError> {
        let png = encode_png(image).map_err(|err| RecognitionError::Failed {
            reason: err.to_string(),
        })?;
        let mut input = tempfile::Builder::new()
            .prefix("pagelift-")
            .suffix(".png")
            .tempfile()
            .map_err(io_failure)?;
        input.write_all(&png).map_err(io_failure)?;
        input.flush().map_err(io_failure)?;

        let mut command = Command::new(&self.program);
        command.args(Self::arguments(input.path(), request));
        let output = run(&mut command, request.timeout)?;

        if !output.status.success() {
            let stderr = output.stderr_text();
            warn!(status = %output.status, stderr = %stderr.trim(), "Tesseract exited with an error");
            return Err(RecognitionError::Failed {
                reason: format!(
                    "Tesseract Processing Error: {}. Ensure language data ('{}.traineddata') is installed correctly.",
                    stderr.trim(),
                    request.language
                ),
            });
        }

        let text = output.stdout_text();
        debug!(chars = text.len(), "Tesseract finished");
        Ok(text)
    }
}

// -- Process plumbing ---------------------------------------------------------

struct Captured {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl Captured {
    fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Run `command` to completion, killing it once `timeout` elapses. Both pipes
/// are drained on helper threads so a chatty child cannot block on a full
/// pipe.
fn run(command: &mut Command, timeout: Option<Duration>) -> Result<Captured, RecognitionError> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                RecognitionError::EngineMissing
            } else {
                io_failure(err)
            }
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_reader = thread::spawn(move || drain(stdout));
    let stderr_reader = thread::spawn(move || drain(stderr));

    let status = match timeout {
        None => child.wait().map_err(io_failure)?,
        Some(limit) => {
            let deadline = Instant::now() + limit;
            loop {
                if let Some(status) = child.try_wait().map_err(io_failure)? {
                    break status;
                }
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!(timeout_secs = limit.as_secs(), "Recognition engine killed at deadline");
                    return Err(RecognitionError::TimedOut { after: limit });
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    };

    Ok(Captured {
        status,
        stdout: stdout_reader.join().unwrap_or_default(),
        stderr: stderr_reader.join().unwrap_or_default(),
    })
}

fn drain(pipe: Option<impl Read>) -> Vec<u8> {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buffer);
    }
    buffer
}

fn io_failure(err: std::io::Error) -> RecognitionError {
    RecognitionError::Failed {
        reason: err.to_string(),
    }
}

/// Parse `tesseract --list-langs` output, skipping the header line.
fn parse_language_list(stdout: &str) -> Vec<String> {
    let mut languages: Vec<String> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of available languages"))
        .map(str::to_string)
        .collect();
    languages.sort();
    languages
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use pagelift_core::RecognitionConfig;

    fn blank() -> GrayImage {
        GrayImage::from_pixel(20, 20, Luma([255]))
    }

    #[test]
    fn arguments_carry_every_setting() {
        let request = RecognitionRequest::for_region(&RecognitionConfig::default());
        let args = TesseractEngine::arguments(Path::new("/tmp/x.png"), &request);
        assert_eq!(
            args,
            [
                "/tmp/x.png",
                "stdout",
                "-l",
                "eng",
                "--oem",
                "3",
                "--psm",
                "7",
                "--dpi",
                "300",
                "-c",
                "preserve_interword_spaces=1"
            ]
        );
    }

    #[test]
    fn missing_executable_is_engine_missing() {
        let engine = TesseractEngine::new("/nonexistent/pagelift-test/tesseract");
        let request = RecognitionRequest::for_region(&RecognitionConfig::default());
        assert_eq!(
            engine.recognize(&blank(), &request),
            Err(RecognitionError::EngineMissing)
        );
        assert_eq!(engine.version(), Err(RecognitionError::EngineMissing));
    }

    #[cfg(unix)]
    #[test]
    fn failing_engine_mentions_language_data() {
        let engine = TesseractEngine::new("false");
        let request = RecognitionRequest::for_page(&RecognitionConfig::default().with_language("xyz"));
        match engine.recognize(&blank(), &request) {
            Err(RecognitionError::Failed { reason }) => {
                assert!(reason.contains("'xyz.traineddata'"), "{reason}");
            }
            other => panic!("expected a recoverable failure, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn silent_engine_yields_empty_text() {
        let engine = TesseractEngine::new("true");
        let request = RecognitionRequest::for_region(&RecognitionConfig::default());
        assert_eq!(engine.recognize(&blank(), &request), Ok(String::new()));
    }

    #[cfg(unix)]
    #[test]
    fn slow_child_is_killed_at_deadline() {
        let mut command = Command::new("sleep");
        command.arg("5");
        let started = Instant::now();
        let result = run(&mut command, Some(Duration::from_millis(100)));
        assert!(matches!(result, Err(RecognitionError::TimedOut { .. })));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn language_list_skips_header() {
        let stdout = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\nosd\ndeu\n";
        assert_eq!(parse_language_list(stdout), ["deu", "eng", "osd"]);
    }
}
