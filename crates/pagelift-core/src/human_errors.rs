// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for host applications.
//
// Every technical error is mapped to plain English with a clear suggestion, so
// a desktop or command-line front end can show it without further parsing.

use crate::error::PageliftError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Flaky engine run or I/O hiccup; trying again may work.
    Transient,
    /// The user must do something (install a tool, pick another file).
    ActionRequired,
    /// Retrying the same input will not help.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying again unchanged might succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `PageliftError` into a `HumanError`.
pub fn humanize_error(err: &PageliftError) -> HumanError {
    match err {
        // -- Input --
        PageliftError::InvalidInput(_)
        | PageliftError::ImageError(_)
        | PageliftError::Binarization(_) => HumanError {
            message: "We couldn't read this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a PNG or JPEG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PageliftError::UnsupportedFile(ext) => HumanError {
            message: "This type of file isn't supported.".into(),
            suggestion: format!(
                "Choose an image (PNG, JPEG, BMP, TIFF) or a PDF. (File type: {ext})"
            ),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Recognition --
        PageliftError::EngineUnavailable => HumanError {
            message: "Tesseract OCR isn't installed.".into(),
            suggestion: "Install Tesseract and make sure the `tesseract` command is on your PATH, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PageliftError::Recognition(detail) => humanize_recognition_error(detail),

        // -- Documents --
        PageliftError::DocumentNotFound(_) => HumanError {
            message: "The PDF couldn't be found.".into(),
            suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PageliftError::DocumentUnreadable(_) => HumanError {
            message: "We couldn't open this PDF.".into(),
            suggestion: "The file may be corrupted or password-protected. Try opening it in a PDF viewer first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PageliftError::PageRender { page, .. } => HumanError {
            message: format!("Page {page} couldn't be rendered."),
            suggestion: "The rest of the document was still processed. The page may use features the renderer doesn't support.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PageliftError::RendererUnavailable(_) => HumanError {
            message: "PDF support isn't available.".into(),
            suggestion: "Install the pdfium library next to the program or on the system library path.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Storage --
        PageliftError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to read that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        PageliftError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Check the configuration file is valid JSON, or delete it to restore the defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

/// Parse engine failure details into human-readable messages.
fn humanize_recognition_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("traineddata") || lower.contains("failed loading language") {
        HumanError {
            message: "The language data for text recognition is missing.".into(),
            suggestion: "Install the Tesseract language pack for the selected language, or pick another language.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("timed out") {
        HumanError {
            message: "Text recognition took too long.".into(),
            suggestion: "Try a smaller image, or raise the engine timeout.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else {
        HumanError {
            message: "Text recognition didn't work on this image.".into(),
            suggestion: format!(
                "Try a clearer scan with better lighting and focus. (Detail: {detail})"
            ),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_engine_needs_action() {
        let human = humanize_error(&PageliftError::EngineUnavailable);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn missing_language_data_needs_action() {
        let err = PageliftError::Recognition(
            "Ensure language data ('xyz.traineddata') is installed correctly.".into(),
        );
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn engine_timeout_is_transient() {
        let err = PageliftError::Recognition("engine timed out after 30s".into());
        assert!(humanize_error(&err).retriable);
    }

    #[test]
    fn unreadable_pdf_is_permanent() {
        let err = PageliftError::DocumentUnreadable("scan.pdf".into());
        assert_eq!(humanize_error(&err).severity, Severity::Permanent);
    }

    #[test]
    fn unsupported_file_mentions_type() {
        let human = humanize_error(&PageliftError::UnsupportedFile(".docx".into()));
        assert!(human.suggestion.contains(".docx"));
    }
}
