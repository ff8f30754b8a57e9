// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transcript cleanup.

use std::sync::LazyLock;

use regex::Regex;

static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("static regex"));
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").expect("static regex"));

/// Normalise whitespace in recognised text.
///
/// Runs of spaces and tabs become one space, every line is trimmed, two or
/// more consecutive newlines become exactly one blank line, and the whole
/// text is trimmed. Whitespace-only input yields an empty string.
pub fn clean(raw: &str) -> String {
    let collapsed = HORIZONTAL_WS.replace_all(raw, " ");
    let trimmed = collapsed.split('\n').map(str::trim).collect::<Vec<_>>().join("\n");
    BLANK_RUNS.replace_all(&trimmed, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_is_empty() {
        assert_eq!(clean(""), "");
        assert_eq!(clean(" \t\n\n  \r\n"), "");
    }

    #[test]
    fn collapses_horizontal_runs_and_trims_lines() {
        assert_eq!(clean("  Hello \t  world  \n\tnext\tline "), "Hello world\nnext line");
    }

    #[test]
    fn blank_line_runs_become_one() {
        assert_eq!(clean("a\n\n\n\nb\n \n \nc"), "a\n\nb\n\nc");
        assert_eq!(clean("a\nb"), "a\nb");
    }

    #[test]
    fn carriage_returns_are_trimmed_with_the_line() {
        assert_eq!(clean("first \r\nsecond\r\n"), "first\nsecond");
    }

    #[test]
    fn page_headers_keep_one_blank_line() {
        assert_eq!(
            clean("--- Page 1 ---\n\n\n\n  body   text \n\n\n--- Page 2 ---\n"),
            "--- Page 1 ---\n\nbody text\n\n--- Page 2 ---"
        );
    }

    #[test]
    fn clean_is_idempotent() {
        let samples = [
            "",
            "   ",
            "plain",
            "  lead\n\n\n trail  ",
            "tabs\t\tand  spaces\n\t\n\t\nend",
            "--- Page 1 ---\n\nbody\n\n\n--- Page 2 ---\n\n",
            "\u{a0}non-breaking\u{a0}\nline",
            "x\r\n\r\n\r\ny",
        ];
        for sample in samples {
            let once = clean(sample);
            assert_eq!(clean(&once), once, "not idempotent for {sample:?}");
        }
    }
}
