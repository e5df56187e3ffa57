// Copyright (c) The stress-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::Serialize;
use std::fmt;

/// The verdict a checker produces for a single trial.
///
/// Constructed once per trial and immutable afterwards. The textual form
/// (verdict word, message, points, one per line) is what gets printed in the
/// final summary and is the same shape contest judges expect.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CheckerResult {
    /// Whether the stressed solution's answer was accepted.
    pub correct: bool,

    /// Human-readable explanation from the checker.
    pub message: String,

    /// Points awarded, contest-style: 100 for a full pass, 0 otherwise.
    pub points: u32,
}

impl CheckerResult {
    /// An accepting verdict worth full points.
    pub fn ok(message: impl Into<String>) -> Self {
        Self::ok_with_points(message, 100)
    }

    /// An accepting verdict with an explicit point value.
    pub fn ok_with_points(message: impl Into<String>, points: u32) -> Self {
        Self {
            correct: true,
            message: message.into(),
            points,
        }
    }

    /// A rejecting verdict: the stressed solution disagreed with the model.
    pub fn wrong_answer(message: impl Into<String>) -> Self {
        Self {
            correct: false,
            message: message.into(),
            points: 0,
        }
    }

    /// A rejecting verdict for an inconsistency inside the checker's own
    /// bookkeeping, flagged loudly so it isn't mistaken for a plain
    /// wrong answer.
    pub fn logic_error(message: impl Into<String>) -> Self {
        Self {
            correct: false,
            message: format!("LOGIC ERROR [!]: {}", message.into()),
            points: 0,
        }
    }
}

impl fmt::Display for CheckerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", if self.correct { "OK" } else { "WRONG" })?;
        writeln!(f, "{}", self.message)?;
        writeln!(f, "{}", self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn constructors() {
        let ok = CheckerResult::ok("answers match");
        assert!(ok.correct);
        assert_eq!(ok.points, 100);

        let partial = CheckerResult::ok_with_points("partial credit", 40);
        assert!(partial.correct);
        assert_eq!(partial.points, 40);

        let wa = CheckerResult::wrong_answer("expected 3, got 4");
        assert!(!wa.correct);
        assert_eq!(wa.points, 0);

        let le = CheckerResult::logic_error("model disagrees with itself");
        assert!(!le.correct);
        assert_eq!(le.message, "LOGIC ERROR [!]: model disagrees with itself");
    }

    #[test]
    fn display_format() {
        assert_eq!(
            CheckerResult::wrong_answer("answers differ").to_string(),
            "WRONG\nanswers differ\n0\n"
        );
        assert_eq!(
            CheckerResult::ok("looks good").to_string(),
            "OK\nlooks good\n100\n"
        );
    }
}
