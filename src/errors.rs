// Copyright (c) The stress-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the stress harness.

use camino::Utf8PathBuf;
use thiserror::Error;

/// A structural problem detected by [`StressConfig::validate`] before any
/// worker is spawned.
///
/// [`StressConfig::validate`]: crate::config::StressConfig::validate
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ConfigError {
    #[error("missing model solution callback")]
    MissingModel,

    #[error("missing stressed solution callback")]
    MissingStressed,

    #[error("missing generator callback")]
    MissingGenerator,

    #[error("missing checker callback")]
    MissingChecker,

    #[error("thread count must be at least 1")]
    ZeroThreads,
}

/// A fatal error raised by a stress run.
///
/// Semantic disagreements between the two solutions are *not* errors; those
/// are returned as counterexamples in the [`StressReport`]. This type covers
/// the harness's own failures: bad configuration, pool construction, and I/O
/// while persisting artifacts or writing the summary.
///
/// [`StressReport`]: crate::runner::StressReport
#[derive(Debug, Error)]
pub enum StressError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build the worker pool")]
    PoolBuild(#[source] rayon::ThreadPoolBuildError),

    #[error("failed to write artifact `{path}`")]
    Artifact {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write to the display sink")]
    Display(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_error_names_the_path() {
        let err = StressError::Artifact {
            path: "out/stress-3.in".into(),
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(err.to_string(), "failed to write artifact `out/stress-3.in`");
    }
}
