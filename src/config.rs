// Copyright (c) The stress-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ConfigError, StressError},
    reporter::{AnsiSink, Color, DisplaySink},
    runner::{StressReport, StressRunner},
    traits::{Checker, Generator, Persist, Solver},
    trial::TrialExecutor,
};
use camino::Utf8PathBuf;
use std::fmt;

/// Builder-style description of a stress run.
///
/// `T` is the test-case type and `A` the answer type; both are opaque to the
/// harness apart from the [`Persist`] bound used when a failing trial dumps
/// its artifacts. The four callbacks are required; everything else has a
/// default. [`validate`](Self::validate) checks the structure before any
/// worker is spawned, and [`run`](Self::run) drives the whole run.
pub struct StressConfig<T, A> {
    generator: Option<Box<dyn Generator<T>>>,
    model: Option<Box<dyn Solver<T, A>>>,
    stressed: Option<Box<dyn Solver<T, A>>>,
    checker: Option<Box<dyn Checker<T, A>>>,
    threads: usize,
    test_count: u64,
    print_tests: bool,
    artifact_dir: Utf8PathBuf,
    color: Color,
    sink: Option<Box<dyn DisplaySink>>,
}

impl<T, A> StressConfig<T, A> {
    pub fn new() -> Self {
        Self {
            generator: None,
            model: None,
            stressed: None,
            checker: None,
            threads: 1,
            test_count: u64::MAX,
            print_tests: false,
            artifact_dir: Utf8PathBuf::from("."),
            color: Color::default(),
            sink: None,
        }
    }

    /// The trusted reference solution.
    pub fn model(mut self, model: impl Solver<T, A> + 'static) -> Self {
        self.model = Some(Box::new(model));
        self
    }

    /// The solution under stress.
    pub fn stressed(mut self, stressed: impl Solver<T, A> + 'static) -> Self {
        self.stressed = Some(Box::new(stressed));
        self
    }

    /// The seed-to-test-case generator.
    pub fn generator(mut self, generator: impl Generator<T> + 'static) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    /// The verdict callback comparing both answers.
    pub fn checker(mut self, checker: impl Checker<T, A> + 'static) -> Self {
        self.checker = Some(Box::new(checker));
        self
    }

    /// Number of parallel workers [default: 1].
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Use every available CPU but one (floor of one).
    pub fn threads_auto(self) -> Self {
        let threads = num_cpus::get().saturating_sub(1).max(1);
        self.threads(threads)
    }

    /// Upper bound on seeds to try [default: unbounded].
    pub fn test_count(mut self, test_count: u64) -> Self {
        self.test_count = test_count;
        self
    }

    /// Carried for tooling that echoes generated tests; the trial loop
    /// itself does not consult it.
    pub fn print_tests(mut self, print_tests: bool) -> Self {
        self.print_tests = print_tests;
        self
    }

    /// Directory for counterexample artifacts [default: current directory].
    pub fn artifact_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    /// Color preference for the default interactive display.
    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Replace the interactive display with a custom sink.
    pub fn display(mut self, sink: impl DisplaySink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Checks that the configuration is structurally runnable: all four
    /// callbacks present and at least one worker. Purely synchronous, no
    /// side effects, safe to call any number of times.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.is_none() {
            return Err(ConfigError::MissingModel);
        }
        if self.stressed.is_none() {
            return Err(ConfigError::MissingStressed);
        }
        if self.generator.is_none() {
            return Err(ConfigError::MissingGenerator);
        }
        if self.checker.is_none() {
            return Err(ConfigError::MissingChecker);
        }
        if self.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        Ok(())
    }
}

impl<T: Persist, A: Persist> StressConfig<T, A> {
    /// Validates the configuration, then runs trials until the seed range is
    /// exhausted or a counterexample stops dispensation. Blocks until every
    /// worker has drained, prints the summary, and returns the report.
    pub fn run(self) -> Result<StressReport, StressError> {
        self.validate()?;
        let Self {
            generator,
            model,
            stressed,
            checker,
            threads,
            test_count,
            print_tests: _,
            artifact_dir,
            color,
            sink,
        } = self;

        let executor = TrialExecutor {
            generator: generator.ok_or(ConfigError::MissingGenerator)?,
            model: model.ok_or(ConfigError::MissingModel)?,
            stressed: stressed.ok_or(ConfigError::MissingStressed)?,
            checker: checker.ok_or(ConfigError::MissingChecker)?,
            artifact_dir,
        };
        let sink = sink.unwrap_or_else(|| Box::new(AnsiSink::stdout(color)));
        StressRunner::new(executor, threads, test_count, sink)?.run()
    }
}

impl<T, A> Default for StressConfig<T, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A> fmt::Debug for StressConfig<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn set_or_unset<V>(value: &Option<V>) -> &'static str {
            if value.is_some() { "set" } else { "unset" }
        }

        f.debug_struct("StressConfig")
            .field("generator", &set_or_unset(&self.generator))
            .field("model", &set_or_unset(&self.model))
            .field("stressed", &set_or_unset(&self.stressed))
            .field("checker", &set_or_unset(&self.checker))
            .field("threads", &self.threads)
            .field("test_count", &self.test_count)
            .field("print_tests", &self.print_tests)
            .field("artifact_dir", &self.artifact_dir)
            .field("color", &self.color)
            .field("display", &set_or_unset(&self.sink))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::CheckerResult;
    use pretty_assertions::assert_eq;

    fn full_config() -> StressConfig<u64, u64> {
        StressConfig::new()
            .model(|case: &u64| *case)
            .stressed(|case: &u64| *case)
            .generator(|seed: u64| seed)
            .checker(|_: &u64, _: &u64, _: &u64| CheckerResult::ok("answers match"))
    }

    #[test]
    fn validate_reports_missing_callbacks_in_order() {
        let config = StressConfig::<u64, u64>::new();
        assert_eq!(config.validate(), Err(ConfigError::MissingModel));

        let config = config.model(|case: &u64| *case);
        assert_eq!(config.validate(), Err(ConfigError::MissingStressed));

        let config = config.stressed(|case: &u64| *case);
        assert_eq!(config.validate(), Err(ConfigError::MissingGenerator));

        let config = config.generator(|seed: u64| seed);
        assert_eq!(config.validate(), Err(ConfigError::MissingChecker));

        let config = config.checker(|_: &u64, _: &u64, _: &u64| CheckerResult::ok(""));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_zero_threads() {
        assert_eq!(
            full_config().threads(0).validate(),
            Err(ConfigError::ZeroThreads)
        );
    }

    #[test]
    fn validate_is_idempotent() {
        let config = full_config();
        for _ in 0..3 {
            assert_eq!(config.validate(), Ok(()));
        }
    }

    #[test]
    fn threads_auto_is_at_least_one() {
        let config = full_config().threads_auto();
        assert!(config.threads >= 1);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn defaults() {
        let config = StressConfig::<u64, u64>::new();
        assert_eq!(config.threads, 1);
        assert_eq!(config.test_count, u64::MAX);
        assert!(!config.print_tests);
        assert_eq!(config.artifact_dir, Utf8PathBuf::from("."));
    }
}
