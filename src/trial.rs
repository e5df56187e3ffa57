// Copyright (c) The stress-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    checker::CheckerResult,
    errors::StressError,
    reporter::ProgressBoard,
    traits::{Checker, Generator, Persist, Solver},
};
use camino::{Utf8Path, Utf8PathBuf};
use std::{fs::File, io};
use tracing::debug;

/// Runs one trial end-to-end: generate, model-solve, stressed-solve, check,
/// and persist artifacts if the checker rejects.
pub(crate) struct TrialExecutor<T, A> {
    pub(crate) generator: Box<dyn Generator<T>>,
    pub(crate) model: Box<dyn Solver<T, A>>,
    pub(crate) stressed: Box<dyn Solver<T, A>>,
    pub(crate) checker: Box<dyn Checker<T, A>>,
    pub(crate) artifact_dir: Utf8PathBuf,
}

impl<T: Persist, A: Persist> TrialExecutor<T, A> {
    /// Executes the four phases for `seed`, ticking the board at every phase
    /// boundary. On a rejecting verdict the test case and both answers are
    /// written to artifact files before the verdict is returned.
    ///
    /// A panic inside any callback propagates out of here uncaught; that is
    /// a fatal condition for the run, not a trial failure.
    pub(crate) fn run_trial(
        &self,
        worker: usize,
        seed: u64,
        board: &ProgressBoard,
    ) -> Result<CheckerResult, StressError> {
        board.start(worker, seed);
        let test_case = self.generator.generate(seed);
        board.tick(worker);
        let model = self.model.solve(&test_case);
        board.tick(worker);
        let stressed = self.stressed.solve(&test_case);
        board.tick(worker);
        let result = self.checker.check(&test_case, &model, &stressed);
        board.finish(worker, result.correct);

        if !result.correct {
            self.write_artifact(seed, "in", &test_case)?;
            self.write_artifact(seed, "model", &model)?;
            self.write_artifact(seed, "stressed", &stressed)?;
        }
        Ok(result)
    }

    fn write_artifact(&self, seed: u64, extension: &str, value: &dyn Persist) -> Result<(), StressError> {
        let path = self.artifact_dir.join(format!("stress-{seed}.{extension}"));
        debug!(%path, "writing artifact");
        write_to_file(&path, value).map_err(|source| StressError::Artifact { path, source })
    }
}

fn write_to_file(path: &Utf8Path, value: &dyn Persist) -> io::Result<()> {
    let mut file = File::create(path)?;
    value.write_to(&mut file)
}
