// Copyright (c) The stress-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The concurrent trial-execution engine.
//!
//! A fixed pool of workers pulls seeds from a shared allocator and runs one
//! trial per seed. The allocator's mutex covers the seed counter, the
//! finished flag, and the counterexample list together: the moment any worker
//! records a failure, dispensation stops for everyone, while trials already
//! in flight drain to completion (and may record further counterexamples).

use crate::{
    checker::CheckerResult,
    errors::StressError,
    reporter::{DisplaySink, ProgressBoard},
    traits::Persist,
    trial::TrialExecutor,
};
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use std::sync::Mutex;
use tracing::{debug, warn};

/// A disagreement found by one trial: the seed that produced it and the
/// checker's verdict.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Counterexample {
    pub seed: u64,
    pub result: CheckerResult,
}

/// Statistics for a stress run.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunStats {
    /// Trials that ran to completion. If the run stopped early this is less
    /// than the configured test count.
    pub trials_run: u64,

    /// Trials whose checker accepted.
    pub passed: u64,

    /// Trials whose checker found a disagreement.
    pub failed: u64,
}

impl RunStats {
    /// Returns true if no trial found a disagreement.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Outcome of a completed stress run, returned by
/// [`StressConfig::run`](crate::config::StressConfig::run).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StressReport {
    pub stats: RunStats,

    /// Every disagreement found, in discovery order (not seed order: workers
    /// finish in whatever order the scheduler lands on).
    pub counterexamples: Vec<Counterexample>,
}

impl StressReport {
    /// Returns true if the run found no counterexamples.
    pub fn is_success(&self) -> bool {
        self.stats.is_success()
    }
}

#[derive(Debug, Default)]
struct AllocState {
    next_seed: u64,
    finished: bool,
    stats: RunStats,
    counterexamples: Vec<Counterexample>,
    first_error: Option<StressError>,
}

/// Dispenses each seed below the bound exactly once.
///
/// One mutex guards the counter, the finished flag, and the counterexample
/// list, so checking "are we done" and handing out the next seed is a single
/// critical section: once a failure lands, no caller can observe a stale
/// finished flag and walk away with a fresh seed.
pub(crate) struct SeedAllocator {
    test_count: u64,
    state: Mutex<AllocState>,
}

impl SeedAllocator {
    pub(crate) fn new(test_count: u64) -> Self {
        Self {
            test_count,
            state: Mutex::new(AllocState::default()),
        }
    }

    /// The next unused seed, or `None` once the bound is reached or a
    /// failure has been recorded.
    pub(crate) fn next(&self) -> Option<u64> {
        let mut state = self.lock();
        if state.finished || state.next_seed >= self.test_count {
            return None;
        }
        let seed = state.next_seed;
        state.next_seed += 1;
        debug!(seed, "dispensing seed");
        Some(seed)
    }

    pub(crate) fn record_pass(&self) {
        let mut state = self.lock();
        state.stats.trials_run += 1;
        state.stats.passed += 1;
    }

    /// Records a counterexample and stops future dispensation, atomically.
    pub(crate) fn record_failure(&self, seed: u64, result: CheckerResult) {
        let mut state = self.lock();
        debug!(seed, "counterexample recorded; stopping dispensation");
        state.finished = true;
        state.stats.trials_run += 1;
        state.stats.failed += 1;
        state.counterexamples.push(Counterexample { seed, result });
    }

    /// Records a fatal harness error (first one wins) and drains the run.
    pub(crate) fn abort(&self, error: StressError) {
        warn!(%error, "aborting stress run");
        let mut state = self.lock();
        state.finished = true;
        if state.first_error.is_none() {
            state.first_error = Some(error);
        }
    }

    pub(crate) fn into_report(self) -> Result<StressReport, StressError> {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match state.first_error {
            Some(error) => Err(error),
            None => Ok(StressReport {
                stats: state.stats,
                counterexamples: state.counterexamples,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AllocState> {
        // Workers never panic while holding this lock (no user code runs
        // inside it), so poisoning is unreachable; recover anyway so a
        // paniced sibling can't wedge the drain.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Owns the worker pool for one run and aggregates its results.
pub(crate) struct StressRunner<T, A> {
    executor: TrialExecutor<T, A>,
    threads: usize,
    pool: ThreadPool,
    allocator: SeedAllocator,
    board: ProgressBoard,
}

impl<T: Persist, A: Persist> StressRunner<T, A> {
    pub(crate) fn new(
        executor: TrialExecutor<T, A>,
        threads: usize,
        test_count: u64,
        sink: Box<dyn DisplaySink>,
    ) -> Result<Self, StressError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|idx| format!("stress-run-{idx}"))
            .build()
            .map_err(StressError::PoolBuild)?;
        Ok(Self {
            executor,
            threads,
            pool,
            allocator: SeedAllocator::new(test_count),
            board: ProgressBoard::new(threads, sink),
        })
    }

    /// Runs trials until the seed range is exhausted or a failure stops
    /// dispensation, then prints the summary and returns the report.
    ///
    /// The join is blocking and untimed: a callback that hangs, hangs its
    /// worker and this call with it. A callback that panics takes the whole
    /// run down through the pool scope, by design.
    pub(crate) fn run(self) -> Result<StressReport, StressError> {
        let Self {
            executor,
            threads,
            pool,
            allocator,
            board,
        } = self;

        {
            let executor = &executor;
            let allocator = &allocator;
            let board = &board;
            pool.scope(move |scope| {
                for worker in 0..threads {
                    scope.spawn(move |_| worker_loop(worker, executor, allocator, board));
                }
            });
        }

        board.clear();
        let report = allocator.into_report()?;
        board.summary(&report)?;
        Ok(report)
    }
}

fn worker_loop<T: Persist, A: Persist>(
    worker: usize,
    executor: &TrialExecutor<T, A>,
    allocator: &SeedAllocator,
    board: &ProgressBoard,
) {
    while let Some(seed) = allocator.next() {
        match executor.run_trial(worker, seed, board) {
            Ok(result) if result.correct => allocator.record_pass(),
            Ok(result) => allocator.record_failure(seed, result),
            Err(error) => {
                allocator.abort(error);
                return;
            }
        }
    }
}
