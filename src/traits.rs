// Copyright (c) The stress-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits for the pluggable pieces of a stress run.
//!
//! Each role is a first-class value injected through [`StressConfig`]: a
//! generator, two solvers, and a checker. Blanket impls let plain closures be
//! used directly, so most configurations never name these traits at all.
//!
//! [`StressConfig`]: crate::config::StressConfig

use crate::checker::CheckerResult;
use std::io::{self, Write};

/// Produces a test case from a seed.
///
/// The seed is both the trial identifier and the generator's only randomness
/// source: the same seed must always produce the same test case, so a
/// recorded counterexample can be regenerated later.
pub trait Generator<T>: Send + Sync {
    fn generate(&self, seed: u64) -> T;
}

impl<T, F> Generator<T> for F
where
    F: Fn(u64) -> T + Send + Sync,
{
    fn generate(&self, seed: u64) -> T {
        self(seed)
    }
}

/// Solves a test case, producing an answer.
///
/// Both the model and the stressed solution implement this role; the harness
/// treats them identically and only the checker tells them apart.
pub trait Solver<T, A>: Send + Sync {
    fn solve(&self, test_case: &T) -> A;
}

impl<T, A, F> Solver<T, A> for F
where
    F: Fn(&T) -> A + Send + Sync,
{
    fn solve(&self, test_case: &T) -> A {
        self(test_case)
    }
}

/// Decides whether the stressed answer agrees with the model answer.
pub trait Checker<T, A>: Send + Sync {
    fn check(&self, test_case: &T, model: &A, stressed: &A) -> CheckerResult;
}

impl<T, A, F> Checker<T, A> for F
where
    F: Fn(&T, &A, &A) -> CheckerResult + Send + Sync,
{
    fn check(&self, test_case: &T, model: &A, stressed: &A) -> CheckerResult {
        self(test_case, model, stressed)
    }
}

/// Textual persistence for test cases and answers.
///
/// Invoked only when a trial fails, to dump the generated input and both
/// answers to artifact files. The harness never interprets the bytes; the
/// format is whatever the problem's tooling expects.
pub trait Persist {
    fn write_to(&self, writer: &mut dyn io::Write) -> io::Result<()>;
}

impl Persist for str {
    fn write_to(&self, writer: &mut dyn io::Write) -> io::Result<()> {
        writer.write_all(self.as_bytes())
    }
}

impl Persist for String {
    fn write_to(&self, writer: &mut dyn io::Write) -> io::Result<()> {
        self.as_str().write_to(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_satisfy_roles() {
        fn assert_generator(_: &impl Generator<u64>) {}
        fn assert_solver(_: &impl Solver<u64, String>) {}
        fn assert_checker(_: &impl Checker<u64, String>) {}

        assert_generator(&|seed: u64| seed * 3);
        assert_solver(&|case: &u64| case.to_string());
        assert_checker(&|_: &u64, model: &String, stressed: &String| {
            if model == stressed {
                CheckerResult::ok("")
            } else {
                CheckerResult::wrong_answer("answers differ")
            }
        });
    }

    #[test]
    fn persist_strings() {
        let mut buf = Vec::new();
        "1 2 3\n".write_to(&mut buf).unwrap();
        String::from("4 5\n").write_to(&mut buf).unwrap();
        assert_eq!(buf, b"1 2 3\n4 5\n");
    }
}
