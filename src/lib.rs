// Copyright (c) The stress-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A differential stress-testing harness for contest problems.
//!
//! Given a pseudo-random test-case generator and two candidate solutions (a
//! trusted "model" and a faster "stressed" one), the harness repeatedly
//! generates inputs, runs both solutions, compares their outputs with a
//! user-supplied checker, and reports the first randomized inputs that expose
//! a disagreement. Trials run on a fixed-size worker pool; the first failure
//! stops further seed dispensation, in-flight trials drain to completion, and
//! every failing trial leaves its input and both outputs on disk.
//!
//! ```no_run
//! use stress_runner::{checker::CheckerResult, config::StressConfig, traits::Persist};
//! use std::io::{self, Write};
//!
//! struct Case(u64);
//!
//! impl Persist for Case {
//!     fn write_to(&self, writer: &mut dyn io::Write) -> io::Result<()> {
//!         writeln!(writer, "{}", self.0)
//!     }
//! }
//!
//! # fn main() -> Result<(), stress_runner::errors::StressError> {
//! let report = StressConfig::new()
//!     .generator(|seed: u64| Case(seed % 1000))
//!     .model(|case: &Case| (case.0 * 2).to_string())
//!     .stressed(|case: &Case| (case.0 << 1).to_string())
//!     .checker(|_case: &Case, model: &String, stressed: &String| {
//!         if model == stressed {
//!             CheckerResult::ok("answers match")
//!         } else {
//!             CheckerResult::wrong_answer("answers differ")
//!         }
//!     })
//!     .threads(4)
//!     .test_count(10_000)
//!     .run()?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod checker;
pub mod config;
pub mod errors;
pub mod reporter;
pub mod runner;
pub mod traits;
mod trial;
