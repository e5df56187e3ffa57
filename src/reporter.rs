// Copyright (c) The stress-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live progress display and end-of-run reporting.
//!
//! Each worker owns one [`Row`] on a shared [`ProgressBoard`]; the board
//! serializes every redraw behind a single lock so two workers can never
//! interleave partial lines. Rendering itself is delegated to a
//! [`DisplaySink`], with two implementations provided: an interactive ANSI
//! sink that repaints a multi-row block in place, and a JSON-lines sink for
//! non-interactive captures.

use crate::{
    errors::StressError,
    runner::{Counterexample, RunStats, StressReport},
};
use serde::Serialize;
use std::{
    io::{self, Write},
    str::FromStr,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};
use termcolor::{ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Phase labels, in the order trials pass through them.
pub const PHASES: [&str; 4] = ["generate", "model", "stressed", "check"];

const SEPARATOR: &str = "----------------------------------------";

/// When to color interactive output.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Color {
    Always,
    #[default]
    Auto,
    Never,
}

impl Color {
    pub fn variants() -> [&'static str; 3] {
        ["always", "auto", "never"]
    }

    pub(crate) fn color_choice(self, stream: atty::Stream) -> ColorChoice {
        // https://docs.rs/termcolor/1.1.2/termcolor/index.html#detecting-presence-of-a-terminal
        match self {
            Color::Always => ColorChoice::Always,
            Color::Auto => {
                if atty::is(stream) {
                    ColorChoice::Auto
                } else {
                    ColorChoice::Never
                }
            }
            Color::Never => ColorChoice::Never,
        }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(Color::Always),
            "auto" => Ok(Color::Auto),
            "never" => Ok(Color::Never),
            other => Err(format!("unrecognized color setting: {other}")),
        }
    }
}

/// Live display state for one worker.
///
/// Written only by the owning worker, read by the sink during a redraw; both
/// happen under the board lock.
#[derive(Clone, Debug)]
pub struct Row {
    worker: usize,
    seed: Option<u64>,
    ticks: Vec<Duration>,
    last_measure: Instant,
}

impl Row {
    fn new(worker: usize) -> Self {
        Self {
            worker,
            seed: None,
            ticks: Vec::new(),
            last_measure: Instant::now(),
        }
    }

    fn reset(&mut self, seed: u64) {
        self.seed = Some(seed);
        self.ticks.clear();
        self.measure();
    }

    fn measure(&mut self) {
        self.last_measure = Instant::now();
    }

    fn tick(&mut self) {
        self.ticks.push(self.last_measure.elapsed());
    }

    /// The id of the worker owning this row.
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// The seed of the trial currently shown, or `None` before the first one.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Elapsed phase durations since the row was last reset, in [`PHASES`]
    /// order.
    pub fn ticks(&self) -> &[Duration] {
        &self.ticks
    }
}

/// Where board state gets rendered.
///
/// All calls arrive under the board lock, one at a time. `render` must be
/// idempotent: it receives the full board state and may be invoked after any
/// row changes, any number of times.
pub trait DisplaySink: Send {
    /// Redraws the whole board.
    fn render(&mut self, rows: &[Row]) -> io::Result<()>;

    /// Emits a permanent verdict line for a finished trial.
    fn outcome(&mut self, row: &Row, correct: bool) -> io::Result<()>;

    /// Erases any live output. Called once, after all workers have exited.
    fn clear(&mut self) -> io::Result<()>;

    /// Prints the end-of-run report.
    fn summary(&mut self, report: &StressReport) -> io::Result<()>;
}

/// The shared multi-row status display, one row per worker.
pub(crate) struct ProgressBoard {
    inner: Mutex<BoardInner>,
}

struct BoardInner {
    rows: Vec<Row>,
    sink: Box<dyn DisplaySink>,
}

impl ProgressBoard {
    pub(crate) fn new(threads: usize, sink: Box<dyn DisplaySink>) -> Self {
        Self {
            inner: Mutex::new(BoardInner {
                rows: (0..threads).map(Row::new).collect(),
                sink,
            }),
        }
    }

    // The display is purely cosmetic, so sink I/O errors on the hot path are
    // dropped rather than allowed to kill a trial; summary errors do surface.
    // A worker that panicked inside a callback must not poison the board for
    // its siblings either, hence the into_inner recovery.

    pub(crate) fn start(&self, worker: usize, seed: u64) {
        let mut inner = self.lock();
        inner.rows[worker].reset(seed);
        let BoardInner { rows, sink } = &mut *inner;
        let _ = sink.render(rows);
    }

    pub(crate) fn tick(&self, worker: usize) {
        let mut inner = self.lock();
        inner.rows[worker].tick();
        let BoardInner { rows, sink } = &mut *inner;
        let _ = sink.render(rows);
        rows[worker].measure();
    }

    pub(crate) fn finish(&self, worker: usize, correct: bool) {
        let mut inner = self.lock();
        inner.rows[worker].tick();
        let BoardInner { rows, sink } = &mut *inner;
        let _ = sink.outcome(&rows[worker], correct);
        let _ = sink.render(rows);
    }

    pub(crate) fn clear(&self) {
        let mut inner = self.lock();
        let _ = inner.sink.clear();
    }

    pub(crate) fn summary(&self, report: &StressReport) -> Result<(), StressError> {
        let mut inner = self.lock();
        inner.sink.summary(report).map_err(StressError::Display)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BoardInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Interactive sink: repaints a block of rows in place.
///
/// Draw strategy: print a rule and every row (each line erased first), then
/// move the cursor back to the top of the block so the next redraw overwrites
/// it. Finished-trial verdict lines are printed where the cursor rests, so
/// they accumulate above the live block as the block repaints below them.
pub struct AnsiSink<W> {
    stream: W,
}

impl AnsiSink<StandardStream> {
    /// A sink writing to stdout with the given color preference.
    pub fn stdout(color: Color) -> Self {
        Self::new(StandardStream::stdout(
            color.color_choice(atty::Stream::Stdout),
        ))
    }
}

impl<W: WriteColor + Send> AnsiSink<W> {
    pub fn new(stream: W) -> Self {
        Self { stream }
    }

    fn write_row(&mut self, row: &Row) -> io::Result<()> {
        write!(self.stream, "T{:<2}: ", row.worker())?;
        match row.seed() {
            Some(seed) => write!(self.stream, "{seed:>4}")?,
            None => write!(self.stream, "{:>4}", "-")?,
        }
        for tick in row.ticks() {
            write!(self.stream, " {:>5.2}s", tick.as_secs_f64())?;
        }
        Ok(())
    }

    fn write_counterexample(&mut self, counterexample: &Counterexample) -> io::Result<()> {
        writeln!(self.stream, "{SEPARATOR}")?;
        self.stream.set_color(&fail_spec())?;
        write!(self.stream, "Seed {}", counterexample.seed)?;
        self.stream.reset()?;
        writeln!(self.stream, "; checker output:")?;
        write!(self.stream, "{}", counterexample.result)
    }
}

impl<W: WriteColor + Send> DisplaySink for AnsiSink<W> {
    fn render(&mut self, rows: &[Row]) -> io::Result<()> {
        writeln!(self.stream, "{SEPARATOR}")?;
        for row in rows {
            write!(self.stream, "\x1b[K")?;
            self.write_row(row)?;
            writeln!(self.stream)?;
        }
        // Reposition to the top of the block (rule + one line per row).
        write!(self.stream, "\x1b[{}A", rows.len() + 1)?;
        self.stream.flush()
    }

    fn outcome(&mut self, row: &Row, correct: bool) -> io::Result<()> {
        write!(self.stream, "\x1b[K")?;
        self.write_row(row)?;
        let spec = if correct { pass_spec() } else { fail_spec() };
        self.stream.set_color(&spec)?;
        write!(self.stream, " {}", if correct { "OK" } else { "WA" })?;
        self.stream.reset()?;
        writeln!(self.stream)
    }

    fn clear(&mut self) -> io::Result<()> {
        write!(self.stream, "\x1b[J")?;
        self.stream.flush()
    }

    fn summary(&mut self, report: &StressReport) -> io::Result<()> {
        let stats = &report.stats;

        writeln!(self.stream)?;
        let header_spec = if report.is_success() {
            pass_spec()
        } else {
            fail_spec()
        };
        self.stream.set_color(&header_spec)?;
        write!(self.stream, "{:>12} ", "Summary")?;
        self.stream.reset()?;

        let count_spec = count_spec();

        self.stream.set_color(&count_spec)?;
        write!(self.stream, "{}", stats.trials_run)?;
        self.stream.reset()?;
        write!(self.stream, " trials run: ")?;

        self.stream.set_color(&count_spec)?;
        write!(self.stream, "{}", stats.passed)?;
        self.stream.set_color(&pass_spec())?;
        write!(self.stream, " passed")?;
        self.stream.reset()?;
        write!(self.stream, ", ")?;

        self.stream.set_color(&count_spec)?;
        write!(self.stream, "{}", stats.failed)?;
        if stats.failed > 0 {
            self.stream.set_color(&fail_spec())?;
        }
        write!(self.stream, " failed")?;
        self.stream.reset()?;
        writeln!(self.stream)?;

        if report.counterexamples.is_empty() {
            writeln!(self.stream, "stress finished, no counterexamples found")?;
        } else {
            for counterexample in &report.counterexamples {
                self.write_counterexample(counterexample)?;
            }
        }
        self.stream.flush()
    }
}

/// Non-interactive sink: one JSON object per event, one event per line.
///
/// Suitable for piping a run's progress into a log file or another tool; no
/// cursor control, no colors.
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: io::Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn emit(&mut self, event: &SinkEvent<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        writeln!(self.writer)?;
        self.writer.flush()
    }
}

impl<W: io::Write + Send> DisplaySink for JsonLinesSink<W> {
    fn render(&mut self, rows: &[Row]) -> io::Result<()> {
        self.emit(&SinkEvent::Board {
            rows: rows.iter().map(RowSnapshot::from).collect(),
        })
    }

    fn outcome(&mut self, row: &Row, correct: bool) -> io::Result<()> {
        self.emit(&SinkEvent::Outcome {
            worker: row.worker(),
            seed: row.seed(),
            correct,
        })
    }

    fn clear(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn summary(&mut self, report: &StressReport) -> io::Result<()> {
        self.emit(&SinkEvent::Summary {
            stats: &report.stats,
            counterexamples: &report.counterexamples,
        })
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
enum SinkEvent<'a> {
    #[serde(rename_all = "kebab-case")]
    Board { rows: Vec<RowSnapshot> },
    #[serde(rename_all = "kebab-case")]
    Outcome {
        worker: usize,
        seed: Option<u64>,
        correct: bool,
    },
    #[serde(rename_all = "kebab-case")]
    Summary {
        stats: &'a RunStats,
        counterexamples: &'a [Counterexample],
    },
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct RowSnapshot {
    worker: usize,
    seed: Option<u64>,
    phase_secs: Vec<f64>,
}

impl From<&Row> for RowSnapshot {
    fn from(row: &Row) -> Self {
        Self {
            worker: row.worker(),
            seed: row.seed(),
            phase_secs: row.ticks().iter().map(Duration::as_secs_f64).collect(),
        }
    }
}

fn count_spec() -> ColorSpec {
    let mut color_spec = ColorSpec::new();
    color_spec.set_bold(true);
    color_spec
}

fn pass_spec() -> ColorSpec {
    let mut color_spec = ColorSpec::new();
    color_spec
        .set_fg(Some(termcolor::Color::Green))
        .set_bold(true);
    color_spec
}

fn fail_spec() -> ColorSpec {
    let mut color_spec = ColorSpec::new();
    color_spec
        .set_fg(Some(termcolor::Color::Red))
        .set_bold(true);
    color_spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::CheckerResult;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use termcolor::NoColor;

    fn fixed_row(worker: usize, seed: u64, tick_millis: &[u64]) -> Row {
        let mut row = Row::new(worker);
        row.reset(seed);
        row.ticks = tick_millis
            .iter()
            .map(|&ms| Duration::from_millis(ms))
            .collect();
        row
    }

    fn sink_output<F>(f: F) -> String
    where
        F: FnOnce(&mut AnsiSink<NoColor<Vec<u8>>>),
    {
        let mut sink = AnsiSink::new(NoColor::new(Vec::new()));
        f(&mut sink);
        String::from_utf8(sink.stream.into_inner()).expect("output is valid UTF-8")
    }

    #[test]
    fn row_reset_clears_ticks() {
        let mut row = Row::new(2);
        row.reset(17);
        row.tick();
        row.tick();
        assert_eq!(row.ticks().len(), 2);
        assert_eq!(row.seed(), Some(17));

        row.reset(18);
        assert!(row.ticks().is_empty());
        assert_eq!(row.seed(), Some(18));
    }

    #[test]
    fn ansi_render_repaints_in_place() {
        let rows = vec![
            fixed_row(0, 3, &[1500]),
            fixed_row(1, 12, &[200, 60]),
        ];
        let out = sink_output(|sink| sink.render(&rows).expect("render succeeded"));
        assert_eq!(
            out,
            format!(
                "{SEPARATOR}\n\
                 \x1b[KT0 :    3  1.50s\n\
                 \x1b[KT1 :   12  0.20s  0.06s\n\
                 \x1b[3A"
            )
        );
    }

    #[test]
    fn ansi_outcome_lines() {
        let row = fixed_row(1, 42, &[100]);
        let pass = sink_output(|sink| sink.outcome(&row, true).expect("outcome succeeded"));
        assert_eq!(pass, "\x1b[KT1 :   42  0.10s OK\n");
        let fail = sink_output(|sink| sink.outcome(&row, false).expect("outcome succeeded"));
        assert_eq!(fail, "\x1b[KT1 :   42  0.10s WA\n");
    }

    #[test]
    fn ansi_summary_success() {
        let report = StressReport {
            stats: RunStats {
                trials_run: 5,
                passed: 5,
                failed: 0,
            },
            counterexamples: vec![],
        };
        let out = sink_output(|sink| sink.summary(&report).expect("summary succeeded"));
        assert_eq!(
            out,
            indoc! {"

                     Summary 5 trials run: 5 passed, 0 failed
                stress finished, no counterexamples found
            "}
        );
    }

    #[test]
    fn ansi_summary_with_counterexample() {
        let report = StressReport {
            stats: RunStats {
                trials_run: 4,
                passed: 3,
                failed: 1,
            },
            counterexamples: vec![Counterexample {
                seed: 3,
                result: CheckerResult::wrong_answer("answers differ"),
            }],
        };
        let out = sink_output(|sink| sink.summary(&report).expect("summary succeeded"));
        assert_eq!(
            out,
            indoc! {"

                     Summary 4 trials run: 3 passed, 1 failed
                ----------------------------------------
                Seed 3; checker output:
                WRONG
                answers differ
                0
            "}
        );
    }

    #[test]
    fn json_lines_events() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.render(&[fixed_row(0, 7, &[250])])
            .expect("render succeeded");
        sink.outcome(&fixed_row(0, 7, &[250, 30]), false)
            .expect("outcome succeeded");

        let out = String::from_utf8(sink.writer).expect("output is valid UTF-8");
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).expect("valid JSON"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "board");
        assert_eq!(lines[0]["rows"][0]["seed"], 7);
        assert_eq!(lines[0]["rows"][0]["phase-secs"][0], 0.25);
        assert_eq!(lines[1]["event"], "outcome");
        assert_eq!(lines[1]["correct"], false);
    }

    #[test]
    fn board_serializes_rows() {
        let board = ProgressBoard::new(2, Box::new(JsonLinesSink::new(io::sink())));
        board.start(0, 5);
        board.tick(0);
        board.finish(0, true);
        board.start(1, 6);
        board.clear();

        let inner = board.lock();
        assert_eq!(inner.rows[0].seed(), Some(5));
        assert_eq!(inner.rows[0].ticks().len(), 2);
        assert_eq!(inner.rows[1].seed(), Some(6));
    }

    #[test]
    fn color_parsing() {
        for &variant in &Color::variants() {
            variant.parse::<Color>().expect("variant is valid");
        }
        assert!("sometimes".parse::<Color>().is_err());
    }
}
