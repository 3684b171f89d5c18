use std::{
    io::{self, Write},
    time::Duration,
};

use colored::Colorize as _;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;

use crate::error::Error;
use crate::exec::Termination;
use crate::style::{self, ColorTheme as _};
use crate::testing::{Judge, Outcome, TestCase, TestOutcome, TestSet};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// GitHub Actions turns stdout lines starting with this into error annotations.
pub const GHA_ERROR_PREFIX: &str = "::error::";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Normal,
    /// One status line per outcome, no diagnostic bodies.
    Terse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitCodePolicy {
    /// Exit with the failing child's own status when it has one.
    #[default]
    Propagate,
    /// Always exit with 1 on a failed test.
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub verbosity: Verbosity,
    pub exit_code: ExitCodePolicy,
    pub error_prefix: String,
    pub progress: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            exit_code: ExitCodePolicy::default(),
            error_prefix: GHA_ERROR_PREFIX.to_owned(),
            progress: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Judged testcases in run order. Only the last one may be a failure.
    pub results: Vec<TestOutcome>,
    pub total: usize,
    /// Message of the harness error that stopped the run.
    pub aborted: Option<String>,
}

impl RunSummary {
    pub fn first_failure(&self) -> Option<&TestOutcome> {
        self.results.iter().find(|r| !r.outcome.is_passed())
    }

    pub fn num_passed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_passed()).count()
    }

    pub fn is_all_passed(&self) -> bool {
        self.aborted.is_none() && self.num_passed() == self.total
    }

    pub fn exit_code(&self, policy: ExitCodePolicy) -> i32 {
        if self.aborted.is_some() {
            return EXIT_CONFIG_ERROR;
        }
        let Some(failure) = self.first_failure() else {
            return EXIT_SUCCESS
        };
        match (policy, failure.outcome.failed_status()) {
            (ExitCodePolicy::Propagate, Some(Termination::Exited(code))) if code != 0 => code,
            _ => EXIT_FAILURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub exit_code: i32,
    pub summary: RunSummary,
}

/// Drives the judge over a [`TestSet`] and writes the transcript.
pub struct Reporter<W: Write> {
    out: W,
    opts: ReportOptions,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, opts: ReportOptions) -> Self {
        Self { out, opts }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Judges testcases in order and stops at the first one that doesn't pass.
    pub async fn run<J>(&mut self, testcases: &TestSet, judge: &J) -> io::Result<Report>
    where
        J: Judge + ?Sized,
    {
        let mut summary = RunSummary {
            results: Vec::with_capacity(testcases.len()),
            total: testcases.len(),
            aborted: None,
        };

        if testcases.is_empty() {
            writeln!(self.out, "No tests found; passing by default.")?;
            return Ok(Report {
                exit_code: EXIT_SUCCESS,
                summary,
            });
        }

        for t in testcases {
            let spinner = self.spinner(t);
            let res = judge.judge(t).await;
            if let Some(bar) = spinner {
                bar.finish_and_clear();
            }

            match res {
                Err(e) => {
                    self.print_error(&e)?;
                    summary.aborted = Some(e.to_string());
                    break;
                }
                Ok(res) => {
                    let passed = res.outcome.is_passed();
                    self.print_outcome(&res)?;
                    summary.results.push(res);
                    if !passed {
                        break;
                    }
                }
            }
        }

        if summary.is_all_passed() {
            writeln!(self.out, "{}", "All tests passed.".green())?;
        } else if let Some(failure) = summary.first_failure() {
            self.print_stopped_summary(failure, &summary)?;
        }

        self.out.flush()?;
        Ok(Report {
            exit_code: summary.exit_code(self.opts.exit_code),
            summary,
        })
    }

    /// Reports an error raised before judging started.
    pub fn config_error(&mut self, err: &Error) -> i32 {
        if let Err(e) = self.print_error(err).and_then(|_| self.out.flush()) {
            log::error!("Failed to write report: {:#}", e);
        }
        EXIT_CONFIG_ERROR
    }

    fn spinner(&self, t: &TestCase) -> Option<ProgressBar> {
        if !self.opts.progress || self.opts.verbosity == Verbosity::Terse {
            return None;
        }
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let bar = ProgressBar::new_spinner()
            .with_style(style)
            .with_message(format!("Testcase {} ...", t.name()));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    }

    fn print_error(&mut self, err: &Error) -> io::Result<()> {
        writeln!(
            self.out,
            "{}{}",
            self.opts.error_prefix,
            err.to_string().bright_red()
        )
    }

    fn print_outcome(&mut self, res: &TestOutcome) -> io::Result<()> {
        let name = res.testcase.name();
        let terse = self.opts.verbosity == Verbosity::Terse;
        let color = res.outcome.judge_code().color();

        match &res.outcome {
            Outcome::Passed => {
                log::debug!("{} took {}ms", name, res.execution_time.as_millis());
                writeln!(self.out, "{}", format!("Passed: {}", name).color(color))
            }
            Outcome::RuntimeFailure { status, stderr } => {
                let header = format!("Runtime error on test {} ({})", name, status);
                writeln!(self.out, "{}{}", self.opts.error_prefix, header.color(color))?;
                if !terse {
                    self.print_diagnostic("[stderr]", stderr)?;
                }
                Ok(())
            }
            Outcome::CheckerRejected { stderr, .. } => {
                if terse {
                    let header = format!("Test {} failed.", name);
                    writeln!(self.out, "{}{}", self.opts.error_prefix, header.color(color))
                } else {
                    let header = format!("Test {} failed. Checker output:", name);
                    writeln!(self.out, "{}{}", self.opts.error_prefix, header.color(color))?;
                    self.print_diagnostic("[checker stderr]", stderr)
                }
            }
        }
    }

    fn print_diagnostic(&mut self, title: &str, text: &str) -> io::Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let cols = style::rule_width();
        writeln!(self.out, "{}", style::sub_title(title, cols))?;
        write!(self.out, "{}", text)?;
        if !text.ends_with('\n') {
            writeln!(self.out)?;
        }
        writeln!(self.out, "{}", style::bold_rule(cols))
    }

    fn print_stopped_summary(&mut self, failure: &TestOutcome, summary: &RunSummary) -> io::Result<()> {
        if self.opts.verbosity == Verbosity::Terse {
            return Ok(());
        }
        let bar = "-".repeat(5);
        let msg = format!(
            "{}/{} tests passed, stopped at {}",
            summary.num_passed(),
            summary.total,
            failure.testcase.name(),
        );
        writeln!(
            self.out,
            "{} {} {} {}",
            bar,
            msg.bright_red(),
            style::judge_icon(failure.outcome.judge_code()),
            bar
        )
    }
}
