use std::{path::PathBuf, time::Duration};

use super::testcase::TestCase;
use crate::exec::Termination;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    /// The solution didn't exit successfully (including timeout).
    RuntimeFailure { status: Termination, stderr: String },
    /// The solution exited successfully but the checker rejected its answer.
    CheckerRejected { status: Termination, stderr: String },
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        *self == Outcome::Passed
    }

    pub fn judge_code(&self) -> JudgeCode {
        match self {
            Outcome::Passed => JudgeCode::AC,
            Outcome::RuntimeFailure { status, .. } if status.is_timed_out() => JudgeCode::TLE,
            Outcome::RuntimeFailure { .. } => JudgeCode::RE,
            Outcome::CheckerRejected { .. } => JudgeCode::WA,
        }
    }

    /// Termination of the process responsible for the failure.
    pub fn failed_status(&self) -> Option<Termination> {
        match self {
            Outcome::Passed => None,
            Outcome::RuntimeFailure { status, .. } | Outcome::CheckerRejected { status, .. } => {
                Some(*status)
            }
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Outcome::Passed => None,
            Outcome::RuntimeFailure { stderr, .. } | Outcome::CheckerRejected { stderr, .. } => {
                Some(stderr)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum JudgeCode {
    AC,
    WA,
    TLE,
    RE,
}

/// Files written for one testcase under the output dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub output: PathBuf,
    pub stderr: PathBuf,
    pub checker_stderr: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub testcase: TestCase,
    pub outcome: Outcome,
    pub execution_time: Duration,
    pub artifacts: Option<Artifacts>,
}
