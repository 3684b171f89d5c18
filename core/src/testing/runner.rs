use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;

use super::{result::*, testcase::*};
use crate::error::{Error, Result};
use crate::exec::{ExecCommand, Executor, Sink, Source, Termination};

/// Decides the outcome of a single testcase.
#[async_trait]
pub trait Judge {
    async fn judge(&self, testcase: &TestCase) -> Result<TestOutcome>;
}

/// Runs the solution, then hands its answer to the checker.
#[derive(Debug, Clone)]
pub struct TestRunner {
    solution: ExecCommand,
    checker: ExecCommand,
    out_dir: PathBuf,
    execution_time_limit: Option<Duration>,
    diagnostic_max_bytes: usize,
}

impl TestRunner {
    pub const DEFAULT_DIAGNOSTIC_MAX_BYTES: usize = 64 * 1024;

    pub fn new(solution: ExecCommand, checker: ExecCommand, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            solution,
            checker,
            out_dir: out_dir.into(),
            execution_time_limit: None,
            diagnostic_max_bytes: Self::DEFAULT_DIAGNOSTIC_MAX_BYTES,
        }
    }

    pub fn execution_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.execution_time_limit = limit;
        self
    }

    pub fn diagnostic_max_bytes(mut self, max_bytes: usize) -> Self {
        self.diagnostic_max_bytes = max_bytes;
        self
    }

    pub fn artifacts_for(&self, testcase: &TestCase) -> Artifacts {
        let name = testcase.name();
        Artifacts {
            output: self.out_dir.join(format!("{}.out", name)),
            stderr: self.out_dir.join(format!("{}.stderr", name)),
            checker_stderr: self.out_dir.join(format!("{}.cmp.stderr", name)),
        }
    }

    fn read_diagnostic(&self, log: &Path) -> String {
        match fsutil::read_head_lossy(log, self.diagnostic_max_bytes) {
            Ok((mut text, truncated)) => {
                if truncated {
                    text.push_str("\n... (truncated)\n");
                }
                text
            }
            Err(e) => {
                log::warn!("{:#}", e);
                String::new()
            }
        }
    }
}

#[async_trait]
impl Judge for TestRunner {
    async fn judge(&self, testcase: &TestCase) -> Result<TestOutcome> {
        let answer = testcase.answer_path();
        if !answer.is_file() {
            return Err(Error::MissingAnswer {
                name: testcase.name().to_owned(),
                path: answer.to_owned(),
            });
        }

        let artifacts = self.artifacts_for(testcase);

        let res = Executor::new()
            .stdin(Source::File(testcase.input_path().to_owned()))
            .stdout(Sink::File(artifacts.output.clone()))
            .stderr(Sink::File(artifacts.stderr.clone()))
            .timeout(self.execution_time_limit)
            .execute(&self.solution)
            .await?;
        let execution_time = res.elapsed;

        if !res.termination.success() {
            let outcome = Outcome::RuntimeFailure {
                status: res.termination,
                stderr: self.read_diagnostic(&artifacts.stderr),
            };
            return Ok(TestOutcome {
                testcase: testcase.clone(),
                outcome,
                execution_time,
                artifacts: Some(artifacts),
            });
        }

        let checker = self.checker.clone().args([
            testcase.input_path(),
            artifacts.output.as_path(),
            answer,
        ]);
        let verdict = Executor::new()
            .stderr(Sink::File(artifacts.checker_stderr.clone()))
            .execute(&checker)
            .await?;
        if !verdict.stdout.is_empty() {
            log::debug!(
                "Checker stdout on {}: {}",
                testcase.name(),
                String::from_utf8_lossy(&verdict.stdout)
            );
        }

        let outcome = match verdict.termination {
            Termination::Exited(0) => Outcome::Passed,
            status => Outcome::CheckerRejected {
                status,
                stderr: self.read_diagnostic(&artifacts.checker_stderr),
            },
        };

        Ok(TestOutcome {
            testcase: testcase.clone(),
            outcome,
            execution_time,
            artifacts: Some(artifacts),
        })
    }
}
