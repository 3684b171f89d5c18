use std::{
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::exec::ExecCommand;
use crate::report::{ReportOptions, Reporter, EXIT_CONFIG_ERROR};
use crate::testing::{TestRunner, TestSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub solution: PathBuf,
    pub checker: PathBuf,
    pub tests_dir: PathBuf,
    pub out_dir: PathBuf,
    pub timeout: Option<Duration>,
    /// Show a spinner on stderr while each testcase runs.
    pub progress: bool,
}

/// Runs the whole harness and returns the process exit code.
pub async fn run_tests<W: Write>(req: &RunRequest, cfg: &Config, out: W) -> i32 {
    let opts = ReportOptions {
        progress: req.progress,
        ..cfg.report.options()
    };
    let mut reporter = Reporter::new(out, opts);

    let (testcases, runner) = match self::prepare(req, cfg) {
        Ok(x) => x,
        Err(e) => return reporter.config_error(&e),
    };

    match reporter.run(&testcases, &runner).await {
        Ok(report) => report.exit_code,
        Err(e) => {
            log::error!("Failed to write report: {:#}", e);
            EXIT_CONFIG_ERROR
        }
    }
}

fn prepare(req: &RunRequest, cfg: &Config) -> Result<(TestSet, TestRunner)> {
    if !req.solution.is_file() {
        return Err(Error::SolutionNotFound(req.solution.clone()));
    }
    if !req.checker.is_file() {
        return Err(Error::CheckerNotFound(req.checker.clone()));
    }
    let testcases = self::list_tests(&req.tests_dir, cfg)?;

    fsutil::mkdir_all(&req.out_dir)?;

    let runner = TestRunner::new(
        ExecCommand::new(self::exec_path(&req.solution)),
        ExecCommand::new(self::exec_path(&req.checker)),
        &req.out_dir,
    )
    .execution_time_limit(req.timeout)
    .diagnostic_max_bytes(cfg.report.diagnostic_max_bytes);

    log::info!(
        "Judging {} testcase(s) from {:?} (time limit: {})",
        testcases.len(),
        req.tests_dir,
        req.timeout
            .map(|d| format!("{}ms", d.as_millis()))
            .unwrap_or_else(|| "none".to_owned()),
    );
    Ok((testcases, runner))
}

pub fn list_tests(tests_dir: impl AsRef<Path>, cfg: &Config) -> Result<TestSet> {
    let tests_dir = tests_dir.as_ref();
    if !tests_dir.is_dir() {
        return Err(Error::TestsDirNotFound(tests_dir.to_owned()));
    }
    let convention = cfg.tests.suffix_convention()?;
    TestSet::discover(tests_dir, &convention)
}

/// A bare file name would be looked up in `PATH`; anchor it to the current dir instead.
fn exec_path(path: &Path) -> PathBuf {
    if path.is_relative() && path.parent() == Some(Path::new("")) {
        Path::new(".").join(path)
    } else {
        path.to_owned()
    }
}
