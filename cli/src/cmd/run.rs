use std::{
    io::{self, IsTerminal as _},
    path::PathBuf,
    time::Duration,
};

use judgekit_core::action::{self, RunRequest};

use super::{ArgExitCode, GlobalArgs, SubcmdResult};
use crate::{config, util};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Path to solution binary
    #[arg(long)]
    pub solution: PathBuf,

    /// Path to checker binary (called as `checker <input> <output> <answer>`)
    #[arg(long)]
    pub checker: PathBuf,

    /// Tests directory (with `.t` and `.t.a` files by default)
    #[arg(long)]
    pub tests: PathBuf,

    /// Output directory for produced answers and logs
    #[arg(long)]
    pub out: PathBuf,

    /// Per-test timeout in seconds
    #[arg(long, value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Print only a status line per failure, without diagnostics
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub terse: bool,

    /// Print every result with diagnostics (overrides config)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Exit code on a failed test
    #[arg(long, value_enum)]
    pub exit_code: Option<ArgExitCode>,

    /// Glob for input file names
    #[arg(long)]
    pub input_pattern: Option<String>,

    /// Suffix appended to an input file name to get its answer file
    #[arg(long)]
    pub answer_suffix: Option<String>,
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|e| format!("'{}' is not a number of seconds: {}", s, e))?;
    judgekit_core::config::parse_timeout_secs(secs).map_err(|e| e.to_string())
}

pub async fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = config::with_run_args(util::load_config(global_args)?, args);
    log::debug!("{:?}", cfg);

    let timeout = match args.timeout {
        Some(limit) => Some(limit),
        None => cfg.run.timeout()?,
    };

    let req = RunRequest {
        solution: args.solution.clone(),
        checker: args.checker.clone(),
        tests_dir: args.tests.clone(),
        out_dir: args.out.clone(),
        timeout,
        progress: io::stderr().is_terminal(),
    };

    Ok(action::run_tests(&req, &cfg, io::stdout().lock()).await)
}
