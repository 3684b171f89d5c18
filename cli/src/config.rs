use judgekit_core::{report::Verbosity, Config};

use crate::cmd::run;

/// Command-line flags take precedence over the config file.
pub fn with_run_args(mut cfg: Config, args: &run::Args) -> Config {
    let run::Args {
        solution: _,
        checker: _,
        tests: _,
        out: _,
        timeout,
        terse,
        verbose,
        exit_code,
        input_pattern,
        answer_suffix,
    } = args;

    if let Some(limit) = timeout {
        cfg.run.timeout_secs = Some(limit.as_secs_f64());
    }
    if *terse {
        cfg.report.verbosity = Verbosity::Terse;
    }
    if *verbose {
        cfg.report.verbosity = Verbosity::Normal;
    }
    if let Some(policy) = exit_code {
        cfg.report.exit_code = (*policy).into();
    }
    if let Some(pattern) = input_pattern {
        cfg.tests.input_pattern = pattern.clone();
    }
    if let Some(suffix) = answer_suffix {
        cfg.tests.answer_suffix = suffix.clone();
    }
    cfg
}
