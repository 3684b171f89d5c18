use std::{io::Write as _, path::PathBuf};

use anyhow::Context as _;
use colored::Colorize as _;
use judgekit_core::{style::ColorTheme as _, Config};

use crate::cmd::GlobalArgs;

pub fn current_dir() -> anyhow::Result<PathBuf> {
    std::env::current_dir().context("Failed to get current dir")
}

pub fn load_config(global_args: &GlobalArgs) -> anyhow::Result<Config> {
    match &global_args.config {
        Some(path) => Config::from_toml_file(path.clone()),
        None => Config::from_file_finding_in_ancestors_or_default(self::current_dir()?),
    }
}

/// Logs go to stderr so that stdout stays a clean transcript.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format(|buf, record| {
            let level = record.level();
            writeln!(
                buf,
                "{}: {}",
                level.as_str().to_lowercase().color(level.color()).bold(),
                record.args()
            )
        })
        .init();
}
