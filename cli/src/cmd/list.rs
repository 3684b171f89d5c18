use std::{io, path::PathBuf};

use colored::Colorize as _;
use judgekit_core::action;

use super::{GlobalArgs, SubcmdResult};
use crate::util;

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Tests directory
    #[arg(long)]
    pub tests: PathBuf,

    #[arg(short, long)]
    pub json: bool,
}

pub fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = util::load_config(global_args)?;
    let testcases = action::list_tests(&args.tests, &cfg)?;

    if args.json {
        serde_json::to_writer_pretty(io::stdout(), testcases.as_slice())?;
        println!();
        return Ok(0);
    }

    for t in &testcases {
        let answer = t.answer_path().to_string_lossy();
        if t.answer_path().is_file() {
            println!("{}\t{}", t.name(), answer);
        } else {
            println!("{}\t{} {}", t.name(), answer, "(missing)".bright_red());
        }
    }
    Ok(0)
}
