pub mod list;
pub mod run;

use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,

    /// Config file (default: nearest `judgekit.toml` in current or ancestor dirs)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    /// Run the solution against every testcase and judge it with the checker
    #[command(alias("r"))]
    Run(run::Args),

    /// List testcases found in a tests directory
    #[command(alias("ls"))]
    List(list::Args),
}

/// Process exit code on success.
pub type SubcmdResult = anyhow::Result<i32>;

impl GlobalArgs {
    pub async fn exec_subcmd(&self) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Run(args) => run::exec(args, self).await,
            List(args) => list::exec(args, self),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[clap(rename_all = "lower")]
pub enum ArgExitCode {
    Propagate,
    Fixed,
}

impl From<ArgExitCode> for judgekit_core::report::ExitCodePolicy {
    fn from(value: ArgExitCode) -> Self {
        use judgekit_core::report::ExitCodePolicy;
        use ArgExitCode::*;
        match value {
            Propagate => ExitCodePolicy::Propagate,
            Fixed => ExitCodePolicy::Fixed,
        }
    }
}
