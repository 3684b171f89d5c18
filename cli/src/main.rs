use clap::Parser;
use judgekit_cli::{cmd::GlobalArgs, util};
use judgekit_core::report::EXIT_CONFIG_ERROR;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    util::init_logger();
    let app = GlobalArgs::parse();
    let code = app.exec_subcmd().await.unwrap_or_else(|e| {
        eprintln!("Error: {:?}", e);
        EXIT_CONFIG_ERROR
    });
    std::process::exit(code);
}
