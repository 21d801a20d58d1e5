use clap::Parser;
use scalper::cli::{run, Cli};
use tracing::Level;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    run(cli)
}
