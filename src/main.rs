use clap::Parser;
use triplescreen::cli::{Cli, run};
use triplescreen::logging::init_logging;

fn main() -> std::process::ExitCode {
    init_logging();
    run(Cli::parse())
}
