use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod device;
mod discover;
mod error;
mod frame;
mod port;
mod proto;
mod transport;
mod upload;

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let filter = if args.quiet {
        "warn"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match args.cmd {
        cli::Cmd::Program(opts) => commands::program::run(opts),
        cli::Cmd::Info(opts) => commands::info::run(opts),
        cli::Cmd::List => commands::list::run(),
        cli::Cmd::ClearFlash(opts) => commands::flash::clear(opts),
        cli::Cmd::QueryFlash(opts) => commands::flash::query(opts),
        cli::Cmd::Reboot(opts) => commands::reboot::run(opts),
    }
}
