//! Command-line driver for batch and single-query evaluation.

use std::io::Write;
use std::process;

use clap::Parser;
use env_logger::Builder;
use log::{LevelFilter, debug};

use xiphos::cli::args::XiphosArgs;
use xiphos::cli::commands::execute_command;

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

fn main() {
    let args = XiphosArgs::parse();
    init_logging(args.verbosity());

    if let Err(e) = execute_command(args) {
        debug!("{e:?}");
        eprintln!("xiphos: {e}");
        process::exit(e.exit_code());
    }
}
