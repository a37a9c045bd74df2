use std::path::PathBuf;

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};

use sense::{commands, init_logging, LogTarget};

fn build_cli() -> Command {
    Command::new("sense")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Hardware sensor monitor with rolling min/max/avg history")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Configuration file (default: $XDG_CONFIG_HOME/sense/config.yaml)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Print one snapshot and exit instead of starting the TUI")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the snapshot as JSON (with --once)")
                .requires("once")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .help("Append log output to this file while the TUI runs")
                .value_parser(value_parser!(PathBuf)),
        )
}

fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    // The TUI owns the terminal; only --once may log to stderr.
    let target = if matches.get_flag("once") {
        LogTarget::Stderr
    } else if let Some(path) = matches.get_one::<PathBuf>("log-file") {
        LogTarget::File(path.clone())
    } else {
        LogTarget::Discard
    };
    init_logging(target)?;

    commands::monitor(&matches)
}
