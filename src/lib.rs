// sense library - public API

// Re-export error types
pub mod error;
pub use error::{Result, SenseError};

// Module declarations
pub mod commands;
pub mod core;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use core::config::Config;

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use env_logger::{Target, WriteStyle};

/// Where log records go.
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    /// Appended to a file; the TUI owns the terminal.
    File(PathBuf),
    Discard,
}

/// Initialize logging at `info`, overridable with `RUST_LOG`.
pub fn init_logging(target: LogTarget) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(log::LevelFilter::Info)
        .parse_default_env();

    match target {
        LogTarget::Stderr => {
            builder.target(Target::Stderr);
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            builder
                .target(Target::Pipe(Box::new(file)))
                .write_style(WriteStyle::Never);
        }
        LogTarget::Discard => {
            builder.target(Target::Pipe(Box::new(io::sink())));
        }
    }

    builder.try_init().context("Logger already initialized")?;
    Ok(())
}
