//! Sensor monitor command handler.
//!
//! Loads the configuration, discovers sources and either runs the TUI or
//! prints a single snapshot.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::*;

use crate::core::config::{Config, ConfigLoad};
use crate::core::system_monitor::{MetricsRuntime, RenderSnapshot, UpdateCycle};
use crate::platform::discover_sources;
use crate::ui::monitor_tui::{run_monitor_app, MonitorAppConfig};
use crate::ui::render_text;

/// Execute the monitor command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config_path = match matches.get_one::<PathBuf>("config") {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };

    let config = match Config::load_or_create(&config_path)? {
        ConfigLoad::Loaded(config) => config,
        ConfigLoad::Created(path) => {
            log::warn!("No configuration found, wrote defaults to {}", path.display());
            println!(
                "{}",
                format!("Created default configuration at {}", path.display()).yellow()
            );
            println!("Review it (blacklist, update_delay, palette) and run sense again.");
            return Ok(());
        }
    };
    log::info!("Loaded configuration from {}", config_path.display());

    let sources = discover_sources(&config);
    let cycle = UpdateCycle::new(sources, &config.blacklist_set(), config.queue_length);

    if matches.get_flag("once") {
        let snapshot = collect_once(cycle);
        return print_snapshot(&snapshot, matches.get_flag("json"));
    }

    let runtime = MetricsRuntime::start(cycle, config.update_delay())
        .context("Failed to start update cycle")?;

    let result = run_monitor_app(MonitorAppConfig::from(&config), runtime.snapshot_rx.clone());
    runtime.shutdown();

    result.context("Failed to run sensor monitor")
}

/// Two cycles, so CPU usage has a baseline to be measured against.
fn collect_once(mut cycle: UpdateCycle) -> Arc<RenderSnapshot> {
    let snapshot_rx = cycle.subscribe();

    cycle.tick();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    let report = cycle.tick();
    if !report.failed_sources.is_empty() {
        log::warn!("Failed sources: {}", report.failed_sources.join(", "));
    }

    let snapshot = snapshot_rx.borrow().clone();
    snapshot
}

fn print_snapshot(snapshot: &RenderSnapshot, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;
        println!("{}", out);
    } else {
        print!("{}", render_text(snapshot));
    }
    Ok(())
}
