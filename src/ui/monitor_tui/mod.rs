//! Terminal User Interface for the sensor monitor.
//!
//! Draws the latest published snapshot with ratatui.

mod app;
mod event_handler;
mod render;

pub use app::{run_monitor_app, MonitorApp, MonitorAppConfig};
pub use event_handler::MonitorEvent;
