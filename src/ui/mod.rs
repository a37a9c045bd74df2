// UI and formatting module

pub mod monitor_tui;
pub mod text;
pub mod theme;

// Re-export commonly used items for cleaner imports
pub use text::render_text;
pub use theme::Theme;
