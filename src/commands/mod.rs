// Command handlers module
pub mod monitor;

pub use monitor::execute as monitor;
