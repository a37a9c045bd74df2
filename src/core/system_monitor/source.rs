use super::metrics::{MetricDescriptor, Reading};
use crate::error::Result;

/// Trait for metric sources polled by the update cycle
///
/// Implementations wrap one external collaborator (hwmon, CPU statistics,
/// MSR registers, nvidia-smi). Implementations live in the platform layer.
pub trait SourceAdapter: Send {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Metrics this source reports. Called once, when the tree is built.
    fn describe(&self) -> Vec<MetricDescriptor>;

    /// Read the current values
    ///
    /// An `Err` means this source contributes nothing to the current cycle.
    /// Sources made of independent parts should instead skip the parts that
    /// failed and return the rest.
    fn poll(&mut self) -> Result<Vec<Reading>>;
}
