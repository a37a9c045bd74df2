//! Per-core CPU usage and frequency.

use sysinfo::{CpuRefreshKind, RefreshKind, System};

use crate::core::system_monitor::{
    core_label, MetricDescriptor, MetricInfo, MetricKind, Reading, SourceAdapter,
};
use crate::error::{Result, SenseError};

pub const USAGE_GROUP: &str = "CPU Usage";
pub const FREQUENCY_GROUP: &str = "CPU Frequency";

/// Per-core counters, index-aligned with `Core #N` labels.
pub trait CpuStats: Send {
    fn core_count(&self) -> usize;
    fn refresh(&mut self);
    /// Percent busy since the previous refresh.
    fn per_core_usage(&self) -> Vec<f64>;
    /// Current clock in MHz.
    fn per_core_frequency(&self) -> Vec<f64>;
}

/// [`CpuStats`] backed by `sysinfo`.
pub struct SysinfoCpuStats {
    system: System,
}

impl SysinfoCpuStats {
    /// The initial refresh is the baseline the first usage value is measured
    /// against; it needs `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL` to settle.
    pub fn new() -> Self {
        let refresh = RefreshKind::nothing().with_cpu(CpuRefreshKind::everything());
        Self {
            system: System::new_with_specifics(refresh),
        }
    }
}

impl Default for SysinfoCpuStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuStats for SysinfoCpuStats {
    fn core_count(&self) -> usize {
        self.system.cpus().len()
    }

    fn refresh(&mut self) {
        self.system.refresh_cpu_all();
    }

    fn per_core_usage(&self) -> Vec<f64> {
        self.system
            .cpus()
            .iter()
            .map(|cpu| cpu.cpu_usage() as f64)
            .collect()
    }

    fn per_core_frequency(&self) -> Vec<f64> {
        self.system
            .cpus()
            .iter()
            .map(|cpu| cpu.frequency() as f64)
            .collect()
    }
}

/// Source for the `CPU Usage` and `CPU Frequency` groups.
pub struct CpuStatsAdapter<S: CpuStats = SysinfoCpuStats> {
    stats: S,
    cores: usize,
}

impl<S: CpuStats> CpuStatsAdapter<S> {
    pub fn new(stats: S) -> Self {
        let cores = stats.core_count();
        if cores == 0 {
            log::warn!("No CPUs reported; CPU usage and frequency will be empty");
        }
        Self { stats, cores }
    }

    pub fn core_count(&self) -> usize {
        self.cores
    }
}

impl<S: CpuStats> SourceAdapter for CpuStatsAdapter<S> {
    fn name(&self) -> &str {
        "cpu"
    }

    fn describe(&self) -> Vec<MetricDescriptor> {
        let usage = (0..self.cores).map(|core| {
            MetricDescriptor::new(
                USAGE_GROUP,
                core_label(core),
                MetricInfo::of_kind(MetricKind::Usage),
            )
        });
        let frequency = (0..self.cores).map(|core| {
            MetricDescriptor::new(
                FREQUENCY_GROUP,
                core_label(core),
                MetricInfo::of_kind(MetricKind::Frequency),
            )
        });
        usage.chain(frequency).collect()
    }

    fn poll(&mut self) -> Result<Vec<Reading>> {
        if self.cores == 0 {
            return Err(SenseError::metric_collection("no CPUs reported"));
        }

        self.stats.refresh();
        let usage = self.stats.per_core_usage();
        let frequency = self.stats.per_core_frequency();

        if usage.len() != self.cores {
            log::debug!("CPU count changed: {} -> {}", self.cores, usage.len());
        }

        let usage = usage
            .into_iter()
            .enumerate()
            .map(|(core, value)| Reading::new(USAGE_GROUP, core_label(core), value));
        let frequency = frequency
            .into_iter()
            .enumerate()
            .map(|(core, mhz)| Reading::new(FREQUENCY_GROUP, core_label(core), mhz.round()));

        Ok(usage.chain(frequency).collect())
    }
}
