//! Platform-specific metric sources.
//!
//! Every source is an [`SourceAdapter`]; [`discover_sources`] assembles the
//! ones usable on this machine in display order.

pub mod cpu;
pub mod gpu;
pub mod hwmon;
pub mod msr;

pub use cpu::{CpuStats, CpuStatsAdapter, SysinfoCpuStats};
pub use hwmon::{HwmonSource, SensorChip, SensorFeature};
pub use msr::{DevCpuMsr, RegisterSource, VccinAdapter};

use std::path::Path;

use crate::core::config::{Config, DISABLE_MSR, DISABLE_NVIDIA_SMI};
use crate::core::system_monitor::SourceAdapter;
use crate::error::Result;

/// Sources in display order: hwmon chips, CPU usage and frequency, CPU
/// voltage, GPUs. Optional sources that are blacklisted or fail their
/// startup probe are left out.
pub fn discover_sources(config: &Config) -> Vec<Box<dyn SourceAdapter>> {
    discover_sources_with(
        config,
        Path::new(HwmonSource::SYSFS_ROOT),
        SysinfoCpuStats::new(),
        DevCpuMsr::default(),
        gpu::get_gpu_source,
    )
}

/// [`discover_sources`] over explicit hwmon, CPU, register and GPU backends.
///
/// `gpu` is only called when the nvidia-smi source is not blacklisted.
pub fn discover_sources_with<S, R, G>(
    config: &Config,
    hwmon_root: &Path,
    cpu_stats: S,
    registers: R,
    gpu: G,
) -> Vec<Box<dyn SourceAdapter>>
where
    S: CpuStats + 'static,
    R: RegisterSource + 'static,
    G: FnOnce() -> Result<Box<dyn SourceAdapter>>,
{
    let mut sources: Vec<Box<dyn SourceAdapter>> = Vec::new();

    match HwmonSource::discover_at(hwmon_root) {
        Ok(hwmon) => {
            log::info!("hwmon: {} chips", hwmon.chips().len());
            sources.push(Box::new(hwmon));
        }
        Err(e) => log::warn!("hwmon unavailable at {}: {}", hwmon_root.display(), e),
    }

    let cpu = CpuStatsAdapter::new(cpu_stats);
    let cores = cpu.core_count();
    sources.push(Box::new(cpu));

    if config.is_disabled(DISABLE_MSR) {
        log::info!("MSR source disabled in config");
    } else {
        match VccinAdapter::probe(registers, cores) {
            Ok(vccin) => sources.push(Box::new(vccin)),
            Err(e) => log::info!(
                "CPU VCCIN unavailable ({}); load the msr module (`modprobe msr`) and run as root",
                e
            ),
        }
    }

    if config.is_disabled(DISABLE_NVIDIA_SMI) {
        log::info!("nvidia-smi source disabled in config");
    } else {
        match gpu() {
            Ok(source) => sources.push(source),
            Err(e) => log::info!("GPU metrics unavailable: {}", e),
        }
    }

    sources
}
