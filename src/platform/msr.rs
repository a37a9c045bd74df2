//! CPU input voltage from model-specific registers.
//!
//! Reads `IA32_PERF_STATUS` through the Linux `msr` driver
//! (`/dev/cpu/<n>/msr`), which needs root and `modprobe msr`.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use crate::core::system_monitor::{
    core_label, MetricDescriptor, MetricInfo, MetricKind, Reading, SourceAdapter,
};
use crate::error::{Result, SenseError};

pub const IA32_PERF_STATUS: u64 = 0x198;

pub const VCCIN_GROUP: &str = "CPU VCCIN";

/// Access to 64-bit per-core registers.
pub trait RegisterSource: Send {
    fn read_register(&self, address: u64, core: usize) -> Result<u64>;
}

/// Registers read through `/dev/cpu/<n>/msr`.
#[derive(Debug, Clone)]
pub struct DevCpuMsr {
    root: PathBuf,
}

impl Default for DevCpuMsr {
    fn default() -> Self {
        Self::with_root("/dev/cpu")
    }
}

impl DevCpuMsr {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl RegisterSource for DevCpuMsr {
    fn read_register(&self, address: u64, core: usize) -> Result<u64> {
        let path = self.root.join(core.to_string()).join("msr");
        let register_error =
            |e: std::io::Error| SenseError::register(format!("{}: {}", path.display(), e));

        let mut file = File::open(&path).map_err(register_error)?;
        file.seek(SeekFrom::Start(address)).map_err(register_error)?;

        let mut buf = [0u8; 8];
        file.read_exact(&mut buf).map_err(register_error)?;

        Ok(u64::from_le_bytes(buf))
    }
}

/// Volts encoded in the upper half of `IA32_PERF_STATUS`, in units of 1/8192 V.
pub fn vccin_from_register(raw: u64) -> f64 {
    (raw >> 32) as f64 / 8192.0
}

/// Per-core input voltage.
pub struct VccinAdapter<R: RegisterSource = DevCpuMsr> {
    registers: R,
    cores: usize,
}

impl<R: RegisterSource> VccinAdapter<R> {
    /// Read core 0 once; the adapter only exists if that works.
    pub fn probe(registers: R, cores: usize) -> Result<Self> {
        if cores == 0 {
            return Err(SenseError::register("no CPU cores to read"));
        }
        registers.read_register(IA32_PERF_STATUS, 0)?;
        Ok(Self { registers, cores })
    }
}

impl<R: RegisterSource> SourceAdapter for VccinAdapter<R> {
    fn name(&self) -> &str {
        "msr"
    }

    fn describe(&self) -> Vec<MetricDescriptor> {
        (0..self.cores)
            .map(|core| {
                MetricDescriptor::new(
                    VCCIN_GROUP,
                    core_label(core),
                    MetricInfo::of_kind(MetricKind::Voltage),
                )
            })
            .collect()
    }

    fn poll(&mut self) -> Result<Vec<Reading>> {
        let mut readings = Vec::with_capacity(self.cores);
        let mut last_error = None;

        for core in 0..self.cores {
            match self.registers.read_register(IA32_PERF_STATUS, core) {
                Ok(raw) => readings.push(Reading::new(
                    VCCIN_GROUP,
                    core_label(core),
                    vccin_from_register(raw),
                )),
                Err(e) => {
                    log::debug!("VCCIN {}: {}", core_label(core), e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if readings.is_empty() => Err(e),
            _ => Ok(readings),
        }
    }
}
