//! GPU-specific platform code.
//!
//! NVIDIA GPUs are read through the `nvidia-smi` tool's XML log.

mod nvidia_smi;

pub use nvidia_smi::{
    parse_gpu_log, GpuLogSource, GpuRecord, GpuValue, NvidiaSmiAdapter, NvidiaSmiCommand,
};

use crate::core::system_monitor::SourceAdapter;
use crate::error::Result;

/// Attempt to get an available GPU source.
///
/// Fails when nvidia-smi is missing, its first run fails, or it reports no
/// GPU. A GPU that cannot be read at startup is treated as absent.
pub fn get_gpu_source() -> Result<Box<dyn SourceAdapter>> {
    let command = NvidiaSmiCommand::locate()?;
    let adapter = NvidiaSmiAdapter::probe(command)?;
    Ok(Box::new(adapter))
}
