use sense::core::system_monitor::{SourceAdapter, UpdateCycle};
use sense::platform::gpu::{GpuLogSource, NvidiaSmiAdapter};
use sense::platform::msr::IA32_PERF_STATUS;
use sense::platform::{discover_sources_with, CpuStats, RegisterSource};
use sense::{Config, Result, SenseError};
use std::cell::Cell;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const GPU_LOG: &str = r#"<?xml version="1.0" ?>
<!DOCTYPE nvidia_smi_log SYSTEM "nvsmi_device_v12.dtd">
<nvidia_smi_log>
    <gpu id="00000000:01:00.0">
        <product_name>NVIDIA GeForce RTX 3070</product_name>
        <temperature>
            <gpu_temp>52 C</gpu_temp>
        </temperature>
    </gpu>
</nvidia_smi_log>
"#;

struct TwoCores;

impl CpuStats for TwoCores {
    fn core_count(&self) -> usize {
        2
    }

    fn refresh(&mut self) {}

    fn per_core_usage(&self) -> Vec<f64> {
        vec![5.0, 15.0]
    }

    fn per_core_frequency(&self) -> Vec<f64> {
        vec![3600.0, 3601.0]
    }
}

/// Every core reports 1.25 V, or every read fails.
struct Registers {
    readable: bool,
}

impl RegisterSource for Registers {
    fn read_register(&self, address: u64, core: usize) -> Result<u64> {
        assert_eq!(address, IA32_PERF_STATUS);
        if self.readable {
            Ok(10240u64 << 32)
        } else {
            Err(SenseError::register(format!("core {}: permission denied", core)))
        }
    }
}

struct FixedLog;

impl GpuLogSource for FixedLog {
    fn fetch(&self) -> Result<String> {
        Ok(GPU_LOG.to_string())
    }
}

fn gpu() -> Result<Box<dyn SourceAdapter>> {
    Ok(Box::new(NvidiaSmiAdapter::probe(FixedLog)?))
}

fn fake_hwmon(root: &Path) {
    let chip = root.join("hwmon0");
    fs::create_dir_all(&chip).unwrap();
    fs::write(chip.join("name"), "k10temp\n").unwrap();
    fs::write(chip.join("temp1_input"), "48000\n").unwrap();
}

fn config(blacklist: &[&str]) -> Config {
    Config {
        blacklist: blacklist.iter().map(|s| s.to_string()).collect(),
        ..Config::default()
    }
}

fn group_names(cycle: &UpdateCycle) -> Vec<String> {
    cycle.tree().group_names().map(str::to_string).collect()
}

#[test]
fn test_all_sources_in_display_order() {
    let root = TempDir::new().unwrap();
    fake_hwmon(root.path());

    let config = config(&[]);
    let sources = discover_sources_with(
        &config,
        root.path(),
        TwoCores,
        Registers { readable: true },
        gpu,
    );
    let mut cycle = UpdateCycle::new(sources, &config.blacklist_set(), 10);
    cycle.tick();

    assert_eq!(
        group_names(&cycle),
        vec![
            "k10temp-hwmon0",
            "CPU Usage",
            "CPU Frequency",
            "CPU VCCIN",
            "GPU #0: NVIDIA GeForce RTX 3070",
        ]
    );

    let vccin = cycle.tree().get("CPU VCCIN", "Core #1").unwrap();
    assert_eq!(vccin.stats().unwrap().current, 1.25);
    let gpu_temp = cycle
        .tree()
        .get("GPU #0: NVIDIA GeForce RTX 3070", "Temperature")
        .unwrap();
    assert_eq!(gpu_temp.stats().unwrap().current, 52.0);
}

#[test]
fn test_unreadable_registers_leave_out_vccin() {
    let root = TempDir::new().unwrap();
    fake_hwmon(root.path());

    let config = config(&[]);
    let sources = discover_sources_with(
        &config,
        root.path(),
        TwoCores,
        Registers { readable: false },
        gpu,
    );
    let cycle = UpdateCycle::new(sources, &config.blacklist_set(), 10);

    assert!(!cycle.tree().contains_group("CPU VCCIN"));
    assert!(cycle.tree().contains_group("CPU Usage"));
}

#[test]
fn test_blacklisted_sources_are_not_probed() {
    let root = TempDir::new().unwrap();
    fake_hwmon(root.path());

    let gpu_queried = Cell::new(false);
    let config = config(&["msr", "nvidia-smi"]);
    let sources = discover_sources_with(
        &config,
        root.path(),
        TwoCores,
        Registers { readable: true },
        || {
            gpu_queried.set(true);
            gpu()
        },
    );
    let cycle = UpdateCycle::new(sources, &config.blacklist_set(), 10);

    assert!(!gpu_queried.get());
    assert!(!cycle.tree().contains_group("CPU VCCIN"));
    assert!(!cycle.tree().contains_group("GPU #0: NVIDIA GeForce RTX 3070"));
    assert_eq!(group_names(&cycle), vec!["k10temp-hwmon0", "CPU Usage", "CPU Frequency"]);
}

#[test]
fn test_missing_hwmon_root_keeps_other_sources() {
    let root = TempDir::new().unwrap();
    let config = config(&["nvidia-smi"]);

    let sources = discover_sources_with(
        &config,
        &root.path().join("absent"),
        TwoCores,
        Registers { readable: true },
        gpu,
    );

    let names: Vec<_> = sources.iter().map(|s| s.name().to_string()).collect();
    assert_eq!(names, vec!["cpu", "msr"]);
}
