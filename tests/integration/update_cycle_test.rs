use sense::core::system_monitor::{
    MetricDescriptor, MetricInfo, MetricKind, Reading, SourceAdapter, UpdateCycle,
};
use sense::platform::msr::{DevCpuMsr, VccinAdapter, IA32_PERF_STATUS};
use sense::platform::HwmonSource;
use sense::Result;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, file: &str, content: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(file), content).unwrap();
}

fn fake_hwmon(root: &Path) {
    let chip = root.join("hwmon0");
    write(&chip, "name", "nct6775\n");
    write(&chip, "temp1_input", "40000\n");
    write(&chip, "temp1_label", "SYSTIN\n");
    write(&chip, "fan1_input", "1000\n");
    write(&chip, "beep_enable", "0\n");
}

/// Usage values handed out one per cycle.
struct Usage(Vec<f64>);

impl SourceAdapter for Usage {
    fn name(&self) -> &str {
        "usage"
    }

    fn describe(&self) -> Vec<MetricDescriptor> {
        vec![MetricDescriptor::new(
            "CPU Usage",
            "Core #0",
            MetricInfo::of_kind(MetricKind::Usage),
        )]
    }

    fn poll(&mut self) -> Result<Vec<Reading>> {
        if self.0.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Reading::new("CPU Usage", "Core #0", self.0.remove(0))])
    }
}

#[test]
fn test_hwmon_feeds_rolling_history() {
    let root = TempDir::new().unwrap();
    fake_hwmon(root.path());

    let hwmon = HwmonSource::discover_at(root.path()).unwrap();
    let blacklist: HashSet<String> = ["beep_enable".to_string()].into_iter().collect();
    let mut cycle = UpdateCycle::new(vec![Box::new(hwmon)], &blacklist, 3);

    let temp = root.path().join("hwmon0").join("temp1_input");
    for millidegrees in ["40000", "46000", "43000", "41000"] {
        fs::write(&temp, millidegrees).unwrap();
        cycle.tick();
    }

    let series = cycle.tree().get("nct6775-hwmon0", "SYSTIN").unwrap();
    let stats = series.stats().unwrap();
    assert_eq!(series.len(), 3);
    assert_eq!(stats.current, 41.0);
    assert_eq!(stats.min, 41.0);
    assert_eq!(stats.max, 46.0);
    assert!((stats.avg - 130.0 / 3.0).abs() < 1e-9);

    assert!(cycle.tree().get("nct6775-hwmon0", "beep_enable").is_none());
}

#[test]
fn test_snapshot_follows_source_order() {
    let root = TempDir::new().unwrap();
    fake_hwmon(root.path());

    let hwmon = HwmonSource::discover_at(root.path()).unwrap();
    let sources: Vec<Box<dyn SourceAdapter>> =
        vec![Box::new(hwmon), Box::new(Usage(vec![10.0, 30.0]))];
    let mut cycle = UpdateCycle::new(sources, &HashSet::new(), 10);
    let rx = cycle.subscribe();

    cycle.tick();
    cycle.tick();

    let snapshot = rx.borrow().clone();
    let groups: Vec<_> = snapshot.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(groups, vec!["nct6775-hwmon0", "CPU Usage"]);

    let usage = snapshot.group("CPU Usage").unwrap().row("Core #0").unwrap();
    assert_eq!(usage.current.trim(), "30 %");
    assert_eq!(usage.min.trim(), "10 %");
    assert_eq!(usage.avg.trim(), "20 %");
}

#[test]
fn test_vanished_chip_keeps_history() {
    let root = TempDir::new().unwrap();
    fake_hwmon(root.path());

    let hwmon = HwmonSource::discover_at(root.path()).unwrap();
    let mut cycle = UpdateCycle::new(vec![Box::new(hwmon)], &HashSet::new(), 5);
    cycle.tick();

    fs::remove_dir_all(root.path().join("hwmon0")).unwrap();
    let report = cycle.tick();

    assert_eq!(report.failed_sources, vec!["hwmon".to_string()]);
    let series = cycle.tree().get("nct6775-hwmon0", "fan1").unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series.stats().unwrap().current, 1000.0);
}

#[test]
fn test_vccin_group_only_when_probe_succeeds() {
    let missing = TempDir::new().unwrap();
    assert!(VccinAdapter::probe(DevCpuMsr::with_root(missing.path()), 2).is_err());

    let root = TempDir::new().unwrap();
    for core in 0..2 {
        let mut bytes = vec![0u8; IA32_PERF_STATUS as usize];
        bytes.extend_from_slice(&(12288u64 << 32).to_le_bytes());
        let dir = root.path().join(core.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("msr"), bytes).unwrap();
    }

    let vccin = VccinAdapter::probe(DevCpuMsr::with_root(root.path()), 2).unwrap();
    let mut cycle = UpdateCycle::new(vec![Box::new(vccin)], &HashSet::new(), 5);
    cycle.tick();

    let stats = cycle.tree().get("CPU VCCIN", "Core #1").unwrap().stats().unwrap();
    assert_eq!(stats.current, 1.5);
}
