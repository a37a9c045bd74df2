//! Hardware sensor chips exposed through Linux `/sys/class/hwmon`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::system_monitor::{
    MetricDescriptor, MetricInfo, MetricKind, Reading, SourceAdapter,
};
use crate::error::{Result, SenseError};

/// A readable value on a chip.
#[derive(Debug, Clone)]
pub struct SensorFeature {
    pub label: String,
    pub info: MetricInfo,
    input: PathBuf,
    /// Raw sysfs values are divided by this (millivolts to volts, ...).
    divisor: f64,
}

impl SensorFeature {
    pub fn read(&self) -> Result<f64> {
        let raw = fs::read_to_string(&self.input).map_err(|e| {
            SenseError::sensor_read(format!("{}: {}", self.input.display(), e))
        })?;
        let value: f64 = raw.trim().parse().map_err(|_| {
            SenseError::sensor_read(format!(
                "{}: not a number: {:?}",
                self.input.display(),
                raw.trim()
            ))
        })?;
        Ok(value / self.divisor)
    }
}

/// One hwmon device and its features.
#[derive(Debug, Clone)]
pub struct SensorChip {
    /// `<driver name>-<hwmonN>`, stable for the lifetime of the device.
    pub name: String,
    pub features: Vec<SensorFeature>,
}

/// Feature families in display order.
const FAMILIES: &[(&str, &str, MetricKind, f64)] = &[
    ("in", "input", MetricKind::Voltage, 1000.0),
    ("fan", "input", MetricKind::Fan, 1.0),
    ("temp", "input", MetricKind::Temperature, 1000.0),
    ("power", "input", MetricKind::Power, 1_000_000.0),
    ("power", "average", MetricKind::Power, 1_000_000.0),
    ("energy", "input", MetricKind::Energy, 1_000_000.0),
    ("curr", "input", MetricKind::Current, 1000.0),
    ("humidity", "input", MetricKind::Humidity, 1000.0),
    ("cpu", "vid", MetricKind::Vid, 1000.0),
    ("intrusion", "alarm", MetricKind::Intrusion, 1.0),
];

const BEEP_ENABLE: &str = "beep_enable";

/// Sort key and description of one attribute file.
#[derive(Debug)]
struct Candidate {
    family: usize,
    index: u32,
    prefix: String,
    kind: MetricKind,
    divisor: f64,
    path: PathBuf,
    default_label: String,
}

/// Source over every hwmon chip found at startup.
#[derive(Debug, Clone, Default)]
pub struct HwmonSource {
    chips: Vec<SensorChip>,
}

impl HwmonSource {
    pub const SYSFS_ROOT: &'static str = "/sys/class/hwmon";

    pub fn discover() -> Result<Self> {
        Self::discover_at(Path::new(Self::SYSFS_ROOT))
    }

    /// Enumerate chips below `root` (a directory of `hwmonN` entries).
    pub fn discover_at(root: &Path) -> Result<Self> {
        let mut dirs: Vec<(u32, String, PathBuf)> = fs::read_dir(root)?
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                let number = name.strip_prefix("hwmon")?.parse().ok()?;
                Some((number, name, entry.path()))
            })
            .collect();
        dirs.sort_by_key(|(number, _, _)| *number);

        let mut chips = Vec::new();
        for (_, dir_name, path) in dirs {
            match Self::read_chip(&dir_name, &path) {
                Some(chip) if !chip.features.is_empty() => {
                    log::debug!("hwmon chip {} with {} features", chip.name, chip.features.len());
                    chips.push(chip);
                }
                Some(chip) => log::debug!("hwmon chip {} has no readable features", chip.name),
                None => log::debug!("Skipping {}: no name attribute", path.display()),
            }
        }

        Ok(Self { chips })
    }

    pub fn chips(&self) -> &[SensorChip] {
        &self.chips
    }

    fn read_chip(dir_name: &str, path: &Path) -> Option<SensorChip> {
        // Old drivers keep their attributes one level down.
        let attr_dir = [path.to_path_buf(), path.join("device")]
            .into_iter()
            .find(|dir| dir.join("name").is_file())?;

        let driver = fs::read_to_string(attr_dir.join("name")).ok()?;
        let name = format!("{}-{}", driver.trim(), dir_name);

        let entries = fs::read_dir(&attr_dir).ok()?;
        let mut candidates: Vec<Candidate> = entries
            .flatten()
            .filter_map(|entry| {
                let file_name = entry.file_name().to_string_lossy().to_string();
                Self::classify(&file_name, entry.path())
            })
            .collect();
        candidates.sort_by(|a, b| (a.family, a.index).cmp(&(b.family, b.index)));

        let mut seen_sensors = HashSet::new();
        let mut seen_labels = HashSet::new();
        let mut features = Vec::new();

        for candidate in candidates {
            // power1_input wins over power1_average
            if !seen_sensors.insert((candidate.prefix.clone(), candidate.index)) {
                continue;
            }

            let label = fs::read_to_string(attr_dir.join(format!(
                "{}{}_label",
                candidate.prefix, candidate.index
            )))
            .ok()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or(candidate.default_label);

            if !seen_labels.insert(label.clone()) {
                log::debug!("{}: duplicate label {:?} skipped", name, label);
                continue;
            }

            features.push(SensorFeature {
                label,
                info: MetricInfo::of_kind(candidate.kind),
                input: candidate.path,
                divisor: candidate.divisor,
            });
        }

        Some(SensorChip { name, features })
    }

    fn classify(file_name: &str, path: PathBuf) -> Option<Candidate> {
        if file_name == BEEP_ENABLE {
            return Some(Candidate {
                family: FAMILIES.len(),
                index: 0,
                prefix: BEEP_ENABLE.to_string(),
                kind: MetricKind::BeepEnable,
                divisor: 1.0,
                path,
                default_label: BEEP_ENABLE.to_string(),
            });
        }

        let (stem, suffix) = file_name.split_once('_')?;
        let digits_at = stem.find(|c: char| c.is_ascii_digit())?;
        let (prefix, index) = stem.split_at(digits_at);
        let index: u32 = index.parse().ok()?;
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let default_label = if prefix == "cpu" {
            format!("{}_{}", stem, suffix)
        } else {
            stem.to_string()
        };

        if let Some(family) = FAMILIES
            .iter()
            .position(|(p, s, _, _)| *p == prefix && *s == suffix)
        {
            let (_, _, kind, divisor) = FAMILIES[family];
            return Some(Candidate {
                family,
                index,
                prefix: prefix.to_string(),
                kind,
                divisor,
                path,
                default_label,
            });
        }

        // Unfamiliar sensor types still expose an _input attribute.
        let known = FAMILIES.iter().any(|(p, _, _, _)| *p == prefix);
        if suffix == "input" && !known {
            return Some(Candidate {
                family: FAMILIES.len() + 1,
                index,
                prefix: prefix.to_string(),
                kind: MetricKind::Unknown,
                divisor: 1.0,
                path,
                default_label,
            });
        }

        None
    }
}

impl SourceAdapter for HwmonSource {
    fn name(&self) -> &str {
        "hwmon"
    }

    fn describe(&self) -> Vec<MetricDescriptor> {
        self.chips
            .iter()
            .flat_map(|chip| {
                chip.features.iter().map(move |feature| {
                    MetricDescriptor::new(&chip.name, &feature.label, feature.info.clone())
                })
            })
            .collect()
    }

    fn poll(&mut self) -> Result<Vec<Reading>> {
        let mut readings = Vec::new();
        let mut failures = 0usize;
        let mut total = 0usize;

        for chip in &self.chips {
            for feature in &chip.features {
                total += 1;
                match feature.read() {
                    Ok(value) => readings.push(Reading::new(&chip.name, &feature.label, value)),
                    Err(e) => {
                        failures += 1;
                        log::debug!("{} / {}: {}", chip.name, feature.label, e);
                    }
                }
            }
        }

        if total > 0 && failures == total {
            return Err(SenseError::sensor_read(format!(
                "all {} hwmon reads failed",
                total
            )));
        }

        Ok(readings)
    }
}
