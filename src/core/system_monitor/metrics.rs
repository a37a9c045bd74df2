use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed classification of what a metric measures.
///
/// The kind decides how values are displayed (see [`super::format_field`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Voltage,
    Fan,
    Temperature,
    Power,
    Energy,
    Current,
    Humidity,
    Vid,
    Intrusion,
    BeepEnable,
    Usage,
    Frequency,
    #[default]
    Unknown,
}

impl MetricKind {
    /// Kinds displayed as rounded integers rather than with 3 decimals.
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            MetricKind::Fan | MetricKind::Frequency | MetricKind::Usage | MetricKind::Temperature
        )
    }

    /// Default display suffix for values of this kind.
    pub fn default_unit(self) -> &'static str {
        match self {
            MetricKind::Voltage | MetricKind::Vid => " V",
            MetricKind::Fan => " RPM",
            MetricKind::Temperature => " °C",
            MetricKind::Power => " W",
            MetricKind::Energy => " J",
            MetricKind::Current => " A",
            MetricKind::Humidity | MetricKind::Usage => " %",
            MetricKind::Frequency => " MHz",
            MetricKind::Intrusion | MetricKind::BeepEnable | MetricKind::Unknown => "",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Voltage => "voltage",
            MetricKind::Fan => "fan",
            MetricKind::Temperature => "temperature",
            MetricKind::Power => "power",
            MetricKind::Energy => "energy",
            MetricKind::Current => "current",
            MetricKind::Humidity => "humidity",
            MetricKind::Vid => "vid",
            MetricKind::Intrusion => "intrusion",
            MetricKind::BeepEnable => "beep_enable",
            MetricKind::Usage => "usage",
            MetricKind::Frequency => "frequency",
            MetricKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a metric, fixed when its series is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricInfo {
    pub unit: String,
    pub kind: MetricKind,
}

impl MetricInfo {
    pub fn new(unit: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            unit: unit.into(),
            kind,
        }
    }

    /// Info using the kind's default unit.
    pub fn of_kind(kind: MetricKind) -> Self {
        Self::new(kind.default_unit(), kind)
    }
}

/// A metric a source promises to report, declared once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDescriptor {
    pub group: String,
    pub label: String,
    pub info: MetricInfo,
}

impl MetricDescriptor {
    pub fn new(group: impl Into<String>, label: impl Into<String>, info: MetricInfo) -> Self {
        Self {
            group: group.into(),
            label: label.into(),
            info,
        }
    }
}

/// One value produced by a source during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub group: String,
    pub label: String,
    pub value: f64,
}

impl Reading {
    pub fn new(group: impl Into<String>, label: impl Into<String>, value: f64) -> Self {
        Self {
            group: group.into(),
            label: label.into(),
            value,
        }
    }
}

/// Label used for per-core metrics, shared by every CPU-derived group.
pub fn core_label(index: usize) -> String {
    format!("Core #{}", index)
}
