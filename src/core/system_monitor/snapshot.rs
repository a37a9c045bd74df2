use chrono::{DateTime, Local};
use serde::Serialize;

use super::format::{format_field, format_missing};
use super::history::MetricSeries;

/// Immutable, display-ordered view of the metric tree at a cycle boundary.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    /// Number of the update cycle that produced this snapshot (0 = none yet).
    pub cycle: u64,
    pub taken_at: DateTime<Local>,
    pub groups: Vec<GroupSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSnapshot {
    pub name: String,
    pub rows: Vec<RowSnapshot>,
}

/// One label with its formatted current/min/max/avg fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowSnapshot {
    pub label: String,
    pub current: String,
    pub min: String,
    pub max: String,
    pub avg: String,
}

impl RowSnapshot {
    pub(crate) fn from_series(label: &str, series: &MetricSeries) -> Self {
        let info = series.info();
        match series.stats() {
            Some(stats) => {
                let field = |v: f64| format_field(v, &info.unit, info.kind);
                Self {
                    label: label.to_string(),
                    current: field(stats.current),
                    min: field(stats.min),
                    max: field(stats.max),
                    avg: field(stats.avg),
                }
            }
            None => {
                let missing = format_missing(&info.unit);
                Self {
                    label: label.to_string(),
                    current: missing.clone(),
                    min: missing.clone(),
                    max: missing.clone(),
                    avg: missing,
                }
            }
        }
    }

    /// The four value fields in display order.
    pub fn fields(&self) -> [&str; 4] {
        [
            self.current.as_str(),
            self.min.as_str(),
            self.max.as_str(),
            self.avg.as_str(),
        ]
    }
}

impl RenderSnapshot {
    /// Snapshot published before the first cycle completes.
    pub fn empty() -> Self {
        Self {
            cycle: 0,
            taken_at: Local::now(),
            groups: Vec::new(),
        }
    }

    pub fn group(&self, name: &str) -> Option<&GroupSnapshot> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }
}

impl Default for RenderSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl GroupSnapshot {
    pub fn row(&self, label: &str) -> Option<&RowSnapshot> {
        self.rows.iter().find(|r| r.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::system_monitor::{MetricDescriptor, MetricInfo, MetricKind, MetricTree};
    use std::collections::HashSet;

    #[test]
    fn test_snapshot_formats_rows() {
        let descriptors = vec![
            MetricDescriptor::new("chip", "temp1", MetricInfo::of_kind(MetricKind::Temperature)),
            MetricDescriptor::new("chip", "P_in", MetricInfo::of_kind(MetricKind::Power)),
        ];
        let mut tree = MetricTree::build(&descriptors, &HashSet::new(), 3);
        tree.update("chip", "temp1", 36.7);
        tree.update("chip", "P_in", 36.7);

        let snapshot = tree.snapshot(1, Local::now());
        let group = snapshot.group("chip").unwrap();
        assert_eq!(group.row("temp1").unwrap().current, "     37 °C");
        assert_eq!(group.row("P_in").unwrap().current, " 36.700 W ");
        assert_eq!(snapshot.row_count(), 2);
    }

    #[test]
    fn test_snapshot_is_detached_from_tree() {
        let descriptors = vec![MetricDescriptor::new(
            "CPU Usage",
            "Core #0",
            MetricInfo::of_kind(MetricKind::Usage),
        )];
        let mut tree = MetricTree::build(&descriptors, &HashSet::new(), 3);
        tree.update("CPU Usage", "Core #0", 10.0);
        let before = tree.snapshot(1, Local::now());

        tree.update("CPU Usage", "Core #0", 90.0);
        let row = before.group("CPU Usage").unwrap().row("Core #0").unwrap();
        assert_eq!(row.current.trim(), "10 %");
        assert_eq!(row.max.trim(), "10 %");
    }

    #[test]
    fn test_series_without_samples_show_placeholder() {
        let descriptors = vec![MetricDescriptor::new(
            "chip",
            "fan1",
            MetricInfo::of_kind(MetricKind::Fan),
        )];
        let tree = MetricTree::build(&descriptors, &HashSet::new(), 3);
        let snapshot = tree.snapshot(0, Local::now());
        let row = snapshot.group("chip").unwrap().row("fan1").unwrap();

        assert!(row.fields().iter().all(|f| f.trim() == "- RPM"));
    }
}
