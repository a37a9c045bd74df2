use chrono::{DateTime, Local};
use std::collections::{HashMap, HashSet};

use super::history::MetricSeries;
use super::metrics::MetricDescriptor;
use super::snapshot::{GroupSnapshot, RenderSnapshot, RowSnapshot};

/// One group of series (a chip, a GPU, or a synthetic CPU group).
#[derive(Debug, Clone)]
struct MetricGroup {
    name: String,
    labels: Vec<String>,
    series: Vec<MetricSeries>,
    index: HashMap<String, usize>,
}

impl MetricGroup {
    fn new(name: String) -> Self {
        Self {
            name,
            labels: Vec::new(),
            series: Vec::new(),
            index: HashMap::new(),
        }
    }
}

/// Two-level registry of series: group name, then metric label.
///
/// Groups and labels are fixed once built and keep the order in which they
/// were declared, which is also their display order.
#[derive(Debug, Clone, Default)]
pub struct MetricTree {
    groups: Vec<MetricGroup>,
    index: HashMap<String, usize>,
}

impl MetricTree {
    /// Build the tree from the metrics every available source declared.
    ///
    /// Labels listed in `blacklist` are skipped, duplicates keep the first
    /// declaration, and groups left without labels are not created.
    pub fn build<'a, I>(descriptors: I, blacklist: &HashSet<String>, capacity: usize) -> Self
    where
        I: IntoIterator<Item = &'a MetricDescriptor>,
    {
        let mut tree = MetricTree::default();

        for descriptor in descriptors {
            if blacklist.contains(&descriptor.label) {
                log::debug!(
                    "Skipping blacklisted metric {} / {}",
                    descriptor.group,
                    descriptor.label
                );
                continue;
            }

            let group_idx = match tree.index.get(&descriptor.group) {
                Some(&idx) => idx,
                None => {
                    tree.groups.push(MetricGroup::new(descriptor.group.clone()));
                    let idx = tree.groups.len() - 1;
                    tree.index.insert(descriptor.group.clone(), idx);
                    idx
                }
            };

            let group = &mut tree.groups[group_idx];
            if group.index.contains_key(&descriptor.label) {
                log::debug!(
                    "Duplicate metric {} / {} ignored",
                    descriptor.group,
                    descriptor.label
                );
                continue;
            }

            group
                .index
                .insert(descriptor.label.clone(), group.series.len());
            group.labels.push(descriptor.label.clone());
            group
                .series
                .push(MetricSeries::new(descriptor.info.clone(), capacity));
        }

        tree
    }

    /// Record a value for `(group, label)`.
    ///
    /// Returns `false` when the tree has no such series; that is a normal
    /// state for disabled or absent optional sources, not an error.
    pub fn update(&mut self, group: &str, label: &str, value: f64) -> bool {
        match self.get_mut(group, label) {
            Some(series) => {
                series.record(value);
                true
            }
            None => {
                log::trace!("No series for {} / {}, dropping value", group, label);
                false
            }
        }
    }

    pub fn get(&self, group: &str, label: &str) -> Option<&MetricSeries> {
        let group = &self.groups[*self.index.get(group)?];
        group.index.get(label).map(|&idx| &group.series[idx])
    }

    fn get_mut(&mut self, group: &str, label: &str) -> Option<&mut MetricSeries> {
        let group = &mut self.groups[*self.index.get(group)?];
        let idx = *group.index.get(label)?;
        group.series.get_mut(idx)
    }

    pub fn contains_group(&self, group: &str) -> bool {
        self.index.contains_key(group)
    }

    /// Group names in display order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }

    /// Labels of a group in display order.
    pub fn labels(&self, group: &str) -> Option<&[String]> {
        self.index
            .get(group)
            .map(|&idx| self.groups[idx].labels.as_slice())
    }

    pub fn series_count(&self) -> usize {
        self.groups.iter().map(|g| g.series.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Project the tree into an immutable, display-ordered snapshot.
    pub fn snapshot(&self, cycle: u64, taken_at: DateTime<Local>) -> RenderSnapshot {
        let groups = self
            .groups
            .iter()
            .map(|group| GroupSnapshot {
                name: group.name.clone(),
                rows: group
                    .labels
                    .iter()
                    .zip(&group.series)
                    .map(|(label, series)| RowSnapshot::from_series(label, series))
                    .collect(),
            })
            .collect();

        RenderSnapshot {
            cycle,
            taken_at,
            groups,
        }
    }
}
