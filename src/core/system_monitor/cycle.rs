//! The periodic driver that feeds sources into the metric tree.

use chrono::Local;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

use super::snapshot::RenderSnapshot;
use super::source::SourceAdapter;
use super::tree::MetricTree;

/// Outcome of a single update cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    /// Readings that landed in a series.
    pub applied: usize,
    /// Readings with no matching series (blacklisted or undeclared).
    pub dropped: usize,
    /// Names of the sources that failed this cycle.
    pub failed_sources: Vec<String>,
}

struct SourceSlot {
    adapter: Box<dyn SourceAdapter>,
    failure_streak: u32,
}

/// Owns the metric tree and is its only writer.
///
/// Every [`tick`](UpdateCycle::tick) polls all sources, records their values
/// and publishes a fresh [`RenderSnapshot`] by replacement, so readers never
/// see a partially updated tree.
pub struct UpdateCycle {
    tree: MetricTree,
    sources: Vec<SourceSlot>,
    snapshot_tx: watch::Sender<Arc<RenderSnapshot>>,
    cycle: u64,
}

impl UpdateCycle {
    /// Build the tree from what `sources` declare and publish an initial
    /// snapshot with every series still empty.
    pub fn new(
        sources: Vec<Box<dyn SourceAdapter>>,
        blacklist: &HashSet<String>,
        capacity: usize,
    ) -> Self {
        let descriptors: Vec<_> = sources.iter().flat_map(|s| s.describe()).collect();
        let tree = MetricTree::build(&descriptors, blacklist, capacity);

        log::info!(
            "Metric tree built: {} groups, {} series from {} sources",
            tree.group_names().count(),
            tree.series_count(),
            sources.len()
        );

        let (snapshot_tx, _) = watch::channel(Arc::new(tree.snapshot(0, Local::now())));

        Self {
            tree,
            sources: sources
                .into_iter()
                .map(|adapter| SourceSlot {
                    adapter,
                    failure_streak: 0,
                })
                .collect(),
            snapshot_tx,
            cycle: 0,
        }
    }

    pub fn tree(&self) -> &MetricTree {
        &self.tree
    }

    /// A receiver that always holds the latest published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<RenderSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Run one cycle: poll, record, publish.
    pub fn tick(&mut self) -> CycleReport {
        self.cycle += 1;
        let mut report = CycleReport {
            cycle: self.cycle,
            ..Default::default()
        };

        for slot in &mut self.sources {
            let readings = match slot.adapter.poll() {
                Ok(readings) => {
                    if slot.failure_streak > 0 {
                        log::info!(
                            "Source {} recovered after {} failed cycles",
                            slot.adapter.name(),
                            slot.failure_streak
                        );
                        slot.failure_streak = 0;
                    }
                    readings
                }
                Err(e) => {
                    slot.failure_streak += 1;
                    if slot.failure_streak == 1 {
                        log::warn!("Source {} failed: {}", slot.adapter.name(), e);
                    } else {
                        log::debug!(
                            "Source {} failed (streak {}): {}",
                            slot.adapter.name(),
                            slot.failure_streak,
                            e
                        );
                    }
                    report.failed_sources.push(slot.adapter.name().to_string());
                    continue;
                }
            };

            for reading in readings {
                if self.tree.update(&reading.group, &reading.label, reading.value) {
                    report.applied += 1;
                } else {
                    report.dropped += 1;
                }
            }
        }

        let snapshot = self.tree.snapshot(self.cycle, Local::now());
        self.snapshot_tx.send_replace(Arc::new(snapshot));

        report
    }

    /// Tick until shutdown, sleeping `delay` after each cycle.
    ///
    /// The delay is measured from the end of a cycle, so a slow cycle pushes
    /// the next one back instead of being caught up.
    pub async fn run(mut self, delay: Duration, mut shutdown: broadcast::Receiver<()>) {
        log::info!("Update cycle started, delay {:?}", delay);

        loop {
            let report = self.tick();
            log::trace!(
                "Cycle {}: {} applied, {} dropped, {} sources failed",
                report.cycle,
                report.applied,
                report.dropped,
                report.failed_sources.len()
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.recv() => {
                    log::info!("Update cycle shutting down after {} cycles", self.cycle);
                    break;
                }
            }
        }
    }
}
