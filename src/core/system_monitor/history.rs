use serde::Serialize;
use std::collections::VecDeque;

use super::metrics::MetricInfo;

/// Derived statistics over the retained window of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub current: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Bounded history of one metric plus its rolling statistics.
///
/// The window is a ring buffer: once `capacity` samples are held, each new
/// sample evicts the oldest one. `min`, `max` and `avg` always describe the
/// samples currently retained, never samples that already left the window.
#[derive(Debug, Clone)]
pub struct MetricSeries {
    info: MetricInfo,
    capacity: usize,
    measurements: VecDeque<f64>,
    /// Running sum of `measurements`, corrected on every eviction.
    sum: f64,
    /// Evictions since `sum` was last rebuilt from the window.
    drift_evictions: usize,
    stats: Option<SeriesStats>,
}

impl MetricSeries {
    /// Create an empty series. A capacity of 0 behaves like 1.
    pub fn new(info: MetricInfo, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            info,
            capacity,
            measurements: VecDeque::with_capacity(capacity.min(4096)),
            sum: 0.0,
            drift_evictions: 0,
            stats: None,
        }
    }

    pub fn info(&self) -> &MetricInfo {
        &self.info
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Retained samples, oldest first.
    pub fn measurements(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.measurements.iter().copied()
    }

    /// Statistics of the retained window, `None` until the first sample.
    pub fn stats(&self) -> Option<SeriesStats> {
        self.stats
    }

    /// Append a sample and bring the statistics up to date.
    pub fn record(&mut self, value: f64) {
        let evicted = Self::push_value(&mut self.measurements, value, self.capacity);

        let stats = match (self.stats, evicted) {
            (None, _) => {
                self.sum = value;
                SeriesStats {
                    current: value,
                    min: value,
                    max: value,
                    avg: value,
                }
            }
            (Some(prev), None) => {
                self.sum += value;
                SeriesStats {
                    current: value,
                    min: prev.min.min(value),
                    max: prev.max.max(value),
                    avg: self.sum / self.measurements.len() as f64,
                }
            }
            (Some(prev), Some(old)) => {
                self.sum += value - old;
                self.drift_evictions += 1;
                if self.drift_evictions >= self.capacity || !self.sum.is_finite() {
                    self.sum = self.measurements.iter().sum();
                    self.drift_evictions = 0;
                }

                // The evicted sample may have been the extremum.
                let min = if prev.min.is_nan() || old <= prev.min {
                    self.scan(f64::min)
                } else {
                    prev.min.min(value)
                };
                let max = if prev.max.is_nan() || old >= prev.max {
                    self.scan(f64::max)
                } else {
                    prev.max.max(value)
                };

                SeriesStats {
                    current: value,
                    min,
                    max,
                    avg: self.sum / self.measurements.len() as f64,
                }
            }
        };

        self.stats = Some(stats);
    }

    fn scan(&self, pick: fn(f64, f64) -> f64) -> f64 {
        self.measurements.iter().copied().fold(f64::NAN, pick)
    }

    fn push_value<T>(queue: &mut VecDeque<T>, value: T, capacity: usize) -> Option<T> {
        let evicted = if queue.len() >= capacity {
            queue.pop_front()
        } else {
            None
        };
        queue.push_back(value);
        evicted
    }
}
