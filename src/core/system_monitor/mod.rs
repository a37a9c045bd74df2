//! Metrics history and aggregation engine.
//!
//! Sources are polled by the [`UpdateCycle`], their values land in the
//! [`MetricTree`] of rolling [`MetricSeries`], and each cycle publishes an
//! immutable [`RenderSnapshot`] for the presentation layer.

mod cycle;
mod format;
mod history;
mod metrics;
mod runtime;
mod snapshot;
mod source;
mod tree;

pub use cycle::{CycleReport, UpdateCycle};
pub use format::{format_field, format_missing, UNIT_WIDTH, VALUE_WIDTH};
pub use history::{MetricSeries, SeriesStats};
pub use metrics::{core_label, MetricDescriptor, MetricInfo, MetricKind, Reading};
pub use runtime::MetricsRuntime;
pub use snapshot::{GroupSnapshot, RenderSnapshot, RowSnapshot};
pub use source::SourceAdapter;
pub use tree::MetricTree;
