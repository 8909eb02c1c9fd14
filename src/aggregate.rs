//! Grouping of raw measurements and per-group means.

use std::collections::BTreeMap;

use log::debug;

use crate::data::{GroupKey, RawMeasurement, Source};
use crate::stats::aggregate_measurements;

/// Mean elapsed time of one group of runs. Only ever constructed for groups
/// that received at least one sample; "no samples" is the absence of the
/// record, not a zeroed one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateRecord {
    pub sample_count: usize,
    pub mean_seconds: f64,
    pub stddev_seconds: f64,
}

/// All aggregation groups of one batch. Owned by a single invocation;
/// every call to [`aggregate`] builds fresh state.
#[derive(Debug, Default)]
pub struct AggregateTable {
    groups: BTreeMap<GroupKey, AggregateRecord>,
}

impl AggregateTable {
    pub fn get(&self, key: &GroupKey) -> Option<&AggregateRecord> {
        self.groups.get(key)
    }

    /// Mean for a key, or `None` when the group received no samples.
    pub fn mean_seconds(&self, key: &GroupKey) -> Option<f64> {
        self.groups.get(key).map(|r| r.mean_seconds)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &AggregateRecord)> {
        self.groups.iter()
    }

    /// All groups of one `(source, algorithm_label)` family, in key order.
    pub fn family<'a>(
        &'a self,
        source: Source,
        algorithm_label: &'a str,
    ) -> impl Iterator<Item = (&'a GroupKey, &'a AggregateRecord)> {
        self.groups
            .iter()
            .filter(move |(key, _)| key.source == source && key.algorithm_label == algorithm_label)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Fold raw measurements into per-group aggregates. Deterministic: the mean
/// for a key depends only on the multiset of elapsed times that contributed
/// to it, not on arrival order.
pub fn aggregate(records: impl IntoIterator<Item = RawMeasurement>) -> AggregateTable {
    let mut samples: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();
    for record in records {
        samples
            .entry(GroupKey::from(&record))
            .or_default()
            .push(record.elapsed_seconds);
    }

    let groups = samples
        .into_iter()
        .map(|(key, times)| {
            let stats = aggregate_measurements(times.into_iter());
            debug!(
                "{} {} {}: {stats}",
                key.source, key.algorithm_label, key.config
            );
            let record = AggregateRecord {
                sample_count: stats.len,
                mean_seconds: stats.mean,
                stddev_seconds: stats.stddev,
            };
            (key, record)
        })
        .collect();

    AggregateTable { groups }
}
