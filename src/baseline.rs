//! Baseline selection and speedup/efficiency derivation.
//!
//! Each comparison family has its own baseline policy: thread and
//! MPI-strong speedups share the best sequential mean, MPI-weak scaling
//! compares against its smallest-node-count entry, and the compressor
//! benchmark carries one single-thread baseline per dataset and operation.

use std::collections::BTreeMap;

use log::{debug, warn};
use thiserror::Error;

use crate::aggregate::AggregateTable;
use crate::data::{ConfigKey, DerivedMetric, GroupKey, Source};
use crate::parsers::section_log::{MPI_LABEL, SEQ_BINARY, SEQ_KWAY};
use crate::parsers::tool_log::SEQUENTIAL_TOOL;

/// Why a baseline or derived metric is unavailable. All recoverable: the
/// affected metrics report "no data", the batch completes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BaselineError {
    #[error("no sequential measurements to derive a baseline from")]
    EmptyBaseline,
    #[error("config {0} has no worker-count dimension")]
    MissingDimension(ConfigKey),
}

/// The best sequential time: the smaller of the binary-merge and
/// k-way-merge sequential means. Shared by all thread families and by
/// MPI-strong scaling in the same comparison set.
pub fn best_sequential(table: &AggregateTable) -> Result<f64, BaselineError> {
    let binary = table.mean_seconds(&GroupKey::new(
        Source::Sequential,
        SEQ_BINARY,
        ConfigKey::empty(),
    ));
    let kway = table.mean_seconds(&GroupKey::new(
        Source::Sequential,
        SEQ_KWAY,
        ConfigKey::empty(),
    ));

    binary
        .into_iter()
        .chain(kway)
        .fold(None, |best: Option<f64>, t| {
            Some(best.map_or(t, |b| b.min(t)))
        })
        .ok_or(BaselineError::EmptyBaseline)
}

/// speedup = baseline / observed, efficiency = speedup / workers.
///
/// `None` when the observed mean is zero or negative; a NaN or infinity is
/// never smuggled through as a real number. A missing worker count leaves
/// the efficiency unset.
pub fn derive_one(
    baseline_seconds: f64,
    mean_seconds: f64,
    workers: Option<u32>,
) -> Option<DerivedMetric> {
    if !(mean_seconds > 0.0) {
        return None;
    }
    let speedup = baseline_seconds / mean_seconds;
    Some(DerivedMetric {
        baseline_seconds,
        speedup,
        efficiency: workers.map(|w| speedup / f64::from(w)),
    })
}

/// Speedup and efficiency for every worker count of one family, against a
/// shared baseline. With no baseline the family reports no data at all.
pub fn derive_by_worker(
    table: &AggregateTable,
    source: Source,
    algorithm_label: &str,
    baseline_seconds: Option<f64>,
) -> BTreeMap<u32, DerivedMetric> {
    let Some(baseline) = baseline_seconds else {
        return BTreeMap::new();
    };

    let mut out = BTreeMap::new();
    for (key, record) in table.family(source, algorithm_label) {
        let Some(workers) = key.config.worker_count() else {
            warn!(
                "skipping group {algorithm_label} {}: {}",
                key.config,
                BaselineError::MissingDimension(key.config.clone())
            );
            continue;
        };
        if let Some(metric) = derive_one(baseline, record.mean_seconds, Some(workers)) {
            out.insert(workers, metric);
        }
    }
    out
}

/// One weak-scaling entry after aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct WeakEntry {
    pub nodes: u32,
    pub filesize: u64,
    pub mean_seconds: f64,
    /// Baseline time scaled linearly by the problem-size ratio against the
    /// baseline entry. Computed for every entry but not used by the
    /// reported speedup, which divides the unscaled baseline time by the
    /// observed time.
    pub ideal_seconds: f64,
}

/// Weak-scaling derivation. The baseline is the entry with the smallest
/// node count; speedup at each node count is the baseline time over the
/// observed time.
pub fn derive_weak(table: &AggregateTable) -> (Vec<WeakEntry>, BTreeMap<u32, DerivedMetric>) {
    let mut entries: Vec<(u32, u64, f64)> = table
        .family(Source::ParallelMpiWeak, MPI_LABEL)
        .filter_map(|(key, record)| match (key.config.nodes, key.config.filesize) {
            (Some(nodes), Some(filesize)) => Some((nodes, filesize, record.mean_seconds)),
            _ => {
                warn!(
                    "weak-scaling group {} lacks a joint nodes/filesize key",
                    key.config
                );
                None
            }
        })
        .collect();
    entries.sort_by_key(|&(nodes, _, _)| nodes);

    let mut weak = Vec::with_capacity(entries.len());
    let mut metrics = BTreeMap::new();

    if let Some(&(_, base_filesize, base_time)) = entries.first() {
        for (nodes, filesize, mean_seconds) in entries {
            let ideal_seconds = base_time * (filesize as f64 / base_filesize as f64);
            debug!(
                "weak scaling nodes={nodes}: ideal time {ideal_seconds:.6}s \
                 (reported speedup uses the unscaled baseline)"
            );
            weak.push(WeakEntry {
                nodes,
                filesize,
                mean_seconds,
                ideal_seconds,
            });
            if let Some(metric) = derive_one(base_time, mean_seconds, Some(nodes)) {
                metrics.insert(nodes, metric);
            }
        }
    }

    (weak, metrics)
}

/// Per-dataset compressor speedups for one operation (compress or
/// decompress). The baseline is the single-thread sequential tool's mean
/// for the same dataset and operation; there is one baseline per dataset,
/// none shared globally. Datasets without a sequential run report no data.
pub fn derive_compressor(
    table: &AggregateTable,
    algorithm_label: &str,
) -> BTreeMap<(String, u32), DerivedMetric> {
    let mut out = BTreeMap::new();

    for (key, record) in table.family(Source::Compressor, algorithm_label) {
        if key.config.tool.as_deref() == Some(SEQUENTIAL_TOOL) {
            continue;
        }
        let Some(dataset) = key.config.dataset.clone() else {
            continue;
        };
        let Some(threads) = key.config.threads else {
            warn!(
                "skipping compressor group {}: {}",
                key.config,
                BaselineError::MissingDimension(key.config.clone())
            );
            continue;
        };

        let baseline_key = GroupKey::new(
            Source::Compressor,
            algorithm_label,
            ConfigKey {
                dataset: Some(dataset.clone()),
                tool: Some(SEQUENTIAL_TOOL.to_string()),
                threads: Some(1),
                ..Default::default()
            },
        );
        let Some(baseline) = table.mean_seconds(&baseline_key) else {
            debug!("no single-thread {algorithm_label} baseline for dataset {dataset}");
            continue;
        };

        if let Some(metric) = derive_one(baseline, record.mean_seconds, Some(threads)) {
            out.insert((dataset, threads), metric);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::data::RawMeasurement;
    use crate::parsers::section_log::OMP_LABEL;
    use crate::parsers::tool_log::COMPRESS;

    fn sequential(label: &str, elapsed: f64) -> RawMeasurement {
        RawMeasurement {
            source: Source::Sequential,
            algorithm_label: label.to_string(),
            config: ConfigKey::empty(),
            elapsed_seconds: elapsed,
        }
    }

    fn omp(threads: u32, elapsed: f64) -> RawMeasurement {
        RawMeasurement {
            source: Source::ParallelThread,
            algorithm_label: OMP_LABEL.to_string(),
            config: ConfigKey::threads(threads),
            elapsed_seconds: elapsed,
        }
    }

    fn weak(nodes: u32, filesize: u64, elapsed: f64) -> RawMeasurement {
        RawMeasurement {
            source: Source::ParallelMpiWeak,
            algorithm_label: MPI_LABEL.to_string(),
            config: ConfigKey::weak(nodes, filesize),
            elapsed_seconds: elapsed,
        }
    }

    fn compressor(tool: &str, dataset: &str, threads: u32, elapsed: f64) -> RawMeasurement {
        RawMeasurement {
            source: Source::Compressor,
            algorithm_label: COMPRESS.to_string(),
            config: ConfigKey {
                dataset: Some(dataset.to_string()),
                tool: Some(tool.to_string()),
                threads: Some(threads),
                ..Default::default()
            },
            elapsed_seconds: elapsed,
        }
    }

    #[test]
    fn best_sequential_takes_minimum_of_means() {
        let table = aggregate(vec![
            sequential(SEQ_BINARY, 10.0),
            sequential(SEQ_BINARY, 14.0),
            sequential(SEQ_KWAY, 11.0),
        ]);
        // binary mean 12.0, kway mean 11.0
        assert_eq!(best_sequential(&table), Ok(11.0));
    }

    #[test]
    fn best_sequential_works_with_single_family() {
        let table = aggregate(vec![sequential(SEQ_BINARY, 10.0)]);
        assert_eq!(best_sequential(&table), Ok(10.0));
    }

    #[test]
    fn best_sequential_empty_is_error() {
        let table = aggregate(vec![]);
        assert_eq!(best_sequential(&table), Err(BaselineError::EmptyBaseline));
    }

    #[test]
    fn self_baseline_speedup_is_one() {
        let table = aggregate(vec![
            sequential(SEQ_BINARY, 10.0),
            sequential(SEQ_KWAY, 10.0),
            omp(1, 10.0),
        ]);
        let baseline = best_sequential(&table).ok();
        let metrics = derive_by_worker(&table, Source::ParallelThread, OMP_LABEL, baseline);
        let metric = metrics[&1];
        assert_eq!(metric.speedup, 1.0);
        // At one worker, efficiency equals speedup.
        assert_eq!(metric.efficiency, Some(1.0));
    }

    #[test]
    fn speedup_and_efficiency() {
        let table = aggregate(vec![sequential(SEQ_BINARY, 8.0), omp(4, 2.0)]);
        let metrics =
            derive_by_worker(&table, Source::ParallelThread, OMP_LABEL, Some(8.0));
        let metric = metrics[&4];
        assert_eq!(metric.speedup, 4.0);
        assert_eq!(metric.efficiency, Some(1.0));
    }

    #[test]
    fn missing_baseline_yields_no_metrics() {
        let table = aggregate(vec![omp(4, 2.0)]);
        let metrics = derive_by_worker(&table, Source::ParallelThread, OMP_LABEL, None);
        assert!(metrics.is_empty());
    }

    #[test]
    fn zero_mean_yields_no_data_not_infinity() {
        assert_eq!(derive_one(10.0, 0.0, Some(4)), None);
    }

    #[test]
    fn missing_worker_count_leaves_efficiency_unset() {
        let metric = derive_one(10.0, 5.0, None).unwrap();
        assert_eq!(metric.speedup, 2.0);
        assert_eq!(metric.efficiency, None);
    }

    #[test]
    fn weak_baseline_is_smallest_node_count() {
        let table = aggregate(vec![
            weak(8, 4096, 5.0),
            weak(2, 1024, 4.0),
            weak(4, 2048, 4.5),
        ]);
        let (entries, metrics) = derive_weak(&table);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].nodes, 2);
        // Ideal times scale with the filesize ratio against the baseline.
        assert_eq!(entries[0].ideal_seconds, 4.0);
        assert_eq!(entries[1].ideal_seconds, 8.0);
        assert_eq!(entries[2].ideal_seconds, 16.0);

        // Reported speedups use the flat baseline time, not the ideal.
        assert_eq!(metrics[&2].speedup, 1.0);
        assert_eq!(metrics[&4].speedup, 4.0 / 4.5);
        assert_eq!(metrics[&8].speedup, 4.0 / 5.0);
        assert_eq!(metrics[&8].efficiency, Some(4.0 / 5.0 / 8.0));
    }

    #[test]
    fn weak_with_no_entries_is_empty() {
        let (entries, metrics) = derive_weak(&aggregate(vec![]));
        assert!(entries.is_empty());
        assert!(metrics.is_empty());
    }

    #[test]
    fn compressor_baseline_is_per_dataset() {
        let table = aggregate(vec![
            compressor(SEQUENTIAL_TOOL, "mixed_files", 1, 1.0),
            compressor(SEQUENTIAL_TOOL, "corpus_a", 1, 4.0),
            compressor("zstdpar", "mixed_files", 4, 0.5),
            compressor("zstdpar", "corpus_a", 4, 1.0),
        ]);
        let metrics = derive_compressor(&table, COMPRESS);

        assert_eq!(metrics[&("mixed_files".to_string(), 4)].speedup, 2.0);
        assert_eq!(
            metrics[&("mixed_files".to_string(), 4)].efficiency,
            Some(0.5)
        );
        assert_eq!(metrics[&("corpus_a".to_string(), 4)].speedup, 4.0);
    }

    #[test]
    fn compressor_without_sequential_run_reports_no_data() {
        let table = aggregate(vec![compressor("zstdpar", "corpus_b", 4, 0.5)]);
        let metrics = derive_compressor(&table, COMPRESS);
        assert!(metrics.is_empty());
    }
}
