//! Tabular emission of aggregated and derived records, and the two batch
//! pipelines behind the CLI subcommands.
//!
//! Formatting contract: a present raw time renders with six decimals, a
//! present speedup or efficiency with two; a missing value renders as an
//! empty field, never as `0` or `NaN` text.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::{self, File},
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use itertools::Itertools;
use log::warn;

use crate::aggregate::{aggregate, AggregateTable};
use crate::baseline::{
    best_sequential, derive_by_worker, derive_compressor, derive_weak,
};
use crate::data::{DerivedMetric, Source};
use crate::parsers::section_log::{
    SectionFamily, SectionLogParser, FF_LABEL, FF_NO_MAPPING_LABEL, MPI_LABEL, OMP_LABEL,
};
use crate::parsers::tool_log::{ToolLogParser, COMPRESS, DECOMPRESS, SEQUENTIAL_TOOL};
use crate::parsers::LogParser;

pub fn format_seconds(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.6}"),
        None => String::new(),
    }
}

pub fn format_ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => String::new(),
    }
}

/// Wide `Dataset,<threads...>` table. Rows are datasets in name order,
/// columns the union of observed thread counts; missing cells stay empty.
#[derive(Debug, Default)]
pub struct WideTable {
    columns: BTreeSet<u32>,
    datasets: BTreeSet<String>,
    cells: BTreeMap<(String, u32), f64>,
}

impl WideTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset: &str, threads: u32, value: f64) {
        self.columns.insert(threads);
        self.datasets.insert(dataset.to_string());
        if let Some(previous) = self
            .cells
            .insert((dataset.to_string(), threads), value)
        {
            warn!("duplicate cell for dataset {dataset} at {threads} threads, replacing {previous}");
        }
    }

    /// Force a column to appear even when no dataset has a value for it.
    pub fn add_column(&mut self, threads: u32) {
        self.columns.insert(threads);
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn to_csv(&self, format: fn(Option<f64>) -> String) -> String {
        let mut lines = Vec::with_capacity(self.datasets.len() + 1);
        lines.push(format!(
            "Dataset,{}",
            self.columns.iter().map(u32::to_string).join(",")
        ));
        for dataset in &self.datasets {
            let cells = self
                .columns
                .iter()
                .map(|threads| format(self.cells.get(&(dataset.clone(), *threads)).copied()))
                .join(",");
            lines.push(format!("{dataset},{cells}"));
        }
        lines.join("\n") + "\n"
    }
}

/// One row of the sorting-benchmark scaling report.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingRow {
    pub family: &'static str,
    pub workers: u32,
    pub mean_seconds: Option<f64>,
    pub speedup: Option<f64>,
    pub efficiency: Option<f64>,
}

pub fn scaling_csv(rows: &[ScalingRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push("family,workers,mean_seconds,speedup,efficiency".to_string());
    for row in rows {
        lines.push(format!(
            "{},{},{},{},{}",
            row.family,
            row.workers,
            format_seconds(row.mean_seconds),
            format_ratio(row.speedup),
            format_ratio(row.efficiency),
        ));
    }
    lines.join("\n") + "\n"
}

pub fn scaling_markdown(rows: &[ScalingRow]) -> String {
    let mut lines = vec![
        "| family | workers | mean (s) | speedup | efficiency |".to_string(),
        "|--------|---------|----------|---------|------------|".to_string(),
    ];
    for row in rows {
        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            row.family,
            row.workers,
            format_seconds(row.mean_seconds),
            format_ratio(row.speedup),
            format_ratio(row.efficiency),
        ));
    }
    lines.join("\n") + "\n"
}

enum OutputFormat {
    Csv,
    Markdown,
}

/// '-' means CSV to stdout; otherwise the extension decides.
fn output_format(path: &Path) -> Option<OutputFormat> {
    if path == Path::new("-") {
        return Some(OutputFormat::Csv);
    }
    match path
        .extension()?
        .to_ascii_lowercase()
        .into_string()
        .ok()?
        .as_str()
    {
        "csv" => Some(OutputFormat::Csv),
        "md" => Some(OutputFormat::Markdown),
        _ => None,
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if path == Path::new("-") {
        match io::stdout().write_all(bytes) {
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
            res => res,
        }?;
    } else {
        File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?
            .write_all(bytes)?;
    }
    Ok(())
}

/// Read a log that may legitimately be missing; an absent file contributes
/// nothing to the batch.
fn read_log(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("could not open {}: {e}", path.display());
            String::new()
        }
    }
}

fn family_rows(
    table: &AggregateTable,
    family: &'static str,
    source: Source,
    algorithm_label: &str,
    metrics: &BTreeMap<u32, DerivedMetric>,
) -> Vec<ScalingRow> {
    table
        .family(source, algorithm_label)
        .filter_map(|(key, record)| {
            let workers = key.config.worker_count()?;
            let metric = metrics.get(&workers);
            Some(ScalingRow {
                family,
                workers,
                mean_seconds: Some(record.mean_seconds),
                speedup: metric.map(|m| m.speedup),
                efficiency: metric.and_then(|m| m.efficiency),
            })
        })
        .collect()
}

/// The `report` pipeline: parse the three sorting logs next to `base`,
/// aggregate, derive speedup/efficiency per family, emit one scaling table.
pub fn run_report(base: &Path, output: &Path) -> Result<()> {
    let format = output_format(output).ok_or(anyhow!("Could not infer output format"))?;

    let seq_path = PathBuf::from(format!("{}.log", base.display()));
    let strong_path = PathBuf::from(format!("{}_mpi_strong.log", base.display()));
    let weak_path = PathBuf::from(format!("{}_mpi_weak.log", base.display()));

    let mut records = SectionLogParser::new(SectionFamily::Combined)
        .parse(&read_log(&seq_path))
        .log_issues(&seq_path.display().to_string());
    records.extend(
        SectionLogParser::new(SectionFamily::MpiStrong)
            .parse(&read_log(&strong_path))
            .log_issues(&strong_path.display().to_string()),
    );
    records.extend(
        SectionLogParser::new(SectionFamily::MpiWeak)
            .parse(&read_log(&weak_path))
            .log_issues(&weak_path.display().to_string()),
    );

    let table = aggregate(records);

    let baseline = match best_sequential(&table) {
        Ok(b) => Some(b),
        Err(e) => {
            warn!("{e}; speedups will be empty");
            None
        }
    };

    let mut rows = Vec::new();
    for (family, label) in [
        ("omp", OMP_LABEL),
        ("ff", FF_LABEL),
        ("ff_no_mapping", FF_NO_MAPPING_LABEL),
    ] {
        let metrics = derive_by_worker(&table, Source::ParallelThread, label, baseline);
        rows.extend(family_rows(
            &table,
            family,
            Source::ParallelThread,
            label,
            &metrics,
        ));
    }
    let strong_metrics = derive_by_worker(&table, Source::ParallelMpiStrong, MPI_LABEL, baseline);
    rows.extend(family_rows(
        &table,
        "mpi_strong",
        Source::ParallelMpiStrong,
        MPI_LABEL,
        &strong_metrics,
    ));
    let (_, weak_metrics) = derive_weak(&table);
    rows.extend(family_rows(
        &table,
        "mpi_weak",
        Source::ParallelMpiWeak,
        MPI_LABEL,
        &weak_metrics,
    ));

    let rendered = match format {
        OutputFormat::Csv => scaling_csv(&rows),
        OutputFormat::Markdown => scaling_markdown(&rows),
    };
    write_output(output, rendered.as_bytes())
}

fn compressor_mean_table(
    table: &AggregateTable,
    algorithm_label: &str,
    sequential: bool,
) -> WideTable {
    let mut wide = WideTable::new();
    if sequential {
        wide.add_column(1);
    }
    for (key, record) in table.family(Source::Compressor, algorithm_label) {
        let is_sequential = key.config.tool.as_deref() == Some(SEQUENTIAL_TOOL);
        if is_sequential != sequential {
            continue;
        }
        let (Some(dataset), Some(threads)) = (&key.config.dataset, key.config.threads) else {
            continue;
        };
        wide.insert(dataset, threads, record.mean_seconds);
    }
    wide
}

fn compressor_speedup_table(metrics: &BTreeMap<(String, u32), DerivedMetric>) -> WideTable {
    let mut wide = WideTable::new();
    for ((dataset, threads), metric) in metrics {
        wide.insert(dataset, *threads, metric.speedup);
    }
    wide
}

/// The `average` pipeline: parse a compressor tool log, aggregate, and
/// write the per-dataset mean and speedup tables into `output_dir`.
pub fn run_average(input: &Path, output_dir: &Path) -> Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read file: {}", input.display()))?;
    let records = ToolLogParser
        .parse(&text)
        .log_issues(&input.display().to_string());
    let table = aggregate(records);

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let mean_tables = [
        ("sequential_compression.csv", COMPRESS, true),
        ("sequential_decompression.csv", DECOMPRESS, true),
        ("parallel_compression.csv", COMPRESS, false),
        ("parallel_decompression.csv", DECOMPRESS, false),
    ];
    for (file_name, label, sequential) in mean_tables {
        let wide = compressor_mean_table(&table, label, sequential);
        write_output(
            &output_dir.join(file_name),
            wide.to_csv(format_seconds).as_bytes(),
        )?;
    }

    for (file_name, label) in [
        ("compression_speedup.csv", COMPRESS),
        ("decompression_speedup.csv", DECOMPRESS),
    ] {
        let metrics = derive_compressor(&table, label);
        let wide = compressor_speedup_table(&metrics);
        write_output(
            &output_dir.join(file_name),
            wide.to_csv(format_ratio).as_bytes(),
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_seconds_six_decimals() {
        assert_eq!(format_seconds(Some(1.0)), "1.000000");
        assert_eq!(format_seconds(Some(0.5004321)), "0.500432");
    }

    #[test]
    fn format_ratio_two_decimals() {
        assert_eq!(format_ratio(Some(2.0)), "2.00");
        assert_eq!(format_ratio(Some(0.666)), "0.67");
    }

    #[test]
    fn missing_values_render_empty_never_zero() {
        assert_eq!(format_seconds(None), "");
        assert_eq!(format_ratio(None), "");
    }

    #[test]
    fn wide_table_fills_missing_cells_with_empty_fields() {
        let mut wide = WideTable::new();
        wide.insert("corpus_a", 1, 1.0);
        wide.insert("corpus_a", 4, 0.25);
        wide.insert("mixed_files", 4, 0.9);
        let csv = wide.to_csv(format_seconds);
        assert_eq!(
            csv,
            "Dataset,1,4\ncorpus_a,1.000000,0.250000\nmixed_files,,0.900000\n"
        );
    }

    #[test]
    fn wide_table_empty_has_forced_columns_only() {
        let mut wide = WideTable::new();
        wide.add_column(1);
        assert!(wide.is_empty());
        assert_eq!(wide.to_csv(format_seconds), "Dataset,1\n");
    }

    #[test]
    fn scaling_csv_renders_missing_metrics_as_empty() {
        let rows = vec![ScalingRow {
            family: "omp",
            workers: 4,
            mean_seconds: Some(2.5),
            speedup: None,
            efficiency: None,
        }];
        assert_eq!(
            scaling_csv(&rows),
            "family,workers,mean_seconds,speedup,efficiency\nomp,4,2.500000,,\n"
        );
    }

    #[test]
    fn scaling_markdown_layout() {
        let rows = vec![ScalingRow {
            family: "mpi_strong",
            workers: 8,
            mean_seconds: Some(1.25),
            speedup: Some(4.0),
            efficiency: Some(0.5),
        }];
        let md = scaling_markdown(&rows);
        assert!(md.starts_with("| family |"));
        assert!(md.contains("| mpi_strong | 8 | 1.250000 | 4.00 | 0.50 |"));
    }

    #[test]
    fn output_format_from_extension() {
        assert!(matches!(
            output_format(Path::new("out.csv")),
            Some(OutputFormat::Csv)
        ));
        assert!(matches!(
            output_format(Path::new("out.MD")),
            Some(OutputFormat::Markdown)
        ));
        assert!(matches!(
            output_format(Path::new("-")),
            Some(OutputFormat::Csv)
        ));
        assert!(output_format(Path::new("out.html")).is_none());
        assert!(output_format(Path::new("out")).is_none());
    }
}
