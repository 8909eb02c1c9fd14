use std::fmt;

/// Which experiment family produced a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    Sequential,
    ParallelThread,
    ParallelMpiStrong,
    ParallelMpiWeak,
    Compressor,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Sequential => "sequential",
            Source::ParallelThread => "parallel-thread",
            Source::ParallelMpiStrong => "parallel-mpi-strong",
            Source::ParallelMpiWeak => "parallel-mpi-weak",
            Source::Compressor => "compressor",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grouping dimensions of a single run. An absent dimension is not part of
/// the grouping key for that record.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigKey {
    pub dataset: Option<String>,
    pub tool: Option<String>,
    pub threads: Option<u32>,
    pub nodes: Option<u32>,
    pub filesize: Option<u64>,
}

impl ConfigKey {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn threads(threads: u32) -> Self {
        ConfigKey {
            threads: Some(threads),
            ..Default::default()
        }
    }

    pub fn nodes(nodes: u32) -> Self {
        ConfigKey {
            nodes: Some(nodes),
            ..Default::default()
        }
    }

    pub fn weak(nodes: u32, filesize: u64) -> Self {
        ConfigKey {
            nodes: Some(nodes),
            filesize: Some(filesize),
            ..Default::default()
        }
    }

    /// The parallelism dimension against which speedup and efficiency are
    /// normalized: threads for shared-memory runs, nodes for distributed
    /// runs. `None` when the config carries neither.
    pub fn worker_count(&self) -> Option<u32> {
        self.threads.or(self.nodes)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ds) = &self.dataset {
            parts.push(format!("dataset={ds}"));
        }
        if let Some(tool) = &self.tool {
            parts.push(format!("tool={tool}"));
        }
        if let Some(t) = self.threads {
            parts.push(format!("threads={t}"));
        }
        if let Some(n) = self.nodes {
            parts.push(format!("nodes={n}"));
        }
        if let Some(fs) = self.filesize {
            parts.push(format!("filesize={fs}"));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// One timing extracted from a log. Created once per parsed line or section,
/// immutable, discarded after folding into an aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMeasurement {
    pub source: Source,
    pub algorithm_label: String,
    pub config: ConfigKey,
    pub elapsed_seconds: f64,
}

/// Key of one aggregation group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub source: Source,
    pub algorithm_label: String,
    pub config: ConfigKey,
}

impl GroupKey {
    pub fn new(source: Source, algorithm_label: &str, config: ConfigKey) -> Self {
        GroupKey {
            source,
            algorithm_label: algorithm_label.to_string(),
            config,
        }
    }
}

impl From<&RawMeasurement> for GroupKey {
    fn from(m: &RawMeasurement) -> Self {
        GroupKey {
            source: m.source,
            algorithm_label: m.algorithm_label.clone(),
            config: m.config.clone(),
        }
    }
}

/// Speedup and efficiency of one aggregated group against its baseline.
///
/// A metric that cannot be computed (missing mean, missing baseline,
/// missing worker count) is represented by not constructing the record at
/// all, or by `efficiency: None`; a derived value is never `0.0` standing
/// in for "no data".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetric {
    pub baseline_seconds: f64,
    pub speedup: f64,
    pub efficiency: Option<f64>,
}
