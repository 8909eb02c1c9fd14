//! Section-header dialect of the sorting benchmark logs.
//!
//! A section is a header line `(<free text>)` followed by consecutive
//! timing lines `# elapsed time (<label>): <float>s`. Any other line closes
//! the section. The caller declares which family of log the file is; the
//! family decides how headers and labels are routed.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::classify::classify_header;
use crate::data::{ConfigKey, RawMeasurement, Source};

use super::types::{parse_elapsed, LogParser, ParseIssue, ParseOutcome};

pub const SEQ_BINARY: &str = "sequential_binary";
pub const SEQ_KWAY: &str = "sequential_kway";
pub const OMP_LABEL: &str = "mergesort_omp";
pub const FF_LABEL: &str = "mergesort_ff";
pub const FF_NO_MAPPING_LABEL: &str = "mergesort_ff_no_mapping";
pub const MPI_LABEL: &str = "mergesort_mpi";

/// Which family of sorting logs a file belongs to, declared by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionFamily {
    /// Combined sequential + OMP + FastFlow log, grouped by thread count.
    Combined,
    /// Strong-scaling MPI log, grouped by node count.
    MpiStrong,
    /// Weak-scaling MPI log, grouped jointly by node count and filesize.
    MpiWeak,
}

/// Routing decision for one recognized section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    SeqBinary,
    SeqKway,
    Threaded(u32),
    MpiStrong(u32),
    MpiWeak(u32, u64),
}

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\((.*)\)\s*$").unwrap())
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^# elapsed time \(([^)]*)\):\s*(.*)$").unwrap())
}

pub struct SectionLogParser {
    family: SectionFamily,
}

impl SectionLogParser {
    pub fn new(family: SectionFamily) -> Self {
        SectionLogParser { family }
    }

    fn classify_section(&self, header: &str) -> Option<SectionKind> {
        match self.family {
            SectionFamily::Combined => {
                if header.contains("sequential binary") {
                    return Some(SectionKind::SeqBinary);
                }
                if header.contains("sequential kway") {
                    return Some(SectionKind::SeqKway);
                }
                classify_header(header).threads.map(SectionKind::Threaded)
            }
            SectionFamily::MpiStrong => {
                classify_header(header).nodes.map(SectionKind::MpiStrong)
            }
            // Weak scaling requires both dimensions jointly; a header with
            // only one of the two does not match this family.
            SectionFamily::MpiWeak => {
                let config = classify_header(header);
                match (config.nodes, config.filesize) {
                    (Some(nodes), Some(filesize)) => {
                        Some(SectionKind::MpiWeak(nodes, filesize))
                    }
                    _ => None,
                }
            }
        }
    }
}

/// Build the measurement for one timing line, or `None` when the label is
/// not tracked by the section's family. Sequential sections pool all their
/// timing lines regardless of the per-line label.
fn record_for(kind: SectionKind, label: &str, elapsed_seconds: f64) -> Option<RawMeasurement> {
    let (source, algorithm_label, config) = match kind {
        SectionKind::SeqBinary => (Source::Sequential, SEQ_BINARY, ConfigKey::empty()),
        SectionKind::SeqKway => (Source::Sequential, SEQ_KWAY, ConfigKey::empty()),
        SectionKind::Threaded(threads) => match label {
            OMP_LABEL | FF_LABEL | FF_NO_MAPPING_LABEL => {
                (Source::ParallelThread, label, ConfigKey::threads(threads))
            }
            _ => return None,
        },
        SectionKind::MpiStrong(nodes) if label == MPI_LABEL => {
            (Source::ParallelMpiStrong, MPI_LABEL, ConfigKey::nodes(nodes))
        }
        SectionKind::MpiWeak(nodes, filesize) if label == MPI_LABEL => (
            Source::ParallelMpiWeak,
            MPI_LABEL,
            ConfigKey::weak(nodes, filesize),
        ),
        _ => return None,
    };
    Some(RawMeasurement {
        source,
        algorithm_label: algorithm_label.to_string(),
        config,
        elapsed_seconds,
    })
}

impl LogParser for SectionLogParser {
    fn parse(&self, input: &str) -> ParseOutcome {
        let mut out = ParseOutcome::default();
        let mut section: Option<SectionKind> = None;

        for (idx, raw_line) in input.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim();

            if let Some(captures) = header_re().captures(line) {
                let header = &captures[1];
                section = self.classify_section(header);
                if section.is_none() {
                    out.issues.push(ParseIssue::LineParse {
                        line: line_no,
                        text: header.to_string(),
                    });
                }
                continue;
            }

            if let Some(captures) = time_re().captures(line) {
                let Some(kind) = section else {
                    debug!("line {line_no}: timing line outside any section, ignoring");
                    continue;
                };
                match parse_elapsed(&captures[2]) {
                    Some(elapsed) => {
                        if let Some(m) = record_for(kind, &captures[1], elapsed) {
                            out.measurements.push(m);
                        }
                    }
                    None => out.issues.push(ParseIssue::LineParse {
                        line: line_no,
                        text: captures[2].to_string(),
                    }),
                }
                continue;
            }

            // Any other line, blank included, ends the current section.
            section = None;
        }

        out
    }
}
