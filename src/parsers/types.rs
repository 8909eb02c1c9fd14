use thiserror::Error;

use crate::data::RawMeasurement;

/// Recoverable problems encountered while scanning a log. None of these
/// abort the pass; the affected line or record is dropped and scanning
/// continues, so a batch always completes with partial results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseIssue {
    /// A timing line's numeric portion is not a valid elapsed time, or a
    /// header matched no known dialect pattern.
    #[error("line {line}: cannot interpret '{text}'")]
    LineParse { line: usize, text: String },
    /// The record starting at `line` ended before all its expected timing
    /// lines were read.
    #[error("record starting on line {line} is incomplete, dropping it")]
    TruncatedSection { line: usize },
}

/// Result of one single pass over a log: every measurement that could be
/// extracted plus every recoverable issue hit on the way.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub measurements: Vec<RawMeasurement>,
    pub issues: Vec<ParseIssue>,
}

impl ParseOutcome {
    /// Log all issues at warn level and yield the measurements.
    pub fn log_issues(self, origin: &str) -> Vec<RawMeasurement> {
        for issue in &self.issues {
            log::warn!("{origin}: {issue}");
        }
        self.measurements
    }
}

/// Trait for parsers that turn one log dialect into raw measurements.
/// One finite pass over the input; not restartable.
pub trait LogParser {
    fn parse(&self, input: &str) -> ParseOutcome;
}

/// Strip the trailing `s` unit suffix and parse the numeric portion.
/// Elapsed times are non-negative; anything else is a parse failure.
pub(crate) fn parse_elapsed(token: &str) -> Option<f64> {
    let token = token.trim();
    let number = token.strip_suffix('s').unwrap_or(token);
    number.parse::<f64>().ok().filter(|v| *v >= 0.0)
}
