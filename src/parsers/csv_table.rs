//! Re-entry parser for the wide `Dataset,<threads...>` CSV tables this
//! engine emits. Feeding an emitted table back through aggregation and
//! derivation reproduces the same speedups as deriving from the raw logs,
//! given matching baselines.

use crate::data::{ConfigKey, RawMeasurement, Source};

use super::types::{LogParser, ParseIssue, ParseOutcome};

pub struct CsvTableParser {
    source: Source,
    algorithm_label: String,
    tool: Option<String>,
}

impl CsvTableParser {
    /// The caller declares what the table holds: the source and algorithm
    /// label of its values, and the tool dimension they were grouped under
    /// (e.g. `minizseq` for the sequential compressor table).
    pub fn new(source: Source, algorithm_label: &str, tool: Option<&str>) -> Self {
        CsvTableParser {
            source,
            algorithm_label: algorithm_label.to_string(),
            tool: tool.map(str::to_string),
        }
    }
}

impl LogParser for CsvTableParser {
    fn parse(&self, input: &str) -> ParseOutcome {
        let mut out = ParseOutcome::default();
        let mut lines = input.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

        let Some((header_idx, header)) = lines.next() else {
            return out;
        };
        let mut fields = header.split(',');
        if fields.next().map(str::trim) != Some("Dataset") {
            out.issues.push(ParseIssue::LineParse {
                line: header_idx + 1,
                text: header.to_string(),
            });
            return out;
        }

        // Column headers are thread counts; an unparseable column header
        // invalidates that column only.
        let columns: Vec<Option<u32>> = fields
            .map(|f| {
                let trimmed = f.trim();
                let parsed = trimmed.parse::<u32>().ok();
                if parsed.is_none() {
                    out.issues.push(ParseIssue::LineParse {
                        line: header_idx + 1,
                        text: trimmed.to_string(),
                    });
                }
                parsed
            })
            .collect();

        for (idx, row) in lines {
            let mut fields = row.split(',');
            let Some(dataset) = fields.next().map(str::trim).filter(|d| !d.is_empty()) else {
                out.issues.push(ParseIssue::LineParse {
                    line: idx + 1,
                    text: row.to_string(),
                });
                continue;
            };

            for (column, cell) in columns.iter().zip(fields) {
                let cell = cell.trim();
                if cell.is_empty() {
                    // Empty field means "no value" for that group, not zero.
                    continue;
                }
                let Some(threads) = column else { continue };
                match cell.parse::<f64>() {
                    Ok(elapsed_seconds) if elapsed_seconds >= 0.0 => {
                        out.measurements.push(RawMeasurement {
                            source: self.source,
                            algorithm_label: self.algorithm_label.clone(),
                            config: ConfigKey {
                                dataset: Some(dataset.to_string()),
                                tool: self.tool.clone(),
                                threads: Some(*threads),
                                ..Default::default()
                            },
                            elapsed_seconds,
                        });
                    }
                    _ => out.issues.push(ParseIssue::LineParse {
                        line: idx + 1,
                        text: cell.to_string(),
                    }),
                }
            }
        }

        out
    }
}
