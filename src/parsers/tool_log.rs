//! Tool-invocation dialect of the compressor benchmark log.
//!
//! Each record is a line `Running <tool> on <dataset-path> [(threads=N)]`
//! followed by exactly two timing lines; the first is the compression time,
//! the second the decompression time. A small state machine tracks which
//! timing line is expected next; a record cut short by anything, end of
//! input included, is dropped without aborting the pass.

use std::sync::OnceLock;

use regex::Regex;

use crate::classify::dataset_from_path;
use crate::data::{ConfigKey, RawMeasurement, Source};

use super::types::{parse_elapsed, LogParser, ParseIssue, ParseOutcome};

pub const COMPRESS: &str = "compress";
pub const DECOMPRESS: &str = "decompress";

/// Tool name of the single-threaded compressor baseline.
pub const SEQUENTIAL_TOOL: &str = "minizseq";

fn running_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^Running\s+(\S+)\s+on\s+(\S+)(?:\s+\(threads=(\d+)\))?\s*$").unwrap()
    })
}

fn timing_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^:]+):\s*(\S+)\s*$").unwrap())
}

/// Header data of the record currently being read.
#[derive(Debug, Clone)]
struct PendingRecord {
    tool: String,
    dataset: String,
    threads: u32,
    line: usize,
}

/// Which timing line the scanner expects next.
enum State {
    AwaitingHeader,
    AwaitingCompress(PendingRecord),
    AwaitingDecompress(PendingRecord, f64),
}

pub struct ToolLogParser;

impl ToolLogParser {
    fn emit(out: &mut ParseOutcome, pending: PendingRecord, compress: f64, decompress: f64) {
        let config = ConfigKey {
            dataset: Some(pending.dataset),
            tool: Some(pending.tool),
            threads: Some(pending.threads),
            ..Default::default()
        };
        out.measurements.push(RawMeasurement {
            source: Source::Compressor,
            algorithm_label: COMPRESS.to_string(),
            config: config.clone(),
            elapsed_seconds: compress,
        });
        out.measurements.push(RawMeasurement {
            source: Source::Compressor,
            algorithm_label: DECOMPRESS.to_string(),
            config,
            elapsed_seconds: decompress,
        });
    }
}

impl LogParser for ToolLogParser {
    fn parse(&self, input: &str) -> ParseOutcome {
        let mut out = ParseOutcome::default();
        let mut state = State::AwaitingHeader;

        for (idx, raw_line) in input.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim();

            if let Some(captures) = running_re().captures(line) {
                // A new header while timing lines were still expected
                // drops the partial record.
                match state {
                    State::AwaitingCompress(ref pending)
                    | State::AwaitingDecompress(ref pending, _) => {
                        out.issues.push(ParseIssue::TruncatedSection {
                            line: pending.line,
                        });
                    }
                    State::AwaitingHeader => {}
                }

                let tool = captures[1].to_string();
                let threads = if tool == SEQUENTIAL_TOOL {
                    Some(1)
                } else {
                    captures
                        .get(3)
                        .and_then(|m| m.as_str().parse::<u32>().ok())
                };
                state = match threads {
                    Some(threads) => State::AwaitingCompress(PendingRecord {
                        dataset: dataset_from_path(&captures[2]),
                        tool,
                        threads,
                        line: line_no,
                    }),
                    // Parallel tool without a thread count is not a valid
                    // header for this dialect.
                    None => {
                        out.issues.push(ParseIssue::LineParse {
                            line: line_no,
                            text: line.to_string(),
                        });
                        State::AwaitingHeader
                    }
                };
                continue;
            }

            state = match state {
                State::AwaitingHeader => State::AwaitingHeader,
                State::AwaitingCompress(pending) => {
                    match timing_re()
                        .captures(line)
                        .and_then(|c| parse_elapsed(&c[2]))
                    {
                        Some(elapsed) => State::AwaitingDecompress(pending, elapsed),
                        None => {
                            out.issues.push(ParseIssue::LineParse {
                                line: line_no,
                                text: line.to_string(),
                            });
                            State::AwaitingHeader
                        }
                    }
                }
                State::AwaitingDecompress(pending, compress) => {
                    match timing_re()
                        .captures(line)
                        .and_then(|c| parse_elapsed(&c[2]))
                    {
                        Some(elapsed) => {
                            Self::emit(&mut out, pending, compress, elapsed);
                            State::AwaitingHeader
                        }
                        None => {
                            out.issues.push(ParseIssue::LineParse {
                                line: line_no,
                                text: line.to_string(),
                            });
                            State::AwaitingHeader
                        }
                    }
                }
            };
        }

        // End of input mid-record drops the partial record.
        match state {
            State::AwaitingCompress(pending) | State::AwaitingDecompress(pending, _) => {
                out.issues.push(ParseIssue::TruncatedSection {
                    line: pending.line,
                });
            }
            State::AwaitingHeader => {}
        }

        out
    }
}
