//! Parsers for raw benchmark log dialects
//!
//! This module provides one parser per recognized log layout, all converting
//! into the common `RawMeasurement` type: the section-header dialect of the
//! sorting benchmarks, the tool-invocation dialect of the compressor
//! benchmark, and the wide CSV tables this engine itself emits.

pub mod csv_table;
pub mod section_log;
pub mod tool_log;
pub mod types;

// Re-export commonly used types
pub use csv_table::CsvTableParser;
pub use section_log::{SectionFamily, SectionLogParser};
pub use tool_log::ToolLogParser;
pub use types::{LogParser, ParseIssue, ParseOutcome};
