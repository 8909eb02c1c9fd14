pub mod aggregate;
pub mod baseline;
pub mod classify;
pub mod cli;
pub mod data;
pub mod parsers;
pub mod reporting;
pub mod stats;
