//! Derivation of grouping dimensions from header text and file paths.

use std::sync::OnceLock;

use regex::Regex;

use crate::data::ConfigKey;

/// Canonical dataset label used when a path's final segment is the
/// benchmark driver's mixed-corpus directory.
pub const MIXED_FILES: &str = "mixed_files";

fn nthreads_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"nthreads=(\d+)").unwrap())
}

fn nnodes_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"nnodes=(\d+)").unwrap())
}

fn filesize_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"filesize=(\d+)").unwrap())
}

/// Map a run header's free text to its grouping dimensions.
///
/// Recognizes `nthreads=N`, `nnodes=N` and `filesize=N` anywhere in the
/// text; a key that does not appear leaves its dimension unset. Pure
/// function, no state between calls.
pub fn classify_header(header: &str) -> ConfigKey {
    let capture_u32 = |re: &Regex| {
        re.captures(header)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
    };
    let capture_u64 = |re: &Regex| {
        re.captures(header)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
    };

    ConfigKey {
        threads: capture_u32(nthreads_re()),
        nodes: capture_u32(nnodes_re()),
        filesize: capture_u64(filesize_re()),
        ..Default::default()
    }
}

/// Dataset identity of a benchmark input path: the final path segment,
/// except that the literal segment `test_files` collapses to the canonical
/// `mixed_files` label.
pub fn dataset_from_path(path: &str) -> String {
    let last = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path);
    if last == "test_files" {
        MIXED_FILES.to_string()
    } else {
        last.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_with_threads() {
        let config = classify_header("mergesort run nthreads=16 run=3");
        assert_eq!(config.threads, Some(16));
        assert_eq!(config.nodes, None);
        assert_eq!(config.filesize, None);
    }

    #[test]
    fn header_with_nodes_and_filesize() {
        let config = classify_header("mpi weak nnodes=8 filesize=2048");
        assert_eq!(config.nodes, Some(8));
        assert_eq!(config.filesize, Some(2048));
    }

    #[test]
    fn keys_recognized_in_any_position() {
        let config = classify_header("filesize=512 something nnodes=2");
        assert_eq!(config.nodes, Some(2));
        assert_eq!(config.filesize, Some(512));
    }

    #[test]
    fn sequential_header_has_empty_config() {
        let config = classify_header("sequential binary merge");
        assert_eq!(config, ConfigKey::empty());
    }

    #[test]
    fn dataset_collapses_test_files() {
        assert_eq!(dataset_from_path("/data/bench/test_files"), "mixed_files");
        assert_eq!(dataset_from_path("test_files"), "mixed_files");
    }

    #[test]
    fn dataset_keeps_other_segments() {
        assert_eq!(dataset_from_path("/data/bench/corpus_a"), "corpus_a");
        assert_eq!(dataset_from_path("corpus_a/"), "corpus_a");
        assert_eq!(dataset_from_path("my_test_files"), "my_test_files");
    }
}
