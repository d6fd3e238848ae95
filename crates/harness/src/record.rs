//! Persisted result records, one JSON file per evaluated variant.

use anyhow::{Context, Result};
use kernelcheck_oracle::BenchmarkStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Durable outcome of one benchmark evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub status: BenchmarkStatus,
    /// Raw trial timings in seconds, present only when the benchmark was
    /// timed to completion. Never mutated after the evaluation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<f64>>,
}

impl BenchmarkRecord {
    pub fn untimed(status: BenchmarkStatus) -> Self {
        Self { status, data: None }
    }

    pub fn timed(status: BenchmarkStatus, data: Vec<f64>) -> Self {
        Self {
            status,
            data: Some(data),
        }
    }
}

/// All records of one evaluation run, keyed by benchmark path. Iteration is
/// sorted by key, matching the on-disk representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultsFile {
    records: BTreeMap<String, BenchmarkRecord>,
}

impl ResultsFile {
    pub fn insert(&mut self, benchmark: impl Into<String>, record: BenchmarkRecord) {
        self.records.insert(benchmark.into(), record);
    }

    pub fn get(&self, benchmark: &str) -> Option<&BenchmarkRecord> {
        self.records.get(benchmark)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BenchmarkRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the records as pretty JSON, creating the parent directory if
    /// needed. Written once per full evaluation run.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let file = serde_json::from_str(&json)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(file)
    }
}

/// Canonical record location for a variant: `<results-dir>/<variant>.json`.
pub fn results_path(results_dir: &Path, variant: &str) -> PathBuf {
    results_dir.join(format!("{variant}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = results_path(dir.path(), "opt");

        let mut results = ResultsFile::default();
        results.insert(
            "linear-algebra/blas/gemm",
            BenchmarkRecord::timed(BenchmarkStatus::Good, vec![0.5, 0.6]),
        );
        results.insert(
            "stencils/adi",
            BenchmarkRecord::untimed(BenchmarkStatus::Mismatch),
        );
        results.save(&path).unwrap();

        let loaded = ResultsFile::load(&path).unwrap();
        assert_eq!(loaded, results);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let record = BenchmarkRecord::untimed(BenchmarkStatus::Unstable);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"unstable\""));
        assert!(!json.contains("data"));
    }

    #[test]
    fn test_iteration_is_sorted() {
        let mut results = ResultsFile::default();
        results.insert("b", BenchmarkRecord::untimed(BenchmarkStatus::Good));
        results.insert("a", BenchmarkRecord::untimed(BenchmarkStatus::Good));
        let keys: Vec<&str> = results.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
