//! Tabular speedup report over two result files.

use crate::record::ResultsFile;
use crate::speedup::{speedup, SpeedupStats};
use crate::suite::short_name;
use kernelcheck_oracle::BenchmarkStatus;

/// One table row: a benchmark's status and its speedup over the reference.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub name: String,
    pub status: BenchmarkStatus,
    pub stats: SpeedupStats,
}

/// Derive report rows from the reference and candidate record files.
///
/// The reference file defines the row set; candidate benchmarks missing from
/// it are ignored, and reference benchmarks the candidate never recorded are
/// reported, not dropped silently.
pub fn build_report(reference: &ResultsFile, candidate: &ResultsFile) -> Vec<ReportRow> {
    let mut rows = Vec::with_capacity(reference.len());
    for (benchmark, reference_record) in reference.iter() {
        let name = short_name(benchmark).to_string();
        let Some(record) = candidate.get(benchmark) else {
            tracing::warn!(benchmark, "benchmark missing from candidate results");
            rows.push(ReportRow {
                name,
                status: BenchmarkStatus::Unavailable,
                stats: SpeedupStats::undefined(),
            });
            continue;
        };
        let reference_samples = reference_record.data.as_deref().unwrap_or(&[]);
        let candidate_samples = record.data.as_deref().unwrap_or(&[]);
        rows.push(ReportRow {
            name,
            status: record.status,
            stats: speedup(record.status, reference_samples, candidate_samples),
        });
    }
    rows
}

fn cell(value: f64) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("x{value:.2}")
    }
}

/// Render the rows as an aligned, star-bordered table.
pub fn render_table(rows: &[ReportRow]) -> String {
    let name_width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0).max(4);
    let status_width = rows
        .iter()
        .map(|r| r.status.as_str().len())
        .max()
        .unwrap_or(0)
        .max(6);
    let column = |pick: fn(&SpeedupStats) -> f64| {
        rows.iter()
            .map(|r| cell(pick(&r.stats)).len())
            .max()
            .unwrap_or(0)
            .max(3)
    };
    let avg_width = column(|s| s.avg);
    let min_width = column(|s| s.min);
    let max_width = column(|s| s.max);

    let border = "*".repeat(name_width + status_width + avg_width + min_width + max_width + 16);
    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');
    out.push_str(&format!(
        "* {:<name_width$} * {:<status_width$} * {:>avg_width$} * {:>min_width$} * {:>max_width$} *\n",
        "Name", "Status", "Avg", "Min", "Max"
    ));
    out.push_str(&border);
    out.push('\n');
    for row in rows {
        out.push_str(&format!(
            "* {:<name_width$} * {:<status_width$} * {:>avg_width$} * {:>min_width$} * {:>max_width$} *\n",
            row.name,
            row.status.as_str(),
            cell(row.stats.avg),
            cell(row.stats.min),
            cell(row.stats.max),
        ));
    }
    out.push_str(&border);
    out.push('\n');
    out
}
