// src/report.rs
//! Console rendering of a `RunReport`.

use std::fmt::Write as _;

use anyhow::Result;
use serde::Serialize;

use crate::checker::{FailureRecord, RunReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Failures sorted by (source, name, url) for stable output.
pub fn sorted_failures(report: &RunReport) -> Vec<&FailureRecord> {
    let mut out: Vec<&FailureRecord> = report.failures.iter().collect();
    out.sort_by(|a, b| {
        (a.source.as_str(), a.name.as_str(), a.url.as_str()).cmp(&(
            b.source.as_str(),
            b.name.as_str(),
            b.url.as_str(),
        ))
    });
    out
}

pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Testing complete: {} failed out of {}",
        report.failed(),
        report.total
    );
    let cancelled = report.cancelled();
    if cancelled > 0 {
        let _ = writeln!(out, "Run cancelled: {cancelled} feeds were not checked");
    }
    if !report.failures.is_empty() {
        out.push_str("Failed feeds summary:\n");
        for f in sorted_failures(report) {
            let _ = writeln!(out, "  {}: {} - {}", f.source, f.name, f.error);
        }
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    total: usize,
    succeeded: usize,
    failed: usize,
    started_at: String,
    finished_at: String,
    failures: Vec<&'a FailureRecord>,
}

pub fn render_json(report: &RunReport) -> Result<String> {
    let body = JsonReport {
        total: report.total,
        succeeded: report.succeeded,
        failed: report.failed(),
        started_at: report.started_at.to_rfc3339(),
        finished_at: report.finished_at.to_rfc3339(),
        failures: sorted_failures(report),
    };
    Ok(serde_json::to_string_pretty(&body)?)
}

pub fn render(report: &RunReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => render_json(report).map(|s| s + "\n"),
    }
}

/// Process exit code for a finished run: 0 clean, 1 any failure.
pub fn exit_code(report: &RunReport) -> u8 {
    if report.is_clean() {
        0
    } else {
        1
    }
}
