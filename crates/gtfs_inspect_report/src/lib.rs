//! Report objects and serialization.
//!
//! The JSON report groups notices by code with exact totals and capped
//! samples. Serialization is deterministic: groups are ordered by severity
//! then code, sample objects serialize with alphabetical keys, and nothing
//! in the default output depends on wall-clock time, so validating the same
//! feed twice writes byte-identical files.

mod html;

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use serde_json::{Map, Value};

use gtfs_inspect_core::engine::ValidationOutcome;
use gtfs_inspect_core::{NoticeContainer, NoticeSeverity};

pub use html::write_html_report;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCounts {
    pub errors: u64,
    pub warnings: u64,
    pub infos: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReport {
    pub filename: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub validator_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_for_validation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gtfs_input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    pub aborted: bool,
    pub counts: ReportCounts,
    pub tables: Vec<TableReport>,
}

impl ReportSummary {
    pub fn new(validator_version: impl Into<String>) -> Self {
        Self {
            validator_version: validator_version.into(),
            ..Default::default()
        }
    }

    pub fn with_validated_at(mut self, value: impl Into<String>) -> Self {
        self.validated_at = Some(value.into());
        self
    }

    pub fn with_country_code(mut self, value: impl Into<String>) -> Self {
        self.country_code = Some(value.into());
        self
    }

    pub fn with_date_for_validation(mut self, value: impl Into<String>) -> Self {
        self.date_for_validation = Some(value.into());
        self
    }

    pub fn with_gtfs_input(mut self, value: impl Into<String>) -> Self {
        self.gtfs_input = Some(value.into());
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Fills feed-derived fields: counts, per-table summaries, metadata.
    pub fn with_outcome(mut self, outcome: &ValidationOutcome) -> Self {
        self.aborted = outcome.aborted;
        self.counts = count_severities(&outcome.notices);
        if let Some(feed) = outcome.feed.as_ref() {
            let metadata = feed.metadata();
            self.feed_version = metadata.feed_version;
            self.agency_timezone = metadata.agency_timezone;
            self.tables = feed
                .table_summaries()
                .into_iter()
                .map(|summary| TableReport {
                    filename: summary.filename.to_string(),
                    row_count: summary.row_count,
                    columns: summary.columns,
                })
                .collect();
        }
        self
    }
}

fn count_severities(notices: &NoticeContainer) -> ReportCounts {
    ReportCounts {
        errors: notices.severity_count(NoticeSeverity::Error),
        warnings: notices.severity_count(NoticeSeverity::Warning),
        infos: notices.severity_count(NoticeSeverity::Info),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeGroup {
    pub code: String,
    pub severity: String,
    pub total_notices: u64,
    pub sample_notices: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub summary: ReportSummary,
    pub notices: Vec<NoticeGroup>,
}

impl ValidationReport {
    pub fn from_outcome(outcome: &ValidationOutcome, summary: ReportSummary) -> Self {
        Self::from_container(&outcome.notices, summary)
    }

    /// Groups the container by code: errors first, then warnings, then
    /// infos, codes alphabetical within a severity.
    pub fn from_container(notices: &NoticeContainer, summary: ReportSummary) -> Self {
        let mut groups: Vec<NoticeGroup> = Vec::new();
        for (code, total) in notices.totals() {
            let samples: Vec<&gtfs_inspect_core::ValidationNotice> =
                notices.samples(code).collect();
            let Some(first) = samples.first() else {
                continue;
            };
            groups.push(NoticeGroup {
                code: code.clone(),
                severity: severity_label(first.severity).to_string(),
                total_notices: *total,
                sample_notices: samples.iter().map(|notice| sample_value(notice)).collect(),
            });
        }
        groups.sort_by(|a, b| {
            severity_rank(&b.severity)
                .cmp(&severity_rank(&a.severity))
                .then_with(|| a.code.cmp(&b.code))
        });
        Self {
            summary,
            notices: groups,
        }
    }

    pub fn to_json(&self, pretty: bool) -> anyhow::Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
        .context("serialize validation report")?;
        Ok(json)
    }

    pub fn write_json(&self, path: impl AsRef<Path>, pretty: bool) -> anyhow::Result<()> {
        let json = self.to_json(pretty)?;
        fs::write(&path, format!("{}\n", json))
            .with_context(|| format!("write report to {}", path.as_ref().display()))?;
        Ok(())
    }
}

fn severity_label(severity: NoticeSeverity) -> &'static str {
    match severity {
        NoticeSeverity::Error => "ERROR",
        NoticeSeverity::Warning => "WARNING",
        NoticeSeverity::Info => "INFO",
    }
}

fn severity_rank(label: &str) -> u8 {
    match label {
        "ERROR" => 2,
        "WARNING" => 1,
        _ => 0,
    }
}

/// One sample as a flat JSON object. Context fields carry everything the
/// notice knows; serde_json orders keys alphabetically, which keeps samples
/// stable across runs.
fn sample_value(notice: &gtfs_inspect_core::ValidationNotice) -> Value {
    let mut object = Map::new();
    for (key, value) in &notice.context {
        object.insert(key.clone(), value.clone());
    }
    if let Some(row) = notice.row {
        object
            .entry("csvRowNumber".to_string())
            .or_insert_with(|| Value::from(row));
    }
    if let Some(file) = &notice.file {
        object
            .entry("filename".to_string())
            .or_insert_with(|| Value::from(file.clone()));
    }
    if let Some(field) = &notice.field {
        object
            .entry("fieldName".to_string())
            .or_insert_with(|| Value::from(field.clone()));
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtfs_inspect_core::ValidationNotice;

    fn container() -> NoticeContainer {
        let mut notices = NoticeContainer::new();
        notices.push(
            ValidationNotice::new("zulu_warning", NoticeSeverity::Warning, "w")
                .with_location("stops.txt", "stop_name", 2),
        );
        notices.push(
            ValidationNotice::new("alpha_error", NoticeSeverity::Error, "e")
                .with_location("routes.txt", "route_id", 3),
        );
        notices.push(
            ValidationNotice::new("beta_error", NoticeSeverity::Error, "e")
                .with_location("trips.txt", "trip_id", 4),
        );
        notices
    }

    #[test]
    fn groups_order_errors_first_then_alphabetical() {
        let report =
            ValidationReport::from_container(&container(), ReportSummary::new("test"));
        let codes: Vec<&str> = report
            .notices
            .iter()
            .map(|group| group.code.as_str())
            .collect();
        assert_eq!(codes, vec!["alpha_error", "beta_error", "zulu_warning"]);
    }

    #[test]
    fn serialization_is_reproducible() {
        let first = ValidationReport::from_container(&container(), ReportSummary::new("test"))
            .to_json(true)
            .unwrap();
        let second = ValidationReport::from_container(&container(), ReportSummary::new("test"))
            .to_json(true)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn totals_survive_the_sample_cap() {
        let mut notices = NoticeContainer::with_max_per_code(2);
        for index in 0..5 {
            notices.push(
                ValidationNotice::new("noisy", NoticeSeverity::Warning, "w").with_location(
                    "stops.txt",
                    "stop_name",
                    index + 2,
                ),
            );
        }
        let report = ValidationReport::from_container(&notices, ReportSummary::new("test"));
        assert_eq!(report.notices[0].total_notices, 5);
        assert_eq!(report.notices[0].sample_notices.len(), 2);
    }
}
