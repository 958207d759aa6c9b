use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::{NoticeGroup, ValidationReport};

const NOTICE_ROW_LIMIT: usize = 50;

pub fn write_html_report(path: impl AsRef<Path>, report: &ValidationReport) -> anyhow::Result<()> {
    let html = render_html(report);
    fs::write(&path, html)
        .with_context(|| format!("write html report to {}", path.as_ref().display()))?;
    Ok(())
}

fn render_html(report: &ValidationReport) -> String {
    let mut out = String::new();
    out.push_str(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>GTFS Schedule Validation Report</title>
    <meta name="robots" content="noindex, nofollow">
    <meta http-equiv="Content-Type" content="text/html; charset=UTF-8"/>
    <style>
    body {
        font-family: Helvetica, Arial, sans-serif;
        font-size: 14px;
        min-width: 800px;
        padding: 1em 2em;
    }

    .error:before {
        content: "\1F534  ";
    }

    .warning:before {
        content: "\1F7E0  ";
    }

    .info:before {
        content: "\26AA  ";
    }

    table {
        width: 100%;
        border-collapse: collapse;
        margin-bottom: 1.5em;
    }

    table caption {
        text-align: left;
        margin: 0.5em 0;
        font-weight: bold;
    }

    table th {
        text-align: left;
        border-bottom: 2px solid #000;
        padding: 0.4em;
        white-space: nowrap;
    }

    table td {
        border-bottom: 1px solid #ddd;
        padding: 0.4em;
    }

    .truncated {
        color: #666;
        font-style: italic;
    }
    </style>
</head>
<body>
"#,
    );

    out.push_str("<h1>GTFS Schedule Validation Report</h1>\n");
    render_summary(&mut out, report);
    render_tables(&mut out, report);
    render_notice_groups(&mut out, report);
    out.push_str("</body>\n</html>\n");
    out
}

fn render_summary(out: &mut String, report: &ValidationReport) {
    let summary = &report.summary;
    out.push_str("<h2>Summary</h2>\n<table>\n");
    let mut row = |label: &str, value: &str| {
        let _ = writeln!(
            out,
            "<tr><th>{}</th><td>{}</td></tr>",
            escape(label),
            escape(value)
        );
    };
    row("Validator version", &summary.validator_version);
    if let Some(input) = &summary.gtfs_input {
        row("Input", input);
    }
    if let Some(country_code) = &summary.country_code {
        row("Country code", country_code);
    }
    if let Some(date) = &summary.date_for_validation {
        row("Date for validation", date);
    }
    if let Some(validated_at) = &summary.validated_at {
        row("Validated at", validated_at);
    }
    if let Some(feed_version) = &summary.feed_version {
        row("Feed version", feed_version);
    }
    if let Some(timezone) = &summary.agency_timezone {
        row("Agency timezone", timezone);
    }
    row("Errors", &summary.counts.errors.to_string());
    row("Warnings", &summary.counts.warnings.to_string());
    row("Infos", &summary.counts.infos.to_string());
    if summary.aborted {
        row("Aborted", "yes");
    }
    out.push_str("</table>\n");
}

fn render_tables(out: &mut String, report: &ValidationReport) {
    if report.summary.tables.is_empty() {
        return;
    }
    out.push_str("<h2>Files</h2>\n<table>\n");
    out.push_str("<tr><th>File</th><th>Rows</th><th>Columns</th></tr>\n");
    for table in &report.summary.tables {
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&table.filename),
            table.row_count,
            escape(&table.columns.join(", "))
        );
    }
    out.push_str("</table>\n");
}

fn render_notice_groups(out: &mut String, report: &ValidationReport) {
    out.push_str("<h2>Notices</h2>\n");
    if report.notices.is_empty() {
        out.push_str("<p>No notices.</p>\n");
        return;
    }
    for group in &report.notices {
        render_group(out, group);
    }
}

fn render_group(out: &mut String, group: &NoticeGroup) {
    let class = group.severity.to_ascii_lowercase();
    let _ = writeln!(
        out,
        "<h3 class=\"{}\">{} &mdash; {} ({})</h3>",
        escape(&class),
        escape(&group.code),
        escape(&group.severity),
        group.total_notices
    );

    // Collect the union of sample keys for the column set.
    let mut keys: Vec<&str> = Vec::new();
    for sample in &group.sample_notices {
        if let Some(object) = sample.as_object() {
            for key in object.keys() {
                if !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
        }
    }
    keys.sort_unstable();

    out.push_str("<table>\n<tr>");
    for key in &keys {
        let _ = write!(out, "<th>{}</th>", escape(key));
    }
    out.push_str("</tr>\n");

    for sample in group.sample_notices.iter().take(NOTICE_ROW_LIMIT) {
        out.push_str("<tr>");
        let object = sample.as_object();
        for key in &keys {
            let text = object
                .and_then(|object| object.get(*key))
                .map(render_value)
                .unwrap_or_default();
            let _ = write!(out, "<td>{}</td>", escape(&text));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");

    if group.sample_notices.len() > NOTICE_ROW_LIMIT {
        let _ = writeln!(
            out,
            "<p class=\"truncated\">Showing {} of {} notices.</p>",
            NOTICE_ROW_LIMIT, group.total_notices
        );
    }
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReportSummary;
    use gtfs_inspect_core::{NoticeContainer, NoticeSeverity, ValidationNotice};

    #[test]
    fn renders_groups_and_escapes_values() {
        let mut notices = NoticeContainer::new();
        notices.push(
            ValidationNotice::new("bad_name", NoticeSeverity::Error, "e")
                .with_location("stops.txt", "stop_name", 2)
                .with_context_field("fieldValue", "<script>"),
        );
        let report = ValidationReport::from_container(&notices, ReportSummary::new("test"));
        let html = render_html(&report);

        assert!(html.contains("bad_name"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
