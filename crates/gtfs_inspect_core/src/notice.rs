use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::csv_reader::CsvParseError;

pub const NOTICE_CODE_CSV_PARSE_ERROR: &str = "csv_parsing_failed";
pub const NOTICE_CODE_MISSING_FILE: &str = "missing_required_file";
pub const NOTICE_CODE_MISSING_RECOMMENDED_FILE: &str = "missing_recommended_file";
pub const NOTICE_CODE_EMPTY_FILE: &str = "empty_file";
pub const NOTICE_CODE_UNKNOWN_FILE: &str = "unknown_file";

/// Default cap on retained samples per notice code. Totals stay exact past
/// the cap; only the stored samples stop growing.
pub const DEFAULT_MAX_NOTICES_PER_CODE: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Error,
    Warning,
    Info,
}

impl NoticeSeverity {
    /// Higher means more severe.
    pub fn rank(self) -> u8 {
        match self {
            NoticeSeverity::Error => 2,
            NoticeSeverity::Warning => 1,
            NoticeSeverity::Info => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationNotice {
    pub code: String,
    pub severity: NoticeSeverity,
    pub message: String,
    pub file: Option<String>,
    pub row: Option<u64>,
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_order: Vec<String>,
}

impl ValidationNotice {
    pub fn new(
        code: impl Into<String>,
        severity: NoticeSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            severity,
            message: message.into(),
            file: None,
            row: None,
            field: None,
            context: BTreeMap::new(),
            field_order: Vec::new(),
        }
    }

    pub fn from_csv_error(error: &CsvParseError) -> Self {
        let mut notice = ValidationNotice::new(
            NOTICE_CODE_CSV_PARSE_ERROR,
            NoticeSeverity::Error,
            error.message.clone(),
        );
        notice.file = Some(error.file.clone());
        notice.row = error.line_index;
        notice.insert_context_field("filename", error.file.clone());
        notice.insert_context_field("lineIndex", error.line_index.unwrap_or_default());
        notice.insert_context_field("message", error.message.clone());
        notice.field_order = vec![
            "filename".to_string(),
            "lineIndex".to_string(),
            "message".to_string(),
        ];
        notice
    }

    pub fn missing_file(file: impl Into<String>) -> Self {
        let file = file.into();
        let mut notice = ValidationNotice::new(
            NOTICE_CODE_MISSING_FILE,
            NoticeSeverity::Error,
            "missing required GTFS file",
        );
        notice.file = Some(file.clone());
        notice.insert_context_field("filename", file);
        notice
    }

    pub fn missing_recommended_file(file: impl Into<String>) -> Self {
        let file = file.into();
        let mut notice = ValidationNotice::new(
            NOTICE_CODE_MISSING_RECOMMENDED_FILE,
            NoticeSeverity::Warning,
            "missing recommended GTFS file",
        );
        notice.file = Some(file.clone());
        notice.insert_context_field("filename", file);
        notice
    }

    pub fn empty_file(file: impl Into<String>) -> Self {
        let file = file.into();
        let mut notice = ValidationNotice::new(
            NOTICE_CODE_EMPTY_FILE,
            NoticeSeverity::Error,
            "GTFS file is empty",
        );
        notice.file = Some(file.clone());
        notice.insert_context_field("filename", file);
        notice
    }

    pub fn unknown_file(file: impl Into<String>) -> Self {
        let file = file.into();
        let mut notice = ValidationNotice::new(
            NOTICE_CODE_UNKNOWN_FILE,
            NoticeSeverity::Info,
            "file is not part of the GTFS specification",
        );
        notice.file = Some(file.clone());
        notice.insert_context_field("filename", file);
        notice
    }

    pub fn insert_context_field<V: Serialize>(&mut self, name: impl Into<String>, value: V) {
        let key = name.into();
        let serialized = serde_json::to_value(value).unwrap_or(Value::Null);
        if !self.field_order.iter().any(|item| item == &key) {
            self.field_order.push(key.clone());
        }
        self.context.insert(key, serialized);
    }

    pub fn with_context_field<V: Serialize>(mut self, name: impl Into<String>, value: V) -> Self {
        self.insert_context_field(name, value);
        self
    }

    pub fn set_location(&mut self, file: impl Into<String>, field: impl Into<String>, row: u64) {
        self.file = Some(file.into());
        self.field = Some(field.into());
        self.row = Some(row);
    }

    pub fn with_location(
        mut self,
        file: impl Into<String>,
        field: impl Into<String>,
        row: u64,
    ) -> Self {
        self.set_location(file, field, row);
        self
    }
}

/// Collects notices with an exact per-code total and a bounded number of
/// retained samples per code. Workers fill private containers that the
/// dispatcher merges, so no locking happens on the hot path.
#[derive(Debug)]
pub struct NoticeContainer {
    notices: Vec<ValidationNotice>,
    totals: BTreeMap<String, u64>,
    retained: HashMap<String, usize>,
    max_per_code: usize,
}

impl Default for NoticeContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeContainer {
    pub fn new() -> Self {
        Self::with_max_per_code(DEFAULT_MAX_NOTICES_PER_CODE)
    }

    pub fn with_max_per_code(max_per_code: usize) -> Self {
        Self {
            notices: Vec::new(),
            totals: BTreeMap::new(),
            retained: HashMap::new(),
            max_per_code: max_per_code.max(1),
        }
    }

    pub fn push(&mut self, notice: ValidationNotice) {
        *self.totals.entry(notice.code.clone()).or_insert(0) += 1;
        let retained = self.retained.entry(notice.code.clone()).or_insert(0);
        if *retained < self.max_per_code {
            *retained += 1;
            self.notices.push(notice);
        }
    }

    pub fn push_csv_error(&mut self, error: &CsvParseError) {
        self.push(ValidationNotice::from_csv_error(error));
    }

    pub fn push_missing_file(&mut self, file: impl Into<String>) {
        self.push(ValidationNotice::missing_file(file));
    }

    pub fn push_missing_recommended_file(&mut self, file: impl Into<String>) {
        self.push(ValidationNotice::missing_recommended_file(file));
    }

    pub fn push_empty_file(&mut self, file: impl Into<String>) {
        self.push(ValidationNotice::empty_file(file));
    }

    /// Folds another container in, keeping per-code totals exact even for
    /// samples the other side already dropped at its own cap.
    pub fn merge(&mut self, other: NoticeContainer) {
        for (code, total) in &other.totals {
            let kept = other.retained.get(code).copied().unwrap_or(0) as u64;
            if *total > kept {
                *self.totals.entry(code.clone()).or_insert(0) += total - kept;
            }
        }
        for notice in other.notices {
            self.push(notice);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationNotice> {
        self.notices.iter()
    }

    /// Retained samples, not the exact total; see [`NoticeContainer::count`].
    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    /// Exact number of notices emitted with this code, cap included.
    pub fn count(&self, code: &str) -> u64 {
        self.totals.get(code).copied().unwrap_or(0)
    }

    pub fn samples<'a>(
        &'a self,
        code: &'a str,
    ) -> impl Iterator<Item = &'a ValidationNotice> + 'a {
        self.notices.iter().filter(move |notice| notice.code == code)
    }

    pub fn totals(&self) -> &BTreeMap<String, u64> {
        &self.totals
    }

    pub fn max_severity(&self) -> Option<NoticeSeverity> {
        self.notices
            .iter()
            .map(|notice| notice.severity)
            .max_by_key(|severity| severity.rank())
    }

    pub fn has_errors(&self) -> bool {
        self.notices
            .iter()
            .any(|notice| notice.severity == NoticeSeverity::Error)
    }

    pub fn severity_count(&self, severity: NoticeSeverity) -> u64 {
        // Dropped samples share the severity of the retained ones with the
        // same code, so extrapolate from totals.
        let mut count = 0;
        for (code, total) in &self.totals {
            if self
                .notices
                .iter()
                .find(|notice| notice.code == *code)
                .map(|notice| notice.severity == severity)
                .unwrap_or(false)
            {
                count += *total;
            }
        }
        count
    }

    /// Sorts the retained samples into the report order: filename, then CSV
    /// row, then code. The order is a function of the notice multiset alone,
    /// never of worker scheduling.
    pub fn sort_for_report(&mut self) {
        self.notices.sort_by(|a, b| {
            let a_key = (
                a.file.as_deref().unwrap_or(""),
                a.row.unwrap_or(0),
                a.code.as_str(),
            );
            let b_key = (
                b.file.as_deref().unwrap_or(""),
                b.row.unwrap_or(0),
                b.code.as_str(),
            );
            a_key.cmp(&b_key)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(code: &str, severity: NoticeSeverity) -> ValidationNotice {
        ValidationNotice::new(code, severity, "test")
    }

    #[test]
    fn counts_stay_exact_past_the_sample_cap() {
        let mut notices = NoticeContainer::with_max_per_code(3);
        for _ in 0..10 {
            notices.push(notice("too_chatty", NoticeSeverity::Warning));
        }

        assert_eq!(notices.count("too_chatty"), 10);
        assert_eq!(notices.samples("too_chatty").count(), 3);
    }

    #[test]
    fn merge_preserves_totals_from_capped_containers() {
        let mut left = NoticeContainer::with_max_per_code(2);
        let mut right = NoticeContainer::with_max_per_code(2);
        for _ in 0..5 {
            left.push(notice("dup", NoticeSeverity::Error));
            right.push(notice("dup", NoticeSeverity::Error));
        }

        left.merge(right);
        assert_eq!(left.count("dup"), 10);
        assert_eq!(left.samples("dup").count(), 2);
    }

    #[test]
    fn max_severity_prefers_errors() {
        let mut notices = NoticeContainer::new();
        notices.push(notice("a", NoticeSeverity::Info));
        notices.push(notice("b", NoticeSeverity::Error));
        notices.push(notice("c", NoticeSeverity::Warning));

        assert_eq!(notices.max_severity(), Some(NoticeSeverity::Error));
        assert!(notices.has_errors());
    }

    #[test]
    fn report_sort_orders_by_file_row_code() {
        let mut notices = NoticeContainer::new();
        notices.push(
            notice("zzz", NoticeSeverity::Warning).with_location("stops.txt", "stop_id", 4),
        );
        notices.push(
            notice("aaa", NoticeSeverity::Warning).with_location("stops.txt", "stop_id", 4),
        );
        notices
            .push(notice("mid", NoticeSeverity::Warning).with_location("agency.txt", "x", 9));

        notices.sort_for_report();
        let order: Vec<&str> = notices.iter().map(|n| n.code.as_str()).collect();
        assert_eq!(order, vec!["mid", "aaa", "zzz"]);
    }
}
