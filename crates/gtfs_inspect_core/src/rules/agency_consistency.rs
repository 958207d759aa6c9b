use crate::feed::AGENCY_FILE;
use crate::{CsvTable, NoticeContainer, NoticeSeverity, TableValidator, ValidationNotice};
use gtfs_inspect_model::Agency;

const CODE_MISSING_CONDITIONALLY_REQUIRED_FIELD: &str = "missing_conditionally_required_field";
const CODE_MISSING_RECOMMENDED_FIELD: &str = "missing_recommended_field";
const CODE_INCONSISTENT_AGENCY_TIMEZONE: &str = "inconsistent_agency_timezone";
const CODE_INCONSISTENT_AGENCY_LANG: &str = "inconsistent_agency_lang";

/// With multiple agencies, every row needs an `agency_id` and all rows must
/// share one timezone. A lone agency merely gets a recommendation.
#[derive(Debug, Default)]
pub struct AgencyConsistencyValidator;

impl TableValidator<Agency> for AgencyConsistencyValidator {
    fn name(&self) -> &'static str {
        "agency_consistency"
    }

    fn validate_table(&self, table: &CsvTable<Agency>, notices: &mut NoticeContainer) {
        if table.rows.is_empty() {
            return;
        }

        if table.rows.len() == 1 {
            if !has_value(table.rows[0].agency_id.as_deref()) {
                let mut notice = ValidationNotice::new(
                    CODE_MISSING_RECOMMENDED_FIELD,
                    NoticeSeverity::Warning,
                    "agency_id is recommended even with a single agency",
                );
                notice.set_location(AGENCY_FILE, "agency_id", table.row_number(0));
                notice.insert_context_field("csvRowNumber", table.row_number(0));
                notice.insert_context_field("fieldName", "agency_id");
                notice.insert_context_field("filename", AGENCY_FILE);
                notices.push(notice);
            }
            return;
        }

        for (index, agency) in table.rows.iter().enumerate() {
            if !has_value(agency.agency_id.as_deref()) {
                let mut notice = ValidationNotice::new(
                    CODE_MISSING_CONDITIONALLY_REQUIRED_FIELD,
                    NoticeSeverity::Error,
                    "agency_id is required when multiple agencies exist",
                );
                notice.set_location(AGENCY_FILE, "agency_id", table.row_number(index));
                notice.insert_context_field("csvRowNumber", table.row_number(index));
                notice.insert_context_field("fieldName", "agency_id");
                notice.insert_context_field("filename", AGENCY_FILE);
                notices.push(notice);
            }
        }

        let expected_timezone = table.rows[0].agency_timezone.trim();
        for (index, agency) in table.rows.iter().enumerate().skip(1) {
            let timezone = agency.agency_timezone.trim();
            if timezone != expected_timezone {
                let mut notice = ValidationNotice::new(
                    CODE_INCONSISTENT_AGENCY_TIMEZONE,
                    NoticeSeverity::Error,
                    "agencies have inconsistent timezones",
                );
                notice.file = Some(AGENCY_FILE.to_string());
                notice.row = Some(table.row_number(index));
                notice.insert_context_field("actual", timezone);
                notice.insert_context_field("csvRowNumber", table.row_number(index));
                notice.insert_context_field("expected", expected_timezone);
                notices.push(notice);
            }
        }

        let mut expected_lang: Option<String> = None;
        for (index, agency) in table.rows.iter().enumerate() {
            let Some(lang) = agency.agency_lang.as_deref() else {
                continue;
            };
            let lang = lang.trim().to_ascii_lowercase();
            if lang.is_empty() {
                continue;
            }
            match expected_lang.as_deref() {
                None => expected_lang = Some(lang),
                Some(expected) if expected != lang => {
                    let mut notice = ValidationNotice::new(
                        CODE_INCONSISTENT_AGENCY_LANG,
                        NoticeSeverity::Warning,
                        "agencies have inconsistent languages",
                    );
                    notice.file = Some(AGENCY_FILE.to_string());
                    notice.row = Some(table.row_number(index));
                    notice.insert_context_field("actual", lang);
                    notice.insert_context_field("csvRowNumber", table.row_number(index));
                    notice.insert_context_field("expected", expected);
                    notices.push(notice);
                }
                Some(_) => {}
            }
        }
    }
}

fn has_value(value: Option<&str>) -> bool {
    value.map(|val| !val.trim().is_empty()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agency(id: Option<&str>, timezone: &str) -> Agency {
        Agency {
            agency_id: id.map(str::to_string),
            agency_name: "Agency".to_string(),
            agency_url: "https://example.com".to_string(),
            agency_timezone: timezone.to_string(),
            ..Default::default()
        }
    }

    fn table(rows: Vec<Agency>) -> CsvTable<Agency> {
        let row_numbers = (0..rows.len()).map(|index| index as u64 + 2).collect();
        CsvTable {
            headers: vec!["agency_id".to_string(), "agency_timezone".to_string()],
            rows,
            row_numbers,
        }
    }

    #[test]
    fn single_agency_without_id_gets_a_recommendation() {
        let mut notices = NoticeContainer::new();
        AgencyConsistencyValidator
            .validate_table(&table(vec![agency(None, "UTC")]), &mut notices);
        assert_eq!(notices.count(CODE_MISSING_RECOMMENDED_FIELD), 1);
    }

    #[test]
    fn multiple_agencies_without_id_are_errors() {
        let mut notices = NoticeContainer::new();
        AgencyConsistencyValidator.validate_table(
            &table(vec![agency(None, "UTC"), agency(Some("A2"), "UTC")]),
            &mut notices,
        );
        assert_eq!(notices.count(CODE_MISSING_CONDITIONALLY_REQUIRED_FIELD), 1);
    }

    #[test]
    fn differing_timezones_are_flagged() {
        let mut notices = NoticeContainer::new();
        AgencyConsistencyValidator.validate_table(
            &table(vec![
                agency(Some("A1"), "Europe/Amsterdam"),
                agency(Some("A2"), "Europe/Berlin"),
            ]),
            &mut notices,
        );
        assert_eq!(notices.count(CODE_INCONSISTENT_AGENCY_TIMEZONE), 1);
    }

    #[test]
    fn consistent_agencies_pass() {
        let mut notices = NoticeContainer::new();
        AgencyConsistencyValidator.validate_table(
            &table(vec![agency(Some("A1"), "UTC"), agency(Some("A2"), "UTC")]),
            &mut notices,
        );
        assert!(notices.is_empty());
    }
}
