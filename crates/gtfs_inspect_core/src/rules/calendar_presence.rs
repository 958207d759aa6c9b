use crate::feed::{CALENDAR_DATES_FILE, CALENDAR_FILE};
use crate::{FeedValidator, GtfsFeed, NoticeContainer, NoticeSeverity, ValidationNotice};

const CODE_MISSING_CALENDAR_FILES: &str = "missing_calendar_and_calendar_date_files";

/// Service must be defined somewhere: calendar.txt, calendar_dates.txt, or
/// both.
#[derive(Debug, Default)]
pub struct CalendarPresenceValidator;

impl FeedValidator for CalendarPresenceValidator {
    fn name(&self) -> &'static str {
        "calendar_presence"
    }

    fn validate(&self, feed: &GtfsFeed, notices: &mut NoticeContainer) {
        let has_calendar = feed
            .calendar
            .as_ref()
            .map(|table| !table.is_empty())
            .unwrap_or(false);
        let has_calendar_dates = feed
            .calendar_dates
            .as_ref()
            .map(|table| !table.is_empty())
            .unwrap_or(false);
        if has_calendar || has_calendar_dates {
            return;
        }
        let mut notice = ValidationNotice::new(
            CODE_MISSING_CALENDAR_FILES,
            NoticeSeverity::Error,
            "neither calendar.txt nor calendar_dates.txt defines any service",
        );
        notice.insert_context_field(
            "filenames",
            format!("{}, {}", CALENDAR_FILE, CALENDAR_DATES_FILE),
        );
        notices.push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CsvTable;
    use gtfs_inspect_model::Calendar;

    #[test]
    fn flags_feed_without_any_calendar() {
        let mut notices = NoticeContainer::new();
        CalendarPresenceValidator.validate(&GtfsFeed::default(), &mut notices);
        assert_eq!(notices.count(CODE_MISSING_CALENDAR_FILES), 1);
    }

    #[test]
    fn calendar_rows_satisfy_the_check() {
        let mut feed = GtfsFeed::default();
        feed.calendar = Some(CsvTable {
            headers: vec!["service_id".to_string()],
            rows: vec![Calendar {
                service_id: "SVC".to_string(),
                ..Default::default()
            }],
            row_numbers: vec![2],
        });
        let mut notices = NoticeContainer::new();
        CalendarPresenceValidator.validate(&feed, &mut notices);
        assert!(notices.is_empty());
    }

    #[test]
    fn empty_calendar_table_does_not_satisfy_the_check() {
        let mut feed = GtfsFeed::default();
        feed.calendar = Some(CsvTable::default());
        let mut notices = NoticeContainer::new();
        CalendarPresenceValidator.validate(&feed, &mut notices);
        assert_eq!(notices.count(CODE_MISSING_CALENDAR_FILES), 1);
    }
}
