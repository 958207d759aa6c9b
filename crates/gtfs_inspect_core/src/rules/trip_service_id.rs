use std::collections::HashSet;

use crate::feed::{CALENDAR_DATES_FILE, CALENDAR_FILE, TRIPS_FILE};
use crate::{FeedValidator, GtfsFeed, NoticeContainer, NoticeSeverity, ValidationNotice};

const CODE_FOREIGN_KEY_VIOLATION: &str = "foreign_key_violation";

/// `trips.service_id` must exist in calendar.txt or calendar_dates.txt; the
/// target is the union of both tables, so this stays outside the declarative
/// foreign-key edges.
#[derive(Debug, Default)]
pub struct TripServiceIdValidator;

impl FeedValidator for TripServiceIdValidator {
    fn name(&self) -> &'static str {
        "trip_service_id"
    }

    fn validate(&self, feed: &GtfsFeed, notices: &mut NoticeContainer) {
        let mut service_ids: HashSet<&str> = HashSet::new();
        if let Some(calendar) = &feed.calendar {
            for row in &calendar.rows {
                let id = row.service_id.trim();
                if !id.is_empty() {
                    service_ids.insert(id);
                }
            }
        }
        if let Some(calendar_dates) = &feed.calendar_dates {
            for row in &calendar_dates.rows {
                let id = row.service_id.trim();
                if !id.is_empty() {
                    service_ids.insert(id);
                }
            }
        }
        if service_ids.is_empty() {
            // No calendar data at all; calendar_presence reports that.
            return;
        }

        for (row_number, trip) in feed.trips.iter_with_rows() {
            let service_id = trip.service_id.trim();
            if service_id.is_empty() || service_ids.contains(service_id) {
                continue;
            }
            let mut notice = ValidationNotice::new(
                CODE_FOREIGN_KEY_VIOLATION,
                NoticeSeverity::Error,
                format!("service_id {} is not defined", service_id),
            );
            notice.file = Some(TRIPS_FILE.to_string());
            notice.row = Some(row_number);
            notice.insert_context_field("childFieldName", "service_id");
            notice.insert_context_field("childFilename", TRIPS_FILE);
            notice.insert_context_field("csvRowNumber", row_number);
            notice.insert_context_field("fieldValue", service_id);
            notice.insert_context_field("parentFieldName", "service_id");
            notice.insert_context_field(
                "parentFilename",
                format!("{}, {}", CALENDAR_FILE, CALENDAR_DATES_FILE),
            );
            notices.push(notice);
        }
    }
}
