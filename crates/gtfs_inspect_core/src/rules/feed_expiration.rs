use chrono::Duration;

use crate::feed::FEED_INFO_FILE;
use crate::validation_context::validation_date;
use crate::{FeedValidator, GtfsFeed, NoticeContainer, NoticeSeverity, ValidationNotice};

const CODE_FEED_EXPIRATION_DATE_7_DAYS: &str = "feed_expiration_date7_days";
const CODE_FEED_EXPIRATION_DATE_30_DAYS: &str = "feed_expiration_date30_days";

/// Warns when `feed_info.feed_end_date` falls within 7 or 30 days of the
/// validation date.
#[derive(Debug, Default)]
pub struct FeedExpirationDateValidator;

impl FeedValidator for FeedExpirationDateValidator {
    fn name(&self) -> &'static str {
        "feed_expiration_date"
    }

    fn validate(&self, feed: &GtfsFeed, notices: &mut NoticeContainer) {
        let Some(feed_info) = &feed.feed_info else {
            return;
        };
        let today = validation_date();
        let in_7_days = today + Duration::days(7);
        let in_30_days = today + Duration::days(30);

        for (row_number, info) in feed_info.iter_with_rows() {
            let Some(end_date) = info.feed_end_date else {
                continue;
            };
            let end_date = end_date.as_naive_date();
            if end_date <= in_7_days {
                notices.push(expiration_notice(
                    CODE_FEED_EXPIRATION_DATE_7_DAYS,
                    "feed_end_date is within 7 days of the validation date",
                    row_number,
                ));
            } else if end_date <= in_30_days {
                notices.push(expiration_notice(
                    CODE_FEED_EXPIRATION_DATE_30_DAYS,
                    "feed_end_date is within 30 days of the validation date",
                    row_number,
                ));
            }
        }
    }
}

fn expiration_notice(code: &str, message: &str, row_number: u64) -> ValidationNotice {
    let mut notice = ValidationNotice::new(code, NoticeSeverity::Warning, message);
    notice.set_location(FEED_INFO_FILE, "feed_end_date", row_number);
    notice.insert_context_field("csvRowNumber", row_number);
    notice.insert_context_field("fieldName", "feed_end_date");
    notice.insert_context_field("filename", FEED_INFO_FILE);
    notice
}
