use crate::feed::FREQUENCIES_FILE;
use crate::{EntityValidator, NoticeContainer, NoticeSeverity, ValidationNotice};
use gtfs_inspect_model::Frequency;

const CODE_START_AND_END_RANGE_OUT_OF_ORDER: &str = "start_and_end_range_out_of_order";

/// A frequency window must end strictly after it starts.
#[derive(Debug, Default)]
pub struct FrequencyTimeRangeValidator;

impl EntityValidator<Frequency> for FrequencyTimeRangeValidator {
    fn name(&self) -> &'static str {
        "frequency_time_range"
    }

    fn validate_row(&self, frequency: &Frequency, row_number: u64, notices: &mut NoticeContainer) {
        if frequency.end_time.total_seconds() > frequency.start_time.total_seconds() {
            return;
        }
        let mut notice = ValidationNotice::new(
            CODE_START_AND_END_RANGE_OUT_OF_ORDER,
            NoticeSeverity::Error,
            "end_time must be later than start_time",
        );
        notice.file = Some(FREQUENCIES_FILE.to_string());
        notice.row = Some(row_number);
        notice.insert_context_field("csvRowNumber", row_number);
        notice.insert_context_field("endTime", frequency.end_time);
        notice.insert_context_field("filename", FREQUENCIES_FILE);
        notice.insert_context_field("startTime", frequency.start_time);
        notice.insert_context_field("tripId", frequency.trip_id.as_str());
        notices.push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtfs_inspect_model::GtfsTime;

    fn frequency(start: &str, end: &str) -> Frequency {
        Frequency {
            trip_id: "T1".to_string(),
            start_time: GtfsTime::parse(start).unwrap(),
            end_time: GtfsTime::parse(end).unwrap(),
            headway_secs: 600,
            ..Default::default()
        }
    }

    #[test]
    fn flags_window_ending_before_start() {
        let mut notices = NoticeContainer::new();
        FrequencyTimeRangeValidator.validate_row(&frequency("10:00:00", "09:00:00"), 2, &mut notices);
        assert_eq!(notices.count(CODE_START_AND_END_RANGE_OUT_OF_ORDER), 1);
    }

    #[test]
    fn flags_zero_length_window() {
        let mut notices = NoticeContainer::new();
        FrequencyTimeRangeValidator.validate_row(&frequency("10:00:00", "10:00:00"), 2, &mut notices);
        assert_eq!(notices.count(CODE_START_AND_END_RANGE_OUT_OF_ORDER), 1);
    }

    #[test]
    fn ordered_window_passes() {
        let mut notices = NoticeContainer::new();
        FrequencyTimeRangeValidator.validate_row(&frequency("07:00:00", "26:00:00"), 2, &mut notices);
        assert!(notices.is_empty());
    }
}
