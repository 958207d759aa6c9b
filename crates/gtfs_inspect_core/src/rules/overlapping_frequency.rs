use std::collections::HashMap;

use crate::feed::FREQUENCIES_FILE;
use crate::{CsvTable, NoticeContainer, NoticeSeverity, TableValidator, ValidationNotice};
use gtfs_inspect_model::Frequency;

const CODE_OVERLAPPING_FREQUENCY: &str = "overlapping_frequency";

/// Frequency windows for one trip must not overlap.
#[derive(Debug, Default)]
pub struct OverlappingFrequencyValidator;

impl TableValidator<Frequency> for OverlappingFrequencyValidator {
    fn name(&self) -> &'static str {
        "overlapping_frequency"
    }

    fn validate_table(&self, table: &CsvTable<Frequency>, notices: &mut NoticeContainer) {
        let mut by_trip: HashMap<&str, Vec<(u64, &Frequency)>> = HashMap::new();
        for (index, frequency) in table.rows.iter().enumerate() {
            let trip_id = frequency.trip_id.trim();
            if trip_id.is_empty() {
                continue;
            }
            by_trip
                .entry(trip_id)
                .or_default()
                .push((table.row_number(index), frequency));
        }

        let mut trip_ids: Vec<&str> = by_trip.keys().copied().collect();
        trip_ids.sort_unstable();

        for trip_id in trip_ids {
            let windows = by_trip.get_mut(trip_id).expect("collected above");
            windows.sort_by(|(_, a), (_, b)| {
                a.start_time
                    .cmp(&b.start_time)
                    .then(a.end_time.cmp(&b.end_time))
                    .then(a.headway_secs.cmp(&b.headway_secs))
            });

            for pair in windows.windows(2) {
                let (prev_row, prev) = pair[0];
                let (curr_row, curr) = pair[1];
                if curr.start_time.total_seconds() < prev.end_time.total_seconds() {
                    let mut notice = ValidationNotice::new(
                        CODE_OVERLAPPING_FREQUENCY,
                        NoticeSeverity::Error,
                        "frequency windows overlap for a trip",
                    );
                    notice.file = Some(FREQUENCIES_FILE.to_string());
                    notice.row = Some(curr_row);
                    notice.insert_context_field("currCsvRowNumber", curr_row);
                    notice.insert_context_field("currStartTime", curr.start_time);
                    notice.insert_context_field("prevCsvRowNumber", prev_row);
                    notice.insert_context_field("prevEndTime", prev.end_time);
                    notice.insert_context_field("tripId", trip_id);
                    notices.push(notice);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtfs_inspect_model::GtfsTime;

    fn frequency(trip: &str, start: &str, end: &str) -> Frequency {
        Frequency {
            trip_id: trip.to_string(),
            start_time: GtfsTime::parse(start).unwrap(),
            end_time: GtfsTime::parse(end).unwrap(),
            headway_secs: 300,
            ..Default::default()
        }
    }

    fn table(rows: Vec<Frequency>) -> CsvTable<Frequency> {
        let row_numbers = (0..rows.len()).map(|index| index as u64 + 2).collect();
        CsvTable {
            headers: vec!["trip_id".to_string()],
            rows,
            row_numbers,
        }
    }

    #[test]
    fn flags_overlapping_windows_on_one_trip() {
        let mut notices = NoticeContainer::new();
        OverlappingFrequencyValidator.validate_table(
            &table(vec![
                frequency("T1", "06:00:00", "10:00:00"),
                frequency("T1", "09:30:00", "12:00:00"),
            ]),
            &mut notices,
        );
        assert_eq!(notices.count(CODE_OVERLAPPING_FREQUENCY), 1);
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        let mut notices = NoticeContainer::new();
        OverlappingFrequencyValidator.validate_table(
            &table(vec![
                frequency("T1", "06:00:00", "10:00:00"),
                frequency("T1", "10:00:00", "12:00:00"),
            ]),
            &mut notices,
        );
        assert!(notices.is_empty());
    }

    #[test]
    fn windows_on_different_trips_are_independent() {
        let mut notices = NoticeContainer::new();
        OverlappingFrequencyValidator.validate_table(
            &table(vec![
                frequency("T1", "06:00:00", "10:00:00"),
                frequency("T2", "06:00:00", "10:00:00"),
            ]),
            &mut notices,
        );
        assert!(notices.is_empty());
    }
}
