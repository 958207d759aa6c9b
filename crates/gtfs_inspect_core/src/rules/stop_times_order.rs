use std::collections::HashMap;

use crate::feed::STOP_TIMES_FILE;
use crate::{CsvTable, NoticeContainer, NoticeSeverity, TableValidator, ValidationNotice};
use gtfs_inspect_model::{GtfsTime, StopTime};

const CODE_ONLY_ARRIVAL_OR_DEPARTURE: &str = "stop_time_with_only_arrival_or_departure_time";
const CODE_ARRIVAL_BEFORE_PREVIOUS_DEPARTURE: &str =
    "stop_time_with_arrival_before_previous_departure_time";

/// Time consistency along each trip: arrival and departure come in pairs,
/// and times never run backwards in stop_sequence order.
#[derive(Debug, Default)]
pub struct StopTimeOrderValidator;

impl TableValidator<StopTime> for StopTimeOrderValidator {
    fn name(&self) -> &'static str {
        "stop_time_order"
    }

    fn validate_table(&self, table: &CsvTable<StopTime>, notices: &mut NoticeContainer) {
        let mut by_trip: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, stop_time) in table.rows.iter().enumerate() {
            let trip_id = stop_time.trip_id.trim();
            if trip_id.is_empty() {
                continue;
            }
            by_trip.entry(trip_id).or_default().push(index);
        }

        let mut trip_ids: Vec<&str> = by_trip.keys().copied().collect();
        trip_ids.sort_unstable();

        for trip_id in trip_ids {
            let mut indexes = by_trip.remove(trip_id).expect("collected above");
            indexes.sort_by_key(|&index| table.rows[index].stop_sequence);

            let mut previous_departure: Option<(GtfsTime, u64)> = None;
            for index in indexes {
                let stop_time = &table.rows[index];
                let row_number = table.row_number(index);

                let has_arrival = stop_time.arrival_time.is_some();
                let has_departure = stop_time.departure_time.is_some();
                if has_arrival != has_departure {
                    let specified_field = if has_arrival {
                        "arrival_time"
                    } else {
                        "departure_time"
                    };
                    let mut notice = ValidationNotice::new(
                        CODE_ONLY_ARRIVAL_OR_DEPARTURE,
                        NoticeSeverity::Error,
                        "arrival_time and departure_time must both be set or both empty",
                    );
                    notice.file = Some(STOP_TIMES_FILE.to_string());
                    notice.row = Some(row_number);
                    notice.insert_context_field("csvRowNumber", row_number);
                    notice.insert_context_field("specifiedField", specified_field);
                    notice.insert_context_field("stopSequence", stop_time.stop_sequence);
                    notice.insert_context_field("tripId", trip_id);
                    notices.push(notice);
                }

                if let (Some(arrival), Some((prev_departure, prev_row))) =
                    (stop_time.arrival_time, previous_departure)
                {
                    if arrival.total_seconds() < prev_departure.total_seconds() {
                        let mut notice = ValidationNotice::new(
                            CODE_ARRIVAL_BEFORE_PREVIOUS_DEPARTURE,
                            NoticeSeverity::Error,
                            "arrival_time is before the previous stop departure_time",
                        );
                        notice.file = Some(STOP_TIMES_FILE.to_string());
                        notice.row = Some(row_number);
                        notice.insert_context_field("arrivalTime", arrival);
                        notice.insert_context_field("csvRowNumber", row_number);
                        notice.insert_context_field("departureTime", prev_departure);
                        notice.insert_context_field("prevCsvRowNumber", prev_row);
                        notice.insert_context_field("tripId", trip_id);
                        notices.push(notice);
                    }
                }

                if let Some(departure) = stop_time.departure_time {
                    previous_departure = Some((departure, row_number));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop_time(trip: &str, sequence: u32, arrival: Option<&str>, departure: Option<&str>) -> StopTime {
        StopTime {
            trip_id: trip.to_string(),
            stop_id: "S1".to_string(),
            stop_sequence: sequence,
            arrival_time: arrival.map(|value| GtfsTime::parse(value).unwrap()),
            departure_time: departure.map(|value| GtfsTime::parse(value).unwrap()),
            ..Default::default()
        }
    }

    fn table(rows: Vec<StopTime>) -> CsvTable<StopTime> {
        let row_numbers = (0..rows.len()).map(|index| index as u64 + 2).collect();
        CsvTable {
            headers: vec!["trip_id".to_string(), "stop_sequence".to_string()],
            rows,
            row_numbers,
        }
    }

    #[test]
    fn flags_lone_arrival_time() {
        let mut notices = NoticeContainer::new();
        StopTimeOrderValidator.validate_table(
            &table(vec![stop_time("T1", 1, Some("08:00:00"), None)]),
            &mut notices,
        );
        assert_eq!(notices.count(CODE_ONLY_ARRIVAL_OR_DEPARTURE), 1);
    }

    #[test]
    fn flags_time_travel_between_stops() {
        let mut notices = NoticeContainer::new();
        StopTimeOrderValidator.validate_table(
            &table(vec![
                stop_time("T1", 1, Some("08:00:00"), Some("08:05:00")),
                stop_time("T1", 2, Some("07:50:00"), Some("08:10:00")),
            ]),
            &mut notices,
        );
        assert_eq!(notices.count(CODE_ARRIVAL_BEFORE_PREVIOUS_DEPARTURE), 1);
    }

    #[test]
    fn rows_out_of_file_order_are_compared_in_sequence_order() {
        let mut notices = NoticeContainer::new();
        StopTimeOrderValidator.validate_table(
            &table(vec![
                stop_time("T1", 2, Some("08:10:00"), Some("08:12:00")),
                stop_time("T1", 1, Some("08:00:00"), Some("08:05:00")),
            ]),
            &mut notices,
        );
        assert!(notices.is_empty());
    }

    #[test]
    fn service_day_overflow_times_stay_ordered() {
        let mut notices = NoticeContainer::new();
        StopTimeOrderValidator.validate_table(
            &table(vec![
                stop_time("T1", 1, Some("23:55:00"), Some("23:58:00")),
                stop_time("T1", 2, Some("24:05:00"), Some("24:06:00")),
            ]),
            &mut notices,
        );
        assert!(notices.is_empty());
    }
}
