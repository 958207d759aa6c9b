use crate::feed::STOPS_FILE;
use crate::{EntityValidator, NoticeContainer, NoticeSeverity, ValidationNotice};
use gtfs_inspect_model::{LocationType, Stop};

const CODE_MISSING_CONDITIONALLY_REQUIRED_FIELD: &str = "missing_conditionally_required_field";
const CODE_STATION_WITH_PARENT_STATION: &str = "station_with_parent_station";

/// Presence rules that depend on `location_type`: stops, stations, and
/// entrances need a name and coordinates, entrances and below need a parent,
/// and stations must not have one.
#[derive(Debug, Default)]
pub struct StopLocationValidator;

impl EntityValidator<Stop> for StopLocationValidator {
    fn name(&self) -> &'static str {
        "stop_location"
    }

    fn validate_row(&self, stop: &Stop, row_number: u64, notices: &mut NoticeContainer) {
        let location_type = stop.location_type_or_default();
        let needs_name_and_position = matches!(
            location_type,
            LocationType::StopOrPlatform | LocationType::Station | LocationType::EntranceOrExit
        );
        let needs_parent = matches!(
            location_type,
            LocationType::EntranceOrExit | LocationType::GenericNode | LocationType::BoardingArea
        );

        if needs_name_and_position {
            if !has_value(stop.stop_name.as_deref()) {
                notices.push(conditionally_required_notice(stop, row_number, "stop_name"));
            }
            if stop.stop_lat.is_none() {
                notices.push(conditionally_required_notice(stop, row_number, "stop_lat"));
            }
            if stop.stop_lon.is_none() {
                notices.push(conditionally_required_notice(stop, row_number, "stop_lon"));
            }
        }

        let has_parent = has_value(stop.parent_station.as_deref());
        if needs_parent && !has_parent {
            notices.push(conditionally_required_notice(
                stop,
                row_number,
                "parent_station",
            ));
        }
        if location_type == LocationType::Station && has_parent {
            let mut notice = ValidationNotice::new(
                CODE_STATION_WITH_PARENT_STATION,
                NoticeSeverity::Error,
                "a station must not have a parent_station",
            );
            notice.file = Some(STOPS_FILE.to_string());
            notice.row = Some(row_number);
            notice.insert_context_field("csvRowNumber", row_number);
            notice.insert_context_field(
                "parentStation",
                stop.parent_station.as_deref().unwrap_or(""),
            );
            notice.insert_context_field("stopId", stop.stop_id.as_str());
            notices.push(notice);
        }
    }
}

fn has_value(value: Option<&str>) -> bool {
    value.map(|val| !val.trim().is_empty()).unwrap_or(false)
}

fn conditionally_required_notice(
    stop: &Stop,
    row_number: u64,
    field_name: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        CODE_MISSING_CONDITIONALLY_REQUIRED_FIELD,
        NoticeSeverity::Error,
        "field is required for this location_type",
    );
    notice.set_location(STOPS_FILE, field_name, row_number);
    notice.insert_context_field("csvRowNumber", row_number);
    notice.insert_context_field("fieldName", field_name);
    notice.insert_context_field("filename", STOPS_FILE);
    notice.insert_context_field("stopId", stop.stop_id.as_str());
    notice
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(stop: &Stop) -> NoticeContainer {
        let mut notices = NoticeContainer::new();
        StopLocationValidator.validate_row(stop, 3, &mut notices);
        notices
    }

    #[test]
    fn flags_platform_without_name_or_position() {
        let stop = Stop {
            stop_id: "S1".to_string(),
            ..Default::default()
        };
        let notices = run(&stop);
        assert_eq!(notices.count(CODE_MISSING_CONDITIONALLY_REQUIRED_FIELD), 3);
    }

    #[test]
    fn generic_node_needs_no_name_but_needs_parent() {
        let stop = Stop {
            stop_id: "N1".to_string(),
            location_type: Some(LocationType::GenericNode),
            ..Default::default()
        };
        let notices = run(&stop);
        assert_eq!(notices.count(CODE_MISSING_CONDITIONALLY_REQUIRED_FIELD), 1);
        let notice = notices.iter().next().unwrap();
        assert_eq!(notice.field.as_deref(), Some("parent_station"));
    }

    #[test]
    fn station_with_parent_is_flagged() {
        let stop = Stop {
            stop_id: "STATION".to_string(),
            stop_name: Some("Central".to_string()),
            stop_lat: Some(52.1),
            stop_lon: Some(4.3),
            location_type: Some(LocationType::Station),
            parent_station: Some("OTHER".to_string()),
            ..Default::default()
        };
        let notices = run(&stop);
        assert_eq!(notices.count(CODE_STATION_WITH_PARENT_STATION), 1);
    }

    #[test]
    fn complete_platform_passes() {
        let stop = Stop {
            stop_id: "S1".to_string(),
            stop_name: Some("Main St".to_string()),
            stop_lat: Some(48.2),
            stop_lon: Some(16.4),
            ..Default::default()
        };
        assert!(run(&stop).is_empty());
    }
}
