use std::collections::{HashMap, HashSet};

use crate::feed::{ROUTES_FILE, STOPS_FILE};
use crate::{FeedValidator, GtfsFeed, NoticeContainer, NoticeSeverity, ValidationNotice};

const CODE_UNUSED_STOP: &str = "unused_stop";
const CODE_UNUSED_ROUTE: &str = "unused_route";

/// Stops that no trip, pathway, or transfer touches, and routes with no
/// trips. Parent stations of used stops count as used.
#[derive(Debug, Default)]
pub struct UnusedEntityValidator;

impl FeedValidator for UnusedEntityValidator {
    fn name(&self) -> &'static str {
        "unused_entities"
    }

    fn validate(&self, feed: &GtfsFeed, notices: &mut NoticeContainer) {
        let mut used_stops: HashSet<&str> = HashSet::new();
        for stop_time in &feed.stop_times.rows {
            let stop_id = stop_time.stop_id.trim();
            if !stop_id.is_empty() {
                used_stops.insert(stop_id);
            }
        }
        if let Some(pathways) = &feed.pathways {
            for pathway in &pathways.rows {
                for stop_id in [pathway.from_stop_id.trim(), pathway.to_stop_id.trim()] {
                    if !stop_id.is_empty() {
                        used_stops.insert(stop_id);
                    }
                }
            }
        }
        if let Some(transfers) = &feed.transfers {
            for transfer in &transfers.rows {
                for stop_id in [
                    transfer.from_stop_id.as_deref().unwrap_or("").trim(),
                    transfer.to_stop_id.as_deref().unwrap_or("").trim(),
                ] {
                    if !stop_id.is_empty() {
                        used_stops.insert(stop_id);
                    }
                }
            }
        }

        // Walk up the station hierarchy from every used stop.
        let stops_by_id: HashMap<&str, &gtfs_inspect_model::Stop> = feed
            .stops
            .rows
            .iter()
            .map(|stop| (stop.stop_id.trim(), stop))
            .collect();
        let mut queue: Vec<&str> = used_stops.iter().copied().collect();
        while let Some(stop_id) = queue.pop() {
            let Some(stop) = stops_by_id.get(stop_id) else {
                continue;
            };
            if let Some(parent) = stop.parent_station.as_deref() {
                let parent = parent.trim();
                if !parent.is_empty() && used_stops.insert(parent) {
                    queue.push(parent);
                }
            }
        }

        for (row_number, stop) in feed.stops.iter_with_rows() {
            let stop_id = stop.stop_id.trim();
            if stop_id.is_empty() || used_stops.contains(stop_id) {
                continue;
            }
            let mut notice = ValidationNotice::new(
                CODE_UNUSED_STOP,
                NoticeSeverity::Warning,
                "stop is not referenced anywhere",
            );
            notice.file = Some(STOPS_FILE.to_string());
            notice.row = Some(row_number);
            notice.insert_context_field("csvRowNumber", row_number);
            notice.insert_context_field("stopId", stop_id);
            notice.insert_context_field("stopName", stop.stop_name.as_deref().unwrap_or(""));
            notices.push(notice);
        }

        let mut used_routes: HashSet<&str> = HashSet::new();
        for trip in &feed.trips.rows {
            let route_id = trip.route_id.trim();
            if !route_id.is_empty() {
                used_routes.insert(route_id);
            }
        }
        for (row_number, route) in feed.routes.iter_with_rows() {
            let route_id = route.route_id.trim();
            if route_id.is_empty() || used_routes.contains(route_id) {
                continue;
            }
            let mut notice = ValidationNotice::new(
                CODE_UNUSED_ROUTE,
                NoticeSeverity::Warning,
                "route has no trips",
            );
            notice.file = Some(ROUTES_FILE.to_string());
            notice.row = Some(row_number);
            notice.insert_context_field("csvRowNumber", row_number);
            notice.insert_context_field("routeId", route_id);
            notices.push(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CsvTable;
    use gtfs_inspect_model::{Route, Stop, StopTime, Trip};

    #[test]
    fn flags_unreferenced_stop_and_route() {
        let mut feed = GtfsFeed::default();
        feed.stops = CsvTable {
            headers: vec!["stop_id".to_string()],
            rows: vec![
                Stop {
                    stop_id: "USED".to_string(),
                    ..Default::default()
                },
                Stop {
                    stop_id: "ORPHAN".to_string(),
                    ..Default::default()
                },
            ],
            row_numbers: vec![2, 3],
        };
        feed.routes = CsvTable {
            headers: vec!["route_id".to_string()],
            rows: vec![
                Route {
                    route_id: "R1".to_string(),
                    ..Default::default()
                },
                Route {
                    route_id: "R2".to_string(),
                    ..Default::default()
                },
            ],
            row_numbers: vec![2, 3],
        };
        feed.trips = CsvTable {
            headers: vec!["trip_id".to_string()],
            rows: vec![Trip {
                trip_id: "T1".to_string(),
                route_id: "R1".to_string(),
                ..Default::default()
            }],
            row_numbers: vec![2],
        };
        feed.stop_times = CsvTable {
            headers: vec!["trip_id".to_string()],
            rows: vec![StopTime {
                trip_id: "T1".to_string(),
                stop_id: "USED".to_string(),
                stop_sequence: 1,
                ..Default::default()
            }],
            row_numbers: vec![2],
        };

        let mut notices = NoticeContainer::new();
        UnusedEntityValidator.validate(&feed, &mut notices);

        assert_eq!(notices.count(CODE_UNUSED_STOP), 1);
        assert_eq!(notices.count(CODE_UNUSED_ROUTE), 1);
    }

    #[test]
    fn parent_station_of_used_stop_counts_as_used() {
        let mut feed = GtfsFeed::default();
        feed.stops = CsvTable {
            headers: vec!["stop_id".to_string(), "parent_station".to_string()],
            rows: vec![
                Stop {
                    stop_id: "STATION".to_string(),
                    ..Default::default()
                },
                Stop {
                    stop_id: "PLATFORM".to_string(),
                    parent_station: Some("STATION".to_string()),
                    ..Default::default()
                },
            ],
            row_numbers: vec![2, 3],
        };
        feed.stop_times = CsvTable {
            headers: vec!["trip_id".to_string()],
            rows: vec![StopTime {
                trip_id: "T1".to_string(),
                stop_id: "PLATFORM".to_string(),
                stop_sequence: 1,
                ..Default::default()
            }],
            row_numbers: vec![2],
        };

        let mut notices = NoticeContainer::new();
        UnusedEntityValidator.validate(&feed, &mut notices);

        assert_eq!(notices.count(CODE_UNUSED_STOP), 0);
    }
}
