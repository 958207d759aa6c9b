//! The loaded feed: one typed table per GTFS file, the key indexes built
//! over them, and schema-driven foreign-key resolution.

use std::collections::{HashMap, HashSet};

use gtfs_inspect_model::{
    Agency, Attribution, Calendar, CalendarDate, FareAttribute, FareRule, FeedInfo, Frequency,
    Level, Pathway, Route, Shape, Stop, StopTime, Transfer, Translation, Trip,
};

use crate::csv_schema::topological_order;
use crate::progress::ProgressHandler;
use crate::{
    CsvTable, GtfsInput, GtfsInputError, GtfsInputReader, NoticeContainer, NoticeSeverity,
    ValidationNotice,
};

pub const AGENCY_FILE: &str = "agency.txt";
pub const STOPS_FILE: &str = "stops.txt";
pub const ROUTES_FILE: &str = "routes.txt";
pub const TRIPS_FILE: &str = "trips.txt";
pub const STOP_TIMES_FILE: &str = "stop_times.txt";
pub const CALENDAR_FILE: &str = "calendar.txt";
pub const CALENDAR_DATES_FILE: &str = "calendar_dates.txt";
pub const FARE_ATTRIBUTES_FILE: &str = "fare_attributes.txt";
pub const FARE_RULES_FILE: &str = "fare_rules.txt";
pub const SHAPES_FILE: &str = "shapes.txt";
pub const FREQUENCIES_FILE: &str = "frequencies.txt";
pub const TRANSFERS_FILE: &str = "transfers.txt";
pub const PATHWAYS_FILE: &str = "pathways.txt";
pub const LEVELS_FILE: &str = "levels.txt";
pub const FEED_INFO_FILE: &str = "feed_info.txt";
pub const TRANSLATIONS_FILE: &str = "translations.txt";
pub const ATTRIBUTIONS_FILE: &str = "attributions.txt";

pub const GTFS_FILE_NAMES: &[&str] = &[
    AGENCY_FILE,
    STOPS_FILE,
    ROUTES_FILE,
    TRIPS_FILE,
    STOP_TIMES_FILE,
    CALENDAR_FILE,
    CALENDAR_DATES_FILE,
    FARE_ATTRIBUTES_FILE,
    FARE_RULES_FILE,
    SHAPES_FILE,
    FREQUENCIES_FILE,
    TRANSFERS_FILE,
    PATHWAYS_FILE,
    LEVELS_FILE,
    FEED_INFO_FILE,
    TRANSLATIONS_FILE,
    ATTRIBUTIONS_FILE,
];

#[derive(Debug, Clone, Default)]
pub struct GtfsFeed {
    pub agency: CsvTable<Agency>,
    pub stops: CsvTable<Stop>,
    pub routes: CsvTable<Route>,
    pub trips: CsvTable<Trip>,
    pub stop_times: CsvTable<StopTime>,
    pub calendar: Option<CsvTable<Calendar>>,
    pub calendar_dates: Option<CsvTable<CalendarDate>>,
    pub fare_attributes: Option<CsvTable<FareAttribute>>,
    pub fare_rules: Option<CsvTable<FareRule>>,
    pub shapes: Option<CsvTable<Shape>>,
    pub frequencies: Option<CsvTable<Frequency>>,
    pub transfers: Option<CsvTable<Transfer>>,
    pub pathways: Option<CsvTable<Pathway>>,
    pub levels: Option<CsvTable<Level>>,
    pub feed_info: Option<CsvTable<FeedInfo>>,
    pub translations: Option<CsvTable<Translation>>,
    pub attributions: Option<CsvTable<Attribution>>,
}

/// Row counts and loaded columns for the report summary.
#[derive(Debug, Clone)]
pub struct TableSummary {
    pub filename: &'static str,
    pub row_count: usize,
    pub columns: Vec<String>,
}

/// Feed-level facts read off the loaded tables.
#[derive(Debug, Clone, Default)]
pub struct FeedMetadata {
    pub feed_version: Option<String>,
    pub agency_timezone: Option<String>,
}

struct LoadedTable<T> {
    table: Result<Option<CsvTable<T>>, GtfsInputError>,
    notices: NoticeContainer,
}

fn load_table<T: serde::de::DeserializeOwned>(
    reader: &GtfsInputReader,
    file: &str,
    progress: Option<&dyn ProgressHandler>,
) -> LoadedTable<T> {
    if let Some(progress) = progress {
        progress.on_start_file_load(file);
    }
    let mut notices = NoticeContainer::new();
    let table = reader.read_optional_csv_with_notices(file, &mut notices);
    if let Some(progress) = progress {
        progress.on_finish_file_load(file);
    }
    LoadedTable { table, notices }
}

impl GtfsFeed {
    pub fn from_input(input: &GtfsInput) -> Result<Self, GtfsInputError> {
        let mut notices = NoticeContainer::new();
        Self::from_input_with_notices(input, &mut notices)
    }

    pub fn from_input_with_notices(
        input: &GtfsInput,
        notices: &mut NoticeContainer,
    ) -> Result<Self, GtfsInputError> {
        let reader = input.reader();
        Self::from_reader_with_notices(&reader, notices, None)
    }

    /// Loads every known table; independent files are read and parsed on
    /// separate workers. Missing required files load as empty tables after a
    /// `missing_required_file` notice.
    pub fn from_reader_with_notices(
        reader: &GtfsInputReader,
        notices: &mut NoticeContainer,
        progress: Option<&dyn ProgressHandler>,
    ) -> Result<Self, GtfsInputError> {
        if let Some(progress) = progress {
            progress.set_total_files(GTFS_FILE_NAMES.len());
        }

        let mut agency = None;
        let mut stops = None;
        let mut routes = None;
        let mut trips = None;
        let mut stop_times = None;
        let mut calendar = None;
        let mut calendar_dates = None;
        let mut fare_attributes = None;
        let mut fare_rules = None;
        let mut shapes = None;
        let mut frequencies = None;
        let mut transfers = None;
        let mut pathways = None;
        let mut levels = None;
        let mut feed_info = None;
        let mut translations = None;
        let mut attributions = None;

        rayon::scope(|scope| {
            scope.spawn(|_| agency = Some(load_table::<Agency>(reader, AGENCY_FILE, progress)));
            scope.spawn(|_| stops = Some(load_table::<Stop>(reader, STOPS_FILE, progress)));
            scope.spawn(|_| routes = Some(load_table::<Route>(reader, ROUTES_FILE, progress)));
            scope.spawn(|_| trips = Some(load_table::<Trip>(reader, TRIPS_FILE, progress)));
            scope.spawn(|_| {
                stop_times = Some(load_table::<StopTime>(reader, STOP_TIMES_FILE, progress))
            });
            scope.spawn(|_| {
                calendar = Some(load_table::<Calendar>(reader, CALENDAR_FILE, progress))
            });
            scope.spawn(|_| {
                calendar_dates =
                    Some(load_table::<CalendarDate>(reader, CALENDAR_DATES_FILE, progress))
            });
            scope.spawn(|_| {
                fare_attributes =
                    Some(load_table::<FareAttribute>(reader, FARE_ATTRIBUTES_FILE, progress))
            });
            scope.spawn(|_| {
                fare_rules = Some(load_table::<FareRule>(reader, FARE_RULES_FILE, progress))
            });
            scope.spawn(|_| shapes = Some(load_table::<Shape>(reader, SHAPES_FILE, progress)));
            scope.spawn(|_| {
                frequencies = Some(load_table::<Frequency>(reader, FREQUENCIES_FILE, progress))
            });
            scope.spawn(|_| {
                transfers = Some(load_table::<Transfer>(reader, TRANSFERS_FILE, progress))
            });
            scope.spawn(|_| {
                pathways = Some(load_table::<Pathway>(reader, PATHWAYS_FILE, progress))
            });
            scope.spawn(|_| levels = Some(load_table::<Level>(reader, LEVELS_FILE, progress)));
            scope.spawn(|_| {
                feed_info = Some(load_table::<FeedInfo>(reader, FEED_INFO_FILE, progress))
            });
            scope.spawn(|_| {
                translations =
                    Some(load_table::<Translation>(reader, TRANSLATIONS_FILE, progress))
            });
            scope.spawn(|_| {
                attributions =
                    Some(load_table::<Attribution>(reader, ATTRIBUTIONS_FILE, progress))
            });
        });

        fn take_required<T>(
            loaded: Option<LoadedTable<T>>,
            file: &'static str,
            notices: &mut NoticeContainer,
        ) -> Result<CsvTable<T>, GtfsInputError> {
            let loaded = loaded.expect("load task ran");
            notices.merge(loaded.notices);
            Ok(loaded.table?.unwrap_or_else(|| {
                notices.push_missing_file(file);
                CsvTable::default()
            }))
        }

        fn take_optional<T>(
            loaded: Option<LoadedTable<T>>,
            notices: &mut NoticeContainer,
        ) -> Result<Option<CsvTable<T>>, GtfsInputError> {
            let loaded = loaded.expect("load task ran");
            notices.merge(loaded.notices);
            loaded.table
        }

        // Merge in declaration order so notice collection stays independent
        // of worker scheduling.
        let agency = take_required(agency, AGENCY_FILE, notices)?;
        let stops = take_required(stops, STOPS_FILE, notices)?;
        let routes = take_required(routes, ROUTES_FILE, notices)?;
        let trips = take_required(trips, TRIPS_FILE, notices)?;
        let stop_times = take_required(stop_times, STOP_TIMES_FILE, notices)?;
        let calendar = take_optional(calendar, notices)?;
        let calendar_dates = take_optional(calendar_dates, notices)?;
        let fare_attributes = take_optional(fare_attributes, notices)?;
        let fare_rules = take_optional(fare_rules, notices)?;
        let shapes = take_optional(shapes, notices)?;
        let frequencies = take_optional(frequencies, notices)?;
        let transfers = take_optional(transfers, notices)?;
        let pathways = take_optional(pathways, notices)?;
        let levels = take_optional(levels, notices)?;
        let feed_info = take_optional(feed_info, notices)?;
        if feed_info.is_none() {
            notices.push_missing_recommended_file(FEED_INFO_FILE);
        }
        let translations = take_optional(translations, notices)?;
        let attributions = take_optional(attributions, notices)?;

        Ok(Self {
            agency,
            stops,
            routes,
            trips,
            stop_times,
            calendar,
            calendar_dates,
            fare_attributes,
            fare_rules,
            shapes,
            frequencies,
            transfers,
            pathways,
            levels,
            feed_info,
            translations,
            attributions,
        })
    }

    pub fn metadata(&self) -> FeedMetadata {
        FeedMetadata {
            feed_version: self
                .feed_info
                .as_ref()
                .and_then(|table| table.rows.first())
                .and_then(|info| info.feed_version.clone()),
            agency_timezone: self
                .agency
                .rows
                .first()
                .map(|agency| agency.agency_timezone.clone()),
        }
    }

    pub fn table_summaries(&self) -> Vec<TableSummary> {
        fn entry<T>(filename: &'static str, table: &CsvTable<T>) -> TableSummary {
            TableSummary {
                filename,
                row_count: table.rows.len(),
                columns: table.headers.clone(),
            }
        }
        fn optional_entry<T>(
            filename: &'static str,
            table: &Option<CsvTable<T>>,
        ) -> Option<TableSummary> {
            table.as_ref().map(|table| entry(filename, table))
        }

        let mut summaries = vec![
            entry(AGENCY_FILE, &self.agency),
            entry(STOPS_FILE, &self.stops),
            entry(ROUTES_FILE, &self.routes),
            entry(TRIPS_FILE, &self.trips),
            entry(STOP_TIMES_FILE, &self.stop_times),
        ];
        summaries.extend(optional_entry(CALENDAR_FILE, &self.calendar));
        summaries.extend(optional_entry(CALENDAR_DATES_FILE, &self.calendar_dates));
        summaries.extend(optional_entry(FARE_ATTRIBUTES_FILE, &self.fare_attributes));
        summaries.extend(optional_entry(FARE_RULES_FILE, &self.fare_rules));
        summaries.extend(optional_entry(SHAPES_FILE, &self.shapes));
        summaries.extend(optional_entry(FREQUENCIES_FILE, &self.frequencies));
        summaries.extend(optional_entry(TRANSFERS_FILE, &self.transfers));
        summaries.extend(optional_entry(PATHWAYS_FILE, &self.pathways));
        summaries.extend(optional_entry(LEVELS_FILE, &self.levels));
        summaries.extend(optional_entry(FEED_INFO_FILE, &self.feed_info));
        summaries.extend(optional_entry(TRANSLATIONS_FILE, &self.translations));
        summaries.extend(optional_entry(ATTRIBUTIONS_FILE, &self.attributions));
        summaries
    }
}

/// Primary-key maps and the declared secondary indexes. Building the unique
/// maps is where duplicate primary keys surface; the first occurrence wins.
#[derive(Debug, Default)]
pub struct FeedIndexes {
    pub agencies_by_id: HashMap<String, usize>,
    pub stops_by_id: HashMap<String, usize>,
    pub routes_by_id: HashMap<String, usize>,
    pub trips_by_id: HashMap<String, usize>,
    pub fare_attributes_by_id: HashMap<String, usize>,
    pub levels_by_id: HashMap<String, usize>,
    pub pathways_by_id: HashMap<String, usize>,
    pub calendar_by_service: HashMap<String, usize>,
    /// Union of calendar and calendar_dates service ids.
    pub service_ids: HashSet<String>,
    pub zone_ids: HashSet<String>,
    pub shape_ids: HashSet<String>,
    pub stop_times_by_trip: HashMap<String, Vec<usize>>,
    pub trips_by_route: HashMap<String, Vec<usize>>,
    pub frequencies_by_trip: HashMap<String, Vec<usize>>,
}

impl FeedIndexes {
    pub fn build(feed: &GtfsFeed, notices: &mut NoticeContainer) -> Self {
        let mut indexes = FeedIndexes::default();

        indexes.agencies_by_id = unique_index(
            AGENCY_FILE,
            &feed.agency,
            "agency_id",
            |row: &Agency| present(&row.agency_id),
            notices,
        );
        indexes.stops_by_id = unique_index(
            STOPS_FILE,
            &feed.stops,
            "stop_id",
            |row: &Stop| required(&row.stop_id),
            notices,
        );
        indexes.routes_by_id = unique_index(
            ROUTES_FILE,
            &feed.routes,
            "route_id",
            |row: &Route| required(&row.route_id),
            notices,
        );
        indexes.trips_by_id = unique_index(
            TRIPS_FILE,
            &feed.trips,
            "trip_id",
            |row: &Trip| required(&row.trip_id),
            notices,
        );
        if let Some(fare_attributes) = &feed.fare_attributes {
            indexes.fare_attributes_by_id = unique_index(
                FARE_ATTRIBUTES_FILE,
                fare_attributes,
                "fare_id",
                |row: &FareAttribute| required(&row.fare_id),
                notices,
            );
        }
        if let Some(levels) = &feed.levels {
            indexes.levels_by_id = unique_index(
                LEVELS_FILE,
                levels,
                "level_id",
                |row: &Level| required(&row.level_id),
                notices,
            );
        }
        if let Some(pathways) = &feed.pathways {
            indexes.pathways_by_id = unique_index(
                PATHWAYS_FILE,
                pathways,
                "pathway_id",
                |row: &Pathway| required(&row.pathway_id),
                notices,
            );
        }
        if let Some(calendar) = &feed.calendar {
            indexes.calendar_by_service = unique_index(
                CALENDAR_FILE,
                calendar,
                "service_id",
                |row: &Calendar| required(&row.service_id),
                notices,
            );
            indexes
                .service_ids
                .extend(indexes.calendar_by_service.keys().cloned());
        }
        if let Some(calendar_dates) = &feed.calendar_dates {
            check_composite_unique(
                CALENDAR_DATES_FILE,
                calendar_dates,
                ("service_id", "date"),
                |row: &CalendarDate| {
                    required(&row.service_id).map(|id| (id.to_string(), row.date.to_string()))
                },
                notices,
            );
            for row in &calendar_dates.rows {
                if let Some(id) = required(&row.service_id) {
                    indexes.service_ids.insert(id.to_string());
                }
            }
        }
        if let Some(attributions) = &feed.attributions {
            unique_index(
                ATTRIBUTIONS_FILE,
                attributions,
                "attribution_id",
                |row: &Attribution| present(&row.attribution_id),
                notices,
            );
        }

        check_composite_unique(
            STOP_TIMES_FILE,
            &feed.stop_times,
            ("trip_id", "stop_sequence"),
            |row: &StopTime| {
                required(&row.trip_id).map(|id| (id.to_string(), row.stop_sequence.to_string()))
            },
            notices,
        );
        if let Some(shapes) = &feed.shapes {
            check_composite_unique(
                SHAPES_FILE,
                shapes,
                ("shape_id", "shape_pt_sequence"),
                |row: &Shape| {
                    required(&row.shape_id)
                        .map(|id| (id.to_string(), row.shape_pt_sequence.to_string()))
                },
                notices,
            );
            for row in &shapes.rows {
                if let Some(id) = required(&row.shape_id) {
                    indexes.shape_ids.insert(id.to_string());
                }
            }
        }
        if let Some(frequencies) = &feed.frequencies {
            check_composite_unique(
                FREQUENCIES_FILE,
                frequencies,
                ("trip_id", "start_time"),
                |row: &Frequency| {
                    required(&row.trip_id)
                        .map(|id| (id.to_string(), row.start_time.to_string()))
                },
                notices,
            );
            for (index, row) in frequencies.rows.iter().enumerate() {
                if let Some(id) = required(&row.trip_id) {
                    indexes
                        .frequencies_by_trip
                        .entry(id.to_string())
                        .or_default()
                        .push(index);
                }
            }
        }

        for row in &feed.stops.rows {
            if let Some(zone) = present(&row.zone_id) {
                indexes.zone_ids.insert(zone.to_string());
            }
        }
        for (index, row) in feed.stop_times.rows.iter().enumerate() {
            if let Some(id) = required(&row.trip_id) {
                indexes
                    .stop_times_by_trip
                    .entry(id.to_string())
                    .or_default()
                    .push(index);
            }
        }
        for (index, row) in feed.trips.rows.iter().enumerate() {
            if let Some(id) = required(&row.route_id) {
                indexes
                    .trips_by_route
                    .entry(id.to_string())
                    .or_default()
                    .push(index);
            }
        }

        indexes
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn unique_index<T>(
    file: &str,
    table: &CsvTable<T>,
    field: &str,
    key: impl Fn(&T) -> Option<&str>,
    notices: &mut NoticeContainer,
) -> HashMap<String, usize> {
    let mut index: HashMap<String, usize> = HashMap::new();
    for (row_index, row) in table.rows.iter().enumerate() {
        let Some(value) = key(row) else {
            continue;
        };
        match index.get(value) {
            Some(&first_index) => notices.push(duplicate_key_notice(
                file,
                table.row_number(row_index),
                table.row_number(first_index),
                &[(field, value)],
            )),
            None => {
                index.insert(value.to_string(), row_index);
            }
        }
    }
    index
}

fn check_composite_unique<T>(
    file: &str,
    table: &CsvTable<T>,
    fields: (&str, &str),
    key: impl Fn(&T) -> Option<(String, String)>,
    notices: &mut NoticeContainer,
) {
    let mut seen: HashMap<(String, String), usize> = HashMap::new();
    for (row_index, row) in table.rows.iter().enumerate() {
        let Some(pair) = key(row) else {
            continue;
        };
        match seen.get(&pair) {
            Some(&first_index) => notices.push(duplicate_key_notice(
                file,
                table.row_number(row_index),
                table.row_number(first_index),
                &[(fields.0, &pair.0), (fields.1, &pair.1)],
            )),
            None => {
                seen.insert(pair, row_index);
            }
        }
    }
}

fn duplicate_key_notice(
    file: &str,
    row_number: u64,
    prev_row_number: u64,
    key_parts: &[(&str, &str)],
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "duplicate_key",
        NoticeSeverity::Error,
        "duplicate primary key value",
    );
    notice.file = Some(file.to_string());
    notice.row = Some(row_number);
    notice.insert_context_field("csvRowNumber", row_number);
    if let [(field, value)] = key_parts {
        notice.insert_context_field("fieldName", *field);
        notice.insert_context_field("fieldValue", *value);
    } else {
        for (position, (field, value)) in key_parts.iter().enumerate() {
            notice.insert_context_field(format!("fieldName{}", position + 1), *field);
            notice.insert_context_field(format!("fieldValue{}", position + 1), *value);
        }
    }
    notice.insert_context_field("filename", file);
    notice.insert_context_field("prevCsvRowNumber", prev_row_number);
    notice
}

/// Walks every declared foreign key in registry order and reports values
/// with no matching primary key. References stay by value; nothing is
/// rewritten into pointers.
pub fn resolve_foreign_keys(
    feed: &GtfsFeed,
    indexes: &FeedIndexes,
    notices: &mut NoticeContainer,
) {
    let Ok(order) = topological_order() else {
        // A schema cycle is a configuration error surfaced by the engine.
        return;
    };

    for schema in order {
        for (column, fk) in schema.foreign_key_columns() {
            let Some(values) = child_key_values(feed, schema.filename, column.name) else {
                continue;
            };
            for (row_number, value) in values {
                if !parent_contains(indexes, fk.table, fk.field, value) {
                    notices.push(foreign_key_violation_notice(
                        schema.filename,
                        column.name,
                        fk.table,
                        fk.field,
                        value,
                        row_number,
                    ));
                }
            }
        }
    }
}

fn child_key_values<'f>(
    feed: &'f GtfsFeed,
    file: &str,
    field: &str,
) -> Option<Vec<(u64, &'f str)>> {
    fn collect<'f, T>(
        table: &'f CsvTable<T>,
        get: impl Fn(&'f T) -> Option<&'f str>,
    ) -> Vec<(u64, &'f str)> {
        table
            .iter_with_rows()
            .filter_map(|(row_number, row)| get(row).map(|value| (row_number, value)))
            .collect()
    }
    fn collect_opt<'f, T>(
        table: &'f Option<CsvTable<T>>,
        get: impl Fn(&'f T) -> Option<&'f str>,
    ) -> Vec<(u64, &'f str)> {
        table
            .as_ref()
            .map(|table| collect(table, get))
            .unwrap_or_default()
    }

    let values = match (file, field) {
        (ROUTES_FILE, "agency_id") => collect(&feed.routes, |row| present(&row.agency_id)),
        (TRIPS_FILE, "route_id") => collect(&feed.trips, |row| required(&row.route_id)),
        (TRIPS_FILE, "shape_id") => collect(&feed.trips, |row| present(&row.shape_id)),
        (STOP_TIMES_FILE, "trip_id") => collect(&feed.stop_times, |row| required(&row.trip_id)),
        (STOP_TIMES_FILE, "stop_id") => collect(&feed.stop_times, |row| required(&row.stop_id)),
        (STOPS_FILE, "parent_station") => {
            collect(&feed.stops, |row| present(&row.parent_station))
        }
        (STOPS_FILE, "level_id") => collect(&feed.stops, |row| present(&row.level_id)),
        (FARE_ATTRIBUTES_FILE, "agency_id") => {
            collect_opt(&feed.fare_attributes, |row| present(&row.agency_id))
        }
        (FARE_RULES_FILE, "fare_id") => {
            collect_opt(&feed.fare_rules, |row| required(&row.fare_id))
        }
        (FARE_RULES_FILE, "route_id") => {
            collect_opt(&feed.fare_rules, |row| present(&row.route_id))
        }
        (FARE_RULES_FILE, "origin_id") => {
            collect_opt(&feed.fare_rules, |row| present(&row.origin_id))
        }
        (FARE_RULES_FILE, "destination_id") => {
            collect_opt(&feed.fare_rules, |row| present(&row.destination_id))
        }
        (FARE_RULES_FILE, "contains_id") => {
            collect_opt(&feed.fare_rules, |row| present(&row.contains_id))
        }
        (FREQUENCIES_FILE, "trip_id") => {
            collect_opt(&feed.frequencies, |row| required(&row.trip_id))
        }
        (TRANSFERS_FILE, "from_stop_id") => {
            collect_opt(&feed.transfers, |row| present(&row.from_stop_id))
        }
        (TRANSFERS_FILE, "to_stop_id") => {
            collect_opt(&feed.transfers, |row| present(&row.to_stop_id))
        }
        (PATHWAYS_FILE, "from_stop_id") => {
            collect_opt(&feed.pathways, |row| required(&row.from_stop_id))
        }
        (PATHWAYS_FILE, "to_stop_id") => {
            collect_opt(&feed.pathways, |row| required(&row.to_stop_id))
        }
        (ATTRIBUTIONS_FILE, "agency_id") => {
            collect_opt(&feed.attributions, |row| present(&row.agency_id))
        }
        (ATTRIBUTIONS_FILE, "route_id") => {
            collect_opt(&feed.attributions, |row| present(&row.route_id))
        }
        (ATTRIBUTIONS_FILE, "trip_id") => {
            collect_opt(&feed.attributions, |row| present(&row.trip_id))
        }
        _ => return None,
    };
    Some(values)
}

fn parent_contains(indexes: &FeedIndexes, table: &str, field: &str, value: &str) -> bool {
    match (table, field) {
        (AGENCY_FILE, "agency_id") => indexes.agencies_by_id.contains_key(value),
        (STOPS_FILE, "stop_id") => indexes.stops_by_id.contains_key(value),
        (STOPS_FILE, "zone_id") => indexes.zone_ids.contains(value),
        (ROUTES_FILE, "route_id") => indexes.routes_by_id.contains_key(value),
        (TRIPS_FILE, "trip_id") => indexes.trips_by_id.contains_key(value),
        (SHAPES_FILE, "shape_id") => indexes.shape_ids.contains(value),
        (FARE_ATTRIBUTES_FILE, "fare_id") => indexes.fare_attributes_by_id.contains_key(value),
        (LEVELS_FILE, "level_id") => indexes.levels_by_id.contains_key(value),
        // Every `.references(..)` target declared in the schema must have an
        // arm above; a new edge without one must not pass silently.
        _ => unreachable!("undeclared foreign-key target {}.{}", table, field),
    }
}

fn foreign_key_violation_notice(
    child_file: &str,
    child_field: &str,
    parent_file: &str,
    parent_field: &str,
    value: &str,
    row_number: u64,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "foreign_key_violation",
        NoticeSeverity::Error,
        format!("referenced id {} does not exist", value),
    );
    notice.file = Some(child_file.to_string());
    notice.row = Some(row_number);
    notice.insert_context_field("childFieldName", child_field);
    notice.insert_context_field("childFilename", child_file);
    notice.insert_context_field("csvRowNumber", row_number);
    notice.insert_context_field("fieldValue", value);
    notice.insert_context_field("parentFieldName", parent_field);
    notice.insert_context_field("parentFilename", parent_file);
    notice
}
