//! Declarative per-table schemas.
//!
//! One static [`FileSchema`] per GTFS file describes every column: its value
//! type, requiredness, value constraints, key role, and foreign-key target.
//! The cell validation pass, the typed loader, the index builder, and the
//! foreign-key resolver are all driven from this table instead of carrying
//! their own field lists.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::feed::{
    AGENCY_FILE, ATTRIBUTIONS_FILE, CALENDAR_DATES_FILE, CALENDAR_FILE, FARE_ATTRIBUTES_FILE,
    FARE_RULES_FILE, FEED_INFO_FILE, FREQUENCIES_FILE, LEVELS_FILE, PATHWAYS_FILE, ROUTES_FILE,
    SHAPES_FILE, STOPS_FILE, STOP_TIMES_FILE, TRANSFERS_FILE, TRANSLATIONS_FILE, TRIPS_FILE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Id,
    Text,
    Url,
    Email,
    Phone,
    LanguageCode,
    Timezone,
    Color,
    Date,
    Time,
    Latitude,
    Longitude,
    CurrencyCode,
    CurrencyAmount,
    Integer,
    Float,
    Enum(EnumSet),
}

/// The closed integer-valued sets a column may draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSet {
    LocationType,
    WheelchairBoarding,
    RouteType,
    ContinuousPickupDropOff,
    PickupDropOffType,
    DirectionId,
    WheelchairAccessible,
    BikesAllowed,
    ServiceAvailability,
    ExceptionType,
    PaymentMethod,
    FareTransfers,
    ExactTimes,
    TransferType,
    PathwayMode,
    Bidirectional,
    YesNo,
    Timepoint,
}

impl EnumSet {
    pub fn allows(self, value: i64) -> bool {
        match self {
            EnumSet::LocationType => matches!(value, 0..=4),
            EnumSet::WheelchairBoarding => matches!(value, 0..=2),
            EnumSet::RouteType => matches!(value, 0..=7 | 11 | 12 | 100..=1702),
            EnumSet::ContinuousPickupDropOff => matches!(value, 0..=3),
            EnumSet::PickupDropOffType => matches!(value, 0..=3),
            EnumSet::DirectionId => matches!(value, 0 | 1),
            EnumSet::WheelchairAccessible => matches!(value, 0..=2),
            EnumSet::BikesAllowed => matches!(value, 0..=2),
            EnumSet::ServiceAvailability => matches!(value, 0 | 1),
            EnumSet::ExceptionType => matches!(value, 1 | 2),
            EnumSet::PaymentMethod => matches!(value, 0 | 1),
            EnumSet::FareTransfers => matches!(value, 0..=2),
            EnumSet::ExactTimes => matches!(value, 0 | 1),
            EnumSet::TransferType => matches!(value, 0..=5),
            EnumSet::PathwayMode => matches!(value, 1..=7),
            EnumSet::Bidirectional => matches!(value, 0 | 1),
            EnumSet::YesNo => matches!(value, 0 | 1),
            EnumSet::Timepoint => matches!(value, 0 | 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requiredness {
    Required,
    /// Presence depends on a predicate over the row or the feed; checked by
    /// validators, not by the cell pass.
    ConditionallyRequired,
    Recommended,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    NonNegative,
    Positive,
    NonZero,
    MixedCase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    None,
    /// Part of the table's primary key (possibly composite).
    Primary,
    /// Gets a non-unique secondary index.
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub table: &'static str,
    pub field: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSchema {
    pub name: &'static str,
    pub field_type: FieldType,
    pub requiredness: Requiredness,
    pub constraints: &'static [Constraint],
    pub key_role: KeyRole,
    pub foreign_key: Option<ForeignKeyRef>,
}

impl ColumnSchema {
    const fn new(name: &'static str, field_type: FieldType, requiredness: Requiredness) -> Self {
        Self {
            name,
            field_type,
            requiredness,
            constraints: &[],
            key_role: KeyRole::None,
            foreign_key: None,
        }
    }

    const fn primary(mut self) -> Self {
        self.key_role = KeyRole::Primary;
        self
    }

    const fn indexed(mut self) -> Self {
        self.key_role = KeyRole::Index;
        self
    }

    const fn check(mut self, constraints: &'static [Constraint]) -> Self {
        self.constraints = constraints;
        self
    }

    const fn references(mut self, table: &'static str, field: &'static str) -> Self {
        self.foreign_key = Some(ForeignKeyRef { table, field });
        self
    }

    pub fn has_constraint(&self, constraint: Constraint) -> bool {
        self.constraints.iter().any(|c| *c == constraint)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FileSchema {
    pub filename: &'static str,
    pub required_file: bool,
    pub recommended_file: bool,
    pub columns: &'static [ColumnSchema],
}

impl FileSchema {
    const fn required(filename: &'static str, columns: &'static [ColumnSchema]) -> Self {
        Self {
            filename,
            required_file: true,
            recommended_file: false,
            columns,
        }
    }

    const fn optional(filename: &'static str, columns: &'static [ColumnSchema]) -> Self {
        Self {
            filename,
            required_file: false,
            recommended_file: false,
            columns,
        }
    }

    const fn recommended(filename: &'static str, columns: &'static [ColumnSchema]) -> Self {
        Self {
            filename,
            required_file: false,
            recommended_file: true,
            columns,
        }
    }

    /// Case-sensitive: `Stop_Id` is not `stop_id`.
    pub fn column(&self, name: &str) -> Option<&'static ColumnSchema> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn required_columns(&self) -> impl Iterator<Item = &'static ColumnSchema> {
        self.columns
            .iter()
            .filter(|column| column.requiredness == Requiredness::Required)
    }

    pub fn recommended_columns(&self) -> impl Iterator<Item = &'static ColumnSchema> {
        self.columns
            .iter()
            .filter(|column| column.requiredness == Requiredness::Recommended)
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &'static ColumnSchema> {
        self.columns
            .iter()
            .filter(|column| column.key_role == KeyRole::Primary)
    }

    pub fn foreign_key_columns(
        &self,
    ) -> impl Iterator<Item = (&'static ColumnSchema, ForeignKeyRef)> {
        self.columns
            .iter()
            .filter_map(|column| column.foreign_key.map(|fk| (column, fk)))
    }
}

use Constraint::{MixedCase, NonNegative, NonZero, Positive};
use FieldType::*;
use Requiredness::{ConditionallyRequired, Optional, Recommended, Required};

const AGENCY_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("agency_id", Id, ConditionallyRequired).primary(),
    ColumnSchema::new("agency_name", Text, Required).check(&[MixedCase]),
    ColumnSchema::new("agency_url", Url, Required),
    ColumnSchema::new("agency_timezone", Timezone, Required),
    ColumnSchema::new("agency_lang", LanguageCode, Optional),
    ColumnSchema::new("agency_phone", Phone, Optional),
    ColumnSchema::new("agency_fare_url", Url, Optional),
    ColumnSchema::new("agency_email", Email, Optional),
];

const STOPS_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("stop_id", Id, Required).primary(),
    ColumnSchema::new("stop_code", Text, Optional),
    ColumnSchema::new("stop_name", Text, ConditionallyRequired).check(&[MixedCase]),
    ColumnSchema::new("tts_stop_name", Text, Optional),
    ColumnSchema::new("stop_desc", Text, Optional),
    ColumnSchema::new("stop_lat", Latitude, ConditionallyRequired),
    ColumnSchema::new("stop_lon", Longitude, ConditionallyRequired),
    ColumnSchema::new("zone_id", Id, ConditionallyRequired),
    ColumnSchema::new("stop_url", Url, Optional),
    ColumnSchema::new("location_type", Enum(EnumSet::LocationType), Optional),
    ColumnSchema::new("parent_station", Id, ConditionallyRequired)
        .references(STOPS_FILE, "stop_id"),
    ColumnSchema::new("stop_timezone", Timezone, Optional),
    ColumnSchema::new(
        "wheelchair_boarding",
        Enum(EnumSet::WheelchairBoarding),
        Optional,
    ),
    ColumnSchema::new("level_id", Id, Optional).references(LEVELS_FILE, "level_id"),
    ColumnSchema::new("platform_code", Text, Optional),
];

const ROUTES_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("route_id", Id, Required).primary(),
    ColumnSchema::new("agency_id", Id, ConditionallyRequired).references(AGENCY_FILE, "agency_id"),
    ColumnSchema::new("route_short_name", Text, ConditionallyRequired).check(&[MixedCase]),
    ColumnSchema::new("route_long_name", Text, ConditionallyRequired).check(&[MixedCase]),
    ColumnSchema::new("route_desc", Text, Optional),
    ColumnSchema::new("route_type", Enum(EnumSet::RouteType), Required),
    ColumnSchema::new("route_url", Url, Optional),
    ColumnSchema::new("route_color", Color, Optional),
    ColumnSchema::new("route_text_color", Color, Optional),
    ColumnSchema::new("route_sort_order", Integer, Optional).check(&[NonNegative]),
    ColumnSchema::new(
        "continuous_pickup",
        Enum(EnumSet::ContinuousPickupDropOff),
        Optional,
    ),
    ColumnSchema::new(
        "continuous_drop_off",
        Enum(EnumSet::ContinuousPickupDropOff),
        Optional,
    ),
];

const TRIPS_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("route_id", Id, Required)
        .indexed()
        .references(ROUTES_FILE, "route_id"),
    ColumnSchema::new("service_id", Id, Required).indexed(),
    ColumnSchema::new("trip_id", Id, Required).primary(),
    ColumnSchema::new("trip_headsign", Text, Optional).check(&[MixedCase]),
    ColumnSchema::new("trip_short_name", Text, Optional).check(&[MixedCase]),
    ColumnSchema::new("direction_id", Enum(EnumSet::DirectionId), Optional),
    ColumnSchema::new("block_id", Id, Optional),
    ColumnSchema::new("shape_id", Id, ConditionallyRequired).references(SHAPES_FILE, "shape_id"),
    ColumnSchema::new(
        "wheelchair_accessible",
        Enum(EnumSet::WheelchairAccessible),
        Optional,
    ),
    ColumnSchema::new("bikes_allowed", Enum(EnumSet::BikesAllowed), Optional),
];

const STOP_TIMES_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("trip_id", Id, Required)
        .primary()
        .references(TRIPS_FILE, "trip_id"),
    ColumnSchema::new("arrival_time", Time, ConditionallyRequired),
    ColumnSchema::new("departure_time", Time, ConditionallyRequired),
    ColumnSchema::new("stop_id", Id, Required)
        .indexed()
        .references(STOPS_FILE, "stop_id"),
    ColumnSchema::new("stop_sequence", Integer, Required)
        .primary()
        .check(&[NonNegative]),
    ColumnSchema::new("stop_headsign", Text, Optional).check(&[MixedCase]),
    ColumnSchema::new("pickup_type", Enum(EnumSet::PickupDropOffType), Optional),
    ColumnSchema::new("drop_off_type", Enum(EnumSet::PickupDropOffType), Optional),
    ColumnSchema::new(
        "continuous_pickup",
        Enum(EnumSet::ContinuousPickupDropOff),
        Optional,
    ),
    ColumnSchema::new(
        "continuous_drop_off",
        Enum(EnumSet::ContinuousPickupDropOff),
        Optional,
    ),
    ColumnSchema::new("shape_dist_traveled", Float, Optional).check(&[NonNegative]),
    ColumnSchema::new("timepoint", Enum(EnumSet::Timepoint), Optional),
];

const CALENDAR_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("service_id", Id, Required).primary(),
    ColumnSchema::new("monday", Enum(EnumSet::ServiceAvailability), Required),
    ColumnSchema::new("tuesday", Enum(EnumSet::ServiceAvailability), Required),
    ColumnSchema::new("wednesday", Enum(EnumSet::ServiceAvailability), Required),
    ColumnSchema::new("thursday", Enum(EnumSet::ServiceAvailability), Required),
    ColumnSchema::new("friday", Enum(EnumSet::ServiceAvailability), Required),
    ColumnSchema::new("saturday", Enum(EnumSet::ServiceAvailability), Required),
    ColumnSchema::new("sunday", Enum(EnumSet::ServiceAvailability), Required),
    ColumnSchema::new("start_date", Date, Required),
    ColumnSchema::new("end_date", Date, Required),
];

const CALENDAR_DATES_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("service_id", Id, Required).primary(),
    ColumnSchema::new("date", Date, Required).primary(),
    ColumnSchema::new("exception_type", Enum(EnumSet::ExceptionType), Required),
];

const FARE_ATTRIBUTES_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("fare_id", Id, Required).primary(),
    ColumnSchema::new("price", CurrencyAmount, Required).check(&[NonNegative]),
    ColumnSchema::new("currency_type", CurrencyCode, Required),
    ColumnSchema::new("payment_method", Enum(EnumSet::PaymentMethod), Required),
    ColumnSchema::new("transfers", Enum(EnumSet::FareTransfers), Optional),
    ColumnSchema::new("agency_id", Id, ConditionallyRequired).references(AGENCY_FILE, "agency_id"),
    ColumnSchema::new("transfer_duration", Integer, Optional).check(&[NonNegative]),
];

const FARE_RULES_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("fare_id", Id, Required).references(FARE_ATTRIBUTES_FILE, "fare_id"),
    ColumnSchema::new("route_id", Id, Optional).references(ROUTES_FILE, "route_id"),
    ColumnSchema::new("origin_id", Id, Optional).references(STOPS_FILE, "zone_id"),
    ColumnSchema::new("destination_id", Id, Optional).references(STOPS_FILE, "zone_id"),
    ColumnSchema::new("contains_id", Id, Optional).references(STOPS_FILE, "zone_id"),
];

const SHAPES_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("shape_id", Id, Required).primary(),
    ColumnSchema::new("shape_pt_lat", Latitude, Required),
    ColumnSchema::new("shape_pt_lon", Longitude, Required),
    ColumnSchema::new("shape_pt_sequence", Integer, Required)
        .primary()
        .check(&[NonNegative]),
    ColumnSchema::new("shape_dist_traveled", Float, Optional).check(&[NonNegative]),
];

const FREQUENCIES_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("trip_id", Id, Required)
        .primary()
        .references(TRIPS_FILE, "trip_id"),
    ColumnSchema::new("start_time", Time, Required).primary(),
    ColumnSchema::new("end_time", Time, Required),
    ColumnSchema::new("headway_secs", Integer, Required).check(&[Positive]),
    ColumnSchema::new("exact_times", Enum(EnumSet::ExactTimes), Optional),
];

const TRANSFERS_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("from_stop_id", Id, ConditionallyRequired).references(STOPS_FILE, "stop_id"),
    ColumnSchema::new("to_stop_id", Id, ConditionallyRequired).references(STOPS_FILE, "stop_id"),
    ColumnSchema::new("transfer_type", Enum(EnumSet::TransferType), Required),
    ColumnSchema::new("min_transfer_time", Integer, Optional).check(&[NonNegative]),
];

const PATHWAYS_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("pathway_id", Id, Required).primary(),
    ColumnSchema::new("from_stop_id", Id, Required)
        .indexed()
        .references(STOPS_FILE, "stop_id"),
    ColumnSchema::new("to_stop_id", Id, Required)
        .indexed()
        .references(STOPS_FILE, "stop_id"),
    ColumnSchema::new("pathway_mode", Enum(EnumSet::PathwayMode), Required),
    ColumnSchema::new("is_bidirectional", Enum(EnumSet::Bidirectional), Required),
    ColumnSchema::new("length", Float, Optional).check(&[NonNegative]),
    ColumnSchema::new("traversal_time", Integer, Optional).check(&[Positive]),
    ColumnSchema::new("stair_count", Integer, Optional).check(&[NonZero]),
    ColumnSchema::new("max_slope", Float, Optional),
    ColumnSchema::new("min_width", Float, Optional).check(&[Positive]),
    ColumnSchema::new("signposted_as", Text, Optional).check(&[MixedCase]),
    ColumnSchema::new("reversed_signposted_as", Text, Optional).check(&[MixedCase]),
];

const LEVELS_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("level_id", Id, Required).primary(),
    ColumnSchema::new("level_index", Float, Required),
    ColumnSchema::new("level_name", Text, Optional).check(&[MixedCase]),
];

const FEED_INFO_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("feed_publisher_name", Text, Required),
    ColumnSchema::new("feed_publisher_url", Url, Required),
    ColumnSchema::new("feed_lang", LanguageCode, Required),
    ColumnSchema::new("default_lang", LanguageCode, Optional),
    ColumnSchema::new("feed_start_date", Date, Recommended),
    ColumnSchema::new("feed_end_date", Date, Recommended),
    ColumnSchema::new("feed_version", Text, Recommended),
    ColumnSchema::new("feed_contact_email", Email, Optional),
    ColumnSchema::new("feed_contact_url", Url, Optional),
];

// The real uniqueness key of translations involves record_id and
// field_value, so no primary key is declared here.
const TRANSLATIONS_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("table_name", Text, Required),
    ColumnSchema::new("field_name", Text, Required),
    ColumnSchema::new("language", LanguageCode, Required),
    ColumnSchema::new("translation", Text, Required),
    ColumnSchema::new("record_id", Id, ConditionallyRequired),
    ColumnSchema::new("record_sub_id", Id, ConditionallyRequired),
    ColumnSchema::new("field_value", Text, ConditionallyRequired),
];

const ATTRIBUTIONS_COLUMNS: &[ColumnSchema] = &[
    ColumnSchema::new("attribution_id", Id, Optional).primary(),
    ColumnSchema::new("agency_id", Id, Optional).references(AGENCY_FILE, "agency_id"),
    ColumnSchema::new("route_id", Id, Optional).references(ROUTES_FILE, "route_id"),
    ColumnSchema::new("trip_id", Id, Optional).references(TRIPS_FILE, "trip_id"),
    ColumnSchema::new("organization_name", Text, Required),
    ColumnSchema::new("is_producer", Enum(EnumSet::YesNo), Optional),
    ColumnSchema::new("is_operator", Enum(EnumSet::YesNo), Optional),
    ColumnSchema::new("is_authority", Enum(EnumSet::YesNo), Optional),
    ColumnSchema::new("attribution_url", Url, Optional),
    ColumnSchema::new("attribution_email", Email, Optional),
    ColumnSchema::new("attribution_phone", Phone, Optional),
];

pub const FILE_SCHEMAS: &[FileSchema] = &[
    FileSchema::required(AGENCY_FILE, AGENCY_COLUMNS),
    FileSchema::required(STOPS_FILE, STOPS_COLUMNS),
    FileSchema::required(ROUTES_FILE, ROUTES_COLUMNS),
    FileSchema::required(TRIPS_FILE, TRIPS_COLUMNS),
    FileSchema::required(STOP_TIMES_FILE, STOP_TIMES_COLUMNS),
    FileSchema::optional(CALENDAR_FILE, CALENDAR_COLUMNS),
    FileSchema::optional(CALENDAR_DATES_FILE, CALENDAR_DATES_COLUMNS),
    FileSchema::optional(FARE_ATTRIBUTES_FILE, FARE_ATTRIBUTES_COLUMNS),
    FileSchema::optional(FARE_RULES_FILE, FARE_RULES_COLUMNS),
    FileSchema::optional(SHAPES_FILE, SHAPES_COLUMNS),
    FileSchema::optional(FREQUENCIES_FILE, FREQUENCIES_COLUMNS),
    FileSchema::optional(TRANSFERS_FILE, TRANSFERS_COLUMNS),
    FileSchema::optional(PATHWAYS_FILE, PATHWAYS_COLUMNS),
    FileSchema::optional(LEVELS_FILE, LEVELS_COLUMNS),
    FileSchema::recommended(FEED_INFO_FILE, FEED_INFO_COLUMNS),
    FileSchema::optional(TRANSLATIONS_FILE, TRANSLATIONS_COLUMNS),
    FileSchema::optional(ATTRIBUTIONS_FILE, ATTRIBUTIONS_COLUMNS),
];

pub fn schema_for_file(name: &str) -> Option<&'static FileSchema> {
    FILE_SCHEMAS
        .iter()
        .find(|schema| schema.filename.eq_ignore_ascii_case(name.trim()))
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    #[error("schema_cycle: foreign keys of {0} form a cycle")]
    Cycle(String),
}

/// Tables ordered so that every foreign-key target comes before the tables
/// referencing it. Self references (stations) are not cycles. The order is
/// computed once and drives foreign-key resolution deterministically.
pub fn topological_order() -> Result<&'static [&'static FileSchema], SchemaError> {
    static ORDER: OnceLock<Result<Vec<&'static FileSchema>, SchemaError>> = OnceLock::new();
    ORDER
        .get_or_init(compute_topological_order)
        .as_ref()
        .map(|order| order.as_slice())
        .map_err(|err| err.clone())
}

fn compute_topological_order() -> Result<Vec<&'static FileSchema>, SchemaError> {
    let position: HashMap<&str, usize> = FILE_SCHEMAS
        .iter()
        .enumerate()
        .map(|(index, schema)| (schema.filename, index))
        .collect();

    let mut indegree = vec![0usize; FILE_SCHEMAS.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); FILE_SCHEMAS.len()];
    for (child_index, schema) in FILE_SCHEMAS.iter().enumerate() {
        for (_, fk) in schema.foreign_key_columns() {
            let Some(&parent_index) = position.get(fk.table) else {
                continue;
            };
            if parent_index == child_index {
                continue;
            }
            if !dependents[parent_index].contains(&child_index) {
                dependents[parent_index].push(child_index);
                indegree[child_index] += 1;
            }
        }
    }

    // Kept sorted descending so pop() always yields the lowest declaration
    // index; ties resolve in declaration order.
    let mut ready: Vec<usize> = (0..FILE_SCHEMAS.len())
        .filter(|&index| indegree[index] == 0)
        .collect();
    ready.sort_unstable_by(|a, b| b.cmp(a));
    let mut order = Vec::with_capacity(FILE_SCHEMAS.len());
    while let Some(index) = ready.pop() {
        order.push(&FILE_SCHEMAS[index]);
        for &dependent in &dependents[index] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                ready.push(dependent);
            }
        }
        ready.sort_unstable_by(|a, b| b.cmp(a));
    }

    if order.len() != FILE_SCHEMAS.len() {
        let mut stuck: Vec<&str> = FILE_SCHEMAS
            .iter()
            .enumerate()
            .filter(|(index, _)| indegree[*index] > 0)
            .map(|(_, schema)| schema.filename)
            .collect();
        stuck.sort_unstable();
        return Err(SchemaError::Cycle(stuck.join(", ")));
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_schemas_case_insensitively() {
        assert!(schema_for_file("stops.txt").is_some());
        assert!(schema_for_file("STOPS.TXT").is_some());
        assert!(schema_for_file("nonsense.txt").is_none());
    }

    #[test]
    fn column_lookup_is_case_sensitive() {
        let schema = schema_for_file("stops.txt").unwrap();
        assert!(schema.column("stop_id").is_some());
        assert!(schema.column("Stop_Id").is_none());
        assert!(schema.column("STOP_ID").is_none());
    }

    #[test]
    fn every_foreign_key_targets_a_declared_column() {
        for schema in FILE_SCHEMAS {
            for (column, fk) in schema.foreign_key_columns() {
                let target = schema_for_file(fk.table).unwrap_or_else(|| {
                    panic!("{}.{} references unknown table", schema.filename, column.name)
                });
                assert!(
                    target.column(fk.field).is_some(),
                    "{}.{} references unknown column {}.{}",
                    schema.filename,
                    column.name,
                    fk.table,
                    fk.field
                );
            }
        }
    }

    #[test]
    fn topological_order_puts_parents_before_children() {
        let order = topological_order().expect("no cycle in the declared schemas");
        assert_eq!(order.len(), FILE_SCHEMAS.len());
        let position: std::collections::HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(index, schema)| (schema.filename, index))
            .collect();
        for schema in FILE_SCHEMAS {
            for (_, fk) in schema.foreign_key_columns() {
                if fk.table == schema.filename {
                    continue;
                }
                assert!(
                    position[fk.table] < position[schema.filename],
                    "{} should come before {}",
                    fk.table,
                    schema.filename
                );
            }
        }
    }

    #[test]
    fn stop_times_declares_a_composite_primary_key() {
        let schema = schema_for_file("stop_times.txt").unwrap();
        let keys: Vec<&str> = schema.primary_key_columns().map(|c| c.name).collect();
        assert_eq!(keys, vec!["trip_id", "stop_sequence"]);
    }
}
