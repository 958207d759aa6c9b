//! Typed CSV loading.
//!
//! The typed pass deserializes each record into its row struct via serde.
//! Cells that already failed their declared field type in the cell pass are
//! blanked first, and a required typed field whose cell is absent falls
//! back to the field type's zero value, so one bad cell never takes the
//! whole row with it. The cell pass owns every diagnostic; nothing here
//! emits notices.

use csv::{ReaderBuilder, StringRecord};
use serde::de::DeserializeOwned;

use crate::csv_schema::{schema_for_file, ColumnSchema, Constraint, FieldType, Requiredness};
use gtfs_inspect_model::{GtfsColor, GtfsDate, GtfsTime};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// An error surfaced by the underlying CSV parser (unterminated quote, stray
/// quote, broken UTF-8).
#[derive(Debug, Clone)]
pub struct CsvParseError {
    pub file: String,
    pub message: String,
    pub line_index: Option<u64>,
}

impl CsvParseError {
    pub fn from_csv(file: &str, error: &csv::Error) -> Self {
        Self {
            file: file.to_string(),
            message: error.to_string(),
            line_index: error.position().map(|pos| pos.line()),
        }
    }
}

/// One loaded GTFS table: rows in file order plus their 1-based CSV row
/// numbers (header row is row 1).
#[derive(Debug, Clone)]
pub struct CsvTable<T> {
    pub headers: Vec<String>,
    pub rows: Vec<T>,
    pub row_numbers: Vec<u64>,
}

impl<T> CsvTable<T> {
    pub fn row_number(&self, index: usize) -> u64 {
        self.row_numbers.get(index).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter_with_rows(&self) -> impl Iterator<Item = (u64, &T)> {
        self.row_numbers.iter().copied().zip(self.rows.iter())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|header| header == name)
    }
}

impl<T> Default for CsvTable<T> {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            rows: Vec::new(),
            row_numbers: Vec::new(),
        }
    }
}

pub(crate) fn strip_utf8_bom(data: &[u8]) -> (&[u8], bool) {
    match data.strip_prefix(UTF8_BOM) {
        Some(rest) => (rest, true),
        None => (data, false),
    }
}

/// Deserializes a whole file into typed rows. Never fails and never drops a
/// row over its content: unreadable records are skipped at the parser
/// level, malformed optional cells become absent, and absent required typed
/// cells read as the type's zero value.
pub fn read_typed_table<T: DeserializeOwned>(file_name: &str, data: &[u8]) -> CsvTable<T> {
    let (data, _) = strip_utf8_bom(data);
    let schema = schema_for_file(file_name);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = match reader.headers() {
        Ok(headers) => headers.iter().map(|value| value.trim().to_string()).collect(),
        Err(_) => return CsvTable::default(),
    };
    let mut typed_headers = headers.clone();
    let mut columns: Vec<Option<&ColumnSchema>> = headers
        .iter()
        .map(|header| schema.and_then(|s| s.column(header)))
        .collect();
    // Required columns absent from the file still get typed slots so their
    // rows load with the field's zero value; the header pass reports them.
    if let Some(schema) = schema {
        for column in schema.required_columns() {
            if !headers.iter().any(|header| header.as_str() == column.name) {
                typed_headers.push(column.name.to_string());
                columns.push(Some(column));
            }
        }
    }
    let header_record = StringRecord::from(typed_headers);
    let present_len = headers.len();

    let mut table = CsvTable {
        headers,
        rows: Vec::new(),
        row_numbers: Vec::new(),
    };

    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(_) => continue,
        };
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        let row_number = record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(index as u64 + 2);

        let mut cells: Vec<String> = Vec::with_capacity(columns.len());
        for (col_index, column) in columns.iter().enumerate() {
            let value = if col_index < present_len {
                let raw = record.get(col_index).unwrap_or("").trim();
                match column {
                    Some(column) if !raw.is_empty() && !cell_fits(column, raw) => "",
                    _ => raw,
                }
            } else {
                ""
            };
            cells.push(value.to_string());
        }

        let sanitized = StringRecord::from(cells.clone());
        match sanitized.deserialize::<T>(Some(&header_record)) {
            Ok(row) => {
                table.rows.push(row);
                table.row_numbers.push(row_number);
            }
            Err(_) => {
                let mut repaired = false;
                for (col_index, column) in columns.iter().enumerate() {
                    let Some(column) = column else {
                        continue;
                    };
                    if cells[col_index].is_empty()
                        && column.requiredness == Requiredness::Required
                    {
                        let zero = zero_cell(column.field_type);
                        if !zero.is_empty() {
                            cells[col_index] = zero.to_string();
                            repaired = true;
                        }
                    }
                }
                if repaired {
                    let retry = StringRecord::from(cells);
                    if let Ok(row) = retry.deserialize::<T>(Some(&header_record)) {
                        table.rows.push(row);
                        table.row_numbers.push(row_number);
                    }
                }
            }
        }
    }

    table
}

/// Whether a raw cell can land in the typed field for this column. The cell
/// pass owns the diagnostics; this only guards the typed representation.
fn cell_fits(column: &ColumnSchema, value: &str) -> bool {
    match column.field_type {
        FieldType::Integer => match value.parse::<i64>() {
            // Unsigned typed fields cannot hold values the schema already
            // rejects as negative.
            Ok(parsed) => {
                !(parsed < 0
                    && (column.has_constraint(Constraint::NonNegative)
                        || column.has_constraint(Constraint::Positive)))
            }
            Err(_) => false,
        },
        FieldType::Float
        | FieldType::Latitude
        | FieldType::Longitude
        | FieldType::CurrencyAmount => value.parse::<f64>().is_ok(),
        FieldType::Date => GtfsDate::parse(value).is_ok(),
        FieldType::Time => GtfsTime::parse(value).is_ok(),
        FieldType::Color => GtfsColor::parse(value).is_ok(),
        FieldType::Enum(_) => value.parse::<i64>().is_ok(),
        _ => true,
    }
}

/// The canonical string of the field type's zero value, used when a
/// required typed cell is absent. Strings stay empty; the enum catch-all
/// variants already absorb an empty cell.
fn zero_cell(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Integer => "0",
        FieldType::Float
        | FieldType::Latitude
        | FieldType::Longitude
        | FieldType::CurrencyAmount => "0",
        FieldType::Date => "19700101",
        FieldType::Time => "00:00:00",
        FieldType::Color => "000000",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtfs_inspect_model::{Calendar, GtfsDate, Pathway, Route, RouteType, Stop, StopTime};

    #[test]
    fn loads_rows_with_csv_row_numbers() {
        let data = b"stop_id,stop_name\nS1,First\nS2,Second\n";
        let table: CsvTable<Stop> = read_typed_table("stops.txt", data);

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.row_numbers, vec![2, 3]);
        assert_eq!(table.rows[0].stop_id, "S1");
        assert_eq!(table.rows[1].stop_name.as_deref(), Some("Second"));
    }

    #[test]
    fn skips_blank_rows_without_breaking_numbering() {
        let data = b"stop_id\nS1\n\nS2\n";
        let table: CsvTable<Stop> = read_typed_table("stops.txt", data);

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.row_numbers, vec![2, 4]);
    }

    #[test]
    fn malformed_optional_value_does_not_drop_the_row() {
        let data = b"route_id,route_type,route_color\nR1,3,notacolor\n";
        let table: CsvTable<Route> = read_typed_table("routes.txt", data);

        assert_eq!(table.rows.len(), 1);
        assert!(table.rows[0].route_color.is_none());
    }

    #[test]
    fn absent_required_cell_does_not_drop_the_row() {
        let data = b"service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\nSVC,1,1,1,1,1,0,0,,20301231\n";
        let table: CsvTable<Calendar> = read_typed_table("calendar.txt", data);

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].start_date, GtfsDate::default());
        assert_eq!(table.rows[0].end_date.to_string(), "20301231");
    }

    #[test]
    fn malformed_required_cell_reads_as_zero() {
        let data = b"trip_id,stop_id,stop_sequence\nT1,S1,notanumber\n";
        let table: CsvTable<StopTime> = read_typed_table("stop_times.txt", data);

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].trip_id, "T1");
        assert_eq!(table.rows[0].stop_sequence, 0);
    }

    #[test]
    fn missing_route_type_column_still_loads_rows() {
        let data = b"route_id,route_long_name\nR1,Harbor Line\n";
        let table: CsvTable<Route> = read_typed_table("routes.txt", data);

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].route_id, "R1");
        assert_eq!(table.rows[0].route_type, RouteType::Unknown);
        assert_eq!(table.headers, vec!["route_id", "route_long_name"]);
    }

    #[test]
    fn negative_unsigned_value_becomes_absent() {
        let data =
            b"pathway_id,from_stop_id,to_stop_id,pathway_mode,is_bidirectional,traversal_time\nP1,A,B,1,0,-5\n";
        let table: CsvTable<Pathway> = read_typed_table("pathways.txt", data);

        assert_eq!(table.rows.len(), 1);
        assert!(table.rows[0].traversal_time.is_none());
    }

    #[test]
    fn short_records_treat_missing_cells_as_absent() {
        let data = b"stop_id,stop_name,stop_desc\nS1\n";
        let table: CsvTable<Stop> = read_typed_table("stops.txt", data);

        assert_eq!(table.rows.len(), 1);
        assert!(table.rows[0].stop_name.is_none());
    }

    #[test]
    fn strips_utf8_bom_before_reading_headers() {
        let mut data = vec![0xEF, 0xBB, 0xBF];
        data.extend_from_slice(b"stop_id\nS1\n");
        let table: CsvTable<Stop> = read_typed_table("stops.txt", &data);

        assert_eq!(table.headers, vec!["stop_id"]);
        assert_eq!(table.rows.len(), 1);
    }
}
