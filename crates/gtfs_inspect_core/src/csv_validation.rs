//! Schema-driven cell validation.
//!
//! A single streaming pass over the raw bytes of one file. Header problems,
//! row shape problems, and every cell's type, constraint, and requiredness
//! checks are driven from the table's [`FileSchema`]; each finding is one
//! notice and nothing stops the pass.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use csv::{ReaderBuilder, StringRecord, Trim};
use url::Url;

use crate::csv_reader::{strip_utf8_bom, CsvParseError};
use crate::csv_schema::{
    schema_for_file, ColumnSchema, Constraint, EnumSet, FieldType, FileSchema, Requiredness,
};
use crate::validation_context::validation_country_code;
use crate::{NoticeContainer, NoticeSeverity, ValidationNotice};
use gtfs_inspect_model::{GtfsColor, GtfsDate, GtfsTime};

const CURRENCY_CODES: &[&str] = &[
    "AED", "AFN", "ALL", "AMD", "ANG", "AOA", "ARS", "AUD", "AWG", "AZN", "BAM", "BBD", "BDT",
    "BGN", "BHD", "BIF", "BMD", "BND", "BOB", "BOV", "BRL", "BSD", "BTN", "BWP", "BYN", "BZD",
    "CAD", "CDF", "CHE", "CHF", "CHW", "CLF", "CLP", "CNY", "COP", "COU", "CRC", "CUC", "CUP",
    "CVE", "CZK", "DJF", "DKK", "DOP", "DZD", "EGP", "ERN", "ETB", "EUR", "FJD", "FKP", "GBP",
    "GEL", "GHS", "GIP", "GMD", "GNF", "GTQ", "GYD", "HKD", "HNL", "HRK", "HTG", "HUF", "IDR",
    "ILS", "INR", "IQD", "IRR", "ISK", "JMD", "JOD", "JPY", "KES", "KGS", "KHR", "KMF", "KPW",
    "KRW", "KWD", "KYD", "KZT", "LAK", "LBP", "LKR", "LRD", "LSL", "LYD", "MAD", "MDL", "MGA",
    "MKD", "MMK", "MNT", "MOP", "MRO", "MUR", "MVR", "MWK", "MXN", "MXV", "MYR", "MZN", "NAD",
    "NGN", "NIO", "NOK", "NPR", "NZD", "OMR", "PAB", "PEN", "PGK", "PHP", "PKR", "PLN", "PYG",
    "QAR", "RON", "RSD", "RUB", "RWF", "SAR", "SBD", "SCR", "SDG", "SEK", "SGD", "SHP", "SLL",
    "SOS", "SRD", "SSP", "STD", "SVC", "SYP", "SZL", "THB", "TJS", "TMT", "TND", "TOP", "TRY",
    "TTD", "TWD", "TZS", "UAH", "UGX", "USD", "USN", "UYI", "UYU", "UZS", "VEF", "VND", "VUV",
    "WST", "XAF", "XAG", "XAU", "XBA", "XBB", "XBC", "XBD", "XCD", "XDR", "XOF", "XPD", "XPF",
    "XPT", "XSU", "XTS", "XUA", "XXX", "YER", "ZAR", "ZMW", "ZWL",
];

const CURRENCY_ZERO_DECIMALS: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "ISK", "JPY", "KMF", "KPW", "KRW", "LAK", "PYG", "RWF", "UGX",
    "UYI", "VND", "VUV", "XAF", "XOF", "XPF",
];

const CURRENCY_THREE_DECIMALS: &[&str] = &["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

const CURRENCY_FOUR_DECIMALS: &[&str] = &["CLF", "UYW"];

pub fn validate_csv_data(file_name: &str, data: &[u8], notices: &mut NoticeContainer) {
    let (data, had_bom) = strip_utf8_bom(data);
    if had_bom {
        notices.push(utf8_bom_notice(file_name));
    }

    let schema = schema_for_file(file_name);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::None)
        .from_reader(data);

    let headers: Vec<String> = match reader.headers() {
        Ok(headers) => headers.iter().map(|value| value.to_string()).collect(),
        Err(error) => {
            notices.push_csv_error(&CsvParseError::from_csv(file_name, &error));
            return;
        }
    };
    validate_headers(file_name, schema, &headers, notices);

    let columns: Vec<Option<&ColumnSchema>> = headers
        .iter()
        .map(|header| schema.and_then(|s| s.column(header.trim())))
        .collect();
    let currency_pair = currency_amount_pair(schema, &headers);

    let header_len = headers.len();
    let line_count = data_line_count(data);
    let mut last_row_number = 1u64;
    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(error) => {
                notices.push_csv_error(&CsvParseError::from_csv(file_name, &error));
                continue;
            }
        };
        let row_number = record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(index as u64 + 2);

        // The reader silently skips blank lines; report the gap.
        for skipped in (last_row_number + 1)..row_number {
            notices.push(empty_row_notice(file_name, skipped));
        }
        last_row_number = row_number;

        if record.iter().all(|value| value.trim().is_empty()) {
            notices.push(empty_row_notice(file_name, row_number));
            continue;
        }

        if record.len() != header_len {
            notices.push(invalid_row_length_notice(
                file_name,
                row_number,
                header_len,
                record.len(),
            ));
        }

        for col_index in 0..header_len {
            let value = record.get(col_index).unwrap_or("");
            let header_name = headers
                .get(col_index)
                .map(|value| value.trim())
                .unwrap_or("");

            if value.contains('\n') || value.contains('\r') {
                notices.push(new_line_notice(file_name, header_name, row_number, value));
            }
            if value != value.trim() {
                notices.push(leading_trailing_whitespace_notice(
                    file_name,
                    header_name,
                    row_number,
                    value,
                ));
            }

            let Some(column) = columns[col_index] else {
                continue;
            };
            let trimmed = value.trim();
            if trimmed.is_empty() {
                match column.requiredness {
                    Requiredness::Required => notices.push(missing_required_field_notice(
                        file_name,
                        header_name,
                        row_number,
                    )),
                    Requiredness::Recommended => notices.push(missing_recommended_field_notice(
                        file_name,
                        header_name,
                        row_number,
                    )),
                    // Conditional presence is validator territory.
                    Requiredness::ConditionallyRequired | Requiredness::Optional => {}
                }
                continue;
            }

            validate_cell_value(file_name, column, header_name, row_number, trimmed, notices);
        }

        if let Some((amount_index, code_index)) = currency_pair {
            validate_currency_amount(
                file_name,
                &record,
                amount_index,
                code_index,
                &headers,
                row_number,
                notices,
            );
        }
    }

    for skipped in (last_row_number + 1)..=line_count {
        notices.push(empty_row_notice(file_name, skipped));
    }
}

/// Lines that can carry a CSV record, ignoring one trailing newline.
fn data_line_count(data: &[u8]) -> u64 {
    if data.is_empty() {
        return 0;
    }
    let mut count = data.split(|&b| b == b'\n').count() as u64;
    if data.ends_with(b"\n") {
        count -= 1;
    }
    count
}

fn validate_headers(
    file_name: &str,
    schema: Option<&'static FileSchema>,
    headers: &[String],
    notices: &mut NoticeContainer,
) {
    // Column names match case-sensitively; a header that differs only in
    // case is an unknown column, not an alias.
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (index, header) in headers.iter().enumerate() {
        let trimmed = header.trim();
        if trimmed.is_empty() {
            notices.push(empty_column_name_notice(file_name, index));
            continue;
        }
        if let Some(first_index) = seen.get(trimmed) {
            notices.push(duplicated_column_notice(
                file_name,
                trimmed,
                *first_index,
                index,
            ));
        } else {
            seen.insert(trimmed, index);
        }
        if let Some(schema) = schema {
            if schema.column(trimmed).is_none() {
                notices.push(unknown_column_notice(file_name, trimmed, index));
            }
        }
    }

    let Some(schema) = schema else {
        return;
    };
    let header_set: HashSet<&str> = headers.iter().map(|value| value.trim()).collect();
    for column in schema.required_columns() {
        if !header_set.contains(column.name) {
            notices.push(missing_required_column_notice(file_name, column.name));
        }
    }
    for column in schema.recommended_columns() {
        if !header_set.contains(column.name) {
            notices.push(missing_recommended_column_notice(file_name, column.name));
        }
    }
}

fn validate_cell_value(
    file: &str,
    column: &ColumnSchema,
    field_name: &str,
    row_number: u64,
    value: &str,
    notices: &mut NoticeContainer,
) {
    if column.has_constraint(Constraint::MixedCase) && is_mixed_case_violation(value) {
        notices.push(mixed_case_notice(file, field_name, row_number, value));
    }

    match column.field_type {
        FieldType::Id | FieldType::Text => {}
        FieldType::Integer => match value.parse::<i64>() {
            Ok(parsed) => {
                check_integer_constraints(file, column, field_name, row_number, parsed, notices)
            }
            Err(_) => notices.push(invalid_integer_notice(file, field_name, row_number, value)),
        },
        FieldType::Float | FieldType::CurrencyAmount => match value.parse::<f64>() {
            Ok(parsed) => {
                check_float_constraints(file, column, field_name, row_number, parsed, notices)
            }
            Err(_) => notices.push(invalid_float_notice(file, field_name, row_number, value)),
        },
        FieldType::Latitude => match value.parse::<f64>() {
            Ok(parsed) => {
                if !(-90.0..=90.0).contains(&parsed) {
                    notices.push(number_out_of_range_notice(
                        file, field_name, row_number, "latitude", parsed,
                    ));
                }
            }
            Err(_) => notices.push(invalid_float_notice(file, field_name, row_number, value)),
        },
        FieldType::Longitude => match value.parse::<f64>() {
            Ok(parsed) => {
                if !(-180.0..=180.0).contains(&parsed) {
                    notices.push(number_out_of_range_notice(
                        file, field_name, row_number, "longitude", parsed,
                    ));
                }
            }
            Err(_) => notices.push(invalid_float_notice(file, field_name, row_number, value)),
        },
        FieldType::Date => {
            if GtfsDate::parse(value).is_err() {
                notices.push(invalid_date_notice(file, field_name, row_number, value));
            }
        }
        FieldType::Time => {
            if GtfsTime::parse(value).is_err() {
                notices.push(invalid_time_notice(file, field_name, row_number, value));
            }
        }
        FieldType::Color => {
            if GtfsColor::parse(value).is_err() {
                notices.push(invalid_color_notice(file, field_name, row_number, value));
            }
        }
        FieldType::Enum(set) => validate_enum_value(file, field_name, row_number, value, set, notices),
        FieldType::Timezone => {
            if !is_valid_timezone(value) {
                notices.push(invalid_timezone_notice(file, field_name, row_number, value));
            }
        }
        FieldType::LanguageCode => {
            if !is_valid_language_code(value) {
                notices.push(invalid_language_notice(file, field_name, row_number, value));
            }
        }
        FieldType::CurrencyCode => {
            if !is_valid_currency_code(value) {
                notices.push(invalid_currency_notice(file, field_name, row_number, value));
            }
        }
        FieldType::Url => {
            if !is_valid_url(value) {
                notices.push(invalid_url_notice(file, field_name, row_number, value));
            }
        }
        FieldType::Email => {
            if !is_valid_email(value) {
                notices.push(invalid_email_notice(file, field_name, row_number, value));
            }
        }
        FieldType::Phone => {
            if validation_country_code().is_some() && !is_valid_phone_number(value) {
                notices.push(invalid_phone_notice(file, field_name, row_number, value));
            }
        }
    }
}

fn check_integer_constraints(
    file: &str,
    column: &ColumnSchema,
    field_name: &str,
    row_number: u64,
    value: i64,
    notices: &mut NoticeContainer,
) {
    for constraint in column.constraints {
        let violated = match constraint {
            Constraint::NonNegative => value < 0,
            Constraint::Positive => value <= 0,
            Constraint::NonZero => value == 0,
            Constraint::MixedCase => false,
        };
        if violated {
            notices.push(number_out_of_range_notice(
                file,
                field_name,
                row_number,
                "integer",
                value as f64,
            ));
        }
    }
}

fn check_float_constraints(
    file: &str,
    column: &ColumnSchema,
    field_name: &str,
    row_number: u64,
    value: f64,
    notices: &mut NoticeContainer,
) {
    for constraint in column.constraints {
        let violated = match constraint {
            Constraint::NonNegative => value < 0.0,
            Constraint::Positive => value <= 0.0,
            Constraint::NonZero => value == 0.0,
            Constraint::MixedCase => false,
        };
        if violated {
            notices.push(number_out_of_range_notice(
                file, field_name, row_number, "float", value,
            ));
        }
    }
}

fn validate_enum_value(
    file: &str,
    field_name: &str,
    row_number: u64,
    value: &str,
    set: EnumSet,
    notices: &mut NoticeContainer,
) {
    match value.parse::<i64>() {
        Ok(parsed) => {
            if !set.allows(parsed) {
                notices.push(unexpected_enum_value_notice(
                    file, field_name, row_number, parsed,
                ));
            }
        }
        Err(_) => notices.push(invalid_integer_notice(file, field_name, row_number, value)),
    }
}

/// The column pair for the currency-amount precision check, if this schema
/// declares one (`fare_attributes.price` against `currency_type`).
fn currency_amount_pair(
    schema: Option<&'static FileSchema>,
    headers: &[String],
) -> Option<(usize, usize)> {
    let schema = schema?;
    let position = |wanted: FieldType| {
        headers.iter().position(|header| {
            schema
                .column(header.trim())
                .map(|column| column.field_type == wanted)
                .unwrap_or(false)
        })
    };
    Some((
        position(FieldType::CurrencyAmount)?,
        position(FieldType::CurrencyCode)?,
    ))
}

fn validate_currency_amount(
    file: &str,
    record: &StringRecord,
    amount_index: usize,
    code_index: usize,
    headers: &[String],
    row_number: u64,
    notices: &mut NoticeContainer,
) {
    let amount = record.get(amount_index).unwrap_or("").trim();
    let currency = record.get(code_index).unwrap_or("").trim();
    if amount.is_empty() || currency.is_empty() {
        return;
    }
    let Some(scale) = decimal_scale(amount) else {
        return;
    };
    let field_name = headers
        .get(amount_index)
        .map(|value| value.trim())
        .unwrap_or("");
    match currency_fraction_digits(currency) {
        Some(expected) if scale == expected => {}
        // Unknown currency codes cannot justify any amount precision.
        Some(_) | None => notices.push(invalid_currency_amount_notice(
            file, field_name, row_number, currency, amount,
        )),
    }
}

fn utf8_bom_notice(file: &str) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "utf8_bom",
        NoticeSeverity::Info,
        "file starts with a UTF-8 byte order mark",
    );
    notice.file = Some(file.to_string());
    notice.insert_context_field("filename", file);
    notice
}

fn empty_column_name_notice(file: &str, index: usize) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "empty_column_name",
        NoticeSeverity::Error,
        "column name is empty",
    );
    notice.file = Some(file.to_string());
    notice.insert_context_field("filename", file);
    notice.insert_context_field("index", index);
    notice
}

fn duplicated_column_notice(
    file: &str,
    field_name: &str,
    first_index: usize,
    second_index: usize,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "duplicated_column",
        NoticeSeverity::Error,
        "duplicated column name",
    );
    notice.file = Some(file.to_string());
    notice.insert_context_field("fieldName", field_name);
    notice.insert_context_field("filename", file);
    notice.insert_context_field("firstIndex", first_index);
    notice.insert_context_field("secondIndex", second_index);
    notice
}

fn unknown_column_notice(file: &str, field_name: &str, index: usize) -> ValidationNotice {
    let mut notice = ValidationNotice::new("unknown_column", NoticeSeverity::Info, "unknown column");
    notice.file = Some(file.to_string());
    notice.insert_context_field("fieldName", field_name);
    notice.insert_context_field("filename", file);
    notice.insert_context_field("index", index);
    notice
}

fn missing_required_column_notice(file: &str, field_name: &str) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "missing_required_column",
        NoticeSeverity::Error,
        "required column is missing",
    );
    notice.file = Some(file.to_string());
    notice.insert_context_field("fieldName", field_name);
    notice.insert_context_field("filename", file);
    notice
}

fn missing_recommended_column_notice(file: &str, field_name: &str) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "missing_recommended_column",
        NoticeSeverity::Warning,
        "recommended column is missing",
    );
    notice.file = Some(file.to_string());
    notice.insert_context_field("fieldName", field_name);
    notice.insert_context_field("filename", file);
    notice
}

fn empty_row_notice(file: &str, row_number: u64) -> ValidationNotice {
    let mut notice = ValidationNotice::new("empty_row", NoticeSeverity::Warning, "row is empty");
    notice.file = Some(file.to_string());
    notice.row = Some(row_number);
    notice.insert_context_field("csvRowNumber", row_number);
    notice.insert_context_field("filename", file);
    notice
}

fn invalid_row_length_notice(
    file: &str,
    row_number: u64,
    header_len: usize,
    row_len: usize,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "invalid_row_length",
        NoticeSeverity::Error,
        "row length does not match header length",
    );
    notice.file = Some(file.to_string());
    notice.row = Some(row_number);
    notice.insert_context_field("csvRowNumber", row_number);
    notice.insert_context_field("filename", file);
    notice.insert_context_field("headerCount", header_len);
    notice.insert_context_field("rowLength", row_len);
    notice
}

fn leading_trailing_whitespace_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    value: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "leading_or_trailing_whitespaces",
        NoticeSeverity::Warning,
        "value has leading or trailing whitespace",
    );
    populate_field_notice(&mut notice, file, field_name, row_number, value);
    notice
}

fn new_line_notice(file: &str, field_name: &str, row_number: u64, value: &str) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "new_line_in_value",
        NoticeSeverity::Error,
        "value contains a new line",
    );
    populate_field_notice(&mut notice, file, field_name, row_number, value);
    notice
}

fn missing_required_field_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "missing_required_field",
        NoticeSeverity::Error,
        "required field is missing",
    );
    notice.set_location(file, field_name, row_number);
    notice.insert_context_field("csvRowNumber", row_number);
    notice.insert_context_field("fieldName", field_name);
    notice.insert_context_field("filename", file);
    notice
}

fn missing_recommended_field_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "missing_recommended_field",
        NoticeSeverity::Warning,
        "recommended field is missing",
    );
    notice.set_location(file, field_name, row_number);
    notice.insert_context_field("csvRowNumber", row_number);
    notice.insert_context_field("fieldName", field_name);
    notice.insert_context_field("filename", file);
    notice
}

fn invalid_integer_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    value: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "invalid_integer",
        NoticeSeverity::Error,
        "field cannot be parsed as integer",
    );
    populate_field_notice(&mut notice, file, field_name, row_number, value);
    notice
}

fn invalid_float_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    value: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "invalid_float",
        NoticeSeverity::Error,
        "field cannot be parsed as float",
    );
    populate_field_notice(&mut notice, file, field_name, row_number, value);
    notice
}

fn invalid_date_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    value: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "invalid_date",
        NoticeSeverity::Error,
        "field cannot be parsed as date",
    );
    populate_field_notice(&mut notice, file, field_name, row_number, value);
    notice
}

fn invalid_time_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    value: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "invalid_time",
        NoticeSeverity::Error,
        "field cannot be parsed as time",
    );
    populate_field_notice(&mut notice, file, field_name, row_number, value);
    notice
}

fn invalid_color_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    value: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "invalid_color",
        NoticeSeverity::Error,
        "field cannot be parsed as color",
    );
    populate_field_notice(&mut notice, file, field_name, row_number, value);
    notice
}

fn invalid_timezone_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    value: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "invalid_timezone",
        NoticeSeverity::Error,
        "field cannot be parsed as timezone",
    );
    populate_field_notice(&mut notice, file, field_name, row_number, value);
    notice
}

fn invalid_language_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    value: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "invalid_language_code",
        NoticeSeverity::Error,
        "field contains an invalid language code",
    );
    populate_field_notice(&mut notice, file, field_name, row_number, value);
    notice
}

fn invalid_currency_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    value: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "invalid_currency",
        NoticeSeverity::Error,
        "field contains an invalid currency code",
    );
    populate_field_notice(&mut notice, file, field_name, row_number, value);
    notice
}

fn invalid_currency_amount_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    currency_code: &str,
    value: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "invalid_currency_amount",
        NoticeSeverity::Error,
        "amount precision does not match the currency",
    );
    notice.set_location(file, field_name, row_number);
    notice.insert_context_field("csvRowNumber", row_number);
    notice.insert_context_field("currencyCode", currency_code);
    notice.insert_context_field("fieldName", field_name);
    notice.insert_context_field("fieldValue", value);
    notice.insert_context_field("filename", file);
    notice
}

fn invalid_url_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    value: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "invalid_url",
        NoticeSeverity::Error,
        "field contains an invalid url",
    );
    populate_field_notice(&mut notice, file, field_name, row_number, value);
    notice
}

fn invalid_email_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    value: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "invalid_email",
        NoticeSeverity::Error,
        "field contains an invalid email",
    );
    populate_field_notice(&mut notice, file, field_name, row_number, value);
    notice
}

fn invalid_phone_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    value: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "invalid_phone_number",
        NoticeSeverity::Error,
        "field contains an invalid phone number",
    );
    populate_field_notice(&mut notice, file, field_name, row_number, value);
    notice
}

fn unexpected_enum_value_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    value: i64,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "unexpected_enum_value",
        NoticeSeverity::Warning,
        "unexpected enum value",
    );
    notice.set_location(file, field_name, row_number);
    notice.insert_context_field("csvRowNumber", row_number);
    notice.insert_context_field("fieldName", field_name);
    notice.insert_context_field("fieldValue", value);
    notice.insert_context_field("filename", file);
    notice
}

fn number_out_of_range_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    field_type: &str,
    value: f64,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "number_out_of_range",
        NoticeSeverity::Error,
        "value out of range",
    );
    notice.set_location(file, field_name, row_number);
    notice.insert_context_field("csvRowNumber", row_number);
    notice.insert_context_field("fieldName", field_name);
    notice.insert_context_field("fieldType", field_type);
    notice.insert_context_field("fieldValue", value);
    notice.insert_context_field("filename", file);
    notice
}

fn mixed_case_notice(
    file: &str,
    field_name: &str,
    row_number: u64,
    value: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "mixed_case_recommended_field",
        NoticeSeverity::Warning,
        "field should use mixed case",
    );
    populate_field_notice(&mut notice, file, field_name, row_number, value);
    notice
}

fn populate_field_notice(
    notice: &mut ValidationNotice,
    file: &str,
    field_name: &str,
    row_number: u64,
    value: &str,
) {
    notice.set_location(file, field_name, row_number);
    notice.insert_context_field("csvRowNumber", row_number);
    notice.insert_context_field("fieldName", field_name);
    notice.insert_context_field("fieldValue", value);
    notice.insert_context_field("filename", file);
}

/// Proper-noun fields should not be written in a single case. Tokens with
/// digits and one-letter tokens do not count.
fn is_mixed_case_violation(value: &str) -> bool {
    let tokens: Vec<&str> = value
        .split(|ch: char| !ch.is_alphabetic())
        .filter(|token| !token.is_empty())
        .collect();
    if tokens.is_empty() {
        return false;
    }

    if tokens.len() == 1 {
        let token = tokens[0];
        if token.len() <= 1 || token.chars().any(|ch| ch.is_ascii_digit()) {
            return false;
        }
        return token.chars().all(|ch| ch.is_lowercase())
            || token.chars().all(|ch| ch.is_uppercase());
    }

    let mut has_mixed_case = false;
    let mut counted_tokens = 0;
    for token in tokens {
        if token.len() == 1 || token.chars().any(|ch| ch.is_ascii_digit()) {
            continue;
        }
        counted_tokens += 1;
        let has_upper = token.chars().any(|ch| ch.is_uppercase());
        let has_lower = token.chars().any(|ch| ch.is_lowercase());
        if has_upper && has_lower {
            has_mixed_case = true;
        }
    }
    counted_tokens >= 2 && !has_mixed_case
}

fn is_valid_url(value: &str) -> bool {
    Url::parse(value).is_ok()
}

fn is_valid_email(value: &str) -> bool {
    let mut parts = value.split('@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || parts.next().is_some() {
        return false;
    }
    if local.contains(char::is_whitespace) || domain.contains(char::is_whitespace) {
        return false;
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }
    domain.contains('.')
}

fn is_valid_phone_number(value: &str) -> bool {
    let mut digits = 0;
    for ch in value.chars() {
        if ch.is_ascii_digit() {
            digits += 1;
            continue;
        }
        match ch {
            '+' | '-' | '(' | ')' | '.' | ' ' => {}
            _ => return false,
        }
    }
    digits >= 2
}

fn is_valid_language_code(value: &str) -> bool {
    let mut parts = value.split('-');
    let primary = match parts.next() {
        Some(part) => part,
        None => return false,
    };
    if !(2..=3).contains(&primary.len()) {
        return false;
    }
    if !primary.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return false;
    }
    for part in parts {
        if !(2..=8).contains(&part.len()) {
            return false;
        }
        if !part.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return false;
        }
    }
    true
}

fn is_valid_timezone(value: &str) -> bool {
    let zones = valid_timezones();
    if zones.is_empty() {
        return true;
    }
    zones.contains(value)
}

fn valid_timezones() -> &'static HashSet<String> {
    static TIMEZONES: OnceLock<HashSet<String>> = OnceLock::new();
    TIMEZONES.get_or_init(|| {
        let mut zones = HashSet::new();
        for path in [
            "/usr/share/zoneinfo/zone1970.tab",
            "/usr/share/zoneinfo/zone.tab",
        ] {
            if let Ok(contents) = std::fs::read_to_string(path) {
                for line in contents.lines() {
                    let trimmed = line.trim();
                    if trimmed.is_empty() || trimmed.starts_with('#') {
                        continue;
                    }
                    let mut parts = trimmed.split('\t');
                    parts.next();
                    parts.next();
                    if let Some(name) = parts.next() {
                        zones.insert(name.trim().to_string());
                    }
                }
                if !zones.is_empty() {
                    break;
                }
            }
        }
        zones.insert("UTC".to_string());
        zones
    })
}

fn is_valid_currency_code(value: &str) -> bool {
    currency_codes().contains(value)
}

fn currency_fraction_digits(value: &str) -> Option<u8> {
    if !is_valid_currency_code(value) {
        return None;
    }
    if CURRENCY_ZERO_DECIMALS.contains(&value) {
        return Some(0);
    }
    if CURRENCY_THREE_DECIMALS.contains(&value) {
        return Some(3);
    }
    if CURRENCY_FOUR_DECIMALS.contains(&value) {
        return Some(4);
    }
    Some(2)
}

fn currency_codes() -> &'static HashSet<&'static str> {
    static CODES: OnceLock<HashSet<&'static str>> = OnceLock::new();
    CODES.get_or_init(|| CURRENCY_CODES.iter().copied().collect())
}

fn decimal_scale(value: &str) -> Option<u8> {
    let value = value.trim();
    let value = value.strip_prefix('+').unwrap_or(value);
    let value = value.strip_prefix('-').unwrap_or(value);
    let mut parts = value.split('.');
    let int_part = parts.next()?;
    let frac_part = parts.next();
    if parts.next().is_some() || int_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match frac_part {
        None => Some(0),
        Some(part) => {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            u8::try_from(part.len()).ok()
        }
    }
}
