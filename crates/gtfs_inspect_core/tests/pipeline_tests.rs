//! End-to-end pipeline checks against small feeds written to disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use gtfs_inspect_core::engine::validate_input;
use gtfs_inspect_core::{default_runner, GtfsInput, NoticeContainer, ValidationNotice};

fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{}_{}_{}", prefix, std::process::id(), nanos));
    fs::create_dir_all(&dir).expect("create dir");
    dir
}

fn write_file(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write file");
}

/// A minimal feed that validates clean apart from unused-entity warnings.
fn write_base_feed(dir: &Path) {
    write_file(
        dir,
        "agency.txt",
        "agency_id,agency_name,agency_url,agency_timezone\nDTA,Demo Transit,https://transit.example.com,UTC\n",
    );
    write_file(
        dir,
        "stops.txt",
        "stop_id,stop_name,stop_lat,stop_lon\nS1,Main Street,47.51,8.52\nS2,Harbor View,47.52,8.53\n",
    );
    write_file(
        dir,
        "routes.txt",
        "route_id,agency_id,route_short_name,route_long_name,route_type\nR1,DTA,1,Harbor Line,3\n",
    );
    write_file(
        dir,
        "trips.txt",
        "route_id,service_id,trip_id\nR1,WEEK,T1\n",
    );
    write_file(
        dir,
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\nT1,08:00:00,08:01:00,S1,1\nT1,08:10:00,08:11:00,S2,2\n",
    );
    write_file(
        dir,
        "calendar.txt",
        "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\nWEEK,1,1,1,1,1,0,0,20250101,20301231\n",
    );
}

fn validate_dir(dir: &Path) -> gtfs_inspect_core::engine::ValidationOutcome {
    let input = GtfsInput::from_path(dir).expect("input");
    let runner = default_runner();
    validate_input(&input, &runner)
}

fn notices_with_code<'a>(
    notices: &'a NoticeContainer,
    code: &'a str,
) -> Vec<&'a ValidationNotice> {
    notices.samples(code).collect()
}

fn context_u64(notice: &ValidationNotice, key: &str) -> u64 {
    notice
        .context
        .get(key)
        .and_then(|value| value.as_u64())
        .unwrap_or_default()
}

fn context_str<'a>(notice: &'a ValidationNotice, key: &str) -> &'a str {
    notice
        .context
        .get(key)
        .and_then(|value| value.as_str())
        .unwrap_or_default()
}

#[test]
fn base_feed_has_no_errors() {
    let dir = temp_dir("base_feed");
    write_base_feed(&dir);

    let outcome = validate_dir(&dir);

    assert!(!outcome.aborted);
    assert!(
        !outcome.notices.has_errors(),
        "unexpected errors: {:?}",
        outcome
            .notices
            .iter()
            .filter(|n| n.severity == gtfs_inspect_core::NoticeSeverity::Error)
            .collect::<Vec<_>>()
    );
    assert_eq!(outcome.exit_code(), 0);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn route_name_scenarios() {
    let dir = temp_dir("route_names");
    write_base_feed(&dir);
    write_file(
        &dir,
        "routes.txt",
        "route_id,route_short_name,route_long_name,route_type\n\
         R1,,,3\n\
         R2,ABCDEFGHIJKLMN,Blue Line,3\n\
         R3,Blue,Blue,3\n\
         R4,10,10 Downtown,3\n",
    );

    let outcome = validate_dir(&dir);
    let notices = &outcome.notices;

    let missing = notices_with_code(notices, "route_both_short_and_long_name_missing");
    assert_eq!(missing.len(), 1);
    assert_eq!(context_str(missing[0], "routeId"), "R1");
    assert_eq!(context_u64(missing[0], "csvRowNumber"), 2);

    let too_long = notices_with_code(notices, "route_short_name_too_long");
    assert_eq!(too_long.len(), 1);
    assert_eq!(context_str(too_long[0], "routeId"), "R2");
    assert_eq!(context_u64(too_long[0], "csvRowNumber"), 3);

    let equal = notices_with_code(notices, "route_short_and_long_name_equal");
    assert_eq!(equal.len(), 1);
    assert_eq!(context_str(equal[0], "routeId"), "R3");
    assert_eq!(context_u64(equal[0], "csvRowNumber"), 4);

    let contains = notices_with_code(notices, "route_long_name_contains_short_name");
    assert_eq!(contains.len(), 1);
    assert_eq!(context_str(contains[0], "routeId"), "R4");
    assert_eq!(context_u64(contains[0], "csvRowNumber"), 5);
    assert_eq!(context_str(contains[0], "routeShortName"), "10");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn fare_attribute_scenarios() {
    let dir = temp_dir("fares");
    write_base_feed(&dir);
    write_file(
        &dir,
        "fare_attributes.txt",
        "fare_id,price,currency_type,payment_method\nF1,-1,USD,0\nF2,2.50,XQQ,0\n",
    );

    let outcome = validate_dir(&dir);
    let notices = &outcome.notices;

    let out_of_range = notices_with_code(notices, "number_out_of_range");
    assert!(out_of_range
        .iter()
        .any(|notice| notice.field.as_deref() == Some("price")
            && context_u64(notice, "csvRowNumber") == 2));

    assert!(notices.count("invalid_currency") >= 1);
    assert!(notices.count("invalid_currency_amount") >= 1);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn pathway_constraint_scenarios() {
    let dir = temp_dir("pathways");
    write_base_feed(&dir);
    write_file(
        &dir,
        "pathways.txt",
        "pathway_id,from_stop_id,to_stop_id,pathway_mode,is_bidirectional,traversal_time,stair_count\nP1,S1,S2,2,1,0,0\n",
    );

    let outcome = validate_dir(&dir);

    // traversal_time=0 violates Positive, stair_count=0 violates NonZero.
    assert_eq!(outcome.notices.count("number_out_of_range"), 2);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn fare_agency_foreign_key_violation() {
    let dir = temp_dir("fare_fk");
    write_base_feed(&dir);
    write_file(
        &dir,
        "fare_attributes.txt",
        "fare_id,price,currency_type,payment_method,agency_id\nF1,2.50,USD,0,X\n",
    );

    let outcome = validate_dir(&dir);

    let violations = notices_with_code(&outcome.notices, "foreign_key_violation");
    assert_eq!(violations.len(), 1);
    assert_eq!(
        context_str(violations[0], "childFilename"),
        "fare_attributes.txt"
    );
    assert_eq!(context_str(violations[0], "childFieldName"), "agency_id");
    assert_eq!(context_str(violations[0], "fieldValue"), "X");
    assert_eq!(context_u64(violations[0], "csvRowNumber"), 2);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn duplicate_stop_id_reports_both_rows() {
    let dir = temp_dir("dup_stop");
    write_base_feed(&dir);
    write_file(
        &dir,
        "stops.txt",
        "stop_id,stop_name,stop_lat,stop_lon\n\
         S1,Main Street,47.51,8.52\n\
         S2,Harbor View,47.52,8.53\n\
         S3,Market Place,47.53,8.54\n\
         S1,Main Street Again,47.54,8.55\n",
    );

    let outcome = validate_dir(&dir);

    let duplicates = notices_with_code(&outcome.notices, "duplicate_key");
    assert_eq!(duplicates.len(), 1);
    assert_eq!(context_str(duplicates[0], "fieldValue"), "S1");
    assert_eq!(context_u64(duplicates[0], "prevCsvRowNumber"), 2);
    assert_eq!(context_u64(duplicates[0], "csvRowNumber"), 5);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_agency_file_gives_exit_code_1() {
    let dir = temp_dir("no_agency");
    write_base_feed(&dir);
    fs::remove_file(dir.join("agency.txt")).expect("remove agency");

    let outcome = validate_dir(&dir);

    let missing = notices_with_code(&outcome.notices, "missing_required_file");
    assert_eq!(missing.len(), 1);
    assert_eq!(context_str(missing[0], "filename"), "agency.txt");
    assert_eq!(outcome.exit_code(), 1);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn empty_stops_file_yields_only_empty_file_for_it() {
    let dir = temp_dir("empty_stops");
    write_base_feed(&dir);
    write_file(&dir, "stops.txt", "");

    let outcome = validate_dir(&dir);

    assert_eq!(outcome.notices.count("empty_file"), 1);
    let empty = notices_with_code(&outcome.notices, "empty_file");
    assert_eq!(context_str(empty[0], "filename"), "stops.txt");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn header_only_file_loads_as_empty_table() {
    let dir = temp_dir("header_only");
    write_base_feed(&dir);
    write_file(&dir, "transfers.txt", "from_stop_id,to_stop_id,transfer_type\n");

    let outcome = validate_dir(&dir);
    let feed = outcome.feed.expect("feed");

    let transfers = feed.transfers.expect("transfers table");
    assert!(transfers.is_empty());
    assert_eq!(outcome.notices.count("empty_file"), 0);
    assert_eq!(outcome.notices.count("empty_row"), 0);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn skipping_a_validator_removes_its_notices_and_no_others() {
    let dir = temp_dir("skip");
    write_base_feed(&dir);
    write_file(
        &dir,
        "routes.txt",
        "route_id,route_short_name,route_long_name,route_type\nR1,,,3\n",
    );

    let input = GtfsInput::from_path(&dir).expect("input");

    let full = validate_input(&input, &default_runner());
    assert_eq!(
        full.notices.count("route_both_short_and_long_name_missing"),
        1
    );
    let unused_routes_before = full.notices.count("unused_route");

    let mut skipping = default_runner();
    skipping.set_skipped(["route_names".to_string()]);
    let trimmed = validate_input(&input, &skipping);

    assert_eq!(
        trimmed
            .notices
            .count("route_both_short_and_long_name_missing"),
        0
    );
    assert_eq!(trimmed.notices.count("unused_route"), unused_routes_before);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn unknown_files_are_reported_as_info() {
    let dir = temp_dir("unknown_file");
    write_base_feed(&dir);
    write_file(&dir, "notes.txt", "free text\n");

    let outcome = validate_dir(&dir);

    let unknown = notices_with_code(&outcome.notices, "unknown_file");
    assert_eq!(unknown.len(), 1);
    assert_eq!(context_str(unknown[0], "filename"), "notes.txt");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn notices_are_sorted_by_file_row_and_code() {
    let dir = temp_dir("sorted");
    write_base_feed(&dir);
    write_file(
        &dir,
        "routes.txt",
        "route_id,route_short_name,route_long_name,route_type\nR1,,,3\nR2,,,3\n",
    );

    let outcome = validate_dir(&dir);

    let positions: Vec<(String, u64, String)> = outcome
        .notices
        .iter()
        .map(|notice| {
            (
                notice.file.clone().unwrap_or_default(),
                notice.row.unwrap_or(0),
                notice.code.clone(),
            )
        })
        .collect();
    let mut sorted = positions.clone();
    sorted.sort();
    assert_eq!(positions, sorted);

    fs::remove_dir_all(&dir).ok();
}
