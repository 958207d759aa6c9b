//! The emitted JSON must be a pure function of the feed: identical across
//! repeated runs and across worker-pool sizes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use gtfs_inspect_core::engine::validate_input;
use gtfs_inspect_core::{default_runner, GtfsInput};
use gtfs_inspect_report::{ReportSummary, ValidationReport};

fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{}_{}_{}", prefix, std::process::id(), nanos));
    fs::create_dir_all(&dir).expect("create dir");
    dir
}

fn write_messy_feed(dir: &Path) {
    fs::write(
        dir.join("agency.txt"),
        "agency_name,agency_url,agency_timezone\nDemo Transit,https://transit.example.com,UTC\n",
    )
    .expect("write");
    fs::write(
        dir.join("stops.txt"),
        "stop_id,stop_name,stop_lat,stop_lon\nS1,MAIN STREET,47.51,8.52\nS2,,47.52,8.53\nS1,Dup,91.5,8.54\n",
    )
    .expect("write");
    fs::write(
        dir.join("routes.txt"),
        "route_id,route_short_name,route_long_name,route_type\nR1,,,3\nR2,Blue,Blue,3\n",
    )
    .expect("write");
    fs::write(
        dir.join("trips.txt"),
        "route_id,service_id,trip_id\nR1,WEEK,T1\nRX,WEEK,T2\n",
    )
    .expect("write");
    fs::write(
        dir.join("stop_times.txt"),
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\nT1,08:00:00,08:01:00,S1,1\nT1,07:00:00,08:30:00,S2,2\n",
    )
    .expect("write");
    fs::write(
        dir.join("calendar.txt"),
        "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\nWEEK,1,1,1,1,1,0,0,20250101,20301231\n",
    )
    .expect("write");
}

fn render_report(dir: &Path) -> String {
    let input = GtfsInput::from_path(dir).expect("input");
    let runner = default_runner();
    let outcome = validate_input(&input, &runner);
    let summary = ReportSummary::new("test-version").with_outcome(&outcome);
    ValidationReport::from_outcome(&outcome, summary)
        .to_json(true)
        .expect("serialize")
}

#[test]
fn repeated_runs_produce_byte_identical_reports() {
    let dir = temp_dir("report_repeat");
    write_messy_feed(&dir);

    let first = render_report(&dir);
    let second = render_report(&dir);

    assert_eq!(first, second);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn report_does_not_depend_on_worker_count() {
    let dir = temp_dir("report_threads");
    write_messy_feed(&dir);

    let single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .expect("pool")
        .install(|| render_report(&dir));
    let parallel = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .expect("pool")
        .install(|| render_report(&dir));

    assert_eq!(single, parallel);
    fs::remove_dir_all(&dir).ok();
}
