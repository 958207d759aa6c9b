//! The pipeline: open input, load tables, build indexes, resolve references,
//! dispatch validators, hand back a deterministic notice set.
//!
//! Feed problems land in `notices` and never abort the run. Pipeline
//! problems (unreadable input, a schema cycle, a loader panic) land in
//! `system_errors` and do.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::debug;

use crate::csv_schema::topological_order;
use crate::feed::{resolve_foreign_keys, FeedIndexes};
use crate::notice::DEFAULT_MAX_NOTICES_PER_CODE;
use crate::progress::ProgressHandler;
use crate::{
    collect_input_notices, CancelFlag, GtfsFeed, GtfsInput, GtfsInputError, NoticeContainer,
    NoticeSeverity, ValidationNotice, ValidatorRunner,
};

pub struct ValidationOutcome {
    pub feed: Option<GtfsFeed>,
    pub notices: NoticeContainer,
    pub system_errors: NoticeContainer,
    /// True when the run was cancelled or died before every stage finished;
    /// the notices then describe a partial validation.
    pub aborted: bool,
}

impl ValidationOutcome {
    pub fn exit_code(&self) -> i32 {
        if !self.system_errors.is_empty() {
            2
        } else if self.notices.has_errors() {
            1
        } else {
            0
        }
    }
}

pub fn validate_input(input: &GtfsInput, runner: &ValidatorRunner) -> ValidationOutcome {
    validate_input_with(
        input,
        runner,
        DEFAULT_MAX_NOTICES_PER_CODE,
        &CancelFlag::new(),
        None,
    )
}

pub fn validate_input_with(
    input: &GtfsInput,
    runner: &ValidatorRunner,
    max_notices_per_code: usize,
    cancel: &CancelFlag,
    progress: Option<&dyn ProgressHandler>,
) -> ValidationOutcome {
    let mut notices = NoticeContainer::with_max_per_code(max_notices_per_code);
    let mut system_errors = NoticeContainer::new();

    if let Err(cycle) = topological_order() {
        system_errors.push(schema_cycle_notice(&cycle.to_string()));
        return ValidationOutcome {
            feed: None,
            notices,
            system_errors,
            aborted: true,
        };
    }

    match collect_input_notices(input) {
        Ok(input_notices) => {
            for notice in input_notices {
                notices.push(notice);
            }
        }
        Err(error) => {
            system_errors.push(input_error_notice(&error));
            return ValidationOutcome {
                feed: None,
                notices,
                system_errors,
                aborted: true,
            };
        }
    }

    let reader = input.reader();
    let load_result = catch_unwind(AssertUnwindSafe(|| {
        GtfsFeed::from_reader_with_notices(&reader, &mut notices, progress)
    }));

    match load_result {
        Ok(Ok(feed)) => {
            debug!("feed loaded, building key indexes");
            let indexes = FeedIndexes::build(&feed, &mut notices);
            resolve_foreign_keys(&feed, &indexes, &mut notices);
            let completed = runner.run_with_cancel(&feed, &mut notices, cancel, progress);
            debug!(retained = notices.len(), completed, "validation finished");
            notices.sort_for_report();
            ValidationOutcome {
                feed: Some(feed),
                notices,
                system_errors,
                aborted: !completed,
            }
        }
        Ok(Err(error)) => {
            system_errors.push(input_error_notice(&error));
            notices.sort_for_report();
            ValidationOutcome {
                feed: None,
                notices,
                system_errors,
                aborted: true,
            }
        }
        Err(panic) => {
            system_errors.push(loader_panic_notice(
                input.path().display().to_string(),
                panic_payload_message(&*panic),
            ));
            notices.sort_for_report();
            ValidationOutcome {
                feed: None,
                notices,
                system_errors,
                aborted: true,
            }
        }
    }
}

fn schema_cycle_notice(message: &str) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "schema_cycle",
        NoticeSeverity::Error,
        "declared table schemas contain a foreign-key cycle",
    );
    notice.insert_context_field("message", message);
    notice
}

fn input_error_notice(error: &GtfsInputError) -> ValidationNotice {
    let exception = match error {
        GtfsInputError::MissingPath(_) => "MissingPath",
        GtfsInputError::InvalidPath(_) => "InvalidPath",
        GtfsInputError::Io { .. } => "io::Error",
        GtfsInputError::ZipArchive { .. } => "zip::result::ZipError",
    };
    let mut notice =
        ValidationNotice::new("i_o_error", NoticeSeverity::Error, error.to_string());
    notice.insert_context_field("exception", exception);
    notice.insert_context_field("message", error.to_string());
    notice
}

fn loader_panic_notice(file: String, message: String) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "runtime_exception_in_loader_error",
        NoticeSeverity::Error,
        "runtime exception while loading gtfs",
    );
    notice.insert_context_field("exception", "panic");
    notice.insert_context_field("filename", file);
    notice.insert_context_field("message", message);
    notice
}

fn panic_payload_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        std::env::temp_dir().join(format!("{}_{}_{}", prefix, std::process::id(), nanos))
    }

    #[test]
    fn feed_without_agency_reports_missing_file_and_exit_code_1() {
        let dir = temp_dir("gtfs_engine");
        fs::create_dir_all(&dir).expect("create dir");
        fs::write(dir.join("stops.txt"), "stop_id,stop_name,stop_lat,stop_lon\nS1,Main St,1.0,2.0\n")
            .expect("write");
        fs::write(dir.join("routes.txt"), "route_id,route_type,route_long_name\nR1,3,Blue Line\n")
            .expect("write");
        fs::write(
            dir.join("trips.txt"),
            "route_id,service_id,trip_id\nR1,SVC,T1\n",
        )
        .expect("write");
        fs::write(
            dir.join("stop_times.txt"),
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\nT1,08:00:00,08:00:00,S1,1\n",
        )
        .expect("write");
        fs::write(
            dir.join("calendar.txt"),
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\nSVC,1,1,1,1,1,0,0,20250101,20301231\n",
        )
        .expect("write");

        let input = GtfsInput::from_path(&dir).expect("input");
        let runner = crate::default_runner();
        let outcome = validate_input(&input, &runner);

        assert!(outcome.feed.is_some());
        assert!(!outcome.aborted);
        assert_eq!(outcome.notices.count("missing_required_file"), 1);
        assert_eq!(outcome.exit_code(), 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unreadable_input_is_a_system_error() {
        let result = GtfsInput::from_path("/no/such/feed");
        assert!(result.is_err());
    }
}
