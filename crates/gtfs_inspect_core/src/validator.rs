//! Validator traits and the dispatch engine.
//!
//! Rules come in three kinds: per-row, per-table, and cross-file. They are
//! registered explicitly at startup, type-erased behind adapters, and
//! dispatched kind by kind (entity, then table, then cross-file) so later
//! stages see a feed whose structural problems are already reported. Rows
//! fan out over the rayon pool in fixed batches; every worker writes into a
//! private container that is merged back in registration order, which keeps
//! the collected notices independent of scheduling.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::progress::ProgressHandler;
use crate::validation_context::{
    set_validation_country_code, set_validation_date, validation_country_code, validation_date,
};
use crate::{CsvTable, GtfsFeed, NoticeContainer, NoticeSeverity, ValidationNotice};

/// Rows per dispatch batch; also how often workers check the cancel flag.
pub const ROW_BATCH_SIZE: usize = 1024;

/// Shared cooperative cancellation flag. Workers drain their current batch
/// and stop picking up new work once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Inspects one row at a time. Implementations must be stateless across
/// rows; the dispatcher runs them on disjoint row ranges concurrently.
pub trait EntityValidator<T>: Send + Sync {
    fn name(&self) -> &'static str;
    fn validate_row(&self, row: &T, row_number: u64, notices: &mut NoticeContainer);
}

/// Inspects one whole table.
pub trait TableValidator<T>: Send + Sync {
    fn name(&self) -> &'static str;
    fn validate_table(&self, table: &CsvTable<T>, notices: &mut NoticeContainer);
}

/// Reads freely across the whole feed.
pub trait FeedValidator: Send + Sync {
    fn name(&self) -> &'static str;
    fn validate(&self, feed: &GtfsFeed, notices: &mut NoticeContainer);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorKind {
    Entity,
    Table,
    CrossFile,
}

trait ErasedValidator: Send + Sync {
    fn run(&self, feed: &GtfsFeed, cancel: &CancelFlag, notices: &mut NoticeContainer);
}

struct EntityAdapter<T: 'static> {
    select: fn(&GtfsFeed) -> Option<&CsvTable<T>>,
    validator: Box<dyn EntityValidator<T>>,
}

impl<T: Send + Sync> ErasedValidator for EntityAdapter<T> {
    fn run(&self, feed: &GtfsFeed, cancel: &CancelFlag, notices: &mut NoticeContainer) {
        let Some(table) = (self.select)(feed) else {
            return;
        };
        let date = validation_date();
        let country = validation_country_code();

        let batches: Vec<NoticeContainer> = table
            .rows
            .par_chunks(ROW_BATCH_SIZE)
            .enumerate()
            .map(|(batch_index, batch)| {
                let mut local = NoticeContainer::new();
                if cancel.is_cancelled() {
                    return local;
                }
                let _date_guard = set_validation_date(Some(date));
                let _country_guard = set_validation_country_code(country.clone());
                for (offset, row) in batch.iter().enumerate() {
                    let row_index = batch_index * ROW_BATCH_SIZE + offset;
                    self.validator
                        .validate_row(row, table.row_number(row_index), &mut local);
                }
                local
            })
            .collect();
        for batch in batches {
            notices.merge(batch);
        }
    }
}

struct TableAdapter<T: 'static> {
    select: fn(&GtfsFeed) -> Option<&CsvTable<T>>,
    validator: Box<dyn TableValidator<T>>,
}

impl<T: Send + Sync> ErasedValidator for TableAdapter<T> {
    fn run(&self, feed: &GtfsFeed, _cancel: &CancelFlag, notices: &mut NoticeContainer) {
        if let Some(table) = (self.select)(feed) {
            self.validator.validate_table(table, notices);
        }
    }
}

struct FeedAdapter {
    validator: Box<dyn FeedValidator>,
}

impl ErasedValidator for FeedAdapter {
    fn run(&self, feed: &GtfsFeed, _cancel: &CancelFlag, notices: &mut NoticeContainer) {
        self.validator.validate(feed, notices);
    }
}

struct Registration {
    name: &'static str,
    kind: ValidatorKind,
    runner: Box<dyn ErasedValidator>,
}

/// The explicit validator registry. Registration order is the tiebreak for
/// everything, so a given registry always produces the same notice stream.
#[derive(Default)]
pub struct ValidatorRunner {
    registrations: Vec<Registration>,
    skipped: HashSet<String>,
}

impl ValidatorRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_entity<T, V>(
        &mut self,
        select: fn(&GtfsFeed) -> Option<&CsvTable<T>>,
        validator: V,
    ) where
        T: Send + Sync + 'static,
        V: EntityValidator<T> + 'static,
    {
        self.registrations.push(Registration {
            name: validator.name(),
            kind: ValidatorKind::Entity,
            runner: Box::new(EntityAdapter {
                select,
                validator: Box::new(validator),
            }),
        });
    }

    pub fn register_table<T, V>(
        &mut self,
        select: fn(&GtfsFeed) -> Option<&CsvTable<T>>,
        validator: V,
    ) where
        T: Send + Sync + 'static,
        V: TableValidator<T> + 'static,
    {
        self.registrations.push(Registration {
            name: validator.name(),
            kind: ValidatorKind::Table,
            runner: Box::new(TableAdapter {
                select,
                validator: Box::new(validator),
            }),
        });
    }

    pub fn register_feed<V>(&mut self, validator: V)
    where
        V: FeedValidator + 'static,
    {
        self.registrations.push(Registration {
            name: validator.name(),
            kind: ValidatorKind::CrossFile,
            runner: Box::new(FeedAdapter {
                validator: Box::new(validator),
            }),
        });
    }

    /// Disables validators by name; a skipped validator contributes no
    /// notices at all.
    pub fn set_skipped(&mut self, names: impl IntoIterator<Item = String>) {
        self.skipped = names.into_iter().collect();
    }

    pub fn validator_names(&self) -> Vec<&'static str> {
        self.registrations.iter().map(|reg| reg.name).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn run(&self, feed: &GtfsFeed) -> NoticeContainer {
        let mut notices = NoticeContainer::new();
        self.run_with(feed, &mut notices);
        notices
    }

    pub fn run_with(&self, feed: &GtfsFeed, notices: &mut NoticeContainer) {
        self.run_with_cancel(feed, notices, &CancelFlag::new(), None);
    }

    /// Runs all enabled validators, kind by kind. Returns false when the
    /// cancel flag stopped the run before every stage finished.
    pub fn run_with_cancel(
        &self,
        feed: &GtfsFeed,
        notices: &mut NoticeContainer,
        cancel: &CancelFlag,
        progress: Option<&dyn ProgressHandler>,
    ) -> bool {
        let date = validation_date();
        let country = validation_country_code();
        let active: Vec<&Registration> = self
            .registrations
            .iter()
            .filter(|reg| !self.skipped.contains(reg.name))
            .collect();
        if let Some(progress) = progress {
            progress.set_total_validators(active.len());
        }

        for kind in [
            ValidatorKind::Entity,
            ValidatorKind::Table,
            ValidatorKind::CrossFile,
        ] {
            if cancel.is_cancelled() {
                return false;
            }
            let stage: Vec<&&Registration> =
                active.iter().filter(|reg| reg.kind == kind).collect();
            let results: Vec<NoticeContainer> = stage
                .par_iter()
                .map(|registration| {
                    let mut local = NoticeContainer::new();
                    if cancel.is_cancelled() {
                        return local;
                    }
                    let _date_guard = set_validation_date(Some(date));
                    let _country_guard = set_validation_country_code(country.clone());
                    if let Some(progress) = progress {
                        progress.on_start_validator(registration.name);
                    }
                    let result = catch_unwind(AssertUnwindSafe(|| {
                        registration.runner.run(feed, cancel, &mut local)
                    }));
                    if let Err(panic) = result {
                        local.push(runtime_exception_notice(
                            registration.name,
                            panic_payload_message(&*panic),
                        ));
                    }
                    if let Some(progress) = progress {
                        progress.on_finish_validator(registration.name);
                    }
                    local
                })
                .collect();
            for result in results {
                notices.merge(result);
            }
        }
        !cancel.is_cancelled()
    }
}

fn runtime_exception_notice(validator: &str, message: String) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        "runtime_exception_in_validator_error",
        NoticeSeverity::Error,
        "runtime exception while validating gtfs",
    );
    notice.insert_context_field("exception", "panic");
    notice.insert_context_field("message", message);
    notice.insert_context_field("validator", validator);
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
    use gtfs_inspect_model::Stop;

    struct StopCounter;

    impl EntityValidator<Stop> for StopCounter {
        fn name(&self) -> &'static str {
            "stop_counter"
        }

        fn validate_row(&self, _row: &Stop, row_number: u64, notices: &mut NoticeContainer) {
            notices.push(
                ValidationNotice::new("counted_stop", NoticeSeverity::Info, "saw a stop")
                    .with_location("stops.txt", "stop_id", row_number),
            );
        }
    }

    struct PanickingValidator;

    impl FeedValidator for PanickingValidator {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn validate(&self, _feed: &GtfsFeed, _notices: &mut NoticeContainer) {
            panic!("boom");
        }
    }

    fn feed_with_stops(count: usize) -> GtfsFeed {
        let mut feed = GtfsFeed::default();
        feed.stops = CsvTable {
            headers: vec!["stop_id".to_string()],
            rows: (0..count)
                .map(|index| Stop {
                    stop_id: format!("S{index}"),
                    ..Default::default()
                })
                .collect(),
            row_numbers: (0..count).map(|index| index as u64 + 2).collect(),
        };
        feed
    }

    #[test]
    fn entity_validator_visits_every_row() {
        let mut runner = ValidatorRunner::new();
        runner.register_entity(|feed| Some(&feed.stops), StopCounter);

        let feed = feed_with_stops(3000);
        let notices = runner.run(&feed);

        assert_eq!(notices.count("counted_stop"), 3000);
    }

    #[test]
    fn panic_becomes_a_runtime_exception_notice() {
        let mut runner = ValidatorRunner::new();
        runner.register_feed(PanickingValidator);

        let notices = runner.run(&GtfsFeed::default());

        assert_eq!(notices.count("runtime_exception_in_validator_error"), 1);
        let notice = notices.iter().next().unwrap();
        assert_eq!(
            notice.context.get("validator").unwrap().as_str().unwrap(),
            "panicking"
        );
    }

    #[test]
    fn skipped_validators_contribute_nothing() {
        let mut runner = ValidatorRunner::new();
        runner.register_entity(|feed| Some(&feed.stops), StopCounter);
        runner.register_feed(PanickingValidator);
        runner.set_skipped(["panicking".to_string()]);

        let notices = runner.run(&feed_with_stops(5));

        assert_eq!(notices.count("counted_stop"), 5);
        assert_eq!(notices.count("runtime_exception_in_validator_error"), 0);
    }

    #[test]
    fn cancelled_run_reports_incomplete() {
        let mut runner = ValidatorRunner::new();
        runner.register_entity(|feed| Some(&feed.stops), StopCounter);

        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut notices = NoticeContainer::new();
        let completed =
            runner.run_with_cancel(&feed_with_stops(10), &mut notices, &cancel, None);

        assert!(!completed);
    }
}
