//! GTFS Schedule validation engine.
//!
//! The crate loads a feed (directory or zip archive) into typed tables,
//! checks every cell against the declarative table schemas, builds key
//! indexes, resolves foreign keys, and dispatches the registered validation
//! rules. Findings are collected as [`ValidationNotice`]s; nothing in the
//! feed ever aborts a run.

pub mod csv_reader;
pub mod csv_schema;
pub mod csv_validation;
pub mod engine;
pub mod feed;
pub mod input;
pub mod notice;
pub mod progress;
pub mod rules;
pub mod validation_context;
pub mod validator;

pub use csv_reader::{CsvParseError, CsvTable};
pub use engine::{validate_input, ValidationOutcome};
pub use feed::{FeedIndexes, GtfsFeed};
pub use input::{collect_input_notices, GtfsInput, GtfsInputError, GtfsInputReader};
pub use notice::{NoticeContainer, NoticeSeverity, ValidationNotice};
pub use rules::default_runner;
pub use validation_context::{
    set_validation_country_code, set_validation_date, validation_country_code, validation_date,
};
pub use validator::{
    CancelFlag, EntityValidator, FeedValidator, TableValidator, ValidatorKind, ValidatorRunner,
};
