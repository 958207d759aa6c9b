//! Typed GTFS Schedule model: service dates, times of day, colors, the
//! closed enum sets, and one row record per feed table.

mod enums;
mod records;
mod values;

pub use enums::*;
pub use records::*;
pub use values::{GtfsColor, GtfsDate, GtfsParseError, GtfsTime};
