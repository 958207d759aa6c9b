//! The built-in rule set and its registry.

mod agency_consistency;
mod calendar_presence;
mod feed_expiration;
mod frequencies;
mod overlapping_frequency;
mod pathways;
mod route_names;
mod shapes;
mod stop_times_order;
mod stops;
mod trip_service_id;
mod unused_entities;

pub use agency_consistency::AgencyConsistencyValidator;
pub use calendar_presence::CalendarPresenceValidator;
pub use feed_expiration::FeedExpirationDateValidator;
pub use frequencies::FrequencyTimeRangeValidator;
pub use overlapping_frequency::OverlappingFrequencyValidator;
pub use pathways::PathwayLoopValidator;
pub use route_names::RouteNameValidator;
pub use shapes::SingleShapePointValidator;
pub use stop_times_order::StopTimeOrderValidator;
pub use stops::StopLocationValidator;
pub use trip_service_id::TripServiceIdValidator;
pub use unused_entities::UnusedEntityValidator;

use crate::ValidatorRunner;

/// Every built-in rule, registered explicitly. The dispatcher derives its
/// stages from the registration kinds; order within a kind is the tiebreak
/// for merging, nothing more.
pub fn default_runner() -> ValidatorRunner {
    let mut runner = ValidatorRunner::new();

    runner.register_entity(|feed| Some(&feed.routes), RouteNameValidator);
    runner.register_entity(|feed| Some(&feed.stops), StopLocationValidator);
    runner.register_entity(|feed| feed.pathways.as_ref(), PathwayLoopValidator);
    runner.register_entity(|feed| feed.frequencies.as_ref(), FrequencyTimeRangeValidator);

    runner.register_table(|feed| Some(&feed.agency), AgencyConsistencyValidator);
    runner.register_table(|feed| Some(&feed.stop_times), StopTimeOrderValidator);
    runner.register_table(|feed| feed.frequencies.as_ref(), OverlappingFrequencyValidator);
    runner.register_table(|feed| feed.shapes.as_ref(), SingleShapePointValidator);

    runner.register_feed(CalendarPresenceValidator);
    runner.register_feed(TripServiceIdValidator);
    runner.register_feed(FeedExpirationDateValidator);
    runner.register_feed(UnusedEntityValidator);

    runner
}
