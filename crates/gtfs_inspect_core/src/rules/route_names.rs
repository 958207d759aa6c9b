use crate::feed::ROUTES_FILE;
use crate::{EntityValidator, NoticeContainer, NoticeSeverity, ValidationNotice};
use gtfs_inspect_model::Route;

const CODE_ROUTE_BOTH_NAMES_MISSING: &str = "route_both_short_and_long_name_missing";
const CODE_ROUTE_SHORT_NAME_TOO_LONG: &str = "route_short_name_too_long";
const CODE_ROUTE_NAMES_EQUAL: &str = "route_short_and_long_name_equal";
const CODE_ROUTE_LONG_NAME_CONTAINS_SHORT: &str = "route_long_name_contains_short_name";
const CODE_ROUTE_DESC_SAME_AS_NAME: &str = "same_name_and_description_for_route";

const MAX_SHORT_NAME_LENGTH: usize = 12;

/// Name rules for a single route: at least one of short/long name, sane
/// lengths, and no redundancy between the two names or the description.
#[derive(Debug, Default)]
pub struct RouteNameValidator;

impl EntityValidator<Route> for RouteNameValidator {
    fn name(&self) -> &'static str {
        "route_names"
    }

    fn validate_row(&self, route: &Route, row_number: u64, notices: &mut NoticeContainer) {
        let short_name = route
            .route_short_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let long_name = route
            .route_long_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        if short_name.is_none() && long_name.is_none() {
            let mut notice = ValidationNotice::new(
                CODE_ROUTE_BOTH_NAMES_MISSING,
                NoticeSeverity::Error,
                "route_short_name and route_long_name are both missing",
            );
            notice.file = Some(ROUTES_FILE.to_string());
            notice.row = Some(row_number);
            notice.insert_context_field("csvRowNumber", row_number);
            notice.insert_context_field("routeId", route.route_id.as_str());
            notices.push(notice);
            return;
        }

        if let Some(short) = short_name {
            if short.chars().count() > MAX_SHORT_NAME_LENGTH {
                let mut notice = ValidationNotice::new(
                    CODE_ROUTE_SHORT_NAME_TOO_LONG,
                    NoticeSeverity::Warning,
                    "route_short_name is too long",
                );
                notice.file = Some(ROUTES_FILE.to_string());
                notice.row = Some(row_number);
                notice.insert_context_field("csvRowNumber", row_number);
                notice.insert_context_field("routeId", route.route_id.as_str());
                notice.insert_context_field("routeShortName", short);
                notices.push(notice);
            }
        }

        if let (Some(short), Some(long)) = (short_name, long_name) {
            if short.eq_ignore_ascii_case(long) {
                let mut notice = ValidationNotice::new(
                    CODE_ROUTE_NAMES_EQUAL,
                    NoticeSeverity::Warning,
                    "route_short_name and route_long_name are equal",
                );
                notice.file = Some(ROUTES_FILE.to_string());
                notice.row = Some(row_number);
                notice.insert_context_field("csvRowNumber", row_number);
                notice.insert_context_field("routeId", route.route_id.as_str());
                notice.insert_context_field("routeLongName", long);
                notice.insert_context_field("routeShortName", short);
                notices.push(notice);
            } else if long_name_starts_with_short_name(long, short) {
                let mut notice = ValidationNotice::new(
                    CODE_ROUTE_LONG_NAME_CONTAINS_SHORT,
                    NoticeSeverity::Warning,
                    "route_long_name begins with route_short_name",
                );
                notice.file = Some(ROUTES_FILE.to_string());
                notice.row = Some(row_number);
                notice.insert_context_field("csvRowNumber", row_number);
                notice.insert_context_field("routeId", route.route_id.as_str());
                notice.insert_context_field("routeLongName", long);
                notice.insert_context_field("routeShortName", short);
                notices.push(notice);
            }
        }

        if let Some(route_desc) = route.route_desc.as_deref().map(str::trim) {
            if route_desc.is_empty() {
                return;
            }
            if let Some(short) = short_name {
                if route_desc.eq_ignore_ascii_case(short) {
                    notices.push(desc_same_as_name_notice(
                        route,
                        row_number,
                        route_desc,
                        "route_short_name",
                    ));
                    return;
                }
            }
            if let Some(long) = long_name {
                if route_desc.eq_ignore_ascii_case(long) {
                    notices.push(desc_same_as_name_notice(
                        route,
                        row_number,
                        route_desc,
                        "route_long_name",
                    ));
                }
            }
        }
    }
}

/// Literal prefix match with a boundary character. The short name is never
/// interpolated into a regex, so regex metacharacters in it stay inert.
fn long_name_starts_with_short_name(long: &str, short: &str) -> bool {
    if !long
        .to_ascii_lowercase()
        .starts_with(&short.to_ascii_lowercase())
    {
        return false;
    }
    let remainder = &long[short.len()..];
    remainder
        .chars()
        .next()
        .map(|ch| ch.is_whitespace() || ch == '-' || ch == '(')
        .unwrap_or(false)
}

fn desc_same_as_name_notice(
    route: &Route,
    row_number: u64,
    route_desc: &str,
    specified_field: &str,
) -> ValidationNotice {
    let mut notice = ValidationNotice::new(
        CODE_ROUTE_DESC_SAME_AS_NAME,
        NoticeSeverity::Warning,
        "route_desc duplicates a route name",
    );
    notice.file = Some(ROUTES_FILE.to_string());
    notice.row = Some(row_number);
    notice.insert_context_field("csvRowNumber", row_number);
    notice.insert_context_field("routeDesc", route_desc);
    notice.insert_context_field("routeId", route.route_id.as_str());
    notice.insert_context_field("specifiedField", specified_field);
    notice
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(id: &str, short: Option<&str>, long: Option<&str>) -> Route {
        Route {
            route_id: id.to_string(),
            route_short_name: short.map(str::to_string),
            route_long_name: long.map(str::to_string),
            ..Default::default()
        }
    }

    fn run(route: &Route) -> NoticeContainer {
        let mut notices = NoticeContainer::new();
        RouteNameValidator.validate_row(route, 2, &mut notices);
        notices
    }

    #[test]
    fn flags_route_with_no_names() {
        let notices = run(&route("R1", None, None));
        assert_eq!(notices.count(CODE_ROUTE_BOTH_NAMES_MISSING), 1);
    }

    #[test]
    fn flags_too_long_short_name() {
        let notices = run(&route("R2", Some("ABCDEFGHIJKLMN"), Some("Blue Line")));
        assert_eq!(notices.count(CODE_ROUTE_SHORT_NAME_TOO_LONG), 1);
    }

    #[test]
    fn twelve_character_short_name_is_fine() {
        let notices = run(&route("R2", Some("ABCDEFGHIJKL"), Some("Blue Line")));
        assert_eq!(notices.count(CODE_ROUTE_SHORT_NAME_TOO_LONG), 0);
    }

    #[test]
    fn flags_equal_names_without_contains_notice() {
        let notices = run(&route("R3", Some("Blue"), Some("Blue")));
        assert_eq!(notices.count(CODE_ROUTE_NAMES_EQUAL), 1);
        assert_eq!(notices.count(CODE_ROUTE_LONG_NAME_CONTAINS_SHORT), 0);
    }

    #[test]
    fn flags_long_name_starting_with_short_name() {
        let notices = run(&route("R4", Some("10"), Some("10 Downtown")));
        assert_eq!(notices.count(CODE_ROUTE_LONG_NAME_CONTAINS_SHORT), 1);
    }

    #[test]
    fn regex_metacharacters_in_short_name_stay_literal() {
        // "A+" must only match a literal "A+" prefix, not "AAA".
        let notices = run(&route("R5", Some("A+"), Some("AAA Express")));
        assert_eq!(notices.count(CODE_ROUTE_LONG_NAME_CONTAINS_SHORT), 0);

        let notices = run(&route("R6", Some("A+"), Some("A+ Express")));
        assert_eq!(notices.count(CODE_ROUTE_LONG_NAME_CONTAINS_SHORT), 1);
    }

    #[test]
    fn flags_description_equal_to_name() {
        let mut subject = route("R7", Some("7"), Some("Seventh Avenue"));
        subject.route_desc = Some("Seventh Avenue".to_string());
        let notices = run(&subject);
        assert_eq!(notices.count(CODE_ROUTE_DESC_SAME_AS_NAME), 1);
    }
}
