//! Scoped, thread-local validation settings.
//!
//! The validation date and country code are ambient inputs to a handful of
//! rules. They are seated with RAII guards so nested runs (and tests) can
//! override them without leaking state, and the dispatcher re-seats them on
//! its worker threads.

use std::cell::{Cell, RefCell};

use chrono::{NaiveDate, Utc};

thread_local! {
    static VALIDATION_DATE: Cell<Option<NaiveDate>> = const { Cell::new(None) };
    static VALIDATION_COUNTRY_CODE: RefCell<Option<String>> = const { RefCell::new(None) };
}

pub struct ValidationDateGuard {
    previous: Option<NaiveDate>,
}

impl Drop for ValidationDateGuard {
    fn drop(&mut self) {
        VALIDATION_DATE.with(|cell| cell.set(self.previous));
    }
}

pub fn set_validation_date(date: Option<NaiveDate>) -> ValidationDateGuard {
    let previous = VALIDATION_DATE.with(|cell| {
        let previous = cell.get();
        cell.set(date);
        previous
    });
    ValidationDateGuard { previous }
}

/// The date calendar-coverage rules validate against; today when unset.
pub fn validation_date() -> NaiveDate {
    VALIDATION_DATE.with(|cell| cell.get().unwrap_or_else(|| Utc::now().date_naive()))
}

pub struct ValidationCountryCodeGuard {
    previous: Option<String>,
}

impl Drop for ValidationCountryCodeGuard {
    fn drop(&mut self) {
        VALIDATION_COUNTRY_CODE.with(|cell| {
            *cell.borrow_mut() = self.previous.take();
        });
    }
}

pub fn set_validation_country_code(code: Option<String>) -> ValidationCountryCodeGuard {
    let previous = VALIDATION_COUNTRY_CODE.with(|cell| {
        let previous = cell.borrow().clone();
        *cell.borrow_mut() = code;
        previous
    });
    ValidationCountryCodeGuard { previous }
}

pub fn validation_country_code() -> Option<String> {
    VALIDATION_COUNTRY_CODE.with(|cell| cell.borrow().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_guard_restores_previous_value() {
        let first = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let second = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

        let _outer = set_validation_date(Some(first));
        assert_eq!(validation_date(), first);
        {
            let _inner = set_validation_date(Some(second));
            assert_eq!(validation_date(), second);
        }
        assert_eq!(validation_date(), first);
    }

    #[test]
    fn country_code_guard_restores_previous_value() {
        let _outer = set_validation_country_code(Some("NL".to_string()));
        {
            let _inner = set_validation_country_code(Some("DE".to_string()));
            assert_eq!(validation_country_code().as_deref(), Some("DE"));
        }
        assert_eq!(validation_country_code().as_deref(), Some("NL"));
    }
}
