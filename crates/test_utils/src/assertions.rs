//! Custom Test Assertions
//!
//! Assertion helpers for port results and validity windows with messages
//! that name the entity and column involved.

use core_kernel::{end_of_time, PortError, ReferenceNumber, Validity};
use std::fmt::Debug;

/// Asserts that a window has no explicit end
pub fn assert_open_ended(validity: &Validity) {
    assert_eq!(
        validity.valid_until,
        end_of_time(),
        "Expected open-ended window, got end {}",
        validity.valid_until
    );
}

/// Asserts that a reference number lies in the ten-digit range
pub fn assert_ten_digits(number: ReferenceNumber) {
    let value = number.value();
    assert!(
        (ReferenceNumber::MIN..=ReferenceNumber::MAX).contains(&value),
        "Reference number {} outside [{}, {}]",
        value,
        ReferenceNumber::MIN,
        ReferenceNumber::MAX
    );
}

/// Asserts that a delete was refused by a protective reference
pub fn assert_protected<T: Debug>(result: &Result<T, PortError>) {
    assert!(
        matches!(result, Err(PortError::Protected { .. })),
        "Expected Protected, got {:?}",
        result
    );
}

/// Asserts a unique-key clash on the given column
pub fn assert_duplicate_on<T: Debug>(result: &Result<T, PortError>, column: &str) {
    assert!(
        matches!(result, Err(err) if err.is_duplicate_on(column)),
        "Expected duplicate on {}, got {:?}",
        column,
        result
    );
}

/// Asserts a write rejected for a dangling foreign key
pub fn assert_missing_reference<T: Debug>(result: &Result<T, PortError>, column: &str) {
    assert!(
        matches!(result, Err(PortError::MissingReference { field, .. }) if field == column),
        "Expected missing reference on {}, got {:?}",
        column,
        result
    );
}

/// Asserts an optimistic-lock failure
pub fn assert_stale<T: Debug>(result: &Result<T, PortError>) {
    assert!(
        matches!(result, Err(PortError::StaleVersion { .. })),
        "Expected StaleVersion, got {:?}",
        result
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_open_ended() {
        assert_open_ended(&Validity::open_ended(Utc::now()));
    }

    #[test]
    #[should_panic(expected = "Expected Protected")]
    fn test_assert_protected_fails_on_ok() {
        assert_protected(&Ok::<(), PortError>(()));
    }

    #[test]
    fn test_duplicate_on_column() {
        let result: Result<(), PortError> = Err(PortError::duplicate("bill", "number", 1_234_567_890));
        assert_duplicate_on(&result, "number");
    }
}
