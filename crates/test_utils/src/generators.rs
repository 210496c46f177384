//! Property-Based Test Generators
//!
//! Proptest strategies producing values that respect the schema's
//! invariants: in-range reference numbers, non-empty validity windows and
//! amounts with currency precision.

use chrono::{DateTime, Duration, TimeZone, Utc};
use core_kernel::{ReferenceNumber, Validity};
use domain_accounts::Title;
use domain_payment::PaymentMethodStatus;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Any ten-digit reference number
pub fn reference_number_strategy() -> impl Strategy<Value = ReferenceNumber> {
    (ReferenceNumber::MIN..=ReferenceNumber::MAX)
        .prop_map(|value| ReferenceNumber::new(value).expect("strategy stays in range"))
}

/// Instants between 2000 and 2100, to the second
pub fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    let start = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap().timestamp();
    let end = Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap().timestamp();
    (start..end).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

/// Closed windows between one second and ten years long
pub fn validity_strategy() -> impl Strategy<Value = Validity> {
    (instant_strategy(), 1i64..(10 * 365 * 24 * 3600))
        .prop_map(|(from, len)| Validity::new(from, from + Duration::seconds(len)).unwrap())
}

/// Closed or open-ended windows
pub fn any_validity_strategy() -> impl Strategy<Value = Validity> {
    prop_oneof![
        validity_strategy(),
        instant_strategy().prop_map(Validity::open_ended),
    ]
}

/// Amounts in pence, up to a million pounds either way
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..100_000_000i64).prop_map(|pence| Decimal::new(pence, 2))
}

/// Positive unit rates with four decimal places
pub fn rate_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100_000i64).prop_map(|n| Decimal::new(n, 4))
}

pub fn title_strategy() -> impl Strategy<Value = Title> {
    prop_oneof![
        Just(Title::Dr),
        Just(Title::Miss),
        Just(Title::Mr),
        Just(Title::Mrs),
        Just(Title::Ms),
        Just(Title::Prof),
    ]
}

pub fn payment_method_status_strategy() -> impl Strategy<Value = PaymentMethodStatus> {
    prop_oneof![
        Just(PaymentMethodStatus::Pending),
        Just(PaymentMethodStatus::Active),
        Just(PaymentMethodStatus::Cancelled),
        Just(PaymentMethodStatus::Failed),
        Just(PaymentMethodStatus::RequestingActivation),
        Just(PaymentMethodStatus::PendingCancellation),
        Just(PaymentMethodStatus::RequestingCancellation),
        Just(PaymentMethodStatus::FailedCancellation),
        Just(PaymentMethodStatus::Paused),
        Just(PaymentMethodStatus::CoolingOff),
    ]
}

/// UK-style postcodes such as `SW1A 1AA`
pub fn postcode_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{1,2}[0-9][0-9A-Z]? [0-9][A-Z]{2}"
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_validity_strategy_is_closed(window in validity_strategy()) {
            prop_assert!(window.valid_from < window.valid_until);
            prop_assert!(!window.is_open_ended());
        }

        #[test]
        fn test_amounts_have_two_places(amount in amount_strategy()) {
            prop_assert_eq!(amount.scale(), 2);
        }

        #[test]
        fn test_postcodes_have_a_space(postcode in postcode_strategy()) {
            prop_assert!(postcode.contains(' '));
        }
    }
}
