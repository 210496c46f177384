//! Ten-digit reference numbers
//!
//! Employees, customer accounts, meter points and bills are identified to
//! people by a random ten-digit number. The database enforces uniqueness, so
//! allocation draws a number, attempts the insert and draws again when the
//! number is already taken.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::ports::{PortError, RecordPort};
use crate::record::Record;

/// A number in `1_000_000_000..=9_999_999_999`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
#[serde(try_from = "i64", into = "i64")]
pub struct ReferenceNumber(i64);

impl ReferenceNumber {
    pub const MIN: i64 = 1_000_000_000;
    pub const MAX: i64 = 9_999_999_999;

    pub fn new(value: i64) -> Result<Self, CoreError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CoreError::ReferenceOutOfRange(value))
        }
    }

    /// Draws a number uniformly from the full range using the thread RNG
    pub fn generate() -> Self {
        Self(rand::rng().random_range(Self::MIN..=Self::MAX))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ReferenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for ReferenceNumber {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ReferenceNumber> for i64 {
    fn from(number: ReferenceNumber) -> i64 {
        number.0
    }
}

/// Supplies candidate reference numbers
pub trait NumberSource: Send + Sync {
    fn next_number(&self) -> ReferenceNumber;
}

/// Draws from the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomNumberSource;

impl NumberSource for RandomNumberSource {
    fn next_number(&self) -> ReferenceNumber {
        ReferenceNumber::generate()
    }
}

/// Deterministic source for tests
#[derive(Debug)]
pub struct SeededNumberSource {
    rng: Mutex<StdRng>,
}

impl SeededNumberSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl NumberSource for SeededNumberSource {
    fn next_number(&self) -> ReferenceNumber {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        ReferenceNumber(rng.random_range(ReferenceNumber::MIN..=ReferenceNumber::MAX))
    }
}

/// A record carrying a unique reference number
pub trait Numbered: Record {
    /// Column holding the number, matched against `Duplicate` errors
    const NUMBER_FIELD: &'static str;

    fn number(&self) -> ReferenceNumber;

    fn set_number(&mut self, number: ReferenceNumber);
}

/// Inserts numbered records, redrawing the number on collisions
pub struct NumberAllocator<S = RandomNumberSource> {
    source: S,
    max_attempts: u32,
}

impl NumberAllocator<RandomNumberSource> {
    pub fn new(max_attempts: u32) -> Self {
        Self::with_source(RandomNumberSource, max_attempts)
    }
}

impl Default for NumberAllocator<RandomNumberSource> {
    fn default() -> Self {
        Self::new(5)
    }
}

impl<S: NumberSource> NumberAllocator<S> {
    pub fn with_source(source: S, max_attempts: u32) -> Self {
        Self {
            source,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Draws a fresh number from the source
    pub fn draw(&self) -> ReferenceNumber {
        self.source.next_number()
    }

    /// Inserts `record`, assigning a new number before every attempt
    ///
    /// Only a duplicate on the number column triggers a retry; any other
    /// error is returned straight away.
    pub async fn insert<T, P>(&self, store: &P, mut record: T) -> Result<T, PortError>
    where
        T: Numbered,
        P: RecordPort<T> + ?Sized,
    {
        let mut attempt = 1;
        loop {
            record.set_number(self.source.next_number());
            match store.insert(record.clone()).await {
                Ok(stored) => {
                    debug!(
                        entity = T::entity(),
                        number = %stored.number(),
                        attempt,
                        "Allocated reference number"
                    );
                    return Ok(stored);
                }
                Err(err) if err.is_duplicate_on(T::NUMBER_FIELD) && attempt < self.max_attempts => {
                    warn!(
                        entity = T::entity(),
                        number = %record.number(),
                        attempt,
                        "Reference number already taken, drawing again"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(ReferenceNumber::new(999_999_999).is_err());
        assert!(ReferenceNumber::new(1_000_000_000).is_ok());
        assert!(ReferenceNumber::new(9_999_999_999).is_ok());
        assert!(ReferenceNumber::new(10_000_000_000).is_err());
    }

    #[test]
    fn test_seeded_source_is_repeatable() {
        let a = SeededNumberSource::new(42);
        let b = SeededNumberSource::new(42);
        for _ in 0..10 {
            assert_eq!(a.next_number(), b.next_number());
        }
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        let parsed: Result<ReferenceNumber, _> = serde_json::from_str("12345");
        assert!(parsed.is_err());
        let parsed: ReferenceNumber = serde_json::from_str("1234567890").unwrap();
        assert_eq!(parsed.value(), 1_234_567_890);
    }

    #[test]
    fn test_allocator_clamps_attempts() {
        let allocator = NumberAllocator::with_source(SeededNumberSource::new(1), 0);
        assert_eq!(allocator.max_attempts(), 1);
    }
}
