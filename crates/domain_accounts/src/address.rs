//! Postal addresses

use core_kernel::{record_accessors, AddressId, CountryId, Record, RecordMeta, Relation};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A postal address of up to five free-text lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Address {
    pub id: AddressId,
    #[validate(length(max = 2048))]
    pub address1: Option<String>,
    #[validate(length(max = 2048))]
    pub address2: Option<String>,
    #[validate(length(max = 2048))]
    pub address3: Option<String>,
    #[validate(length(max = 2048))]
    pub address4: Option<String>,
    #[validate(length(max = 2048))]
    pub address5: Option<String>,
    #[validate(length(max = 2048))]
    pub postcode: Option<String>,
    pub country_id: CountryId,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl Address {
    /// Creates an address from its lines, in order
    pub fn new<I, S>(country_id: CountryId, lines: I, postcode: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lines = lines.into_iter().map(Into::into);
        Self {
            id: AddressId::new_v7(),
            address1: lines.next(),
            address2: lines.next(),
            address3: lines.next(),
            address4: lines.next(),
            address5: lines.next(),
            postcode: Some(postcode.into()),
            country_id,
            meta: RecordMeta::new(),
        }
    }

    /// Non-empty lines followed by the postcode
    pub fn lines(&self) -> Vec<&str> {
        [
            &self.address1,
            &self.address2,
            &self.address3,
            &self.address4,
            &self.address5,
            &self.postcode,
        ]
        .into_iter()
        .filter_map(|line| line.as_deref())
        .filter(|line| !line.trim().is_empty())
        .collect()
    }

    /// Formats address for display
    pub fn format(&self) -> String {
        self.lines().join("\n")
    }
}

impl Record for Address {
    record_accessors!(AddressId);

    fn relations(&self) -> Vec<Relation> {
        vec![Relation::protect("country_id", self.country_id)]
    }
}
