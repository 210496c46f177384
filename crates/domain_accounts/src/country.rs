//! Country reference data

use core_kernel::{record_accessors, CountryId, Record, RecordMeta};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A country addresses can be located in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Country {
    pub id: CountryId,
    #[validate(length(max = 2048))]
    pub internal_key: Option<String>,
    /// Label catalog key, e.g. `country-gb`
    #[validate(length(max = 2048))]
    pub language_key: Option<String>,
    #[validate(length(max = 2048))]
    pub iso_code: Option<String>,
    #[validate(length(max = 2048))]
    pub dial_code: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl Country {
    pub fn new(iso_code: impl Into<String>, dial_code: impl Into<String>) -> Self {
        let iso_code = iso_code.into();
        Self {
            id: CountryId::new_v7(),
            internal_key: Some(iso_code.to_uppercase()),
            language_key: Some(format!("country-{}", iso_code.to_lowercase())),
            iso_code: Some(iso_code),
            dial_code: Some(dial_code.into()),
            meta: RecordMeta::new(),
        }
    }

    /// Display name from the label catalog
    pub fn display_name(&self) -> Option<String> {
        self.language_key.as_deref().and_then(core_kernel::labels::resolve)
    }
}

impl Record for Country {
    record_accessors!(CountryId);
}
