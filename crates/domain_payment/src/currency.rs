//! Currencies

use core_kernel::{record_accessors, CurrencyId, Record, RecordMeta};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Currency {
    pub id: CurrencyId,
    #[validate(length(min = 1, max = 2048))]
    pub internal_key: String,
    #[validate(length(min = 1, max = 2048))]
    pub language_key: String,
    /// ISO 4217 code, e.g. `GBP`
    #[validate(length(min = 1, max = 2048))]
    pub iso_code: String,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl Currency {
    pub fn new(iso_code: impl Into<String>) -> Self {
        let iso_code = iso_code.into().to_uppercase();
        Self {
            id: CurrencyId::new_v7(),
            internal_key: iso_code.clone(),
            language_key: format!("currency-{}", iso_code.to_lowercase()),
            iso_code,
            meta: RecordMeta::new(),
        }
    }

    pub fn display_name(&self) -> Option<String> {
        core_kernel::labels::resolve(&self.language_key)
    }
}

impl Record for Currency {
    record_accessors!(CurrencyId);
}
