//! Companies and their bank details

use core_kernel::{record_accessors, AddressId, CompanyId, Record, RecordMeta, Relation};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Company {
    pub id: CompanyId,
    #[validate(length(max = 2048))]
    pub name: Option<String>,
    #[validate(length(max = 2048))]
    pub sort_code: Option<String>,
    #[validate(range(min = 0))]
    pub account_no: i64,
    #[validate(length(max = 2048))]
    pub account_name: Option<String>,
    pub address_id: Option<AddressId>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl Company {
    pub fn new(name: impl Into<String>, account_no: i64) -> Self {
        Self {
            id: CompanyId::new_v7(),
            name: Some(name.into()),
            sort_code: None,
            account_no,
            account_name: None,
            address_id: None,
            meta: RecordMeta::new(),
        }
    }
}

impl Record for Company {
    record_accessors!(CompanyId);

    fn relations(&self) -> Vec<Relation> {
        self.address_id
            .map(|id| Relation::set_null("address_id", id))
            .into_iter()
            .collect()
    }

    fn detach(&mut self, column: &'static str) {
        if column == "address_id" {
            self.address_id = None;
        }
    }
}
