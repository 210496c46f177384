//! Employees of the billing organisation

use chrono::{DateTime, Utc};
use core_kernel::{
    effective_dated, record_accessors, AddressId, EmployeeId, Numbered, Record, RecordMeta,
    ReferenceNumber, Relation, UniqueKey, UserId, Validity,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// An employee, tied one-to-one to a user identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Employee {
    pub id: EmployeeId,
    /// External user identity; unique across employees
    pub user_id: Option<UserId>,
    pub number: ReferenceNumber,
    pub address_id: Option<AddressId>,
    pub created_user_id: Option<UserId>,
    pub terminated_user_id: Option<UserId>,
    pub created_dttm: DateTime<Utc>,
    pub modified_dttm: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub validity: Validity,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl Employee {
    pub fn new(user_id: UserId, created_by: Option<UserId>) -> Self {
        let now = Utc::now();
        Self {
            id: EmployeeId::new_v7(),
            user_id: Some(user_id),
            number: ReferenceNumber::generate(),
            address_id: None,
            created_user_id: created_by,
            terminated_user_id: None,
            created_dttm: now,
            modified_dttm: now,
            validity: Validity::default(),
            meta: RecordMeta::new(),
        }
    }

    pub fn with_address(mut self, address_id: AddressId) -> Self {
        self.address_id = Some(address_id);
        self
    }
}

impl Record for Employee {
    record_accessors!(EmployeeId);

    fn validity(&self) -> Option<&Validity> {
        Some(&self.validity)
    }

    fn relations(&self) -> Vec<Relation> {
        self.address_id
            .map(|id| Relation::set_null("address_id", id))
            .into_iter()
            .collect()
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        let mut keys = vec![UniqueKey::new("number", self.number)];
        if let Some(user_id) = self.user_id {
            keys.push(UniqueKey::new("user_id", user_id));
        }
        keys
    }

    fn detach(&mut self, column: &'static str) {
        if column == "address_id" {
            self.address_id = None;
        }
    }
}

effective_dated!(Employee);

impl Numbered for Employee {
    const NUMBER_FIELD: &'static str = "number";

    fn number(&self) -> ReferenceNumber {
        self.number
    }

    fn set_number(&mut self, number: ReferenceNumber) {
        self.number = number;
    }
}
