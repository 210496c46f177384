//! Customer accounts
//!
//! The account is the hub of the schema: meter points, bill periods, bills,
//! payment methods and charges all hang off it.

use chrono::{DateTime, Utc};
use core_kernel::{
    effective_dated, record_accessors, AddressId, BillingCycleId, CurrencyId, CustomerAccountId,
    Numbered, Record, RecordMeta, ReferenceNumber, Relation, UniqueKey, UserId, Validity,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A customer's billing account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CustomerAccount {
    pub id: CustomerAccountId,
    pub user_id: Option<UserId>,
    pub number: ReferenceNumber,
    pub address_id: Option<AddressId>,
    pub created_dttm: DateTime<Utc>,
    pub created_user_id: Option<UserId>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub validity: Validity,
    pub currency_id: CurrencyId,
    pub sales_tax_exempt: bool,
    pub terminated_user_id: Option<UserId>,
    #[validate(length(max = 2048))]
    pub company_name: Option<String>,
    pub company_number: i64,
    pub billing_cycle_id: BillingCycleId,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl CustomerAccount {
    pub fn new(currency_id: CurrencyId, billing_cycle_id: BillingCycleId, company_number: i64) -> Self {
        Self {
            id: CustomerAccountId::new_v7(),
            user_id: None,
            number: ReferenceNumber::generate(),
            address_id: None,
            created_dttm: Utc::now(),
            created_user_id: None,
            validity: Validity::default(),
            currency_id,
            sales_tax_exempt: false,
            terminated_user_id: None,
            company_name: None,
            company_number,
            billing_cycle_id,
            meta: RecordMeta::new(),
        }
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_address(mut self, address_id: AddressId) -> Self {
        self.address_id = Some(address_id);
        self
    }

    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }
}

impl Record for CustomerAccount {
    record_accessors!(CustomerAccountId);

    fn validity(&self) -> Option<&Validity> {
        Some(&self.validity)
    }

    fn relations(&self) -> Vec<Relation> {
        let mut relations = vec![
            Relation::protect("currency_id", self.currency_id),
            Relation::protect("billing_cycle_id", self.billing_cycle_id),
        ];
        if let Some(address_id) = self.address_id {
            relations.push(Relation::set_null("address_id", address_id));
        }
        relations
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("number", self.number)]
    }

    fn detach(&mut self, column: &'static str) {
        if column == "address_id" {
            self.address_id = None;
        }
    }
}

effective_dated!(CustomerAccount);

impl Numbered for CustomerAccount {
    const NUMBER_FIELD: &'static str = "number";

    fn number(&self) -> ReferenceNumber {
        self.number
    }

    fn set_number(&mut self, number: ReferenceNumber) {
        self.number = number;
    }
}
