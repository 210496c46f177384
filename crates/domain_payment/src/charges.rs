//! Tariff charges applied to a customer account

use core_kernel::{
    effective_dated, record_accessors, ChargesId, CustomerAccountId, Record, RecordMeta, Relation,
    Validity,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Standing charge and unit rate in effect for an account
///
/// A rate change supersedes the row rather than editing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Charges {
    pub id: ChargesId,
    pub customer_account_id: CustomerAccountId,
    pub standing_charge: Decimal,
    pub unit_rate: Decimal,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub validity: Validity,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl Charges {
    pub fn new(customer_account_id: CustomerAccountId, standing_charge: Decimal, unit_rate: Decimal) -> Self {
        Self {
            id: ChargesId::new_v7(),
            customer_account_id,
            standing_charge,
            unit_rate,
            validity: Validity::default(),
            meta: RecordMeta::new(),
        }
    }

    /// New rates for the same account, as a row to supersede this one
    pub fn revised(&self, standing_charge: Decimal, unit_rate: Decimal) -> Self {
        Self::new(self.customer_account_id, standing_charge, unit_rate)
    }
}

impl Record for Charges {
    record_accessors!(ChargesId);

    fn validity(&self) -> Option<&Validity> {
        Some(&self.validity)
    }

    fn relations(&self) -> Vec<Relation> {
        vec![Relation::protect("customer_account_id", self.customer_account_id)]
    }
}

effective_dated!(Charges);
