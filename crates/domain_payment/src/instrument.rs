//! Method-specific detail rows: direct debit mandates and cheques

use chrono::NaiveDate;
use core_kernel::{record_accessors, ChequeId, DirectDebitId, PaymentMethodId, Record, RecordMeta, Relation};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Bank details behind a direct debit payment method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DirectDebit {
    pub id: DirectDebitId,
    pub payment_method_id: PaymentMethodId,
    #[validate(length(max = 2048))]
    pub sort_code: Option<String>,
    #[validate(range(min = 0))]
    pub account_no: i64,
    #[validate(length(max = 2048))]
    pub account_name: Option<String>,
    /// Mandate reference quoted to the bank
    #[validate(length(max = 2048))]
    pub reference_number: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl DirectDebit {
    pub fn new(payment_method_id: PaymentMethodId, sort_code: impl Into<String>, account_no: i64) -> Self {
        Self {
            id: DirectDebitId::new_v7(),
            payment_method_id,
            sort_code: Some(sort_code.into()),
            account_no,
            account_name: None,
            reference_number: None,
            meta: RecordMeta::new(),
        }
    }
}

impl Record for DirectDebit {
    record_accessors!(DirectDebitId);

    fn relations(&self) -> Vec<Relation> {
        vec![Relation::protect("payment_method_id", self.payment_method_id)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Cheque {
    pub id: ChequeId,
    pub payment_method_id: PaymentMethodId,
    pub cheque_no: i32,
    #[validate(length(max = 2048))]
    pub sort_code: Option<String>,
    #[validate(range(min = 0))]
    pub account_no: i64,
    pub issue_dt: NaiveDate,
    #[validate(length(max = 2048))]
    pub reference_number: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl Cheque {
    pub fn new(payment_method_id: PaymentMethodId, cheque_no: i32, account_no: i64, issue_dt: NaiveDate) -> Self {
        Self {
            id: ChequeId::new_v7(),
            payment_method_id,
            cheque_no,
            sort_code: None,
            account_no,
            issue_dt,
            reference_number: None,
            meta: RecordMeta::new(),
        }
    }
}

impl Record for Cheque {
    record_accessors!(ChequeId);

    fn relations(&self) -> Vec<Relation> {
        vec![Relation::protect("payment_method_id", self.payment_method_id)]
    }
}
