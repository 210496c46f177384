//! Bills

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{
    record_accessors, BillId, BillPeriodId, CurrencyId, CustomerAccountId, Labelled, Numbered,
    Record, RecordMeta, ReferenceNumber, Relation, UniqueKey, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "bill_status", rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    Accepted,
    #[default]
    Draft,
    ReadyForAcceptance,
    AcceptancePending,
}

impl Labelled for BillStatus {
    fn label_key(&self) -> &'static str {
        match self {
            BillStatus::Accepted => "bill-status-accepted",
            BillStatus::Draft => "bill-status-draft",
            BillStatus::ReadyForAcceptance => "bill-status-ready-for-acceptance",
            BillStatus::AcceptancePending => "bill-status-acceptance-pending",
        }
    }
}

/// Monetary totals of a bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BillAmounts {
    pub net_amount: Decimal,
    pub gross_amount: Decimal,
    pub sales_tax_amount: Decimal,
}

/// A bill issued to a customer account for one bill period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Bill {
    pub id: BillId,
    pub customer_account_id: CustomerAccountId,
    pub bill_period_id: BillPeriodId,
    pub billed_from_dttm: DateTime<Utc>,
    pub billed_to_dttm: DateTime<Utc>,
    pub number: ReferenceNumber,
    pub description: String,
    /// Revision of the bill document; unrelated to `meta.version_no`
    pub version_number: i32,
    pub created_dttm: DateTime<Utc>,
    pub created_user_id: Option<UserId>,
    pub issue_dt: NaiveDate,
    pub due_dt: NaiveDate,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub amounts: BillAmounts,
    pub currency_id: CurrencyId,
    pub status: BillStatus,
    pub accepted_dttm: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

/// Everything a new bill needs besides its defaults
#[derive(Debug, Clone)]
pub struct NewBill {
    pub customer_account_id: CustomerAccountId,
    pub bill_period_id: BillPeriodId,
    pub billed_from_dttm: DateTime<Utc>,
    pub billed_to_dttm: DateTime<Utc>,
    pub description: String,
    pub issue_dt: NaiveDate,
    pub due_dt: NaiveDate,
    pub amounts: BillAmounts,
    pub currency_id: CurrencyId,
    pub created_user_id: Option<UserId>,
}

impl Bill {
    pub fn new(new: NewBill) -> Self {
        Self {
            id: BillId::new_v7(),
            customer_account_id: new.customer_account_id,
            bill_period_id: new.bill_period_id,
            billed_from_dttm: new.billed_from_dttm,
            billed_to_dttm: new.billed_to_dttm,
            number: ReferenceNumber::generate(),
            description: new.description,
            version_number: 1,
            created_dttm: Utc::now(),
            created_user_id: new.created_user_id,
            issue_dt: new.issue_dt,
            due_dt: new.due_dt,
            amounts: new.amounts,
            currency_id: new.currency_id,
            status: BillStatus::default(),
            accepted_dttm: None,
            meta: RecordMeta::new(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == BillStatus::Accepted
    }

    /// Sets the status to accepted and stamps the acceptance time
    pub fn mark_accepted(&mut self, at: DateTime<Utc>) {
        self.status = BillStatus::Accepted;
        self.accepted_dttm = Some(at);
    }
}

impl Record for Bill {
    record_accessors!(BillId);

    fn relations(&self) -> Vec<Relation> {
        vec![
            Relation::protect("customer_account_id", self.customer_account_id),
            Relation::protect("bill_period_id", self.bill_period_id),
            Relation::protect("currency_id", self.currency_id),
        ]
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("number", self.number)]
    }
}

impl Numbered for Bill {
    const NUMBER_FIELD: &'static str = "number";

    fn number(&self) -> ReferenceNumber {
        self.number
    }

    fn set_number(&mut self, number: ReferenceNumber) {
        self.number = number;
    }
}
