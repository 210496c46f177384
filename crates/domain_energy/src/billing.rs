//! Billing cycles and bill periods

use chrono::{DateTime, Utc};
use core_kernel::{
    record_accessors, BillPeriodId, BillingCycleId, CustomerAccountId, Labelled, Record,
    RecordMeta, Relation, TemporalError, Validity,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A named billing schedule, e.g. "Monthly"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BillingCycle {
    pub id: BillingCycleId,
    #[validate(length(max = 2048))]
    pub name: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl BillingCycle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: BillingCycleId::new_v7(),
            name: Some(name.into()),
            meta: RecordMeta::new(),
        }
    }
}

impl Record for BillingCycle {
    record_accessors!(BillingCycleId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "bill_period_status", rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillPeriodStatus {
    #[default]
    Open,
    Closed,
}

impl Labelled for BillPeriodStatus {
    fn label_key(&self) -> &'static str {
        match self {
            BillPeriodStatus::Open => "bill-period-status-open",
            BillPeriodStatus::Closed => "bill-period-status-closed",
        }
    }
}

/// The span of time a bill is produced for
///
/// The range is explicit; unlike effective-dated rows it has no defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BillPeriod {
    pub id: BillPeriodId,
    pub customer_account_id: CustomerAccountId,
    pub status: BillPeriodStatus,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub period: Validity,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl BillPeriod {
    pub fn new(
        customer_account_id: CustomerAccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Self, TemporalError> {
        Ok(Self {
            id: BillPeriodId::new_v7(),
            customer_account_id,
            status: BillPeriodStatus::default(),
            period: Validity::new(from, to)?,
            meta: RecordMeta::new(),
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == BillPeriodStatus::Open
    }

    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.period.is_effective_at(at)
    }
}

impl Record for BillPeriod {
    record_accessors!(BillPeriodId);

    fn relations(&self) -> Vec<Relation> {
        vec![Relation::protect("customer_account_id", self.customer_account_id)]
    }
}
