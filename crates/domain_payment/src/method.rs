//! Payment method types, payment methods and their status history
//!
//! Status values are declared only. Any status may follow any other; a
//! change is recorded as a [`PaymentMethodEvent`] row next to the method.

use chrono::{DateTime, Utc};
use core_kernel::{
    effective_dated, record_accessors, CustomerAccountId, IconId, JournaledPort, Labelled,
    PaymentMethodEventId, PaymentMethodId, PaymentMethodTypeId, PortError, Record, RecordMeta,
    RecordPort, RecordQuery, Relation, UserId, Validity,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// A category of payment, e.g. Direct Debit or Cheque
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentMethodType {
    pub id: PaymentMethodTypeId,
    #[validate(length(max = 2048))]
    pub internal_key: Option<String>,
    #[validate(length(max = 2048))]
    pub language_key: Option<String>,
    pub icon_tbl_id: IconId,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl PaymentMethodType {
    pub fn new(internal_key: impl Into<String>, icon_tbl_id: IconId) -> Self {
        let internal_key = internal_key.into();
        Self {
            id: PaymentMethodTypeId::new_v7(),
            language_key: Some(format!(
                "payment-method-type-{}",
                internal_key.to_lowercase().replace('_', "-")
            )),
            internal_key: Some(internal_key),
            icon_tbl_id,
            meta: RecordMeta::new(),
        }
    }
}

impl Record for PaymentMethodType {
    record_accessors!(PaymentMethodTypeId);

    fn relations(&self) -> Vec<Relation> {
        vec![Relation::protect("icon_tbl_id", self.icon_tbl_id)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "payment_method_status", rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethodStatus {
    #[default]
    Pending,
    Active,
    Cancelled,
    Failed,
    RequestingActivation,
    PendingCancellation,
    RequestingCancellation,
    FailedCancellation,
    Paused,
    CoolingOff,
}

impl Labelled for PaymentMethodStatus {
    fn label_key(&self) -> &'static str {
        match self {
            PaymentMethodStatus::Pending => "payment-method-status-pending",
            PaymentMethodStatus::Active => "payment-method-status-active",
            PaymentMethodStatus::Cancelled => "payment-method-status-cancelled",
            PaymentMethodStatus::Failed => "payment-method-status-failed",
            PaymentMethodStatus::RequestingActivation => "payment-method-status-requesting-activation",
            PaymentMethodStatus::PendingCancellation => "payment-method-status-pending-cancellation",
            PaymentMethodStatus::RequestingCancellation => "payment-method-status-requesting-cancellation",
            PaymentMethodStatus::FailedCancellation => "payment-method-status-failed-cancellation",
            PaymentMethodStatus::Paused => "payment-method-status-paused",
            PaymentMethodStatus::CoolingOff => "payment-method-status-cooling-off",
        }
    }
}

/// A customer account's instance of a payment method type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub payment_method_type_id: PaymentMethodTypeId,
    pub customer_account_id: CustomerAccountId,
    pub payment_method_status: PaymentMethodStatus,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub validity: Validity,
    pub created_dttm: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl PaymentMethod {
    pub fn new(payment_method_type_id: PaymentMethodTypeId, customer_account_id: CustomerAccountId) -> Self {
        Self {
            id: PaymentMethodId::new_v7(),
            payment_method_type_id,
            customer_account_id,
            payment_method_status: PaymentMethodStatus::default(),
            validity: Validity::default(),
            created_dttm: Utc::now(),
            meta: RecordMeta::new(),
        }
    }

    pub fn status(&self) -> PaymentMethodStatus {
        self.payment_method_status
    }

    /// Sets a new status and returns the event row describing the change
    pub fn record_status(
        &mut self,
        to_status: PaymentMethodStatus,
        at: DateTime<Utc>,
        user: Option<UserId>,
    ) -> PaymentMethodEvent {
        let from_status = std::mem::replace(&mut self.payment_method_status, to_status);
        PaymentMethodEvent {
            id: PaymentMethodEventId::new_v7(),
            payment_method_id: self.id,
            from_status: Some(from_status),
            to_status,
            event_dttm: at,
            created_user_id: user,
            meta: RecordMeta::new(),
        }
    }

    /// Records a status change and stores both the method and the event
    ///
    /// The two rows are written as one unit: if either write fails the
    /// stored method keeps its previous status and version.
    pub async fn change_status<P>(
        port: &P,
        id: PaymentMethodId,
        to_status: PaymentMethodStatus,
        at: DateTime<Utc>,
        user: Option<UserId>,
    ) -> Result<(PaymentMethod, PaymentMethodEvent), PortError>
    where
        P: RecordPort<PaymentMethod> + JournaledPort<PaymentMethod, PaymentMethodEvent> + ?Sized,
    {
        let mut method: PaymentMethod = RecordPort::<PaymentMethod>::get(port, id).await?;
        let event = method.record_status(to_status, at, user);
        let (method, event) = port.update_journaled(method, event).await?;
        info!(
            payment_method = %id,
            from = ?event.from_status,
            to = ?event.to_status,
            "Payment method status changed"
        );
        Ok((method, event))
    }

    /// Status events of a method, oldest first
    pub async fn history<P>(port: &P, id: PaymentMethodId) -> Result<Vec<PaymentMethodEvent>, PortError>
    where
        P: RecordPort<PaymentMethodEvent> + ?Sized,
    {
        let mut events = port
            .find(&RecordQuery::children_of("payment_method_id", id))
            .await?;
        events.sort_by_key(|event| event.event_dttm);
        Ok(events)
    }
}

impl Record for PaymentMethod {
    record_accessors!(PaymentMethodId);

    fn validity(&self) -> Option<&Validity> {
        Some(&self.validity)
    }

    fn relations(&self) -> Vec<Relation> {
        vec![
            Relation::protect("payment_method_type_id", self.payment_method_type_id),
            Relation::protect("customer_account_id", self.customer_account_id),
        ]
    }
}

effective_dated!(PaymentMethod);

/// Append-only record of one payment method status change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentMethodEvent {
    pub id: PaymentMethodEventId,
    pub payment_method_id: PaymentMethodId,
    pub from_status: Option<PaymentMethodStatus>,
    pub to_status: PaymentMethodStatus,
    pub event_dttm: DateTime<Utc>,
    pub created_user_id: Option<UserId>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl Record for PaymentMethodEvent {
    record_accessors!(PaymentMethodEventId);

    fn relations(&self) -> Vec<Relation> {
        vec![Relation::protect("payment_method_id", self.payment_method_id)]
    }
}
