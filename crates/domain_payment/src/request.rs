//! Payment requests and settled payments

use chrono::{DateTime, Utc};
use core_kernel::{
    record_accessors, BillId, CurrencyId, CustomerAccountId, Labelled, PaymentId, PaymentMethodId,
    PaymentRequestId, Record, RecordMeta, Relation,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "payment_request_status", rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentRequestStatus {
    #[default]
    Pending,
    Requesting,
    InProgressPending,
    InProgressFailedPendingRetry,
    Successful,
    Cancelled,
    FailedPendingRetry,
    FailedRequestingAgain,
    PendingAuthorisation,
    PendingFinalAuthorisation,
}

impl Labelled for PaymentRequestStatus {
    fn label_key(&self) -> &'static str {
        use PaymentRequestStatus::*;
        match self {
            Pending => "payment-request-status-pending",
            Requesting => "payment-request-status-requesting",
            InProgressPending => "payment-request-status-in-progress-pending",
            InProgressFailedPendingRetry => "payment-request-status-in-progress-failed-pending-retry",
            Successful => "payment-request-status-successful",
            Cancelled => "payment-request-status-cancelled",
            FailedPendingRetry => "payment-request-status-failed-pending-retry",
            FailedRequestingAgain => "payment-request-status-failed-requesting-again",
            PendingAuthorisation => "payment-request-status-pending-authorisation",
            PendingFinalAuthorisation => "payment-request-status-pending-final-authorisation",
        }
    }
}

/// A request to collect money through a payment method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentRequest {
    pub id: PaymentRequestId,
    pub payment_method_id: PaymentMethodId,
    pub customer_account_id: CustomerAccountId,
    /// The bill being collected, if any
    pub bill_id: Option<BillId>,
    pub amount: Decimal,
    pub currency_id: CurrencyId,
    pub status: PaymentRequestStatus,
    pub requested_dttm: DateTime<Utc>,
    pub created_dttm: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl PaymentRequest {
    pub fn new(
        payment_method_id: PaymentMethodId,
        customer_account_id: CustomerAccountId,
        amount: Decimal,
        currency_id: CurrencyId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentRequestId::new_v7(),
            payment_method_id,
            customer_account_id,
            bill_id: None,
            amount,
            currency_id,
            status: PaymentRequestStatus::default(),
            requested_dttm: now,
            created_dttm: now,
            meta: RecordMeta::new(),
        }
    }

    pub fn for_bill(mut self, bill_id: BillId) -> Self {
        self.bill_id = Some(bill_id);
        self
    }
}

impl Record for PaymentRequest {
    record_accessors!(PaymentRequestId);

    fn relations(&self) -> Vec<Relation> {
        let mut relations = vec![
            Relation::protect("payment_method_id", self.payment_method_id),
            Relation::protect("customer_account_id", self.customer_account_id),
            Relation::protect("currency_id", self.currency_id),
        ];
        if let Some(bill_id) = self.bill_id {
            relations.push(Relation::protect("bill_id", bill_id));
        }
        relations
    }
}

/// Money received against an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: PaymentId,
    pub payment_request_id: Option<PaymentRequestId>,
    pub customer_account_id: CustomerAccountId,
    pub payment_method_id: PaymentMethodId,
    pub amount: Decimal,
    pub currency_id: CurrencyId,
    pub received_dttm: DateTime<Utc>,
    pub created_dttm: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl Payment {
    /// A payment settling the given request in full
    pub fn settling(request: &PaymentRequest, received_dttm: DateTime<Utc>) -> Self {
        Self {
            id: PaymentId::new_v7(),
            payment_request_id: Some(request.id),
            customer_account_id: request.customer_account_id,
            payment_method_id: request.payment_method_id,
            amount: request.amount,
            currency_id: request.currency_id,
            received_dttm,
            created_dttm: Utc::now(),
            meta: RecordMeta::new(),
        }
    }

    /// A payment received without a prior request
    pub fn unrequested(
        customer_account_id: CustomerAccountId,
        payment_method_id: PaymentMethodId,
        amount: Decimal,
        currency_id: CurrencyId,
        received_dttm: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PaymentId::new_v7(),
            payment_request_id: None,
            customer_account_id,
            payment_method_id,
            amount,
            currency_id,
            received_dttm,
            created_dttm: Utc::now(),
            meta: RecordMeta::new(),
        }
    }
}

impl Record for Payment {
    record_accessors!(PaymentId);

    fn relations(&self) -> Vec<Relation> {
        let mut relations = vec![
            Relation::protect("customer_account_id", self.customer_account_id),
            Relation::protect("payment_method_id", self.payment_method_id),
            Relation::protect("currency_id", self.currency_id),
        ];
        if let Some(request_id) = self.payment_request_id {
            relations.push(Relation::protect("payment_request_id", request_id));
        }
        relations
    }
}
