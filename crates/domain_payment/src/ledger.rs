//! Account transactions: the ledger of an account

use chrono::{DateTime, Utc};
use core_kernel::{
    record_accessors, AccountTransactionId, BillId, CurrencyId, CustomerAccountId, Labelled,
    PaymentId, Record, RecordMeta, Relation,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::request::Payment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "transaction_type", rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Bill,
    Payment,
    Adjustment,
    Refund,
}

impl Labelled for TransactionType {
    fn label_key(&self) -> &'static str {
        match self {
            TransactionType::Bill => "transaction-type-bill",
            TransactionType::Payment => "transaction-type-payment",
            TransactionType::Adjustment => "transaction-type-adjustment",
            TransactionType::Refund => "transaction-type-refund",
        }
    }
}

/// One posting to a customer account
///
/// Debits (bills) are positive and credits (payments) negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AccountTransaction {
    pub id: AccountTransactionId,
    pub customer_account_id: CustomerAccountId,
    pub transaction_type: TransactionType,
    pub bill_id: Option<BillId>,
    pub payment_id: Option<PaymentId>,
    pub amount: Decimal,
    pub currency_id: CurrencyId,
    pub posted_dttm: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl AccountTransaction {
    fn posting(
        customer_account_id: CustomerAccountId,
        transaction_type: TransactionType,
        amount: Decimal,
        currency_id: CurrencyId,
    ) -> Self {
        Self {
            id: AccountTransactionId::new_v7(),
            customer_account_id,
            transaction_type,
            bill_id: None,
            payment_id: None,
            amount,
            currency_id,
            posted_dttm: Utc::now(),
            meta: RecordMeta::new(),
        }
    }

    /// Debit for an issued bill
    pub fn for_bill(
        customer_account_id: CustomerAccountId,
        bill_id: BillId,
        gross_amount: Decimal,
        currency_id: CurrencyId,
    ) -> Self {
        Self {
            bill_id: Some(bill_id),
            ..Self::posting(customer_account_id, TransactionType::Bill, gross_amount, currency_id)
        }
    }

    /// Credit for a received payment
    pub fn for_payment(payment: &Payment) -> Self {
        Self {
            payment_id: Some(payment.id),
            ..Self::posting(
                payment.customer_account_id,
                TransactionType::Payment,
                -payment.amount,
                payment.currency_id,
            )
        }
    }

    pub fn adjustment(customer_account_id: CustomerAccountId, amount: Decimal, currency_id: CurrencyId) -> Self {
        Self::posting(customer_account_id, TransactionType::Adjustment, amount, currency_id)
    }

    /// Money returned to the customer
    pub fn refund(customer_account_id: CustomerAccountId, amount: Decimal, currency_id: CurrencyId) -> Self {
        Self::posting(customer_account_id, TransactionType::Refund, amount.abs(), currency_id)
    }
}

impl Record for AccountTransaction {
    record_accessors!(AccountTransactionId);

    fn relations(&self) -> Vec<Relation> {
        let mut relations = vec![
            Relation::protect("customer_account_id", self.customer_account_id),
            Relation::protect("currency_id", self.currency_id),
        ];
        if let Some(bill_id) = self.bill_id {
            relations.push(Relation::protect("bill_id", bill_id));
        }
        if let Some(payment_id) = self.payment_id {
            relations.push(Relation::protect("payment_id", payment_id));
        }
        relations
    }
}
