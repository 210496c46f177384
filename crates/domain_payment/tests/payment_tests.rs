//! Tests for the payment records

use chrono::{NaiveDate, Utc};
use core_kernel::{
    labels, validate_record, CurrencyId, CustomerAccountId, IconId,
    InMemoryRecordStore, Labelled, PaymentMethodId, PaymentMethodTypeId, Record, RecordPort,
    UserId,
};
use domain_payment::{
    AccountTransaction, Charges, Cheque, Currency, DirectDebit, Payment, PaymentMethod,
    PaymentMethodEvent, PaymentMethodStatus, PaymentMethodType, PaymentRequest,
    PaymentRequestStatus, TransactionType,
};
use rust_decimal_macros::dec;

mod statuses {
    use super::*;

    #[test]
    fn test_defaults_are_pending() {
        let method = PaymentMethod::new(PaymentMethodTypeId::new(), CustomerAccountId::new());
        assert_eq!(method.status(), PaymentMethodStatus::Pending);
        assert!(method.validity.is_open_ended());

        let request = PaymentRequest::new(method.id, method.customer_account_id, dec!(42.50), CurrencyId::new());
        assert_eq!(request.status, PaymentRequestStatus::Pending);
        assert!(request.bill_id.is_none());
    }

    #[test]
    fn test_labels() {
        assert_eq!(labels::label(&PaymentMethodStatus::CoolingOff).as_deref(), Some("CoolingOff"));
        assert_eq!(
            labels::label(&PaymentRequestStatus::PendingFinalAuthorisation).as_deref(),
            Some("Pending Final Authorisation")
        );
        assert_eq!(TransactionType::Refund.label_key(), "transaction-type-refund");
    }

    #[test]
    fn test_serialized_upper_case() {
        let json = serde_json::to_string(&PaymentRequestStatus::InProgressFailedPendingRetry).unwrap();
        assert_eq!(json, "\"IN_PROGRESS_FAILED_PENDING_RETRY\"");
    }

    #[test]
    fn test_record_status_yields_event() {
        let mut method = PaymentMethod::new(PaymentMethodTypeId::new(), CustomerAccountId::new());
        let user = UserId::new();
        let at = Utc::now();

        let event = method.record_status(PaymentMethodStatus::CoolingOff, at, Some(user));
        assert_eq!(method.status(), PaymentMethodStatus::CoolingOff);
        assert_eq!(event.payment_method_id, method.id);
        assert_eq!(event.from_status, Some(PaymentMethodStatus::Pending));
        assert_eq!(event.to_status, PaymentMethodStatus::CoolingOff);
        assert_eq!(event.event_dttm, at);
        assert_eq!(event.created_user_id, Some(user));
    }

    #[test]
    fn test_any_transition_is_accepted() {
        let mut method = PaymentMethod::new(PaymentMethodTypeId::new(), CustomerAccountId::new());
        method.record_status(PaymentMethodStatus::Cancelled, Utc::now(), None);
        let event = method.record_status(PaymentMethodStatus::Active, Utc::now(), None);
        assert_eq!(event.from_status, Some(PaymentMethodStatus::Cancelled));
    }
}

mod details {
    use super::*;

    #[test]
    fn test_direct_debit_references_payment_method() {
        let method_id = PaymentMethodId::new();
        let debit = DirectDebit::new(method_id, "12-34-56", 12_345_678);
        let relation = debit.relations()[0];
        assert_eq!(relation.column, "payment_method_id");
        assert_eq!(relation.entity, "payment_method");
    }

    #[test]
    fn test_cheque_account_no_non_negative() {
        let issue = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(validate_record(&Cheque::new(PaymentMethodId::new(), 100_001, -5, issue)).is_err());
        assert!(validate_record(&Cheque::new(PaymentMethodId::new(), 100_001, 5, issue)).is_ok());
    }

    #[test]
    fn test_currency_requires_keys() {
        let mut currency = Currency::new("gbp");
        assert_eq!(currency.iso_code, "GBP");
        assert_eq!(currency.display_name().as_deref(), Some("Pound Sterling"));
        currency.iso_code.clear();
        assert!(validate_record(&currency).is_err());
    }

    #[test]
    fn test_payment_method_type_language_key() {
        let kind = PaymentMethodType::new("DIRECT_DEBIT", IconId::new());
        assert_eq!(kind.language_key.as_deref(), Some("payment-method-type-direct-debit"));
        assert_eq!(
            labels::resolve("payment-method-type-direct-debit").as_deref(),
            Some("Direct Debit")
        );
    }
}

mod ledger {
    use super::*;

    #[test]
    fn test_payment_posts_a_credit() {
        let request = PaymentRequest::new(PaymentMethodId::new(), CustomerAccountId::new(), dec!(75.00), CurrencyId::new());
        let payment = Payment::settling(&request, Utc::now());
        assert_eq!(payment.payment_request_id, Some(request.id));

        let posting = AccountTransaction::for_payment(&payment);
        assert_eq!(posting.transaction_type, TransactionType::Payment);
        assert_eq!(posting.amount, dec!(-75.00));
        assert_eq!(posting.payment_id, Some(payment.id));
    }

    #[test]
    fn test_refund_is_positive() {
        let refund = AccountTransaction::refund(CustomerAccountId::new(), dec!(-10), CurrencyId::new());
        assert_eq!(refund.amount, dec!(10));
        assert!(refund.bill_id.is_none());
    }
}

mod storage {
    use super::*;

    #[tokio::test]
    async fn test_event_requires_payment_method() {
        let store = InMemoryRecordStore::new();
        let mut method = PaymentMethod::new(PaymentMethodTypeId::new(), CustomerAccountId::new());
        let event = method.record_status(PaymentMethodStatus::Active, Utc::now(), None);
        let result: Result<PaymentMethodEvent, _> = store.insert(event).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_history_empty_for_new_method() {
        let store = InMemoryRecordStore::new();
        let history = PaymentMethod::history(&store, PaymentMethodId::new()).await.unwrap();
        assert!(history.is_empty());
    }
}

#[test]
fn test_revised_charges_keep_account() {
    let charges = Charges::new(CustomerAccountId::new(), dec!(0.45), dec!(0.28));
    let revised = charges.revised(dec!(0.50), dec!(0.30));
    assert_eq!(revised.customer_account_id, charges.customer_account_id);
    assert_ne!(revised.id, charges.id);
    assert_eq!(revised.unit_rate, dec!(0.30));
}
