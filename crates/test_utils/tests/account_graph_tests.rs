//! Cross-crate scenarios on a seeded account graph

use async_trait::async_trait;
use chrono::Duration;
use core_kernel::{
    DomainPort, EffectiveDatedPort, InMemoryRecordStore, JournaledPort, NumberAllocator,
    PaymentMethodId, PortError, RecordPort, RecordQuery, Validity,
};
use domain_accounts::{Company, ContactVersion, CustomerAccount};
use domain_energy::{Bill, BillStatus, MeterReading};
use domain_payment::{
    AccountTransaction, Charges, DirectDebit, Payment, PaymentMethod, PaymentMethodEvent,
    PaymentMethodStatus, PaymentRequest, TransactionType,
};
use rust_decimal_macros::dec;
use test_utils::{assert_duplicate_on, assert_stale, AccountGraph, TemporalFixtures};

async fn seeded() -> (InMemoryRecordStore, AccountGraph) {
    let store = InMemoryRecordStore::new();
    let graph = AccountGraph::builder()
        .with_company("Northern Power Ltd", 4_455_667)
        .build()
        .seed(&store)
        .await
        .unwrap();
    (store, graph)
}

#[tokio::test]
async fn test_readings_selected_by_instant() {
    let (store, graph) = seeded().await;
    let january = store
        .insert(graph.reading(1200.5, TemporalFixtures::year_start()))
        .await
        .unwrap();
    let at = TemporalFixtures::mid_year();
    let (closed, july) = store
        .supersede(january.id, at, graph.reading(1830.0, at))
        .await
        .unwrap();
    assert_eq!(closed.validity.valid_until, at);

    let query = RecordQuery::children_of("meter_point_id", graph.meter_point.id);
    let spring: Vec<MeterReading> = store
        .find(&query.clone().effective_at(at - Duration::days(1)))
        .await
        .unwrap();
    let summer: Vec<MeterReading> = store.find(&query.effective_at(at)).await.unwrap();

    assert_eq!(spring.iter().map(|r| r.id).collect::<Vec<_>>(), vec![january.id]);
    assert_eq!(summer.iter().map(|r| r.id).collect::<Vec<_>>(), vec![july.id]);
}

#[tokio::test]
async fn test_charges_revision_keeps_history() {
    let (store, graph) = seeded().await;
    let at = TemporalFixtures::mid_year();
    let revised = graph.charges.revised(dec!(0.5100), dec!(0.2699));

    let (old, new) = EffectiveDatedPort::<Charges>::supersede(&store, graph.charges.id, at, revised)
        .await
        .unwrap();
    assert_eq!(old.validity.valid_until, new.validity.valid_from);
    assert_eq!(new.validity.valid_until, graph.charges.validity.valid_until);

    let all: Vec<Charges> = store
        .find(&RecordQuery::children_of("customer_account_id", graph.account.id))
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_supersede_outside_window_is_rejected() {
    let (store, graph) = seeded().await;
    let revised = graph.charges.revised(dec!(1), dec!(1));
    let result = EffectiveDatedPort::<Charges>::supersede(
        &store,
        graph.charges.id,
        TemporalFixtures::before_year(),
        revised,
    )
    .await;
    assert!(matches!(result, Err(PortError::Validation { .. })));
}

#[tokio::test]
async fn test_contact_details_change_over_time() {
    let (store, graph) = seeded().await;
    let at = TemporalFixtures::mid_year();
    let mut moved = graph.contact_version.revision();
    moved.email = "new.address@example.com".to_string();
    EffectiveDatedPort::<ContactVersion>::supersede(&store, graph.contact_version.id, at, moved)
        .await
        .unwrap();

    let before = ContactVersion::current(&store, graph.contact.id, at - Duration::seconds(1))
        .await
        .unwrap();
    let after = ContactVersion::current(&store, graph.contact.id, at).await.unwrap();
    assert_eq!(before.id, graph.contact_version.id);
    assert_eq!(after.email, "new.address@example.com");
}

#[tokio::test]
async fn test_payment_method_status_history() {
    let (store, graph) = seeded().await;
    let method_id = graph.payment_method.id;
    let t0 = TemporalFixtures::year_start();

    PaymentMethod::change_status(&store, method_id, PaymentMethodStatus::CoolingOff, t0, None)
        .await
        .unwrap();
    let (method, _) = PaymentMethod::change_status(
        &store,
        method_id,
        PaymentMethodStatus::Active,
        t0 + Duration::days(14),
        None,
    )
    .await
    .unwrap();

    assert_eq!(method.status(), PaymentMethodStatus::Active);
    assert_eq!(method.meta.version_no, 3);

    let history = PaymentMethod::history(&store, method_id).await.unwrap();
    let steps: Vec<_> = history.iter().map(|e| (e.from_status, e.to_status)).collect();
    assert_eq!(
        steps,
        vec![
            (Some(PaymentMethodStatus::Pending), PaymentMethodStatus::CoolingOff),
            (Some(PaymentMethodStatus::CoolingOff), PaymentMethodStatus::Active),
        ]
    );
}

/// Serves payment methods from a memory store but fails every journaled write
struct JournalDown {
    inner: InMemoryRecordStore,
}

impl DomainPort for JournalDown {}

#[async_trait]
impl RecordPort<PaymentMethod> for JournalDown {
    async fn insert(&self, record: PaymentMethod) -> Result<PaymentMethod, PortError> {
        RecordPort::<PaymentMethod>::insert(&self.inner, record).await
    }

    async fn get(&self, id: PaymentMethodId) -> Result<PaymentMethod, PortError> {
        RecordPort::<PaymentMethod>::get(&self.inner, id).await
    }

    async fn find(&self, query: &RecordQuery) -> Result<Vec<PaymentMethod>, PortError> {
        RecordPort::<PaymentMethod>::find(&self.inner, query).await
    }

    async fn update(&self, record: PaymentMethod) -> Result<PaymentMethod, PortError> {
        RecordPort::<PaymentMethod>::update(&self.inner, record).await
    }

    async fn soft_delete(&self, id: PaymentMethodId) -> Result<PaymentMethod, PortError> {
        RecordPort::<PaymentMethod>::soft_delete(&self.inner, id).await
    }

    async fn delete(&self, id: PaymentMethodId) -> Result<(), PortError> {
        RecordPort::<PaymentMethod>::delete(&self.inner, id).await
    }

    async fn exists(&self, id: PaymentMethodId) -> Result<bool, PortError> {
        RecordPort::<PaymentMethod>::exists(&self.inner, id).await
    }
}

#[async_trait]
impl JournaledPort<PaymentMethod, PaymentMethodEvent> for JournalDown {
    async fn update_journaled(
        &self,
        _record: PaymentMethod,
        _entry: PaymentMethodEvent,
    ) -> Result<(PaymentMethod, PaymentMethodEvent), PortError> {
        Err(PortError::connection("journal unavailable"))
    }
}

#[tokio::test]
async fn test_failed_status_change_leaves_method_untouched() {
    let (store, graph) = seeded().await;
    let method_id = graph.payment_method.id;
    let port = JournalDown { inner: store };

    let result = PaymentMethod::change_status(
        &port,
        method_id,
        PaymentMethodStatus::Active,
        TemporalFixtures::mid_year(),
        None,
    )
    .await;
    assert!(matches!(result, Err(PortError::Connection { .. })));

    let method: PaymentMethod = port.get(method_id).await.unwrap();
    assert_eq!(method.status(), PaymentMethodStatus::Pending);
    assert_eq!(method.meta.version_no, 1);
    assert!(PaymentMethod::history(&port.inner, method_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_event_rolls_back_status() {
    let (store, graph) = seeded().await;
    let mut method = graph.payment_method.clone();
    let mut event =
        method.record_status(PaymentMethodStatus::Active, TemporalFixtures::mid_year(), None);
    event.payment_method_id = PaymentMethodId::new();

    let result = store.update_journaled(method, event).await;
    assert!(matches!(result, Err(PortError::MissingReference { .. })));

    let stored: PaymentMethod = store.get(graph.payment_method.id).await.unwrap();
    assert_eq!(stored.status(), PaymentMethodStatus::Pending);
    assert_eq!(stored.meta.version_no, 1);
}

#[tokio::test]
async fn test_invalid_rows_are_rejected() {
    let (store, graph) = seeded().await;

    let bad_email = ContactVersion::new(graph.contact.id, graph.address.id, "not-an-email");
    let result = store.insert(bad_email).await;
    assert!(matches!(result, Err(PortError::Validation { field: Some(ref f), .. }) if f == "email"));

    let result = store.insert(Company::new("Acme Energy Ltd", -42)).await;
    assert!(matches!(result, Err(PortError::Validation { field: Some(ref f), .. }) if f == "account_no"));

    let mut employee = graph.employee(Default::default());
    let start = TemporalFixtures::mid_year();
    employee.validity = Validity { valid_from: start, valid_until: start };
    let result = store.insert(employee).await;
    assert!(matches!(result, Err(PortError::Validation { field: Some(ref f), .. }) if f == "from_dttm"));
}

#[tokio::test]
async fn test_validated_constructor() {
    let (_, graph) = seeded().await;
    let version = ContactVersion::new(graph.contact.id, graph.address.id, "billing@example.com");
    assert!(core_kernel::Record::validated(version).is_ok());
    assert!(core_kernel::Record::validated(Company::new("Acme", -1)).is_err());
}

#[tokio::test]
async fn test_update_cannot_break_a_stored_row() {
    let (store, graph) = seeded().await;
    let mut version = graph.contact_version.clone();
    version.email = "broken".into();

    assert!(matches!(store.update(version).await, Err(PortError::Validation { .. })));
    let stored: ContactVersion = store.get(graph.contact_version.id).await.unwrap();
    assert_eq!(stored.email, graph.contact_version.email);
}

#[tokio::test]
async fn test_deleted_charges_cannot_be_superseded() {
    let (store, graph) = seeded().await;
    RecordPort::<Charges>::soft_delete(&store, graph.charges.id).await.unwrap();

    let result = EffectiveDatedPort::<Charges>::supersede(
        &store,
        graph.charges.id,
        TemporalFixtures::mid_year(),
        graph.charges.revised(dec!(1), dec!(1)),
    )
    .await;
    assert!(matches!(result, Err(PortError::Conflict { .. })));
}

#[tokio::test]
async fn test_bill_to_payment_ledger() {
    let (store, graph) = seeded().await;
    let bill = NumberAllocator::default().insert(&store, graph.draft_bill()).await.unwrap();

    let mut accepted = bill.clone();
    accepted.mark_accepted(TemporalFixtures::issue_date().and_hms_opt(9, 0, 0).unwrap().and_utc());
    let accepted: Bill = store.update(accepted).await.unwrap();
    assert_eq!(accepted.status, BillStatus::Accepted);

    let debit = store
        .insert(AccountTransaction::for_bill(
            graph.account.id,
            bill.id,
            bill.amounts.gross_amount,
            graph.currency.id,
        ))
        .await
        .unwrap();

    let request = store
        .insert(
            PaymentRequest::new(graph.payment_method.id, graph.account.id, bill.amounts.gross_amount, graph.currency.id)
                .for_bill(bill.id),
        )
        .await
        .unwrap();
    let payment = store
        .insert(Payment::settling(&request, TemporalFixtures::mid_year()))
        .await
        .unwrap();
    let credit = store.insert(AccountTransaction::for_payment(&payment)).await.unwrap();

    assert_eq!(debit.transaction_type, TransactionType::Bill);
    assert_eq!(credit.transaction_type, TransactionType::Payment);
    assert_eq!(debit.amount + credit.amount, dec!(0));

    // The bill cannot go while the request and the ledger still point at it
    assert!(matches!(
        RecordPort::<Bill>::delete(&store, bill.id).await,
        Err(PortError::Protected { .. })
    ));
}

#[tokio::test]
async fn test_direct_debit_hangs_off_the_payment_method() {
    let (store, graph) = seeded().await;
    let mandate = store
        .insert(DirectDebit::new(graph.payment_method.id, "12-34-56", 12_345_678))
        .await
        .unwrap();
    assert_eq!(mandate.payment_method_id, graph.payment_method.id);

    assert!(matches!(
        RecordPort::<PaymentMethod>::delete(&store, graph.payment_method.id).await,
        Err(PortError::Protected { .. })
    ));
}

#[tokio::test]
async fn test_account_number_is_unique() {
    let (store, graph) = seeded().await;
    let mut clash = CustomerAccount::new(graph.currency.id, graph.billing_cycle.id, 1);
    clash.number = graph.account.number;
    assert_duplicate_on(&store.insert(clash).await, "number");
}

#[tokio::test]
async fn test_concurrent_edit_is_stale() {
    let (store, graph) = seeded().await;
    let mut first = graph.account.clone();
    let mut second = graph.account.clone();
    first.sales_tax_exempt = true;
    second.company_name = Some("Renamed Ltd".into());

    let _: CustomerAccount = store.update(first).await.unwrap();
    assert_stale(&store.update(second).await);
}
