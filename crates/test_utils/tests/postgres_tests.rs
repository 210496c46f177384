//! Store behaviour against a real PostgreSQL
//!
//! These tests start a container and are ignored by default:
//!
//! ```text
//! cargo test -p test_utils --test postgres_tests -- --ignored
//! ```

use core_kernel::{
    end_of_time, EffectiveDatedPort, HealthCheckable, JournaledPort, NumberAllocator,
    PaymentMethodId, PortError, RecordPort, RecordQuery,
};
use domain_accounts::{Address, ContactVersion, Country, CustomerAccount, Employee};
use domain_energy::{Bill, MeterPoint, MeterReading};
use domain_payment::{Charges, PaymentMethod, PaymentMethodStatus};
use infra_db::PgRecordStore;
use rust_decimal_macros::dec;
use test_utils::{
    assert_duplicate_on, assert_missing_reference, assert_open_ended, assert_protected,
    assert_stale, create_isolated_test_database, get_shared_test_database, AccountGraph,
    FakeFixtures, PgPorts, ReferenceFixtures, TemporalFixtures,
};

async fn seeded(ports: &PgPorts) -> AccountGraph {
    AccountGraph::builder().build().seed(ports).await.unwrap()
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_health_check() {
    let db = get_shared_test_database().await;
    let store = PgRecordStore::<Country>::new(db.pool().clone());
    let health = store.health_check().await;
    assert!(health.is_healthy());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_round_trip_keeps_every_column() {
    let db = get_shared_test_database().await;
    let ports = db.ports();
    let graph = seeded(&ports).await;

    let account: CustomerAccount = ports.get(graph.account.id).await.unwrap();
    assert_eq!(account.number, graph.account.number);
    assert_eq!(account.validity, graph.account.validity);
    assert_eq!(account.meta.version_no, 1);

    let charges: Charges = ports.get(graph.charges.id).await.unwrap();
    assert_eq!(charges.unit_rate, graph.charges.unit_rate);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_end_defaults_to_the_sentinel() {
    let db = get_shared_test_database().await;
    let ports = db.ports();
    let graph = seeded(&ports).await;

    let employee = NumberAllocator::default()
        .insert(&ports, graph.employee(Default::default()))
        .await
        .unwrap();
    let stored: Employee = ports.get(employee.id).await.unwrap();
    assert_open_ended(&stored.validity);
    assert_eq!(stored.validity.valid_until, end_of_time());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_referenced_rows_are_protected() {
    let db = get_shared_test_database().await;
    let ports = db.ports();
    let graph = seeded(&ports).await;

    assert_protected(&RecordPort::<Country>::delete(&ports, graph.country.id).await);
    assert_protected(&RecordPort::<CustomerAccount>::delete(&ports, graph.account.id).await);
    assert!(RecordPort::<CustomerAccount>::exists(&ports, graph.account.id).await.unwrap());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_unreferenced_row_can_be_deleted() {
    let db = get_shared_test_database().await;
    let ports = db.ports();
    let country = RecordPort::<Country>::insert(&ports, Country::new("IE", "+353")).await.unwrap();
    let address = RecordPort::<Address>::insert(&ports, FakeFixtures::address(country.id))
        .await
        .unwrap();

    RecordPort::<Address>::delete(&ports, address.id).await.unwrap();
    RecordPort::<Country>::delete(&ports, country.id).await.unwrap();
    assert!(!RecordPort::<Country>::exists(&ports, country.id).await.unwrap());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_duplicate_number_is_reported_on_the_column() {
    let db = get_shared_test_database().await;
    let ports = db.ports();
    let graph = seeded(&ports).await;

    let mut clash = MeterPoint::new(
        graph.market.id,
        graph.account.id,
        TemporalFixtures::year_start(),
        TemporalFixtures::mid_year(),
    );
    clash.identifier = graph.meter_point.identifier;
    assert_duplicate_on(&RecordPort::<MeterPoint>::insert(&ports, clash).await, "identifier");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_unknown_parent_is_a_missing_reference() {
    let db = get_shared_test_database().await;
    let ports = db.ports();
    let orphan = FakeFixtures::address(Default::default());
    assert_missing_reference(&RecordPort::<Address>::insert(&ports, orphan).await, "country_id");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_soft_deleted_row_is_still_retrievable() {
    let db = create_isolated_test_database().await.unwrap();
    let ports = db.ports();
    let country = RecordPort::<Country>::insert(&ports, ReferenceFixtures::united_kingdom())
        .await
        .unwrap();

    let deleted = RecordPort::<Country>::soft_delete(&ports, country.id).await.unwrap();
    assert!(deleted.meta.delete_fl);
    assert_eq!(deleted.meta.version_no, 2);

    let read: Country = ports.get(country.id).await.unwrap();
    assert!(read.meta.delete_fl);

    let live: Vec<Country> = ports.find(&RecordQuery::new()).await.unwrap();
    assert!(live.is_empty());
    let all: Vec<Country> = ports.find(&RecordQuery::new().including_deleted()).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_supersede_splits_the_window() {
    let db = get_shared_test_database().await;
    let ports = db.ports();
    let graph = seeded(&ports).await;
    let at = TemporalFixtures::mid_year();

    let (old, new) = EffectiveDatedPort::<Charges>::supersede(
        &ports,
        graph.charges.id,
        at,
        graph.charges.revised(dec!(0.5000), dec!(0.3000)),
    )
    .await
    .unwrap();
    assert_eq!(old.validity.valid_until, at);
    assert_eq!(old.meta.version_no, 2);
    assert_eq!(new.validity.valid_from, at);

    let query = RecordQuery::children_of("customer_account_id", graph.account.id);
    let before: Vec<Charges> = ports
        .find(&query.clone().effective_at(TemporalFixtures::year_start()))
        .await
        .unwrap();
    let after: Vec<Charges> = ports.find(&query.effective_at(at)).await.unwrap();
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].unit_rate, graph.charges.unit_rate);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].unit_rate, dec!(0.3000));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_readings_effective_at() {
    let db = get_shared_test_database().await;
    let ports = db.ports();
    let graph = seeded(&ports).await;
    let first = RecordPort::<MeterReading>::insert(
        &ports,
        graph.reading(100.0, TemporalFixtures::year_start()),
    )
    .await
    .unwrap();
    let at = TemporalFixtures::mid_year();
    EffectiveDatedPort::<MeterReading>::supersede(&ports, first.id, at, graph.reading(250.0, at))
        .await
        .unwrap();

    let current: Vec<MeterReading> = ports
        .find(&RecordQuery::children_of("meter_point_id", graph.meter_point.id).effective_at(at))
        .await
        .unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].value, 250.0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_stale_update_is_rejected() {
    let db = get_shared_test_database().await;
    let ports = db.ports();
    let graph = seeded(&ports).await;
    let bill = NumberAllocator::default()
        .insert(&ports, graph.draft_bill())
        .await
        .unwrap();

    let mut first = bill.clone();
    first.description = "Electricity (revised)".into();
    let updated: Bill = ports.update(first).await.unwrap();
    assert_eq!(updated.meta.version_no, 2);

    assert_stale(&ports.update(bill).await);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_missing_row_is_not_found() {
    let db = get_shared_test_database().await;
    let ports = db.ports();
    let result = RecordPort::<Country>::get(&ports, Default::default()).await;
    assert!(matches!(result, Err(PortError::NotFound { .. })));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_deleted_row_cannot_be_superseded() {
    let db = get_shared_test_database().await;
    let ports = db.ports();
    let graph = seeded(&ports).await;
    RecordPort::<Charges>::soft_delete(&ports, graph.charges.id).await.unwrap();

    let result = EffectiveDatedPort::<Charges>::supersede(
        &ports,
        graph.charges.id,
        TemporalFixtures::mid_year(),
        graph.charges.revised(dec!(0.5000), dec!(0.3000)),
    )
    .await;
    assert!(matches!(result, Err(PortError::Conflict { .. })));

    let all: Vec<Charges> = ports
        .find(&RecordQuery::children_of("customer_account_id", graph.account.id).including_deleted())
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_failed_event_rolls_back_status_change() {
    let db = get_shared_test_database().await;
    let ports = db.ports();
    let graph = seeded(&ports).await;

    let mut method = graph.payment_method.clone();
    let mut event =
        method.record_status(PaymentMethodStatus::Active, TemporalFixtures::mid_year(), None);
    event.payment_method_id = PaymentMethodId::new();
    let result = ports.update_journaled(method, event).await;
    assert_missing_reference(&result.map(|(method, _)| method), "payment_method_id");

    let stored: PaymentMethod = ports.get(graph.payment_method.id).await.unwrap();
    assert_eq!(stored.status(), PaymentMethodStatus::Pending);
    assert_eq!(stored.meta.version_no, 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_invalid_email_never_reaches_the_table() {
    let db = get_shared_test_database().await;
    let ports = db.ports();
    let graph = seeded(&ports).await;

    let bad = ContactVersion::new(graph.contact.id, graph.address.id, "not-an-email");
    let result = RecordPort::<ContactVersion>::insert(&ports, bad).await;
    assert!(matches!(result, Err(PortError::Validation { field: Some(ref f), .. }) if f == "email"));
}
