//! Meter points and their readings

use chrono::{DateTime, Utc};
use core_kernel::{
    effective_dated, record_accessors, AddressId, CustomerAccountId, MeterPointId, MeterReadingId,
    Numbered, Record, RecordMeta, ReferenceNumber, Relation, UniqueKey, UtilityMarketId, Validity,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A supply point in one utility market, owned by a customer account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MeterPoint {
    pub id: MeterPointId,
    pub utility_market_id: UtilityMarketId,
    /// Ten-digit public identifier
    pub identifier: ReferenceNumber,
    pub last_publish_dttm: DateTime<Utc>,
    pub next_publish_dttm: DateTime<Utc>,
    pub address_id: Option<AddressId>,
    pub customer_account_id: CustomerAccountId,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl MeterPoint {
    pub fn new(
        utility_market_id: UtilityMarketId,
        customer_account_id: CustomerAccountId,
        last_publish_dttm: DateTime<Utc>,
        next_publish_dttm: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MeterPointId::new_v7(),
            utility_market_id,
            identifier: ReferenceNumber::generate(),
            last_publish_dttm,
            next_publish_dttm,
            address_id: None,
            customer_account_id,
            meta: RecordMeta::new(),
        }
    }

    pub fn with_address(mut self, address_id: AddressId) -> Self {
        self.address_id = Some(address_id);
        self
    }
}

impl Record for MeterPoint {
    record_accessors!(MeterPointId);

    fn relations(&self) -> Vec<Relation> {
        let mut relations = vec![
            Relation::protect("utility_market_id", self.utility_market_id),
            Relation::protect("customer_account_id", self.customer_account_id),
        ];
        if let Some(address_id) = self.address_id {
            relations.push(Relation::set_null("address_id", address_id));
        }
        relations
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("identifier", self.identifier)]
    }

    fn detach(&mut self, column: &'static str) {
        if column == "address_id" {
            self.address_id = None;
        }
    }
}

impl Numbered for MeterPoint {
    const NUMBER_FIELD: &'static str = "identifier";

    fn number(&self) -> ReferenceNumber {
        self.identifier
    }

    fn set_number(&mut self, number: ReferenceNumber) {
        self.identifier = number;
    }
}

/// A reading taken at a meter point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MeterReading {
    pub id: MeterReadingId,
    pub meter_point_id: MeterPointId,
    pub value: f64,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub validity: Validity,
    pub created_dttm: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl MeterReading {
    pub fn new(meter_point_id: MeterPointId, value: f64) -> Self {
        Self {
            id: MeterReadingId::new_v7(),
            meter_point_id,
            value,
            validity: Validity::default(),
            created_dttm: Utc::now(),
            meta: RecordMeta::new(),
        }
    }

    pub fn with_validity(mut self, validity: Validity) -> Self {
        self.validity = validity;
        self
    }
}

impl Record for MeterReading {
    record_accessors!(MeterReadingId);

    fn validity(&self) -> Option<&Validity> {
        Some(&self.validity)
    }

    fn relations(&self) -> Vec<Relation> {
        vec![Relation::protect("meter_point_id", self.meter_point_id)]
    }
}

effective_dated!(MeterReading);
