//! Entity-to-table mapping
//!
//! Every entity is stored in the table named by its identifier type. Rows
//! are written by serialising the record to JSON and letting PostgreSQL
//! coerce the values with `jsonb_populate_record`, so the column list of a
//! write is exactly the set of serialised fields.

use core_kernel::{EntityId, Record};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::FromRow;

use domain_accounts::{
    Address, Company, Component, ComponentGroup, Contact, ContactVersion, Country, CustomerAccount,
    Employee,
};
use domain_energy::{Bill, BillPeriod, BillingCycle, IconTbl, MeterPoint, MeterReading, UtilityMarket};
use domain_payment::{
    AccountTransaction, Charges, Cheque, Currency, DirectDebit, Payment, PaymentMethod,
    PaymentMethodEvent, PaymentMethodType, PaymentRequest,
};

use crate::error::DatabaseError;

/// Columns the store manages itself on update
pub(crate) const MANAGED_COLUMNS: [&str; 2] = ["id", "version_no"];

/// An entity with a PostgreSQL table
pub trait PgTable:
    Record + Serialize + for<'r> FromRow<'r, PgRow> + Unpin + Send + Sync + 'static
{
    /// Whether `find(effective_at)` filters on `from_dttm` / `to_dttm`
    const EFFECTIVE_DATED: bool = false;

    fn table() -> &'static str {
        <Self::Id as EntityId>::ENTITY
    }

    /// Column/value pairs for this row
    fn columns(&self) -> Result<Map<String, Value>, DatabaseError> {
        let Value::Object(fields) = serde_json::to_value(self)? else {
            return Err(DatabaseError::QueryFailed(format!(
                "{} does not serialise to a row",
                Self::table()
            )));
        };
        Ok(fields
            .into_iter()
            .map(|(name, value)| (column_name(name), value))
            .collect())
    }
}

/// Validity windows serialise as `valid_from` / `valid_until`
fn column_name(field: String) -> String {
    match field.as_str() {
        "valid_from" => "from_dttm".to_string(),
        "valid_until" => "to_dttm".to_string(),
        _ => field,
    }
}

/// Double-quotes an identifier for interpolation into SQL
pub(crate) fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

macro_rules! pg_tables {
    (effective: $($entity:ty),* $(,)?) => {
        $(impl PgTable for $entity {
            const EFFECTIVE_DATED: bool = true;
        })*
    };
    ($($entity:ty),* $(,)?) => {
        $(impl PgTable for $entity {})*
    };
}

pg_tables!(
    Country,
    Address,
    Company,
    Contact,
    ComponentGroup,
    Component,
    IconTbl,
    UtilityMarket,
    MeterPoint,
    BillingCycle,
    BillPeriod,
    Bill,
    Currency,
    PaymentMethodType,
    PaymentMethodEvent,
    DirectDebit,
    Cheque,
    PaymentRequest,
    Payment,
    AccountTransaction,
);

pg_tables!(
    effective: Employee,
    CustomerAccount,
    ContactVersion,
    MeterReading,
    PaymentMethod,
    Charges,
);
