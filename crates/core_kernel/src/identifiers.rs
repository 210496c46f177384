//! Strongly-typed identifiers for schema entities
//!
//! Using newtype wrappers around UUIDs provides type safety and prevents
//! accidental mixing of different identifier types. Each identifier also
//! knows the table its entity lives in, which the stores use to resolve
//! foreign keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use uuid::Uuid;

/// Behaviour shared by every entity identifier
pub trait EntityId:
    Copy
    + Eq
    + Hash
    + fmt::Debug
    + fmt::Display
    + From<Uuid>
    + Into<Uuid>
    + Send
    + Sync
    + 'static
{
    /// Table (and entity) name the identifier belongs to
    const ENTITY: &'static str;

    /// Returns the underlying UUID by value
    fn uuid(&self) -> Uuid {
        (*self).into()
    }
}

macro_rules! define_id {
    ($name:ident, $prefix:literal, $entity:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl EntityId for $name {
            const ENTITY: &'static str = $entity;
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new_v7()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Identity & party
define_id!(CountryId, "CTRY", "country");
define_id!(AddressId, "ADDR", "address");
define_id!(EmployeeId, "EMP", "employee");
define_id!(CustomerAccountId, "ACC", "customer_account");
define_id!(CompanyId, "CMP", "company");
define_id!(ContactId, "CNT", "contact");
define_id!(ContactVersionId, "CNTV", "contact_version");
define_id!(ComponentGroupId, "CGRP", "component_group");
define_id!(ComponentId, "COMP", "component");

// Energy / metering
define_id!(IconId, "ICON", "icon_tbl");
define_id!(UtilityMarketId, "MKT", "utility_market");
define_id!(MeterPointId, "MPT", "meter_point");
define_id!(BillingCycleId, "BCYC", "billing_cycle");
define_id!(BillPeriodId, "BPER", "bill_period");
define_id!(BillId, "BILL", "bill");
define_id!(MeterReadingId, "MRD", "meter_reading");

// Payment
define_id!(CurrencyId, "CUR", "currency");
define_id!(PaymentMethodTypeId, "PMT", "payment_method_type");
define_id!(PaymentMethodId, "PM", "payment_method");
define_id!(PaymentMethodEventId, "PME", "payment_method_event");
define_id!(DirectDebitId, "DD", "direct_debit");
define_id!(ChequeId, "CHQ", "cheque");
define_id!(PaymentRequestId, "PRQ", "payment_request");
define_id!(PaymentId, "PAY", "payment");
define_id!(AccountTransactionId, "ATX", "account_transaction");
define_id!(ChargesId, "CHG", "charges");

// External identity (authentication system); no table of its own
define_id!(UserId, "USR", "user");
