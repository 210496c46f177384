//! Core Kernel - Foundational types for the utility billing schema
//!
//! This crate provides the building blocks used across all domain crates:
//! - Typed identifiers and the shared record shape
//! - Validity windows for effective-dated rows
//! - Ten-digit reference numbers
//! - Storage ports and, behind the `mock` feature, an in-memory store

pub mod error;
pub mod identifiers;
pub mod labels;
pub mod ports;
pub mod record;
pub mod reference;
pub mod temporal;

#[cfg(any(test, feature = "mock"))]
pub mod memory;

pub use error::CoreError;
pub use identifiers::*;
pub use labels::{LabelCatalog, Labelled};
pub use ports::{
    AdapterHealth, DomainPort, EffectiveDatedPort, HealthCheckResult, HealthCheckable,
    JournaledPort, ParentFilter, PortError, RecordPort, RecordPortExt, RecordQuery,
};
pub use record::{check_record, validate_record, EffectiveDated, OnDelete, Record, RecordMeta, Relation, UniqueKey};
pub use reference::{NumberAllocator, NumberSource, Numbered, RandomNumberSource, ReferenceNumber, SeededNumberSource};
pub use temporal::{end_of_time, TemporalError, Timezone, Validity};

#[cfg(any(test, feature = "mock"))]
pub use memory::InMemoryRecordStore;
