//! Test Utilities Crate
//!
//! Shared test infrastructure for the billing schema.
//!
//! # Modules
//!
//! - `fixtures`: fixed instants, reference rows and `fake` personal data
//! - `builders`: the [`AccountGraph`] of rows around one customer account
//! - `database`: PostgreSQL test containers and [`PgPorts`]
//! - `assertions`: assertion helpers for port results
//! - `generators`: proptest strategies

pub mod assertions;
pub mod builders;
pub mod database;
pub mod fixtures;
pub mod generators;

pub use assertions::*;
pub use builders::*;
pub use database::*;
pub use fixtures::*;
pub use generators::*;
