//! Identity and Party Domain
//!
//! Records describing who the back office deals with: countries and
//! addresses, employees, customer accounts, companies, contacts and the
//! feature component catalog.
//!
//! Customer accounts reference billing cycles and currencies from the
//! energy and payment crates by identifier only, so the crates stay free of
//! cycles even though the tables reference each other.
//!
//! # Examples
//!
//! ```rust
//! use domain_accounts::{Contact, ContactVersion, Title};
//! use core_kernel::AddressId;
//!
//! let contact = Contact::new("ops-lead", "Operations lead");
//! let details = ContactVersion::new(contact.id, AddressId::new(), "jane@example.com")
//!     .with_name(Title::Ms, "Jane", "Smith");
//!
//! assert!(details.validity.is_open_ended());
//! assert_eq!(details.full_name(), "Ms Jane Smith");
//! ```

pub mod address;
pub mod company;
pub mod component;
pub mod contact;
pub mod country;
pub mod customer_account;
pub mod employee;

pub use address::Address;
pub use company::Company;
pub use component::{Component, ComponentGroup};
pub use contact::{Contact, ContactVersion, Title};
pub use country::Country;
pub use customer_account::CustomerAccount;
pub use employee::Employee;
