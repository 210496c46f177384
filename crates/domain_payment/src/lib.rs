//! Payment Domain
//!
//! How money moves: currencies, payment method types and the methods an
//! account holds (with direct debit and cheque details), payment requests,
//! payments, the account ledger and tariff charges.
//!
//! Payment method and request statuses are declared without transition
//! rules; any status may be recorded after any other.

pub mod charges;
pub mod currency;
pub mod instrument;
pub mod ledger;
pub mod method;
pub mod request;

pub use charges::Charges;
pub use currency::Currency;
pub use instrument::{Cheque, DirectDebit};
pub use ledger::{AccountTransaction, TransactionType};
pub use method::{PaymentMethod, PaymentMethodEvent, PaymentMethodStatus, PaymentMethodType};
pub use request::{Payment, PaymentRequest, PaymentRequestStatus};
