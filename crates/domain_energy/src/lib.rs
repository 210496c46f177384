//! Energy and Metering Domain
//!
//! Utility markets, meter points and their readings, billing cycles, bill
//! periods and bills. Reference numbers for meter points and bills are drawn
//! at construction; insert them through
//! [`NumberAllocator`](core_kernel::NumberAllocator) to redraw on collision.

pub mod bill;
pub mod billing;
pub mod icon;
pub mod market;
pub mod meter;

pub use bill::{Bill, BillAmounts, BillStatus, NewBill};
pub use billing::{BillPeriod, BillPeriodStatus, BillingCycle};
pub use icon::IconTbl;
pub use market::{MarketKind, UtilityMarket};
pub use meter::{MeterPoint, MeterReading};
