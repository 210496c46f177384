//! Test Data Builders
//!
//! [`AccountGraph`] is a consistent set of rows around one customer
//! account: the reference data it points at, a meter point, a payment
//! method and a first bill period. Tests pick the pieces they need and
//! [`AccountGraph::seed`] stores the whole graph in dependency order.

use chrono::{DateTime, Duration, Utc};
use core_kernel::{
    EffectiveDatedPort, JournaledPort, NumberAllocator, PortError, RecordPort, UserId,
};
use domain_accounts::{Address, Contact, ContactVersion, Country, CustomerAccount, Employee};
use domain_energy::{
    Bill, BillAmounts, BillPeriod, BillingCycle, IconTbl, MeterPoint, MeterReading, NewBill,
    UtilityMarket,
};
use domain_payment::{Charges, Currency, PaymentMethod, PaymentMethodEvent, PaymentMethodType};

use crate::fixtures::{AmountFixtures, FakeFixtures, ReferenceFixtures, TemporalFixtures};

/// Every port the account graph touches
///
/// Implemented by any store serving all of them, such as the in-memory
/// store or [`crate::database::PgPorts`].
pub trait SchemaPorts:
    RecordPort<Country>
    + RecordPort<Address>
    + RecordPort<Currency>
    + RecordPort<BillingCycle>
    + RecordPort<IconTbl>
    + RecordPort<UtilityMarket>
    + RecordPort<PaymentMethodType>
    + RecordPort<CustomerAccount>
    + RecordPort<Contact>
    + RecordPort<ContactVersion>
    + RecordPort<Employee>
    + RecordPort<MeterPoint>
    + RecordPort<MeterReading>
    + RecordPort<BillPeriod>
    + RecordPort<Bill>
    + RecordPort<PaymentMethod>
    + RecordPort<PaymentMethodEvent>
    + RecordPort<Charges>
    + EffectiveDatedPort<ContactVersion>
    + EffectiveDatedPort<MeterReading>
    + EffectiveDatedPort<Charges>
    + EffectiveDatedPort<PaymentMethod>
    + JournaledPort<PaymentMethod, PaymentMethodEvent>
{
}

impl<P> SchemaPorts for P where
    P: RecordPort<Country>
        + RecordPort<Address>
        + RecordPort<Currency>
        + RecordPort<BillingCycle>
        + RecordPort<IconTbl>
        + RecordPort<UtilityMarket>
        + RecordPort<PaymentMethodType>
        + RecordPort<CustomerAccount>
        + RecordPort<Contact>
        + RecordPort<ContactVersion>
        + RecordPort<Employee>
        + RecordPort<MeterPoint>
        + RecordPort<MeterReading>
        + RecordPort<BillPeriod>
        + RecordPort<Bill>
        + RecordPort<PaymentMethod>
        + RecordPort<PaymentMethodEvent>
        + RecordPort<Charges>
        + EffectiveDatedPort<ContactVersion>
        + EffectiveDatedPort<MeterReading>
        + EffectiveDatedPort<Charges>
        + EffectiveDatedPort<PaymentMethod>
        + JournaledPort<PaymentMethod, PaymentMethodEvent>
{
}

/// Rows around one customer account
#[derive(Debug, Clone)]
pub struct AccountGraph {
    pub country: Country,
    pub address: Address,
    pub currency: Currency,
    pub billing_cycle: BillingCycle,
    pub icon: IconTbl,
    pub market: UtilityMarket,
    pub payment_method_type: PaymentMethodType,
    pub account: CustomerAccount,
    pub contact: Contact,
    pub contact_version: ContactVersion,
    pub meter_point: MeterPoint,
    pub payment_method: PaymentMethod,
    pub charges: Charges,
    pub bill_period: BillPeriod,
}

impl AccountGraph {
    pub fn builder() -> AccountGraphBuilder {
        AccountGraphBuilder::new()
    }

    /// Stores every row, parents first
    ///
    /// Numbered rows go through the allocator so a colliding number is
    /// redrawn; the stored copies replace the graph's own.
    pub async fn seed<P: SchemaPorts + ?Sized>(mut self, port: &P) -> Result<Self, PortError> {
        let allocator = NumberAllocator::default();

        self.country = RecordPort::<Country>::insert(port, self.country).await?;
        self.address = RecordPort::<Address>::insert(port, self.address).await?;
        self.currency = RecordPort::<Currency>::insert(port, self.currency).await?;
        self.billing_cycle = RecordPort::<BillingCycle>::insert(port, self.billing_cycle).await?;
        self.icon = RecordPort::<IconTbl>::insert(port, self.icon).await?;
        self.market = RecordPort::<UtilityMarket>::insert(port, self.market).await?;
        self.payment_method_type = RecordPort::<PaymentMethodType>::insert(port, self.payment_method_type).await?;
        self.account = allocator.insert(port, self.account).await?;
        self.contact = RecordPort::<Contact>::insert(port, self.contact).await?;
        self.contact_version = RecordPort::<ContactVersion>::insert(port, self.contact_version).await?;
        self.meter_point = allocator.insert(port, self.meter_point).await?;
        self.payment_method = RecordPort::<PaymentMethod>::insert(port, self.payment_method).await?;
        self.charges = RecordPort::<Charges>::insert(port, self.charges).await?;
        self.bill_period = RecordPort::<BillPeriod>::insert(port, self.bill_period).await?;
        Ok(self)
    }

    /// A draft bill for the graph's bill period
    pub fn draft_bill(&self) -> Bill {
        Bill::new(NewBill {
            customer_account_id: self.account.id,
            bill_period_id: self.bill_period.id,
            billed_from_dttm: self.bill_period.period.valid_from,
            billed_to_dttm: self.bill_period.period.valid_until,
            description: "Electricity".to_string(),
            issue_dt: TemporalFixtures::issue_date(),
            due_dt: TemporalFixtures::due_date(),
            amounts: BillAmounts {
                net_amount: AmountFixtures::net(),
                gross_amount: AmountFixtures::gross(),
                sales_tax_amount: AmountFixtures::sales_tax(),
            },
            currency_id: self.currency.id,
            created_user_id: None,
        })
    }

    /// A reading on the graph's meter point, effective from `at`
    pub fn reading(&self, value: f64, at: DateTime<Utc>) -> MeterReading {
        MeterReading::new(self.meter_point.id, value).with_validity(core_kernel::Validity::open_ended(at))
    }

    /// An employee living at the graph's address
    pub fn employee(&self, user_id: UserId) -> Employee {
        Employee::new(user_id, None).with_address(self.address.id)
    }
}

/// Builder for [`AccountGraph`]
pub struct AccountGraphBuilder {
    company_name: Option<String>,
    company_number: i64,
    period_start: DateTime<Utc>,
    period_days: i64,
    effective_from: DateTime<Utc>,
}

impl Default for AccountGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountGraphBuilder {
    pub fn new() -> Self {
        Self {
            company_name: None,
            company_number: 12_345_678,
            period_start: TemporalFixtures::year_start(),
            period_days: 31,
            effective_from: TemporalFixtures::year_start(),
        }
    }

    pub fn with_company(mut self, name: impl Into<String>, number: i64) -> Self {
        self.company_name = Some(name.into());
        self.company_number = number;
        self
    }

    /// First bill period: `days` long, starting at `start`
    pub fn with_bill_period(mut self, start: DateTime<Utc>, days: i64) -> Self {
        self.period_start = start;
        self.period_days = days;
        self
    }

    /// Start of the account, payment method and charges windows
    pub fn effective_from(mut self, at: DateTime<Utc>) -> Self {
        self.effective_from = at;
        self
    }

    pub fn build(self) -> AccountGraph {
        let from = core_kernel::Validity::open_ended(self.effective_from);

        let country = ReferenceFixtures::united_kingdom();
        let address = FakeFixtures::address(country.id);
        let currency = ReferenceFixtures::sterling();
        let billing_cycle = BillingCycle::new("Monthly");
        let icon = ReferenceFixtures::icon();
        let market = ReferenceFixtures::electricity(&icon);
        let payment_method_type = ReferenceFixtures::direct_debit_type(&icon);

        let mut account = CustomerAccount::new(currency.id, billing_cycle.id, self.company_number)
            .with_address(address.id);
        account.company_name = self.company_name;
        account.validity = from;

        let (contact, mut contact_version) = FakeFixtures::contact(&address);
        contact_version.validity = from;

        let meter_point = MeterPoint::new(
            market.id,
            account.id,
            self.period_start,
            self.period_start + Duration::days(self.period_days),
        )
        .with_address(address.id);

        let mut payment_method = PaymentMethod::new(payment_method_type.id, account.id);
        payment_method.validity = from;

        let mut charges = Charges::new(account.id, AmountFixtures::standing_charge(), AmountFixtures::unit_rate());
        charges.validity = from;

        let bill_period = BillPeriod::new(
            account.id,
            self.period_start,
            self.period_start + Duration::days(self.period_days.max(1)),
        )
        .unwrap();

        AccountGraph {
            country,
            address,
            currency,
            billing_cycle,
            icon,
            market,
            payment_method_type,
            account,
            contact,
            contact_version,
            meter_point,
            payment_method,
            charges,
            bill_period,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Record;

    #[test]
    fn test_graph_is_wired_together() {
        let graph = AccountGraph::builder().with_company("Acme Energy Ltd", 1234).build();
        assert_eq!(graph.address.country_id, graph.country.id);
        assert_eq!(graph.account.currency_id, graph.currency.id);
        assert_eq!(graph.meter_point.customer_account_id, graph.account.id);
        assert_eq!(graph.payment_method.customer_account_id, graph.account.id);
        assert_eq!(graph.account.company_name.as_deref(), Some("Acme Energy Ltd"));
    }

    #[test]
    fn test_draft_bill_covers_the_period() {
        let graph = AccountGraph::builder().build();
        let bill = graph.draft_bill();
        assert_eq!(bill.bill_period_id, graph.bill_period.id);
        assert!(!bill.is_accepted());
        assert!(bill.relations().iter().any(|r| r.column == "bill_period_id"));
    }
}
