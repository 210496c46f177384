//! Pre-built Test Fixtures
//!
//! Fixed instants and reference rows for predictable tests, plus `fake`
//! generated personal data where the exact values do not matter.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{CountryId, Validity};
use domain_accounts::{Address, Company, Contact, ContactVersion, Country, Title};
use domain_energy::{IconTbl, MarketKind, UtilityMarket};
use domain_payment::{Currency, PaymentMethodType};
use fake::faker::address::en::{BuildingNumber, CityName, PostCode, StreetName};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fixed instants used across tests
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Start of the 2024 billing year
    pub fn year_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    /// Start of the 2025 billing year
    pub fn year_end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    pub fn mid_year() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()
    }

    pub fn before_year() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap()
    }

    /// The 2024 calendar year as a closed window
    pub fn year_2024() -> Validity {
        Validity::new(Self::year_start(), Self::year_end()).unwrap()
    }

    /// Open-ended window from the start of 2024
    pub fn from_2024() -> Validity {
        Validity::open_ended(Self::year_start())
    }

    pub fn issue_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    pub fn due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()
    }
}

/// Tariff amounts
pub struct AmountFixtures;

impl AmountFixtures {
    pub fn standing_charge() -> Decimal {
        dec!(0.4512)
    }

    pub fn unit_rate() -> Decimal {
        dec!(0.2450)
    }

    pub fn net() -> Decimal {
        dec!(100.00)
    }

    pub fn sales_tax() -> Decimal {
        dec!(5.00)
    }

    pub fn gross() -> Decimal {
        dec!(105.00)
    }
}

/// Reference rows with the keys the label catalog knows
pub struct ReferenceFixtures;

impl ReferenceFixtures {
    pub fn united_kingdom() -> Country {
        Country::new("GB", "+44")
    }

    pub fn sterling() -> Currency {
        Currency::new("GBP")
    }

    pub fn icon() -> IconTbl {
        IconTbl::new("Electricity", "electricity.svg")
    }

    pub fn electricity(icon: &IconTbl) -> UtilityMarket {
        UtilityMarket::new(MarketKind::Electricity, icon.id)
    }

    pub fn direct_debit_type(icon: &IconTbl) -> PaymentMethodType {
        PaymentMethodType::new("DIRECT_DEBIT", icon.id)
    }
}

/// Randomised personal data from `fake`
pub struct FakeFixtures;

impl FakeFixtures {
    pub fn address(country_id: CountryId) -> Address {
        let number: String = BuildingNumber().fake();
        let street: String = StreetName().fake();
        let city: String = CityName().fake();
        let postcode: String = PostCode().fake();
        Address::new(country_id, [format!("{number} {street}"), city], postcode)
    }

    pub fn company() -> Company {
        let name: String = CompanyName().fake();
        Company::new(name, (10_000_000i64..99_999_999).fake())
    }

    pub fn email() -> String {
        SafeEmail().fake()
    }

    /// A contact and its first version of details
    pub fn contact(address: &Address) -> (Contact, ContactVersion) {
        let first: String = FirstName().fake();
        let last: String = LastName().fake();
        let contact = Contact::new(format!("{}-{}", last.to_lowercase(), uuid::Uuid::new_v4()), "Account holder");
        let version = ContactVersion::new(contact.id, address.id, Self::email())
            .with_name(Title::Ms, first, last);
        (contact, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::validate_record;

    #[test]
    fn test_year_window() {
        let year = TemporalFixtures::year_2024();
        assert!(year.is_effective_at(TemporalFixtures::mid_year()));
        assert!(!year.is_effective_at(TemporalFixtures::year_end()));
    }

    #[test]
    fn test_fake_rows_validate() {
        let country = ReferenceFixtures::united_kingdom();
        let address = FakeFixtures::address(country.id);
        let (_, version) = FakeFixtures::contact(&address);
        assert!(validate_record(&address).is_ok());
        assert!(validate_record(&version).is_ok());
        assert!(validate_record(&FakeFixtures::company()).is_ok());
    }

    #[test]
    fn test_gross_is_net_plus_tax() {
        assert_eq!(AmountFixtures::net() + AmountFixtures::sales_tax(), AmountFixtures::gross());
    }
}
