//! Commerce regions: a set of countries sharing one currency and tax policy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CountryCode, CurrencyCode, RegionId};

/// Tax metadata carried by a region.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxPolicy {
    /// Whether the backend computes taxes automatically on cart updates.
    pub automatic_taxes: bool,
    /// Whether displayed prices already include tax.
    pub includes_tax: bool,
    /// Default tax rate in percent, when the region defines one.
    pub tax_rate: Option<Decimal>,
}

/// A commerce region. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub currency_code: CurrencyCode,
    pub countries: Vec<CountryCode>,
    #[serde(default)]
    pub tax: TaxPolicy,
}

impl Region {
    /// Whether this region serves `country`.
    #[must_use]
    pub fn serves(&self, country: &CountryCode) -> bool {
        self.countries.iter().any(|c| c == country)
    }
}
