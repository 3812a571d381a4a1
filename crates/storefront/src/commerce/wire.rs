//! Response envelopes of the backend's JSON API and their conversions.
//!
//! Carts, payment providers and customers deserialize straight into the
//! core types; regions, variant prices and shipping options need reshaping.

use rust_decimal::Decimal;
use serde::Deserialize;
use tidewater_core::{
    Cart, CountryCode, CurrencyCode, Customer, Money, PaymentProvider, Region, RegionId,
    ShippingOption, ShippingOptionId, TaxPolicy, VariantId, VariantPrice,
};

#[derive(Debug, Deserialize)]
pub(super) struct RegionsResponse {
    pub regions: Vec<WireRegion>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireRegion {
    id: RegionId,
    name: String,
    currency_code: CurrencyCode,
    #[serde(default)]
    countries: Vec<WireCountry>,
    #[serde(default)]
    automatic_taxes: bool,
    #[serde(default)]
    includes_tax: bool,
    tax_rate: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct WireCountry {
    iso_2: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct CartResponse {
    pub cart: Cart,
}

#[derive(Debug, Deserialize)]
pub(super) struct VariantsResponse {
    pub variants: Vec<WireVariant>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireVariant {
    id: VariantId,
    calculated_price: Option<WireCalculatedPrice>,
}

#[derive(Debug, Deserialize)]
struct WireCalculatedPrice {
    calculated_amount: Option<Decimal>,
    currency_code: CurrencyCode,
}

#[derive(Debug, Deserialize)]
pub(super) struct ShippingOptionsResponse {
    pub shipping_options: Vec<WireShippingOption>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireShippingOption {
    id: ShippingOptionId,
    name: String,
    amount: Decimal,
    currency_code: CurrencyCode,
}

#[derive(Debug, Deserialize)]
pub(super) struct PaymentProvidersResponse {
    pub payment_providers: Vec<PaymentProvider>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CustomerResponse {
    pub customer: Customer,
}

// =============================================================================
// Conversions
// =============================================================================

impl From<WireRegion> for Region {
    fn from(region: WireRegion) -> Self {
        let countries = region
            .countries
            .into_iter()
            .filter_map(|c| match CountryCode::parse(&c.iso_2) {
                Ok(code) => Some(code),
                Err(e) => {
                    tracing::warn!(region_id = %region.id, error = %e, "skipping malformed country");
                    None
                }
            })
            .collect();

        Self {
            id: region.id,
            name: region.name,
            currency_code: region.currency_code,
            countries,
            tax: TaxPolicy {
                automatic_taxes: region.automatic_taxes,
                includes_tax: region.includes_tax,
                tax_rate: region.tax_rate,
            },
        }
    }
}

impl WireVariant {
    /// The variant's price in `region_id`, if the backend computed one.
    pub fn into_price(self, region_id: &RegionId) -> Option<VariantPrice> {
        let calculated = self.calculated_price?;
        Some(VariantPrice {
            variant_id: self.id,
            region_id: region_id.clone(),
            price: Money::new(calculated.calculated_amount?, calculated.currency_code),
        })
    }
}

impl From<WireShippingOption> for ShippingOption {
    fn from(option: WireShippingOption) -> Self {
        Self {
            id: option.id,
            name: option.name,
            price: Money::new(option.amount, option.currency_code),
        }
    }
}
