//! Carts, line items, price enrichment and the cart update allow-list.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CartId, CustomerId, Email, LineItemId, Money, ProductId, Region, RegionId, VariantId};
use super::{CurrencyCode, EmailError};

// =============================================================================
// Cart
// =============================================================================

/// Totals computed by the commerce backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CartTotals {
    pub item_total: Decimal,
    pub shipping_total: Decimal,
    pub discount_total: Decimal,
    pub gift_card_total: Decimal,
    pub tax_total: Decimal,
    pub total: Decimal,
}

/// A raw line item as stored on the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub title: String,
    pub product_id: Option<ProductId>,
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
    /// Unit price the cart last saw.
    pub unit_price: Decimal,
}

/// An in-progress order. The commerce backend is its source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub region_id: RegionId,
    pub currency_code: CurrencyCode,
    pub email: Option<String>,
    pub customer_id: Option<CustomerId>,
    /// Line items in display order.
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(flatten)]
    pub totals: CartTotals,
}

impl Cart {
    /// Whether this cart may be used for `region`.
    ///
    /// A cart's currency must match its region's currency; a mismatch means
    /// the cart has to be re-created, never re-priced in place.
    #[must_use]
    pub fn matches_region(&self, region: &Region) -> bool {
        self.currency_code == region.currency_code
    }
}

// =============================================================================
// Enrichment
// =============================================================================

/// Price of one variant in one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantPrice {
    pub variant_id: VariantId,
    pub region_id: RegionId,
    pub price: Money,
}

/// Where an enriched item's unit price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Current region price from the pricing lookup.
    Region,
    /// No region price was available; the cart's last-known price is kept.
    LastKnown,
}

/// A line item with a computed price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedLineItem {
    pub id: LineItemId,
    pub title: String,
    pub product_id: Option<ProductId>,
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub price_source: PriceSource,
}

/// Merge region prices into raw line items.
///
/// Only prices for `region_id` are considered. Items whose variant has no
/// price keep their last-known unit price instead of being dropped. The
/// output depends only on the inputs, so applying this any number of times
/// to the same raw items yields the same result.
#[must_use]
pub fn enrich_line_items(
    items: &[LineItem],
    region_id: &RegionId,
    prices: &[VariantPrice],
) -> Vec<EnrichedLineItem> {
    let by_variant: HashMap<&VariantId, Decimal> = prices
        .iter()
        .filter(|p| &p.region_id == region_id)
        .map(|p| (&p.variant_id, p.price.amount))
        .collect();

    items
        .iter()
        .map(|item| {
            let region_price = item
                .variant_id
                .as_ref()
                .and_then(|variant| by_variant.get(variant).copied());

            let (unit_price, price_source) = region_price.map_or(
                (item.unit_price, PriceSource::LastKnown),
                |price| (price, PriceSource::Region),
            );

            EnrichedLineItem {
                id: item.id.clone(),
                title: item.title.clone(),
                product_id: item.product_id.clone(),
                variant_id: item.variant_id.clone(),
                quantity: item.quantity,
                unit_price,
                line_total: unit_price * Decimal::from(item.quantity),
                price_source,
            }
        })
        .collect()
}

// =============================================================================
// Update allow-list
// =============================================================================

/// Cart fields that may be changed through [`CartUpdate`]. Line items,
/// totals and region are deliberately absent.
pub const MUTABLE_CART_FIELDS: &[&str] = &["email"];

/// Errors building a [`CartUpdate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartUpdateError {
    /// None of the submitted fields are on the allow-list.
    #[error("no valid fields to update")]
    NoValidFields,
    /// An allow-listed field has an unusable value.
    #[error("invalid value for {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

/// An allow-listed partial cart update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CartUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
}

impl CartUpdate {
    /// Build an update from arbitrary submitted fields.
    ///
    /// Fields outside [`MUTABLE_CART_FIELDS`] are ignored, not rejected.
    /// A `null` value counts as absent.
    ///
    /// # Errors
    ///
    /// Returns [`CartUpdateError::NoValidFields`] when nothing allow-listed
    /// remains, or [`CartUpdateError::InvalidField`] when an allow-listed
    /// value is malformed.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, CartUpdateError> {
        let mut update = Self::default();

        match fields.get("email") {
            None | Some(Value::Null) => {}
            Some(Value::String(raw)) => {
                let email = Email::parse(raw).map_err(|e: EmailError| {
                    CartUpdateError::InvalidField {
                        field: "email",
                        reason: e.to_string(),
                    }
                })?;
                update.email = Some(email);
            }
            Some(_) => {
                return Err(CartUpdateError::InvalidField {
                    field: "email",
                    reason: "expected a string".to_string(),
                });
            }
        }

        if update.is_empty() {
            return Err(CartUpdateError::NoValidFields);
        }
        Ok(update)
    }

    /// Whether the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none()
    }
}
