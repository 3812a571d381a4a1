//! Domain types for the cart and session layer.
//!
//! This module provides type-safe wrappers for the commerce concepts the
//! orchestration layer reasons about.

pub mod cart;
pub mod consent;
pub mod country;
pub mod customer;
pub mod email;
pub mod id;
pub mod methods;
pub mod price;
pub mod region;

pub use cart::{
    Cart, CartTotals, CartUpdate, CartUpdateError, EnrichedLineItem, LineItem,
    MUTABLE_CART_FIELDS, PriceSource, VariantPrice, enrich_line_items,
};
pub use consent::{ConsentDecision, ConsentEffect, ConsentError};
pub use country::{CountryCode, CountryCodeError};
pub use customer::Customer;
pub use email::{Email, EmailError};
pub use id::*;
pub use methods::{PaymentMethods, PaymentProvider, PaymentScope, ShippingOption};
pub use price::{CurrencyCode, Money};
pub use region::{Region, TaxPolicy};
