//! Tidewater Core - Shared domain types.
//!
//! This crate provides the types used by the storefront's cart and session
//! layer: regions, carts and line items, customers, checkout methods, and
//! the cookie-consent decision.
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Price enrichment lives here because it is a pure transform of
//! line items and region prices.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, country/currency codes, emails, carts, regions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
