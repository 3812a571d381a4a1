//! Tidewater storefront library.
//!
//! The cart and session orchestration layer in front of a remote commerce
//! backend: region resolution, cart lookup-or-create, consent-gated cart
//! cookies, price enrichment, cached checkout method lookups, deadline-bound
//! identity checks and a scoped fetch proxy for outbound calls.
//!
//! Exposed as a library so the router can be driven end to end in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod commerce;
pub mod config;
pub mod deadline;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
