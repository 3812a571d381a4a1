//! HTTP middleware and request extractors for the storefront API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! # Extractors
//!
//! - [`ConsentGate`] - the client's cookie-consent decision
//! - [`SessionCookieStore`] - the `cart-id` reference; the only writer of that cookie
//! - [`OptionalCustomerToken`] - bearer or cookie identity token, if any

pub mod consent;
pub mod customer;
pub mod request_id;
pub mod session;

pub use consent::{CONSENT_COOKIE_NAME, ConsentGate};
pub use customer::{AUTH_COOKIE_NAME, OptionalCustomerToken};
pub use request_id::request_id_middleware;
pub use session::{
    CART_COOKIE_NAME, SessionCookieStore, expired_cookie, is_cookie_value, request_cookies,
};
