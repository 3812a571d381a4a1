//! Cart and session orchestration services.
//!
//! # Services
//!
//! - `region` - Country code to region resolution (cached)
//! - `cart` - Cart lookup-or-create, enrichment and allow-listed updates
//! - `methods` - Shipping and payment method lookups (cached)
//! - `identity` - Current customer under a soft deadline
//! - `checkout` - Composition of the above for the checkout page
//!
//! Every service holds an `Arc<dyn CommerceBackend>` and is cheap to clone.

pub mod cart;
pub mod checkout;
pub mod identity;
pub mod methods;
pub mod region;

pub use cart::{CartError, CartOutcome, CartService};
pub use checkout::{CheckoutError, CheckoutService, CheckoutView};
pub use identity::IdentityResolver;
pub use methods::MethodCache;
pub use region::RegionResolver;
