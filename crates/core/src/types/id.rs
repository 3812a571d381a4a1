//! Newtype IDs for type-safe entity references.
//!
//! Every id the commerce backend hands out is an opaque string (`cart_01H...`,
//! `reg_01H...`). The `define_id!` macro wraps them so a cart id can never be
//! passed where a region id is expected.

/// Macro to define a type-safe opaque string ID.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `new()`, `as_str()`, `Display`, `From<&str>` and `From<String>`
///
/// # Example
///
/// ```rust
/// # use tidewater_core::define_id;
/// define_id!(WishlistId);
/// define_id!(OrderId);
///
/// let wishlist = WishlistId::new("wl_123");
/// assert_eq!(wishlist.as_str(), "wl_123");
///
/// // These are different types, so this won't compile:
/// // let _: OrderId = wishlist;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an id issued by the backend.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying id string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(CartId);
define_id!(RegionId);
define_id!(LineItemId);
define_id!(ProductId);
define_id!(VariantId);
define_id!(CustomerId);
define_id!(ShippingOptionId);
define_id!(PaymentProviderId);
