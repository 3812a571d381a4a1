//! Shipping and payment methods offered at checkout.

use serde::{Deserialize, Serialize};

use super::{Money, PaymentProviderId, ShippingOptionId};

/// A shipping option available for a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingOption {
    pub id: ShippingOptionId,
    pub name: String,
    pub price: Money,
}

/// A payment provider registered with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProvider {
    pub id: PaymentProviderId,
    #[serde(default = "enabled_by_default")]
    pub is_enabled: bool,
}

const fn enabled_by_default() -> bool {
    true
}

/// Which query produced a payment provider list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentScope {
    /// Providers registered for the requested region.
    Region,
    /// The region had none, so the unfiltered list was used.
    Unscoped,
}

/// Payment providers together with the scope that answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethods {
    pub providers: Vec<PaymentProvider>,
    pub scope: PaymentScope,
}
