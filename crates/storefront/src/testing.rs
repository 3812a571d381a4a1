//! In-memory commerce backend for tests.
//!
//! Seeded with three regions (`reg_uk`/GBP serving `gb` and `uk`,
//! `reg_us`/USD serving `us`, `reg_eu`/EUR serving `de`, `fr` and `nl`).
//! Counts every call and can be told to fail or stall specific operations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use tidewater_core::{
    Cart, CartId, CartTotals, CartUpdate, CountryCode, CurrencyCode, Customer, CustomerId,
    LineItem, LineItemId, Money, PaymentProvider, PaymentProviderId, Region, RegionId,
    ShippingOption, ShippingOptionId, TaxPolicy, VariantId, VariantPrice,
};

use crate::commerce::{CommerceBackend, CommerceError};

/// Number of calls made to each backend operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list_regions: usize,
    pub retrieve_cart: usize,
    pub create_cart: usize,
    pub update_cart: usize,
    pub variant_prices: usize,
    pub list_shipping_options: usize,
    pub list_payment_providers_scoped: usize,
    pub list_payment_providers_unscoped: usize,
    pub retrieve_customer: usize,
}

#[derive(Default)]
struct Failures {
    regions: bool,
    carts: bool,
    cart_retrieval: bool,
    prices: bool,
    methods: bool,
}

#[derive(Default)]
struct FakeState {
    regions: Vec<Region>,
    carts: HashMap<CartId, Cart>,
    prices: Vec<VariantPrice>,
    shipping: Vec<ShippingOption>,
    scoped_providers: HashMap<RegionId, Vec<PaymentProvider>>,
    unscoped_providers: Vec<PaymentProvider>,
    customers: HashMap<String, Customer>,
    customer_latency: Duration,
    failures: Failures,
    calls: CallCounts,
}

/// An in-memory [`CommerceBackend`].
pub struct FakeBackend {
    state: Mutex<FakeState>,
    next_id: AtomicUsize,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    /// A backend with the standard regions and one standard shipping option.
    #[must_use]
    pub fn new() -> Self {
        let state = FakeState {
            regions: vec![
                region("reg_uk", "United Kingdom", "GBP", &["gb", "uk"]),
                region("reg_us", "United States", "USD", &["us"]),
                region("reg_eu", "Europe", "EUR", &["de", "fr", "nl"]),
            ],
            shipping: vec![ShippingOption {
                id: ShippingOptionId::new("so_standard"),
                name: "Standard".to_owned(),
                price: Money::new(Decimal::new(495, 2), CurrencyCode::new("GBP")),
            }],
            ..FakeState::default()
        };

        Self {
            state: Mutex::new(state),
            next_id: AtomicUsize::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the call counters.
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    /// Build a line item for seeding carts.
    #[must_use]
    pub fn line_item(id: &str, variant: &str, quantity: u32, unit_price: Decimal) -> LineItem {
        LineItem {
            id: LineItemId::new(id),
            title: format!("Item {id}"),
            product_id: None,
            variant_id: Some(VariantId::new(variant)),
            quantity,
            unit_price,
        }
    }

    /// Store a cart in `region_id` without counting a call.
    ///
    /// # Panics
    ///
    /// Panics if `region_id` is not one of the seeded regions.
    #[must_use]
    pub fn seed_cart(&self, region_id: &RegionId, items: Vec<LineItem>) -> Cart {
        let mut state = self.lock();
        let currency = state
            .regions
            .iter()
            .find(|r| &r.id == region_id)
            .map(|r| r.currency_code.clone())
            .expect("seed_cart needs a seeded region");
        let cart = self.new_cart(region_id.clone(), currency, items);
        state.carts.insert(cart.id.clone(), cart.clone());
        cart
    }

    /// The stored state of a cart.
    #[must_use]
    pub fn cart(&self, cart_id: &CartId) -> Option<Cart> {
        self.lock().carts.get(cart_id).cloned()
    }

    /// Price `variant` at `amount` in `region`.
    pub fn set_price(&self, variant: &str, region: &str, amount: Decimal) {
        let mut state = self.lock();
        let currency = state
            .regions
            .iter()
            .find(|r| r.id.as_str() == region)
            .map_or_else(|| CurrencyCode::new("XXX"), |r| r.currency_code.clone());
        state.prices.push(VariantPrice {
            variant_id: VariantId::new(variant),
            region_id: RegionId::new(region),
            price: Money::new(amount, currency),
        });
    }

    /// Register payment providers for a region, or unscoped with `None`.
    pub fn set_payment_providers(&self, region: Option<&str>, ids: &[&str]) {
        let providers = ids
            .iter()
            .map(|id| PaymentProvider {
                id: PaymentProviderId::new(*id),
                is_enabled: true,
            })
            .collect();
        let mut state = self.lock();
        match region {
            Some(region) => {
                state.scoped_providers.insert(RegionId::new(region), providers);
            }
            None => state.unscoped_providers = providers,
        }
    }

    /// Make `token` identify a customer with `email`.
    pub fn add_customer(&self, token: &str, email: &str) {
        let customer = Customer {
            id: CustomerId::new(format!("cus_{token}")),
            email: email.to_owned(),
            first_name: None,
            last_name: None,
            has_account: true,
        };
        self.lock().customers.insert(token.to_owned(), customer);
    }

    /// Delay every customer lookup by `latency`.
    pub fn set_customer_latency(&self, latency: Duration) {
        self.lock().customer_latency = latency;
    }

    /// Fail region listing.
    pub fn fail_regions(&self, fail: bool) {
        self.lock().failures.regions = fail;
    }

    /// Fail cart retrieval, creation and update.
    pub fn fail_carts(&self, fail: bool) {
        self.lock().failures.carts = fail;
    }

    /// Fail cart retrieval only; creation and update still work.
    pub fn fail_cart_retrieval(&self, fail: bool) {
        self.lock().failures.cart_retrieval = fail;
    }

    /// Fail variant pricing.
    pub fn fail_prices(&self, fail: bool) {
        self.lock().failures.prices = fail;
    }

    /// Fail shipping and payment lookups.
    pub fn fail_methods(&self, fail: bool) {
        self.lock().failures.methods = fail;
    }

    fn new_cart(&self, region_id: RegionId, currency_code: CurrencyCode, items: Vec<LineItem>) -> Cart {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let item_total = items
            .iter()
            .map(|item| item.unit_price * Decimal::from(item.quantity))
            .sum();
        Cart {
            id: CartId::new(format!("cart_{n:04}")),
            region_id,
            currency_code,
            email: None,
            customer_id: None,
            items,
            totals: CartTotals {
                item_total,
                total: item_total,
                ..CartTotals::default()
            },
        }
    }
}

fn region(id: &str, name: &str, currency: &str, countries: &[&str]) -> Region {
    Region {
        id: RegionId::new(id),
        name: name.to_owned(),
        currency_code: CurrencyCode::new(currency),
        countries: countries
            .iter()
            .filter_map(|c| CountryCode::parse(c).ok())
            .collect(),
        tax: TaxPolicy::default(),
    }
}

fn unavailable() -> CommerceError {
    CommerceError::Status {
        status: 503,
        message: "backend unavailable".to_owned(),
    }
}

#[async_trait]
impl CommerceBackend for FakeBackend {
    async fn list_regions(&self) -> Result<Vec<Region>, CommerceError> {
        let mut state = self.lock();
        state.calls.list_regions += 1;
        if state.failures.regions {
            return Err(unavailable());
        }
        Ok(state.regions.clone())
    }

    async fn retrieve_cart(&self, cart_id: &CartId) -> Result<Cart, CommerceError> {
        let mut state = self.lock();
        state.calls.retrieve_cart += 1;
        if state.failures.carts || state.failures.cart_retrieval {
            return Err(unavailable());
        }
        state
            .carts
            .get(cart_id)
            .cloned()
            .ok_or_else(|| CommerceError::NotFound(format!("/store/carts/{cart_id}")))
    }

    async fn create_cart(&self, region_id: &RegionId) -> Result<Cart, CommerceError> {
        let mut state = self.lock();
        state.calls.create_cart += 1;
        if state.failures.carts {
            return Err(unavailable());
        }
        let currency = state
            .regions
            .iter()
            .find(|r| &r.id == region_id)
            .map(|r| r.currency_code.clone())
            .ok_or_else(|| CommerceError::Status {
                status: 400,
                message: format!("unknown region {region_id}"),
            })?;
        let cart = self.new_cart(region_id.clone(), currency, Vec::new());
        state.carts.insert(cart.id.clone(), cart.clone());
        Ok(cart)
    }

    async fn update_cart(&self, cart_id: &CartId, update: &CartUpdate) -> Result<Cart, CommerceError> {
        let mut state = self.lock();
        state.calls.update_cart += 1;
        if state.failures.carts {
            return Err(unavailable());
        }
        let cart = state
            .carts
            .get_mut(cart_id)
            .ok_or_else(|| CommerceError::NotFound(format!("/store/carts/{cart_id}")))?;
        if let Some(email) = &update.email {
            cart.email = Some(email.as_str().to_owned());
        }
        Ok(cart.clone())
    }

    async fn variant_prices(
        &self,
        region_id: &RegionId,
        variant_ids: &[VariantId],
    ) -> Result<Vec<VariantPrice>, CommerceError> {
        let mut state = self.lock();
        state.calls.variant_prices += 1;
        if state.failures.prices {
            return Err(unavailable());
        }
        Ok(state
            .prices
            .iter()
            .filter(|p| &p.region_id == region_id && variant_ids.contains(&p.variant_id))
            .cloned()
            .collect())
    }

    async fn list_shipping_options(&self, cart_id: &CartId) -> Result<Vec<ShippingOption>, CommerceError> {
        let mut state = self.lock();
        state.calls.list_shipping_options += 1;
        if state.failures.methods {
            return Err(unavailable());
        }
        if !state.carts.contains_key(cart_id) {
            return Err(CommerceError::NotFound(format!("/store/carts/{cart_id}")));
        }
        Ok(state.shipping.clone())
    }

    async fn list_payment_providers(
        &self,
        region_id: Option<&RegionId>,
    ) -> Result<Vec<PaymentProvider>, CommerceError> {
        let mut state = self.lock();
        match region_id {
            Some(_) => state.calls.list_payment_providers_scoped += 1,
            None => state.calls.list_payment_providers_unscoped += 1,
        }
        if state.failures.methods {
            return Err(unavailable());
        }
        Ok(match region_id {
            Some(region_id) => state
                .scoped_providers
                .get(region_id)
                .cloned()
                .unwrap_or_default(),
            None => state.unscoped_providers.clone(),
        })
    }

    async fn retrieve_customer(&self, token: &SecretString) -> Result<Customer, CommerceError> {
        let (latency, customer) = {
            let mut state = self.lock();
            state.calls.retrieve_customer += 1;
            (
                state.customer_latency,
                state.customers.get(token.expose_secret()).cloned(),
            )
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        customer.ok_or_else(|| CommerceError::Status {
            status: 401,
            message: "invalid customer token".to_owned(),
        })
    }
}
