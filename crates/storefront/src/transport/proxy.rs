//! Fetch proxy: scoped request rewriting for outbound calls.
//!
//! A [`ProxyPolicy`] is installed into an [`HttpTransport`](super::HttpTransport)
//! and stays active for as long as the returned [`ProxyActivation`] lives.
//! Dropping (or explicitly deactivating) the activation restores the plain
//! transport on every exit path, including early returns and panics.
//!
//! ```text
//!   inactive ──install──▶ active ──deactivate / drop──▶ inactive
//!                           │
//!                           └──install──▶ ProxyError::AlreadyActive
//! ```

use std::str::FromStr;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use thiserror::Error;
use url::{Origin, Url};

/// Errors installing a proxy policy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProxyError {
    /// A policy is already installed; double-patching is not supported.
    #[error("fetch proxy is already active")]
    AlreadyActive,
}

/// When a rule sends a request through its relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteMode {
    /// Every matching request goes through the relay.
    Always,
    /// Matching requests go direct first and are retried once through the
    /// relay after a transient failure.
    OnTransientFailure,
}

impl FromStr for RewriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "fallback" | "on_transient_failure" => Ok(Self::OnTransientFailure),
            other => Err(format!("expected `always` or `fallback`, got `{other}`")),
        }
    }
}

/// Redirects requests for one origin to a relay base URL.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    origin: Origin,
    relay: Url,
    mode: RewriteMode,
}

impl RewriteRule {
    /// Relay requests for `target`'s origin through `relay`.
    ///
    /// The original path and query are appended to the relay's path, so
    /// `https://api.example.com/store/carts?x=1` through
    /// `https://shop.example.com/commerce` becomes
    /// `https://shop.example.com/commerce/store/carts?x=1`.
    #[must_use]
    pub fn new(target: &Url, relay: Url, mode: RewriteMode) -> Self {
        Self {
            origin: target.origin(),
            relay,
            mode,
        }
    }

    /// Whether this rule covers `url`.
    #[must_use]
    pub fn applies_to(&self, url: &Url) -> bool {
        url.origin() == self.origin
    }

    /// The relayed form of `url`.
    #[must_use]
    pub fn relay_url(&self, url: &Url) -> Url {
        let mut relayed = self.relay.clone();
        let base = self.relay.path().trim_end_matches('/');
        relayed.set_path(&format!("{base}{}", url.path()));
        relayed.set_query(url.query());
        relayed
    }

    /// The rule's mode.
    #[must_use]
    pub const fn mode(&self) -> RewriteMode {
        self.mode
    }
}

/// An ordered set of rewrite rules. The first matching rule of each mode wins.
#[derive(Debug, Clone, Default)]
pub struct ProxyPolicy {
    rules: Vec<RewriteRule>,
}

impl ProxyPolicy {
    /// An empty policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: RewriteRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Where `url` should be sent first.
    #[must_use]
    pub fn rewrite(&self, url: &Url) -> Url {
        self.rules
            .iter()
            .find(|rule| rule.mode == RewriteMode::Always && rule.applies_to(url))
            .map_or_else(|| url.clone(), |rule| rule.relay_url(url))
    }

    /// Where to retry `url` after a transient failure, if anywhere.
    #[must_use]
    pub fn fallback(&self, url: &Url) -> Option<Url> {
        self.rules
            .iter()
            .find(|rule| rule.mode == RewriteMode::OnTransientFailure && rule.applies_to(url))
            .map(|rule| rule.relay_url(url))
    }
}

/// Shared slot holding the active policy, if any.
pub(crate) type PolicySlot = Arc<ArcSwapOption<ProxyPolicy>>;

/// Install `policy` into `slot`.
pub(crate) fn install(slot: &PolicySlot, policy: ProxyPolicy) -> Result<ProxyActivation, ProxyError> {
    let inactive: Option<Arc<ProxyPolicy>> = None;
    let previous = slot.compare_and_swap(&inactive, Some(Arc::new(policy)));
    if previous.is_some() {
        return Err(ProxyError::AlreadyActive);
    }

    tracing::info!("fetch proxy activated");
    Ok(ProxyActivation {
        slot: Arc::clone(slot),
        active: true,
    })
}

/// Proof that a proxy policy is installed. Restores the plain transport
/// when deactivated or dropped.
#[must_use = "dropping the activation immediately restores the unproxied transport"]
#[derive(Debug)]
pub struct ProxyActivation {
    slot: PolicySlot,
    active: bool,
}

impl ProxyActivation {
    /// Remove the policy now.
    pub fn deactivate(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if self.active {
            self.slot.store(None);
            self.active = false;
            tracing::info!("fetch proxy deactivated");
        }
    }
}

impl Drop for ProxyActivation {
    fn drop(&mut self) {
        self.restore();
    }
}
