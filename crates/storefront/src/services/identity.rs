//! Current customer lookup under a soft deadline.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tidewater_core::Customer;
use tracing::{Instrument, instrument};

use crate::commerce::CommerceBackend;
use crate::deadline::{self, Deadline};

/// Resolves the signed-in customer, or `None` for a guest.
///
/// A slow or failing identity check never blocks the response: the lookup
/// races a timer, and losing the race or failing both mean "guest". The
/// remote call is not cancelled when the timer wins.
#[derive(Clone)]
pub struct IdentityResolver {
    backend: Arc<dyn CommerceBackend>,
    timeout: Duration,
}

impl IdentityResolver {
    /// Create a resolver that waits at most `timeout` for the backend.
    #[must_use]
    pub fn new(backend: Arc<dyn CommerceBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// The customer `token` identifies, if any.
    #[instrument(skip_all, fields(has_token = token.is_some()))]
    pub async fn customer(&self, token: Option<SecretString>) -> Option<Customer> {
        let token = token?;
        let backend = Arc::clone(&self.backend);
        let lookup = async move { backend.retrieve_customer(&token).await }.in_current_span();

        match deadline::within(self.timeout, lookup).await {
            Deadline::Settled(Ok(customer)) => Some(customer),
            Deadline::Settled(Err(e)) => {
                tracing::warn!(error = %e, "identity lookup failed, continuing as guest");
                None
            }
            Deadline::Elapsed => {
                tracing::warn!(
                    timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    "identity lookup timed out, continuing as guest"
                );
                None
            }
            Deadline::Aborted => None,
        }
    }
}
