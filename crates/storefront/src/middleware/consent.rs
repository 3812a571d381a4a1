//! Consent gate extractor.
//!
//! The decision is held by the client in the `cookie-consent` cookie. The
//! gate is a plain value built per request and passed to every operation
//! that might write a cookie, so each write site's gating is explicit.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use tidewater_core::ConsentDecision;

use super::session::request_cookies;

/// Name of the client-held consent cookie.
pub const CONSENT_COOKIE_NAME: &str = "cookie-consent";

/// The request's cookie-consent decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsentGate {
    decision: ConsentDecision,
}

impl ConsentGate {
    /// A gate for an explicit decision.
    #[must_use]
    pub const fn new(decision: ConsentDecision) -> Self {
        Self { decision }
    }

    /// Read the decision from the request's cookies.
    ///
    /// A missing or unreadable value counts as undecided.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let decision = request_cookies(headers)
            .find(|cookie| cookie.name() == CONSENT_COOKIE_NAME)
            .map_or(ConsentDecision::Undecided, |cookie| {
                cookie.value().parse().unwrap_or_else(|e| {
                    tracing::debug!(error = %e, "unreadable consent cookie, treating as undecided");
                    ConsentDecision::Undecided
                })
            });
        Self { decision }
    }

    /// The underlying decision.
    #[must_use]
    pub const fn decision(&self) -> ConsentDecision {
        self.decision
    }

    /// Whether the user has made any choice.
    #[must_use]
    pub const fn has_decided(&self) -> bool {
        self.decision.has_decided()
    }

    /// Whether cookies may be written.
    #[must_use]
    pub const fn allows_persistence(&self) -> bool {
        self.decision.is_accepted()
    }
}

impl<S> FromRequestParts<S> for ConsentGate
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
