//! Session cookie store for the cart reference.
//!
//! The `cart-id` cookie is the only state this layer persists, and this
//! module is the only code that writes it. The store is extracted per
//! request, queues writes while the handler runs, and emits them as
//! `Set-Cookie` headers when returned as part of the response.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header, request::Parts},
    response::{IntoResponseParts, ResponseParts},
};
use tidewater_core::CartId;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use super::consent::ConsentGate;
use crate::state::AppState;

/// Cart reference cookie name.
pub const CART_COOKIE_NAME: &str = "cart-id";

/// Cart reference lifetime in seconds (7 days).
pub const CART_COOKIE_MAX_AGE_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Parse every cookie sent with a request. Malformed pairs are skipped.
pub fn request_cookies(headers: &HeaderMap) -> impl Iterator<Item = Cookie<'static>> + '_ {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .map(Cookie::into_owned)
}

/// Whether `value` can be sent as a cookie value unquoted and unescaped.
///
/// Only RFC 6265 cookie-octets are allowed: visible ASCII except `"`,
/// `,`, `;` and `\`. Anything else could end the value early and smuggle
/// attributes into the `Set-Cookie` header.
#[must_use]
pub fn is_cookie_value(value: &str) -> bool {
    value.bytes().all(|b| {
        matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
    })
}

/// An immediately-expiring cookie that tells the client to drop `name`.
#[must_use]
pub fn expired_cookie(name: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

/// Reads and writes the cart reference cookie.
#[derive(Debug, Clone)]
pub struct SessionCookieStore {
    current: Option<CartId>,
    secure: bool,
    writes: Vec<Cookie<'static>>,
}

impl SessionCookieStore {
    /// A store seeded with the reference the client sent, if any.
    #[must_use]
    pub const fn new(current: Option<CartId>, secure: bool) -> Self {
        Self {
            current,
            secure,
            writes: Vec::new(),
        }
    }

    /// Build a store from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, secure: bool) -> Self {
        let current = request_cookies(headers)
            .find(|cookie| cookie.name() == CART_COOKIE_NAME && !cookie.value().is_empty())
            .map(|cookie| CartId::new(cookie.value()));
        Self::new(current, secure)
    }

    /// The current cart reference.
    #[must_use]
    pub const fn get(&self) -> Option<&CartId> {
        self.current.as_ref()
    }

    /// Persist `cart_id` if `consent` allows it.
    ///
    /// Returns whether a cookie write was queued. Without accepted consent
    /// nothing is written and the reference lives only for this request.
    /// An id that is not a valid cookie value is never written either.
    pub fn set(&mut self, cart_id: &CartId, consent: &ConsentGate) -> bool {
        self.current = Some(cart_id.clone());

        if !consent.allows_persistence() {
            tracing::debug!(cart_id = %cart_id, "consent not given, cart reference not persisted");
            return false;
        }
        if !is_cookie_value(cart_id.as_str()) {
            tracing::warn!("cart id is not a valid cookie value, not persisted");
            return false;
        }

        let cookie = Cookie::build((CART_COOKIE_NAME, cart_id.as_str().to_owned()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure)
            .max_age(Duration::seconds(CART_COOKIE_MAX_AGE_SECONDS))
            .build();
        self.replace_write(cookie);
        true
    }

    /// Tell the client to expire the reference now.
    ///
    /// Clearing never needs consent: it removes state rather than adding it.
    pub fn clear(&mut self) {
        self.current = None;
        self.replace_write(expired_cookie(CART_COOKIE_NAME.to_owned(), self.secure));
    }

    /// Drop the reference for this request only, writing nothing.
    ///
    /// Used when consent does not allow touching the client's cookies.
    pub fn forget(&mut self) {
        self.current = None;
    }

    /// Cookie writes queued so far.
    #[must_use]
    pub fn pending(&self) -> &[Cookie<'static>] {
        &self.writes
    }

    // Later writes to the cart cookie supersede earlier ones.
    fn replace_write(&mut self, cookie: Cookie<'static>) {
        self.writes.retain(|queued| queued.name() != cookie.name());
        self.writes.push(cookie);
    }
}

impl IntoResponseParts for SessionCookieStore {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for cookie in self.writes {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    res.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::error!(error = %e, "cart cookie is not a valid header value"),
            }
        }
        Ok(res)
    }
}

impl FromRequestParts<AppState> for SessionCookieStore {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers, state.config().is_secure()))
    }
}
