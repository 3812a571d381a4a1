//! Customer identity token extractor.
//!
//! Reads the token from an `Authorization: Bearer` header, falling back to
//! the client's `auth-token` cookie. This layer never writes that cookie.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use secrecy::SecretString;

use super::session::request_cookies;

/// Name of the client-held identity cookie.
pub const AUTH_COOKIE_NAME: &str = "auth-token";

/// Extractor that optionally gets the customer's identity token.
///
/// Never rejects: a request without a token is a guest.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OptionalCustomerToken(token): OptionalCustomerToken) -> impl IntoResponse {
///     match token {
///         Some(_) => "Signed in",
///         None => "Guest visitor",
///     }
/// }
/// ```
pub struct OptionalCustomerToken(pub Option<SecretString>);

impl OptionalCustomerToken {
    /// Read the token from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| SecretString::from(token.to_owned()));

        let token = bearer.or_else(|| {
            request_cookies(headers)
                .find(|cookie| cookie.name() == AUTH_COOKIE_NAME && !cookie.value().is_empty())
                .map(|cookie| SecretString::from(cookie.value().to_owned()))
        });

        Self(token)
    }
}

impl<S> FromRequestParts<S> for OptionalCustomerToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, header::COOKIE};
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok_header"));
        headers.insert(COOKIE, HeaderValue::from_static("auth-token=tok_cookie"));

        let OptionalCustomerToken(token) = OptionalCustomerToken::from_headers(&headers);
        assert_eq!(token.as_ref().map(ExposeSecret::expose_secret), Some("tok_header"));
    }

    #[test]
    fn test_cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("cart-id=c; auth-token=tok_cookie"));

        let OptionalCustomerToken(token) = OptionalCustomerToken::from_headers(&headers);
        assert_eq!(token.as_ref().map(ExposeSecret::expose_secret), Some("tok_cookie"));
    }

    #[test]
    fn test_no_token_is_guest() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(OptionalCustomerToken::from_headers(&headers).0.is_none());
    }
}
