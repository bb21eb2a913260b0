//! Full page or fragment response selection.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};

/// Header sent by HTMX on every request it issues.
pub const HX_REQUEST_HEADER: &str = "hx-request";

/// How a handler should answer, resolved once per request.
///
/// HTMX requests get a small HTML fragment to swap into the page; everything
/// else gets a full page or a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    FullPage,
    Fragment,
}

impl ResponseMode {
    /// Resolve the mode from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let is_htmx = headers
            .get(HX_REQUEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        if is_htmx { Self::Fragment } else { Self::FullPage }
    }

    #[must_use]
    pub const fn is_fragment(self) -> bool {
        matches!(self, Self::Fragment)
    }
}

impl<S> FromRequestParts<S> for ResponseMode
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
