//! Response cache for the public pages.
//!
//! Anonymous `GET` requests for the home, about and search pages are served
//! from an in-process `moka` cache keyed by the request URI. A request that
//! carries a session cookie or comes from HTMX always reaches the handler, so
//! pages that show a user, flash messages or fragments are never shared.
//! Admin writes clear the whole cache.

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use moka::future::Cache;

use crate::middleware::response_mode::HX_REQUEST_HEADER;
use crate::middleware::session::SESSION_COOKIE_NAME;
use crate::state::AppState;

/// Most distinct pages kept at once.
const MAX_CACHED_PAGES: u64 = 1000;

#[derive(Debug, Clone)]
struct CachedPage {
    content_type: Option<HeaderValue>,
    body: Bytes,
}

impl CachedPage {
    fn to_response(&self) -> Response {
        let mut response = Response::new(Body::from(self.body.clone()));
        if let Some(content_type) = &self.content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type.clone());
        }
        response
    }
}

/// Cached public pages. Disabled when built with a zero lifetime.
#[derive(Debug, Clone)]
pub struct PageCache {
    pages: Option<Cache<String, CachedPage>>,
}

impl PageCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let pages = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(MAX_CACHED_PAGES)
                .time_to_live(ttl)
                .build()
        });
        Self { pages }
    }

    /// Drop every cached page, e.g. after the catalog changed.
    pub fn invalidate_all(&self) {
        if let Some(pages) = &self.pages {
            pages.invalidate_all();
            tracing::debug!("Page cache cleared");
        }
    }
}

/// Whether a request may be answered from, or stored in, the cache.
fn is_cacheable(method: &Method, headers: &HeaderMap) -> bool {
    if method != Method::GET || headers.contains_key(HX_REQUEST_HEADER) {
        return false;
    }

    let has_session = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .any(|pair| {
            pair.trim()
                .split_once('=')
                .is_some_and(|(name, _)| name == SESSION_COOKIE_NAME)
        });
    !has_session
}

/// Serve anonymous page views from the cache, filling it on a miss.
pub async fn page_cache_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(pages) = &state.page_cache().pages else {
        return next.run(request).await;
    };
    if !is_cacheable(request.method(), request.headers()) {
        return next.run(request).await;
    }

    let key = request.uri().to_string();
    if let Some(page) = pages.get(&key).await {
        tracing::debug!(uri = %key, "Page cache hit");
        return page.to_response();
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK || response.headers().contains_key(header::SET_COOKIE)
    {
        return response;
    }

    let (parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, uri = %key, "Failed to buffer page for caching");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let page = CachedPage {
        content_type: parts.headers.get(header::CONTENT_TYPE).cloned(),
        body: body.clone(),
    };
    pages.insert(key, page).await;

    Response::from_parts(parts, Body::from(body))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.append(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_anonymous_get_is_cacheable() {
        assert!(is_cacheable(&Method::GET, &HeaderMap::new()));
        assert!(is_cacheable(
            &Method::GET,
            &headers(&[("cookie", "theme=dark; other_session=1")])
        ));
    }

    #[test]
    fn test_session_htmx_and_writes_bypass_cache() {
        assert!(!is_cacheable(&Method::POST, &HeaderMap::new()));
        assert!(!is_cacheable(&Method::GET, &headers(&[("hx-request", "true")])));
        assert!(!is_cacheable(
            &Method::GET,
            &headers(&[("cookie", "theme=dark; bookshelf_session=abc")])
        ));
    }

    #[tokio::test]
    async fn test_zero_lifetime_disables_and_invalidate_clears() {
        assert!(PageCache::new(Duration::ZERO).pages.is_none());

        let cache = PageCache::new(Duration::from_secs(60));
        let pages = cache.pages.as_ref().unwrap();
        pages
            .insert(
                "/about/".to_string(),
                CachedPage {
                    content_type: None,
                    body: Bytes::from_static(b"about"),
                },
            )
            .await;
        assert!(pages.get("/about/").await.is_some());

        cache.invalidate_all();
        assert!(pages.get("/about/").await.is_none());
    }
}
