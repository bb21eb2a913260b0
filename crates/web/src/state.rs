//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::db::{AccountRepository, CatalogRepository};
use crate::middleware::PageCache;
use crate::services::auth::AuthService;
use crate::services::media::MediaStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the repositories and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    catalog: Arc<dyn CatalogRepository>,
    accounts: Arc<dyn AccountRepository>,
    media: MediaStore,
    page_cache: PageCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration
    /// * `catalog` - Book and review repository
    /// * `accounts` - User and permission repository
    #[must_use]
    pub fn new(
        config: Config,
        catalog: Arc<dyn CatalogRepository>,
        accounts: Arc<dyn AccountRepository>,
    ) -> Self {
        let media = MediaStore::new(config.media_root.clone());
        let page_cache = PageCache::new(config.page_cache_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                accounts,
                media,
                page_cache,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the book and review repository.
    #[must_use]
    pub fn catalog(&self) -> &dyn CatalogRepository {
        self.inner.catalog.as_ref()
    }

    /// Get the account repository.
    #[must_use]
    pub fn accounts(&self) -> &dyn AccountRepository {
        self.inner.accounts.as_ref()
    }

    /// Get the cover image store.
    #[must_use]
    pub fn media(&self) -> &MediaStore {
        &self.inner.media
    }

    /// Cached anonymous responses for the public pages.
    #[must_use]
    pub fn page_cache(&self) -> &PageCache {
        &self.inner.page_cache
    }

    /// Authentication service bound to the account repository.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.accounts())
    }
}
