//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiSettings;
use crate::db::{PgStore, Store};
use crate::services::{AccountService, MessageService, OrderLifecycle};

/// Application state shared across all handlers.
///
/// Generic over the storage backend so the same router serves `PostgreSQL`
/// in production and the in-memory store in tests.
pub struct AppState<S = PgStore> {
    inner: Arc<AppStateInner<S>>,
}

struct AppStateInner<S> {
    store: S,
    lifecycle: OrderLifecycle<S>,
    accounts: AccountService<S>,
    messages: MessageService<S>,
    settings: ApiSettings,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Store> AppState<S> {
    /// Build the state around a store.
    #[must_use]
    pub fn new(store: S, settings: ApiSettings) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                lifecycle: OrderLifecycle::new(store.clone()),
                accounts: AccountService::new(store.clone()),
                messages: MessageService::new(store.clone()),
                store,
                settings,
            }),
        }
    }

    /// The storage backend.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// The Order Lifecycle Engine.
    #[must_use]
    pub fn lifecycle(&self) -> &OrderLifecycle<S> {
        &self.inner.lifecycle
    }

    /// Account approval and directory.
    #[must_use]
    pub fn accounts(&self) -> &AccountService<S> {
        &self.inner.accounts
    }

    /// Direct messages.
    #[must_use]
    pub fn messages(&self) -> &MessageService<S> {
        &self.inner.messages
    }

    /// Request-time API settings.
    #[must_use]
    pub fn settings(&self) -> ApiSettings {
        self.inner.settings
    }
}
