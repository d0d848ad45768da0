//! Guest/authenticated data reconciliation, shared by every aggregate page.
//!
//! A page either sources its data from the server of record (a credential is
//! present) or from a guest-only snapshot in the local store, refreshed in the
//! background. The decision rule lives here once; pages only name their cache
//! key and their fetch set through [`PageData`].
//!
//! Rules:
//! - With a credential, the snapshot is evicted on mount without being read,
//!   and again after every fetch.
//! - As a guest, a readable snapshot paints the view immediately (no loading
//!   state). An unreadable one is logged and treated as a miss.
//! - A fetch result is written back to the snapshot only if no credential
//!   existed when the fetch started *and* none exists when it resolves. The
//!   final check is made by the store in the same step as the write.
//! - Results arriving after [`Page::unmount`] are discarded.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::{ApiError, JournalApi};
use crate::session;
use crate::store::{keys, LocalStore};

/// A page's dataset: what it fetches and where guests cache it.
#[async_trait]
pub trait PageData: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Short page name for logs.
    const NAME: &'static str;

    /// Store key of this page's guest snapshot.
    const CACHE_KEY: &'static str;

    /// Issue the page's full fetch set. Every request runs to completion
    /// before this returns, even when one of them fails early.
    async fn fetch(api: &dyn JournalApi) -> Result<Self, ApiError>;
}

/// Where the data currently on screen came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Empty,
    Cache,
    Remote,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageView<P> {
    pub data: Option<P>,
    pub loading: bool,
    pub origin: Origin,
}

impl<P> PageView<P> {
    fn loading() -> Self {
        Self {
            data: None,
            loading: true,
            origin: Origin::Empty,
        }
    }

    fn cached(data: P) -> Self {
        Self {
            data: Some(data),
            loading: false,
            origin: Origin::Cache,
        }
    }
}

/// What happened to a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// Shown, and cached for a guest.
    Applied { cached: bool },
    /// The fetch failed; the view kept what it had.
    Failed,
    /// The page was torn down, or the session ended mid-flight.
    Discarded,
}

pub struct Page<P: PageData> {
    store: Arc<dyn LocalStore>,
    view: Mutex<PageView<P>>,
    mounted: AtomicBool,
}

impl<P: PageData> Page<P> {
    /// Decide the data source and paint the initial view synchronously.
    pub fn mount(store: Arc<dyn LocalStore>) -> Self {
        let view = match session::has_credential(store.as_ref()) {
            Ok(true) => {
                tracing::debug!(page = P::NAME, "authenticated mount, server is the only source");
                evict::<P>(store.as_ref());
                PageView::loading()
            }
            Ok(false) => match read_snapshot::<P>(store.as_ref()) {
                Some(data) => {
                    tracing::debug!(page = P::NAME, "guest mount, painting cached snapshot");
                    PageView::cached(data)
                }
                None => PageView::loading(),
            },
            Err(e) => {
                // Without knowing the session state the snapshot may not be read.
                tracing::warn!(page = P::NAME, error = %e, "could not read session state");
                evict::<P>(store.as_ref());
                PageView::loading()
            }
        };

        Self {
            store,
            view: Mutex::new(view),
            mounted: AtomicBool::new(true),
        }
    }

    /// A copy of the current view.
    pub fn view(&self) -> PageView<P> {
        self.lock_view().clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Tear the page down. Fetches still in flight are left to finish but
    /// their results are dropped.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    /// Fetch the page's dataset and settle the result into the view and cache.
    pub async fn refresh(&self, api: &dyn JournalApi) -> Settled {
        let guest_at_start = !self.credential_present();
        let result = P::fetch(api).await;
        self.settle(guest_at_start, result)
    }

    fn settle(&self, guest_at_start: bool, result: Result<P, ApiError>) -> Settled {
        let authenticated_now = self.credential_present();
        if authenticated_now {
            evict::<P>(self.store.as_ref());
        }

        if !self.is_mounted() {
            tracing::debug!(page = P::NAME, "page unmounted, dropping fetch result");
            return Settled::Discarded;
        }

        let mut view = self.lock_view();

        if !guest_at_start && !authenticated_now {
            // Logged out while the fetch was in flight: nothing fetched under
            // the old session may stay on screen.
            tracing::info!(page = P::NAME, "session ended during fetch, clearing view");
            *view = PageView {
                data: None,
                loading: false,
                origin: Origin::Empty,
            };
            return Settled::Discarded;
        }

        match result {
            Ok(data) => {
                let cached = guest_at_start
                    && !authenticated_now
                    && write_snapshot(self.store.as_ref(), &data);
                *view = PageView {
                    data: Some(data),
                    loading: false,
                    origin: Origin::Remote,
                };
                Settled::Applied { cached }
            }
            Err(e) => {
                tracing::warn!(page = P::NAME, error = %e, "failed to load page data");
                view.loading = false;
                Settled::Failed
            }
        }
    }

    /// Credential check for write decisions. An unreadable store counts as
    /// authenticated, which only ever suppresses a cache write.
    fn credential_present(&self) -> bool {
        session::has_credential(self.store.as_ref()).unwrap_or_else(|e| {
            tracing::warn!(page = P::NAME, error = %e, "could not read session state");
            true
        })
    }

    fn lock_view(&self) -> MutexGuard<'_, PageView<P>> {
        // A poisoned view only means a panic mid-update elsewhere; the data
        // itself is still a valid PageView.
        self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn read_snapshot<P: PageData>(store: &dyn LocalStore) -> Option<P> {
    let raw = match store.get(P::CACHE_KEY) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(page = P::NAME, error = %e, "failed to read snapshot");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(data) => Some(data),
        Err(e) => {
            tracing::warn!(page = P::NAME, error = %e, "cached snapshot is unreadable, ignoring it");
            evict::<P>(store);
            None
        }
    }
}

/// Write the snapshot unless a credential has appeared. The credential check
/// and the write happen in one store operation.
fn write_snapshot<P: PageData>(store: &dyn LocalStore, data: &P) -> bool {
    let result = serde_json::to_string(data)
        .map_err(anyhow::Error::from)
        .and_then(|json| store.set_unless_present(keys::TOKEN, P::CACHE_KEY, &json));
    match result {
        Ok(true) => {
            tracing::debug!(page = P::NAME, "guest snapshot updated");
            true
        }
        Ok(false) => {
            tracing::debug!(page = P::NAME, "session started before snapshot write, skipping");
            false
        }
        Err(e) => {
            tracing::warn!(page = P::NAME, error = %e, "failed to write snapshot");
            false
        }
    }
}

fn evict<P: PageData>(store: &dyn LocalStore) {
    if let Err(e) = store.remove(P::CACHE_KEY) {
        tracing::warn!(page = P::NAME, error = %e, "failed to evict snapshot");
    }
}
