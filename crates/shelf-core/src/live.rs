//! Debounced live search
//!
//! Each keystroke bumps a generation counter and aborts the pending search.
//! A search fires only after the debounce delay, and its result is published
//! only if no newer keystroke arrived in the meantime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::ShelfConfig;
use crate::sources::{Catalog, CombinedResults};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Published state of the live search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveResult {
    pub generation: u64,
    pub query: String,
    pub results: CombinedResults,
}

pub struct LiveSearch {
    catalog: Arc<Catalog>,
    debounce: Duration,
    max_results: u32,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
    tx: Arc<watch::Sender<LiveResult>>,
}

impl LiveSearch {
    pub fn new(catalog: Arc<Catalog>, debounce: Duration, max_results: u32) -> Self {
        let (tx, _rx) = watch::channel(LiveResult::default());
        Self {
            catalog,
            debounce,
            max_results,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
            tx: Arc::new(tx),
        }
    }

    pub fn from_config(catalog: Arc<Catalog>, config: &ShelfConfig) -> Self {
        Self::new(catalog, config.search.debounce(), config.search.max_results)
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveResult> {
        self.tx.subscribe()
    }

    /// Most recently published result
    pub fn latest(&self) -> LiveResult {
        self.tx.borrow().clone()
    }

    /// Register a keystroke. Must be called from within a tokio runtime.
    pub fn submit(&self, query: &str) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.abort_pending();

        let query = query.trim().to_string();
        if query.is_empty() {
            publish(
                &self.tx,
                &self.generation,
                LiveResult {
                    generation,
                    query,
                    results: CombinedResults::default(),
                },
            );
            return;
        }

        let catalog = Arc::clone(&self.catalog);
        let latest = Arc::clone(&self.generation);
        let tx = Arc::clone(&self.tx);
        let debounce = self.debounce;
        let max_results = self.max_results;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if latest.load(Ordering::SeqCst) != generation {
                return;
            }

            tracing::debug!(query = %query, generation, "Running live search");
            let results = catalog.search_all(&query, max_results).await;

            let result = LiveResult {
                generation,
                query,
                results,
            };
            if !publish(&tx, &latest, result) {
                tracing::debug!(generation, "Discarded superseded live search result");
            }
        });

        if let Ok(mut pending) = self.pending.lock() {
            *pending = Some(handle);
        }
    }

    /// Drop whatever is pending without publishing
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.abort_pending();
    }

    fn abort_pending(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(handle) = pending.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for LiveSearch {
    fn drop(&mut self) {
        self.abort_pending();
    }
}

/// Publish unless a newer generation exists; checked under the channel lock
fn publish(tx: &watch::Sender<LiveResult>, latest: &AtomicU64, result: LiveResult) -> bool {
    tx.send_if_modified(|current| {
        if latest.load(Ordering::SeqCst) != result.generation {
            return false;
        }
        *current = result;
        true
    })
}
