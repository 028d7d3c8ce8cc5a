//! Interaction surface — the seam between the capture engine and the hosted
//! document environment.
//!
//! The engine never touches environment globals: it reads page metadata and
//! receives interaction occurrences through [`InteractionSurface`], holding
//! an explicit [`Subscription`] it can release on teardown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::UnboundedSender;

use crate::events::{SurfaceEvent, TrackedElement};

/// A hosted document environment observed by the capture engine.
pub trait InteractionSurface: Send + Sync {
    /// Full current location.
    fn page_url(&self) -> String;

    /// Current document title.
    fn page_title(&self) -> String;

    /// Static scan of markup-declared trackable elements. Performed once at
    /// engine installation; elements appearing later are not retroactively
    /// wired.
    fn tracked_elements(&self) -> Vec<TrackedElement>;

    /// Register an observer channel for interaction occurrences. Dropping
    /// the returned handle deregisters it.
    fn subscribe(&self, sender: UnboundedSender<SurfaceEvent>) -> Subscription;
}

/// RAII handle for a surface subscription; deregisters on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// In-memory surface driven by recorded or simulated interaction streams.
/// Backs the replay driver and the test suite.
pub struct ReplaySurface {
    url: RwLock<String>,
    title: RwLock<String>,
    tracked: RwLock<Vec<TrackedElement>>,
    subscribers: Arc<Mutex<HashMap<u64, UnboundedSender<SurfaceEvent>>>>,
    next_subscriber: AtomicU64,
}

impl ReplaySurface {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: RwLock::new(url.into()),
            title: RwLock::new(title.into()),
            tracked: RwLock::new(Vec::new()),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_subscriber: AtomicU64::new(0),
        }
    }

    /// Move the surface to a new location and report it as a history
    /// navigation. The location changes before observers see the event,
    /// matching how history navigation behaves in a real document
    /// environment.
    pub fn navigate(&self, url: impl Into<String>, title: impl Into<String>) {
        *self.url.write() = url.into();
        *self.title.write() = title.into();
        self.emit(SurfaceEvent::HistoryNav);
    }

    /// Declare a trackable element. Only scans performed after this call
    /// will see it.
    pub fn add_tracked(&self, element: TrackedElement) {
        self.tracked.write().push(element);
    }

    /// Fan an occurrence out to every live subscriber. Subscribers whose
    /// receiving side is gone are dropped.
    pub fn emit(&self, event: SurfaceEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|_, sender| sender.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl InteractionSurface for ReplaySurface {
    fn page_url(&self) -> String {
        self.url.read().clone()
    }

    fn page_title(&self) -> String {
        self.title.read().clone()
    }

    fn tracked_elements(&self) -> Vec<TrackedElement> {
        self.tracked.read().clone()
    }

    fn subscribe(&self, sender: UnboundedSender<SurfaceEvent>) -> Subscription {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().insert(id, sender);

        let subscribers = self.subscribers.clone();
        Subscription::new(move || {
            subscribers.lock().remove(&id);
        })
    }
}
