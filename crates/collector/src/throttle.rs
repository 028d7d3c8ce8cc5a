//! Scroll debounce — coalesces the high-frequency scroll signal stream into
//! at most one emission per quiescence window.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Debounce over tokio timers. Each new occurrence cancels and replaces the
/// pending timer, so at most one timer is ever pending and sustained
/// scrolling emits nothing until motion stops.
///
/// Must be used from within a tokio runtime.
pub struct ScrollDebounce {
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl ScrollDebounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    /// Register a scroll occurrence. `emit` runs once the window elapses
    /// without a subsequent occurrence; a later `poke` or `cancel` abandons
    /// it.
    pub fn poke<F>(&self, emit: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let window = self.window;
        let mut pending = self.pending.lock();
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            emit();
        }));
    }

    /// Abandon the pending emission, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for ScrollDebounce {
    fn drop(&mut self) {
        self.cancel();
    }
}
