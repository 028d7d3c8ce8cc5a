//! Delivery — serializes one record per request and POSTs it to the
//! collection endpoint, best-effort and fire-and-forget.
//!
//! Capture code talks to an [`DeliverySink`]; the HTTP implementation spawns
//! a background task per record and downgrades every failure to a warning.
//! No-op and capturing sinks exist for embedding and tests.

use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::config::CollectorConfig;
use crate::error::{CollectorResult, DispatchError};
use crate::events::EventRecord;

/// Sink for normalized event records. `submit` must not block and must not
/// surface failures to the caller.
pub trait DeliverySink: Send + Sync {
    fn submit(&self, record: EventRecord);
}

/// Delivers records over HTTP. Cheap to clone; clones share the underlying
/// connection pool.
#[derive(Clone)]
pub struct HttpDispatcher {
    client: Client,
    collect_url: Url,
}

impl HttpDispatcher {
    pub fn new(config: &CollectorConfig) -> CollectorResult<Self> {
        Ok(Self {
            client: Client::new(),
            collect_url: config.collect_url()?,
        })
    }

    /// Perform a single delivery attempt. Exposed so the outcome can be
    /// observed directly; the fire-and-forget path goes through
    /// [`DeliverySink::submit`].
    pub async fn deliver(&self, record: &EventRecord) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(self.collect_url.clone())
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Rejected { status });
        }
        debug!(element_id = %record.element_id, "event delivered");
        Ok(())
    }
}

impl DeliverySink for HttpDispatcher {
    fn submit(&self, record: EventRecord) {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            // Failures are observational only: no retry, no backoff, nothing
            // propagated to the capture path.
            if let Err(error) = dispatcher.deliver(&record).await {
                warn!(error = %error, element_id = %record.element_id, "failed to deliver event");
            }
        });
    }
}

/// Discards records. For embeddings that want capture without delivery.
pub struct NoOpSink;

impl DeliverySink for NoOpSink {
    fn submit(&self, _record: EventRecord) {}
}

/// In-memory sink that captures records for testing.
#[derive(Default)]
pub struct CaptureSink {
    records: Mutex<Vec<EventRecord>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.records.lock().len()
    }

    pub fn count_id(&self, element_id: &str) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.element_id == element_id)
            .count()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl DeliverySink for CaptureSink {
    fn submit(&self, record: EventRecord) {
        self.records.lock().push(record);
    }
}

/// Convenience: a sink that drops everything.
pub fn noop_sink() -> Arc<dyn DeliverySink> {
    Arc::new(NoOpSink)
}

/// Convenience: a capturing sink for tests.
pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}
