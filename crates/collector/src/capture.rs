//! Capture engine — observes interaction occurrences on a document surface,
//! normalizes them into event records, and hands each record to the delivery
//! sink as it is built. Capture never blocks, queues, or retries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::CollectorConfig;
use crate::dispatch::DeliverySink;
use crate::events::{
    ClickSignal, ElementRef, EventRecord, ScrollSignal, SubmitSignal, SurfaceEvent, TrackedElement,
};
use crate::extract;
use crate::session;
use crate::surface::{InteractionSurface, Subscription};
use crate::throttle::ScrollDebounce;

/// Live observer state, released on detach.
struct Attachment {
    _subscription: Subscription,
    pump: JoinHandle<()>,
}

/// One capture engine per loaded page. Construct with [`CaptureEngine::install`]
/// and keep the returned handle; embedding code uses it to emit custom events
/// and to tear capture down.
pub struct CaptureEngine {
    session_id: String,
    surface: Arc<dyn InteractionSurface>,
    sink: Arc<dyn DeliverySink>,
    debounce: ScrollDebounce,
    /// Markup auto-wiring map, snapshotted once at installation.
    wired: HashMap<ElementRef, TrackedElement>,
    attachment: Mutex<Option<Attachment>>,
}

impl CaptureEngine {
    /// Install a capture engine on a surface: generate the session identity,
    /// scan for markup-declared trackable elements, emit the initial page
    /// view, and start observing interaction occurrences.
    pub fn install(
        surface: Arc<dyn InteractionSurface>,
        sink: Arc<dyn DeliverySink>,
        config: &CollectorConfig,
    ) -> Arc<Self> {
        let wired: HashMap<ElementRef, TrackedElement> = surface
            .tracked_elements()
            .into_iter()
            .map(|element| (element.element, element))
            .collect();

        let engine = Arc::new(Self {
            session_id: session::generate_session_id(),
            surface,
            sink,
            debounce: ScrollDebounce::new(Duration::from_millis(config.scroll_debounce_ms)),
            wired,
            attachment: Mutex::new(None),
        });

        info!(
            session_id = %engine.session_id,
            wired_elements = engine.wired.len(),
            "capture engine installed"
        );

        engine.record_page_view();

        let (sender, mut receiver) = mpsc::unbounded_channel();
        let subscription = engine.surface.subscribe(sender);
        let pump_engine = engine.clone();
        let pump = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                pump_engine.handle_event(event);
            }
        });
        *engine.attachment.lock() = Some(Attachment {
            _subscription: subscription,
            pump,
        });

        engine
    }

    /// Opaque identifier for this instance's session. Immutable; not part of
    /// the transmitted record shape.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.lock().is_some()
    }

    /// Route one interaction occurrence. Called by the observer pump; public
    /// so embedders can drive an engine directly.
    pub fn handle_event(&self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Click(signal) => self.handle_click(signal),
            SurfaceEvent::Submit(signal) => self.handle_submit(signal),
            SurfaceEvent::HistoryNav => self.record_page_view(),
            SurfaceEvent::Scroll(signal) => self.handle_scroll(signal),
        }
    }

    fn handle_click(&self, signal: ClickSignal) {
        let label = extract::label_for(&signal.target);
        let record = EventRecord::new(
            self.surface.page_url(),
            signal.target.element_id.clone(),
            signal.target.element_class.clone(),
            &label,
            Some((signal.x, signal.y)),
        );
        debug!(
            element_id = %record.element_id,
            x = signal.x,
            y = signal.y,
            "click captured"
        );
        self.sink.submit(record);

        // Markup auto-wiring: a click on a wired element additionally raises
        // a custom_track event carrying the declared label.
        if let Some(binding) = signal.element.and_then(|el| self.wired.get(&el)) {
            let mut overlay = Map::new();
            overlay.insert("element_text".into(), Value::String(binding.label.clone()));
            overlay.insert(
                "element_id".into(),
                Value::String(binding.element_id.clone()),
            );
            overlay.insert(
                "element_source_class".into(),
                Value::String(binding.element_class.clone()),
            );
            self.track_custom_event("custom_track", overlay);
        }
    }

    /// Emit a page-view record for the current location. Fired once at
    /// installation and again on every history navigation.
    pub fn record_page_view(&self) {
        let record = EventRecord::new(
            self.surface.page_url(),
            "page_view",
            "navigation",
            &self.surface.page_title(),
            None,
        );
        debug!(page_url = %record.page_url, "page view captured");
        self.sink.submit(record);
    }

    fn handle_submit(&self, signal: SubmitSignal) {
        let element_id = signal
            .form_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| "form_submission".to_string());
        let record = EventRecord::new(
            self.surface.page_url(),
            element_id,
            "form_submit",
            "Form submitted",
            None,
        );
        debug!(element_id = %record.element_id, "form submission captured");
        self.sink.submit(record);
    }

    fn handle_scroll(&self, signal: ScrollSignal) {
        let surface = self.surface.clone();
        let sink = self.sink.clone();
        let offset = signal.offset_y;
        // Location is read at emission time; the offset is the last one
        // observed before quiescence.
        self.debounce.poke(move || {
            let text = format!("Scrolled to {}px", offset.round() as i64);
            let record = EventRecord::new(
                surface.page_url(),
                "scroll_event",
                "user_interaction",
                &text,
                None,
            );
            debug!(offset_y = offset, "scroll captured");
            sink.submit(record);
        });
    }

    /// Emit an ad-hoc named event. The overlay is merged last, so
    /// caller-supplied keys win over the base shape.
    pub fn track_custom_event(&self, name: &str, overlay: Map<String, Value>) {
        let mut record = EventRecord::new(
            self.surface.page_url(),
            "custom_event",
            name,
            &format!("Custom event: {name}"),
            None,
        );
        record.apply_overlay(overlay);
        debug!(category = %name, "custom event captured");
        self.sink.submit(record);
    }

    /// Tear capture down: release the surface subscription, stop the observer
    /// pump, and abandon any pending scroll emission. Idempotent; an engine
    /// is not reattachable.
    pub fn detach(&self) {
        if let Some(attachment) = self.attachment.lock().take() {
            attachment.pump.abort();
            info!(session_id = %self.session_id, "capture engine detached");
        }
        self.debounce.cancel();
    }
}
