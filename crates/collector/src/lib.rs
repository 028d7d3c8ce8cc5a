//! Client-side behavioral telemetry collection — session-scoped capture of
//! interaction events (clicks, page views, form submissions, scrolls, custom
//! events), normalization into flat records, and best-effort delivery to a
//! remote collection endpoint.
//!
//! # Modules
//!
//! - [`events`] — Normalized event records and raw surface signals
//! - [`capture`] — The capture engine and custom event bridge
//! - [`surface`] — Interaction-surface abstraction and replay implementation
//! - [`extract`] — Role-based text extraction for click targets
//! - [`throttle`] — Scroll debounce
//! - [`dispatch`] — Fire-and-forget delivery sinks
//! - [`session`] — Session identity
//! - [`config`] / [`error`] — Configuration and error taxonomy

pub mod capture;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod extract;
pub mod session;
pub mod surface;
pub mod throttle;

pub use capture::CaptureEngine;
pub use config::CollectorConfig;
pub use dispatch::{capture_sink, noop_sink, CaptureSink, DeliverySink, HttpDispatcher, NoOpSink};
pub use error::{CollectorError, CollectorResult, DispatchError};
pub use events::{
    ClickSignal, ElementRef, EventRecord, ScrollSignal, SubmitSignal, SurfaceEvent, TargetInfo,
    TargetRole, TrackedElement,
};
pub use surface::{InteractionSurface, ReplaySurface, Subscription};
pub use throttle::ScrollDebounce;
