use serde::Deserialize;
use url::Url;

use crate::error::CollectorResult;

/// Collector configuration. Loaded from environment variables with the
/// prefix `CLICKPULSE__`; every field has a default so the collector is
/// usable with no configuration at all.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// Base URL of the collection service.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Path the serialized records are POSTed to, relative to `endpoint`.
    #[serde(default = "default_track_path")]
    pub track_path: String,
    /// Quiescence window for the scroll debounce.
    #[serde(default = "default_scroll_debounce_ms")]
    pub scroll_debounce_ms: u64,
}

impl CollectorConfig {
    pub fn load() -> CollectorResult<Self> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CLICKPULSE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Absolute URL the dispatcher delivers to.
    pub fn collect_url(&self) -> CollectorResult<Url> {
        let base = Url::parse(&self.endpoint)?;
        Ok(base.join(&self.track_path)?)
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            track_path: default_track_path(),
            scroll_debounce_ms: default_scroll_debounce_ms(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:8080".to_string()
}
fn default_track_path() -> String {
    "/track_click".to_string()
}
fn default_scroll_debounce_ms() -> u64 {
    1000
}
