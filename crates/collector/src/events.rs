//! Event types — normalized records sent to the collection endpoint and the
//! raw interaction signals observed on the document surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::extract::truncate_label;

/// A normalized interaction record, the sole entity sent over the wire.
///
/// Serializes to a flat JSON object: the base fields below plus any extra
/// fields overlaid by custom events. `click_x`/`click_y` are `null` (not
/// omitted) for non-pointer events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub page_url: String,
    pub element_id: String,
    pub element_class: String,
    pub element_text: String,
    pub click_x: Option<i64>,
    pub click_y: Option<i64>,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventRecord {
    /// Build a record stamped with the current time. `element_text` is
    /// truncated to the 200-character bound here, so every construction path
    /// honors it.
    pub fn new(
        page_url: impl Into<String>,
        element_id: impl Into<String>,
        element_class: impl Into<String>,
        element_text: &str,
        coords: Option<(i64, i64)>,
    ) -> Self {
        Self {
            page_url: page_url.into(),
            element_id: element_id.into(),
            element_class: element_class.into(),
            element_text: truncate_label(element_text),
            click_x: coords.map(|(x, _)| x),
            click_y: coords.map(|(_, y)| y),
            timestamp: Utc::now(),
            extra: Map::new(),
        }
    }

    /// Overlay caller-supplied fields onto the record. Keys matching the base
    /// shape replace the typed field when the value has a compatible JSON
    /// type; incompatible values are dropped with a warning rather than
    /// producing a duplicate key in the serialized object. Unknown keys pass
    /// through into `extra` untouched.
    pub fn apply_overlay(&mut self, overlay: Map<String, Value>) {
        for (key, value) in overlay {
            match key.as_str() {
                "page_url" | "element_id" | "element_class" | "element_text" => {
                    match value {
                        Value::String(text) => {
                            let text = if key == "element_text" {
                                truncate_label(&text)
                            } else {
                                text
                            };
                            match key.as_str() {
                                "page_url" => self.page_url = text,
                                "element_id" => self.element_id = text,
                                "element_class" => self.element_class = text,
                                _ => self.element_text = text,
                            }
                        }
                        other => warn!(key = %key, value = %other, "dropping non-string overlay for text field"),
                    }
                }
                "click_x" | "click_y" => match value {
                    Value::Null => {
                        if key == "click_x" {
                            self.click_x = None;
                        } else {
                            self.click_y = None;
                        }
                    }
                    Value::Number(n) if n.as_i64().is_some() => {
                        if key == "click_x" {
                            self.click_x = n.as_i64();
                        } else {
                            self.click_y = n.as_i64();
                        }
                    }
                    other => warn!(key = %key, value = %other, "dropping non-integer overlay for coordinate"),
                },
                "timestamp" => match value.as_str().and_then(|s| s.parse::<DateTime<Utc>>().ok()) {
                    Some(ts) => self.timestamp = ts,
                    None => warn!(value = %value, "dropping unparseable timestamp overlay"),
                },
                _ => {
                    self.extra.insert(key, value);
                }
            }
        }
    }
}

/// Opaque handle for an element on the document surface, assigned by the
/// surface implementation. Only used as a lookup key; carries no DOM
/// semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(pub u64);

/// Role classification of an interaction target, driving the text-extraction
/// priority chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRole {
    Input,
    Button,
    Link,
    #[default]
    Generic,
}

/// Attributes of a click target as observed on the surface. Absent attributes
/// degrade through the extraction priority chain; none are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetInfo {
    #[serde(default)]
    pub role: TargetRole,
    #[serde(default)]
    pub element_id: String,
    #[serde(default)]
    pub element_class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A pointer click bubbling to the document root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickSignal {
    /// Surface handle for the clicked element, when the surface can identify
    /// it. Needed for markup auto-wiring lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementRef>,
    pub target: TargetInfo,
    pub x: i64,
    pub y: i64,
}

/// A form submission bubbling to the document root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitSignal {
    /// Id of the submitting element; `None` or empty falls back to the fixed
    /// `"form_submission"` label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
}

/// A vertical scroll occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollSignal {
    pub offset_y: f64,
}

/// An interaction occurrence observed on the document surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurfaceEvent {
    Click(ClickSignal),
    Submit(SubmitSignal),
    /// History navigation (back/forward); the surface's location has already
    /// changed when this fires.
    HistoryNav,
    Scroll(ScrollSignal),
}

/// An element declared trackable in markup, discovered by the static scan at
/// engine installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedElement {
    pub element: ElementRef,
    /// Literal value of the markup tracking attribute.
    pub label: String,
    #[serde(default)]
    pub element_id: String,
    #[serde(default)]
    pub element_class: String,
}
