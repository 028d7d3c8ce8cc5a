//! Text extraction — derives a bounded human-readable label from a click
//! target, dispatching on the target's role classification.

use crate::events::{TargetInfo, TargetRole};

/// Upper bound on `element_text`, applied to every construction path.
pub const MAX_LABEL_LEN: usize = 200;

/// Derive the label for a click target.
///
/// Each role has a fixed priority chain; the first present, non-empty
/// candidate wins and is truncated to [`MAX_LABEL_LEN`] characters. Missing
/// attributes degrade to the next candidate; no candidate yields the empty
/// string. Infallible.
pub fn label_for(target: &TargetInfo) -> String {
    let candidates: [&Option<String>; 3] = match target.role {
        TargetRole::Input => [&target.placeholder, &target.value, &target.name],
        TargetRole::Button => [&target.text_content, &target.inner_text, &target.value],
        TargetRole::Link => [&target.text_content, &target.inner_text, &target.href],
        TargetRole::Generic => [&target.text_content, &target.inner_text, &target.title],
    };

    let text = candidates
        .into_iter()
        .find_map(|c| c.as_deref().filter(|s| !s.is_empty()))
        .unwrap_or("");
    truncate_label(text)
}

/// Truncate to the first [`MAX_LABEL_LEN`] characters, on a character
/// boundary. A no-op for strings already within the bound.
pub fn truncate_label(text: &str) -> String {
    match text.char_indices().nth(MAX_LABEL_LEN) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
