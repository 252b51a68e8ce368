//! Free-text sanitization.
//!
//! The baseline rule set is deliberately small: trim surrounding whitespace
//! and remove `<script>` blocks. It is not a general HTML sanitizer; swap in
//! a different [`SanitizePolicy`] when rendering into a richer surface.

use once_cell::sync::Lazy;
use regex::Regex;

/// Complete `<script ...>...</script>` blocks, case-insensitive, shortest match.
static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());

/// Orphaned opening or closing script tags left after block removal.
static SCRIPT_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?script\b[^>]*>?").unwrap());

pub trait SanitizePolicy: Send + Sync {
    fn name(&self) -> &'static str;
    fn clean(&self, input: &str) -> String;
}

/// Trim + strip script blocks.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptTagPolicy;

impl SanitizePolicy for ScriptTagPolicy {
    fn name(&self) -> &'static str {
        "script-tag"
    }

    fn clean(&self, input: &str) -> String {
        // Removing one tag can splice a new one together out of its
        // neighbours, so repeat until nothing changes. Each pass only shrinks.
        let mut current = input.to_string();
        loop {
            let without_blocks = SCRIPT_BLOCK.replace_all(&current, "");
            let without_tags = SCRIPT_TAG.replace_all(&without_blocks, "");
            if without_tags == current {
                break;
            }
            current = without_tags.into_owned();
        }
        current.trim().to_string()
    }
}
