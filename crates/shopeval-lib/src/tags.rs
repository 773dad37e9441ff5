//! Codec for structured tag blocks embedded in free-form agent text.
//!
//! Machine-readable payloads (URLs, JSON configuration, actions) travel
//! inside conversational messages as `<name>content</name>` blocks. The
//! codec extracts every top-level block; everything outside tags is
//! discarded, and a missing tag is the caller's policy question, never a
//! codec error.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn open_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<(\w+)>").expect("valid tag regex"))
}

/// Parses all `<name>...</name>` blocks from `text`.
///
/// A block ends at the nearest close tag of the *same* name, so tag-like
/// text of other names stays verbatim inside the content. Inner content is
/// trimmed of surrounding whitespace. Duplicate tag names resolve to the
/// last occurrence.
pub fn parse_tags(text: &str) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    let mut pos = 0;
    while let Some(open) = open_pattern().find_at(text, pos) {
        let name = &text[open.start() + 1..open.end() - 1];
        let close = format!("</{name}>");
        match text[open.end()..].find(&close) {
            Some(offset) => {
                let content = &text[open.end()..open.end() + offset];
                tags.insert(name.to_string(), content.trim().to_string());
                pos = open.end() + offset + close.len();
            }
            // Unclosed open tag; a later open may still start inside it.
            None => pos = open.start() + 1,
        }
    }
    tags
}

/// Wraps `content` in a `<name>...</name>` block.
///
/// No escaping is performed; callers must not embed a literal `</name>`
/// sequence colliding with the chosen tag name.
pub fn wrap_tag(name: &str, content: &str) -> String {
    format!("<{name}>\n{content}\n</{name}>")
}
