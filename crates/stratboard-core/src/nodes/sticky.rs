//! Sticky note payload.

use super::SerializableColor;
use serde::{Deserialize, Serialize};

/// Colour given to new sticky notes.
pub const DEFAULT_STICKY_COLOR: &str = "#fef08a";

/// The colours offered by the sticky note palette.
pub const STICKY_PALETTE: [(&str, &str); 7] = [
    ("Yellow", "#fef08a"),
    ("Green", "#bbf7d0"),
    ("Blue", "#bfdbfe"),
    ("Pink", "#fbcfe8"),
    ("Orange", "#fed7aa"),
    ("White", "#ffffff"),
    ("Dark", "#1f2937"),
];

/// A free-form note. `text` holds the note body as HTML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickyNoteData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_STICKY_COLOR.to_string()
}

impl Default for StickyNoteData {
    fn default() -> Self {
        Self {
            label: None,
            text: String::new(),
            color: default_color(),
        }
    }
}

impl StickyNoteData {
    /// Resolve a palette name (case-insensitive) or hex string to a hex
    /// colour.
    pub fn resolve_color(input: &str) -> Option<String> {
        let input = input.trim();
        if let Some((_, hex)) = STICKY_PALETTE
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(input))
        {
            return Some(hex.to_string());
        }
        SerializableColor::from_hex(input).map(|c| c.to_hex())
    }

    /// Dark notes are rendered with light text.
    pub fn is_dark(&self) -> bool {
        SerializableColor::from_hex(&self.color)
            .map(|c| c.luminance() < 0.5)
            .unwrap_or(false)
    }

    /// Note body with markup removed. Block-level tags become line breaks.
    pub fn plain_text(&self) -> String {
        strip_html(&self.text)
    }
}

fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut chars = html.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '<' => {
                let mut tag = String::new();
                for t in chars.by_ref() {
                    if t == '>' {
                        break;
                    }
                    tag.push(t);
                }
                let name = tag
                    .trim_start_matches('/')
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                let closing = tag.starts_with('/');
                match name.as_str() {
                    "br" => out.push('\n'),
                    "div" | "p" | "li" if closing => out.push('\n'),
                    "li" => out.push_str("- "),
                    _ => {}
                }
            }
            '&' => {
                let mut entity = String::new();
                while let Some(&n) = chars.peek() {
                    if !(n.is_ascii_alphanumeric() || n == '#') || entity.len() > 6 {
                        break;
                    }
                    entity.push(n);
                    chars.next();
                }
                let decoded = match entity.as_str() {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "#39" | "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                };
                match decoded {
                    Some(ch) if chars.peek() == Some(&';') => {
                        chars.next();
                        out.push(ch);
                    }
                    _ => {
                        out.push('&');
                        out.push_str(&entity);
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let note = StickyNoteData::default();
        assert_eq!(note.color, "#fef08a");
        assert!(note.text.is_empty());
        assert!(!note.is_dark());
    }

    #[test]
    fn test_dark_note() {
        let note = StickyNoteData {
            color: "#1f2937".into(),
            ..Default::default()
        };
        assert!(note.is_dark());
    }

    #[test]
    fn test_resolve_color() {
        assert_eq!(StickyNoteData::resolve_color("pink").as_deref(), Some("#fbcfe8"));
        assert_eq!(StickyNoteData::resolve_color("#ABCDEF").as_deref(), Some("#abcdef"));
        assert_eq!(StickyNoteData::resolve_color("mauve"), None);
    }

    #[test]
    fn test_plain_text() {
        let note = StickyNoteData {
            text: "<div>Price &amp; cost</div><ul><li>one</li><li>two</li></ul>a<br>b".into(),
            ..Default::default()
        };
        assert_eq!(note.plain_text(), "Price & cost\n- one\n- two\na\nb");
    }

    #[test]
    fn test_plain_text_keeps_stray_ampersand() {
        let note = StickyNoteData {
            text: "R&D budget".into(),
            ..Default::default()
        };
        assert_eq!(note.plain_text(), "R&D budget");
    }
}
