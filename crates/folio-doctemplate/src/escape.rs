/*
 * escape.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Output escaping for interpolated values.
//!
//! Escaping is applied exactly once, when a `String` value is interpolated
//! into a template. Literal template text and [`TemplateValue::Markup`]
//! values pass through untouched.
//!
//! [`TemplateValue::Markup`]: crate::TemplateValue::Markup

use std::borrow::Cow;
use std::path::Path;

/// How interpolated string values are escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Escape {
    /// Emit values verbatim (Pandoc's behavior for plain-text formats).
    #[default]
    None,
    /// Escape HTML special characters.
    Html,
}

impl Escape {
    /// Pick the escaping mode for a template file from its extension.
    ///
    /// `.html`, `.htm` and `.xml` templates escape; everything else does not.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("html" | "htm" | "xml") => Escape::Html,
            _ => Escape::None,
        }
    }

    /// Escape `text` according to this mode.
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            Escape::None => Cow::Borrowed(text),
            Escape::Html => escape_html(text),
        }
    }
}

/// Escape `&`, `<`, `>`, `"` and `'` for inclusion in HTML text or attributes.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}
