/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Partial template resolution.
//!
//! Partials are referenced by name (`$header()$`) and looked up when the
//! including template is evaluated.

use crate::parser::Template;

/// Source of compiled partials for an evaluating template.
pub trait PartialResolver {
    /// The partial registered as `name` (e.g. `annotated-line`), if any.
    fn get_partial(&self, name: &str) -> Option<&Template>;
}

/// Resolves no partials; used by [`Template::render`].
#[derive(Debug, Clone, Default)]
pub struct NullResolver;

impl PartialResolver for NullResolver {
    fn get_partial(&self, _name: &str) -> Option<&Template> {
        None
    }
}

/// Strip one trailing newline from a rendered partial.
pub fn remove_final_newline(content: &str) -> &str {
    content.strip_suffix('\n').unwrap_or(content)
}
