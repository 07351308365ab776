/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Values bound to template variables, and the scopes that hold them.
//!
//! A [`TemplateContext`] maps names to [`TemplateValue`]s. Loops and applied
//! partials evaluate their bodies in a child scope that binds the current
//! item while still seeing every outer binding.

use std::collections::HashMap;

use crate::escape::Escape;

/// The value of a template variable.
///
/// [`TemplateValue::Markup`] holds output that is already rendered; it is
/// inserted verbatim even by escaping templates.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TemplateValue {
    /// Text, escaped on output by escaping templates.
    String(String),

    /// Pre-rendered markup. Never escaped.
    Markup(String),

    Bool(bool),

    /// Iterated by `$for$`.
    List(Vec<TemplateValue>),

    /// Fields reached with dotted paths.
    Map(HashMap<String, TemplateValue>),

    /// Unset.
    #[default]
    Null,
}

impl TemplateValue {
    /// Whether `$if(..)$` takes its first branch for this value.
    ///
    /// Text is true unless empty (so `"false"` is true), a list is true when
    /// any item is, and a map is true when it has any field.
    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::Bool(b) => *b,
            TemplateValue::String(s) | TemplateValue::Markup(s) => !s.is_empty(),
            TemplateValue::List(items) => items.iter().any(|v| v.is_truthy()),
            TemplateValue::Map(m) => !m.is_empty(),
            TemplateValue::Null => false,
        }
    }

    /// Follow `path` through nested maps. An empty path is this value.
    pub fn get_path(&self, path: &[&str]) -> Option<&TemplateValue> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };

        match self {
            TemplateValue::Map(m) => m.get(*first).and_then(|v| v.get_path(rest)),
            _ => None,
        }
    }

    /// The output text for this value.
    ///
    /// Lists concatenate their items; `true` and maps print `true`; `false`
    /// and null print nothing.
    pub fn render(&self, escape: Escape) -> String {
        match self {
            TemplateValue::String(s) => escape.apply(s).into_owned(),
            TemplateValue::Markup(s) => s.clone(),
            TemplateValue::Bool(true) => "true".to_string(),
            TemplateValue::Bool(false) => String::new(),
            TemplateValue::List(items) => items.iter().map(|v| v.render(escape)).collect(),
            TemplateValue::Map(_) => "true".to_string(),
            TemplateValue::Null => String::new(),
        }
    }

    /// Build a map value from key/value pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, TemplateValue)>,
    {
        TemplateValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<String> for TemplateValue {
    fn from(s: String) -> Self {
        TemplateValue::String(s)
    }
}

impl From<&str> for TemplateValue {
    fn from(s: &str) -> Self {
        TemplateValue::String(s.to_string())
    }
}

impl From<bool> for TemplateValue {
    fn from(b: bool) -> Self {
        TemplateValue::Bool(b)
    }
}

impl<T: Into<TemplateValue>> From<Vec<T>> for TemplateValue {
    fn from(items: Vec<T>) -> Self {
        TemplateValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// A scope of variable bindings.
///
/// Nested scopes borrow their enclosing scope, so entering a loop body
/// copies nothing but the new bindings.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext<'p> {
    variables: HashMap<String, TemplateValue>,
    /// Enclosing scope, consulted for names not bound here
    parent: Option<&'p TemplateContext<'p>>,
}

impl<'p> TemplateContext<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` in this scope, shadowing any outer binding.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<TemplateValue>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Look up `key` here, then in enclosing scopes.
    pub fn get(&self, key: &str) -> Option<&TemplateValue> {
        self.variables
            .get(key)
            .or_else(|| self.parent.and_then(|parent| parent.get(key)))
    }

    /// Look up a dotted path such as `location.file_path`.
    pub fn get_path(&self, path: &[&str]) -> Option<&TemplateValue> {
        let (first, rest) = path.split_first()?;
        self.get(first).and_then(|v| v.get_path(rest))
    }

    /// An empty scope nested inside this one.
    pub fn child(&self) -> TemplateContext<'_> {
        TemplateContext {
            variables: HashMap::new(),
            parent: Some(self),
        }
    }

    /// Number of scopes from this one out to the outermost.
    pub fn depth(&self) -> usize {
        1 + self.parent.map_or(0, |parent| parent.depth())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(TemplateValue::Bool(true).is_truthy());
        assert!(!TemplateValue::Bool(false).is_truthy());
        assert!(!TemplateValue::Null.is_truthy());

        // Any non-empty text counts, whatever it says
        assert!(TemplateValue::from("false").is_truthy());
        assert!(!TemplateValue::from("").is_truthy());
        assert!(TemplateValue::Markup("<hr>".to_string()).is_truthy());
        assert!(!TemplateValue::Markup(String::new()).is_truthy());

        assert!(TemplateValue::from(vec![false, true]).is_truthy());
        assert!(!TemplateValue::from(vec![false]).is_truthy());
        assert!(!TemplateValue::List(Vec::new()).is_truthy());

        assert!(TemplateValue::map([("eof", TemplateValue::Null)]).is_truthy());
        assert!(!TemplateValue::Map(HashMap::new()).is_truthy());
    }

    #[test]
    fn test_get_path_through_maps() {
        let value = TemplateValue::map([(
            "location",
            TemplateValue::map([("file_path", TemplateValue::from("index.lit"))]),
        )]);

        assert_eq!(
            value.get_path(&["location", "file_path"]),
            Some(&TemplateValue::from("index.lit"))
        );
        assert_eq!(value.get_path(&["location", "line"]), None);
        assert_eq!(value.get_path(&["location", "file_path", "x"]), None);
        assert_eq!(value.get_path(&[]), Some(&value));
    }

    #[test]
    fn test_render_escapes_strings_but_not_markup() {
        let text = TemplateValue::from("<a & b>");
        let markup = TemplateValue::Markup("<em>ok</em>".to_string());

        assert_eq!(text.render(Escape::Html), "&lt;a &amp; b&gt;");
        assert_eq!(text.render(Escape::None), "<a & b>");
        assert_eq!(markup.render(Escape::Html), "<em>ok</em>");
        assert_eq!(TemplateValue::from(vec!["a", "b"]).render(Escape::None), "ab");
        assert_eq!(TemplateValue::Bool(false).render(Escape::None), "");
    }

    #[test]
    fn test_child_scope_shadows_and_inherits() {
        let mut outer = TemplateContext::new();
        outer.insert("tag_name", "intro");
        outer.insert("it", "outer item");

        let mut inner = outer.child();
        inner.insert("it", "inner item");

        assert_eq!(inner.get("it"), Some(&TemplateValue::from("inner item")));
        assert_eq!(inner.get("tag_name"), Some(&TemplateValue::from("intro")));
        assert_eq!(outer.get("it"), Some(&TemplateValue::from("outer item")));
        assert_eq!(inner.get("missing"), None);
    }

    #[test]
    fn test_nested_scopes_borrow_their_parent() {
        let mut outer = TemplateContext::new();
        outer.insert(
            "defined_locations",
            TemplateValue::from(vec!["a.lit:1", "b.lit:2", "c.lit:3"]),
        );

        let loop_scope = outer.child();
        let mut item_scope = loop_scope.child();
        item_scope.insert("it", "b.lit:2");

        assert_eq!(outer.depth(), 1);
        assert_eq!(item_scope.depth(), 3);
        // Lookups through the chain see the outer value itself, not a copy
        let seen = item_scope.get("defined_locations").unwrap();
        assert!(std::ptr::eq(seen, outer.get("defined_locations").unwrap()));
        assert_eq!(item_scope.get("it"), Some(&TemplateValue::from("b.lit:2")));
    }
}
