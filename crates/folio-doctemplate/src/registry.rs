/*
 * registry.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Named template registry.
//!
//! A registry holds a set of compiled templates keyed by name. Templates
//! loaded from files or bundled assets are named after the file's base name
//! without its extension, so `templates/page.html` registers as `page`.
//! The registry also serves as the [`PartialResolver`] for its own templates.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::context::TemplateContext;
use crate::error::{TemplateError, TemplateResult};
use crate::escape::Escape;
use crate::parser::Template;
use crate::resolver::PartialResolver;

/// A read-only-after-construction set of named templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a bundle of `(path, source)` pairs into a registry.
    ///
    /// Each template is named by its path's file stem and escapes according
    /// to its extension. Trailing newlines are trimmed from every source so
    /// that partials splice in cleanly. After loading, every partial
    /// reference is checked against the registry.
    pub fn from_sources<I, P, S>(sources: I) -> TemplateResult<Self>
    where
        I: IntoIterator<Item = (P, S)>,
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();

        for (path, source) in sources {
            let path = path.as_ref();
            let name = template_name(path)?;
            let source = source.as_ref().trim_end_matches('\n');
            let template = Template::compile_with_filename(source, &path.display().to_string())?
                .with_escape(Escape::for_path(path));
            registry.insert(name, template);
        }

        registry.check_partials()?;
        debug!(templates = registry.len(), "Loaded template registry");
        Ok(registry)
    }

    /// Load every file in `dir` (not recursively) into a registry.
    ///
    /// Files are loaded in path order so that duplicate names resolve the
    /// same way on every platform.
    pub fn from_dir(dir: &Path) -> TemplateResult<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let source = std::fs::read_to_string(&path)?;
            sources.push((path, source));
        }

        Self::from_sources(sources)
    }

    /// Register a template under `name`, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, template: Template) {
        self.templates.insert(name.into(), template);
    }

    /// Look up a template by name.
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Look up a template that must exist.
    pub fn require(&self, name: &str) -> TemplateResult<&Template> {
        self.get(name).ok_or_else(|| TemplateError::MissingTemplate {
            name: name.to_string(),
        })
    }

    /// Names of all registered templates, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the registry has no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Verify that every partial referenced by a registered template exists.
    pub fn check_partials(&self) -> TemplateResult<()> {
        for name in self.names() {
            let Some(template) = self.get(name) else {
                continue;
            };
            if let Some(missing) = template
                .partial_names()
                .into_iter()
                .find(|partial| !self.templates.contains_key(*partial))
            {
                return Err(TemplateError::PartialNotFound {
                    name: missing.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Render the template registered as `name`, resolving partials from
    /// this registry.
    pub fn render(&self, name: &str, context: &TemplateContext) -> TemplateResult<String> {
        self.require(name)?.render_with_resolver(context, self)
    }
}

impl PartialResolver for TemplateRegistry {
    fn get_partial(&self, name: &str) -> Option<&Template> {
        self.get(name)
    }
}

/// Derive a template's registered name from its asset path.
fn template_name(path: &Path) -> TemplateResult<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| TemplateError::InvalidTemplateName {
            path: path.to_path_buf(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_come_from_file_stems() {
        let registry = TemplateRegistry::from_sources([
            ("assets/page.html", "<html>$body$</html>"),
            ("assets/annotated-line.html", "<pre>$line$</pre>"),
        ])
        .unwrap();

        assert_eq!(registry.names(), vec!["annotated-line", "page"]);
        assert_eq!(registry.require("page").unwrap().escape(), Escape::Html);
    }

    #[test]
    fn test_trailing_newlines_are_trimmed() {
        let registry = TemplateRegistry::from_sources([("note.txt", "hi $name$\n\n")]).unwrap();
        let mut ctx = TemplateContext::new();
        ctx.insert("name", "there");
        assert_eq!(registry.render("note", &ctx).unwrap(), "hi there");
    }

    #[test]
    fn test_require_missing_template() {
        let registry = TemplateRegistry::new();
        let err = registry.require("page").unwrap_err();
        assert_eq!(err.to_string(), "Template not found: page");
    }

    #[test]
    fn test_missing_partial_fails_at_load() {
        let err = TemplateRegistry::from_sources([("page.html", "$header()$")]).unwrap_err();
        assert!(matches!(err, TemplateError::PartialNotFound { name } if name == "header"));
    }

    #[test]
    fn test_parse_failure_fails_at_load() {
        let err = TemplateRegistry::from_sources([("broken.html", "$if(x)$")]).unwrap_err();
        assert!(matches!(err, TemplateError::ParseError { .. }));
    }

    #[test]
    fn test_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.html"), "<main>$header()$</main>\n").unwrap();
        std::fs::write(dir.path().join("header.html"), "<h1>$title$</h1>\n").unwrap();

        let registry = TemplateRegistry::from_dir(dir.path()).unwrap();
        let mut ctx = TemplateContext::new();
        ctx.insert("title", "A & B");

        assert_eq!(
            registry.render("page", &ctx).unwrap(),
            "<main><h1>A &amp; B</h1></main>"
        );
    }
}
