/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Pandoc-style document template engine for Folio.
//!
//! This crate provides a template engine modelled on Pandoc's
//! [doctemplates](https://github.com/jgm/doctemplates) library. It supports:
//!
//! - Variable interpolation: `$variable$` or `${variable}`
//! - Nested field access: `$employee.salary$`
//! - Conditionals: `$if(var)$...$elseif(other)$...$else$...$endif$`
//! - For loops: `$for(items)$...$sep$...$endfor$`
//! - Partials: `$partial()$` or `$var:partial()$`
//! - Comments: `$-- comment`
//!
//! Unlike Pandoc, a template can escape interpolated strings for HTML (see
//! [`Escape`]). Values that are already markup are passed in as
//! [`TemplateValue::Markup`] and are never escaped, so each piece of text is
//! escaped exactly once.
//!
//! # Example
//!
//! ```
//! use folio_doctemplate::{Escape, Template, TemplateContext};
//!
//! let template = Template::compile("<b>$name$</b>")?.with_escape(Escape::Html);
//!
//! let mut ctx = TemplateContext::new();
//! ctx.insert("name", "Tom & Jerry");
//!
//! assert_eq!(template.render(&ctx)?, "<b>Tom &amp; Jerry</b>");
//! # Ok::<(), folio_doctemplate::TemplateError>(())
//! ```

pub mod ast;
pub mod context;
pub mod error;
pub mod escape;
pub mod evaluator;
pub mod parser;
pub mod registry;
pub mod resolver;

// Re-export main types at crate root
pub use ast::{
    Comment, Conditional, ForLoop, Literal, Partial, Position, TemplateNode, VariableRef,
};
pub use context::{TemplateContext, TemplateValue};
pub use error::{TemplateError, TemplateResult};
pub use escape::{Escape, escape_html};
pub use parser::Template;
pub use registry::TemplateRegistry;
pub use resolver::{NullResolver, PartialResolver};
