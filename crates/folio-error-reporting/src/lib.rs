//! Diagnostic reporting for Folio documents.
//!
//! Build failures are described by a closed set of [`Diagnostic`]s, each
//! pointing at an [`ErrorLocation`] in a source file. A diagnostic renders in
//! two forms:
//!
//! - **Plain**: a compiler-style narrative for terminals, with the offending
//!   source line and a red caret run under the span
//!   ([`Diagnostic::render_plain`]).
//! - **Rich**: HTML produced by a named template per kind
//!   ([`Diagnostic::render_rich`]), and whole error pages for the preview
//!   server ([`serve_error_page`]).
//!
//! Source lines are re-read from disk for every render; nothing is cached.
//!
//! # Example
//!
//! ```no_run
//! use folio_error_reporting::{Diagnostic, ErrorLocation, SourceLocation};
//!
//! let diagnostic = Diagnostic::unknown_tag(
//!     "intro",
//!     ErrorLocation::new("index.lit", SourceLocation::new(3, 6), 9),
//! );
//!
//! diagnostic.render_plain(&mut std::io::stderr())?;
//! # Ok::<(), folio_error_reporting::RenderError>(())
//! ```

pub mod diagnostic;
pub mod error;
pub mod html;
pub mod location;
pub mod page;
pub mod plain;

pub use diagnostic::{BoxError, Diagnostic, DiagnosticKind};
pub use error::{DiagnosticError, RenderError, RenderResult};
pub use html::{ErrorTemplates, PageError};
pub use location::{
    AnnotatedLine, Annotation, ErrorLocation, SourceLocation, compute_annotation, read_line,
};
pub use page::{ErrorPage, serve_error_page};
pub use plain::{IndentWriter, annotate_location};
