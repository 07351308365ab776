//! Errors raised while rendering a report.
//!
//! These are failures of the reporting machinery itself (a source file that
//! cannot be read, a template that fails, a sink that rejects writes), as
//! opposed to the [`Diagnostic`](crate::Diagnostic)s being reported.

use std::io;
use std::path::{Path, PathBuf};

use folio_doctemplate::TemplateError;
use thiserror::Error;

/// Failure while rendering a diagnostic or an error page.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The source file behind a location could not be opened or read.
    #[error("failed to read {}: {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An error template failed to execute.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// The output sink rejected a write.
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

impl RenderError {
    pub(crate) fn source_read(path: &Path, source: io::Error) -> Self {
        RenderError::SourceRead {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result alias for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// A diagnostic that cannot be constructed as requested.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiagnosticError {
    /// An ambiguous reference needs at least one competing definition.
    #[error("ambiguous reference to tag '{tag_name}' has no defined locations")]
    NoDefinedLocations { tag_name: String },
}
