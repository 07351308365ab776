//! The closed set of diagnostics raised while building a document.
//!
//! Every diagnostic carries the [`ErrorLocation`] it is reported at and a
//! one-line summary (its `Display`). The narrative forms live next to their
//! renderers: [`Diagnostic::render_plain`] for terminals and
//! [`Diagnostic::render_rich`] for HTML.

use std::error::Error;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::error::{DiagnosticError, RenderResult};
use crate::location::ErrorLocation;

/// Boxed error carried by diagnostics that wrap another failure.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// A user-facing diagnostic.
#[derive(Debug, Error)]
pub enum Diagnostic {
    /// The document could not be parsed.
    #[error("{source_error}")]
    ParseFailure {
        #[source]
        source_error: BoxError,
        location: ErrorLocation,
    },

    /// A reference names a tag that is not defined anywhere.
    #[error("unknown tag '{tag_name}'")]
    UnknownTag {
        tag_name: String,
        location: ErrorLocation,
    },

    /// A reference names a tag defined in more than one place.
    #[error("ambiguous target for tag '{tag_name}'")]
    AmbiguousReference {
        tag_name: String,
        /// Every competing definition, in the order they were found
        defined_locations: Vec<ErrorLocation>,
        location: ErrorLocation,
    },

    /// A function call names a function that does not exist.
    #[error("undefined function \\{function_name}")]
    UndefinedFunction {
        function_name: String,
        location: ErrorLocation,
    },

    /// A function ran and reported a failure.
    #[error("function \\{function_name} returned an error: {source_error}")]
    FailedFunction {
        function_name: String,
        #[source]
        source_error: BoxError,
        location: ErrorLocation,
    },
}

/// The kind of a [`Diagnostic`], without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    ParseError,
    UnknownTag,
    AmbiguousReference,
    UndefinedFunction,
    FunctionError,
}

impl DiagnosticKind {
    /// All kinds, in declaration order.
    pub const ALL: [DiagnosticKind; 5] = [
        DiagnosticKind::ParseError,
        DiagnosticKind::UnknownTag,
        DiagnosticKind::AmbiguousReference,
        DiagnosticKind::UndefinedFunction,
        DiagnosticKind::FunctionError,
    ];

    /// Name of the HTML template that renders this kind.
    pub fn template_name(&self) -> &'static str {
        match self {
            DiagnosticKind::ParseError => "parse-error",
            DiagnosticKind::UnknownTag => "unknown-tag",
            DiagnosticKind::AmbiguousReference => "ambiguous-reference",
            DiagnosticKind::UndefinedFunction => "undefined-function",
            DiagnosticKind::FunctionError => "function-error",
        }
    }
}

impl Diagnostic {
    /// The document failed to parse at `location`.
    pub fn parse_failure(source_error: impl Into<BoxError>, location: ErrorLocation) -> Self {
        Diagnostic::ParseFailure {
            source_error: source_error.into(),
            location,
        }
    }

    /// A reference at `location` points to a tag that does not exist.
    pub fn unknown_tag(tag_name: impl Into<String>, location: ErrorLocation) -> Self {
        Diagnostic::UnknownTag {
            tag_name: tag_name.into(),
            location,
        }
    }

    /// A reference at `location` matches more than one definition.
    ///
    /// Fails if `defined_locations` is empty.
    pub fn ambiguous_reference(
        tag_name: impl Into<String>,
        defined_locations: Vec<ErrorLocation>,
        location: ErrorLocation,
    ) -> Result<Self, DiagnosticError> {
        let tag_name = tag_name.into();
        if defined_locations.is_empty() {
            return Err(DiagnosticError::NoDefinedLocations { tag_name });
        }
        Ok(Diagnostic::AmbiguousReference {
            tag_name,
            defined_locations,
            location,
        })
    }

    /// A call at `location` names a function that is not defined.
    pub fn undefined_function(function_name: impl Into<String>, location: ErrorLocation) -> Self {
        Diagnostic::UndefinedFunction {
            function_name: function_name.into(),
            location,
        }
    }

    /// The function called at `location` returned `source_error`.
    pub fn failed_function(
        function_name: impl Into<String>,
        source_error: impl Into<BoxError>,
        location: ErrorLocation,
    ) -> Self {
        Diagnostic::FailedFunction {
            function_name: function_name.into(),
            source_error: source_error.into(),
            location,
        }
    }

    /// Where this diagnostic is reported.
    pub fn location(&self) -> &ErrorLocation {
        match self {
            Diagnostic::ParseFailure { location, .. }
            | Diagnostic::UnknownTag { location, .. }
            | Diagnostic::AmbiguousReference { location, .. }
            | Diagnostic::UndefinedFunction { location, .. }
            | Diagnostic::FailedFunction { location, .. } => location,
        }
    }

    /// Which kind of diagnostic this is.
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::ParseFailure { .. } => DiagnosticKind::ParseError,
            Diagnostic::UnknownTag { .. } => DiagnosticKind::UnknownTag,
            Diagnostic::AmbiguousReference { .. } => DiagnosticKind::AmbiguousReference,
            Diagnostic::UndefinedFunction { .. } => DiagnosticKind::UndefinedFunction,
            Diagnostic::FailedFunction { .. } => DiagnosticKind::FunctionError,
        }
    }

    /// The one-line summary, without location.
    pub fn summary(&self) -> String {
        self.to_string()
    }

    /// The plain narrative as a string.
    ///
    /// Same output as [`render_plain`](Self::render_plain) into a buffer.
    pub fn to_text(&self) -> RenderResult<String> {
        let mut out = Vec::new();
        self.render_plain(&mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Machine-readable form of this diagnostic.
    ///
    /// Contains the kind, summary, location and the kind-specific fields.
    /// Source lines are not included.
    pub fn to_json(&self) -> Value {
        let mut obj = json!({
            "kind": self.kind(),
            "message": self.summary(),
            "location": location_json(self.location()),
        });

        match self {
            Diagnostic::ParseFailure { source_error, .. } => {
                obj["error"] = json!(source_error.to_string());
            }
            Diagnostic::UnknownTag { tag_name, .. } => {
                obj["tag_name"] = json!(tag_name);
            }
            Diagnostic::AmbiguousReference {
                tag_name,
                defined_locations,
                ..
            } => {
                obj["tag_name"] = json!(tag_name);
                obj["defined_locations"] =
                    Value::Array(defined_locations.iter().map(location_json).collect());
            }
            Diagnostic::UndefinedFunction { function_name, .. } => {
                obj["function_name"] = json!(function_name);
            }
            Diagnostic::FailedFunction {
                function_name,
                source_error,
                ..
            } => {
                obj["function_name"] = json!(function_name);
                obj["error"] = json!(source_error.to_string());
            }
        }

        obj
    }
}

fn location_json(location: &ErrorLocation) -> Value {
    let mut obj = json!({
        "file_path": location.file_path.display().to_string(),
    });
    if location.location.is_known() {
        obj["line"] = json!(location.location.line);
        obj["column"] = json!(location.location.column);
        obj["length"] = json!(location.length);
    }
    obj
}
