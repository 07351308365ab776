/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template parsing and evaluation.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to load, compile or render a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Malformed template source. Line and column are 1-indexed.
    #[error("Parse error in {template} at {line}:{column}: {message}")]
    ParseError {
        template: String,
        message: String,
        line: usize,
        column: usize,
    },

    /// A partial referenced by a template is not available.
    #[error("Partial not found: {name}")]
    PartialNotFound { name: String },

    /// Partials nested deeper than the evaluator allows, usually a cycle.
    #[error("Recursive partial inclusion detected (depth > {max_depth}): {name}")]
    RecursivePartial { name: String, max_depth: usize },

    /// A template required by name is not registered.
    #[error("Template not found: {name}")]
    MissingTemplate { name: String },

    /// A template asset path has no usable base name.
    #[error("Cannot derive a template name from {}", .path.display())]
    InvalidTemplateName { path: PathBuf },

    /// Reading a template file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
