//! Hypertext rendering through named error templates.
//!
//! Each [`DiagnosticKind`] is rendered by the template named after it (see
//! [`DiagnosticKind::template_name`]), and whole error pages by `page`.
//! Text taken from diagnostics and source files is passed to templates as
//! plain strings and escaped there; fragments that are already HTML (the
//! annotated line, a nested diagnostic body) are passed as
//! [`TemplateValue::Markup`] so nothing is escaped twice.

use std::error::Error;
use std::io::{self, Write};
use std::path::Path;

use folio_doctemplate::{
    TemplateContext, TemplateError, TemplateRegistry, TemplateResult, TemplateValue, escape_html,
};
use include_dir::{Dir, include_dir};
use once_cell::sync::Lazy;

use crate::diagnostic::Diagnostic;
use crate::error::{RenderError, RenderResult};
use crate::location::{AnnotatedLine, ErrorLocation};

/// Template that wraps a rendered error in a complete page.
pub const PAGE_TEMPLATE: &str = "page";

/// Template that renders one [`AnnotatedLine`].
pub const ANNOTATED_LINE_TEMPLATE: &str = "annotated-line";

/// Every template a bundle must provide.
pub const REQUIRED_TEMPLATES: [&str; 7] = [
    PAGE_TEMPLATE,
    ANNOTATED_LINE_TEMPLATE,
    "parse-error",
    "unknown-tag",
    "ambiguous-reference",
    "undefined-function",
    "function-error",
];

/// Error templates compiled into the binary.
static ERROR_TEMPLATE_ASSETS: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/resources/error-templates");

static EMBEDDED_TEMPLATES: Lazy<ErrorTemplates> = Lazy::new(|| {
    ErrorTemplates::from_bundle(&ERROR_TEMPLATE_ASSETS)
        .unwrap_or_else(|err| panic!("Invalid embedded error templates - this is a bug in Folio: {err}"))
});

/// The loaded set of error templates.
///
/// Built once and shared by reference with every render call.
#[derive(Debug, Clone)]
pub struct ErrorTemplates {
    registry: TemplateRegistry,
}

impl ErrorTemplates {
    /// The templates compiled into this crate.
    ///
    /// Call this during start-up: a broken bundle panics on first use.
    pub fn embedded() -> &'static ErrorTemplates {
        &EMBEDDED_TEMPLATES
    }

    /// Load templates from an embedded directory.
    pub fn from_bundle(dir: &Dir<'_>) -> TemplateResult<Self> {
        let mut sources = Vec::new();
        for file in dir.files() {
            let source = file.contents_utf8().ok_or_else(|| {
                TemplateError::Io(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{} is not valid UTF-8", file.path().display()),
                ))
            })?;
            sources.push((file.path(), source));
        }
        Self::from_sources(sources)
    }

    /// Load templates from `(path, source)` pairs, named by file stem.
    pub fn from_sources<I, P, S>(sources: I) -> TemplateResult<Self>
    where
        I: IntoIterator<Item = (P, S)>,
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        Self::from_registry(TemplateRegistry::from_sources(sources)?)
    }

    /// Load every template file in `dir`.
    pub fn from_dir(dir: &Path) -> TemplateResult<Self> {
        Self::from_registry(TemplateRegistry::from_dir(dir)?)
    }

    /// Wrap a registry, checking that every required template is present.
    pub fn from_registry(registry: TemplateRegistry) -> TemplateResult<Self> {
        for name in REQUIRED_TEMPLATES {
            registry.require(name)?;
        }
        registry.check_partials()?;
        Ok(Self { registry })
    }

    /// The underlying registry.
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Render the source line at `location` through `annotated-line`.
    ///
    /// Unknown locations render as empty markup.
    pub fn annotated_html(&self, location: &ErrorLocation) -> RenderResult<String> {
        let line = AnnotatedLine::load(location)
            .map_err(|source| RenderError::source_read(&location.file_path, source))?;
        let Some(line) = line else {
            return Ok(String::new());
        };

        Ok(self
            .registry
            .render(ANNOTATED_LINE_TEMPLATE, &annotated_line_context(&line))?)
    }

    /// Render `diagnostic` through the template for its kind.
    pub fn render_diagnostic(&self, diagnostic: &Diagnostic) -> RenderResult<String> {
        let context = self.diagnostic_context(diagnostic)?;
        Ok(self
            .registry
            .render(diagnostic.kind().template_name(), &context)?)
    }

    /// Render a complete error page for `error` into `out`.
    ///
    /// Diagnostics are rendered through their own templates; any other error
    /// is shown as its escaped message in a `raw-error` block.
    pub fn render_page<W: Write + ?Sized>(
        &self,
        error: PageError<'_>,
        out: &mut W,
    ) -> RenderResult<()> {
        let (title, body) = match error {
            PageError::Diagnostic(diagnostic) => {
                (diagnostic.summary(), self.render_diagnostic(diagnostic)?)
            }
            PageError::Other(err) => (err.to_string(), raw_error_html(err)),
        };

        let mut context = TemplateContext::new();
        context.insert("title", title);
        context.insert("error", TemplateValue::Markup(body));

        let page = self.registry.render(PAGE_TEMPLATE, &context)?;
        out.write_all(page.as_bytes())?;
        Ok(())
    }

    fn diagnostic_context(&self, diagnostic: &Diagnostic) -> RenderResult<TemplateContext<'static>> {
        let location = diagnostic.location();

        let mut context = TemplateContext::new();
        context.insert("message", diagnostic.summary());
        context.insert("file_path", location.file_path.display().to_string());
        if location.location.is_known() {
            context.insert("line", location.location.line.to_string());
        }
        context.insert("location", location.to_string());
        context.insert("annotation", TemplateValue::Markup(self.annotated_html(location)?));

        match diagnostic {
            Diagnostic::ParseFailure { source_error, .. } => {
                context.insert("error", source_error.to_string());
            }
            Diagnostic::UnknownTag { tag_name, .. } => {
                context.insert("tag_name", tag_name.as_str());
            }
            Diagnostic::AmbiguousReference {
                tag_name,
                defined_locations,
                ..
            } => {
                context.insert("tag_name", tag_name.as_str());
                let mut defined = Vec::with_capacity(defined_locations.len());
                for location in defined_locations {
                    defined.push(TemplateValue::map([
                        ("file_path", location.file_path.display().to_string().into()),
                        ("location", location.to_string().into()),
                        (
                            "annotation",
                            TemplateValue::Markup(self.annotated_html(location)?),
                        ),
                    ]));
                }
                context.insert("defined_locations", TemplateValue::List(defined));
            }
            Diagnostic::UndefinedFunction { function_name, .. } => {
                context.insert("function_name", function_name.as_str());
            }
            Diagnostic::FailedFunction {
                function_name,
                source_error,
                ..
            } => {
                context.insert("function_name", function_name.as_str());
                context.insert("error", source_error.to_string());
            }
        }

        Ok(context)
    }
}

impl Diagnostic {
    /// Write the HTML narrative for this diagnostic using `templates`.
    pub fn render_rich<W: Write + ?Sized>(
        &self,
        templates: &ErrorTemplates,
        out: &mut W,
    ) -> RenderResult<()> {
        let html = templates.render_diagnostic(self)?;
        out.write_all(html.as_bytes())?;
        Ok(())
    }
}

/// An error to show on an error page.
#[derive(Debug, Clone, Copy)]
pub enum PageError<'a> {
    /// A diagnostic with its own template.
    Diagnostic(&'a Diagnostic),
    /// Any other failure, shown as its message.
    Other(&'a (dyn Error + 'static)),
}

impl<'a> PageError<'a> {
    /// Wrap a type-erased error, recovering a [`Diagnostic`] behind it.
    pub fn other(error: &'a (dyn Error + 'static)) -> Self {
        match error.downcast_ref::<Diagnostic>() {
            Some(diagnostic) => PageError::Diagnostic(diagnostic),
            None => PageError::Other(error),
        }
    }
}

impl<'a> From<&'a Diagnostic> for PageError<'a> {
    fn from(diagnostic: &'a Diagnostic) -> Self {
        PageError::Diagnostic(diagnostic)
    }
}

fn raw_error_html(error: &dyn Error) -> String {
    format!(
        "<pre class=\"raw-error\">{}</pre>",
        escape_html(&error.to_string())
    )
}

fn annotated_line_context(line: &AnnotatedLine) -> TemplateContext<'static> {
    let mut context = TemplateContext::new();
    context.insert("file_path", line.file_path.display().to_string());
    context.insert("lineno", line.gutter());
    context.insert("line_number", line.line_number.to_string());
    context.insert("eof", line.is_end_of_file);
    context.insert("text", line.text.as_str());
    context.insert("prefix", line.prefix.as_str());
    context.insert("annotated", line.annotated.as_str());
    context.insert("suffix", line.suffix.as_str());
    context
}
