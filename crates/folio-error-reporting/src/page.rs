//! Error pages for the preview server.
//!
//! [`serve_error_page`] always produces a response body: if the page itself
//! cannot be rendered, a one-line plain-text fallback naming the render
//! failure is written instead.

use std::io::Write;

use tracing::{error, warn};

use crate::html::{ErrorTemplates, PageError};

/// Write an error page for `error` to `out`.
///
/// The page is rendered into a buffer first, so a failed render never leaves
/// partial HTML in `out`. Failures are logged, not returned.
pub fn serve_error_page<'a, W: Write + ?Sized>(
    templates: &ErrorTemplates,
    error: impl Into<PageError<'a>>,
    out: &mut W,
) {
    let mut page = Vec::new();
    let result = templates.render_page(error.into(), &mut page).and_then(|()| {
        out.write_all(&page)?;
        Ok(())
    });

    if let Err(render_error) = result {
        warn!(error = %render_error, "Failed to render error page");
        if let Err(write_error) = write!(out, "failed to render error page: {render_error}") {
            error!(error = %write_error, "Failed to write error page fallback");
        }
    }
}

/// A rendered error page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage {
    body: String,
}

impl ErrorPage {
    /// Render `error` with [`serve_error_page`].
    pub fn render<'a>(templates: &ErrorTemplates, error: impl Into<PageError<'a>>) -> Self {
        let mut body = Vec::new();
        serve_error_page(templates, error, &mut body);
        Self {
            body: String::from_utf8_lossy(&body).into_owned(),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

/// Error pages are served as `500 Internal Server Error` HTML.
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ErrorPage {
    fn into_response(self) -> axum::response::Response {
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            axum::response::Html(self.body),
        )
            .into_response()
    }
}
