//! Plain-text rendering for terminals.
//!
//! A located line is shown with a 4-wide right-aligned line-number gutter
//! and a red run of carets under the offending span:
//!
//! ```text
//!    3| see \reference{intro}
//!          ^^^^^^^^^
//! ```

use std::io::{self, Write};

use crate::diagnostic::Diagnostic;
use crate::error::{RenderError, RenderResult};
use crate::location::{ErrorLocation, read_line};

const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Indentation applied to annotations of competing definitions.
const DEFINITION_INDENT: &str = "  ";

/// Write the gutter line and caret line for `location`.
///
/// Writes nothing when the location is unknown. Past the end of the file the
/// gutter line is printed with no text, followed by the carets. Failure to
/// open or read the source is returned as an error.
///
/// A span that runs past the end of the line is clamped to it, keeping at
/// least one caret at the end of the line.
pub fn annotate_location<W: Write + ?Sized>(
    location: &ErrorLocation,
    out: &mut W,
) -> RenderResult<()> {
    if !location.location.is_known() {
        return Ok(());
    }

    let line = read_line(&location.file_path, location.location.line)
        .map_err(|source| RenderError::source_read(&location.file_path, source))?;
    let text = line.as_deref().unwrap_or_default();

    let gutter = format!("{:>4}| ", location.location.line);
    writeln!(out, "{gutter}{text}")?;

    let (offset, length) = caret_span(text.len(), location.location.column, location.length);
    let padding = " ".repeat(gutter.len().saturating_add(offset));
    let carets = "^".repeat(length);
    writeln!(out, "{padding}{RED}{carets}{RESET}")?;

    Ok(())
}

/// Offset and width of the caret run for a span on a line of `line_len` bytes.
fn caret_span(line_len: usize, column: usize, length: usize) -> (usize, usize) {
    let offset = column.saturating_sub(1);
    match offset.checked_add(length) {
        Some(end) if end <= line_len => (offset, length),
        _ => {
            let offset = offset.min(line_len);
            let length = length.min(line_len - offset).max(usize::from(length > 0));
            (offset, length)
        }
    }
}

/// A writer that prefixes every line written through it.
///
/// The prefix goes in front of the first byte of each line, so a trailing
/// newline does not produce a dangling prefix.
#[derive(Debug)]
pub struct IndentWriter<W> {
    inner: W,
    prefix: &'static str,
    at_line_start: bool,
}

impl<W: Write> IndentWriter<W> {
    pub fn new(inner: W, prefix: &'static str) -> Self {
        Self {
            inner,
            prefix,
            at_line_start: true,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for IndentWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        while !rest.is_empty() {
            if self.at_line_start {
                self.inner.write_all(self.prefix.as_bytes())?;
                self.at_line_start = false;
            }
            match rest.iter().position(|&b| b == b'\n') {
                Some(newline) => {
                    self.inner.write_all(&rest[..=newline])?;
                    self.at_line_start = true;
                    rest = &rest[newline + 1..];
                }
                None => {
                    self.inner.write_all(rest)?;
                    rest = &[];
                }
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Diagnostic {
    /// Write the plain narrative for this diagnostic.
    ///
    /// The first line is the summary prefixed with the location; annotated
    /// source lines follow. Nothing is written after the first failure.
    pub fn render_plain<W: Write + ?Sized>(&self, out: &mut W) -> RenderResult<()> {
        let location = self.location();

        match self {
            Diagnostic::ParseFailure { source_error, .. } => {
                writeln!(out, "{location}: parse error: {source_error}\n")?;
                annotate_location(location, out)?;
            }
            Diagnostic::UnknownTag { tag_name, .. } => {
                writeln!(out, "{location}: reference points to unknown tag '{tag_name}':\n")?;
                annotate_location(location, out)?;
            }
            Diagnostic::AmbiguousReference {
                defined_locations, ..
            } => {
                writeln!(out, "{location}: {}:\n", self.summary())?;
                annotate_location(location, out)?;
                writeln!(out, "the same tag was defined in the following locations:\n")?;
                for defined in defined_locations {
                    writeln!(out, "- {}:", defined.file_path.display())?;
                    annotate_location(defined, &mut IndentWriter::new(&mut *out, DEFINITION_INDENT))?;
                }
                writeln!(out, "one of these must be changed.")?;
            }
            Diagnostic::UndefinedFunction { function_name, .. } => {
                writeln!(out, "{location}: undefined function \\{function_name}:\n")?;
                annotate_location(location, out)?;
            }
            Diagnostic::FailedFunction {
                function_name,
                source_error,
                ..
            } => {
                writeln!(out, "{location}: function \\{function_name} returned an error:\n")?;
                annotate_location(location, out)?;
                writeln!(out, "error: {source_error}")?;
            }
        }

        Ok(())
    }
}
