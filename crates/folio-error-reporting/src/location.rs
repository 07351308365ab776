//! Source locations and the annotated view of a source line.
//!
//! Diagnostics carry an [`ErrorLocation`] naming a file and a 1-indexed
//! line/column. Nothing about the source text is captured when the error is
//! raised: the line is re-read from disk every time a diagnostic is rendered,
//! one line at a time, so a report always reflects the file as it is now.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A position in a source file (1-indexed).
///
/// A `line` of 0 means the location is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-indexed, 0 when unknown)
    pub line: usize,
    /// Column number (1-indexed byte column)
    pub column: usize,
}

impl SourceLocation {
    /// The "no location" sentinel.
    pub const UNKNOWN: SourceLocation = SourceLocation { line: 0, column: 0 };

    /// Create a location at `line`:`column`.
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Whether this location points at an actual line.
    pub const fn is_known(&self) -> bool {
        self.line != 0
    }
}

/// Where a diagnostic points: a file, a position in it, and the length of
/// the offending span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    /// Path of the source file, as used when the document was parsed
    pub file_path: PathBuf,
    /// Start of the span
    pub location: SourceLocation,
    /// Span length in bytes (ignored when the location is unknown)
    pub length: usize,
}

impl ErrorLocation {
    /// Create a location spanning `length` bytes from `location`.
    pub fn new(file_path: impl Into<PathBuf>, location: SourceLocation, length: usize) -> Self {
        Self {
            file_path: file_path.into(),
            location,
            length,
        }
    }

    /// A location in `file_path` with no line information.
    pub fn unknown(file_path: impl Into<PathBuf>) -> Self {
        Self::new(file_path, SourceLocation::UNKNOWN, 0)
    }

    /// Prefix `message` with this location, compiler style.
    ///
    /// ```
    /// use folio_error_reporting::{ErrorLocation, SourceLocation};
    ///
    /// let loc = ErrorLocation::new("doc.lit", SourceLocation::new(12, 3), 4);
    /// assert_eq!(loc.annotate("oops"), "doc.lit:12: oops");
    /// assert_eq!(ErrorLocation::unknown("doc.lit").annotate("oops"), "doc.lit: oops");
    /// ```
    pub fn annotate(&self, message: impl fmt::Display) -> String {
        format!("{self}: {message}")
    }

    /// Re-read the source and build the annotated view of this location.
    ///
    /// Returns `Ok(None)` when the location is unknown.
    pub fn annotated_line(&self) -> io::Result<Option<AnnotatedLine>> {
        AnnotatedLine::load(self)
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_known() {
            write!(f, "{}:{}", self.file_path.display(), self.location.line)
        } else {
            write!(f, "{}", self.file_path.display())
        }
    }
}

/// A source line split around the annotated span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    /// Text before the span
    pub prefix: String,
    /// The span itself
    pub annotated: String,
    /// Text after the span
    pub suffix: String,
}

/// Split `line` around the span starting at 1-indexed `column`.
///
/// If the span does not fit inside the line (or would split a multi-byte
/// character) all three parts are empty.
pub fn compute_annotation(line: &str, column: usize, length: usize) -> Annotation {
    let Some(offset) = column.checked_sub(1) else {
        return Annotation::default();
    };
    let Some(end) = offset.checked_add(length) else {
        return Annotation::default();
    };

    match (line.get(..offset), line.get(offset..end), line.get(end..)) {
        (Some(prefix), Some(annotated), Some(suffix)) => Annotation {
            prefix: prefix.to_string(),
            annotated: annotated.to_string(),
            suffix: suffix.to_string(),
        },
        _ => Annotation::default(),
    }
}

/// Read the 1-indexed line `line_number` from `file_path`.
///
/// The file is streamed; lines before the target are skipped without being
/// kept. The trailing line terminator is stripped and invalid UTF-8 is
/// replaced rather than reported.
///
/// Returns `Ok(None)` when the file ends before the target line, and for
/// line 0.
pub fn read_line(file_path: &Path, line_number: usize) -> io::Result<Option<String>> {
    if line_number == 0 {
        return Ok(None);
    }

    debug!(path = %file_path.display(), line = line_number, "Reading source line");

    let mut reader = BufReader::new(File::open(file_path)?);
    for _ in 1..line_number {
        if reader.skip_until(b'\n')? == 0 {
            return Ok(None);
        }
    }

    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// The annotated view of an [`ErrorLocation`], built fresh for each render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedLine {
    /// Path of the source file
    pub file_path: PathBuf,
    /// The 1-indexed line number
    pub line_number: usize,
    /// The file ended before this line
    pub is_end_of_file: bool,
    /// The whole line (empty at end of file)
    pub text: String,
    /// Text before the span
    pub prefix: String,
    /// The span itself
    pub annotated: String,
    /// Text after the span
    pub suffix: String,
}

impl AnnotatedLine {
    /// Read the source line for `location` and split it.
    ///
    /// Returns `Ok(None)` when the location is unknown; I/O failures opening
    /// or reading the file are returned as errors.
    pub fn load(location: &ErrorLocation) -> io::Result<Option<Self>> {
        if !location.location.is_known() {
            return Ok(None);
        }

        let line = read_line(&location.file_path, location.location.line)?;
        Ok(Some(Self::from_line(location, line)))
    }

    /// Build the view from an already-read line (`None` past end of file).
    pub fn from_line(location: &ErrorLocation, line: Option<String>) -> Self {
        let Annotation {
            prefix,
            annotated,
            suffix,
        } = match line.as_deref() {
            Some(text) => compute_annotation(text, location.location.column, location.length),
            None => Annotation::default(),
        };

        Self {
            file_path: location.file_path.clone(),
            line_number: location.location.line,
            is_end_of_file: line.is_none(),
            text: line.unwrap_or_default(),
            prefix,
            annotated,
            suffix,
        }
    }

    /// The line number right-aligned in the 4-character gutter.
    pub fn gutter(&self) -> String {
        format!("{:>4}", self.line_number)
    }
}
