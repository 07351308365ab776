//! Plain-text narratives rendered against a real source file.

use std::path::PathBuf;

use folio_error_reporting::{
    Diagnostic, ErrorLocation, RenderError, SourceLocation, annotate_location,
};
use pretty_assertions::assert_eq;

const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

fn chapter() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test-fixtures")
        .join("chapter.lit")
}

fn at(line: usize, column: usize, length: usize) -> ErrorLocation {
    ErrorLocation::new(chapter(), SourceLocation::new(line, column), length)
}

fn carets(indent: usize, length: usize) -> String {
    format!("{}{RED}{}{RESET}\n", " ".repeat(indent), "^".repeat(length))
}

#[test]
fn test_annotation_of_middle_line() {
    let mut out = Vec::new();
    annotate_location(&at(3, 5, 2), &mut out).unwrap();

    let expected = format!("   3| See \\reference{{intro}} for details.\n{}", carets(10, 2));
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[test]
fn test_unknown_tag() {
    let diagnostic = Diagnostic::unknown_tag("intro", at(3, 16, 5));

    let expected = format!(
        "{}:3: reference points to unknown tag 'intro':\n\n   3| See \\reference{{intro}} for details.\n{}",
        chapter().display(),
        carets(21, 5)
    );
    assert_eq!(diagnostic.to_text().unwrap(), expected);
}

#[test]
fn test_ambiguous_reference_lists_definitions_in_order() {
    let diagnostic =
        Diagnostic::ambiguous_reference("intro", vec![at(2, 24, 5), at(4, 19, 5)], at(3, 16, 5))
            .unwrap();

    let path = chapter().display().to_string();
    let expected = [
        format!("{path}:3: ambiguous target for tag 'intro':\n\n"),
        "   3| See \\reference{intro} for details.\n".to_string(),
        carets(21, 5),
        "the same tag was defined in the following locations:\n\n".to_string(),
        format!("- {path}:\n"),
        "     2| \\section{Introduction}{intro}\n".to_string(),
        format!("  {}", carets(29, 5)),
        format!("- {path}:\n"),
        "     4| \\section{Install}{intro}\n".to_string(),
        format!("  {}", carets(24, 5)),
        "one of these must be changed.\n".to_string(),
    ]
    .concat();

    assert_eq!(diagnostic.to_text().unwrap(), expected);
}

#[test]
fn test_undefined_function() {
    let diagnostic = Diagnostic::undefined_function("frobnicate", at(5, 1, 11));

    let expected = format!(
        "{}:5: undefined function \\frobnicate:\n\n   5| \\frobnicate{{now}}\n{}",
        chapter().display(),
        carets(6, 11)
    );
    assert_eq!(diagnostic.to_text().unwrap(), expected);
}

#[test]
fn test_failed_function() {
    let diagnostic = Diagnostic::failed_function("frobnicate", "no such file", at(5, 1, 11));

    let expected = format!(
        "{}:5: function \\frobnicate returned an error:\n\n   5| \\frobnicate{{now}}\n{}error: no such file\n",
        chapter().display(),
        carets(6, 11)
    );
    assert_eq!(diagnostic.to_text().unwrap(), expected);
}

#[test]
fn test_parse_failure_without_location() {
    let diagnostic = Diagnostic::parse_failure("unexpected '}'", ErrorLocation::unknown(chapter()));

    let expected = format!("{}: parse error: unexpected '}}'\n\n", chapter().display());
    assert_eq!(diagnostic.to_text().unwrap(), expected);
}

#[test]
fn test_unknown_location_never_reads_source() {
    let missing = ErrorLocation::unknown("/does/not/exist.lit");
    let diagnostics = [
        Diagnostic::parse_failure("bad", missing.clone()),
        Diagnostic::unknown_tag("intro", missing.clone()),
        Diagnostic::ambiguous_reference("intro", vec![missing.clone()], missing.clone()).unwrap(),
        Diagnostic::undefined_function("frobnicate", missing.clone()),
        Diagnostic::failed_function("frobnicate", "bad", missing.clone()),
    ];

    for diagnostic in &diagnostics {
        let mut out = Vec::new();
        annotate_location(diagnostic.location(), &mut out).unwrap();
        assert!(out.is_empty(), "{} wrote an annotation", diagnostic.kind().template_name());
        diagnostic.render_plain(&mut Vec::new()).unwrap();
    }
}

#[test]
fn test_line_past_end_of_file() {
    let diagnostic = Diagnostic::unknown_tag("intro", at(9, 1, 3));

    let expected = format!(
        "{}:9: reference points to unknown tag 'intro':\n\n   9| \n{}",
        chapter().display(),
        carets(6, 1)
    );
    assert_eq!(diagnostic.to_text().unwrap(), expected);
}

#[test]
fn test_missing_source_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.lit");
    let diagnostic =
        Diagnostic::unknown_tag("intro", ErrorLocation::new(&path, SourceLocation::new(1, 1), 1));

    let err = diagnostic.to_text().unwrap_err();
    match err {
        RenderError::SourceRead { path: failed, .. } => assert_eq!(failed, path),
        other => panic!("expected SourceRead, got {other:?}"),
    }
}

#[test]
fn test_source_is_reread_on_every_render() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("live.lit");
    std::fs::write(&path, "\\ref{a}\n").unwrap();
    let diagnostic =
        Diagnostic::unknown_tag("a", ErrorLocation::new(&path, SourceLocation::new(1, 6), 1));

    assert!(diagnostic.to_text().unwrap().contains("   1| \\ref{a}\n"));

    std::fs::write(&path, "\\ref{b}\n").unwrap();
    assert!(diagnostic.to_text().unwrap().contains("   1| \\ref{b}\n"));
}
