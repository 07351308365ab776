//! Print a diagnostic for a location in a source file.
//!
//! ```text
//! cargo run -p folio-error-reporting --example report -- index.lit 3 6 9 --tag intro
//! RUST_LOG=folio_error_reporting=debug cargo run ... -- --html index.lit 3 6 9
//! ```

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use folio_error_reporting::{Diagnostic, ErrorLocation, ErrorTemplates, SourceLocation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    UnknownTag,
    UndefinedFunction,
    FunctionError,
    ParseError,
}

#[derive(Parser, Debug)]
#[command(name = "report")]
#[command(about = "Render a Folio diagnostic for a source location")]
struct Args {
    /// Source file the diagnostic points into
    file: PathBuf,

    /// 1-indexed line (0 for no location)
    line: usize,

    /// 1-indexed column
    #[arg(default_value = "1")]
    column: usize,

    /// Length of the span in bytes
    #[arg(default_value = "1")]
    length: usize,

    /// Which diagnostic to report
    #[arg(long, value_enum, default_value = "unknown-tag")]
    kind: Kind,

    /// Tag or function name
    #[arg(long, default_value = "intro")]
    tag: String,

    /// Emit the HTML rendering instead of plain text
    #[arg(long)]
    html: bool,

    /// Emit JSON instead of plain text
    #[arg(long, conflicts_with = "html")]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_error_reporting=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let location = ErrorLocation::new(
        &args.file,
        SourceLocation::new(args.line, args.column),
        args.length,
    );

    let diagnostic = match args.kind {
        Kind::UnknownTag => Diagnostic::unknown_tag(args.tag, location),
        Kind::UndefinedFunction => Diagnostic::undefined_function(args.tag, location),
        Kind::FunctionError => {
            Diagnostic::failed_function(args.tag, "the function gave up", location)
        }
        Kind::ParseError => Diagnostic::parse_failure("unexpected end of input", location),
    };

    let mut stdout = std::io::stdout().lock();
    if args.html {
        diagnostic.render_rich(ErrorTemplates::embedded(), &mut stdout)?;
    } else if args.json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&diagnostic.to_json())?)?;
    } else {
        diagnostic.render_plain(&mut stdout)?;
    }

    Ok(())
}
