//! Write a full error page for an ambiguous reference to stdout.
//!
//! ```text
//! cargo run -p folio-error-reporting --example error_page -- chapter.lit 4 > error.html
//! ```

use std::path::PathBuf;

use clap::Parser;
use folio_error_reporting::{
    Diagnostic, ErrorLocation, ErrorTemplates, SourceLocation, serve_error_page,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "error_page")]
#[command(about = "Render a Folio error page for an ambiguous reference")]
struct Args {
    /// Source file containing the reference and its definitions
    file: PathBuf,

    /// Line of the reference
    line: usize,

    /// Lines where the tag is defined
    #[arg(long = "defined", value_name = "LINE", default_values_t = vec![1, 2])]
    defined: Vec<usize>,

    /// Directory to load templates from instead of the built-in bundle
    #[arg(long)]
    templates: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_error_reporting=info,error_page=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let loaded;
    let templates = match &args.templates {
        Some(dir) => {
            info!(dir = %dir.display(), "Loading error templates");
            loaded = ErrorTemplates::from_dir(dir)?;
            &loaded
        }
        None => ErrorTemplates::embedded(),
    };

    let defined = args
        .defined
        .iter()
        .map(|&line| ErrorLocation::new(&args.file, SourceLocation::new(line, 1), 1))
        .collect();
    let diagnostic = Diagnostic::ambiguous_reference(
        "intro",
        defined,
        ErrorLocation::new(&args.file, SourceLocation::new(args.line, 1), 1),
    )?;

    serve_error_page(templates, &diagnostic, &mut std::io::stdout().lock());
    Ok(())
}
