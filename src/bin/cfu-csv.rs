//! CLI tool to convert a CFU budget XML file into raw and SCDL CSV exports.
//!
//! Usage:
//!   cfu-csv <budget.xml>
//!   cfu-csv <budget.xml> -s ';' -o exports/
//!
//! Writes `budget_raw.csv` and `budget_scdl.csv` into the output directory.

use cfu_csv::{CfuConverter, Delimiter, RunOutcome, Session, SourceFile};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Convert a CFU budget document into raw and SCDL CSV exports.
#[derive(Parser)]
#[command(name = "cfu-csv")]
struct Cli {
    /// CFU budget document (.xml)
    input: PathBuf,

    /// Field separator: `,`, `;`, `tab` (or the names comma, semicolon)
    #[arg(short, long, default_value = ",")]
    separator: Delimiter,

    /// Directory receiving the exports
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Log parsing and conversion details on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = match SourceFile::read(&cli.input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading input file '{}': {e}", cli.input.display());
            process::exit(1);
        }
    };

    let mut session = Session::new();
    session.bootstrap(CfuConverter::load());
    session.select_file(Some(source.info.clone()));

    let outcome = session.run(cli.separator, source.bytes);
    eprintln!("{}", session.log_text());

    match outcome {
        Ok(RunOutcome::Exposed) => {}
        Ok(_) => process::exit(1),
        Err(e) => {
            eprintln!("Conversion not started: {e}");
            process::exit(1);
        }
    }

    if let Err(e) = fs::create_dir_all(&cli.out_dir) {
        eprintln!("Error creating output directory '{}': {e}", cli.out_dir.display());
        process::exit(1);
    }
    for artifact in session.visible_artifacts() {
        let path = cli.out_dir.join(artifact.filename());
        if let Err(e) = fs::write(&path, artifact.bytes()) {
            eprintln!("Error writing output file '{}': {e}", path.display());
            process::exit(1);
        }
        eprintln!("Wrote {}", path.display());
    }
}
