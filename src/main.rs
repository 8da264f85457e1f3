use anyhow::{Context, Result};
use doclint::cli::{parse_args, Cli, Manifest};
use doclint::core::ValidationReport;
use doclint::pipeline::{CancellationToken, Engine};
use doclint::report::create_writer;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status when the report contains errors
const EXIT_FAILED: u8 = 1;
/// Exit status for configuration, IO and contract-violation errors
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = parse_args();
    init_logging(cli.verbosity);

    match run(&cli) {
        Ok(report) if report.passed => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_FAILED),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Logs go to stderr so the report on stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ValidationReport> {
    let config = cli.resolve_config().context("Failed to resolve configuration")?;
    let manifest = Manifest::load(&cli.manifest)
        .with_context(|| format!("Failed to read manifest {}", cli.manifest.display()))?;

    let engine = Engine::new(config)?;
    let report = engine.run(&manifest.sources, &manifest.tests, &CancellationToken::new())?;

    let out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = create_writer(cli.format.into(), out);
    writer.write_report(&report)?;
    Ok(report)
}
