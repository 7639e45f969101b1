use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use statwatch::{analyze_file, Settings};

#[derive(Parser, Debug)]
#[command(name = "statwatch")]
#[command(about = "Windowed reports over collected database diagnostic snapshots")]
struct Args {
    /// Batch file written by the collector
    file: PathBuf,

    /// Window span in seconds (overrides the settings file)
    #[arg(short, long)]
    span: Option<i64>,

    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;
    let span = args.span.unwrap_or(settings.span);

    let mut stdout = io::stdout().lock();
    analyze_file(&args.file, Some(span), &mut stdout)
}
