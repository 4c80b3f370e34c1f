//! Command-line interface for the indexer.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{
    validate_batch_size, validate_export_path, validate_import_path, DEFAULT_BATCH_SIZE,
    DEFAULT_CONFIG_DIR, DEFAULT_XSLT_DIR,
};
use crate::daterange::DateRangeResolver;
use crate::error::Result;
use crate::normalize::NormalizeConfig;
use crate::pipeline::{ErrorPolicy, Pipeline, RunSummary};
use crate::record::RecordSettings;
use crate::schema::DirectoryLoader;
use crate::sink::{DocumentSink, JsonLinesSink};
use crate::transform::SheetChain;

/// LIDO indexer - Convert aggregate LIDO XML into JSON lines for a search index.
#[derive(Parser, Debug)]
#[command(name = "lido-indexer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Aggregate LIDO XML file to read
    #[arg(short, long)]
    pub import: PathBuf,

    /// File to write JSON lines to (default: stdout). Must not exist yet
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// Record variant of the source, e.g. daphne (default: lido)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Output schema to map records to, e.g. finc
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Number of documents written per batch
    #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub units: usize,

    /// Directory with lido-*.xsl and <filter>-*.xsl sheets
    #[arg(long, default_value = DEFAULT_XSLT_DIR)]
    pub xslt_dir: PathBuf,

    /// Directory with <schema>.schema.yaml and normalize.yaml
    #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
    pub config_dir: PathBuf,

    /// Log and skip units that fail instead of aborting
    #[arg(long)]
    pub skip_invalid: bool,
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    index_command(&cli)
}

/// Execute an indexing run.
fn index_command(cli: &Cli) -> Result<()> {
    validate_batch_size(cli.units)?;
    validate_import_path(&cli.import)?;
    if let Some(export) = &cli.export {
        validate_export_path(export)?;
    }

    let settings = RecordSettings {
        normalize: NormalizeConfig::load_or_default(&cli.config_dir)?,
        dates: DateRangeResolver::new(),
    };
    let policy = if cli.skip_invalid {
        ErrorPolicy::SkipUnit
    } else {
        ErrorPolicy::FailFast
    };

    let mut pipeline = Pipeline::builder()
        .filter(cli.filter.as_deref())
        .schema(cli.schema.as_deref())
        .sheets(SheetChain::from_dir(&cli.xslt_dir, cli.filter.as_deref())?)
        .config_loader(DirectoryLoader::new(&cli.config_dir))
        .settings(settings)
        .policy(policy)
        .build()?;

    let input = BufReader::new(File::open(&cli.import)?);

    let summary = match &cli.export {
        Some(export) => {
            eprintln!(
                "{} {} to {}",
                style("Indexing").bold(),
                style(cli.import.display()).cyan(),
                style(export.display()).green()
            );

            let mut sink = JsonLinesSink::create(export, cli.units)?;
            run_with_spinner(&mut pipeline, input, &mut sink)?
        }
        None => {
            let mut sink = JsonLinesSink::new(io::stdout().lock(), 1);
            pipeline.run(input, &mut sink)?
        }
    };

    print_summary(&summary);
    Ok(())
}

fn run_with_spinner(
    pipeline: &mut Pipeline,
    input: impl io::Read,
    sink: &mut dyn DocumentSink,
) -> Result<RunSummary> {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Reading units...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = pipeline.run_with_progress(input, sink, |summary| {
        pb.set_message(format!(
            "{} units read, {} documents written",
            summary.units_read, summary.documents_emitted
        ));
    });
    pb.finish_and_clear();
    result
}

fn print_summary(summary: &RunSummary) {
    eprintln!(
        "  Documents: {} of {} units",
        summary.documents_emitted, summary.units_read
    );
    if summary.units_failed > 0 {
        eprintln!("  Skipped: {}", style(summary.units_failed).red().bold());
    }
    if summary.warnings > 0 {
        eprintln!("  Warnings: {}", style(summary.warnings).yellow().bold());
    }
    eprintln!(
        "{} in {:.2}s",
        style("All done").green().bold(),
        summary.elapsed.as_secs_f64()
    );
}
