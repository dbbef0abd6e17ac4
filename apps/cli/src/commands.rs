//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use atplan_core::{BatchResult, ProgressReporter, extract_batch, inspect_dump, write_output};
use atplan_shared::{AppConfig, BatchConfig, init_config, load_config};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// atplan: turn Annual Teaching Plan tables into weekly curriculum data.
#[derive(Parser)]
#[command(
    name = "atplan",
    version,
    about = "Extract weekly curriculum data from Annual Teaching Plan table dumps.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Extract every table dump under a directory (or a single dump).
    Extract {
        /// Input root, organised as `<root>/Grade_<n>/<Subject>.json`.
        input: PathBuf,

        /// Output file (defaults to the configured output_file).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Documents extracted in parallel.
        #[arg(short, long)]
        concurrency: Option<u32>,

        /// Write compact JSON instead of pretty-printed.
        #[arg(long)]
        compact: bool,

        /// Skip the `<output stem>.report.json` sidecar.
        #[arg(long)]
        no_report: bool,
    },

    /// Show the detected layout of a single dump's tables.
    Inspect {
        /// Table dump to inspect.
        dump: PathBuf,

        /// Number of pages to inspect.
        #[arg(long, default_value = "1")]
        pages: usize,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "atplan=info",
        1 => "atplan=debug",
        _ => "atplan=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Extract {
            input,
            out,
            concurrency,
            compact,
            no_report,
        } => cmd_extract(input, out, concurrency, compact, no_report).await,
        Command::Inspect { dump, pages } => cmd_inspect(&dump, pages),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_extract(
    input: PathBuf,
    out: Option<PathBuf>,
    concurrency: Option<u32>,
    compact: bool,
    no_report: bool,
) -> Result<()> {
    if !input.exists() {
        return Err(eyre!("input '{}' does not exist", input.display()));
    }

    let config = load_config()?;
    let mut batch = BatchConfig::from(&config);
    batch.input_root = input;
    if let Some(out) = out {
        batch.output_file = out;
    }
    if let Some(concurrency) = concurrency {
        batch.concurrency = concurrency;
    }
    if compact {
        batch.pretty = false;
    }
    if no_report {
        batch.write_report = false;
    }

    info!(
        input = %batch.input_root.display(),
        output = %batch.output_file.display(),
        concurrency = batch.concurrency,
        "extracting teaching plans"
    );

    let reporter = CliProgress::new();
    let result = extract_batch(&batch, &reporter).await?;
    let summary = write_output(&batch, &result)?;

    println!();
    println!("  Extraction complete");
    println!("  Documents: {}", summary.document_count);
    println!("  Failed:    {}", result.failures.len());
    println!("  Output:    {}", summary.output_file.display());
    if let Some(report) = &summary.report_file {
        println!("  Report:    {}", report.display());
    }
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    for failure in &result.failures {
        println!("  ! {}: {}", failure.path.display(), failure.error);
    }
    println!();

    Ok(())
}

fn cmd_inspect(dump: &Path, pages: usize) -> Result<()> {
    let summaries = inspect_dump(dump, pages)?;
    if summaries.is_empty() {
        println!("no tables on the first {pages} page(s) of {}", dump.display());
        return Ok(());
    }

    for table in &summaries {
        println!(
            "page {} table {} ({} rows)",
            table.page + 1,
            table.index + 1,
            table.rows
        );
        let (Some(header_row), Some(term)) = (table.header_row, table.term) else {
            println!("  no week header, skipped");
            continue;
        };
        println!("  header row: {header_row}");
        println!("  term:       {term}");
        for (column, weeks) in &table.columns {
            let weeks: Vec<String> = weeks.iter().map(u32::to_string).collect();
            println!("  column {column} -> weeks {}", weeks.join(", "));
        }
        for row in &table.sample {
            println!("  | {row}");
        }
    }

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner:.cyan} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn started(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_message("extracting");
    }

    fn document_finished(&self, path: &Path, succeeded: bool) {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let marker = if succeeded { "" } else { " (failed)" };
        self.bar.set_message(format!("{name}{marker}"));
        self.bar.inc(1);
    }

    fn done(&self, _result: &BatchResult) {
        self.bar.finish_and_clear();
    }
}
