use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use leftovers::config::{Config, ConfigLoader, ParseErrorPolicy};
use leftovers::discovery::{FileFinder, FileStats};
use leftovers::report::{ReportFormat, Reporter};
use leftovers::todo::TodoFile;
use leftovers::{LeftoverReport, ParallelCollector, ReachabilityAnalyzer, RuleSet};

/// Leftovers - find unused methods, constants and accessors in Ruby projects
#[derive(Parser, Debug)]
#[command(name = "leftovers")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the project directory to analyze
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file (default: .leftovers.yml in the project)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format (overrides report.format in the config)
    #[arg(short, long, value_enum)]
    format: Option<ReportFormat>,

    /// Output file (for json format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the current leftovers to .leftovers_todo.yml instead of reporting them
    #[arg(long)]
    write_todo: bool,

    /// What to do with files that fail to parse (overrides parse_errors in the config)
    #[arg(long, value_enum)]
    parse_errors: Option<ParseErrorPolicy>,

    /// Don't show a progress bar
    #[arg(long)]
    no_progress: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("Leftovers v{}", env!("CARGO_PKG_VERSION"));

    let root = cli
        .path
        .canonicalize()
        .into_diagnostic()
        .wrap_err_with(|| format!("Cannot analyze {}", cli.path.display()))?;

    let todo = TodoFile::new(&root);
    if cli.write_todo {
        todo.prepare()?;
    }

    let config = load_config(&cli, &root)?;
    let report = run_analysis(&config, &cli, &root)?;

    if cli.write_todo {
        todo.write(&report)?;
        return Ok(());
    }

    let format = cli.format.or(config.report.format).unwrap_or_default();
    Reporter::new(format, cli.output.clone())
        .with_source(config.show_source())
        .report(&report)?;

    if !report.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli, root: &Path) -> Result<Config> {
    let mut loader = ConfigLoader::new(root).with_file(cli.config.clone());
    if cli.write_todo {
        loader = loader.without_todo();
    }
    loader.load()
}

fn run_analysis(config: &Config, cli: &Cli, root: &Path) -> Result<LeftoverReport> {
    let start_time = Instant::now();

    // Step 1: Compile the rules
    info!("Building rules...");
    let mut rules = RuleSet::build(config, root)?;
    if let Some(policy) = cli.parse_errors {
        rules = rules.with_parse_errors(policy);
    }

    // Step 2: Discover files
    info!("Discovering files...");
    let files = FileFinder::new(&rules).find_files();
    let stats = FileStats::from_files(&files);
    info!(
        "Found {} files to analyze ({} Ruby, {} precompiled, {} test)",
        stats.total(),
        stats.ruby_files,
        stats.precompiled_files,
        stats.test_files
    );

    if files.is_empty() && !cli.quiet {
        println!("{}", "No Ruby files found.".yellow());
    }

    // Step 3: Collect definitions and calls
    let mut collector = ParallelCollector::new(&rules);
    if !cli.quiet && !cli.no_progress && !files.is_empty() {
        collector = collector.with_progress(progress_bar(files.len()));
    }
    let collection = collector
        .collect(&files)
        .wrap_err("Failed to collect definitions and calls")?;

    // Step 4: Find leftovers
    let report = ReachabilityAnalyzer::new(&rules).analyze(&collection);

    info!(
        "Analyzed {} files in {:.2}s",
        collection.files,
        start_time.elapsed().as_secs_f64()
    );
    Ok(report)
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
