use annotextract::api::ApiDatabase;
use annotextract::config::{Config, ConfigError};
use annotextract::discovery::FileFinder;
use annotextract::extract::Extractor;
use annotextract::parser::{self, ParsedUnit};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// annotextract - Extract typedef, nullness and permission annotations from
/// Java sources into external annotation archives and ProGuard keep rules
#[derive(Parser, Debug)]
#[command(name = "annotextract")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project directory; source roots are relative to it
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source roots to scan (can be specified multiple times)
    #[arg(short, long)]
    sources: Vec<PathBuf>,

    /// External annotations archive to write
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// ProGuard keep rules file to write
    #[arg(long, value_name = "FILE")]
    proguard: Option<PathBuf>,

    /// Existing annotations.xml files, archives or directories to merge in
    #[arg(long, value_name = "PATH")]
    merge: Vec<PathBuf>,

    /// API signature files; only elements they list are written
    #[arg(long, value_name = "FILE")]
    api_filter: Vec<PathBuf>,

    /// Do not log elements dropped by the API filter
    #[arg(long)]
    hide_filtered: bool,

    /// Only record support annotations with source retention
    #[arg(long)]
    skip_class_retention: bool,

    /// Keep annotation attributes in source order
    #[arg(long)]
    no_sort: bool,

    /// Continue when source files have syntax errors
    #[arg(long)]
    allow_errors: bool,

    /// Write extraction statistics as JSON
    #[arg(long, value_name = "FILE")]
    stats_json: Option<PathBuf>,

    /// Patterns to exclude (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let config = load_config(&cli)?;
    if let Err(err @ ConfigError::NoOutput) = config.validate() {
        Cli::command()
            .error(clap::error::ErrorKind::MissingRequiredArgument, err.to_string())
            .exit();
    }

    run_extraction(&config, &cli)
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

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path).into_diagnostic()?
    } else {
        Config::from_default_locations(&cli.path).into_diagnostic()?
    };

    // Override with CLI arguments
    if !cli.sources.is_empty() {
        config.sources = cli.sources.clone();
    }
    if !cli.exclude.is_empty() {
        config.exclude.extend(cli.exclude.clone());
    }
    if !cli.merge.is_empty() {
        config.merge = cli.merge.clone();
    }
    if !cli.api_filter.is_empty() {
        config.api_filter = cli.api_filter.clone();
    }
    if cli.output.is_some() {
        config.output = cli.output.clone();
    }
    if cli.proguard.is_some() {
        config.proguard = cli.proguard.clone();
    }
    if cli.stats_json.is_some() {
        config.stats_json = cli.stats_json.clone();
    }
    if cli.hide_filtered {
        config.extraction.list_filtered = false;
    }
    if cli.skip_class_retention {
        config.extraction.include_class_retention = false;
    }
    if cli.no_sort {
        config.extraction.sort_annotations = false;
    }
    if cli.allow_errors {
        config.extraction.allow_errors = true;
    }

    Ok(config)
}

fn run_extraction(config: &Config, cli: &Cli) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;
    use std::time::Instant;

    let start_time = Instant::now();

    // Step 1: Discover files
    info!("Discovering files...");
    let files = FileFinder::new(config).find_files(&cli.path);
    info!("Found {} Java files", files.len());
    if files.is_empty() && !cli.quiet {
        println!("{}", "No Java files found.".yellow());
    }

    // Step 2: Parse in parallel
    let pb = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(files.len() as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let results: Vec<Result<ParsedUnit>> = files
        .par_iter()
        .map(|file| {
            let parsed = file
                .read_contents()
                .and_then(|source| parser::JavaParser::new().parse(&file.path, &source));
            pb.inc(1);
            parsed
        })
        .collect();
    pb.finish_and_clear();

    let allow_errors = config.extraction.allow_errors;
    let mut units = Vec::with_capacity(results.len());
    let mut failures = 0usize;
    for result in results {
        match result {
            Ok(unit) if unit.has_errors && !allow_errors => {
                error!("Syntax errors in {}", unit.path.display());
                failures += 1;
            }
            Ok(unit) => {
                if unit.has_errors {
                    warn!("Syntax errors in {}, continuing", unit.path.display());
                }
                units.push(unit);
            }
            Err(e) => {
                error!("{:?}", e);
                failures += 1;
            }
        }
    }
    if failures > 0 && !allow_errors {
        return Err(miette::miette!(
            "{} source file(s) could not be parsed; use --allow-errors to continue anyway",
            failures
        ));
    }

    // Step 3: Resolve declarations
    info!("Resolving declarations...");
    let (compilation_units, facts) = parser::build_facts(&units);

    let api = if config.api_filter.is_empty() {
        None
    } else {
        info!("Loading API signatures from {} file(s)...", config.api_filter.len());
        Some(ApiDatabase::from_files(&config.api_filter)?)
    };

    // Step 4: Extract and merge
    let mut extractor = Extractor::new(config.extraction.options(!cli.quiet), api, facts);
    extractor.extract_from_units(&compilation_units);
    for path in &config.merge {
        extractor.merge_existing(path);
    }

    if !extractor.non_public_typedefs().is_empty() {
        info!(
            "{} typedef annotation(s) are not public: {}",
            extractor.non_public_typedefs().len(),
            extractor.non_public_typedefs().join(", ")
        );
    }

    // Step 5: Write outputs
    let summary = extractor
        .export(config.output.as_deref(), config.proguard.as_deref())
        .into_diagnostic()
        .wrap_err("Failed to write annotations")?;

    let stats = extractor.stats();
    if let Some(path) = &config.stats_json {
        stats
            .write_json(path)
            .wrap_err_with(|| format!("Failed to write statistics to {}", path.display()))?;
    }

    for package in &summary.failed_packages {
        eprintln!("{}: annotations for package {} were not written", "Warning".yellow(), package);
    }

    if !cli.quiet {
        let elapsed = start_time.elapsed();
        println!(
            "{}",
            format!(
                "Extracted {} annotations on {} items in {} packages, {} keep rules ({} files in {:.2}s)",
                stats.total(),
                summary.items,
                summary.packages,
                summary.keep_rules,
                files.len(),
                elapsed.as_secs_f64()
            )
            .green()
        );
    }

    Ok(())
}
