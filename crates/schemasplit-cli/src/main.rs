use clap::{Parser, Subcommand};
use colored::Colorize;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schemasplit_core::{Config, Report, Severity};
use schemasplit_engine::{Pipeline, SplitOutcome, ValidationResult};
use schemasplit_graph::{DependencyGraph, Resolution};
use schemasplit_sql::Extraction;

const DEFAULT_CONFIG_FILE: &str = "schemasplit.toml";

/// schemasplit - Split a SQL schema into ordered, size-bounded files
#[derive(Parser)]
#[command(name = "schemasplit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: schemasplit.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract per-table files from the raw schema sources
    Extract,

    /// Resolve the foreign-key creation order
    Resolve,

    /// Assign tables to group files and write the seed file
    Split,

    /// Validate the written schema files
    Validate {
        /// Exit with status 1 when validation fails
        #[arg(long)]
        strict: bool,
    },

    /// Run every stage in order
    Run {
        /// Reuse the existing per-table files
        #[arg(long)]
        skip_extract: bool,

        /// Exit with status 1 when validation fails
        #[arg(long)]
        strict: bool,
    },

    /// Write the default configuration
    InitConfig {
        /// Where to write the config
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let load = || load_config(cli.config.as_deref(), cli.verbose);

    match cli.command {
        Commands::InitConfig { output, force } => init_config_command(&output, force),
        Commands::Extract => {
            let config = load()?;
            let extraction = Pipeline::new(&config).extract()?;
            print_extraction(&extraction, &config);
            Ok(())
        }
        Commands::Resolve => {
            let config = load()?;
            let (graph, resolution) = Pipeline::new(&config).resolve()?;
            print_resolution(&graph, &resolution, &config);
            Ok(())
        }
        Commands::Split => {
            let config = load()?;
            let outcome = Pipeline::new(&config).split()?;
            print_split(&outcome, &config);
            Ok(())
        }
        Commands::Validate { strict } => {
            let config = load()?;
            let result = Pipeline::new(&config).validate()?;
            print_validation(&result, &config);
            exit_on_failure(&result, strict);
            Ok(())
        }
        Commands::Run { skip_extract, strict } => run_command(&load()?, skip_extract, strict),
    }
}

/// Run command - every stage back to back
fn run_command(config: &Config, skip_extract: bool, strict: bool) -> Result<()> {
    let outcome = Pipeline::new(config).run(skip_extract)?;
    if let Some(extraction) = &outcome.extraction {
        print_extraction(extraction, config);
    }
    println!(
        "{} {} tables, {} cycle(s)",
        "Resolved".cyan(),
        outcome.resolution.order.len(),
        outcome.resolution.cycles.len()
    );
    print_split(&outcome.split, config);
    print_validation(&outcome.validation, config);
    exit_on_failure(&outcome.validation, strict);
    Ok(())
}

/// Log to stderr; RUST_LOG wins over --verbose
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let config = if let Some(config_path) = path {
        debug!(path = %config_path.display(), "loading config");
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
        debug!(path = DEFAULT_CONFIG_FILE, "loading config");
        Config::from_file(Path::new(DEFAULT_CONFIG_FILE))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    info!(
        root = %config.project_root.display(),
        groups = config.groups.len(),
        line_limit = config.line_limit,
        "config loaded"
    );
    if verbose {
        eprintln!(
            "{} {} groups, line limit {}",
            "Using".cyan(),
            config.groups.len(),
            config.line_limit
        );
    }

    Ok(config)
}

/// Init-config command - write the default configuration
fn init_config_command(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    Config::default()
        .save_to_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("{} {}", "✓ Wrote default config to".green(), output.display());
    Ok(())
}

fn exit_on_failure(result: &ValidationResult, strict: bool) {
    if strict && !result.passed() {
        std::process::exit(1);
    }
}

fn print_extraction(extraction: &Extraction, config: &Config) {
    println!(
        "{} {} tables from {} file(s) into {}",
        "Extracted".cyan(),
        extraction.tables.len(),
        extraction.scanned_files.len(),
        config.extracted_dir().display()
    );

    if !extraction.skipped_files.is_empty() {
        println!("  Skipped files: {}", extraction.skipped_files.len());
    }
    if !extraction.excluded_hits.is_empty() {
        let excluded = extraction.excluded_hits.iter().cloned().collect::<Vec<_>>();
        println!("  Excluded tables: {}", excluded.join(", ").dimmed());
    }
}

fn print_resolution(graph: &DependencyGraph, resolution: &Resolution, config: &Config) {
    println!(
        "{} {} tables, {} foreign key edges",
        "Resolved".cyan(),
        resolution.order.len(),
        graph.edge_count()
    );

    if resolution.has_cycles() {
        println!("{}", "Cycles detected:".yellow().bold());
        for cycle in &resolution.cycles {
            println!("  {}", cycle.join(" -> ").yellow());
        }
    } else {
        println!("{}", "✓ No cycles detected".green());
    }

    let dangling = graph.dangling_references();
    if !dangling.is_empty() {
        println!("{}", "Unknown foreign key targets:".yellow());
        for (target, sources) in dangling {
            let sources = sources.iter().map(|s| s.as_str()).collect::<Vec<_>>();
            println!("  {} <- {}", target, sources.join(", "));
        }
    }

    println!("Artifacts written to {}", config.reports_dir().display());
}

fn print_split(outcome: &SplitOutcome, config: &Config) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Schema Split".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    for group in &outcome.assignment.groups {
        let usage = format!("{}/{}", group.lines, group.line_limit);
        let usage = if group.lines * 10 >= group.line_limit * 9 {
            usage.yellow()
        } else {
            usage.green()
        };
        println!(
            "  {:<10} {:<28} {:>10} lines  {} tables",
            group.name.bold(),
            group.file,
            usage,
            group.tables.len()
        );
    }
    println!(
        "  {:<10} {:<28} {:>10} statements",
        "seed".bold(),
        config.seed.file,
        outcome.seeds.statements.len()
    );
    println!();

    let moves = outcome.assignment.log.moves().collect::<Vec<_>>();
    if moves.is_empty() {
        println!("{}", "✓ No tables cascaded".green());
    } else {
        println!("{}", "Cascades:".yellow().bold());
        for (table, from, to) in moves {
            println!("  {} {} -> {}", table, from, to);
        }
    }

    if !outcome.seeds.dropped.is_empty() {
        println!(
            "  {} INSERT statement(s) dropped from {} table(s) not on the seed list",
            outcome.seeds.dropped_statements(),
            outcome.seeds.dropped.len()
        );
    }

    println!("Log written to {}", config.log_file().display());
}

fn print_validation(result: &ValidationResult, config: &Config) {
    print_report_summary(&result.to_report());

    let status = if result.passed() {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    println!("Validation Status: {}", status);
    println!(
        "Report written to {}",
        config.reports_dir().join(schemasplit_engine::VALIDATION_REPORT_FILE).display()
    );
}

/// Print report summary to stdout
fn print_report_summary(report: &Report) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Schema Validation Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Tables:  {}", report.summary.tables);

    if report.summary.errors > 0 {
        println!("  Errors:   {}", format!("{}", report.summary.errors).red().bold());
    } else {
        println!("  Errors:   {}", format!("{}", report.summary.errors).green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).yellow());
    } else {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).green());
    }

    println!("  Info:     {}", report.summary.info);
    println!();

    if report.diagnostics.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
        return;
    }

    println!("{}", "Diagnostics:".bold());
    for diag in &report.diagnostics {
        let severity_str = match diag.severity {
            Severity::Error => "ERROR".red().bold(),
            Severity::Warn => "WARN".yellow().bold(),
            Severity::Info => "INFO".cyan(),
        };

        println!("  [{}] {}: {}", severity_str, diag.code, diag.message);

        if let Some(loc) = &diag.location {
            match loc.line {
                Some(line) => println!("    at {}:{}", loc.file, line),
                None => println!("    at {}", loc.file),
            }
        }

        if let Some(exp) = &diag.expected {
            println!("    Expected: {}", exp);
        }
        if let Some(act) = &diag.actual {
            println!("    Actual:   {}", act);
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from(["schemasplit", "--verbose", "run", "--skip-extract", "--strict"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Run { skip_extract: true, strict: true }));
    }

    #[test]
    fn init_config_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        init_config_command(&path, false).unwrap();
        assert!(init_config_command(&path, false).is_err());
        init_config_command(&path, true).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.groups.len(), 4);
    }

    #[test]
    fn load_config_reads_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut config = Config::default();
        config.line_limit = 250;
        config.save_to_file(&path).unwrap();

        let loaded = load_config(Some(&path), false).unwrap();
        assert_eq!(loaded.line_limit, 250);
        assert_eq!(loaded.groups, config.groups);
        assert_eq!(loaded.project_root, dir.path());

        let err = load_config(Some(&dir.path().join("absent.toml")), false).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
