use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, error, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

mod analytics;
mod config;
mod curriculum;
mod dataset;
mod dedupe;
mod error;
mod models;
mod report;
mod scores;

use analytics::AnalyticsSnapshot;
use config::{Config, Overrides};
use dataset::Dataset;
use error::LookupError;

#[derive(Parser)]
#[command(name = "exam-results")]
#[command(about = "Entrance exam results lookup and analytics", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./exam-results.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Canonical (deduplicated) results file
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Enable debug logging, on top of any RUST_LOG directives
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Markdown,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    InitConfig,
    /// Remove duplicate submissions, keeping the first per admission number
    Dedupe {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show one student's results
    Lookup {
        admission_number: String,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Top students by total score in each stream
    Rankings {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Top scorers of each subject in each stream
    Subjects {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Average score and pass rate per subject
    Stats {
        #[arg(long)]
        threshold: Option<u32>,
    },
    /// Generate the full analytics report
    Report {
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::InitConfig = cli.command {
        return init_config();
    }

    let mut config = Config::resolve(cli.config.as_deref())?;
    let mut overrides = Overrides {
        canonical: cli.data.clone(),
        ..Overrides::default()
    };
    match &cli.command {
        Commands::Rankings { limit } => overrides.stream_top_n = *limit,
        Commands::Subjects { limit } => overrides.subject_top_n = *limit,
        Commands::Stats { threshold } => overrides.pass_threshold = *threshold,
        _ => {}
    }
    config.merge(&overrides);
    config.validate()?;
    debug!(?config, "Configuration resolved");

    match cli.command {
        Commands::InitConfig => {}
        Commands::Dedupe { input, output } => {
            let input = input.unwrap_or_else(|| config.data.raw.clone());
            let output = output.unwrap_or_else(|| config.data.canonical.clone());
            let summary = dedupe::dedupe_file(&input, &output)?;
            println!(
                "Kept {} of {} rows ({} duplicates, {} malformed skipped).",
                summary.kept, summary.read, summary.duplicates_dropped, summary.malformed_skipped
            );
            println!("Unique data has been written to {}.", output.display());
        }
        Commands::Lookup {
            admission_number,
            format,
        } => {
            let dataset = load_dataset(&config)?;
            match analytics::find(&dataset, &admission_number) {
                Ok(Some(result)) => match format {
                    Format::Text => print!("{}", report::render_student(&result)),
                    Format::Json => println!("{}", report::to_json(&result)?),
                },
                Ok(None) => println!("No results found for this admission number."),
                Err(LookupError::EmptyIdentifier) => {
                    println!("Please enter an admission number.");
                }
                Err(err) => {
                    error!(error = %err, "Lookup failed");
                    return Err(err).context("Error retrieving student data");
                }
            }
        }
        Commands::Rankings { .. } => {
            let dataset = load_dataset(&config)?;
            let rankings = analytics::top_by_stream(&dataset, config.analytics.stream_top_n);
            print!("{}", report::render_stream_rankings(&rankings));
        }
        Commands::Subjects { .. } => {
            let dataset = load_dataset(&config)?;
            let rankings = analytics::top_by_subject(
                &dataset,
                &config.streams,
                config.analytics.subject_top_n,
            );
            print!("{}", report::render_subject_rankings(&rankings));
        }
        Commands::Stats { .. } => {
            let dataset = load_dataset(&config)?;
            let threshold = config.analytics.pass_threshold;
            let stats = analytics::subject_stats(&dataset, &config.streams, threshold);
            print!("{}", report::render_subject_stats(&stats, threshold));
        }
        Commands::Report { out, format } => {
            let dataset = load_dataset(&config)?;
            let snapshot =
                AnalyticsSnapshot::compute(&dataset, &config.streams, config.analytics_settings());
            let rendered = match format {
                ReportFormat::Markdown => report::build_report(
                    &config.report.title,
                    Local::now().date_naive(),
                    &snapshot,
                ),
                ReportFormat::Json => report::to_json(&snapshot)?,
            };
            let out = out.unwrap_or_else(|| config.report.output.clone());
            std::fs::write(&out, rendered)
                .with_context(|| format!("failed to write report to {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = log_filter(verbose, std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn log_filter(verbose: bool, directives: Option<&str>) -> EnvFilter {
    let filter = directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    if verbose {
        filter.add_directive(LevelFilter::DEBUG.into())
    } else {
        filter
    }
}

fn init_config() -> anyhow::Result<()> {
    let path = std::path::Path::new(config::DEFAULT_CONFIG_FILE);
    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            path.display()
        );
    }

    std::fs::write(path, Config::default_toml()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created {} with default settings.", path.display());
    Ok(())
}

fn load_dataset(config: &Config) -> anyhow::Result<Dataset> {
    let path = &config.data.canonical;
    let dataset = Dataset::from_path(path)
        .with_context(|| format!("failed to load results from {}", path.display()))?;
    if dataset.is_empty() {
        warn!(path = %path.display(), "Dataset has no usable rows");
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_level_even_with_rust_log() {
        assert_eq!(
            log_filter(false, Some("warn")).max_level_hint(),
            Some(LevelFilter::WARN)
        );
        assert_eq!(
            log_filter(true, Some("warn")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn defaults_to_info_without_rust_log() {
        assert_eq!(log_filter(false, None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(true, None).max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
