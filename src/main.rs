use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod error;
mod export;
mod metrics;
mod models;
mod months;
mod rankings;
mod reconcile;
mod report;
mod sources;
mod summarize;

use models::{FilterSpec, Metrics, UsageFact};

#[derive(Parser)]
#[command(name = "adoption-insights")]
#[command(about = "Adoption and usage metrics over roster and monthly usage extracts", long_about = None)]
struct Cli {
    /// Roster CSV with NOMBRE, PAIS, CARGO and AREA columns
    #[arg(long, default_value = "areas_personas.csv")]
    roster: PathBuf,
    /// Usage CSV with an identity column plus one column per month
    #[arg(long, default_value = "uso_por_mes.csv")]
    usage: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Period {
    All,
    PreviousMonth,
    Last3,
    Last6,
    Last9,
}

impl Period {
    fn policy(self) -> months::PeriodPolicy {
        match self {
            Period::All => months::PeriodPolicy::All,
            Period::PreviousMonth => months::PeriodPolicy::PreviousMonth,
            Period::Last3 => months::PeriodPolicy::LastN(3),
            Period::Last6 => months::PeriodPolicy::LastN(6),
            Period::Last9 => months::PeriodPolicy::LastN(9),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Period::All => "all months",
            Period::PreviousMonth => "previous month",
            Period::Last3 => "last 3 months (excluding the month in progress)",
            Period::Last6 => "last 6 months (excluding the month in progress)",
            Period::Last9 => "last 9 months (excluding the month in progress)",
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatsBy {
    Country,
    OrgUnit,
}

#[derive(Clone, Copy, ValueEnum)]
enum RankBy {
    Individual,
    Country,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderBy {
    TotalUsage,
    AdoptionRate,
}

#[derive(Args)]
struct FilterArgs {
    /// Named period policy; ignored when --months is given
    #[arg(long, value_enum, default_value = "all")]
    period: Period,
    /// Explicit month labels, comma separated
    #[arg(long, value_delimiter = ',')]
    months: Option<Vec<String>>,
    /// Countries to include; defaults to every country present
    #[arg(long, value_delimiter = ',')]
    countries: Option<Vec<String>>,
    /// Org units to include; defaults to every unit present
    #[arg(long, value_delimiter = ',')]
    org_units: Option<Vec<String>>,
}

#[derive(Args)]
struct ApiArgs {
    /// API key for the summarization service
    #[arg(long, env = "ADOPTION_API_KEY", hide_env_values = true)]
    api_key: String,
    /// Base URL of the summarization service
    #[arg(long, default_value = summarize::DEFAULT_BASE_URL)]
    base_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Headline adoption metrics with per-month and per-dimension breakdowns
    Metrics {
        #[command(flatten)]
        filter: FilterArgs,
        /// Include the country x org-unit cross tabulation
        #[arg(long)]
        heatmap: bool,
    },
    /// Detailed statistics for one dimension
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value = "country")]
        by: StatsBy,
        /// Write the table to a CSV file (dated name when no path is given)
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        export: Option<PathBuf>,
    },
    /// Top-N leaderboard by usage or adoption
    Rankings {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value = "individual")]
        by: RankBy,
        #[arg(long, value_enum, default_value = "total-usage")]
        metric: OrderBy,
        #[arg(long, default_value_t = 5)]
        limit: usize,
        /// Write the table to a CSV file (dated name when no path is given)
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        export: Option<PathBuf>,
    },
    /// The filtered long-form fact table
    Facts {
        #[command(flatten)]
        filter: FilterArgs,
        /// Write the table to a CSV file (dated name when no path is given)
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        export: Option<PathBuf>,
    },
    /// Write the plain-text executive summary to a file
    Report {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "summary.txt")]
        out: PathBuf,
    },
    /// Generate an executive summary through the summarization service
    Summarize {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Ask the summarization service a question about the current scope
    Ask {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        api: ApiArgs,
        /// The question to ask
        question: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let roster = sources::load_roster(&cli.roster)
        .with_context(|| format!("failed to load the roster from {}", cli.roster.display()))?;
    let usage = sources::load_usage(&cli.usage)
        .with_context(|| format!("failed to load usage data from {}", cli.usage.display()))?;

    let sorted = months::sort_labels(&usage.month_columns);
    if !sorted.fallback_labels.is_empty() {
        eprintln!(
            "Warning: {} month label(s) did not parse and sort under the fallback key: {}",
            sorted.fallback_labels.len(),
            sorted.fallback_labels.join(", ")
        );
    }

    let month_columns = usage.month_columns.clone();
    let reconciled = reconcile::reconcile(roster, usage.rows)?;
    let facts = reconcile::melt(&reconciled, &month_columns);

    match cli.command {
        Commands::Metrics { filter, heatmap } => {
            let (filter, _) = build_filter(&filter, &sorted.labels, &facts);
            if report_degenerate(&filter) {
                return Ok(());
            }
            let computed = metrics::compute(&facts, &filter);
            print_metrics(&computed, heatmap);
        }
        Commands::Stats { filter, by, export } => {
            let (filter, _) = build_filter(&filter, &sorted.labels, &facts);
            if report_degenerate(&filter) {
                return Ok(());
            }
            let dimension = match by {
                StatsBy::Country => metrics::Dimension::Country,
                StatsBy::OrgUnit => metrics::Dimension::OrgUnit,
            };
            let stats = metrics::dimension_stats(&facts, &filter, dimension);
            match export {
                Some(path) => {
                    let path = export_path(path, "statistics");
                    export::write_csv(&path, &stats)?;
                    println!("Statistics written to {}.", path.display());
                }
                None => export::print_csv(&stats)?,
            }
        }
        Commands::Rankings {
            filter,
            by,
            metric,
            limit,
            export,
        } => {
            let (filter, _) = build_filter(&filter, &sorted.labels, &facts);
            if report_degenerate(&filter) {
                return Ok(());
            }
            let dimension = match by {
                RankBy::Individual => rankings::RankDimension::Individual,
                RankBy::Country => rankings::RankDimension::Country,
            };
            let rank_metric = match metric {
                OrderBy::TotalUsage => rankings::RankMetric::TotalUsage,
                OrderBy::AdoptionRate => rankings::RankMetric::AdoptionRate,
            };
            let rows = rankings::top_n(&facts, &filter, dimension, rank_metric, limit);

            if rows.is_empty() {
                println!("No groups in scope for this filter.");
                return Ok(());
            }
            for row in &rows {
                match by {
                    RankBy::Individual => println!(
                        "{}. {} ({}, {}) total usage {}",
                        row.position,
                        row.key,
                        row.country.as_deref().unwrap_or("-"),
                        row.org_unit.as_deref().unwrap_or("-"),
                        row.total_usage
                    ),
                    RankBy::Country => println!(
                        "{}. {}: total usage {}, {}/{} active ({:.1}%)",
                        row.position,
                        row.key,
                        row.total_usage,
                        row.active,
                        row.eligible,
                        row.adoption_rate
                    ),
                }
            }
            if let Some(path) = export {
                let path = export_path(path, "rankings");
                export::write_csv(&path, &rows)?;
                println!("Leaderboard written to {}.", path.display());
            }
        }
        Commands::Facts { filter, export } => {
            let (filter, _) = build_filter(&filter, &sorted.labels, &facts);
            if report_degenerate(&filter) {
                return Ok(());
            }
            let scoped: Vec<UsageFact> = metrics::restrict(&facts, &filter)
                .into_iter()
                .cloned()
                .collect();
            match export {
                Some(path) => {
                    let path = export_path(path, "facts");
                    export::write_csv(&path, &scoped)?;
                    println!("{} fact rows written to {}.", scoped.len(), path.display());
                }
                None => export::print_csv(&scoped)?,
            }
        }
        Commands::Report { filter, out } => {
            let (filter, label) = build_filter(&filter, &sorted.labels, &facts);
            if report_degenerate(&filter) {
                return Ok(());
            }
            let text = report::build_summary_text(&facts, &filter, &label);
            std::fs::write(&out, text)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Summarize { filter, api } => {
            let (filter, label) = build_filter(&filter, &sorted.labels, &facts);
            if report_degenerate(&filter) {
                return Ok(());
            }
            let text = report::build_summary_text(&facts, &filter, &label);
            let client = summarize::SummaryClient::new(summarize::SummaryConfig {
                base_url: api.base_url,
                api_key: api.api_key,
            });
            let reply = client.summarize(&text);
            println!("{reply}");
            if summarize::is_error_reply(&reply) {
                println!("Check the API key and connectivity, then retry.");
            }
        }
        Commands::Ask { filter, api, question } => {
            let (filter, label) = build_filter(&filter, &sorted.labels, &facts);
            if report_degenerate(&filter) {
                return Ok(());
            }
            let text = report::build_summary_text(&facts, &filter, &label);
            let client = summarize::SummaryClient::new(summarize::SummaryConfig {
                base_url: api.base_url,
                api_key: api.api_key,
            });
            let reply = client.ask(&text, &question);
            println!("{reply}");
            if summarize::is_error_reply(&reply) {
                println!("Check the API key and connectivity, then retry.");
            }
        }
    }

    Ok(())
}

fn build_filter(args: &FilterArgs, sorted: &[String], facts: &[UsageFact]) -> (FilterSpec, String) {
    let (policy, label) = match &args.months {
        Some(labels) => (
            months::PeriodPolicy::Explicit(labels.clone()),
            "explicit months".to_string(),
        ),
        None => (args.period.policy(), args.period.label().to_string()),
    };
    let selected_months = months::resolve(sorted, &policy);

    let countries = args
        .countries
        .clone()
        .unwrap_or_else(|| metrics::distinct_in_order(facts.iter().map(|f| f.country.as_str())));
    let org_units = args
        .org_units
        .clone()
        .unwrap_or_else(|| metrics::distinct_in_order(facts.iter().map(|f| f.org_unit.as_str())));

    (
        FilterSpec {
            months: selected_months,
            countries,
            org_units,
        },
        label,
    )
}

/// Degenerate filters are a defined state, distinct from a computed zero
/// result: report them and skip the computation entirely.
fn report_degenerate(filter: &FilterSpec) -> bool {
    if !filter.is_degenerate() {
        return false;
    }
    if filter.months.is_empty() {
        println!("No months fall inside the selected period; nothing to compute.");
        println!("Pick a different --period or pass explicit --months.");
    } else {
        println!("No countries or org units selected; nothing to compute.");
    }
    true
}

fn export_path(requested: PathBuf, stem: &str) -> PathBuf {
    if requested.as_os_str().is_empty() {
        PathBuf::from(export::dated_file_name(stem))
    } else {
        requested
    }
}

fn print_metrics(computed: &Metrics, with_heatmap: bool) {
    println!("Eligible professionals: {}", computed.eligible);
    println!("Active users: {}", computed.active);
    println!("Cumulative adoption rate: {:.1}%", computed.cumulative_rate);
    println!("Average monthly adoption rate: {:.1}%", computed.average_rate);

    println!();
    println!("Adoption by month:");
    for month in &computed.monthly {
        println!(
            "- {}: {}/{} active ({:.1}%)",
            month.month, month.active, month.eligible, month.rate
        );
    }

    println!();
    println!("Adoption by country:");
    for entry in &computed.by_country {
        println!(
            "- {}: {}/{} active ({:.1}%)",
            entry.value, entry.active, entry.eligible, entry.rate
        );
    }

    println!();
    println!("Adoption by org unit:");
    for entry in &computed.by_org_unit {
        println!(
            "- {}: {}/{} active ({:.1}%)",
            entry.value, entry.active, entry.eligible, entry.rate
        );
    }

    if with_heatmap {
        println!();
        println!("Country x org unit:");
        for cell in &computed.heatmap {
            println!(
                "- {} / {}: {}/{} active ({:.1}%)",
                cell.country, cell.org_unit, cell.active, cell.eligible, cell.rate
            );
        }
    }

    println!();
    println!("Total usage: {}", computed.total_usage);
    println!("Mean usage per professional: {:.2}", computed.mean_usage);
    println!("Std dev of per-professional usage: {:.2}", computed.usage_std_dev);
}
