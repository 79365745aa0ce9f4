//! liftstats - powerlifting chart aggregation CLI
//!
//! Loads a competition results dataset and prints the numbers behind the
//! selected chart as a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, config, dataset load failure, etc.)

use anyhow::{bail, Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use liftstats::analysis::{
    aggregate_domain, barbell_comparison, box_plot, country_aggregates, country_detail,
    legend_summary, top_federations, trend_series, ComparisonTags,
};
use liftstats::cli::{Args, OutputFormat, View};
use liftstats::config::{Config, CONFIG_FILE};
use liftstats::filter::FilterSet;
use liftstats::loader::{DataSource, FixtureLoader, LoadConfig};
use liftstats::models::{
    BoxPlotView, DetailView, FederationsView, LiftRecord, MapView, Report, ReportMetadata,
    TrendView, ViewResult,
};
use liftstats::normalize::{ingest, CountryAliases};
use liftstats::report;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("liftstats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .liftstats.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the dataset, default filters and country aliases.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

fn spinner(args: &Args, message: String) -> Option<ProgressBar> {
    if args.quiet {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    Some(bar)
}

/// Load, normalize, compute the selected view and write the report.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let Some(source) = config.data.source.clone() else {
        bail!("No dataset given. Pass --data or set [data] source in {}", CONFIG_FILE);
    };

    let dataset = DataSource::parse(&source);
    let alias_source = config.data.aliases.as_deref().map(DataSource::parse);
    let tag_source = config.data.tags.as_deref().map(DataSource::parse);

    // Step 1: Fetch fixtures
    let loader = FixtureLoader::new(LoadConfig::from(&config.data))?;
    let progress = spinner(&args, format!("Loading {}", dataset.origin()));
    let loaded = loader
        .load_all(&dataset, alias_source.as_ref(), tag_source.as_ref())
        .await;
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }
    let fixtures = loaded.with_context(|| format!("Failed to load dataset {}", dataset.origin()))?;
    info!("Loaded {} rows from {}", fixtures.rows.len(), dataset.origin());

    // Step 2: Normalize
    let mut aliases = config.alias_table();
    if let Some(extra) = fixtures.aliases {
        info!("Applying {} extra country aliases", extra.len());
        aliases.extend(extra);
    }

    let mut tags = ComparisonTags::builtin();
    if let Some(extra) = fixtures.tags {
        info!("Loaded {} comparison tags", extra.len());
        tags.extend(extra);
    }

    let ingested = ingest(&fixtures.rows, &aliases);
    let records = ingested.records;
    if ingested.without_country > 0 {
        debug!(
            "{} records have no resolvable country",
            ingested.without_country
        );
    }

    let mut filters = config.filters.to_filter_set()?;
    filters.country = filters.country.as_deref().and_then(|c| aliases.normalize(c));

    // Step 3: Compute the selected view
    let view = compute_view(&args, &config, &records, &filters, &aliases, &tags)?;

    let metadata = ReportMetadata {
        source: dataset.origin(),
        generated_at: Utc::now(),
        records_loaded: records.len(),
        records_without_country: ingested.without_country,
        row_issues: ingested.issues.len(),
        filters,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let report = Report {
        metadata,
        view,
        issues: if config.report.include_row_issues {
            ingested.issues
        } else {
            Vec::new()
        },
    };

    // Step 4: Render and write
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    match args.output {
        Some(ref path) => {
            report::write_report(&output, path)?;
            if !args.quiet {
                eprintln!("✅ Report saved to: {}", path.display());
            }
        }
        None => println!("{}", output),
    }

    Ok(())
}

fn compute_view(
    args: &Args,
    config: &Config,
    records: &[LiftRecord],
    filters: &FilterSet,
    aliases: &CountryAliases,
    tags: &ComparisonTags,
) -> Result<ViewResult> {
    let view = match args.view {
        View::Map => {
            let aggregates = country_aggregates(records, filters);
            info!("Aggregated {} countries", aggregates.len());
            let domain = aggregate_domain(&aggregates, args.metric);
            ViewResult::Map(MapView {
                metric: args.metric,
                legend: legend_summary(&aggregates, args.metric),
                stops: domain
                    .map(|d| d.stops(config.report.legend_steps))
                    .unwrap_or_default(),
                domain,
                countries: aggregates.as_slice().to_vec(),
            })
        }
        View::Detail => {
            let Some(country) = config.detail_country() else {
                bail!(
                    "--view detail needs a country. Pass --country or set [filters] country in {}",
                    CONFIG_FILE
                );
            };
            let mut scope = filters.clone();
            scope.country = None;
            let result = country_detail(records, &scope, &country, aliases);
            if result.is_none() {
                warn!("No records for country {:?} under the current filters", country);
            }
            ViewResult::Detail(DetailView { country, result })
        }
        View::BoxPlot => ViewResult::BoxPlot(BoxPlotView {
            dimension: args.group_by,
            field: args.field,
            groups: box_plot(records, filters, args.group_by, args.field),
        }),
        View::Barbell => {
            let blue = Args::tag_list(&args.blue);
            let red = Args::tag_list(&args.red);
            match barbell_comparison(records, tags, &blue, &red) {
                Ok(comparison) => ViewResult::Barbell(comparison),
                Err(e) => {
                    let query = blue.iter().chain(red.iter()).find(|t| tags.get(t).is_none());
                    if let Some(unknown) = query {
                        let suggestions = tags.suggest(unknown, &[]);
                        if !suggestions.is_empty() {
                            eprintln!("   Did you mean: {}?", suggestions.join(", "));
                        }
                    }
                    return Err(e.into());
                }
            }
        }
        View::Trend => {
            let series = trend_series(records, filters, args.category)
                .window(args.from_year, args.to_year);
            ViewResult::Trend(TrendView {
                from_year: args.from_year,
                to_year: args.to_year,
                peak: series.peak(),
                series,
            })
        }
        View::Federations => {
            let top = config.report.top_federations;
            ViewResult::Federations(FederationsView {
                top,
                federations: top_federations(records, filters, top),
            })
        }
    };

    Ok(view)
}
