//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::filter::{check_choice, Dimension, SEX_CHOICES, TESTED_CHOICES};
use crate::models::{Metric, NumericField, TrendCategory};
use clap::Parser;
use std::path::PathBuf;

/// liftstats - aggregation engine for powerlifting competition charts
///
/// Loads an OpenPowerlifting-style dataset and prints the numbers behind
/// the choropleth map, box plots, bar-bell comparison and trend chart.
///
/// Examples:
///   liftstats --data data/openpowerlifting.csv
///   liftstats --data data/ --view detail --country Norway
///   liftstats --data data/ --view box-plot --group-by equipment --field total
///   liftstats --data data/ --view barbell --blue male,raw --red female,raw
///   liftstats --data https://example.org/opl.json --view trend --format json
///   liftstats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Dataset file, directory or HTTP(S) URL (CSV or JSON)
    ///
    /// Can also be set in the [data] section of .liftstats.toml.
    #[arg(short, long, value_name = "SOURCE", env = "LIFTSTATS_DATA")]
    pub data: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .liftstats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Extra country alias table (JSON object of raw name to canonical name)
    #[arg(long, value_name = "SOURCE")]
    pub aliases: Option<String>,

    /// Comparison tag table (JSON object of tag to [column, value])
    #[arg(long, value_name = "SOURCE")]
    pub tags: Option<String>,

    /// Chart to compute
    #[arg(long, default_value = "map", value_name = "VIEW")]
    pub view: View,

    /// Sex filter (M, F or all)
    #[arg(long, value_name = "SEX")]
    pub sex: Option<String>,

    /// Tested filter (Yes, Unknown or all)
    #[arg(long, value_name = "STATUS")]
    pub tested: Option<String>,

    /// Equipment filter (e.g. Raw, Wraps, Single-ply or all)
    #[arg(long, value_name = "EQUIPMENT")]
    pub equipment: Option<String>,

    /// Event filter (e.g. SBD, B or all)
    #[arg(long, value_name = "EVENT")]
    pub event: Option<String>,

    /// Country filter, or the country to drill into with --view detail
    ///
    /// The detail view falls back to [filters] country from the config file.
    #[arg(long, value_name = "COUNTRY")]
    pub country: Option<String>,

    /// Federation filter (e.g. IPF or all)
    #[arg(long, value_name = "FEDERATION")]
    pub federation: Option<String>,

    /// Division filter (e.g. Open, Juniors or all)
    #[arg(long, value_name = "DIVISION")]
    pub division: Option<String>,

    /// Map coloring metric
    #[arg(long, default_value = "median-dots", value_name = "METRIC")]
    pub metric: Metric,

    /// Grouping axis of the box plot
    #[arg(long, default_value = "equipment", value_name = "DIMENSION")]
    pub group_by: Dimension,

    /// Numeric field summarized by the box plot
    #[arg(long, default_value = "dots", value_name = "FIELD")]
    pub field: NumericField,

    /// Blue comparison group tags (comma-separated)
    #[arg(long, value_name = "TAGS", value_delimiter = ',', default_value = "male")]
    pub blue: Vec<String>,

    /// Red comparison group tags (comma-separated)
    #[arg(long, value_name = "TAGS", value_delimiter = ',', default_value = "female")]
    pub red: Vec<String>,

    /// Trend chart category
    #[arg(long, default_value = "total", value_name = "CATEGORY")]
    pub category: TrendCategory,

    /// First year of the trend window (inclusive)
    #[arg(long, value_name = "YEAR")]
    pub from_year: Option<i32>,

    /// Last year of the trend window (inclusive)
    #[arg(long, value_name = "YEAR")]
    pub to_year: Option<i32>,

    /// Number of federations listed by --view federations
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Output file path; prints to stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .liftstats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Chart whose numbers are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum View {
    /// Per-country aggregates with color domain and legend (default)
    #[default]
    Map,
    /// One country's aggregate with sex and tested splits
    Detail,
    /// Cross-tabulated box plot
    BoxPlot,
    /// Best lifts of two tag-defined groups
    Barbell,
    /// Best result per year, male and female
    Trend,
    /// Federations by record count
    Federations,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref sex) = self.sex {
            check_choice("--sex", sex, SEX_CHOICES)?;
        }
        if let Some(ref tested) = self.tested {
            check_choice("--tested", tested, TESTED_CHOICES)?;
        }

        if self.view == View::Barbell {
            let empty = |tags: &[String]| tags.iter().all(|t| t.trim().is_empty());
            if empty(&self.blue) || empty(&self.red) {
                return Err("Both --blue and --red need at least one tag".to_string());
            }
        }

        if let (Some(from), Some(to)) = (self.from_year, self.to_year) {
            if from > to {
                return Err(format!(
                    "--from-year ({}) must not be after --to-year ({})",
                    from, to
                ));
            }
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Comparison tags with surrounding whitespace and empty entries removed.
    pub fn tag_list(tags: &[String]) -> Vec<String> {
        tags.iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args::parse_from(["liftstats", "--data", "data/opl.csv"])
    }

    #[test]
    fn test_defaults() {
        let args = make_args();
        assert_eq!(args.view, View::Map);
        assert_eq!(args.metric, Metric::MedianDots);
        assert_eq!(args.group_by, Dimension::Equipment);
        assert_eq!(args.blue, vec!["male".to_string()]);
        assert_eq!(args.red, vec!["female".to_string()]);
        assert_eq!(args.format, OutputFormat::Markdown);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_comma_separated_tags() {
        let args = Args::parse_from([
            "liftstats",
            "--data",
            "opl.csv",
            "--view",
            "barbell",
            "--blue",
            "male, raw",
            "--red",
            "female,raw",
        ]);
        assert_eq!(Args::tag_list(&args.blue), vec!["male", "raw"]);
        assert_eq!(args.red.len(), 2);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_filter_choices() {
        let mut args = make_args();
        args.sex = Some("male".to_string());
        assert!(args.validate().is_err());

        args.sex = Some("F".to_string());
        args.tested = Some("no".to_string());
        assert!(args.validate().is_err());

        args.tested = Some("all".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_division_filter_flag() {
        let args = Args::parse_from([
            "liftstats",
            "--view",
            "trend",
            "--division",
            "Open",
        ]);
        assert_eq!(args.division.as_deref(), Some("Open"));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_year_window() {
        let mut args = make_args();
        args.from_year = Some(2010);
        args.to_year = Some(2000);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
