//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.liftstats.toml` files.

use crate::filter::{selection, FilterSet};
use crate::normalize::{CountryAliases, DEFAULT_COUNTRY_ALIASES};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".liftstats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Fixture locations and loading limits.
    #[serde(default)]
    pub data: DataConfig,

    /// Default filter selections.
    #[serde(default)]
    pub filters: FilterConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Dataset country spellings mapped to canonical names. Entries are
    /// added on top of the built-in table; a listed spelling overrides it.
    #[serde(default = "default_country_aliases")]
    pub country_aliases: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            filters: FilterConfig::default(),
            report: ReportConfig::default(),
            country_aliases: default_country_aliases(),
        }
    }
}

fn default_country_aliases() -> BTreeMap<String, String> {
    DEFAULT_COUNTRY_ALIASES
        .iter()
        .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
        .collect()
}

/// Fixture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Dataset file, directory or URL.
    #[serde(default)]
    pub source: Option<String>,

    /// Extra alias table (JSON object).
    #[serde(default)]
    pub aliases: Option<String>,

    /// Comparison tag table (JSON object).
    #[serde(default)]
    pub tags: Option<String>,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum directory depth searched for dataset files.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: None,
            aliases: None,
            tags: None,
            timeout_seconds: default_timeout(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_timeout() -> u64 {
    60
}

fn default_max_depth() -> usize {
    4
}

/// Default drop-down selections. `"all"` imposes no constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_all")]
    pub sex: String,
    #[serde(default = "default_all")]
    pub tested: String,
    #[serde(default = "default_all")]
    pub equipment: String,
    #[serde(default = "default_all")]
    pub event: String,
    #[serde(default = "default_all")]
    pub country: String,
    #[serde(default = "default_all")]
    pub federation: String,
    #[serde(default = "default_all")]
    pub division: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sex: default_all(),
            tested: default_all(),
            equipment: default_all(),
            event: default_all(),
            country: default_all(),
            federation: default_all(),
            division: default_all(),
        }
    }
}

fn default_all() -> String {
    "all".to_string()
}

impl FilterConfig {
    pub fn to_filter_set(&self) -> Result<FilterSet> {
        FilterSet::from_selections(
            &self.sex,
            &self.tested,
            &self.equipment,
            &self.event,
            &self.country,
            &self.federation,
            &self.division,
        )
        .map_err(|e| anyhow!(e))
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of federations listed by the federations view.
    #[serde(default = "default_top_federations")]
    pub top_federations: usize,

    /// Gradient stops listed under the map legend.
    #[serde(default = "default_legend_steps")]
    pub legend_steps: usize,

    /// Include per-row validation issues in the report.
    #[serde(default = "default_true")]
    pub include_row_issues: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_federations: default_top_federations(),
            legend_steps: default_legend_steps(),
            include_row_issues: true,
        }
    }
}

fn default_top_federations() -> usize {
    20
}

fn default_legend_steps() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .filters
            .to_filter_set()
            .with_context(|| format!("Invalid [filters] in {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.data.source = Some(data.clone());
        }
        if let Some(ref aliases) = args.aliases {
            self.data.aliases = Some(aliases.clone());
        }
        if let Some(ref tags) = args.tags {
            self.data.tags = Some(tags.clone());
        }

        let overrides = [
            (&args.sex, &mut self.filters.sex),
            (&args.tested, &mut self.filters.tested),
            (&args.equipment, &mut self.filters.equipment),
            (&args.event, &mut self.filters.event),
            (&args.country, &mut self.filters.country),
            (&args.federation, &mut self.filters.federation),
            (&args.division, &mut self.filters.division),
        ];
        for (arg, slot) in overrides {
            if let Some(value) = arg {
                *slot = value.clone();
            }
        }

        if let Some(top) = args.top {
            self.report.top_federations = top;
        }
    }

    /// The built-in alias table extended with `[country_aliases]`.
    pub fn alias_table(&self) -> CountryAliases {
        let mut aliases = CountryAliases::default();
        aliases.extend(self.country_aliases.clone());
        aliases
    }

    /// Country drilled into by the detail view, from `--country` or
    /// `[filters] country`.
    pub fn detail_country(&self) -> Option<String> {
        selection(&self.filters.country)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sex;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.report.top_federations, 20);
        assert_eq!(config.filters.sex, "all");
        assert_eq!(
            config.country_aliases.get("USSR").map(String::as_str),
            Some("Russia")
        );
        assert!(config.filters.to_filter_set().unwrap().is_unconstrained());
        assert_eq!(config.detail_country(), None);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[data]
source = "data/openpowerlifting_subset.csv"
timeout_seconds = 5

[filters]
sex = "F"
tested = "Yes"

[report]
top_federations = 5

[country_aliases]
"Great Britain" = "United Kingdom"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(
            config.data.source.as_deref(),
            Some("data/openpowerlifting_subset.csv")
        );
        assert_eq!(config.data.timeout_seconds, 5);
        assert_eq!(config.data.max_depth, 4);
        assert_eq!(config.report.top_federations, 5);
        assert_eq!(config.country_aliases.len(), 1);

        let aliases = config.alias_table();
        assert_eq!(
            aliases.normalize("Great Britain").as_deref(),
            Some("United Kingdom")
        );

        let filters = config.filters.to_filter_set().unwrap();
        assert_eq!(filters.sex, Some(Sex::F));
        assert!(filters.equipment.is_none());
    }

    #[test]
    fn test_config_aliases_extend_builtin_table() {
        let config: Config = toml::from_str(
            r#"
[country_aliases]
"Great Britain" = "United Kingdom"
"Czechia" = "Czechia"
"#,
        )
        .unwrap();

        let aliases = config.alias_table();
        assert_eq!(aliases.normalize("USSR").as_deref(), Some("Russia"));
        assert_eq!(
            aliases.normalize("Great Britain").as_deref(),
            Some("United Kingdom")
        );
        // A listed spelling overrides the built-in entry.
        assert_eq!(aliases.normalize("Czechia").as_deref(), Some("Czechia"));
        assert_eq!(aliases.len(), CountryAliases::default().len() + 1);
    }

    #[test]
    fn test_invalid_filter_selection_rejected() {
        let config: Config = toml::from_str("[filters]\nsex = \"male\"\n").unwrap();
        assert!(config.filters.to_filter_set().is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[filters]\ntested = \"No\"\n").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_detail_country_from_config() {
        let mut config: Config =
            toml::from_str("[filters]\ncountry = \"Norway\"\n").unwrap();
        assert_eq!(config.detail_country().as_deref(), Some("Norway"));

        let args = crate::cli::Args::parse_from(["liftstats", "--country", "USSR"]);
        config.merge_with_args(&args);
        assert_eq!(config.detail_country().as_deref(), Some("USSR"));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[filters]"));
        assert!(toml_str.contains("[country_aliases]"));

        let round: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(round.country_aliases, Config::default().country_aliases);
    }
}
