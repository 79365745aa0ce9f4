//! Fixture loading.
//!
//! This module resolves dataset sources (a file, a directory of fixtures or
//! an HTTP(S) URL), fetches them and parses CSV or JSON rows. Loading is the
//! only asynchronous step; it completes before any aggregation runs.

use crate::analysis::ComparisonTags;
use crate::error::LoadError;
use crate::models::RawRow;
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Configuration for fixture loading.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// HTTP request timeout.
    pub timeout_seconds: u64,
    /// Maximum directory depth searched for dataset files.
    pub max_depth: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            max_depth: 4,
        }
    }
}

impl From<&crate::config::DataConfig> for LoadConfig {
    fn from(config: &crate::config::DataConfig) -> Self {
        Self {
            timeout_seconds: config.timeout_seconds,
            max_depth: config.max_depth,
        }
    }
}

/// Where a fixture comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Path(PathBuf),
    Url(String),
}

impl DataSource {
    /// `http://` and `https://` strings are URLs, anything else a path.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            DataSource::Url(raw.to_string())
        } else {
            DataSource::Path(PathBuf::from(raw))
        }
    }

    /// Human readable origin for log and error messages.
    pub fn origin(&self) -> String {
        match self {
            DataSource::Path(p) => p.display().to_string(),
            DataSource::Url(u) => u.clone(),
        }
    }
}

/// Tabular fixture encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureFormat {
    Csv,
    Json,
}

impl FixtureFormat {
    /// Detect from the file extension of a path or URL (query string ignored).
    pub fn detect(name: &str) -> Option<Self> {
        let name = name.split(['?', '#']).next().unwrap_or(name);
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())?;
        match ext.as_str() {
            "csv" => Some(FixtureFormat::Csv),
            "json" => Some(FixtureFormat::Json),
            _ => None,
        }
    }
}

/// Parse rows from fixture bytes.
pub fn parse_rows(bytes: &[u8], format: FixtureFormat, origin: &str) -> Result<Vec<RawRow>, LoadError> {
    match format {
        FixtureFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::Headers)
                .flexible(true)
                .from_reader(bytes);
            reader
                .deserialize::<RawRow>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| LoadError::Csv {
                    origin: origin.to_string(),
                    source,
                })
        }
        FixtureFormat::Json => serde_json::from_slice(bytes).map_err(|source| LoadError::Json {
            origin: origin.to_string(),
            source,
        }),
    }
}

/// Fixture loader.
pub struct FixtureLoader {
    config: LoadConfig,
    client: reqwest::Client,
}

impl FixtureLoader {
    /// Create a loader with its HTTP client.
    pub fn new(config: LoadConfig) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|source| LoadError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self { config, client })
    }

    /// Fetch raw bytes from a file or URL.
    pub async fn fetch(&self, source: &DataSource) -> Result<Vec<u8>, LoadError> {
        match source {
            DataSource::Path(path) => {
                debug!("Reading {}", path.display());
                tokio::fs::read(path).await.map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })
            }
            DataSource::Url(url) => {
                debug!("Fetching {}", url);
                let http = |source| LoadError::Http {
                    url: url.clone(),
                    source,
                };
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(http)?;
                let bytes = response.bytes().await.map_err(http)?;
                Ok(bytes.to_vec())
            }
        }
    }

    /// Dataset files under `dir`, sorted by path.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .max_depth(self.config.max_depth)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
        {
            let entry = entry.map_err(|e| LoadError::Io {
                path: dir.to_path_buf(),
                source: e.into(),
            })?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path
                    .to_str()
                    .and_then(FixtureFormat::detect)
                    .is_some()
            {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Load every row of a dataset source. Directories are expanded into
    /// their dataset files, fetched concurrently and concatenated in path
    /// order.
    pub async fn load_rows(&self, source: &DataSource) -> Result<Vec<RawRow>, LoadError> {
        if let DataSource::Path(dir) = source {
            if dir.is_dir() {
                let files = self.discover(dir)?;
                if files.is_empty() {
                    return Err(LoadError::NoFixtures(dir.clone()));
                }
                info!("Found {} dataset files in {}", files.len(), dir.display());

                let batches = try_join_all(
                    files
                        .into_iter()
                        .map(|f| async move { self.load_file(&DataSource::Path(f)).await }),
                )
                .await?;
                return Ok(batches.into_iter().flatten().collect());
            }
        }

        self.load_file(source).await
    }

    async fn load_file(&self, source: &DataSource) -> Result<Vec<RawRow>, LoadError> {
        let origin = source.origin();
        let format =
            FixtureFormat::detect(&origin).ok_or_else(|| LoadError::UnsupportedFormat(origin.clone()))?;
        let bytes = self.fetch(source).await?;
        let rows = parse_rows(&bytes, format, &origin)?;
        debug!("Parsed {} rows from {}", rows.len(), origin);
        Ok(rows)
    }

    /// Load a JSON alias table (`{"raw name": "canonical name"}`).
    pub async fn load_aliases(&self, source: &DataSource) -> Result<BTreeMap<String, String>, LoadError> {
        let bytes = self.fetch(source).await?;
        serde_json::from_slice(&bytes).map_err(|source_err| LoadError::Json {
            origin: source.origin(),
            source: source_err,
        })
    }

    /// Load a JSON comparison tag table (`{"tag": ["Column", "value"]}`).
    pub async fn load_tags(&self, source: &DataSource) -> Result<ComparisonTags, LoadError> {
        let bytes = self.fetch(source).await?;
        serde_json::from_slice(&bytes).map_err(|source_err| LoadError::Json {
            origin: source.origin(),
            source: source_err,
        })
    }

    /// Load the dataset and the optional auxiliary tables concurrently.
    pub async fn load_all(
        &self,
        dataset: &DataSource,
        aliases: Option<&DataSource>,
        tags: Option<&DataSource>,
    ) -> Result<Fixtures, LoadError> {
        let alias_fut = async {
            match aliases {
                Some(src) => self.load_aliases(src).await.map(Some),
                None => Ok(None),
            }
        };
        let tags_fut = async {
            match tags {
                Some(src) => self.load_tags(src).await.map(Some),
                None => Ok(None),
            }
        };

        let (rows, aliases, tags) = futures::try_join!(self.load_rows(dataset), alias_fut, tags_fut)?;

        Ok(Fixtures {
            rows,
            aliases,
            tags,
        })
    }
}

/// Everything fetched at startup.
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub rows: Vec<RawRow>,
    pub aliases: Option<BTreeMap<String, String>>,
    pub tags: Option<ComparisonTags>,
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}
