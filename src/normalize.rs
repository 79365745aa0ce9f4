//! Record normalization.
//!
//! Turns raw tabular rows into [`LiftRecord`]s: country alias resolution,
//! tested-status collapsing, numeric parsing and the dedup key.

use crate::models::{LiftRecord, RawRow, RowIssue, Sex, TestedStatus};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Dataset spellings mapped to the names used by the world map geometry.
pub const DEFAULT_COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("Bahamas", "The Bahamas"),
    ("Czechia", "Czech Republic"),
    ("Czechoslovakia", "Czech Republic"),
    ("Eswatini", "Swaziland"),
    ("Serbia and Montenegro", "Republic of Serbia"),
    ("Tanzania", "United Republic of Tanzania"),
    ("The Gambia", "Gambia"),
    ("UAE", "United Arab Emirates"),
    ("USSR", "Russia"),
    ("West Germany", "Germany"),
    ("North Macedonia", "Macedonia"),
    ("Guinea-Bissau", "Guinea Bissau"),
    ("Congo", "Republic of the Congo"),
];

/// Country alias table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryAliases {
    map: HashMap<String, String>,
}

impl Default for CountryAliases {
    fn default() -> Self {
        Self::from_pairs(
            DEFAULT_COUNTRY_ALIASES
                .iter()
                .map(|(raw, canonical)| (raw.to_string(), canonical.to_string())),
        )
    }
}

impl CountryAliases {
    /// An empty table: every name passes through trimmed.
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            map: pairs.into_iter().collect(),
        }
    }

    /// Add or override entries. Later entries win.
    pub fn extend(&mut self, pairs: impl IntoIterator<Item = (String, String)>) {
        self.map.extend(pairs);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Canonical name for a raw country string, `None` when blank.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(
            self.map
                .get(trimmed)
                .cloned()
                .unwrap_or_else(|| trimmed.to_string()),
        )
    }
}

/// Outcome of normalizing a batch of rows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    #[serde(skip)]
    pub records: Vec<LiftRecord>,
    pub issues: Vec<RowIssue>,
    /// Records whose country could not be resolved.
    pub without_country: usize,
}

/// Parse a numeric column. Empty is absent (NaN, no issue); anything else
/// that fails to parse is NaN with `Err` carrying the raw value.
pub fn parse_numeric(raw: &str) -> Result<f64, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(f64::NAN);
    }
    trimmed.parse::<f64>().map_err(|_| raw.to_string())
}

fn optional(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn key_number(value: f64) -> String {
    if value.is_finite() {
        format!("{:.1}", value)
    } else {
        "na".to_string()
    }
}

/// Composite key approximating "same athlete, same lift".
///
/// The dataset has no athlete identifier, so two distinct athletes with the
/// same rounded attributes collapse into one counted entity.
#[allow(clippy::too_many_arguments)]
pub fn dedup_key(
    country: Option<&str>,
    sex: Sex,
    tested: TestedStatus,
    equipment: &str,
    event: &str,
    dots: f64,
    total_kg: f64,
    bodyweight_kg: f64,
    age: f64,
) -> String {
    let text = |s: &str| if s.is_empty() { "na".to_string() } else { s.to_string() };
    [
        country.map(str::to_string).unwrap_or_else(|| "na".to_string()),
        sex.as_str().to_string(),
        tested.as_str().to_string(),
        text(equipment),
        text(event),
        key_number(dots),
        key_number(total_kg),
        key_number(bodyweight_kg),
        key_number(age),
    ]
    .join("|")
}

/// Normalize one row. Per-column parse failures are appended to `issues`.
pub fn normalize_row(
    index: usize,
    row: &RawRow,
    aliases: &CountryAliases,
    issues: &mut Vec<RowIssue>,
) -> LiftRecord {
    let mut number = |column: &'static str, raw: &str| match parse_numeric(raw) {
        Ok(v) => v,
        Err(value) => {
            issues.push(RowIssue {
                row: index,
                column,
                value,
            });
            f64::NAN
        }
    };

    let dots = number("Dots", &row.dots);
    let total_kg = number("TotalKg", &row.total_kg);
    let age = number("Age", &row.age);
    let bodyweight_kg = number("BodyweightKg", &row.bodyweight_kg);
    let best_squat_kg = number("Best3SquatKg", &row.best_squat_kg);
    let best_bench_kg = number("Best3BenchKg", &row.best_bench_kg);
    let best_deadlift_kg = number("Best3DeadliftKg", &row.best_deadlift_kg);

    let date = match row.date.trim() {
        "" => None,
        raw => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                issues.push(RowIssue {
                    row: index,
                    column: "Date",
                    value: row.date.clone(),
                });
                None
            }
        },
    };

    let sex = Sex::parse(&row.sex);
    let tested = TestedStatus::parse(&row.tested);
    let country = aliases.normalize(&row.country);
    let equipment = row.equipment.trim().to_string();
    let event = row.event.trim().to_string();

    let dedup_key = dedup_key(
        country.as_deref(),
        sex,
        tested,
        &equipment,
        &event,
        dots,
        total_kg,
        bodyweight_kg,
        age,
    );

    LiftRecord {
        sex,
        tested,
        country,
        country_code: optional(&row.country_code),
        state: optional(&row.state),
        dots,
        total_kg,
        age,
        bodyweight_kg,
        best_squat_kg,
        best_bench_kg,
        best_deadlift_kg,
        equipment,
        event,
        federation: optional(&row.federation),
        division: optional(&row.division),
        weight_class_kg: optional(&row.weight_class_kg),
        name: optional(&row.name),
        date,
        dedup_key,
    }
}

/// Normalize a batch of rows into records, collecting row issues.
pub fn ingest(rows: &[RawRow], aliases: &CountryAliases) -> IngestReport {
    let mut report = IngestReport::default();
    report.records.reserve(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let record = normalize_row(index, row, aliases, &mut report.issues);
        if record.country.is_none() {
            report.without_country += 1;
        }
        report.records.push(record);
    }

    if !report.issues.is_empty() {
        warn!(
            "{} unparseable values in {} rows (treated as missing)",
            report.issues.len(),
            rows.len()
        );
        for issue in &report.issues {
            debug!("{}", issue);
        }
    }

    report
}
