//! Bar-bell comparison of two tag-defined groups.
//!
//! Each tag names a `(column, value)` constraint. A group is the
//! conjunction of its tags' constraints; the chart compares the best squat,
//! bench and deadlift of the two groups.

use crate::error::CompareError;
use crate::models::{BarbellComparison, LiftMaxima, LiftRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One tag's constraint: the record column and the value it must equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagConstraint(pub String, pub String);

/// Tag name to constraint table, as stored in the comparison filter fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComparisonTags {
    tags: BTreeMap<String, TagConstraint>,
}

impl ComparisonTags {
    /// Built-in tags covering the sex, tested and equipment columns.
    pub fn builtin() -> Self {
        let pairs = [
            ("male", "Sex", "M"),
            ("female", "Sex", "F"),
            ("tested", "Tested", "Yes"),
            ("untested", "Tested", "Unknown"),
            ("raw", "Equipment", "Raw"),
            ("wraps", "Equipment", "Wraps"),
            ("single-ply", "Equipment", "Single-ply"),
            ("multi-ply", "Equipment", "Multi-ply"),
            ("full power", "Event", "SBD"),
            ("bench only", "Event", "B"),
        ];
        Self {
            tags: pairs
                .into_iter()
                .map(|(tag, column, value)| {
                    (
                        tag.to_string(),
                        TagConstraint(column.to_string(), value.to_string()),
                    )
                })
                .collect(),
        }
    }

    pub fn get(&self, tag: &str) -> Option<&TagConstraint> {
        self.tags.get(tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Add or replace tags.
    pub fn extend(&mut self, other: ComparisonTags) {
        self.tags.extend(other.tags);
    }

    /// Tags starting with `query` (case-insensitive) that are not selected yet.
    pub fn suggest<'a>(&'a self, query: &str, selected: &[String]) -> Vec<&'a str> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.tags
            .keys()
            .filter(|tag| tag.to_lowercase().starts_with(&query))
            .filter(|tag| !selected.contains(tag))
            .map(String::as_str)
            .collect()
    }

    /// Resolve tags into column constraints. A later tag on the same column
    /// replaces the earlier one.
    pub fn resolve(&self, tags: &[String]) -> Result<BTreeMap<String, String>, CompareError> {
        let mut constraints = BTreeMap::new();
        for tag in tags {
            let TagConstraint(column, value) = self
                .get(tag)
                .ok_or_else(|| CompareError::UnknownTag(tag.clone()))?;
            constraints.insert(column.clone(), value.clone());
        }
        Ok(constraints)
    }
}

fn matches(record: &LiftRecord, constraints: &BTreeMap<String, String>) -> bool {
    constraints
        .iter()
        .all(|(column, value)| record.field(column) == Some(value.as_str()))
}

/// Largest finite value. NaN when no value is finite.
fn best(values: impl Iterator<Item = f64>) -> f64 {
    values
        .filter(|v| v.is_finite())
        .fold(f64::NAN, |acc, v| if acc.is_nan() || v > acc { v } else { acc })
}

/// Best lifts of the records matching `tags`.
///
/// All three maxima are 0 when nothing matches.
pub fn lift_maxima(
    records: &[LiftRecord],
    table: &ComparisonTags,
    group: &str,
    tags: &[String],
) -> Result<LiftMaxima, CompareError> {
    let constraints = table.resolve(tags)?;
    let matched: Vec<&LiftRecord> = records.iter().filter(|r| matches(r, &constraints)).collect();

    let (best_squat, best_bench, best_deadlift) = if matched.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        (
            best(matched.iter().map(|r| r.best_squat_kg)),
            best(matched.iter().map(|r| r.best_bench_kg)),
            best(matched.iter().map(|r| r.best_deadlift_kg)),
        )
    };

    Ok(LiftMaxima {
        group: group.to_string(),
        tags: tags.to_vec(),
        matched: matched.len(),
        best_squat,
        best_bench,
        best_deadlift,
    })
}

/// Compare the blue and red tag groups.
pub fn barbell_comparison(
    records: &[LiftRecord],
    table: &ComparisonTags,
    blue: &[String],
    red: &[String],
) -> Result<BarbellComparison, CompareError> {
    Ok(BarbellComparison {
        blue: lift_maxima(records, table, "blue group", blue)?,
        red: lift_maxima(records, table, "red group", red)?,
    })
}
