//! Record filtering.
//!
//! A [`FilterSet`] is a conjunction over independent dimensions. `None` on a
//! dimension means "all". One dimension can be excluded per call so that it
//! can serve as the grouping axis of a cross-tabulation.

use crate::models::{LiftRecord, Sex, TestedStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A filterable / groupable categorical dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Sex,
    Tested,
    Equipment,
    Event,
    Country,
    Federation,
    Division,
}

impl Dimension {
    /// Grouping key of a record along this dimension.
    pub fn key(&self, record: &LiftRecord) -> Option<String> {
        let text = |s: &str| {
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        };
        match self {
            Dimension::Sex => Some(record.sex.as_str().to_string()),
            Dimension::Tested => Some(record.tested.as_str().to_string()),
            Dimension::Equipment => text(&record.equipment),
            Dimension::Event => text(&record.event),
            Dimension::Country => record.country.clone(),
            Dimension::Federation => record.federation.clone(),
            Dimension::Division => record.division.clone(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::Sex => "sex",
            Dimension::Tested => "tested",
            Dimension::Equipment => "equipment",
            Dimension::Event => "event",
            Dimension::Country => "country",
            Dimension::Federation => "federation",
            Dimension::Division => "division",
        };
        write!(f, "{}", name)
    }
}

/// Active filter selections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    pub sex: Option<Sex>,
    pub tested: Option<TestedStatus>,
    pub equipment: Option<String>,
    pub event: Option<String>,
    pub country: Option<String>,
    pub federation: Option<String>,
    pub division: Option<String>,
}

/// Accepted `--sex` / `[filters] sex` values besides `"all"`.
pub const SEX_CHOICES: &[&str] = &["M", "F"];

/// Accepted `--tested` / `[filters] tested` values besides `"all"`.
pub const TESTED_CHOICES: &[&str] = &["Yes", "Unknown"];

/// Reject a selection that is neither `"all"` nor one of `choices`.
pub fn check_choice(name: &str, raw: &str, choices: &[&str]) -> Result<(), String> {
    match selection(raw) {
        Some(value) if !choices.contains(&value.as_str()) => Err(format!(
            "Invalid {} filter {:?}; expected one of: {}, all",
            name,
            value,
            choices.join(", ")
        )),
        _ => Ok(()),
    }
}

/// Parse a drop-down value; `"all"` or blank means unconstrained.
pub fn selection(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl FilterSet {
    /// Build from drop-down style strings (`"all"` meaning no constraint).
    ///
    /// Sex and tested values outside [`SEX_CHOICES`] and [`TESTED_CHOICES`]
    /// are rejected rather than silently selecting unknown records.
    pub fn from_selections(
        sex: &str,
        tested: &str,
        equipment: &str,
        event: &str,
        country: &str,
        federation: &str,
        division: &str,
    ) -> Result<Self, String> {
        check_choice("sex", sex, SEX_CHOICES)?;
        check_choice("tested", tested, TESTED_CHOICES)?;

        Ok(Self {
            sex: selection(sex).map(|s| Sex::parse(&s)),
            tested: selection(tested).map(|t| TestedStatus::parse(&t)),
            equipment: selection(equipment),
            event: selection(event),
            country: selection(country),
            federation: selection(federation),
            division: selection(division),
        })
    }

    /// True when no dimension constrains anything.
    pub fn is_unconstrained(&self) -> bool {
        *self == FilterSet::default()
    }

    /// Whether `record` passes every active dimension except `excluded`.
    pub fn matches(&self, record: &LiftRecord, excluded: Option<Dimension>) -> bool {
        let active = |d: Dimension| excluded != Some(d);

        if active(Dimension::Sex) {
            if let Some(sex) = self.sex {
                if record.sex != sex {
                    return false;
                }
            }
        }
        if active(Dimension::Tested) {
            if let Some(tested) = self.tested {
                if record.tested != tested {
                    return false;
                }
            }
        }
        if active(Dimension::Equipment) {
            if let Some(ref equipment) = self.equipment {
                if &record.equipment != equipment {
                    return false;
                }
            }
        }
        if active(Dimension::Event) {
            if let Some(ref event) = self.event {
                if &record.event != event {
                    return false;
                }
            }
        }
        if active(Dimension::Country) {
            if let Some(ref country) = self.country {
                if record.country.as_ref() != Some(country) {
                    return false;
                }
            }
        }
        if active(Dimension::Federation) {
            if let Some(ref federation) = self.federation {
                if record.federation.as_ref() != Some(federation) {
                    return false;
                }
            }
        }
        if active(Dimension::Division) {
            if let Some(ref division) = self.division {
                if record.division.as_ref() != Some(division) {
                    return false;
                }
            }
        }

        true
    }

    /// Records passing the filter.
    pub fn apply<'a>(&self, records: &'a [LiftRecord]) -> Vec<&'a LiftRecord> {
        self.apply_excluding(records, None)
    }

    /// Records passing the filter with one dimension left unconstrained.
    pub fn apply_excluding<'a>(
        &self,
        records: &'a [LiftRecord],
        excluded: Option<Dimension>,
    ) -> Vec<&'a LiftRecord> {
        records
            .iter()
            .filter(|r| self.matches(r, excluded))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{ingest, CountryAliases};
    use crate::models::RawRow;

    fn records() -> Vec<LiftRecord> {
        let rows = vec![
            ("M", "Yes", "Norway", "Raw", "SBD"),
            ("F", "Yes", "Norway", "Raw", "SBD"),
            ("M", "", "Sweden", "Single-ply", "SBD"),
            ("F", "", "Sweden", "Raw", "B"),
            ("M", "Yes", "Sweden", "Raw", "B"),
        ]
        .into_iter()
        .map(|(sex, tested, country, equipment, event)| RawRow {
            sex: sex.to_string(),
            tested: tested.to_string(),
            country: country.to_string(),
            equipment: equipment.to_string(),
            event: event.to_string(),
            division: if country == "Norway" { "Open" } else { "Juniors" }.to_string(),
            ..RawRow::default()
        })
        .collect::<Vec<_>>();
        ingest(&rows, &CountryAliases::default()).records
    }

    #[test]
    fn test_selection_all_is_none() {
        assert_eq!(selection("all"), None);
        assert_eq!(selection("ALL"), None);
        assert_eq!(selection(""), None);
        assert_eq!(selection("Raw"), Some("Raw".to_string()));
    }

    #[test]
    fn test_unconstrained_matches_everything() {
        let records = records();
        let filters = FilterSet::default();
        assert!(filters.is_unconstrained());
        assert_eq!(filters.apply(&records).len(), records.len());
    }

    #[test]
    fn test_sex_filter_only() {
        let records = records();
        let filters = FilterSet::from_selections("M", "all", "all", "all", "all", "all", "all").unwrap();
        let kept = filters.apply(&records);
        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|r| r.sex == Sex::M));
    }

    #[test]
    fn test_conjunction() {
        let records = records();
        let filters = FilterSet::from_selections("M", "Yes", "Raw", "all", "Sweden", "all", "all").unwrap();
        let kept = filters.apply(&records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].event, "B");
    }

    #[test]
    fn test_excluded_dimension_is_ignored() {
        let records = records();
        let filters = FilterSet {
            equipment: Some("Raw".to_string()),
            ..FilterSet::default()
        };
        assert_eq!(filters.apply(&records).len(), 4);
        assert_eq!(
            filters
                .apply_excluding(&records, Some(Dimension::Equipment))
                .len(),
            5
        );
    }

    #[test]
    fn test_unrecognized_sex_and_tested_are_rejected() {
        for sex in ["male", "m", "Mx"] {
            let err = FilterSet::from_selections(sex, "all", "all", "all", "all", "all", "all")
                .unwrap_err();
            assert!(err.contains("sex"), "{}", err);
        }
        assert!(FilterSet::from_selections("all", "No", "all", "all", "all", "all", "all").is_err());
        assert!(FilterSet::from_selections("F", "Unknown", "all", "all", "all", "all", "all").is_ok());
        assert!(check_choice("sex", " All ", SEX_CHOICES).is_ok());
    }

    #[test]
    fn test_division_filter() {
        let records = records();
        let filters =
            FilterSet::from_selections("all", "all", "all", "all", "all", "all", "Open").unwrap();
        let kept = filters.apply(&records);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.country.as_deref() == Some("Norway")));
        assert_eq!(
            filters
                .apply_excluding(&records, Some(Dimension::Division))
                .len(),
            5
        );
    }

    #[test]
    fn test_dimension_keys() {
        let records = records();
        assert_eq!(Dimension::Sex.key(&records[1]), Some("F".to_string()));
        assert_eq!(Dimension::Tested.key(&records[2]), Some("Unknown".to_string()));
        assert_eq!(Dimension::Country.key(&records[0]), Some("Norway".to_string()));
        assert_eq!(Dimension::Federation.key(&records[0]), None);
        assert_eq!(Dimension::Division.key(&records[2]), Some("Juniors".to_string()));
    }
}
