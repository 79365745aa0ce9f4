//! Grouping and per-group aggregation.
//!
//! This module partitions filtered records by a key, computes medians and
//! distinct counts per group, and derives the drill-down and box-plot
//! views built on the same grouping.

use super::stats::{box_stats, finite_sorted, median};
use crate::filter::{Dimension, FilterSet};
use crate::models::{
    AggregateResult, BoxGroup, FederationCount, LiftRecord, NumericField, Sex, SplitCount,
    SubSplits, TestedStatus,
};
use crate::normalize::CountryAliases;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Partition records by key, keeping keys in first-seen order.
///
/// Records whose key is `None` are skipped.
pub fn group_by<'a, I, F>(records: I, key: F) -> Vec<(String, Vec<&'a LiftRecord>)>
where
    I: IntoIterator<Item = &'a LiftRecord>,
    F: Fn(&LiftRecord) -> Option<String>,
{
    let mut groups: Vec<(String, Vec<&'a LiftRecord>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some(k) = key(record) else {
            continue;
        };
        match index.get(&k) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![record]));
            }
        }
    }

    groups
}

/// Number of distinct dedup keys among `records`.
pub fn distinct_count<'a>(records: impl IntoIterator<Item = &'a LiftRecord>) -> usize {
    records
        .into_iter()
        .map(|r| r.dedup_key.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// `part / total`, or 0 when the total is 0.
pub fn share(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Sex and tested-status breakdown of a group.
pub fn sub_splits(members: &[&LiftRecord]) -> SubSplits {
    let total = distinct_count(members.iter().copied());
    let split = |pred: &dyn Fn(&LiftRecord) -> bool| {
        let count = distinct_count(members.iter().copied().filter(|r| pred(r)));
        SplitCount {
            count,
            share: share(count, total),
        }
    };

    SubSplits {
        male: split(&|r: &LiftRecord| r.sex == Sex::M),
        female: split(&|r: &LiftRecord| r.sex == Sex::F),
        tested: split(&|r: &LiftRecord| r.tested == TestedStatus::Yes),
        untested: split(&|r: &LiftRecord| r.tested == TestedStatus::Unknown),
    }
}

/// Summary statistics for one group.
pub fn aggregate_group(group: &str, members: &[&LiftRecord], with_splits: bool) -> AggregateResult {
    AggregateResult {
        group: group.to_string(),
        median_dots: median(members.iter().map(|r| r.dots)),
        median_total: median(members.iter().map(|r| r.total_kg)),
        lift_count: distinct_count(members.iter().copied()),
        splits: with_splits.then(|| sub_splits(members)),
    }
}

/// Aggregates keyed by group, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GroupedAggregates {
    entries: Vec<AggregateResult>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl GroupedAggregates {
    pub fn get(&self, group: &str) -> Option<&AggregateResult> {
        self.index.get(group).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &AggregateResult> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[AggregateResult] {
        &self.entries
    }
}

impl FromIterator<AggregateResult> for GroupedAggregates {
    fn from_iter<T: IntoIterator<Item = AggregateResult>>(iter: T) -> Self {
        let entries: Vec<AggregateResult> = iter.into_iter().collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, a)| (a.group.clone(), i))
            .collect();
        Self { entries, index }
    }
}

/// Filter, group along `dimension` and aggregate every group.
pub fn aggregate_by(
    records: &[LiftRecord],
    filters: &FilterSet,
    dimension: Dimension,
    with_splits: bool,
) -> GroupedAggregates {
    let filtered = filters.apply(records);
    group_by(filtered, |r| dimension.key(r))
        .into_iter()
        .map(|(group, members)| aggregate_group(&group, &members, with_splits))
        .collect()
}

/// Per-country aggregates for the choropleth map.
///
/// Records without a resolvable country are not part of any group.
pub fn country_aggregates(records: &[LiftRecord], filters: &FilterSet) -> GroupedAggregates {
    aggregate_by(records, filters, Dimension::Country, false)
}

/// Drill-down for one country, with sex and tested splits.
///
/// `country` goes through the alias table first, so dataset spellings
/// resolve to the same group. `None` when no filtered record matches.
pub fn country_detail(
    records: &[LiftRecord],
    filters: &FilterSet,
    country: &str,
    aliases: &CountryAliases,
) -> Option<AggregateResult> {
    let name = aliases.normalize(country)?;
    let members: Vec<&LiftRecord> = filters
        .apply(records)
        .into_iter()
        .filter(|r| r.country.as_deref() == Some(name.as_str()))
        .collect();

    if members.is_empty() {
        return None;
    }

    Some(aggregate_group(&name, &members, true))
}

/// Cross-tabulated box plot of `field` grouped along `dimension`.
///
/// The filter on `dimension` itself is not applied, so every category of
/// the grouping axis stays visible for comparison.
pub fn box_plot(
    records: &[LiftRecord],
    filters: &FilterSet,
    dimension: Dimension,
    field: NumericField,
) -> Vec<BoxGroup> {
    let filtered = filters.apply_excluding(records, Some(dimension));

    group_by(filtered, |r| dimension.key(r))
        .into_iter()
        .map(|(group, members)| {
            let values = finite_sorted(members.iter().map(|r| r.numeric(field)));
            BoxGroup {
                group,
                values: values.len(),
                stats: box_stats(&values).ok(),
            }
        })
        .collect()
}

/// Federations by record count, largest first; ties keep first-seen order.
pub fn top_federations(records: &[LiftRecord], filters: &FilterSet, n: usize) -> Vec<FederationCount> {
    let mut counts: Vec<FederationCount> = group_by(filters.apply(records), |r| r.federation.clone())
        .into_iter()
        .map(|(federation, members)| FederationCount {
            federation,
            records: members.len(),
        })
        .collect();

    counts.sort_by_key(|c| std::cmp::Reverse(c.records));
    counts.truncate(n);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRow;
    use crate::normalize::ingest;

    fn raw(sex: &str, tested: &str, country: &str, dots: &str, total: &str) -> RawRow {
        RawRow {
            sex: sex.to_string(),
            tested: tested.to_string(),
            country: country.to_string(),
            dots: dots.to_string(),
            total_kg: total.to_string(),
            equipment: "Raw".to_string(),
            event: "SBD".to_string(),
            ..RawRow::default()
        }
    }

    fn records(rows: &[RawRow]) -> Vec<LiftRecord> {
        ingest(rows, &CountryAliases::default()).records
    }

    #[test]
    fn test_group_by_preserves_discovery_order() {
        let records = records(&[
            raw("M", "", "Sweden", "1", "1"),
            raw("M", "", "Norway", "2", "2"),
            raw("M", "", "Sweden", "3", "3"),
            raw("M", "", "", "4", "4"),
            raw("M", "", "Finland", "5", "5"),
        ]);

        let groups = group_by(&records, |r| r.country.clone());
        let keys: Vec<&str> = groups.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Sweden", "Norway", "Finland"]);
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn test_alias_groups_under_canonical_name() {
        let records = records(&[raw("M", "", "USSR", "300", "600")]);
        let aggregates = country_aggregates(&records, &FilterSet::default());
        assert!(aggregates.get("Russia").is_some());
        assert!(aggregates.get("USSR").is_none());
    }

    #[test]
    fn test_distinct_count_collapses_duplicates() {
        let records = records(&[
            raw("M", "", "Norway", "400", "700"),
            raw("M", "", "Norway", "400.04", "700"),
            raw("F", "", "Norway", "400", "700"),
        ]);

        let aggregates = country_aggregates(&records, &FilterSet::default());
        let norway = aggregates.get("Norway").unwrap();
        assert_eq!(norway.lift_count, 2);
    }

    #[test]
    fn test_missing_dots_counts_but_does_not_move_median() {
        let base = vec![
            raw("M", "", "Norway", "300", "600"),
            raw("F", "", "Norway", "400", "500"),
        ];
        let before = country_aggregates(&records(&base), &FilterSet::default());

        let mut extended = base.clone();
        extended.push(raw("M", "Yes", "Norway", "", "550"));
        let after = country_aggregates(&records(&extended), &FilterSet::default());

        let (b, a) = (before.get("Norway").unwrap(), after.get("Norway").unwrap());
        assert_eq!(a.lift_count, b.lift_count + 1);
        assert_eq!(a.median_dots, b.median_dots);
        assert_eq!(a.median_total, 550.0);
    }

    #[test]
    fn test_group_without_numbers_reports_nan_statistic() {
        let records = records(&[raw("M", "", "Chad", "", "")]);
        let aggregates = country_aggregates(&records, &FilterSet::default());
        let chad = aggregates.get("Chad").unwrap();
        assert!(chad.median_dots.is_nan());
        assert!(chad.median_total.is_nan());
        assert_eq!(chad.lift_count, 1);
    }

    #[test]
    fn test_country_detail_splits() {
        let records = records(&[
            raw("M", "Yes", "Czechia", "300", "600"),
            raw("M", "", "Czechoslovakia", "310", "610"),
            raw("F", "Yes", "Czech Republic", "320", "420"),
            raw("", "", "Czech Republic", "330", "430"),
            raw("F", "Yes", "Slovakia", "340", "440"),
        ]);

        let detail = country_detail(
            &records,
            &FilterSet::default(),
            "Czechia",
            &CountryAliases::default(),
        )
        .unwrap();
        let splits = detail.splits.unwrap();

        assert_eq!(detail.group, "Czech Republic");
        assert_eq!(detail.lift_count, 4);
        assert_eq!(splits.male.count, 2);
        assert_eq!(splits.female.count, 1);
        assert_eq!(splits.tested.count, 2);
        assert_eq!(splits.untested.count, 2);
        assert_eq!(splits.male.share, 0.5);
        assert!(splits.male.share + splits.female.share < 1.0);
        assert_eq!(detail.median_dots, 315.0);
    }

    #[test]
    fn test_country_detail_absent() {
        let records = records(&[raw("M", "", "Norway", "300", "600")]);
        let filters = FilterSet {
            sex: Some(Sex::F),
            ..FilterSet::default()
        };
        assert!(country_detail(&records, &filters, "Norway", &CountryAliases::default()).is_none());
        assert!(country_detail(&records, &FilterSet::default(), "", &CountryAliases::default()).is_none());
    }

    #[test]
    fn test_share_zero_total() {
        assert_eq!(share(0, 0), 0.0);
        assert_eq!(share(1, 4), 0.25);
    }

    #[test]
    fn test_box_plot_ignores_filter_on_grouping_axis() {
        let mut rows = vec![
            raw("M", "", "Norway", "300", "600"),
            raw("M", "", "Norway", "320", "620"),
            raw("F", "", "Norway", "280", "400"),
            raw("F", "", "Norway", "290", "410"),
            raw("F", "", "Norway", "", "420"),
        ];
        rows[0].equipment = "Wraps".to_string();

        let records = records(&rows);
        let filters = FilterSet {
            sex: Some(Sex::M),
            ..FilterSet::default()
        };

        let boxes = box_plot(&records, &filters, Dimension::Sex, NumericField::Dots);
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].group, "M");
        assert_eq!(boxes[1].group, "F");
        assert_eq!(boxes[1].values, 2);
        assert_eq!(boxes[1].stats.unwrap().median, 285.0);

        let by_equipment = box_plot(&records, &filters, Dimension::Equipment, NumericField::Dots);
        assert_eq!(by_equipment.len(), 2);
        assert_eq!(by_equipment[0].group, "Wraps");
        assert_eq!(by_equipment[0].values, 1);
        assert!(by_equipment[0].stats.is_none());
    }

    #[test]
    fn test_top_federations() {
        let mut rows: Vec<RawRow> = Vec::new();
        for (fed, n) in [("USAPL", 2), ("IPF", 3), ("WRPF", 2), ("", 4)] {
            for _ in 0..n {
                let mut row = raw("M", "", "USA", "1", "1");
                row.federation = fed.to_string();
                rows.push(row);
            }
        }
        let records = records(&rows);

        let top = top_federations(&records, &FilterSet::default(), 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].federation, "IPF");
        assert_eq!(top[0].records, 3);
        assert_eq!(top[1].federation, "USAPL");
    }
}
