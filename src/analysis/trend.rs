//! Best-per-year time series for the trend line chart.

use super::aggregator::group_by;
use crate::filter::FilterSet;
use crate::models::{LiftRecord, Sex, TrendCategory, TrendSeries, YearBest};

fn point(record: &LiftRecord, year: i32, best: f64) -> YearBest {
    YearBest {
        year,
        best,
        name: record.name.clone(),
        sex: record.sex,
        bodyweight_kg: record.bodyweight_kg,
        equipment: record.equipment.clone(),
        federation: record.federation.clone(),
        country: record.country.clone(),
        division: record.division.clone(),
        tested: record.tested,
        date: record.date,
    }
}

/// Strictly greatest finite value per year, sorted by year.
///
/// On ties the first record seen is kept. Records without a date or a
/// finite value are skipped.
pub fn best_per_year<'a>(
    records: impl IntoIterator<Item = &'a LiftRecord>,
    category: TrendCategory,
) -> Vec<YearBest> {
    let field = category.field();
    let scored = records
        .into_iter()
        .filter(|r| r.numeric(field).is_finite());

    let mut points: Vec<YearBest> = group_by(scored, |r| r.year().map(|y| y.to_string()))
        .into_iter()
        .filter_map(|(_, members)| {
            let mut top: Option<&LiftRecord> = None;
            for record in members {
                match top {
                    Some(current) if record.numeric(field) <= current.numeric(field) => {}
                    _ => top = Some(record),
                }
            }
            let record = top?;
            let year = record.year()?;
            Some(point(record, year, record.numeric(field)))
        })
        .collect();

    points.sort_by_key(|p| p.year);
    points
}

/// Male and female best-per-year lines for the filtered records.
pub fn trend_series(
    records: &[LiftRecord],
    filters: &FilterSet,
    category: TrendCategory,
) -> TrendSeries {
    let filtered = filters.apply(records);
    TrendSeries {
        category,
        male: best_per_year(filtered.iter().copied().filter(|r| r.sex == Sex::M), category),
        female: best_per_year(filtered.iter().copied().filter(|r| r.sex == Sex::F), category),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRow;
    use crate::normalize::{ingest, CountryAliases};

    fn entry(name: &str, sex: &str, date: &str, total: &str, federation: &str) -> RawRow {
        RawRow {
            name: name.to_string(),
            sex: sex.to_string(),
            date: date.to_string(),
            total_kg: total.to_string(),
            federation: federation.to_string(),
            equipment: "Raw".to_string(),
            ..RawRow::default()
        }
    }

    fn records() -> Vec<LiftRecord> {
        ingest(
            &[
                entry("A", "M", "2001-03-01", "700", "IPF"),
                entry("B", "M", "2001-09-12", "720", "USAPL"),
                entry("C", "M", "1999-05-05", "650", "IPF"),
                entry("D", "M", "1999-07-07", "650", "IPF"),
                entry("E", "F", "2001-01-01", "450", "IPF"),
                entry("F", "M", "", "900", "IPF"),
                entry("G", "M", "2003-01-01", "", "IPF"),
            ],
            &CountryAliases::default(),
        )
        .records
    }

    #[test]
    fn test_best_per_year_sorted_and_strict() {
        let series = trend_series(&records(), &FilterSet::default(), TrendCategory::Total);

        let years: Vec<i32> = series.male.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![1999, 2001]);
        assert_eq!(series.male[0].name.as_deref(), Some("C"));
        assert_eq!(series.male[1].best, 720.0);
        assert_eq!(series.male[1].federation.as_deref(), Some("USAPL"));
        assert_eq!(series.female.len(), 1);
    }

    #[test]
    fn test_federation_filter() {
        let filters = FilterSet {
            federation: Some("IPF".to_string()),
            ..FilterSet::default()
        };
        let series = trend_series(&records(), &filters, TrendCategory::Total);
        assert_eq!(series.male[1].name.as_deref(), Some("A"));
        assert_eq!(series.male[1].best, 700.0);
    }

    #[test]
    fn test_open_division_totals() {
        let mut records = records();
        for record in records.iter_mut() {
            let division = if record.name.as_deref() == Some("B") {
                "Juniors"
            } else {
                "Open"
            };
            record.division = Some(division.to_string());
        }

        let open = FilterSet {
            division: Some("Open".to_string()),
            ..FilterSet::default()
        };
        let series = trend_series(&records, &open, TrendCategory::Total);
        assert_eq!(series.male[1].name.as_deref(), Some("A"));
        assert_eq!(series.male[1].division.as_deref(), Some("Open"));
        assert_eq!(series.female.len(), 1);
    }

    #[test]
    fn test_empty_category() {
        let series = trend_series(&records(), &FilterSet::default(), TrendCategory::Squat);
        assert!(series.male.is_empty());
        assert!(series.female.is_empty());
        assert_eq!(series.peak(), None);
    }
}
