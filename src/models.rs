//! Data models for the aggregation engine.
//!
//! This module contains the core data structures shared by ingestion,
//! aggregation and reporting: raw tabular rows, validated lift records,
//! per-group aggregates and distribution summaries.

use crate::filter::{Dimension, FilterSet};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sex of the lifter as recorded in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
    Unknown,
}

impl Sex {
    /// Parse the raw `Sex` column. Anything other than `M` or `F` is unknown.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "M" => Sex::M,
            "F" => Sex::F,
            _ => Sex::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::F => "F",
            Sex::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Drug-tested status. The source only distinguishes an explicit "Yes".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestedStatus {
    Yes,
    Unknown,
}

impl TestedStatus {
    /// `Yes` only when the raw field is literally "Yes".
    pub fn parse(raw: &str) -> Self {
        if raw == "Yes" {
            TestedStatus::Yes
        } else {
            TestedStatus::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TestedStatus::Yes => "Yes",
            TestedStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TestedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One parsed row of the competition dataset, before validation.
///
/// Every column is kept as a string. JSON fixtures may carry numbers,
/// booleans or nulls; those are stringified (null becomes empty) so CSV and
/// JSON sources share one ingestion path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRow {
    #[serde(rename = "Name", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "Sex", deserialize_with = "lenient_string")]
    pub sex: String,
    #[serde(rename = "Tested", deserialize_with = "lenient_string")]
    pub tested: String,
    #[serde(rename = "Country", deserialize_with = "lenient_string")]
    pub country: String,
    #[serde(rename = "CountryCode", deserialize_with = "lenient_string")]
    pub country_code: String,
    #[serde(rename = "State", deserialize_with = "lenient_string")]
    pub state: String,
    #[serde(rename = "Dots", deserialize_with = "lenient_string")]
    pub dots: String,
    #[serde(rename = "TotalKg", deserialize_with = "lenient_string")]
    pub total_kg: String,
    #[serde(rename = "Equipment", deserialize_with = "lenient_string")]
    pub equipment: String,
    #[serde(rename = "Event", deserialize_with = "lenient_string")]
    pub event: String,
    #[serde(rename = "Age", deserialize_with = "lenient_string")]
    pub age: String,
    #[serde(rename = "BodyweightKg", deserialize_with = "lenient_string")]
    pub bodyweight_kg: String,
    #[serde(rename = "WeightClassKg", deserialize_with = "lenient_string")]
    pub weight_class_kg: String,
    #[serde(rename = "Division", deserialize_with = "lenient_string")]
    pub division: String,
    #[serde(rename = "Federation", deserialize_with = "lenient_string")]
    pub federation: String,
    #[serde(rename = "Best3SquatKg", deserialize_with = "lenient_string")]
    pub best_squat_kg: String,
    #[serde(rename = "Best3BenchKg", deserialize_with = "lenient_string")]
    pub best_bench_kg: String,
    #[serde(rename = "Best3DeadliftKg", deserialize_with = "lenient_string")]
    pub best_deadlift_kg: String,
    #[serde(rename = "Date", deserialize_with = "lenient_string")]
    pub date: String,
}

/// Accept strings, numbers, booleans and nulls as a string column.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientVisitor;

    impl<'de> Visitor<'de> for LenientVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, number, boolean or null")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<String, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(LenientVisitor)
        }
    }

    deserializer.deserialize_any(LenientVisitor)
}

/// A validated competition entry.
///
/// Numeric fields hold `f64::NAN` when the source value was absent or
/// unparseable; they are skipped by every statistic but the record still
/// counts toward its group's population.
#[derive(Debug, Clone, Serialize)]
pub struct LiftRecord {
    pub sex: Sex,
    pub tested: TestedStatus,
    /// Canonical country name after alias resolution.
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub state: Option<String>,
    pub dots: f64,
    pub total_kg: f64,
    pub age: f64,
    pub bodyweight_kg: f64,
    pub best_squat_kg: f64,
    pub best_bench_kg: f64,
    pub best_deadlift_kg: f64,
    pub equipment: String,
    pub event: String,
    pub federation: Option<String>,
    pub division: Option<String>,
    pub weight_class_kg: Option<String>,
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    /// Approximate athlete identity; see `normalize::dedup_key`.
    pub dedup_key: String,
}

impl LiftRecord {
    /// Competition year, when the date is known.
    pub fn year(&self) -> Option<i32> {
        self.date.map(|d| d.year())
    }

    /// Value of a numeric field.
    pub fn numeric(&self, field: NumericField) -> f64 {
        match field {
            NumericField::Dots => self.dots,
            NumericField::Total => self.total_kg,
            NumericField::Squat => self.best_squat_kg,
            NumericField::Bench => self.best_bench_kg,
            NumericField::Deadlift => self.best_deadlift_kg,
        }
    }

    /// Look up a categorical column by its dataset header name.
    ///
    /// Used by tag-based comparison filters, which address columns the way
    /// the fixture files name them.
    pub fn field(&self, column: &str) -> Option<&str> {
        match column {
            "Sex" => Some(self.sex.as_str()),
            "Tested" => Some(self.tested.as_str()),
            "Equipment" => Some(self.equipment.as_str()),
            "Event" => Some(self.event.as_str()),
            "Country" => self.country.as_deref(),
            "CountryCode" => self.country_code.as_deref(),
            "State" => self.state.as_deref(),
            "Federation" => self.federation.as_deref(),
            "Division" => self.division.as_deref(),
            "WeightClassKg" => self.weight_class_kg.as_deref(),
            _ => None,
        }
    }
}

/// Numeric columns that statistics can be computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NumericField {
    Dots,
    Total,
    Squat,
    Bench,
    Deadlift,
}

impl NumericField {
    pub fn label(&self) -> &'static str {
        match self {
            NumericField::Dots => "Dots",
            NumericField::Total => "Total (kg)",
            NumericField::Squat => "Best Squat (kg)",
            NumericField::Bench => "Best Bench (kg)",
            NumericField::Deadlift => "Best Deadlift (kg)",
        }
    }
}

/// Distinct count of a sub-population and its share of the group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplitCount {
    pub count: usize,
    /// Fraction in `[0, 1]` of the group's distinct count.
    pub share: f64,
}

/// Sex and tested-status breakdown of one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubSplits {
    pub male: SplitCount,
    pub female: SplitCount,
    pub tested: SplitCount,
    pub untested: SplitCount,
}

/// Summary statistics for one group of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub group: String,
    /// NaN (serialized as `null`) when the group has no finite dots value.
    pub median_dots: f64,
    pub median_total: f64,
    /// Distinct dedup keys in the group.
    pub lift_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splits: Option<SubSplits>,
}

/// Tukey box-plot summary of a sorted numeric sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub count: usize,
}

/// One box of a cross-tabulated box plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxGroup {
    pub group: String,
    /// Number of finite values behind the box.
    pub values: usize,
    /// Absent when fewer than two finite values are available.
    pub stats: Option<BoxStats>,
}

/// Map metric selectable for coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    MedianDots,
    MedianTotal,
    LiftCount,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::MedianDots => "Median Dots",
            Metric::MedianTotal => "Median Total (kg)",
            Metric::LiftCount => "Number of Athletes",
        }
    }

    /// Counts are mapped on a log scale and formatted as integers.
    pub fn is_count(&self) -> bool {
        matches!(self, Metric::LiftCount)
    }

    pub fn value_of(&self, aggregate: &AggregateResult) -> f64 {
        match self {
            Metric::MedianDots => aggregate.median_dots,
            Metric::MedianTotal => aggregate.median_total,
            Metric::LiftCount => aggregate.lift_count as f64,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Interpolation used by the sequential color scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    Linear,
    Log,
}

/// Numeric domain of a sequential color scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorDomain {
    pub min: f64,
    pub max: f64,
    pub scale: ScaleKind,
}

/// Min / median / max labels under the map legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendSummary {
    pub label: String,
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

/// Best lifts of one comparison group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiftMaxima {
    pub group: String,
    pub tags: Vec<String>,
    pub matched: usize,
    pub best_squat: f64,
    pub best_bench: f64,
    pub best_deadlift: f64,
}

/// Side-by-side best lifts of the two comparison groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarbellComparison {
    pub blue: LiftMaxima,
    pub red: LiftMaxima,
}

/// Category plotted by the best-per-year trend chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TrendCategory {
    #[default]
    Total,
    Dots,
    Squat,
    Bench,
    Deadlift,
}

impl TrendCategory {
    pub fn field(&self) -> NumericField {
        match self {
            TrendCategory::Total => NumericField::Total,
            TrendCategory::Dots => NumericField::Dots,
            TrendCategory::Squat => NumericField::Squat,
            TrendCategory::Bench => NumericField::Bench,
            TrendCategory::Deadlift => NumericField::Deadlift,
        }
    }

    /// Y axis label.
    pub fn axis_label(&self) -> &'static str {
        match self {
            TrendCategory::Total => "Total [kg]",
            TrendCategory::Dots => "Dots points",
            TrendCategory::Squat => "Squat [kg]",
            TrendCategory::Bench => "Bench [kg]",
            TrendCategory::Deadlift => "Deadlift [kg]",
        }
    }
}

/// Best result of one year, with the athlete that achieved it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearBest {
    pub year: i32,
    pub best: f64,
    pub name: Option<String>,
    pub sex: Sex,
    pub bodyweight_kg: f64,
    pub equipment: String,
    pub federation: Option<String>,
    pub country: Option<String>,
    pub division: Option<String>,
    pub tested: TestedStatus,
    pub date: Option<NaiveDate>,
}

/// Male and female best-per-year lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub category: TrendCategory,
    pub male: Vec<YearBest>,
    pub female: Vec<YearBest>,
}

impl TrendSeries {
    /// Restrict both lines to an inclusive year window.
    pub fn window(&self, from: Option<i32>, to: Option<i32>) -> TrendSeries {
        let keep = |p: &&YearBest| {
            from.map_or(true, |f| p.year >= f) && to.map_or(true, |t| p.year <= t)
        };
        TrendSeries {
            category: self.category,
            male: self.male.iter().filter(keep).cloned().collect(),
            female: self.female.iter().filter(keep).cloned().collect(),
        }
    }

    /// Largest value over both lines, if any.
    pub fn peak(&self) -> Option<f64> {
        self.male
            .iter()
            .chain(self.female.iter())
            .map(|p| p.best)
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }
}

/// Record count of one federation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FederationCount {
    pub federation: String,
    pub records: usize,
}

/// A non-fatal problem found while validating a raw row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    /// Zero-based row index within its source.
    pub row: usize,
    pub column: &'static str,
    pub value: String,
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: column {} has unparseable value {:?}",
            self.row, self.column, self.value
        )
    }
}

/// Information about a report run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Dataset the report was computed from.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub records_loaded: usize,
    pub records_without_country: usize,
    pub row_issues: usize,
    pub filters: FilterSet,
    pub duration_seconds: f64,
}

/// Map view: per-country aggregates with the color scale behind them.
#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    pub metric: Metric,
    pub countries: Vec<AggregateResult>,
    pub domain: Option<ColorDomain>,
    pub legend: Option<LegendSummary>,
    /// Legend gradient stops from min to max.
    pub stops: Vec<f64>,
}

/// Country drill-down. `result` is absent when nothing matched.
#[derive(Debug, Clone, Serialize)]
pub struct DetailView {
    pub country: String,
    pub result: Option<AggregateResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoxPlotView {
    pub dimension: Dimension,
    pub field: NumericField,
    pub groups: Vec<BoxGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendView {
    pub from_year: Option<i32>,
    pub to_year: Option<i32>,
    pub peak: Option<f64>,
    pub series: TrendSeries,
}

#[derive(Debug, Clone, Serialize)]
pub struct FederationsView {
    pub top: usize,
    pub federations: Vec<FederationCount>,
}

/// Result of the selected chart view.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewResult {
    Map(MapView),
    Detail(DetailView),
    BoxPlot(BoxPlotView),
    Barbell(BarbellComparison),
    Trend(TrendView),
    Federations(FederationsView),
}

/// The complete report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    #[serde(flatten)]
    pub view: ViewResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<RowIssue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_parse() {
        assert_eq!(Sex::parse("M"), Sex::M);
        assert_eq!(Sex::parse("F"), Sex::F);
        assert_eq!(Sex::parse("Mx"), Sex::Unknown);
        assert_eq!(Sex::parse(""), Sex::Unknown);
    }

    #[test]
    fn test_tested_parse_is_literal() {
        assert_eq!(TestedStatus::parse("Yes"), TestedStatus::Yes);
        assert_eq!(TestedStatus::parse("yes"), TestedStatus::Unknown);
        assert_eq!(TestedStatus::parse(""), TestedStatus::Unknown);
        assert_eq!(TestedStatus::parse("No"), TestedStatus::Unknown);
    }

    #[test]
    fn test_raw_row_from_json_accepts_numbers_and_nulls() {
        let json = r#"{"Sex": "F", "Dots": 412.5, "TotalKg": null, "Tested": "Yes", "Age": 27}"#;
        let row: RawRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.sex, "F");
        assert_eq!(row.dots, "412.5");
        assert_eq!(row.total_kg, "");
        assert_eq!(row.age, "27");
        assert_eq!(row.country, "");
    }

    #[test]
    fn test_metric_labels() {
        assert_eq!(Metric::MedianDots.label(), "Median Dots");
        assert_eq!(Metric::MedianTotal.label(), "Median Total (kg)");
        assert_eq!(Metric::LiftCount.label(), "Number of Athletes");
        assert!(Metric::LiftCount.is_count());
        assert!(!Metric::MedianDots.is_count());
    }

    #[test]
    fn test_aggregate_nan_serializes_as_null() {
        let aggregate = AggregateResult {
            group: "Norway".to_string(),
            median_dots: f64::NAN,
            median_total: 500.0,
            lift_count: 0,
            splits: None,
        };
        let json = serde_json::to_string(&aggregate).unwrap();
        assert!(json.contains("\"median_dots\":null"));
        assert!(json.contains("\"lift_count\":0"));
        assert!(!json.contains("splits"));
    }

    #[test]
    fn test_trend_window() {
        let point = |year: i32, best: f64| YearBest {
            year,
            best,
            name: None,
            sex: Sex::M,
            bodyweight_kg: f64::NAN,
            equipment: "Raw".to_string(),
            federation: None,
            country: None,
            division: None,
            tested: TestedStatus::Unknown,
            date: None,
        };
        let series = TrendSeries {
            category: TrendCategory::Total,
            male: vec![point(1990, 800.0), point(2000, 900.0), point(2010, 1000.0)],
            female: vec![point(2005, 600.0)],
        };

        let windowed = series.window(Some(1995), Some(2005));
        assert_eq!(windowed.male.len(), 1);
        assert_eq!(windowed.male[0].year, 2000);
        assert_eq!(windowed.female.len(), 1);
        assert_eq!(series.peak(), Some(1000.0));
    }
}
