//! Markdown report generation.
//!
//! This module renders a computed [`Report`] as Markdown tables, or as
//! pretty-printed JSON.

use crate::models::{
    AggregateResult, BarbellComparison, BoxPlotView, DetailView, FederationsView, MapView, Metric,
    Report, ReportMetadata, RowIssue, ScaleKind, SplitCount, TrendView, ViewResult, YearBest,
};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Row issues listed in Markdown before the list is cut short.
const MAX_LISTED_ISSUES: usize = 20;

/// Placeholder for values that cannot be shown.
const NO_DATA: &str = "n/a";

/// Integer with `,` thousands separators.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Continuous value with one decimal, `n/a` when not finite.
pub fn format_number(value: f64) -> String {
    if value.is_finite() {
        format!("{:.1}", value)
    } else {
        NO_DATA.to_string()
    }
}

/// Metric value as shown in tooltips and tables.
pub fn format_metric(value: f64, metric: Metric) -> String {
    if !value.is_finite() {
        return NO_DATA.to_string();
    }
    if metric.is_count() {
        format_thousands(value.max(0.0).round() as u64)
    } else {
        format_number(value)
    }
}

/// `part / total` as a percentage with one decimal; `0%` when `total` is 0.
pub fn format_percentage(part: usize, total: usize) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    format!("{:.1}%", part as f64 / total as f64 * 100.0)
}

fn text_or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# liftstats Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));

    match &report.view {
        ViewResult::Map(view) => output.push_str(&generate_map_section(view)),
        ViewResult::Detail(view) => output.push_str(&generate_detail_section(view)),
        ViewResult::BoxPlot(view) => output.push_str(&generate_box_plot_section(view)),
        ViewResult::Barbell(view) => output.push_str(&generate_barbell_section(view)),
        ViewResult::Trend(view) => output.push_str(&generate_trend_section(view)),
        ViewResult::Federations(view) => output.push_str(&generate_federations_section(view)),
    }

    output.push_str(&generate_issues_section(&report.issues));

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Records Loaded:** {}\n",
        format_thousands(metadata.records_loaded as u64)
    ));
    if metadata.records_without_country > 0 {
        section.push_str(&format!(
            "- **Records Without Country:** {}\n",
            format_thousands(metadata.records_without_country as u64)
        ));
    }
    if metadata.row_issues > 0 {
        section.push_str(&format!("- **Row Issues:** {}\n", metadata.row_issues));
    }

    let filters = &metadata.filters;
    let selections = [
        ("Sex", filters.sex.map(|s| s.as_str().to_string())),
        ("Tested", filters.tested.map(|t| t.as_str().to_string())),
        ("Equipment", filters.equipment.clone()),
        ("Event", filters.event.clone()),
        ("Country", filters.country.clone()),
        ("Federation", filters.federation.clone()),
        ("Division", filters.division.clone()),
    ];
    let active: Vec<String> = selections
        .iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| format!("{}={}", name, v)))
        .collect();
    if active.is_empty() {
        section.push_str("- **Filters:** all\n");
    } else {
        section.push_str(&format!("- **Filters:** {}\n", active.join(", ")));
    }

    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the per-country map section.
fn generate_map_section(view: &MapView) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Country Map ({})\n\n", view.metric.label()));

    if view.countries.is_empty() {
        section.push_str("No country matches the current filters.\n\n");
        return section;
    }

    section.push_str("| Country | Median Dots | Median Total (kg) | Number of Athletes |\n");
    section.push_str("|:---|---:|---:|---:|\n");
    for aggregate in &view.countries {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            aggregate.group,
            format_metric(aggregate.median_dots, Metric::MedianDots),
            format_metric(aggregate.median_total, Metric::MedianTotal),
            format_metric(aggregate.lift_count as f64, Metric::LiftCount),
        ));
    }
    section.push('\n');

    section.push_str("### Legend\n\n");
    match (&view.legend, &view.domain) {
        (Some(legend), Some(domain)) => {
            let scale = match domain.scale {
                ScaleKind::Linear => "linear",
                ScaleKind::Log => "logarithmic",
            };
            section.push_str(&format!("- **Metric:** {} ({} scale)\n", legend.label, scale));
            section.push_str(&format!(
                "- **Min:** {}\n",
                format_metric(legend.min, view.metric)
            ));
            section.push_str(&format!(
                "- **Median:** {}\n",
                format_metric(legend.median, view.metric)
            ));
            section.push_str(&format!(
                "- **Max:** {}\n",
                format_metric(legend.max, view.metric)
            ));
            if !view.stops.is_empty() {
                let stops: Vec<String> = view
                    .stops
                    .iter()
                    .map(|s| format_metric(*s, view.metric))
                    .collect();
                section.push_str(&format!("- **Stops:** {}\n", stops.join(" / ")));
            }
        }
        _ => section.push_str("No finite values to scale.\n"),
    }
    section.push('\n');

    section
}

fn split_cell(split: &SplitCount, total: usize) -> String {
    format!(
        "{} ({})",
        format_thousands(split.count as u64),
        format_percentage(split.count, total)
    )
}

/// Generate the country drill-down section.
fn generate_detail_section(view: &DetailView) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Country Detail: {}\n\n", view.country));
    section.push_str("| Statistic | Value |\n");
    section.push_str("|:---|---:|\n");

    match &view.result {
        Some(result) => section.push_str(&generate_detail_rows(result)),
        None => {
            for label in [
                "Median Dots",
                "Median Total (kg)",
                "Number of Athletes",
                "Male",
                "Female",
                "Tested",
                "Untested",
            ] {
                section.push_str(&format!("| {} | - |\n", label));
            }
        }
    }
    section.push('\n');

    section
}

fn generate_detail_rows(result: &AggregateResult) -> String {
    let mut rows = String::new();

    rows.push_str(&format!(
        "| Median Dots | {} |\n",
        format_metric(result.median_dots, Metric::MedianDots)
    ));
    rows.push_str(&format!(
        "| Median Total (kg) | {} |\n",
        format_metric(result.median_total, Metric::MedianTotal)
    ));
    rows.push_str(&format!(
        "| Number of Athletes | {} |\n",
        format_metric(result.lift_count as f64, Metric::LiftCount)
    ));

    if let Some(splits) = &result.splits {
        let total = result.lift_count;
        rows.push_str(&format!("| Male | {} |\n", split_cell(&splits.male, total)));
        rows.push_str(&format!("| Female | {} |\n", split_cell(&splits.female, total)));
        rows.push_str(&format!("| Tested | {} |\n", split_cell(&splits.tested, total)));
        rows.push_str(&format!(
            "| Untested | {} |\n",
            split_cell(&splits.untested, total)
        ));
    }

    rows
}

/// Generate the box plot section.
fn generate_box_plot_section(view: &BoxPlotView) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## Box Plot: {} by {}\n\n",
        view.field.label(),
        view.dimension
    ));

    if view.groups.is_empty() {
        section.push_str("No records match the current filters.\n\n");
        return section;
    }

    section.push_str("| Group | Values | Lower Whisker | Q1 | Median | Q3 | Upper Whisker |\n");
    section.push_str("|:---|---:|---:|---:|---:|---:|---:|\n");
    for group in &view.groups {
        match &group.stats {
            Some(stats) => section.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                group.group,
                group.values,
                format_number(stats.lower_whisker),
                format_number(stats.q1),
                format_number(stats.median),
                format_number(stats.q3),
                format_number(stats.upper_whisker),
            )),
            None => section.push_str(&format!(
                "| {} | {} | - | - | - | - | - |\n",
                group.group, group.values
            )),
        }
    }
    section.push('\n');

    section
}

/// Generate the bar-bell comparison section.
fn generate_barbell_section(view: &BarbellComparison) -> String {
    let mut section = String::new();

    section.push_str("## Bar-bell Comparison\n\n");
    section.push_str(&format!(
        "| Lift | Blue ({}) | Red ({}) |\n",
        view.blue.tags.join(", "),
        view.red.tags.join(", ")
    ));
    section.push_str("|:---|---:|---:|\n");

    let rows = [
        ("Squat [kg]", view.blue.best_squat, view.red.best_squat),
        ("Bench [kg]", view.blue.best_bench, view.red.best_bench),
        ("Deadlift [kg]", view.blue.best_deadlift, view.red.best_deadlift),
    ];
    for (lift, blue, red) in rows {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            lift,
            format_number(blue),
            format_number(red)
        ));
    }
    section.push_str(&format!(
        "| Matching records | {} | {} |\n\n",
        format_thousands(view.blue.matched as u64),
        format_thousands(view.red.matched as u64)
    ));

    section
}

fn generate_trend_table(title: &str, points: &[YearBest]) -> String {
    let mut table = String::new();

    table.push_str(&format!("### {}\n\n", title));
    if points.is_empty() {
        table.push_str("No results in this window.\n\n");
        return table;
    }

    table.push_str("| Year | Best | Name | Bodyweight (kg) | Equipment | Federation | Country | Date |\n");
    table.push_str("|:---:|---:|:---|---:|:---|:---|:---|:---|\n");
    for point in points {
        let date = point
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            point.year,
            format_number(point.best),
            text_or_dash(point.name.as_deref()),
            format_number(point.bodyweight_kg),
            text_or_dash(Some(point.equipment.as_str())),
            text_or_dash(point.federation.as_deref()),
            text_or_dash(point.country.as_deref()),
            date,
        ));
    }
    table.push('\n');

    table
}

/// Generate the best-per-year trend section.
fn generate_trend_section(view: &TrendView) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## Best per Year: {}\n\n",
        view.series.category.axis_label()
    ));

    let bound = |year: Option<i32>| year.map_or_else(|| "any".to_string(), |y| y.to_string());
    section.push_str(&format!(
        "- **Window:** {} to {}\n",
        bound(view.from_year),
        bound(view.to_year)
    ));
    section.push_str(&format!(
        "- **Peak:** {}\n\n",
        view.peak.map_or_else(|| NO_DATA.to_string(), format_number)
    ));

    section.push_str(&generate_trend_table("Male", &view.series.male));
    section.push_str(&generate_trend_table("Female", &view.series.female));

    section
}

/// Generate the top federations section.
fn generate_federations_section(view: &FederationsView) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Top {} Federations\n\n", view.top));

    if view.federations.is_empty() {
        section.push_str("No federation matches the current filters.\n\n");
        return section;
    }

    section.push_str("| Rank | Federation | Records |\n");
    section.push_str("|:---:|:---|---:|\n");
    for (i, federation) in view.federations.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            i + 1,
            federation.federation,
            format_thousands(federation.records as u64)
        ));
    }
    section.push('\n');

    section
}

/// Generate the row issues section.
fn generate_issues_section(issues: &[RowIssue]) -> String {
    if issues.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Row Issues\n\n");
    for issue in issues.iter().take(MAX_LISTED_ISSUES) {
        section.push_str(&format!("- {}\n", issue));
    }
    if issues.len() > MAX_LISTED_ISSUES {
        section.push_str(&format!(
            "- ... and {} more\n",
            issues.len() - MAX_LISTED_ISSUES
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by liftstats v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}
