//! Color-scale domain and legend derivation.

use super::aggregator::GroupedAggregates;
use super::stats::{extent, median};
use crate::models::{ColorDomain, LegendSummary, Metric, ScaleKind};

/// Domain of the sequential color scale for `metric`.
///
/// NaN values are skipped. Count metrics use a log scale whose minimum is
/// floored to 1. `None` when no group has a finite value.
pub fn color_domain(values: impl IntoIterator<Item = f64>, metric: Metric) -> Option<ColorDomain> {
    let (min, max) = extent(values)?;

    if metric.is_count() {
        Some(ColorDomain {
            min: min.max(1.0),
            max,
            scale: ScaleKind::Log,
        })
    } else {
        Some(ColorDomain {
            min,
            max,
            scale: ScaleKind::Linear,
        })
    }
}

/// Color domain over the metric values of every group.
pub fn aggregate_domain(aggregates: &GroupedAggregates, metric: Metric) -> Option<ColorDomain> {
    color_domain(aggregates.iter().map(|a| metric.value_of(a)), metric)
}

/// Min / median / max of the finite metric values across groups.
pub fn legend_summary(aggregates: &GroupedAggregates, metric: Metric) -> Option<LegendSummary> {
    let domain = aggregate_domain(aggregates, metric)?;
    Some(LegendSummary {
        label: metric.label().to_string(),
        min: domain.min,
        median: median(aggregates.iter().map(|a| metric.value_of(a))),
        max: domain.max,
    })
}

impl ColorDomain {
    /// Position of `value` within the domain, clamped to `[0, 1]`.
    ///
    /// `None` for non-finite values, which render as "no data".
    pub fn position(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        let t = match self.scale {
            ScaleKind::Linear => {
                if self.max == self.min {
                    return Some(0.0);
                }
                (value - self.min) / (self.max - self.min)
            }
            ScaleKind::Log => {
                if value <= 0.0 || self.max <= self.min {
                    return Some(0.0);
                }
                (value.ln() - self.min.ln()) / (self.max.ln() - self.min.ln())
            }
        };
        Some(t.clamp(0.0, 1.0))
    }

    /// `steps + 1` evenly spaced gradient stops from min to max.
    pub fn stops(&self, steps: usize) -> Vec<f64> {
        if steps == 0 {
            return vec![self.min];
        }
        (0..=steps)
            .map(|i| {
                let t = i as f64 / steps as f64;
                match self.scale {
                    ScaleKind::Linear => self.min + (self.max - self.min) * t,
                    ScaleKind::Log => self.min * (self.max / self.min).powf(t),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AggregateResult;
    use approx::assert_abs_diff_eq;

    fn aggregate(group: &str, dots: f64, count: usize) -> AggregateResult {
        AggregateResult {
            group: group.to_string(),
            median_dots: dots,
            median_total: f64::NAN,
            lift_count: count,
            splits: None,
        }
    }

    #[test]
    fn test_domain_skips_nan() {
        let domain = color_domain([f64::NAN, 300.0, 250.0, 410.0], Metric::MedianDots).unwrap();
        assert_eq!(domain.min, 250.0);
        assert_eq!(domain.max, 410.0);
        assert_eq!(domain.scale, ScaleKind::Linear);
    }

    #[test]
    fn test_count_domain_floors_min() {
        let domain = color_domain([0.0, 12.0, 3000.0], Metric::LiftCount).unwrap();
        assert_eq!(domain.min, 1.0);
        assert_eq!(domain.max, 3000.0);
        assert_eq!(domain.scale, ScaleKind::Log);
    }

    #[test]
    fn test_domain_none_without_values() {
        assert!(color_domain([f64::NAN, f64::NAN], Metric::MedianTotal).is_none());
        assert!(color_domain(Vec::<f64>::new(), Metric::LiftCount).is_none());
    }

    #[test]
    fn test_legend_summary() {
        let aggregates: GroupedAggregates = vec![
            aggregate("A", 200.0, 5),
            aggregate("B", f64::NAN, 0),
            aggregate("C", 400.0, 50),
            aggregate("D", 300.0, 7),
        ]
        .into_iter()
        .collect();

        let legend = legend_summary(&aggregates, Metric::MedianDots).unwrap();
        assert_eq!(legend.label, "Median Dots");
        assert_eq!(legend.min, 200.0);
        assert_eq!(legend.median, 300.0);
        assert_eq!(legend.max, 400.0);

        let counts = legend_summary(&aggregates, Metric::LiftCount).unwrap();
        assert_eq!(counts.min, 1.0);
        assert_eq!(counts.median, 6.0);
    }

    #[test]
    fn test_log_stops_and_position() {
        let domain = ColorDomain {
            min: 1.0,
            max: 100.0,
            scale: ScaleKind::Log,
        };
        let stops = domain.stops(2);
        assert_eq!(stops.len(), 3);
        assert_abs_diff_eq!(stops[1], 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(domain.position(10.0).unwrap(), 0.5, epsilon = 1e-9);
        assert_eq!(domain.position(f64::NAN), None);
        assert_eq!(domain.position(1000.0), Some(1.0));
    }

    #[test]
    fn test_linear_position() {
        let domain = ColorDomain {
            min: 200.0,
            max: 400.0,
            scale: ScaleKind::Linear,
        };
        assert_eq!(domain.position(300.0), Some(0.5));
        assert_eq!(domain.stops(4)[1], 250.0);
    }
}
