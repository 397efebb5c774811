// ********* Risk of strategic voting ***********

use crate::config::*;
use crate::manipulation::Scenario;

/// The gain of every voter from their best manipulation, 0 for the voters
/// without one.
pub fn strategic_gains(best: &[Option<Scenario>], measure: GainMeasure) -> Vec<f64> {
    best.iter()
        .map(|s| {
            s.as_ref()
                .and_then(|s| s.gains(measure).first().copied())
                .unwrap_or(0.0)
        })
        .collect()
}

// Linear interpolation between the closest ranks, `p` in [0, 100].
fn percentile(values: &[f64], p: f64) -> f64 {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let h = (sorted.len() - 1) as f64 * p / 100.0;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Reduces per-voter incentives or gains to a single number.
///
/// Every policy returns 0 when no entry is nonzero, including for an empty slice.
pub fn aggregate(values: &[f64], policy: &AggregationPolicy) -> f64 {
    let nonzero: Vec<f64> = values.iter().copied().filter(|x| *x != 0.0).collect();
    if nonzero.is_empty() {
        return 0.0;
    }
    match policy {
        AggregationPolicy::CountStrategicVotes => nonzero.len() as f64 / values.len() as f64,
        AggregationPolicy::AverageGain { include_zero } => {
            if *include_zero {
                mean(values)
            } else {
                mean(&nonzero)
            }
        }
        AggregationPolicy::PercentileGain {
            percentile: p,
            include_zero,
        } => {
            if *include_zero {
                percentile(values, *p)
            } else {
                percentile(&nonzero, *p)
            }
        }
        AggregationPolicy::MaxGain => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}
