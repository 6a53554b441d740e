use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::stats::{mean_defined, pearson};
use crate::types::{
    ComparisonResult, MetricCorrelation, MetricDelta, PacingClass, RecoverySample, RepChannel,
    RepMetrics, SeriesComparison, SeriesSummary,
};

/// Hvilke serier som sammenlignes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeriesPairing {
    /// (1,2), (2,3), …
    #[default]
    Adjacent,
    /// Eksplisitte (tidligere, senere)-par.
    Pairs(Vec<(u32, u32)>),
}

/// Korrelasjoner på tvers av gyldige repetisjoner i økten.
pub const SESSION_CORRELATIONS: [(RepChannel, RepChannel); 4] = [
    (RepChannel::GroundContactTime, RepChannel::Speed),
    (RepChannel::Cadence, RepChannel::Speed),
    (RepChannel::VerticalRatio, RepChannel::Speed),
    (RepChannel::HeartRate, RepChannel::Speed),
];

/// Ett sammendrag per serie, i stigende serienummer.
/// Ekskluderte repetisjoner telles, men snittes ikke.
pub fn summarize_series(metrics: &[RepMetrics], recoveries: &[RecoverySample]) -> Vec<SeriesSummary> {
    let series: BTreeSet<u32> = metrics.iter().map(|m| m.series).collect();

    series
        .into_iter()
        .map(|s| {
            let all: Vec<&RepMetrics> = metrics.iter().filter(|m| m.series == s).collect();
            let valid: Vec<&RepMetrics> = all.iter().copied().filter(|m| m.is_valid()).collect();
            let recs: Vec<&RecoverySample> = recoveries.iter().filter(|r| r.series == s).collect();

            let avg = |f: fn(&RepMetrics) -> Option<f64>| mean_defined(valid.iter().map(|m| f(m)));
            let count = |c: PacingClass| valid.iter().filter(|m| m.pacing_class == Some(c)).count();

            SeriesSummary {
                series: s,
                rep_count: all.len(),
                valid_rep_count: valid.len(),
                mean_speed: avg(|m| m.mean_speed),
                mean_cadence: avg(|m| m.mean_cadence),
                mean_heart_rate: avg(|m| m.mean_heart_rate),
                mean_vertical_ratio: avg(|m| m.mean_vertical_ratio),
                mean_ground_contact_time: avg(|m| m.mean_ground_contact_time),
                mean_speed_variance: avg(|m| m.speed_variance),
                mean_pacing_drift_percent: avg(|m| m.pacing_drift_percent),
                steady_count: count(PacingClass::Steady),
                unsteady_count: count(PacingClass::Unsteady),
                mean_hr_amplitude: avg(|m| m.hr_amplitude),
                recovery_count: recs.len(),
                mean_hr_drop_bpm: mean_defined(recs.iter().map(|r| Some(r.hr_drop_bpm))),
                mean_hr_drop_rate_bpm_per_min: mean_defined(
                    recs.iter().map(|r| Some(r.hr_drop_rate_bpm_per_min)),
                ),
                mean_end_of_recovery_heart_rate: mean_defined(
                    recs.iter().map(|r| Some(r.end_of_recovery_heart_rate)),
                ),
            }
        })
        .collect()
}

impl MetricDelta {
    /// `later - earlier`; relativ endring kun når `relative` og tidligere verdi ≠ 0.
    pub fn between(earlier: Option<f64>, later: Option<f64>, relative: bool) -> Self {
        let delta = match (earlier, later) {
            (Some(e), Some(l)) => Some(l - e),
            _ => None,
        };
        let relative_change_percent = match (relative, earlier, delta) {
            (true, Some(e), Some(d)) if e != 0.0 => Some(100.0 * d / e),
            _ => None,
        };
        Self {
            earlier,
            later,
            delta,
            relative_change_percent,
        }
    }
}

pub fn compare_pair(earlier: &SeriesSummary, later: &SeriesSummary) -> SeriesComparison {
    let d = |f: fn(&SeriesSummary) -> Option<f64>, rel: bool| {
        MetricDelta::between(f(earlier), f(later), rel)
    };
    SeriesComparison {
        earlier_series: earlier.series,
        later_series: later.series,
        speed: d(|s| s.mean_speed, true),
        cadence: d(|s| s.mean_cadence, true),
        heart_rate: d(|s| s.mean_heart_rate, false),
        hr_amplitude: d(|s| s.mean_hr_amplitude, false),
        vertical_ratio: d(|s| s.mean_vertical_ratio, false),
        ground_contact_time: d(|s| s.mean_ground_contact_time, false),
        pacing_drift_percent: d(|s| s.mean_pacing_drift_percent, false),
        hr_drop_bpm: d(|s| s.mean_hr_drop_bpm, false),
        hr_drop_rate_bpm_per_min: d(|s| s.mean_hr_drop_rate_bpm_per_min, false),
        end_of_recovery_heart_rate: d(|s| s.mean_end_of_recovery_heart_rate, false),
    }
}

/// Pearson over gyldige repetisjoner der begge kanalene er definert.
pub fn channel_correlation(metrics: &[RepMetrics], x: RepChannel, y: RepChannel) -> MetricCorrelation {
    let (xs, ys): (Vec<f64>, Vec<f64>) = metrics
        .iter()
        .filter(|m| m.is_valid())
        .filter_map(|m| Some((x.value(m)?, y.value(m)?)))
        .unzip();
    MetricCorrelation {
        x,
        y,
        n: xs.len(),
        correlation: pearson(&xs, &ys),
    }
}

pub fn session_correlations(metrics: &[RepMetrics]) -> Vec<MetricCorrelation> {
    SESSION_CORRELATIONS
        .iter()
        .map(|(x, y)| channel_correlation(metrics, *x, *y))
        .collect()
}

/// Serie-sammenligninger for valgt paring + øktkorrelasjoner.
pub fn compare(
    summaries: &[SeriesSummary],
    metrics: &[RepMetrics],
    pairing: &SeriesPairing,
) -> ComparisonResult {
    let find = |n: u32| summaries.iter().find(|s| s.series == n);

    let pairs: Vec<SeriesComparison> = match pairing {
        SeriesPairing::Adjacent => summaries
            .windows(2)
            .map(|w| compare_pair(&w[0], &w[1]))
            .collect(),
        SeriesPairing::Pairs(list) => list
            .iter()
            .filter_map(|&(e, l)| match (find(e), find(l)) {
                (Some(a), Some(b)) => Some(compare_pair(a, b)),
                _ => {
                    log::warn!("seriepar ({e}, {l}) finnes ikke i økten, hoppes over");
                    None
                }
            })
            .collect(),
    };

    ComparisonResult {
        pairs,
        correlations: session_correlations(metrics),
    }
}
