use serde::{Deserialize, Serialize};

use crate::stats::median;
use crate::types::{Exclusion, PacingClass, RepMetrics};

/// Drift i prosent: `100 * sqrt(var) / mean`. Udefinert for ikke-positiv snittfart.
pub fn pacing_drift_percent(speed_variance: f64, mean_speed: f64) -> Option<f64> {
    if !(mean_speed > 0.0) || !speed_variance.is_finite() || speed_variance < 0.0 {
        return None;
    }
    Some(100.0 * speed_variance.sqrt() / mean_speed)
}

/// `drift <= median` => Steady. Likhet teller som Steady.
#[inline]
pub fn label(drift: f64, median_drift: f64) -> PacingClass {
    if drift <= median_drift {
        PacingClass::Steady
    } else {
        PacingClass::Unsteady
    }
}

/// Regelen alene: median over driftene og en klasse per drift.
pub fn classify_drifts(drifts: &[f64]) -> (Option<f64>, Vec<PacingClass>) {
    let Some(m) = median(drifts) else {
        return (None, Vec::new());
    };
    (Some(m), drifts.iter().map(|d| label(*d, m)).collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingOutcome {
    pub metrics: Vec<RepMetrics>,
    /// Beregnet på nytt per kall, kun over gyldige repetisjoner.
    pub median_drift_percent: Option<f64>,
}

/// Klassifiserer repetisjonene mot øktens median drift.
///
/// Repetisjoner uten definert drift (tomt vindu, snittfart 0) får ingen
/// klasse og påvirker ikke medianen.
pub fn classify(metrics: &[RepMetrics]) -> PacingOutcome {
    let mut out: Vec<RepMetrics> = metrics.to_vec();

    for m in out.iter_mut() {
        m.pacing_drift_percent = None;
        m.pacing_class = None;
        if !m.is_valid() {
            continue;
        }
        let (Some(var), Some(mean)) = (m.speed_variance, m.mean_speed) else {
            continue;
        };
        match pacing_drift_percent(var, mean) {
            Some(d) => m.pacing_drift_percent = Some(d),
            None => {
                log::warn!(
                    "serie {} rep {}: snittfart {} gir udefinert drift",
                    m.series,
                    m.rep_index_in_series,
                    mean
                );
                m.exclusion = Some(Exclusion::ZeroMeanSpeed);
            }
        }
    }

    let drifts: Vec<f64> = out.iter().filter_map(|m| m.pacing_drift_percent).collect();
    let median_drift = median(&drifts);

    if let Some(md) = median_drift {
        for m in out.iter_mut() {
            if let Some(d) = m.pacing_drift_percent {
                m.pacing_class = Some(label(d, md));
            }
        }
    }

    log::debug!(
        "pacing: {} rep(s) med drift, median {:?}%",
        drifts.len(),
        median_drift
    );

    PacingOutcome {
        metrics: out,
        median_drift_percent: median_drift,
    }
}
