use serde::{Deserialize, Serialize};

use crate::models::Record;
use crate::segmentation::Repetition;
use crate::stats::mean;
use crate::types::RecoverySample;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryOptions {
    /// Antall siste samples som snittes for "puls ved slutt av pause" (min 1).
    pub tail_samples: usize,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        Self { tail_samples: 1 }
    }
}

/// Pulsfall over pause-lapen til en repetisjon.
///
/// `None` når repetisjonen mangler pause-lap, lapen har ikke-positivt spenn,
/// eller ingen records dekker den.
pub fn analyze_recovery(
    rep: &Repetition,
    records: &[Record],
    opts: &RecoveryOptions,
) -> Option<RecoverySample> {
    let lap = rep.recovery_lap?;
    let window = rep.recovery_records(records)?;
    let (first, last) = (window.first()?, window.last()?);

    // ikke-positivt spenn => raten er udefinert, ingen prøve
    let duration_s = lap.duration();
    if !(duration_s > 0.0) {
        return None;
    }
    let drop = first.heart_rate - last.heart_rate;
    let rate = drop / (duration_s / 60.0);

    let tail = opts.tail_samples.max(1).min(window.len());
    let tail_hr: Vec<f64> = window[window.len() - tail..]
        .iter()
        .map(|r| r.heart_rate)
        .collect();
    let end_of_recovery = mean(&tail_hr).unwrap_or(last.heart_rate);

    Some(RecoverySample {
        series: rep.series,
        rep_index_in_series: rep.rep_index_in_series,
        recovery_lap_index: lap.lap_index,
        duration_s,
        record_count: window.len(),
        start_heart_rate: first.heart_rate,
        end_heart_rate: last.heart_rate,
        hr_drop_bpm: drop,
        hr_drop_rate_bpm_per_min: rate,
        end_of_recovery_heart_rate: end_of_recovery,
    })
}
