use serde::{Deserialize, Serialize};

use crate::models::Record;

/// Pause-deteksjon mellom to påfølgende records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PauseRules {
    /// Minste tidshopp (sek) som kan være en pause
    pub min_gap_s: f64,
    /// Maks tilbakelagt distanse (m) i hoppet
    pub max_distance_m: f64,
}

impl Default for PauseRules {
    fn default() -> Self {
        Self {
            min_gap_s: 10.0,
            max_distance_m: 1.0,
        }
    }
}

impl PauseRules {
    /// Korreksjon for ett steg: `dt - 1` sek ved pause, ellers 0.
    #[inline]
    fn correction(&self, dt: f64, dd: f64) -> f64 {
        if dt >= self.min_gap_s && dd <= self.max_distance_m {
            dt - 1.0
        } else {
            0.0
        }
    }
}

/// "Moving time" per record: tid fra første record minus kumulative pauser.
pub fn moving_elapsed(records: &[Record], rules: &PauseRules) -> Vec<f64> {
    let Some(first) = records.first() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(records.len());
    out.push(0.0);
    let mut paused = 0.0;
    for w in records.windows(2) {
        let dt = w[1].timestamp - w[0].timestamp;
        let dd = w[1].distance - w[0].distance;
        paused += rules.correction(dt, dd);
        out.push(w[1].timestamp - first.timestamp - paused);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOverview {
    pub record_count: usize,
    pub elapsed_s: f64,
    pub moving_time_s: f64,
    pub distance_m: f64,
    pub pause_count: usize,
    pub elapsed_hms: Option<String>,
    pub moving_hms: Option<String>,
}

pub fn session_overview(records: &[Record], rules: &PauseRules) -> SessionOverview {
    let moving = moving_elapsed(records, rules);
    let pause_count = records
        .windows(2)
        .filter(|w| rules.correction(w[1].timestamp - w[0].timestamp, w[1].distance - w[0].distance) > 0.0)
        .count();

    let (elapsed_s, distance_m) = match (records.first(), records.last()) {
        (Some(a), Some(b)) => (b.timestamp - a.timestamp, b.distance - a.distance),
        _ => (0.0, 0.0),
    };
    let moving_time_s = moving.last().copied().unwrap_or(0.0);

    SessionOverview {
        record_count: records.len(),
        elapsed_s,
        moving_time_s,
        distance_m,
        pause_count,
        elapsed_hms: format_hms(elapsed_s),
        moving_hms: format_hms(moving_time_s),
    }
}

/// `mm:ss`, f.eks. 03:07. Hele sekunder, brøkdelen kuttes.
pub fn format_mm_ss(seconds: f64) -> Option<String> {
    let total = whole_seconds(seconds)?;
    Some(format!("{:02}:{:02}", total / 60, total % 60))
}

/// `h:mm:ss`, eller `mm:ss` under én time. Brøkdelen kuttes.
pub fn format_hms(seconds: f64) -> Option<String> {
    let total = whole_seconds(seconds)?;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        Some(format!("{h}:{m:02}:{s:02}"))
    } else {
        Some(format!("{m:02}:{s:02}"))
    }
}

fn whole_seconds(seconds: f64) -> Option<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(seconds.trunc() as u64)
}
