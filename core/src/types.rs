use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacingClass {
    Steady,
    Unsteady,
}

impl fmt::Display for PacingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacingClass::Steady => f.write_str("Steady"),
            PacingClass::Unsteady => f.write_str("Unsteady"),
        }
    }
}

/// Ikke-fatal grunn til at en repetisjon holdes utenfor klassifisering og sammenligning.
/// Repetisjonen beholdes likevel i utdata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    /// Ingen records innenfor work-lapens tidsspenn.
    EmptyWorkWindow,
    /// Snittfart 0 => drift udefinert.
    ZeroMeanSpeed,
}

impl Exclusion {
    pub fn as_str(self) -> &'static str {
        match self {
            Exclusion::EmptyWorkWindow => "empty_work_window",
            Exclusion::ZeroMeanSpeed => "zero_mean_speed",
        }
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-repetisjon sammendrag. `None` = udefinert (aldri 0 som stedfortreder).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepMetrics {
    pub series: u32,
    pub rep_index_in_series: u32,
    pub work_lap_index: usize,
    pub record_count: usize,
    pub duration_s: f64,
    pub distance_m: Option<f64>,
    pub mean_speed: Option<f64>,
    pub mean_cadence: Option<f64>,
    pub mean_heart_rate: Option<f64>,
    pub mean_vertical_ratio: Option<f64>,
    pub mean_ground_contact_time: Option<f64>,
    pub speed_variance: Option<f64>,
    pub hr_min: Option<f64>,
    pub hr_max: Option<f64>,
    pub hr_amplitude: Option<f64>,
    pub pacing_drift_percent: Option<f64>,
    pub pacing_class: Option<PacingClass>,
    pub exclusion: Option<Exclusion>,
}

impl RepMetrics {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.exclusion.is_none()
    }
}

/// Per-repetisjon kanal, brukt til serie-snitt og korrelasjoner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepChannel {
    Speed,
    Cadence,
    HeartRate,
    VerticalRatio,
    GroundContactTime,
    PacingDrift,
    HrAmplitude,
}

impl RepChannel {
    pub fn value(self, m: &RepMetrics) -> Option<f64> {
        match self {
            RepChannel::Speed => m.mean_speed,
            RepChannel::Cadence => m.mean_cadence,
            RepChannel::HeartRate => m.mean_heart_rate,
            RepChannel::VerticalRatio => m.mean_vertical_ratio,
            RepChannel::GroundContactTime => m.mean_ground_contact_time,
            RepChannel::PacingDrift => m.pacing_drift_percent,
            RepChannel::HrAmplitude => m.hr_amplitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoverySample {
    pub series: u32,
    pub rep_index_in_series: u32,
    pub recovery_lap_index: usize,
    pub duration_s: f64,
    pub record_count: usize,
    pub start_heart_rate: f64,
    pub end_heart_rate: f64,
    /// Rå fall (bpm) fra start til slutt av pausen.
    pub hr_drop_bpm: f64,
    /// Fallet normalisert på pausens varighet (bpm/min).
    pub hr_drop_rate_bpm_per_min: f64,
    pub end_of_recovery_heart_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub series: u32,
    pub rep_count: usize,
    pub valid_rep_count: usize,
    pub mean_speed: Option<f64>,
    pub mean_cadence: Option<f64>,
    pub mean_heart_rate: Option<f64>,
    pub mean_vertical_ratio: Option<f64>,
    pub mean_ground_contact_time: Option<f64>,
    pub mean_speed_variance: Option<f64>,
    pub mean_pacing_drift_percent: Option<f64>,
    pub steady_count: usize,
    pub unsteady_count: usize,
    pub mean_hr_amplitude: Option<f64>,
    pub recovery_count: usize,
    pub mean_hr_drop_bpm: Option<f64>,
    pub mean_hr_drop_rate_bpm_per_min: Option<f64>,
    pub mean_end_of_recovery_heart_rate: Option<f64>,
}

/// Endring senere minus tidligere serie.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub earlier: Option<f64>,
    pub later: Option<f64>,
    pub delta: Option<f64>,
    /// Kun for fart og kadens.
    pub relative_change_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesComparison {
    pub earlier_series: u32,
    pub later_series: u32,
    pub speed: MetricDelta,
    pub cadence: MetricDelta,
    pub heart_rate: MetricDelta,
    pub hr_amplitude: MetricDelta,
    pub vertical_ratio: MetricDelta,
    pub ground_contact_time: MetricDelta,
    pub pacing_drift_percent: MetricDelta,
    pub hr_drop_bpm: MetricDelta,
    pub hr_drop_rate_bpm_per_min: MetricDelta,
    pub end_of_recovery_heart_rate: MetricDelta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    TooFewPoints,
    ZeroVariance,
    LengthMismatch,
}

/// Pearson-korrelasjon. `Undefined` tvinges aldri til 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Correlation {
    Defined { r: f64 },
    Undefined { reason: UndefinedReason },
}

impl Correlation {
    pub fn value(&self) -> Option<f64> {
        match *self {
            Correlation::Defined { r } => Some(r),
            Correlation::Undefined { .. } => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Correlation::Defined { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricCorrelation {
    pub x: RepChannel,
    pub y: RepChannel,
    pub n: usize,
    pub correlation: Correlation,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub pairs: Vec<SeriesComparison>,
    pub correlations: Vec<MetricCorrelation>,
}

impl ComparisonResult {
    pub fn pair(&self, earlier: u32, later: u32) -> Option<&SeriesComparison> {
        self.pairs
            .iter()
            .find(|p| p.earlier_series == earlier && p.later_series == later)
    }

    pub fn correlation(&self, x: RepChannel, y: RepChannel) -> Option<&MetricCorrelation> {
        self.correlations.iter().find(|c| c.x == x && c.y == y)
    }
}
