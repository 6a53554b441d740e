use serde::{Deserialize, Serialize};
use std::fmt;

/// Ett telemetri-sample fra records-tabellen.
///
/// Tidsstempelet er sekunder på en felles klokke for records og laps
/// (øktrelativ eller epoch). Enhetene følger uttrekkssteget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: f64,           // sek
    pub speed: f64,               // km/t eller m/s, som levert
    pub heart_rate: f64,          // bpm
    pub cadence: f64,             // steg/min
    pub vertical_ratio: f64,      // %
    pub ground_contact_time: f64, // ms
    pub distance: f64,            // meter, kumulativ
}

/// Eksplisitt lap-type fra laps-tabellen (kolonne `type` / `lap_nature`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LapType {
    Work,
    Recovery,
    /// Markør-lap mellom to serier.
    SeriesBreak,
    WarmUp,
    CoolDown,
}

impl LapType {
    /// Tolerant label-parser. Ukjente labels gir `None` (lapen regnes som udeklarert).
    pub fn from_label(label: &str) -> Option<Self> {
        let norm: String = label
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match norm.as_str() {
            "work" | "intensity" | "interval" | "active" | "effort" => Some(LapType::Work),
            "recovery" | "rest" | "recuperation" | "récupération" => Some(LapType::Recovery),
            "seriesbreak" | "break" | "marker" | "boundary" => Some(LapType::SeriesBreak),
            "warmup" | "echauffement" | "échauffement" => Some(LapType::WarmUp),
            "cooldown" | "retouraucalme" => Some(LapType::CoolDown),
            _ => None,
        }
    }

    pub fn is_work(self) -> bool {
        matches!(self, LapType::Work)
    }
}

impl fmt::Display for LapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LapType::Work => "Work",
            LapType::Recovery => "Recovery",
            LapType::SeriesBreak => "SeriesBreak",
            LapType::WarmUp => "Warm-up",
            LapType::CoolDown => "Cool-down",
        };
        f.write_str(s)
    }
}

/// Et eksternt deklarert intervall (én rad i laps-tabellen).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    /// 0-basert, kildens rekkefølge
    pub lap_index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub declared_type: Option<LapType>,
    /// Snittfart fra lap-tabellen (samme enhet som `Record::speed`), hvis levert.
    pub avg_speed: Option<f64>,
}

impl Lap {
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Lukket intervall `[start_time, end_time]`.
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_time && t <= self.end_time
    }
}
