use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::Lap;
use crate::segmentation::{RecoveryLapPredicate, WorkLapPredicate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LapNature {
    WarmUp,
    Intensity,
    Recovery,
    CoolDown,
    Unknown,
}

/// Fartsterskler (samme enhet som `Lap::avg_speed`, typisk km/t).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LapNatureThresholds {
    /// Intensitet: snittfart strengt over denne
    pub intensity_speed: f64,
    /// Pause: snittfart strengt under denne
    pub recovery_speed: f64,
}

impl Default for LapNatureThresholds {
    fn default() -> Self {
        Self {
            intensity_speed: 17.05,
            recovery_speed: 8.65,
        }
    }
}

/// Sekvensiell klassifisering av laps på snittfart.
///
/// 1) Intensity: fart > `intensity_speed`
/// 2) WarmUp / CoolDown: før første / etter siste intensitetslap, fart i båndet
///    `[recovery_speed, intensity_speed]`
/// 3) Recovery: fart < `recovery_speed` rett etter en intensitetslap
/// 4) Resten mellom første og siste intensitetslap: Recovery
///
/// Uten intensitetslaps blir alle laps WarmUp. Finnes ingen snittfart i det
/// hele tatt, blir alt Unknown. Laps forventes i tidsrekkefølge.
pub fn classify_lap_natures(laps: &[Lap], th: &LapNatureThresholds) -> Vec<LapNature> {
    let mut natures = vec![LapNature::Unknown; laps.len()];
    if laps.iter().all(|l| l.avg_speed.is_none()) {
        return natures;
    }

    let in_band = |v: f64| v >= th.recovery_speed && v <= th.intensity_speed;

    for (i, lap) in laps.iter().enumerate() {
        if lap.avg_speed.map_or(false, |v| v > th.intensity_speed) {
            natures[i] = LapNature::Intensity;
        }
    }

    let first = natures.iter().position(|n| *n == LapNature::Intensity);
    let last = natures.iter().rposition(|n| *n == LapNature::Intensity);
    let (Some(first), Some(last)) = (first, last) else {
        return vec![LapNature::WarmUp; laps.len()];
    };

    for (i, lap) in laps.iter().enumerate() {
        let Some(v) = lap.avg_speed else { continue };
        if i < first && in_band(v) {
            natures[i] = LapNature::WarmUp;
        } else if i > last && in_band(v) {
            natures[i] = LapNature::CoolDown;
        }
    }

    // forrige lap sin natur leses før pause-tildelingen i denne runden
    let before = natures.clone();
    for (i, lap) in laps.iter().enumerate().skip(1) {
        let slow = lap.avg_speed.map_or(false, |v| v < th.recovery_speed);
        if slow && before[i - 1] == LapNature::Intensity {
            natures[i] = LapNature::Recovery;
        }
    }

    for n in natures.iter_mut().take(last + 1).skip(first) {
        if *n == LapNature::Unknown {
            *n = LapNature::Recovery;
        }
    }

    natures
}

/// Work- og pause-predikat basert på lap-naturene.
///
/// Intensity er work. Recovery og Unknown kan være pause; WarmUp og CoolDown
/// kan ikke. Laps som ikke var med i klassifiseringen regnes som Unknown.
#[derive(Debug, Clone, Default)]
pub struct LapNatures {
    natures: BTreeMap<usize, LapNature>,
}

impl LapNatures {
    pub fn classify(laps: &[Lap], th: &LapNatureThresholds) -> Self {
        let natures = laps
            .iter()
            .map(|l| l.lap_index)
            .zip(classify_lap_natures(laps, th))
            .collect();
        Self { natures }
    }

    pub fn nature_of(&self, lap: &Lap) -> LapNature {
        self.natures
            .get(&lap.lap_index)
            .copied()
            .unwrap_or(LapNature::Unknown)
    }
}

impl WorkLapPredicate for LapNatures {
    fn is_work(&self, lap: &Lap) -> bool {
        self.nature_of(lap) == LapNature::Intensity
    }
}

impl RecoveryLapPredicate for LapNatures {
    fn is_recovery(&self, lap: &Lap) -> bool {
        matches!(
            self.nature_of(lap),
            LapNature::Recovery | LapNature::Unknown
        )
    }
}
