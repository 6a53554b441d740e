use serde::{Deserialize, Serialize};
use serde_json as json;
use serde_path_to_error as spte;

use crate::compare::SeriesPairing;
use crate::error::ConfigError;
use crate::lap_nature::{LapNatureThresholds, LapNatures};
use crate::models::Lap;
use crate::moving::PauseRules;
use crate::recovery::RecoveryOptions;
use crate::segmentation::{
    AcceptAll, AnyOf, DeclaredRecovery, DeclaredType, ExplicitMarker, MaxLapDuration,
    MinLapSpeed, NeverSplit, RecoveryLapPredicate, RecoveryMultipleOfMedian, SegmentationRules,
    SeriesBoundaryPolicy, WorkLapPredicate,
};

/// Heuristikk for laps uten (eller når man ignorerer) deklarert type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkHeuristic {
    /// Sekvensiell lap-natur-klassifisering på snittfart.
    LapNature,
    MinLapSpeed { min_speed: f64 },
    MaxLapDuration { max_duration_s: f64 },
}

impl Default for WorkHeuristic {
    fn default() -> Self {
        WorkHeuristic::LapNature
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkLapRule {
    /// Deklarert `type` på lapen vinner over heuristikken.
    pub prefer_declared: bool,
    pub heuristic: WorkHeuristic,
}

impl Default for WorkLapRule {
    fn default() -> Self {
        Self {
            prefer_declared: true,
            heuristic: WorkHeuristic::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesBoundaryRule {
    pub explicit_markers: bool,
    /// `None` slår av median-regelen.
    pub recovery_multiple_of_median: Option<f64>,
}

impl Default for SeriesBoundaryRule {
    fn default() -> Self {
        Self {
            explicit_markers: true,
            recovery_multiple_of_median: Some(2.0),
        }
    }
}

/// Alle justerbare parametre for én analyse. Alt har default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub work_lap_rule: WorkLapRule,
    pub series_boundary: SeriesBoundaryRule,
    pub recovery: RecoveryOptions,
    pub pairing: SeriesPairing,
    pub pause: PauseRules,
    pub lap_nature: LapNatureThresholds,
}

impl AnalysisConfig {
    /// Tolker JSON; feil rapporteres med sti (f.eks. `series_boundary.explicit_markers`).
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let mut de = json::Deserializer::from_str(s);
        spte::deserialize(&mut de).map_err(|e| ConfigError::Parse {
            location: e.path().to_string(),
            message: e.inner().to_string(),
        })
    }

    /// Bygger segmenteringsreglene. Lap-natur-heuristikken trenger hele lap-listen.
    pub fn segmentation_rules(&self, laps: &[Lap]) -> SegmentationRules {
        // nedjogg/oppvarming etter en work-lap er ikke pause
        let (heuristic, eligible): (Box<dyn WorkLapPredicate>, Box<dyn RecoveryLapPredicate>) =
            match &self.work_lap_rule.heuristic {
                WorkHeuristic::LapNature => {
                    let mut ordered = laps.to_vec();
                    ordered.sort_by(|a, b| {
                        a.start_time
                            .total_cmp(&b.start_time)
                            .then(a.lap_index.cmp(&b.lap_index))
                    });
                    let natures = LapNatures::classify(&ordered, &self.lap_nature);
                    (Box::new(natures.clone()), Box::new(natures))
                }
                WorkHeuristic::MinLapSpeed { min_speed } => (
                    Box::new(MinLapSpeed {
                        min_speed: *min_speed,
                    }),
                    Box::new(AcceptAll),
                ),
                WorkHeuristic::MaxLapDuration { max_duration_s } => (
                    Box::new(MaxLapDuration {
                        max_duration_s: *max_duration_s,
                    }),
                    Box::new(AcceptAll),
                ),
            };

        let (work, recovery): (Box<dyn WorkLapPredicate>, Box<dyn RecoveryLapPredicate>) =
            if self.work_lap_rule.prefer_declared {
                (
                    Box::new(DeclaredType {
                        fallback: move |l: &Lap| heuristic.is_work(l),
                    }),
                    Box::new(DeclaredRecovery {
                        fallback: move |l: &Lap| eligible.is_recovery(l),
                    }),
                )
            } else {
                (heuristic, eligible)
            };

        let mut policies: Vec<Box<dyn SeriesBoundaryPolicy>> = Vec::new();
        if self.series_boundary.explicit_markers {
            policies.push(Box::new(ExplicitMarker));
        }
        if let Some(factor) = self.series_boundary.recovery_multiple_of_median {
            policies.push(Box::new(RecoveryMultipleOfMedian { factor }));
        }
        let boundary: Box<dyn SeriesBoundaryPolicy> = if policies.is_empty() {
            Box::new(NeverSplit)
        } else {
            Box::new(AnyOf(policies))
        };

        SegmentationRules {
            work,
            recovery,
            boundary,
        }
    }
}
