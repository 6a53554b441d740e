//! Segmentering av laps til repetisjoner og serier.
//!
//! Work-lap-predikat, pause-predikat og seriegrense-policy er injiserbare
//! (trait-objekter eller closures), siden "2 × [8 × …]"-strukturen er
//! øktspesifikk.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::SegmentationError;
use crate::filter::span_range;
use crate::models::{Lap, LapType, Record};
use crate::stats::median;

// Toleranse for overlapp mellom naboer (avrunding i kildetabellen)
const OVERLAP_EPS_S: f64 = 1e-6;

pub trait WorkLapPredicate {
    fn is_work(&self, lap: &Lap) -> bool;
}

impl<F> WorkLapPredicate for F
where
    F: Fn(&Lap) -> bool,
{
    fn is_work(&self, lap: &Lap) -> bool {
        self(lap)
    }
}

/// Deklarert type vinner; udeklarerte laps går til `fallback`.
#[derive(Debug, Clone)]
pub struct DeclaredType<P> {
    pub fallback: P,
}

impl<P: WorkLapPredicate> WorkLapPredicate for DeclaredType<P> {
    fn is_work(&self, lap: &Lap) -> bool {
        match lap.declared_type {
            Some(t) => t.is_work(),
            None => self.fallback.is_work(lap),
        }
    }
}

/// Work hvis lapens snittfart er strengt over `min_speed`.
#[derive(Debug, Clone, Copy)]
pub struct MinLapSpeed {
    pub min_speed: f64,
}

impl WorkLapPredicate for MinLapSpeed {
    fn is_work(&self, lap: &Lap) -> bool {
        lap.avg_speed.map_or(false, |v| v > self.min_speed)
    }
}

/// Work hvis lapen ikke er lengre enn `max_duration_s` (korte drag, lange pauser).
#[derive(Debug, Clone, Copy)]
pub struct MaxLapDuration {
    pub max_duration_s: f64,
}

impl WorkLapPredicate for MaxLapDuration {
    fn is_work(&self, lap: &Lap) -> bool {
        lap.duration() <= self.max_duration_s
    }
}

/// Kan en ikke-work lap rett etter en work-lap være pausen til repetisjonen?
pub trait RecoveryLapPredicate {
    fn is_recovery(&self, lap: &Lap) -> bool;
}

impl<F> RecoveryLapPredicate for F
where
    F: Fn(&Lap) -> bool,
{
    fn is_recovery(&self, lap: &Lap) -> bool {
        self(lap)
    }
}

/// Enhver ikke-work lap kan være pause.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl RecoveryLapPredicate for AcceptAll {
    fn is_recovery(&self, _lap: &Lap) -> bool {
        true
    }
}

/// Deklarert `Recovery` er pause, andre deklarerte typer (nedjogg,
/// oppvarming, markør) er det ikke. Udeklarerte laps går til `fallback`.
#[derive(Debug, Clone)]
pub struct DeclaredRecovery<P> {
    pub fallback: P,
}

impl<P: RecoveryLapPredicate> RecoveryLapPredicate for DeclaredRecovery<P> {
    fn is_recovery(&self, lap: &Lap) -> bool {
        match lap.declared_type {
            Some(t) => t == LapType::Recovery,
            None => self.fallback.is_recovery(lap),
        }
    }
}

/// Det policyen får se ved overgangen fra én repetisjon til neste.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryContext<'a> {
    /// Pause-lapen til forrige repetisjon, hvis den har en.
    pub recovery: Option<&'a Lap>,
    /// Øvrige ikke-work laps mellom pausen og neste work-lap.
    pub between: &'a [Lap],
    /// Median varighet av alle pause-laps i økten.
    pub median_recovery_s: Option<f64>,
}

pub trait SeriesBoundaryPolicy {
    /// `true` => neste repetisjon starter en ny serie.
    fn is_boundary(&self, ctx: &BoundaryContext<'_>) -> bool;
}

impl<F> SeriesBoundaryPolicy for F
where
    F: Fn(&BoundaryContext<'_>) -> bool,
{
    fn is_boundary(&self, ctx: &BoundaryContext<'_>) -> bool {
        self(ctx)
    }
}

/// Ny serie når pausen er lengre enn `factor` × median pausevarighet.
#[derive(Debug, Clone, Copy)]
pub struct RecoveryMultipleOfMedian {
    pub factor: f64,
}

impl SeriesBoundaryPolicy for RecoveryMultipleOfMedian {
    fn is_boundary(&self, ctx: &BoundaryContext<'_>) -> bool {
        match (ctx.recovery, ctx.median_recovery_s) {
            (Some(r), Some(m)) => r.duration() > self.factor * m,
            _ => false,
        }
    }
}

/// Ny serie ved en eksplisitt markør-lap (`LapType::SeriesBreak`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitMarker;

impl SeriesBoundaryPolicy for ExplicitMarker {
    fn is_boundary(&self, ctx: &BoundaryContext<'_>) -> bool {
        let is_marker = |l: &Lap| l.declared_type == Some(LapType::SeriesBreak);
        ctx.recovery.map_or(false, is_marker) || ctx.between.iter().any(is_marker)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverSplit;

impl SeriesBoundaryPolicy for NeverSplit {
    fn is_boundary(&self, _ctx: &BoundaryContext<'_>) -> bool {
        false
    }
}

/// Grense hvis minst én av policyene sier ja.
#[derive(Default)]
pub struct AnyOf(pub Vec<Box<dyn SeriesBoundaryPolicy>>);

impl SeriesBoundaryPolicy for AnyOf {
    fn is_boundary(&self, ctx: &BoundaryContext<'_>) -> bool {
        self.0.iter().any(|p| p.is_boundary(ctx))
    }
}

pub struct SegmentationRules {
    pub work: Box<dyn WorkLapPredicate>,
    pub recovery: Box<dyn RecoveryLapPredicate>,
    pub boundary: Box<dyn SeriesBoundaryPolicy>,
}

impl SegmentationRules {
    pub fn new<W, B>(work: W, boundary: B) -> Self
    where
        W: WorkLapPredicate + 'static,
        B: SeriesBoundaryPolicy + 'static,
    {
        Self {
            work: Box::new(work),
            recovery: Box::new(DeclaredRecovery {
                fallback: AcceptAll,
            }),
            boundary: Box::new(boundary),
        }
    }

    /// Bytter ut pause-predikatet (default: `DeclaredRecovery` over `AcceptAll`).
    pub fn with_recovery<R>(mut self, recovery: R) -> Self
    where
        R: RecoveryLapPredicate + 'static,
    {
        self.recovery = Box::new(recovery);
        self
    }
}

impl Default for SegmentationRules {
    /// Deklarert type, ellers snittfart > 17.05; ny serie ved markør eller pause > 2 × median.
    fn default() -> Self {
        Self::new(
            DeclaredType {
                fallback: MinLapSpeed { min_speed: 17.05 },
            },
            AnyOf(vec![
                Box::new(ExplicitMarker),
                Box::new(RecoveryMultipleOfMedian { factor: 2.0 }),
            ]),
        )
    }
}

/// Én work-lap + påfølgende pause-lap, plassert i en serie.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Repetition {
    /// 1..N
    pub series: u32,
    /// 1-basert innen serien
    pub rep_index_in_series: u32,
    pub work_lap: Lap,
    pub recovery_lap: Option<Lap>,
}

impl Repetition {
    /// Indeksområdet for records i work-lapens spenn (ingen kopi).
    pub fn work_range(&self, records: &[Record]) -> Range<usize> {
        span_range(records, self.work_lap.start_time, self.work_lap.end_time)
    }

    pub fn work_records<'r>(&self, records: &'r [Record]) -> &'r [Record] {
        &records[self.work_range(records)]
    }

    pub fn recovery_range(&self, records: &[Record]) -> Option<Range<usize>> {
        self.recovery_lap
            .map(|l| span_range(records, l.start_time, l.end_time))
    }

    pub fn recovery_records<'r>(&self, records: &'r [Record]) -> Option<&'r [Record]> {
        self.recovery_range(records).map(|r| &records[r])
    }
}

struct Pairing {
    work: Lap,
    recovery: Option<Lap>,
    between: Vec<Lap>,
}

fn validate_order(ordered: &[Lap]) -> Result<(), SegmentationError> {
    for lap in ordered {
        if !(lap.end_time > lap.start_time) {
            return Err(SegmentationError::InconsistentLapOrder {
                lap_index: lap.lap_index,
                detail: format!(
                    "end_time {} is not after start_time {}",
                    lap.end_time, lap.start_time
                ),
            });
        }
    }
    for w in ordered.windows(2) {
        if w[1].start_time < w[0].end_time - OVERLAP_EPS_S {
            return Err(SegmentationError::InconsistentLapOrder {
                lap_index: w[1].lap_index,
                detail: format!(
                    "starts at {} before lap {} ends at {}",
                    w[1].start_time, w[0].lap_index, w[0].end_time
                ),
            });
        }
    }
    Ok(())
}

/// Deler laps inn i repetisjoner og serier.
///
/// Hver work-lap åpner en repetisjon; første ikke-work lap etter den som
/// `rules.recovery` godtar er pausen. Laps før første work-lap (oppvarming)
/// og øvrige ikke-work laps frem til neste work-lap (nedjogg, markører)
/// inngår ikke i noen repetisjon, men er synlige for grense-policyen.
/// En work-lap fulgt av bare nedjogg får derfor ingen pause.
pub fn segment(laps: &[Lap], rules: &SegmentationRules) -> Result<Vec<Repetition>, SegmentationError> {
    let mut ordered = laps.to_vec();
    ordered.sort_by(|a, b| {
        a.start_time
            .total_cmp(&b.start_time)
            .then(a.lap_index.cmp(&b.lap_index))
    });
    validate_order(&ordered)?;

    let is_work: Vec<bool> = ordered.iter().map(|l| rules.work.is_work(l)).collect();
    if !is_work.iter().any(|w| *w) {
        return Err(SegmentationError::NoWorkLaps);
    }

    // 1️⃣ Par work-lap med pause + mellomliggende laps
    let mut pairings: Vec<Pairing> = Vec::new();
    let mut i = 0;
    while i < ordered.len() {
        if !is_work[i] {
            i += 1;
            continue;
        }
        let mut p = Pairing {
            work: ordered[i],
            recovery: None,
            between: Vec::new(),
        };
        let mut j = i + 1;
        while j < ordered.len() && !is_work[j] {
            if p.recovery.is_none() && rules.recovery.is_recovery(&ordered[j]) {
                p.recovery = Some(ordered[j]);
            } else {
                p.between.push(ordered[j]);
            }
            j += 1;
        }
        pairings.push(p);
        i = j;
    }

    // 2️⃣ Seriegrenser (median beregnes per kall, aldri globalt)
    let recovery_durations: Vec<f64> = pairings
        .iter()
        .filter_map(|p| p.recovery.map(|r| r.duration()))
        .collect();
    let median_recovery_s = median(&recovery_durations);

    let mut reps = Vec::with_capacity(pairings.len());
    let mut series = 1u32;
    let mut rep_in_series = 0u32;
    for (k, p) in pairings.iter().enumerate() {
        if k > 0 {
            let prev = &pairings[k - 1];
            let ctx = BoundaryContext {
                recovery: prev.recovery.as_ref(),
                between: &prev.between,
                median_recovery_s,
            };
            if rules.boundary.is_boundary(&ctx) {
                series += 1;
                rep_in_series = 0;
            }
        }
        rep_in_series += 1;
        reps.push(Repetition {
            series,
            rep_index_in_series: rep_in_series,
            work_lap: p.work,
            recovery_lap: p.recovery,
        });
    }

    log::debug!(
        "segmented {} lap(s) into {} repetition(s) across {} series (median recovery {:?}s)",
        laps.len(),
        reps.len(),
        series,
        median_recovery_s
    );

    Ok(reps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lap(i: usize, start: f64, dur: f64, t: Option<LapType>) -> Lap {
        Lap {
            lap_index: i,
            start_time: start,
            end_time: start + dur,
            declared_type: t,
            avg_speed: None,
        }
    }

    #[test]
    fn closure_predicates_are_accepted() {
        let laps = vec![
            lap(0, 0.0, 60.0, None),
            lap(1, 60.0, 30.0, None),
            lap(2, 90.0, 60.0, None),
        ];
        let rules = SegmentationRules::new(|l: &Lap| l.duration() >= 60.0, NeverSplit);
        let reps = segment(&laps, &rules).unwrap();
        assert_eq!(reps.len(), 2);
        assert_eq!(reps[0].recovery_lap.map(|l| l.lap_index), Some(1));
        assert_eq!(reps[1].recovery_lap, None);
    }

    #[test]
    fn marker_lap_between_recovery_and_work_splits_series() {
        let w = Some(LapType::Work);
        let r = Some(LapType::Recovery);
        let laps = vec![
            lap(0, 0.0, 60.0, w),
            lap(1, 60.0, 60.0, r),
            lap(2, 120.0, 10.0, Some(LapType::SeriesBreak)),
            lap(3, 130.0, 60.0, w),
        ];
        let rules = SegmentationRules::new(DeclaredType { fallback: |_: &Lap| false }, ExplicitMarker);
        let reps = segment(&laps, &rules).unwrap();
        assert_eq!(reps[0].series, 1);
        assert_eq!(reps[1].series, 2);
        assert_eq!(reps[1].rep_index_in_series, 1);
    }

    #[test]
    fn marker_right_after_work_is_not_the_recovery() {
        let w = Some(LapType::Work);
        let laps = vec![
            lap(0, 0.0, 60.0, w),
            lap(1, 60.0, 10.0, Some(LapType::SeriesBreak)),
            lap(2, 70.0, 90.0, Some(LapType::Recovery)),
            lap(3, 160.0, 60.0, w),
        ];
        let rules = SegmentationRules::new(DeclaredType { fallback: |_: &Lap| false }, ExplicitMarker);
        let reps = segment(&laps, &rules).unwrap();
        assert_eq!(reps[0].recovery_lap.map(|l| l.lap_index), Some(2));
        assert_eq!(reps[1].series, 2, "markøren teller fortsatt som grense");
    }

    #[test]
    fn custom_recovery_predicate() {
        // bare laps på minst 30 s kan være pause
        let laps = vec![
            lap(0, 0.0, 60.0, None),
            lap(1, 60.0, 20.0, None),
            lap(2, 80.0, 40.0, None),
        ];
        let rules = SegmentationRules::new(|l: &Lap| l.lap_index == 0, NeverSplit)
            .with_recovery(|l: &Lap| l.duration() >= 30.0);
        let reps = segment(&laps, &rules).unwrap();
        assert_eq!(reps.len(), 1);
        assert_eq!(reps[0].recovery_lap.map(|l| l.lap_index), Some(2));
    }

    #[test]
    fn overlapping_laps_are_rejected() {
        let laps = vec![
            lap(0, 0.0, 60.0, Some(LapType::Work)),
            lap(1, 30.0, 60.0, Some(LapType::Recovery)),
        ];
        let err = segment(&laps, &SegmentationRules::default()).unwrap_err();
        assert!(matches!(
            err,
            SegmentationError::InconsistentLapOrder { lap_index: 1, .. }
        ));
    }
}
