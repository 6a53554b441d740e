use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::aggregate::aggregate_all;
use crate::compare::{compare, summarize_series};
use crate::config::AnalysisConfig;
use crate::counters;
use crate::error::AnalysisError;
use crate::ingest::{parse_laps, parse_records, SkippedRow};
use crate::lap_nature::{classify_lap_natures, LapNature};
use crate::models::{Lap, Record};
use crate::moving::{session_overview, SessionOverview};
use crate::pacing;
use crate::recovery::analyze_recovery;
use crate::segmentation::{segment, Repetition};
use crate::types::{ComparisonResult, Exclusion, RecoverySample, RepMetrics, SeriesSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepRef {
    pub series: u32,
    pub rep_index_in_series: u32,
}

impl From<&Repetition> for RepRef {
    fn from(r: &Repetition) -> Self {
        Self {
            series: r.series,
            rep_index_in_series: r.rep_index_in_series,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedRep {
    pub series: u32,
    pub rep_index_in_series: u32,
    pub work_lap_index: usize,
    pub reason: Exclusion,
}

/// Alt som ble hoppet over eller holdt utenfor, slik at ingenting forsvinner stille.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExclusionReport {
    pub skipped_record_rows: Vec<SkippedRow>,
    pub skipped_lap_rows: Vec<SkippedRow>,
    pub excluded_repetitions: Vec<ExcludedRep>,
    /// Repetisjoner uten pause-lap (typisk siste drag).
    pub missing_recoveries: Vec<RepRef>,
    /// Pause-lap finnes, men ingen records dekker den.
    pub empty_recoveries: Vec<RepRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapNatureEntry {
    pub lap_index: usize,
    pub nature: LapNature,
}

/// Utdata-grensen for én økt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalysis {
    pub session_type: String,
    pub overview: SessionOverview,
    pub lap_natures: Vec<LapNatureEntry>,
    pub segments: Vec<Repetition>,
    pub repetitions: Vec<RepMetrics>,
    pub recoveries: Vec<RecoverySample>,
    pub median_drift_percent: Option<f64>,
    pub series: Vec<SeriesSummary>,
    pub comparison: ComparisonResult,
    pub exclusions: ExclusionReport,
}

impl SessionAnalysis {
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn ordered_records(records: &[Record]) -> Cow<'_, [Record]> {
    if records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp) {
        Cow::Borrowed(records)
    } else {
        log::warn!("records er ikke sortert på timestamp, sorterer en kopi");
        let mut v = records.to_vec();
        v.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Cow::Owned(v)
    }
}

/// Hele pipelinen på allerede typede records og laps.
///
/// Segmentering -> aggregering -> pacing -> pause -> serier -> sammenligning.
/// Statistikken regnes alltid på hele record-sekvensen.
pub fn analyze(
    records: &[Record],
    laps: &[Lap],
    session_type: &str,
    cfg: &AnalysisConfig,
) -> Result<SessionAnalysis, AnalysisError> {
    let records = ordered_records(records);
    let records: &[Record] = &records;

    // 1️⃣ Lap-natur (informativt + evt. work-heuristikk)
    let mut sorted_laps = laps.to_vec();
    sorted_laps.sort_by(|a, b| {
        a.start_time
            .total_cmp(&b.start_time)
            .then(a.lap_index.cmp(&b.lap_index))
    });
    let lap_natures = sorted_laps
        .iter()
        .zip(classify_lap_natures(&sorted_laps, &cfg.lap_nature))
        .map(|(l, nature)| LapNatureEntry {
            lap_index: l.lap_index,
            nature,
        })
        .collect();

    // 2️⃣ Segmentering
    let rules = cfg.segmentation_rules(&sorted_laps);
    let segments = segment(&sorted_laps, &rules)?;

    // 3️⃣ Aggregering + pacing
    let metrics = aggregate_all(&segments, records);
    let outcome = pacing::classify(&metrics);

    // 4️⃣ Pauser
    let mut exclusions = ExclusionReport::default();
    let mut recoveries = Vec::new();
    for rep in &segments {
        match (rep.recovery_lap, analyze_recovery(rep, records, &cfg.recovery)) {
            (_, Some(s)) => recoveries.push(s),
            (None, None) => exclusions.missing_recoveries.push(rep.into()),
            (Some(_), None) => {
                log::warn!(
                    "serie {} rep {}: ingen records i pause-lapen",
                    rep.series,
                    rep.rep_index_in_series
                );
                exclusions.empty_recoveries.push(rep.into());
            }
        }
    }

    for m in &outcome.metrics {
        if let Some(reason) = m.exclusion {
            counters::excluded_repetitions_total(reason.as_str()).inc();
            exclusions.excluded_repetitions.push(ExcludedRep {
                series: m.series,
                rep_index_in_series: m.rep_index_in_series,
                work_lap_index: m.work_lap_index,
                reason,
            });
        }
    }

    // 5️⃣ Serier + sammenligning
    let series = summarize_series(&outcome.metrics, &recoveries);
    let comparison = compare(&series, &outcome.metrics, &cfg.pairing);

    counters::sessions_analyzed_total().inc();
    log::info!(
        "{}: {} rep(s) i {} serie(r), {} ekskludert",
        session_type,
        outcome.metrics.len(),
        series.len(),
        exclusions.excluded_repetitions.len()
    );

    Ok(SessionAnalysis {
        session_type: session_type.to_string(),
        overview: session_overview(records, &cfg.pause),
        lap_natures,
        segments,
        repetitions: outcome.metrics,
        recoveries,
        median_drift_percent: outcome.median_drift_percent,
        series,
        comparison,
        exclusions,
    })
}

/// Innlesing + analyse fra CSV-tekst. Skjemafeil er fatale; droppede rader rapporteres.
pub fn analyze_session(
    records_csv: &str,
    laps_csv: &str,
    session_type: &str,
    cfg: &AnalysisConfig,
) -> Result<SessionAnalysis, AnalysisError> {
    let records = parse_records(records_csv)?;
    let laps = parse_laps(laps_csv)?;

    let mut out = analyze(&records.rows, &laps.rows, session_type, cfg)?;
    out.exclusions.skipped_record_rows = records.skipped;
    out.exclusions.skipped_lap_rows = laps.skipped;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LapType;

    #[test]
    fn unsorted_records_are_sorted_before_analysis() {
        let mk = |t: f64| Record {
            timestamp: t,
            speed: 5.0,
            heart_rate: 150.0,
            cadence: 180.0,
            vertical_ratio: 8.0,
            ground_contact_time: 240.0,
            distance: t * 5.0,
        };
        let records = vec![mk(2.0), mk(0.0), mk(1.0), mk(3.0)];
        let laps = vec![
            Lap {
                lap_index: 0,
                start_time: 0.0,
                end_time: 2.0,
                declared_type: Some(LapType::Work),
                avg_speed: None,
            },
            Lap {
                lap_index: 1,
                start_time: 2.0,
                end_time: 3.0,
                declared_type: Some(LapType::Recovery),
                avg_speed: None,
            },
        ];
        let a = analyze(&records, &laps, "Interval", &AnalysisConfig::default()).unwrap();
        assert_eq!(a.repetitions[0].record_count, 3);
        assert_eq!(a.recoveries.len(), 1);
        assert!(a.exclusions.missing_recoveries.is_empty());
    }
}
