use crate::models::Record;
use crate::segmentation::Repetition;
use crate::stats::{mean, population_variance};
use crate::types::{Exclusion, RepMetrics};

/// Sammendrag av én repetisjon over records i work-lapens lukkede spenn.
///
/// Uten records i spennet blir alle avledede felt `None` og repetisjonen
/// flagges med `EmptyWorkWindow`; den beholdes i utdata.
pub fn aggregate(rep: &Repetition, records: &[Record]) -> RepMetrics {
    let window = rep.work_records(records);

    let mut m = RepMetrics {
        series: rep.series,
        rep_index_in_series: rep.rep_index_in_series,
        work_lap_index: rep.work_lap.lap_index,
        record_count: window.len(),
        duration_s: rep.work_lap.duration(),
        distance_m: None,
        mean_speed: None,
        mean_cadence: None,
        mean_heart_rate: None,
        mean_vertical_ratio: None,
        mean_ground_contact_time: None,
        speed_variance: None,
        hr_min: None,
        hr_max: None,
        hr_amplitude: None,
        pacing_drift_percent: None,
        pacing_class: None,
        exclusion: None,
    };

    if window.is_empty() {
        log::warn!(
            "serie {} rep {}: ingen records i work-lap {} [{}, {}]",
            rep.series,
            rep.rep_index_in_series,
            rep.work_lap.lap_index,
            rep.work_lap.start_time,
            rep.work_lap.end_time
        );
        m.exclusion = Some(Exclusion::EmptyWorkWindow);
        return m;
    }

    let column = |f: fn(&Record) -> f64| -> Vec<f64> { window.iter().map(f).collect() };
    let speed = column(|r| r.speed);
    let hr = column(|r| r.heart_rate);

    m.mean_speed = mean(&speed);
    m.speed_variance = population_variance(&speed);
    m.mean_cadence = mean(&column(|r| r.cadence));
    m.mean_heart_rate = mean(&hr);
    m.mean_vertical_ratio = mean(&column(|r| r.vertical_ratio));
    m.mean_ground_contact_time = mean(&column(|r| r.ground_contact_time));

    // min/max på puls (amplitude = max - min)
    let hr_min = hr.iter().copied().fold(f64::INFINITY, f64::min);
    let hr_max = hr.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    m.hr_min = Some(hr_min);
    m.hr_max = Some(hr_max);
    m.hr_amplitude = Some(hr_max - hr_min);

    if let (Some(first), Some(last)) = (window.first(), window.last()) {
        m.distance_m = Some(last.distance - first.distance);
    }

    m
}

pub fn aggregate_all(reps: &[Repetition], records: &[Record]) -> Vec<RepMetrics> {
    reps.iter().map(|r| aggregate(r, records)).collect()
}
