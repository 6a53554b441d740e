use std::fmt::Write as _;

use crate::analyze_session::SessionAnalysis;
use crate::moving::format_mm_ss;
use crate::types::{Correlation, MetricDelta};

fn opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(x) => format!("{:.*}", decimals, x),
        None => "-".to_string(),
    }
}

fn signed(d: &MetricDelta, decimals: usize) -> String {
    match d.delta {
        Some(x) => format!("{:+.*}", decimals, x),
        None => "-".to_string(),
    }
}

/// Tekstrapport for terminal: serier, repetisjoner, pauser og korrelasjoner.
pub fn render_report(a: &SessionAnalysis) -> String {
    let mut out = String::new();
    let o = &a.overview;

    let _ = writeln!(out, "--- {} ---", a.session_type);
    let _ = writeln!(
        out,
        "Records: {}  Tid: {}  Bevegelse: {}  Distanse: {:.0} m  Pauser: {}",
        o.record_count,
        o.elapsed_hms.as_deref().unwrap_or("-"),
        o.moving_hms.as_deref().unwrap_or("-"),
        o.distance_m,
        o.pause_count
    );
    let _ = writeln!(out, "Median drift: {} %", opt(a.median_drift_percent, 2));

    for s in &a.series {
        let _ = writeln!(
            out,
            "\nSerie {}: {} rep(s), {} gyldige, {} steady / {} unsteady",
            s.series, s.rep_count, s.valid_rep_count, s.steady_count, s.unsteady_count
        );
        for m in a.repetitions.iter().filter(|m| m.series == s.series) {
            let class = match (m.pacing_class, m.exclusion) {
                (Some(c), _) => c.to_string(),
                (None, Some(e)) => format!("ekskludert ({e})"),
                (None, None) => "-".to_string(),
            };
            let _ = writeln!(
                out,
                "  #{:<2} {:>6} fart {:>6}  puls {:>5}  kadens {:>5}  drift {:>5}%  {}",
                m.rep_index_in_series,
                format_mm_ss(m.duration_s).unwrap_or_else(|| "-".into()),
                opt(m.mean_speed, 2),
                opt(m.mean_heart_rate, 0),
                opt(m.mean_cadence, 0),
                opt(m.pacing_drift_percent, 2),
                class
            );
        }
        let _ = writeln!(
            out,
            "  pulsfall i pause: {} bpm ({} bpm/min), puls ved slutt {}",
            opt(s.mean_hr_drop_bpm, 1),
            opt(s.mean_hr_drop_rate_bpm_per_min, 1),
            opt(s.mean_end_of_recovery_heart_rate, 0)
        );
    }

    for c in &a.comparison.pairs {
        let _ = writeln!(
            out,
            "\nSerie {} -> {}: fart {} ({}%), kadens {}, puls {}, pulsfall {} bpm, drift {}",
            c.earlier_series,
            c.later_series,
            signed(&c.speed, 2),
            opt(c.speed.relative_change_percent, 1),
            signed(&c.cadence, 1),
            signed(&c.heart_rate, 1),
            signed(&c.hr_drop_bpm, 1),
            signed(&c.pacing_drift_percent, 2)
        );
    }

    if !a.comparison.correlations.is_empty() {
        let _ = writeln!(out, "\nKorrelasjoner (n = gyldige reps):");
        for c in &a.comparison.correlations {
            let r = match c.correlation {
                Correlation::Defined { r } => format!("{r:+.3}"),
                Correlation::Undefined { reason } => format!("udefinert ({reason:?})"),
            };
            let _ = writeln!(out, "  {:?} ~ {:?} (n={}): {}", c.x, c.y, c.n, r);
        }
    }

    let ex = &a.exclusions;
    let skipped = ex.skipped_record_rows.len() + ex.skipped_lap_rows.len();
    if skipped > 0 || !ex.excluded_repetitions.is_empty() || !ex.empty_recoveries.is_empty() {
        let _ = writeln!(
            out,
            "\nHoppet over: {} record-rad(er), {} lap-rad(er); {} rep(s) ekskludert, {} tomme pauser",
            ex.skipped_record_rows.len(),
            ex.skipped_lap_rows.len(),
            ex.excluded_repetitions.len(),
            ex.empty_recoveries.len()
        );
    }

    out
}

pub fn print_session_report(a: &SessionAnalysis) {
    print!("{}", render_report(a));
}
