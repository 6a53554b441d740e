use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use serde::Deserialize;
use serde_json as json;
use serde_path_to_error as spte;

use crate::analyze_session::analyze_session;
use crate::config::AnalysisConfig;
use crate::filter::{TimeRange, TimeRangeView};
use crate::ingest::parse_records;

// ──────────────────────────────────────────────────────────────────────────────
// ANALYSE
// ──────────────────────────────────────────────────────────────────────────────

/// Hele pipelinen fra CSV-tekst til JSON (SessionAnalysis).
#[pyfunction]
#[pyo3(signature = (records_csv, laps_csv, session_type = "Interval", config_json = None))]
fn analyze_session_json(
    records_csv: &str,
    laps_csv: &str,
    session_type: &str,
    config_json: Option<&str>,
) -> PyResult<String> {
    let cfg = match config_json {
        Some(s) => AnalysisConfig::from_json_str(s).map_err(|e| PyValueError::new_err(e.to_string()))?,
        None => AnalysisConfig::default(),
    };
    let out = analyze_session(records_csv, laps_csv, session_type, &cfg)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    out.to_json().map_err(|e| PyValueError::new_err(e.to_string()))
}

// ──────────────────────────────────────────────────────────────────────────────
// VISNING (tidsvindu for hovedgrafen)
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RangeIn {
    start: f64,
    end: f64,
}

/// Records innenfor `[start, end]` som JSON-liste. `range_json = None` gir alle.
#[pyfunction]
#[pyo3(signature = (records_csv, range_json = None))]
fn filter_records_json(records_csv: &str, range_json: Option<&str>) -> PyResult<String> {
    let parsed = parse_records(records_csv).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let mut view = TimeRangeView::new(&parsed.rows);

    if let Some(s) = range_json {
        let mut de = json::Deserializer::from_str(s);
        let r: RangeIn = spte::deserialize(&mut de).map_err(|e| {
            PyValueError::new_err(format!("parse error (range) at {}: {}", e.path(), e))
        })?;
        view.set_time_range(TimeRange::new(r.start, r.end));
    }

    json::to_string(view.filtered_records()).map_err(|e| PyValueError::new_err(e.to_string()))
}

#[pymodule]
fn intervalgraph_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(analyze_session_json, m)?)?;
    m.add_function(wrap_pyfunction!(filter_records_json, m)?)?;
    Ok(())
}
