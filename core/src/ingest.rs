//! Innlesing av records- og laps-tabellene (CSV med header).
//!
//! Eksplisitt skjemavalidering: manglende påkrevde kolonner og ikke-numeriske
//! verdier i påkrevde kolonner er fatale. Rader med gjenopprettbare feil
//! (tom celle, feil antall felt, ugyldig lap-spenn, duplikat-tidsstempel,
//! duplikat lap-indeks)
//! droppes og rapporteres i `Parsed::skipped`.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::counters;
use crate::error::{SchemaError, Table};
use crate::models::{Lap, LapType, Record};

/// Resultat av innlesing: typede rader + rapport over droppede rader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parsed<T> {
    pub rows: Vec<T>,
    pub skipped: Vec<SkippedRow>,
}

impl<T> Parsed<T> {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-basert linjenummer i kildeteksten (header = linje 1)
    pub line: u64,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    RaggedRow { expected: usize, found: usize },
    BlankCell { column: String },
    NonFinite { column: String },
    InvalidSpan,
    DuplicateTimestamp,
    /// Samme lap-indeks som en tidligere rad; første rad beholdes.
    DuplicateLapIndex { lap_index: usize },
}

// Kanoniske navn først, deretter aliaser fra uttrekkssteget.
const TIMESTAMP: &[&str] = &["timestamp", "elapsed_time_s", "time"];
const SPEED: &[&str] = &["speed", "speed_kmh", "enhanced_speed"];
const HEART_RATE: &[&str] = &["heart_rate", "hr"];
const CADENCE: &[&str] = &["cadence", "cadence_step_per_min"];
const VERTICAL_RATIO: &[&str] = &["vertical_ratio"];
const GROUND_CONTACT_TIME: &[&str] = &["ground_contact_time", "stance_time", "gct"];
const DISTANCE: &[&str] = &["distance"];

const START_TIME: &[&str] = &["start_time"];
const END_TIME: &[&str] = &["end_time"];
const LAP_INDEX: &[&str] = &["lap_index"];
const LAP_NUMBER: &[&str] = &["lap_number"];
const LAP_TYPE: &[&str] = &["type", "lap_nature", "declared_type"];
const AVG_SPEED: &[&str] = &["avg_speed", "avg_speed_kmh"];

#[derive(Debug, Clone, Copy)]
struct Col {
    idx: usize,
    name: &'static str,
}

enum RowError {
    Skip(SkipReason),
    Fatal(SchemaError),
}

impl From<SchemaError> for RowError {
    fn from(e: SchemaError) -> Self {
        RowError::Fatal(e)
    }
}

fn find(headers: &StringRecord, names: &[&'static str]) -> Option<Col> {
    names.iter().find_map(|name| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .map(|idx| Col { idx, name })
    })
}

fn require(headers: &StringRecord, table: Table, names: &[&'static str]) -> Result<Col, SchemaError> {
    find(headers, names).ok_or(SchemaError::MissingColumn {
        table,
        column: names[0],
    })
}

fn is_blank(s: &str) -> bool {
    let s = s.trim();
    s.is_empty()
        || ["nan", "na", "n/a", "null", "none", "<na>"]
            .iter()
            .any(|m| s.eq_ignore_ascii_case(m))
}

fn epoch_secs(dt: DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) * 1e-9
}

/// Sekunder som desimaltall, eller en datetime (RFC 3339 / pandas-format) som epoch-sekunder.
pub fn parse_time(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if let Ok(v) = s.parse::<f64>() {
        return Some(v);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(epoch_secs(dt.with_timezone(&Utc)));
    }
    // pandas: "2024-05-01 10:00:00+00:00"
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(epoch_secs(dt.with_timezone(&Utc)));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(n) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(epoch_secs(Utc.from_utc_datetime(&n)));
        }
    }
    None
}

fn numeric(row: &StringRecord, col: Col, table: Table, line: u64) -> Result<f64, RowError> {
    let raw = row.get(col.idx).unwrap_or("");
    if is_blank(raw) {
        return Err(RowError::Skip(SkipReason::BlankCell {
            column: col.name.to_string(),
        }));
    }
    let v = raw.trim().parse::<f64>().map_err(|_| {
        RowError::Fatal(SchemaError::NonNumeric {
            table,
            line,
            column: col.name,
            value: raw.to_string(),
        })
    })?;
    if !v.is_finite() {
        return Err(RowError::Skip(SkipReason::NonFinite {
            column: col.name.to_string(),
        }));
    }
    Ok(v)
}

fn time(row: &StringRecord, col: Col, table: Table, line: u64) -> Result<f64, RowError> {
    let raw = row.get(col.idx).unwrap_or("");
    if is_blank(raw) {
        return Err(RowError::Skip(SkipReason::BlankCell {
            column: col.name.to_string(),
        }));
    }
    match parse_time(raw) {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(RowError::Skip(SkipReason::NonFinite {
            column: col.name.to_string(),
        })),
        None => Err(RowError::Fatal(SchemaError::NonNumeric {
            table,
            line,
            column: col.name,
            value: raw.to_string(),
        })),
    }
}

fn csv_error(table: Table, e: &csv::Error) -> SchemaError {
    SchemaError::Csv {
        table,
        line: e.position().map(|p| p.line()).unwrap_or(0),
        message: e.to_string(),
    }
}

fn read_table(text: &str, table: Table) -> Result<(StringRecord, Vec<(u64, StringRecord)>), SchemaError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = rdr.headers().map_err(|e| csv_error(table, &e))?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(SchemaError::EmptyInput { table });
    }

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = result.map_err(|e| csv_error(table, &e))?;
        let line = row.position().map(|p| p.line()).unwrap_or(i as u64 + 2);
        rows.push((line, row));
    }
    Ok((headers, rows))
}

fn report_skipped(table: Table, skipped: &[SkippedRow]) {
    if skipped.is_empty() {
        return;
    }
    for s in skipped {
        log::debug!("[{table}] skipped line {}: {:?}", s.line, s.reason);
    }
    log::warn!("[{table}] skipped {} row(s) during ingestion", skipped.len());
    counters::skipped_rows_total(&table.to_string()).inc_by(skipped.len() as u64);
}

struct RecordColumns {
    timestamp: Col,
    speed: Col,
    heart_rate: Col,
    cadence: Col,
    vertical_ratio: Col,
    ground_contact_time: Col,
    distance: Col,
}

impl RecordColumns {
    fn resolve(headers: &StringRecord) -> Result<Self, SchemaError> {
        let t = Table::Records;
        Ok(Self {
            timestamp: require(headers, t, TIMESTAMP)?,
            speed: require(headers, t, SPEED)?,
            heart_rate: require(headers, t, HEART_RATE)?,
            cadence: require(headers, t, CADENCE)?,
            vertical_ratio: require(headers, t, VERTICAL_RATIO)?,
            ground_contact_time: require(headers, t, GROUND_CONTACT_TIME)?,
            distance: require(headers, t, DISTANCE)?,
        })
    }

    fn read(&self, row: &StringRecord, line: u64) -> Result<Record, RowError> {
        let t = Table::Records;
        Ok(Record {
            timestamp: time(row, self.timestamp, t, line)?,
            speed: numeric(row, self.speed, t, line)?,
            heart_rate: numeric(row, self.heart_rate, t, line)?,
            cadence: numeric(row, self.cadence, t, line)?,
            vertical_ratio: numeric(row, self.vertical_ratio, t, line)?,
            ground_contact_time: numeric(row, self.ground_contact_time, t, line)?,
            distance: numeric(row, self.distance, t, line)?,
        })
    }
}

/// Leser records-tabellen. Utdata er sortert stabilt på tidsstempel;
/// duplikat-tidsstempler beholder første rad.
pub fn parse_records(text: &str) -> Result<Parsed<Record>, SchemaError> {
    let table = Table::Records;
    let (headers, raw_rows) = read_table(text, table)?;
    let cols = RecordColumns::resolve(&headers)?;

    let mut rows: Vec<(u64, Record)> = Vec::with_capacity(raw_rows.len());
    let mut skipped = Vec::new();

    for (line, row) in &raw_rows {
        if row.len() != headers.len() {
            skipped.push(SkippedRow {
                line: *line,
                reason: SkipReason::RaggedRow {
                    expected: headers.len(),
                    found: row.len(),
                },
            });
            continue;
        }
        match cols.read(row, *line) {
            Ok(rec) => rows.push((*line, rec)),
            Err(RowError::Skip(reason)) => skipped.push(SkippedRow { line: *line, reason }),
            Err(RowError::Fatal(e)) => return Err(e),
        }
    }

    // Stabil sortering: lik tid => opprinnelig rekkefølge
    rows.sort_by(|a, b| a.1.timestamp.total_cmp(&b.1.timestamp));

    let mut out: Vec<Record> = Vec::with_capacity(rows.len());
    for (line, rec) in rows {
        if out.last().map_or(false, |prev| prev.timestamp == rec.timestamp) {
            skipped.push(SkippedRow {
                line,
                reason: SkipReason::DuplicateTimestamp,
            });
            continue;
        }
        out.push(rec);
    }

    skipped.sort_by_key(|s| s.line);
    report_skipped(table, &skipped);
    log::debug!("[records] parsed {} row(s)", out.len());

    Ok(Parsed { rows: out, skipped })
}

struct LapColumns {
    start_time: Col,
    end_time: Col,
    lap_index: Col,
    /// `lap_number` er 1-basert og konverteres til 0-basert
    one_based: bool,
    lap_type: Option<Col>,
    avg_speed: Option<Col>,
}

impl LapColumns {
    fn resolve(headers: &StringRecord) -> Result<Self, SchemaError> {
        let t = Table::Laps;
        let (lap_index, one_based) = match find(headers, LAP_INDEX) {
            Some(c) => (c, false),
            None => match find(headers, LAP_NUMBER) {
                Some(c) => (c, true),
                None => {
                    return Err(SchemaError::MissingColumn {
                        table: t,
                        column: LAP_INDEX[0],
                    })
                }
            },
        };
        Ok(Self {
            start_time: require(headers, t, START_TIME)?,
            end_time: require(headers, t, END_TIME)?,
            lap_index,
            one_based,
            lap_type: find(headers, LAP_TYPE),
            avg_speed: find(headers, AVG_SPEED),
        })
    }

    fn read(&self, row: &StringRecord, line: u64) -> Result<Lap, RowError> {
        let t = Table::Laps;
        let start_time = time(row, self.start_time, t, line)?;
        let end_time = time(row, self.end_time, t, line)?;
        let raw_index = numeric(row, self.lap_index, t, line)?;
        // lap_number starter på 1, lap_index på 0
        let lowest = if self.one_based { 1.0 } else { 0.0 };
        if raw_index < lowest || raw_index.fract() != 0.0 {
            return Err(RowError::Fatal(SchemaError::InvalidLapIndex {
                table: t,
                line,
                column: self.lap_index.name,
                value: row.get(self.lap_index.idx).unwrap_or("").to_string(),
            }));
        }
        let mut lap_index = raw_index as usize;
        if self.one_based {
            lap_index -= 1;
        }

        if end_time <= start_time {
            return Err(RowError::Skip(SkipReason::InvalidSpan));
        }

        // Valgfrie kolonner: aldri fatale
        let declared_type = self
            .lap_type
            .and_then(|c| row.get(c.idx))
            .and_then(LapType::from_label);
        let avg_speed = self
            .avg_speed
            .and_then(|c| row.get(c.idx))
            .filter(|s| !is_blank(s))
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite());

        Ok(Lap {
            lap_index,
            start_time,
            end_time,
            declared_type,
            avg_speed,
        })
    }
}

/// Leser laps-tabellen. Utdata er sortert stabilt på `start_time`.
pub fn parse_laps(text: &str) -> Result<Parsed<Lap>, SchemaError> {
    let table = Table::Laps;
    let (headers, raw_rows) = read_table(text, table)?;
    let cols = LapColumns::resolve(&headers)?;

    let mut laps = Vec::with_capacity(raw_rows.len());
    let mut skipped = Vec::new();
    let mut seen = BTreeSet::new();

    for (line, row) in &raw_rows {
        if row.len() != headers.len() {
            skipped.push(SkippedRow {
                line: *line,
                reason: SkipReason::RaggedRow {
                    expected: headers.len(),
                    found: row.len(),
                },
            });
            continue;
        }
        match cols.read(row, *line) {
            Ok(lap) if !seen.insert(lap.lap_index) => skipped.push(SkippedRow {
                line: *line,
                reason: SkipReason::DuplicateLapIndex {
                    lap_index: lap.lap_index,
                },
            }),
            Ok(lap) => laps.push(lap),
            Err(RowError::Skip(reason)) => skipped.push(SkippedRow { line: *line, reason }),
            Err(RowError::Fatal(e)) => return Err(e),
        }
    }

    laps.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    report_skipped(table, &skipped);
    log::debug!("[laps] parsed {} lap(s)", laps.len());

    Ok(Parsed {
        rows: laps,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_time_accepts_seconds_and_datetimes() {
        assert_eq!(parse_time("12.5"), Some(12.5));
        let a = parse_time("2024-05-01T10:00:00Z").unwrap();
        let b = parse_time("2024-05-01 10:00:01").unwrap();
        let c = parse_time("2024-05-01 10:00:02+00:00").unwrap();
        assert!((b - a - 1.0).abs() < 1e-9);
        assert!((c - a - 2.0).abs() < 1e-9);
        assert_eq!(parse_time("yesterday"), None);
    }

    #[test]
    fn blank_markers() {
        assert!(is_blank(""));
        assert!(is_blank(" NaN "));
        assert!(is_blank("<NA>"));
        assert!(!is_blank("0"));
    }
}
