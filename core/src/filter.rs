use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::models::Record;

/// Lukket tidsvindu `[start, end]`. `start > end` er et tomt vindu, ikke en feil.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        !(self.start <= self.end)
    }
}

/// Indeksområdet til records med `start <= timestamp <= end`.
/// Forutsetter stigende tidsstempler (garantert av innlesingen).
pub fn span_range(records: &[Record], start: f64, end: f64) -> Range<usize> {
    if !(start <= end) {
        return 0..0;
    }
    let lo = records.partition_point(|r| r.timestamp < start);
    let hi = records.partition_point(|r| r.timestamp <= end);
    lo..hi.max(lo)
}

/// Ren funksjon: delsekvensen innenfor vinduet, i opprinnelig rekkefølge.
pub fn filter(records: &[Record], range: TimeRange) -> &[Record] {
    &records[span_range(records, range.start, range.end)]
}

/// Tilstand for interaktiv visning av hovedgrafen.
///
/// Vinduet her leses aldri av segmentering, aggregering eller klassifisering;
/// statistikken regnes alltid på hele record-sekvensen.
#[derive(Debug, Clone)]
pub struct TimeRangeView<'a> {
    records: &'a [Record],
    range: Option<TimeRange>,
}

impl<'a> TimeRangeView<'a> {
    pub fn new(records: &'a [Record]) -> Self {
        Self {
            records,
            range: None,
        }
    }

    pub fn set_time_range(&mut self, range: TimeRange) {
        self.range = Some(range);
    }

    pub fn clear_time_range(&mut self) {
        self.range = None;
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        self.range
    }

    /// Uten satt vindu returneres alle records.
    pub fn filtered_records(&self) -> &'a [Record] {
        match self.range {
            Some(r) => filter(self.records, r),
            None => self.records,
        }
    }

    pub fn all_records(&self) -> &'a [Record] {
        self.records
    }
}
