use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Hvilken inngangstabell en feil gjelder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Records,
    Laps,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Records => f.write_str("records"),
            Table::Laps => f.write_str("laps"),
        }
    }
}

/// Fatal skjemafeil i inngangstabellene. Avbryter analysen før noe steg kjører.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("{table}: empty input (no header row)")]
    EmptyInput { table: Table },
    #[error("{table}: missing required column '{column}'")]
    MissingColumn { table: Table, column: &'static str },
    #[error("{table} line {line}: column '{column}' is not numeric: {value:?}")]
    NonNumeric {
        table: Table,
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("{table} line {line}: invalid lap index {value:?} in '{column}'")]
    InvalidLapIndex {
        table: Table,
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("{table}: malformed csv at line {line}: {message}")]
    Csv {
        table: Table,
        line: u64,
        message: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentationError {
    #[error("no laps classified as work")]
    NoWorkLaps,
    #[error("inconsistent lap ordering at lap {lap_index}: {detail}")]
    InconsistentLapOrder { lap_index: usize, detail: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error at {location}: {message}")]
    Parse { location: String, message: String },
}

/// Samlet feiltype for hele analysen.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Segmentation(#[from] SegmentationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to serialize analysis: {0}")]
    Serialize(#[from] serde_json::Error),
}
