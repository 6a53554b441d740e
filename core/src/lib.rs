pub mod aggregate;
pub mod analyze_session;
pub mod cli;
pub mod compare;
pub mod config;
pub mod counters;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod lap_nature;
pub mod models;
pub mod moving;
pub mod pacing;
pub mod recovery;
pub mod segmentation;
pub mod stats;
pub mod storage;
pub mod types;

#[cfg(feature = "python")]
mod py;

pub use aggregate::{aggregate, aggregate_all};
pub use analyze_session::{
    analyze, analyze_session, ExcludedRep, ExclusionReport, LapNatureEntry, RepRef,
    SessionAnalysis,
};
pub use cli::{print_session_report, render_report};
pub use compare::{
    channel_correlation, compare, compare_pair, session_correlations, summarize_series,
    SeriesPairing,
};
pub use config::{AnalysisConfig, SeriesBoundaryRule, WorkHeuristic, WorkLapRule};
pub use error::{AnalysisError, ConfigError, SchemaError, SegmentationError, Table};
pub use filter::{filter, span_range, TimeRange, TimeRangeView};
pub use ingest::{parse_laps, parse_records, parse_time, Parsed, SkipReason, SkippedRow};
pub use lap_nature::{classify_lap_natures, LapNature, LapNatureThresholds, LapNatures};
pub use models::{Lap, LapType, Record};
pub use moving::{format_hms, format_mm_ss, moving_elapsed, session_overview, PauseRules, SessionOverview};
pub use pacing::{classify_drifts, pacing_drift_percent, PacingOutcome};
pub use recovery::{analyze_recovery, RecoveryOptions};
pub use segmentation::{
    segment, AcceptAll, AnyOf, BoundaryContext, DeclaredRecovery, DeclaredType, ExplicitMarker,
    MaxLapDuration, MinLapSpeed, NeverSplit, RecoveryLapPredicate, RecoveryMultipleOfMedian,
    Repetition, SegmentationRules, SeriesBoundaryPolicy, WorkLapPredicate,
};
pub use stats::{mean, median, pearson, population_variance};
pub use storage::{load_config, save_config};
pub use types::{
    ComparisonResult, Correlation, Exclusion, MetricCorrelation, MetricDelta, PacingClass,
    RecoverySample, RepChannel, RepMetrics, SeriesComparison, SeriesSummary, UndefinedReason,
};
