// Prosess-tellere (Prometheus). Påvirker aldri analyseresultatene.
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static SESSIONS_ANALYZED: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::new(
        "intervalgraph_sessions_analyzed_total",
        "Antall fullførte øktanalyser",
    )
    .expect("valid counter definition");
    REGISTRY
        .register(Box::new(c.clone()))
        .expect("counter registered once");
    c
});

static SKIPPED_ROWS: Lazy<IntCounterVec> = Lazy::new(|| {
    let c = IntCounterVec::new(
        Opts::new(
            "intervalgraph_skipped_rows_total",
            "Rader droppet under innlesing",
        ),
        &["table"],
    )
    .expect("valid counter definition");
    REGISTRY
        .register(Box::new(c.clone()))
        .expect("counter registered once");
    c
});

static EXCLUDED_REPETITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    let c = IntCounterVec::new(
        Opts::new(
            "intervalgraph_excluded_repetitions_total",
            "Repetisjoner holdt utenfor klassifisering/sammenligning",
        ),
        &["reason"],
    )
    .expect("valid counter definition");
    REGISTRY
        .register(Box::new(c.clone()))
        .expect("counter registered once");
    c
});

pub fn sessions_analyzed_total() -> &'static IntCounter {
    &SESSIONS_ANALYZED
}

pub fn skipped_rows_total(table: &str) -> IntCounter {
    SKIPPED_ROWS.with_label_values(&[table])
}

pub fn excluded_repetitions_total(reason: &str) -> IntCounter {
    EXCLUDED_REPETITIONS.with_label_values(&[reason])
}

/// Tekstformat for scraping / debug-utskrift.
pub fn gather_text() -> String {
    // Sørg for at alle tellere er registrert før gather
    Lazy::force(&SESSIONS_ANALYZED);
    Lazy::force(&SKIPPED_ROWS);
    Lazy::force(&EXCLUDED_REPETITIONS);

    let mut buf = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buf) {
        log::warn!("failed to encode counters: {e}");
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increase_and_show_up_in_text() {
        let before = skipped_rows_total("laps").get();
        skipped_rows_total("laps").inc_by(2);
        assert_eq!(skipped_rows_total("laps").get(), before + 2);

        excluded_repetitions_total("empty_work_window").inc();
        let text = gather_text();
        assert!(text.contains("intervalgraph_skipped_rows_total"));
        assert!(text.contains("intervalgraph_excluded_repetitions_total"));
    }
}
