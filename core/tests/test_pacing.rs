// core/tests/test_pacing.rs

use intervalgraph_core::pacing::classify;
use intervalgraph_core::{classify_drifts, Exclusion, PacingClass, RepMetrics};

fn rep(k: u32, mean_speed: Option<f64>, variance: Option<f64>) -> RepMetrics {
    RepMetrics {
        series: 1,
        rep_index_in_series: k,
        work_lap_index: k as usize,
        record_count: if mean_speed.is_some() { 60 } else { 0 },
        duration_s: 60.0,
        distance_m: None,
        mean_speed,
        mean_cadence: None,
        mean_heart_rate: None,
        mean_vertical_ratio: None,
        mean_ground_contact_time: None,
        speed_variance: variance,
        hr_min: None,
        hr_max: None,
        hr_amplitude: None,
        pacing_drift_percent: None,
        pacing_class: None,
        exclusion: if mean_speed.is_some() {
            None
        } else {
            Some(Exclusion::EmptyWorkWindow)
        },
    }
}

#[test]
fn rep_at_median_is_steady() {
    // Arrange: snitt 5.0, varians 0.0625 / 0.25 / 1.0 => drift 5 / 10 / 20 %
    let metrics = vec![
        rep(1, Some(5.0), Some(0.0625)),
        rep(2, Some(5.0), Some(0.25)),
        rep(3, Some(5.0), Some(1.0)),
    ];

    // Act
    let out = classify(&metrics);

    // Assert
    assert_eq!(out.median_drift_percent, Some(10.0));
    let drifts: Vec<Option<f64>> = out.metrics.iter().map(|m| m.pacing_drift_percent).collect();
    assert_eq!(drifts, vec![Some(5.0), Some(10.0), Some(20.0)]);
    let classes: Vec<Option<PacingClass>> = out.metrics.iter().map(|m| m.pacing_class).collect();
    assert_eq!(
        classes,
        vec![
            Some(PacingClass::Steady),
            Some(PacingClass::Steady),
            Some(PacingClass::Unsteady)
        ]
    );
}

#[test]
fn drift_median_scenario() {
    // 9.14 og 9.15 er <= median 9.15, 9.16 er over
    let (median, classes) = classify_drifts(&[9.16, 9.14, 9.15]);
    assert_eq!(median, Some(9.15));
    assert_eq!(
        classes,
        vec![PacingClass::Unsteady, PacingClass::Steady, PacingClass::Steady]
    );
}

#[test]
fn even_count_uses_mean_of_middle_pair() {
    let (median, classes) = classify_drifts(&[4.0, 8.0, 2.0, 6.0]);
    assert_eq!(median, Some(5.0));
    assert_eq!(
        classes,
        vec![
            PacingClass::Steady,
            PacingClass::Unsteady,
            PacingClass::Steady,
            PacingClass::Unsteady
        ]
    );
}

#[test]
fn excluded_reps_get_no_class_and_do_not_move_median() {
    let metrics = vec![
        rep(1, Some(5.0), Some(0.0625)),
        rep(2, None, None),
        rep(3, Some(0.0), Some(0.0)),
        rep(4, Some(5.0), Some(1.0)),
    ];

    let out = classify(&metrics);

    // median over 5 % og 20 %
    assert_eq!(out.median_drift_percent, Some(12.5));
    assert_eq!(out.metrics[1].pacing_class, None);
    assert_eq!(out.metrics[1].exclusion, Some(Exclusion::EmptyWorkWindow));
    assert_eq!(out.metrics[2].pacing_class, None);
    assert_eq!(out.metrics[2].pacing_drift_percent, None);
    assert_eq!(out.metrics[2].exclusion, Some(Exclusion::ZeroMeanSpeed));
    assert_eq!(out.metrics[0].pacing_class, Some(PacingClass::Steady));
    assert_eq!(out.metrics[3].pacing_class, Some(PacingClass::Unsteady));
}

#[test]
fn identical_drifts_are_all_steady() {
    let metrics: Vec<RepMetrics> = (1..=4).map(|k| rep(k, Some(5.0), Some(0.25))).collect();
    let out = classify(&metrics);
    assert!(out
        .metrics
        .iter()
        .all(|m| m.pacing_class == Some(PacingClass::Steady)));
}
