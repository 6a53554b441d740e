// core/tests/test_ingest.rs

use intervalgraph_core::{parse_laps, parse_records, LapType, SchemaError, SkipReason, Table};

const RECORDS_HEADER: &str =
    "timestamp,speed,heart_rate,cadence,vertical_ratio,ground_contact_time,distance";

#[test]
fn records_are_typed_sorted_and_skips_are_reported() {
    // Arrange: linje 3 tom puls, linje 4 mangler kolonne, linje 6 duplikat
    let csv = format!(
        "{RECORDS_HEADER}\n\
         2,5.0,150,180,7.9,240,10\n\
         3,5.1,,180,7.9,240,15\n\
         4,5.2,152,180\n\
         1,4.9,149,178,8.0,245,5\n\
         2,9.9,199,199,9.9,299,99\n\
         5,5.3,NaN,181,7.8,238,25\n"
    );

    // Act
    let parsed = parse_records(&csv).expect("records");

    // Assert: to gyldige rader, sortert på tid
    let ts: Vec<f64> = parsed.rows.iter().map(|r| r.timestamp).collect();
    assert_eq!(ts, vec![1.0, 2.0]);
    assert_eq!(parsed.rows[1].speed, 5.0, "første rad vinner ved duplikat");

    assert_eq!(parsed.skipped_count(), 4);
    let lines: Vec<u64> = parsed.skipped.iter().map(|s| s.line).collect();
    assert_eq!(lines, vec![3, 4, 6, 7]);
    assert!(matches!(parsed.skipped[0].reason, SkipReason::BlankCell { .. }));
    assert_eq!(
        parsed.skipped[1].reason,
        SkipReason::RaggedRow {
            expected: 7,
            found: 4
        }
    );
    assert_eq!(parsed.skipped[2].reason, SkipReason::DuplicateTimestamp);
}

#[test]
fn non_numeric_cell_is_fatal_with_location() {
    let csv = format!("{RECORDS_HEADER}\n1,5.0,150,180,7.9,240,10\n2,fast,150,180,7.9,240,12\n");
    let err = parse_records(&csv).unwrap_err();
    assert_eq!(
        err,
        SchemaError::NonNumeric {
            table: Table::Records,
            line: 3,
            column: "speed",
            value: "fast".to_string(),
        }
    );
}

#[test]
fn missing_column_is_fatal() {
    let csv = "timestamp,speed,heart_rate\n1,2,3\n";
    let err = parse_records(csv).unwrap_err();
    assert_eq!(
        err,
        SchemaError::MissingColumn {
            table: Table::Records,
            column: "cadence"
        }
    );
}

#[test]
fn empty_input_is_fatal() {
    assert_eq!(
        parse_records("").unwrap_err(),
        SchemaError::EmptyInput {
            table: Table::Records
        }
    );
}

#[test]
fn extraction_column_names_are_accepted() {
    // Kolonnenavn slik uttrekkssteget skriver dem
    let records = "elapsed_time_s,speed_kmh,heart_rate,cadence_step_per_min,vertical_ratio,stance_time,distance\n\
                   0,12.0,120,170,8.1,250,0\n\
                   1,12.2,121,171,8.0,249,3.4\n";
    let parsed = parse_records(records).expect("aliases");
    assert_eq!(parsed.rows.len(), 2);
    assert_eq!(parsed.rows[1].ground_contact_time, 249.0);
    assert_eq!(parsed.rows[1].cadence, 171.0);

    let laps = "lap_number,start_time,end_time,lap_nature,avg_speed_kmh\n\
                1,2024-05-01 10:00:00+00:00,2024-05-01 10:10:00+00:00,Warm-up,10.2\n\
                2,2024-05-01 10:10:00+00:00,2024-05-01 10:11:00+00:00,Intensity,18.4\n\
                3,2024-05-01 10:11:00+00:00,2024-05-01 10:12:00+00:00,Unknown,\n";
    let parsed = parse_laps(laps).expect("laps");
    assert!(parsed.skipped.is_empty());
    let l = &parsed.rows;
    assert_eq!(l[0].lap_index, 0, "lap_number er 1-basert");
    assert_eq!(l[0].declared_type, Some(LapType::WarmUp));
    assert_eq!(l[1].declared_type, Some(LapType::Work));
    assert_eq!(l[2].declared_type, None);
    assert_eq!(l[2].avg_speed, None);
    assert!((l[1].duration() - 60.0).abs() < 1e-9);
}

#[test]
fn laps_with_invalid_span_are_skipped() {
    let laps = "lap_index,start_time,end_time,type\n\
                0,0,60,work\n\
                1,60,60,recovery\n\
                2,120,90,recovery\n\
                3,60,120,recovery\n";
    let parsed = parse_laps(laps).expect("laps");
    let idx: Vec<usize> = parsed.rows.iter().map(|l| l.lap_index).collect();
    assert_eq!(idx, vec![0, 3]);
    assert_eq!(parsed.skipped_count(), 2);
    assert!(parsed
        .skipped
        .iter()
        .all(|s| s.reason == SkipReason::InvalidSpan));
}

#[test]
fn lap_number_zero_is_fatal() {
    // lap_number er 1-basert: 0 kan ikke bli en gyldig indeks
    let laps = "lap_number,start_time,end_time\n\
                0,0,60\n\
                1,60,120\n";
    let err = parse_laps(laps).unwrap_err();
    assert_eq!(
        err,
        SchemaError::InvalidLapIndex {
            table: Table::Laps,
            line: 2,
            column: "lap_number",
            value: "0".to_string(),
        }
    );
}

#[test]
fn duplicate_lap_index_keeps_first_row() {
    let laps = "lap_index,start_time,end_time,type\n\
                0,0,60,work\n\
                1,60,120,recovery\n\
                1,120,180,work\n";
    let parsed = parse_laps(laps).expect("laps");
    assert_eq!(parsed.rows.len(), 2);
    assert_eq!(parsed.rows[1].start_time, 60.0);
    assert_eq!(parsed.skipped.len(), 1);
    assert_eq!(parsed.skipped[0].line, 4);
    assert_eq!(
        parsed.skipped[0].reason,
        SkipReason::DuplicateLapIndex { lap_index: 1 }
    );
}
