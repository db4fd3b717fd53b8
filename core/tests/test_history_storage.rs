// tests/test_history_storage.rs
use chrono::{TimeZone, Utc};
use workout_core::history::{decode_history, encode_history};
use workout_core::{
    FileStore, HistoryLoadError, KeyValueStore, MemoryStore, MetricAggregator, MetricChannel,
    RawSample, StatKind, StatSample, WorkoutError, WorkoutHistory, WorkoutHistoryStore,
    WorkoutRecord,
};

fn sample_record(day: u32, with_samples: bool) -> WorkoutRecord {
    let mut rec = WorkoutRecord::started_at(Utc.with_ymd_and_hms(2026, 5, day, 6, 30, 0).unwrap());
    rec.end_time = Some(Utc.with_ymd_and_hms(2026, 5, day, 7, 5, 12).unwrap());
    if with_samples {
        rec.push_raw(MetricChannel::HeartRate, RawSample { elapsed_seconds: 5, value: 72.0 });
        rec.push_raw(MetricChannel::HeartRate, RawSample { elapsed_seconds: 6, value: 75.0 });
        rec.push_raw(MetricChannel::Distance, RawSample { elapsed_seconds: 6, value: 30.0 });
        rec.stat_data.insert(
            MetricChannel::HeartRate,
            vec![
                StatSample { elapsed_seconds: 6, value: 147.0, kind: StatKind::Sum },
                StatSample { elapsed_seconds: 6, value: 73.5, kind: StatKind::Avg },
            ],
        );
    }
    rec
}

#[test]
fn roundtrip_zero_one_and_many_records() {
    let cases = vec![
        WorkoutHistory::default(),
        WorkoutHistory { workouts: vec![sample_record(1, false)] },
        WorkoutHistory {
            workouts: vec![sample_record(1, true), sample_record(2, false), sample_record(3, true)],
        },
    ];
    for history in cases {
        let text = encode_history(&history).expect("encode");
        let back = decode_history(&text).expect("decode");
        assert_eq!(back, history);
    }
}

/// Økt med distansestrøm via aggregatoren, så statData får ikke-representerbare
/// snitt og fartsverdier (×0.681818).
fn distance_record(seed: u64) -> WorkoutRecord {
    let mut agg = MetricAggregator::default();
    let mut rec = WorkoutRecord::started_at(Utc.with_ymd_and_hms(2026, 6, 1, 6, 0, 0).unwrap());
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut distance = 0.0;
    for t in 1..=12u64 {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        distance += ((state >> 33) % 17) as f64 + 0.4;
        let out = agg.record_sample(MetricChannel::Distance, t * 2, distance).unwrap();
        rec.push_raw(MetricChannel::Distance, out.sample);
    }
    rec.end_time = Some(Utc.with_ymd_and_hms(2026, 6, 1, 6, 30, 0).unwrap());
    for channel in MetricChannel::ALL {
        rec.stat_data.insert(channel, agg.summary(channel, 24));
    }
    rec
}

#[test]
fn speed_derived_stats_roundtrip_exactly() {
    for seed in 0..500 {
        let history = WorkoutHistory { workouts: vec![distance_record(seed)] };
        let text = encode_history(&history).unwrap();
        let back = decode_history(&text).unwrap();
        assert_eq!(back, history, "seed {seed}: {text}");
    }
}

#[test]
fn append_then_load_does_not_duplicate_record() {
    for seed in 0..50 {
        let mut store = WorkoutHistoryStore::new(MemoryStore::new());
        store.append(distance_record(seed)).unwrap();
        assert_eq!(store.load().len(), 1, "seed {seed}");
    }
}

#[test]
fn unfinished_record_keeps_null_end_time() {
    let mut rec = sample_record(4, true);
    rec.end_time = None;
    let history = WorkoutHistory { workouts: vec![rec] };
    let text = encode_history(&history).unwrap();
    assert!(text.contains(r#""endTime":null"#));
    assert_eq!(decode_history(&text).unwrap(), history);
}

#[test]
fn file_store_save_then_load_reproduces_history() {
    let dir = tempfile::tempdir().unwrap();

    let mut store = WorkoutHistoryStore::new(FileStore::new(dir.path()));
    store.append(sample_record(1, true)).expect("append 1");
    store.append(sample_record(2, false)).expect("append 2");

    let mut reopened = WorkoutHistoryStore::new(FileStore::new(dir.path()));
    let loaded = reopened.load().clone();
    assert_eq!(&loaded, store.history());
    assert_eq!(loaded.len(), 2);
    assert!(dir.path().join("workouts.json").exists());
}

#[test]
fn missing_file_is_absent_and_load_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = WorkoutHistoryStore::new(FileStore::new(dir.path().join("nested")));
    assert!(matches!(
        store.try_load(),
        Err(WorkoutError::PersistenceDecode(HistoryLoadError::Absent(_)))
    ));
    assert!(store.load().is_empty());

    // ny økt kan fortsatt lagres, katalogen opprettes
    store.append(sample_record(9, false)).unwrap();
    assert_eq!(store.try_load().unwrap().len(), 1);
}

#[test]
fn corrupt_file_falls_back_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut fs = FileStore::new(dir.path());
    fs.set("workouts", "{ not json").unwrap();

    let mut store = WorkoutHistoryStore::new(fs);
    assert!(matches!(
        store.try_load(),
        Err(WorkoutError::PersistenceDecode(HistoryLoadError::Decode { .. }))
    ));
    assert!(store.load().is_empty());
}

#[test]
fn custom_key_maps_to_its_own_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = WorkoutHistoryStore::with_key(FileStore::new(dir.path()), "runs");
    store.append(sample_record(1, false)).unwrap();
    assert!(dir.path().join("runs.json").exists());
    assert!(!dir.path().join("workouts.json").exists());
}
