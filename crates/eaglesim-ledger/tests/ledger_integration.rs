use chrono::NaiveDate;
use eaglesim_core::Eagle;
use eaglesim_ledger::{FileStore, LedgerError, ScoreLedger, ScoreRecord, ScoreStore};
use std::fs;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

#[test]
fn absent_store_is_an_empty_record_set() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ledger = ScoreLedger::file(dir.path().join("scores.txt"));
    assert!(ledger.records().expect("load").is_empty());
}

#[test]
fn file_ledger_grows_and_stays_sorted_across_saves() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scores.txt");

    let mut eagle = Eagle::new("Aquila", 250.0);
    eagle.fly_to(3, 4, 1);

    let mut ledger = ScoreLedger::file(&path);
    let before = ledger.records().expect("load").len();

    ledger
        .save(ScoreRecord::from_eagle(&eagle, date("2026-08-27")))
        .expect("first save");
    eagle.fly_to(0, 0, 1);
    ledger
        .save(ScoreRecord::from_eagle(&eagle, date("2026-08-27")))
        .expect("second save");

    let records = ledger.records().expect("load");
    assert_eq!(records.len(), before + 2);
    for pair in records.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    assert!((records[0].score - 10.0).abs() < 1e-9);
    assert!((records[1].score - 5.0).abs() < 1e-9);

    // The on-disk text is the contractual line format, best score first.
    let contents = fs::read_to_string(&path).expect("store exists");
    let first_line = contents.lines().next().expect("non-empty store");
    assert!(first_line.starts_with("10.00, 2026-08-27, Eagle: Aquila,"));
}

#[test]
fn reopened_store_preserves_previous_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scores.txt");

    {
        let mut ledger = ScoreLedger::file(&path);
        ledger
            .save(ScoreRecord {
                score: 42.0,
                date: date("2026-01-01"),
                name: "Old".to_owned(),
                distance: 42.0,
                energy: 1.0,
            })
            .expect("save");
    }

    let ledger = ScoreLedger::file(&path);
    let records = ledger.records().expect("load");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Old");
    assert_eq!(records[0].date, date("2026-01-01"));
}

#[test]
fn corrupt_lines_surface_as_typed_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scores.txt");
    fs::write(&path, "garbage that is not a record\n").expect("write");

    let store = FileStore::new(&path);
    assert!(matches!(
        store.load(),
        Err(LedgerError::MalformedRecord { .. })
    ));
}
