//! Resume behavior against the real CSV-backed store.

mod common;

use common::{record, ScriptedLookup};
use ghostbiz::enrich::{enrich_records, Pacer};
use ghostbiz::schema::{EnrichmentOutcome, ResultRow, STATUS_RESOLVED_FROM_SOURCE};
use ghostbiz::store::{CsvStore, ResultStore};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn fast_pacer() -> Pacer {
    Pacer::new(Duration::from_millis(0))
}

fn load_rows(path: &Path) -> Vec<ResultRow> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.deserialize().collect::<Result<_, _>>().unwrap()
}

#[test]
fn enrichment_persists_and_second_run_adds_nothing() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("results.csv");
    let records = vec![
        record("Cafe A", 55.6, 12.5, Some("cafea.dk")),
        record("Bakery B", 55.61, 12.51, None),
    ];

    let mut store = CsvStore::open(&out).unwrap();
    let mut lookup = ScriptedLookup::new(vec![ScriptedLookup::found(
        "Bakery B ApS",
        Some("https://bakeryb.dk"),
    )]);
    let summary = enrich_records(&records, &mut store, &mut lookup, &mut fast_pacer()).unwrap();
    drop(store);

    assert_eq!(summary.resolved_from_source, 1);
    assert_eq!(summary.found, 1);
    assert_eq!(lookup.calls, vec!["Bakery B".to_string()]);

    let rows = load_rows(&out);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].osm_name, "Cafe A");
    assert_eq!(rows[0].website.as_deref(), Some("cafea.dk"));
    assert_eq!(rows[0].status.as_deref(), Some(STATUS_RESOLVED_FROM_SOURCE));
    assert_eq!(rows[1].osm_name, "Bakery B");
    assert_eq!(rows[1].google_name.as_deref(), Some("Bakery B ApS"));

    // Rerun against the same file: everything is skipped, nothing is asked.
    let mut store = CsvStore::open(&out).unwrap();
    let mut lookup = ScriptedLookup::new(vec![]);
    let summary = enrich_records(&records, &mut store, &mut lookup, &mut fast_pacer()).unwrap();
    drop(store);

    assert_eq!(summary.skipped_already_done, 2);
    assert_eq!(summary.appended(), 0);
    assert!(lookup.calls.is_empty());
    assert_eq!(load_rows(&out), rows);
}

#[test]
fn interrupted_run_resumes_without_duplicates_or_repeat_lookups() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("results.csv");
    let records = vec![
        record("Cafe A", 55.6, 12.5, None),
        record("Bakery B", 55.61, 12.51, None),
        record("Deli C", 55.62, 12.52, None),
        record("Florist D", 55.63, 12.53, None),
    ];

    // First run is cut short after two records.
    let mut store = CsvStore::open(&out).unwrap();
    let mut lookup = ScriptedLookup::new(vec![]);
    enrich_records(&records[..2], &mut store, &mut lookup, &mut fast_pacer()).unwrap();
    drop(store);
    assert_eq!(load_rows(&out).len(), 2);

    // Resume with the full record list.
    let mut store = CsvStore::open(&out).unwrap();
    let mut lookup = ScriptedLookup::new(vec![]);
    let summary = enrich_records(&records, &mut store, &mut lookup, &mut fast_pacer()).unwrap();
    drop(store);

    assert_eq!(summary.skipped_already_done, 2);
    assert_eq!(
        lookup.calls,
        vec!["Deli C".to_string(), "Florist D".to_string()]
    );

    let rows = load_rows(&out);
    assert_eq!(rows.len(), 4);
    let mut names: Vec<&str> = rows.iter().map(|row| row.osm_name.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), 4);
}

#[test]
fn unreadable_checkpoint_degrades_to_a_fresh_run() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("results.csv");
    std::fs::write(&out, "osm_name;lat;lon\nnot a checkpoint\n").unwrap();

    let mut store = CsvStore::open(&out).unwrap();
    assert!(store.is_empty());
    assert!(dir.path().join("results.csv.corrupt").exists());

    let records = vec![record("Cafe A", 55.6, 12.5, None)];
    let mut lookup = ScriptedLookup::new(vec![EnrichmentOutcome::LookupFailed {
        reason: "timeout".to_string(),
    }]);
    let summary = enrich_records(&records, &mut store, &mut lookup, &mut fast_pacer()).unwrap();
    drop(store);

    assert_eq!(summary.lookup_failed, 1);
    let rows = load_rows(&out);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].not_found);
}
