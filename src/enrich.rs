//! The enrichment loop: per-record decisions, rate limiting, checkpointing.
//!
//! Each record is taken end-to-end (decide, optionally look up, merge,
//! persist) before the next one starts. The append is the checkpoint: it
//! happens for every non-skipped record, including failed lookups, so a
//! rerun never reissues a lookup for an identity that already has a row.
//! Failed lookups are terminal per identity within a run; retrying one
//! means rerunning after deleting its row from the results file.

use crate::lookup::PresenceLookup;
use crate::schema::{BusinessRecord, EnrichmentOutcome, ResultRow, RunSummary};
use crate::store::ResultStore;
use anyhow::Result;
use std::thread;
use std::time::{Duration, Instant};

/// Minimum-interval pacing between consecutive lookup calls. Records that
/// skip the lookup never pause.
pub struct Pacer {
    interval: Duration,
    last_call: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: None,
        }
    }

    /// Block until at least the configured interval has passed since the
    /// previous `mark`. The first call never blocks.
    pub fn pause(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
    }

    /// Record that a lookup call just finished.
    pub fn mark(&mut self) {
        self.last_call = Some(Instant::now());
    }
}

/// Drive the per-record decision and persistence loop over `records`.
///
/// Identities already in the store are skipped with no side effects. A
/// lookup runs iff the record carries no known website. Every constructed
/// row is appended and flushed before the next record starts; an append
/// failure aborts the run, a lookup failure only marks the row.
pub fn enrich_records(
    records: &[BusinessRecord],
    store: &mut dyn ResultStore,
    lookup: &mut dyn PresenceLookup,
    pacer: &mut Pacer,
) -> Result<RunSummary> {
    let total = records.len();
    let mut summary = RunSummary::default();
    let mut processed = store.len();

    for record in records {
        if store.contains(&record.name) {
            summary.skipped_already_done += 1;
            continue;
        }
        processed += 1;
        println!("[{processed}/{total}] {}", record.name);

        let outcome = match known_website(record) {
            Some(website) => EnrichmentOutcome::HasKnownWebsite {
                website: website.to_string(),
            },
            None => {
                pacer.pause();
                let outcome = lookup.check(&record.name, record.lat, record.lon);
                pacer.mark();
                outcome
            }
        };

        match &outcome {
            EnrichmentOutcome::HasKnownWebsite { website } => {
                summary.resolved_from_source += 1;
                tracing::debug!(name = %record.name, %website, "known website, lookup skipped");
            }
            EnrichmentOutcome::Found {
                canonical_name,
                website,
                ..
            } => {
                summary.found += 1;
                tracing::info!(
                    name = %record.name,
                    canonical = %canonical_name,
                    website = ?website,
                    "match found"
                );
            }
            EnrichmentOutcome::NotFound => {
                summary.not_found += 1;
                tracing::info!(name = %record.name, "no match");
            }
            EnrichmentOutcome::LookupFailed { reason } => {
                summary.lookup_failed += 1;
                tracing::warn!(name = %record.name, %reason, "lookup failed; recorded, moving on");
            }
        }

        let row = ResultRow::merge(record, &outcome);
        store.append(&row)?;
    }

    Ok(summary)
}

fn known_website(record: &BusinessRecord) -> Option<&str> {
    record
        .website
        .as_deref()
        .map(str::trim)
        .filter(|site| !site.is_empty())
}
