//! Core data types shared by extraction, lookup, and persistence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status token for rows satisfied by a website already present in the
/// source data. No lookup is performed for these.
pub const STATUS_RESOLVED_FROM_SOURCE: &str = "resolved-from-source";

/// Status token for rows recording a failed lookup. A failure is terminal
/// for the identity within a run: rerunning retries it only after the row
/// is removed by hand.
pub const STATUS_LOOKUP_FAILED: &str = "lookup-failed";

/// A business extracted from the record source. The name doubles as the
/// dedup and resume key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessRecord {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub website: Option<String>,
}

/// Tag filter selector: accept any value for a key, or an explicit set.
#[derive(Debug, Clone, PartialEq)]
pub enum TagSelector {
    Any(bool),
    Values(Vec<String>),
}

/// Mapping of tag key to accepted values, in stable key order.
pub type TagFilter = BTreeMap<String, TagSelector>;

/// Outcome of deciding or performing a web-presence check for one record.
///
/// Kept as a tagged enum so every consumer has to handle every kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
    /// The source record already carried a website; no lookup performed.
    HasKnownWebsite { website: String },
    /// The lookup resolved a match.
    Found {
        canonical_name: String,
        website: Option<String>,
        status: Option<String>,
    },
    /// The lookup ran and returned no match.
    NotFound,
    /// The lookup errored; recorded per record, never fatal to the run.
    LookupFailed { reason: String },
}

/// One persisted result row. Terminal once appended; the store never holds
/// two rows with the same `osm_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub osm_name: String,
    pub lat: f64,
    pub lon: f64,
    pub google_name: Option<String>,
    pub website: Option<String>,
    pub status: Option<String>,
    pub not_found: bool,
}

impl ResultRow {
    /// Merge a record and its outcome into the row that gets persisted.
    pub fn merge(record: &BusinessRecord, outcome: &EnrichmentOutcome) -> Self {
        let base = ResultRow {
            osm_name: record.name.clone(),
            lat: record.lat,
            lon: record.lon,
            google_name: None,
            website: None,
            status: None,
            not_found: false,
        };
        match outcome {
            EnrichmentOutcome::HasKnownWebsite { website } => ResultRow {
                website: Some(website.clone()),
                status: Some(STATUS_RESOLVED_FROM_SOURCE.to_string()),
                ..base
            },
            EnrichmentOutcome::Found {
                canonical_name,
                website,
                status,
            } => ResultRow {
                google_name: Some(canonical_name.clone()),
                website: website.clone(),
                status: status.clone(),
                ..base
            },
            EnrichmentOutcome::NotFound => ResultRow {
                not_found: true,
                ..base
            },
            EnrichmentOutcome::LookupFailed { .. } => ResultRow {
                status: Some(STATUS_LOOKUP_FAILED.to_string()),
                not_found: true,
                ..base
            },
        }
    }
}

/// Counts reported once at the end of a run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub skipped_already_done: usize,
    pub resolved_from_source: usize,
    pub found: usize,
    pub not_found: usize,
    pub lookup_failed: usize,
}

impl RunSummary {
    /// Rows appended by this run (everything except skips).
    pub fn appended(&self) -> usize {
        self.resolved_from_source + self.found + self.not_found + self.lookup_failed
    }
}
