//! Shared fixtures for integration tests.

use ghostbiz::lookup::PresenceLookup;
use ghostbiz::schema::{BusinessRecord, EnrichmentOutcome};
use std::collections::VecDeque;

pub fn record(name: &str, lat: f64, lon: f64, website: Option<&str>) -> BusinessRecord {
    BusinessRecord {
        name: name.to_string(),
        lat,
        lon,
        website: website.map(str::to_string),
    }
}

/// Lookup double that replays scripted outcomes and records who was asked.
pub struct ScriptedLookup {
    outcomes: VecDeque<EnrichmentOutcome>,
    pub calls: Vec<String>,
}

impl ScriptedLookup {
    pub fn new(outcomes: Vec<EnrichmentOutcome>) -> Self {
        Self {
            outcomes: outcomes.into(),
            calls: Vec::new(),
        }
    }

    pub fn found(name: &str, website: Option<&str>) -> EnrichmentOutcome {
        EnrichmentOutcome::Found {
            canonical_name: name.to_string(),
            website: website.map(str::to_string),
            status: Some("OPERATIONAL".to_string()),
        }
    }
}

impl PresenceLookup for ScriptedLookup {
    fn check(&mut self, name: &str, _lat: f64, _lon: f64) -> EnrichmentOutcome {
        self.calls.push(name.to_string());
        self.outcomes
            .pop_front()
            .unwrap_or(EnrichmentOutcome::NotFound)
    }
}
