//! Web-presence lookup against the Google Places text-search API.

use crate::schema::EnrichmentOutcome;
use serde_json::Value;

/// A single external attempt to resolve a business's current web presence.
///
/// Implementations report transport and quota errors as `LookupFailed`;
/// nothing is raised past this boundary.
pub trait PresenceLookup {
    fn check(&mut self, name: &str, lat: f64, lon: f64) -> EnrichmentOutcome;
}

/// Text-search client. Searches within `radius_m` of the supplied location
/// and takes the first, most relevant match.
pub struct GooglePlaces {
    endpoint: String,
    api_key: String,
    radius_m: f64,
}

impl GooglePlaces {
    pub fn new(endpoint: String, api_key: String, radius_m: f64) -> Self {
        Self {
            endpoint,
            api_key,
            radius_m,
        }
    }
}

impl PresenceLookup for GooglePlaces {
    fn check(&mut self, name: &str, lat: f64, lon: f64) -> EnrichmentOutcome {
        let response = ureq::get(self.endpoint.as_str())
            .query("query", name)
            .query("location", &format!("{lat},{lon}"))
            .query("radius", &format!("{}", self.radius_m))
            .query("key", &self.api_key)
            .call();
        let mut response = match response {
            Ok(response) => response,
            Err(err) => {
                return EnrichmentOutcome::LookupFailed {
                    reason: format!("lookup request: {err}"),
                }
            }
        };
        match response.body_mut().read_json::<Value>() {
            Ok(payload) => outcome_from_payload(&payload),
            Err(err) => EnrichmentOutcome::LookupFailed {
                reason: format!("lookup response: {err}"),
            },
        }
    }
}

/// Map a text-search payload onto an outcome: an API error message is a
/// failure, an empty result list is a miss, anything else is a hit taken
/// from the top result.
pub fn outcome_from_payload(payload: &Value) -> EnrichmentOutcome {
    if let Some(message) = payload.get("error_message").and_then(Value::as_str) {
        return EnrichmentOutcome::LookupFailed {
            reason: message.to_string(),
        };
    }
    let results = payload.get("results").and_then(Value::as_array);
    let top = match results.and_then(|results| results.first()) {
        Some(top) => top,
        None => return EnrichmentOutcome::NotFound,
    };
    EnrichmentOutcome::Found {
        canonical_name: string_field(top, "name").unwrap_or_default(),
        website: string_field(top, "website"),
        status: string_field(top, "business_status"),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
