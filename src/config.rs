//! Run configuration: defaults, environment fallbacks, CLI assembly.

use crate::cli::RootArgs;
use crate::schema::{TagFilter, TagSelector};
use crate::source::{Bbox, SearchArea};
use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Place searched when none is supplied.
pub const DEFAULT_PLACE: &str = "København, Danmark";
/// Lookup search radius in meters.
pub const DEFAULT_RADIUS_M: f64 = 200.0;
/// Minimum interval between lookup calls.
pub const DEFAULT_LOOKUP_INTERVAL: Duration = Duration::from_secs(1);

/// Public Overpass interpreter endpoint.
pub const OVERPASS_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";
/// Places text-search endpoint.
pub const PLACES_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";

/// Environment variable consulted when `--api-key` is absent.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
/// Environment override for the record source endpoint.
pub const OVERPASS_URL_ENV: &str = "GHOSTBIZ_OVERPASS_URL";
/// Environment override for the lookup endpoint.
pub const PLACES_URL_ENV: &str = "GHOSTBIZ_PLACES_URL";

/// What the run does once records are extracted.
#[derive(Debug, Clone)]
pub enum RunMode {
    /// Export extracted records directly, no lookups.
    OsmOnly,
    /// Run the enrichment loop with this lookup credential.
    Enrich { api_key: String },
}

/// Everything a run needs, resolved as flag > environment > default.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub area: SearchArea,
    pub tags: TagFilter,
    pub out: PathBuf,
    pub mode: RunMode,
    pub radius_m: f64,
    pub lookup_interval: Duration,
    pub overpass_endpoint: String,
    pub places_endpoint: String,
}

impl RunConfig {
    pub fn from_args(args: &RootArgs) -> Result<Self> {
        let area = match &args.bbox {
            Some(raw) => SearchArea::Bounds(Bbox::parse(raw)?),
            None => SearchArea::Place(
                args.place
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PLACE.to_string()),
            ),
        };
        let tags = if args.tags.is_empty() {
            default_tags()
        } else {
            parse_tag_filter(&args.tags)?
        };
        let mode = if args.osm_only {
            RunMode::OsmOnly
        } else {
            let api_key = args
                .api_key
                .clone()
                .or_else(|| env::var(API_KEY_ENV).ok())
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty())
                .ok_or_else(|| {
                    anyhow!("no lookup credential: pass --api-key or set {API_KEY_ENV}, or use --osm-only")
                })?;
            RunMode::Enrich { api_key }
        };
        let radius_m = match args.radius {
            Some(radius) if radius.is_finite() && radius > 0.0 => radius,
            Some(radius) => return Err(anyhow!("invalid lookup radius {radius}")),
            None => DEFAULT_RADIUS_M,
        };
        let lookup_interval = match args.delay {
            Some(secs) if secs.is_finite() && secs >= 0.0 => Duration::from_secs_f64(secs),
            Some(secs) => return Err(anyhow!("invalid lookup delay {secs}")),
            None => DEFAULT_LOOKUP_INTERVAL,
        };
        Ok(Self {
            area,
            tags,
            out: args.out.clone(),
            mode,
            radius_m,
            lookup_interval,
            overpass_endpoint: env::var(OVERPASS_URL_ENV)
                .unwrap_or_else(|_| OVERPASS_ENDPOINT.to_string()),
            places_endpoint: env::var(PLACES_URL_ENV)
                .unwrap_or_else(|_| PLACES_ENDPOINT.to_string()),
        })
    }
}

/// Tag set queried when no `--tag` flags are given: every shop, craft, and
/// office, plus common amenity and tourism values.
pub fn default_tags() -> TagFilter {
    let mut tags = TagFilter::new();
    tags.insert("shop".to_string(), TagSelector::Any(true));
    tags.insert(
        "amenity".to_string(),
        TagSelector::Values(
            ["restaurant", "cafe", "bar", "pub", "fast_food", "pharmacy", "bank"]
                .map(str::to_string)
                .to_vec(),
        ),
    );
    tags.insert(
        "tourism".to_string(),
        TagSelector::Values(["hotel", "hostel", "guest_house"].map(str::to_string).to_vec()),
    );
    tags.insert("craft".to_string(), TagSelector::Any(true));
    tags.insert("office".to_string(), TagSelector::Any(true));
    tags
}

/// Parse repeated `--tag KEY[=V1,V2,...]` flags. A bare key accepts any
/// value for that tag.
pub fn parse_tag_filter(raw_tags: &[String]) -> Result<TagFilter> {
    let mut filter = TagFilter::new();
    for raw in raw_tags {
        let raw = raw.trim();
        let (key, selector) = match raw.split_once('=') {
            Some((key, values)) => {
                let values: Vec<String> = values
                    .split(',')
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
                    .collect();
                if values.is_empty() {
                    return Err(anyhow!("tag {key:?} lists no values"));
                }
                (key.trim(), TagSelector::Values(values))
            }
            None => (raw, TagSelector::Any(true)),
        };
        if key.is_empty() {
            return Err(anyhow!("empty tag key in {raw:?}"));
        }
        if filter.insert(key.to_string(), selector).is_some() {
            return Err(anyhow!("tag {key:?} given more than once"));
        }
    }
    Ok(filter)
}
