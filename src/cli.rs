//! CLI argument surface.
//!
//! A single entry point: flags pick the search area, tag filter, and output
//! path. Policy (defaults, env fallbacks, validation) lives in the run
//! configuration, not here.
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ghostbiz",
    version,
    about = "Find mapped businesses with no verified web presence",
    after_help = "Examples:\n  ghostbiz --osm-only --out osm_businesses.csv\n  ghostbiz --place \"Milan, Italy\" --tag amenity=restaurant,cafe --out milan.csv\n  ghostbiz --bbox 55.6780,12.5830,55.6800,12.5850 --api-key $GOOGLE_API_KEY\n\nInterrupted runs resume from the output file: rerun with the same --out\nand already-processed businesses are skipped."
)]
pub struct RootArgs {
    /// Place to extract businesses from
    #[arg(long, value_name = "PLACE")]
    pub place: Option<String>,

    /// Bounding box (south,west,north,east) used instead of the place area
    #[arg(long, value_name = "S,W,N,E", conflicts_with = "place")]
    pub bbox: Option<String>,

    /// Tag filter entry, KEY or KEY=V1,V2,... (repeatable)
    #[arg(long = "tag", value_name = "KEY[=VALUES]")]
    pub tags: Vec<String>,

    /// Output CSV path, doubling as the resume checkpoint
    #[arg(long, value_name = "PATH", default_value = "ghostbiz_results.csv")]
    pub out: PathBuf,

    /// Export extracted records directly, skipping web-presence checks
    #[arg(long)]
    pub osm_only: bool,

    /// Lookup API key (defaults to $GOOGLE_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Lookup search radius in meters
    #[arg(long, value_name = "METERS")]
    pub radius: Option<f64>,

    /// Minimum seconds between lookup calls
    #[arg(long, value_name = "SECS")]
    pub delay: Option<f64>,
}
