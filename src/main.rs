use anyhow::{Context, Result};
use clap::Parser;
use ghostbiz::cli::RootArgs;
use ghostbiz::config::{RunConfig, RunMode};
use ghostbiz::enrich::{enrich_records, Pacer};
use ghostbiz::lookup::GooglePlaces;
use ghostbiz::schema::{BusinessRecord, RunSummary};
use ghostbiz::source::extract_businesses;
use ghostbiz::store::{CsvStore, ResultStore};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = RootArgs::parse();
    let config = RunConfig::from_args(&args)?;
    run(&config)
}

fn run(config: &RunConfig) -> Result<()> {
    println!("Extracting businesses for {}...", config.area);
    let records = extract_businesses(&config.overpass_endpoint, &config.area, &config.tags)?;
    println!("Found {} businesses", records.len());

    let api_key = match &config.mode {
        RunMode::OsmOnly => return export_records(&records, &config.out),
        RunMode::Enrich { api_key } => api_key.clone(),
    };

    let mut store = CsvStore::open(&config.out)?;
    if !store.is_empty() {
        println!(
            "Resuming from checkpoint: {} businesses already processed",
            store.len()
        );
    }
    let mut lookup = GooglePlaces::new(config.places_endpoint.clone(), api_key, config.radius_m);
    let mut pacer = Pacer::new(config.lookup_interval);

    let summary = enrich_records(&records, &mut store, &mut lookup, &mut pacer)?;

    println!("Done: results in {}", config.out.display());
    print_summary(&summary);
    Ok(())
}

/// Direct export without enrichment, for runs that only want the extraction.
fn export_records(records: &[BusinessRecord], out: &Path) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(out).with_context(|| format!("create {}", out.display()))?;
    for record in records {
        writer.serialize(record).context("write record")?;
    }
    writer
        .flush()
        .with_context(|| format!("flush {}", out.display()))?;
    println!("Exported {} records to {}", records.len(), out.display());
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("  skipped (already done): {}", summary.skipped_already_done);
    println!("  resolved from source:   {}", summary.resolved_from_source);
    println!("  found:                  {}", summary.found);
    println!("  not found:              {}", summary.not_found);
    println!("  lookup failed:          {}", summary.lookup_failed);
}
