//! Resumable web-presence enrichment for mapped businesses.
//!
//! Extracts named businesses from OpenStreetMap, decides per record whether
//! an external web-presence lookup is needed, and appends every outcome to
//! a durable CSV so an interrupted run resumes without repeating work.

pub mod cli;
pub mod config;
pub mod enrich;
pub mod lookup;
pub mod schema;
pub mod source;
pub mod store;
