//! Durable result persistence and resume-state loading.
//!
//! The results CSV is both the resume checkpoint and the final deliverable,
//! so every append is flushed before returning and prior rows are never
//! rewritten or reordered.

use crate::schema::ResultRow;
use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Column order of the persisted file. A file whose header differs is
/// treated as unreadable rather than migrated.
pub const RESULT_HEADER: [&str; 7] = [
    "osm_name",
    "lat",
    "lon",
    "google_name",
    "website",
    "status",
    "not_found",
];

/// Durable record of which identities have been processed.
///
/// Injectable so tests can substitute an in-memory implementation that
/// satisfies the same contract.
pub trait ResultStore {
    /// Whether a row for this identity already exists.
    fn contains(&self, identity: &str) -> bool;

    /// Append one row and make it durable before returning. Also registers
    /// the identity so later duplicates in the same run are skipped.
    fn append(&mut self, row: &ResultRow) -> Result<()>;

    /// Number of identities currently persisted.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// CSV-backed store. Rows are appended one at a time and flushed so an
/// interruption loses at most the row being written.
pub struct CsvStore {
    writer: csv::Writer<File>,
    known: HashSet<String>,
    path: PathBuf,
}

impl CsvStore {
    /// Open or create the store at `path`, loading prior identities.
    ///
    /// An unreadable or schema-mismatched file degrades to an empty store:
    /// the old file is moved aside to `<path>.corrupt` with a warning, and
    /// the run proceeds with no resume history.
    pub fn open(path: &Path) -> Result<Self> {
        let known = if path.exists() {
            match load_identities(path) {
                Ok(known) => known,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "existing results file is unreadable; starting from an empty store"
                    );
                    set_aside_corrupt(path)?;
                    HashSet::new()
                }
            }
        } else {
            HashSet::new()
        };

        let fresh = !path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open results file {}", path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if fresh {
            writer
                .write_record(RESULT_HEADER)
                .context("write results header")?;
            writer.flush().context("flush results header")?;
        }
        Ok(Self {
            writer,
            known,
            path: path.to_path_buf(),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultStore for CsvStore {
    fn contains(&self, identity: &str) -> bool {
        self.known.contains(identity)
    }

    fn append(&mut self, row: &ResultRow) -> Result<()> {
        self.writer
            .serialize(row)
            .with_context(|| format!("write result row for {:?}", row.osm_name))?;
        self.writer
            .flush()
            .with_context(|| format!("flush results file {}", self.path.display()))?;
        self.known.insert(row.osm_name.clone());
        Ok(())
    }

    fn len(&self) -> usize {
        self.known.len()
    }
}

fn load_identities(path: &Path) -> Result<HashSet<String>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("read {}", path.display()))?;
    let header = reader.headers().context("read results header")?;
    if header.iter().ne(RESULT_HEADER) {
        return Err(anyhow!("unexpected results header {header:?}"));
    }
    let mut known = HashSet::new();
    for row in reader.deserialize::<ResultRow>() {
        let row = row.context("parse results row")?;
        known.insert(row.osm_name);
    }
    Ok(known)
}

fn set_aside_corrupt(path: &Path) -> Result<()> {
    let mut aside = path.as_os_str().to_os_string();
    aside.push(".corrupt");
    let aside = PathBuf::from(aside);
    fs::rename(path, &aside)
        .with_context(|| format!("set aside unreadable results file {}", path.display()))?;
    tracing::warn!(moved_to = %aside.display(), "unreadable results file set aside");
    Ok(())
}
