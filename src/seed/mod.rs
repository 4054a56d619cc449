//! One-time population of the record store.
//!
//! # Data Flow
//! ```text
//! CSV files (or the embedded ten-row dataset)
//!     → rows.rs (deserialize, normalize tract ids)
//!     → dedupe against ids already stored and ids seen this run
//!     → TractStore::insert (sanitize, validate, write)
//!     → SeedReport
//! ```
//!
//! Runs before the API serves traffic, either from `igs-api seed` or at
//! startup when `storage.seed_on_startup` is set.

pub mod rows;

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::store::{StoreError, TractStore};

/// The reference dataset shipped with the binary.
pub const BUILTIN_DATASET: &str = include_str!("../../data/igs_data.csv");

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a seeding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub inserted: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

impl SeedReport {
    fn absorb(&mut self, other: SeedReport) {
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
        self.rejected += other.rejected;
    }
}

/// Seed from the embedded dataset.
pub fn seed_builtin(store: &TractStore) -> Result<SeedReport, SeedError> {
    let mut seen = store.ids()?;
    let report = seed_source(store, "builtin", BUILTIN_DATASET.as_bytes(), &mut seen)?;
    log_report(&report);
    Ok(report)
}

/// Seed from CSV files in order. Missing files are skipped.
pub fn seed_files<P: AsRef<Path>>(store: &TractStore, paths: &[P]) -> Result<SeedReport, SeedError> {
    let mut seen = store.ids()?;
    let mut report = SeedReport::default();

    for path in paths {
        let path = path.as_ref();
        let label = path.display().to_string();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %label, "Seed file not found, skipping");
                continue;
            }
            Err(source) => return Err(SeedError::Io { path: label, source }),
        };

        report.absorb(seed_source(store, &label, file, &mut seen)?);
    }

    log_report(&report);
    Ok(report)
}

fn seed_source<R: Read>(
    store: &TractStore,
    label: &str,
    source: R,
    seen: &mut BTreeSet<String>,
) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    for (line, row) in rows::read_rows(source).into_iter().enumerate() {
        let tract = match row {
            Ok(tract) => tract,
            Err(e) => {
                warn!(source = %label, row = line + 1, error = %e, "Skipping unreadable row");
                report.rejected += 1;
                continue;
            }
        };

        if seen.contains(&tract.census_tract) {
            report.duplicates += 1;
            continue;
        }

        match store.insert(tract) {
            Ok(stored) => {
                seen.insert(stored.census_tract);
                report.inserted += 1;
            }
            Err(StoreError::DuplicateKey(id)) => {
                seen.insert(id);
                report.duplicates += 1;
            }
            Err(StoreError::InvalidRecord(reason)) => {
                warn!(source = %label, row = line + 1, %reason, "Rejected row");
                report.rejected += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(report)
}

fn log_report(report: &SeedReport) {
    info!(
        inserted = report.inserted,
        duplicates = report.duplicates,
        rejected = report.rejected,
        "Seeding finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "census_tract,inclusion_score,growth_score,economy_score,community_score,median_income,income_group,description\n";

    #[test]
    fn builtin_dataset_has_ten_valid_rows() {
        let store = TractStore::open_in_memory().unwrap();
        let report = seed_builtin(&store).unwrap();

        assert_eq!(report, SeedReport { inserted: 10, duplicates: 0, rejected: 0 });
        for tract in store.get_all().unwrap() {
            assert_eq!(tract.census_tract.len(), 11);
            assert!((0.0..=100.0).contains(&tract.inclusion_score));
            assert!((0.0..=100.0).contains(&tract.growth_score));
        }
        assert!(store.get_by_id("06037102107").is_ok());
    }

    #[test]
    fn reseeding_inserts_nothing() {
        let store = TractStore::open_in_memory().unwrap();
        seed_builtin(&store).unwrap();

        let again = seed_builtin(&store).unwrap();
        assert_eq!(again, SeedReport { inserted: 0, duplicates: 10, rejected: 0 });
        assert_eq!(store.count().unwrap(), 10);
    }

    #[test]
    fn blank_tract_id_is_rejected() {
        let csv = format!("{HEADER},40,45,50,55,60000,low,No id\n6037102107,18,34,22,41,21450,low,Skid Row\n");
        let store = TractStore::open_in_memory().unwrap();
        let mut seen = BTreeSet::new();

        let report = seed_source(&store, "inline", csv.as_bytes(), &mut seen).unwrap();

        assert_eq!(report, SeedReport { inserted: 1, duplicates: 0, rejected: 1 });
        assert!(store.get_by_id("00000000000").is_err());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn second_file_is_deduplicated_against_first() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("igs_data.csv");
        let extra = dir.path().join("igs_data_extra.csv");

        let mut f = File::create(&main).unwrap();
        writeln!(f, "{HEADER}6037102107,18,34,22,41,21450,low,Skid Row").unwrap();
        let mut f = File::create(&extra).unwrap();
        write!(
            f,
            "{HEADER}6037102107.0,99,99,99,99,1,high,Duplicate\n\
             6073008339,35,50,41,53,41210,low,<script>alert(1)</script>City Heights\n\
             6075010200,182,64,88,69,198750,high,Bad score\n"
        )
        .unwrap();

        let store = TractStore::open_in_memory().unwrap();
        let report = seed_files(&store, &[main, extra, dir.path().join("missing.csv")]).unwrap();

        assert_eq!(report, SeedReport { inserted: 2, duplicates: 1, rejected: 1 });
        assert_eq!(store.get_by_id("06037102107").unwrap().inclusion_score, 18.0);
        assert_eq!(store.get_by_id("06073008339").unwrap().description, "City Heights");
    }
}
