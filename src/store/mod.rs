//! Upload folder access
//!
//! The presentation layer drops CSV files into a single folder; every analysis
//! reads "the most recently modified CSV" from it. [`UploadStore`] owns that
//! folder, plus a fingerprint-keyed memo of the last loaded table so repeated
//! renders of an unchanged file skip the CSV parse. A newly uploaded or
//! touched file changes the fingerprint and is picked up without manual
//! invalidation.

use crate::error::{CarelensError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;
use tracing::{debug, info};

/// Identity of one on-disk CSV file: path plus modification time plus length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFingerprint {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub len: u64,
}

impl FileFingerprint {
    /// Fingerprint a file from its current metadata.
    pub fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            modified: meta.modified()?,
            len: meta.len(),
        })
    }
}

struct CachedTable {
    fingerprint: FileFingerprint,
    table: DataFrame,
}

/// Folder of uploaded CSV files.
pub struct UploadStore {
    root: PathBuf,
    cache: RwLock<Option<CachedTable>>,
}

impl UploadStore {
    /// Open a store rooted at `root`. The folder does not need to exist yet;
    /// an absent folder simply holds no files.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RwLock::new(None),
        }
    }

    /// Folder this store reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the most recently modified `*.csv` file, or `None` when the
    /// folder is empty or absent.
    pub fn latest_csv(&self) -> Result<Option<PathBuf>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut latest: Option<(PathBuf, SystemTime)> = None;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if !is_csv || !path.is_file() {
                continue;
            }

            let modified = entry.metadata()?.modified()?;
            match &latest {
                Some((_, best)) if *best >= modified => {}
                _ => latest = Some((path, modified)),
            }
        }

        Ok(latest.map(|(path, _)| path))
    }

    /// Load the most recently modified CSV as a [`DataFrame`].
    ///
    /// Returns `Ok(None)` when the folder holds no CSV file. Unchanged files
    /// are served from the in-memory memo.
    pub fn load_latest(&self) -> Result<Option<DataFrame>> {
        let Some(path) = self.latest_csv()? else {
            return Ok(None);
        };
        Ok(Some(self.load(&path)?))
    }

    /// Load one CSV file, via the fingerprint memo.
    pub fn load(&self, path: &Path) -> Result<DataFrame> {
        let fingerprint = FileFingerprint::of(path)?;

        if let Ok(guard) = self.cache.read() {
            if let Some(cached) = guard.as_ref() {
                if cached.fingerprint == fingerprint {
                    debug!(path = %path.display(), "serving table from cache");
                    return Ok(cached.table.clone());
                }
            }
        }

        let table = read_csv(path)?;
        info!(
            path = %path.display(),
            rows = table.height(),
            cols = table.width(),
            "loaded uploaded table"
        );

        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(CachedTable {
                fingerprint,
                table: table.clone(),
            });
        }

        Ok(table)
    }
}

/// Read a CSV file with a header row and inferred schema.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).map_err(|e| {
        CarelensError::DataError(format!("cannot open {}: {e}", path.display()))
    })?;

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| CarelensError::DataError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        write!(file, "{body}").unwrap();
        path
    }

    #[test]
    fn test_empty_folder_has_no_latest() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        assert!(store.latest_csv().unwrap().is_none());
        assert!(store.load_latest().unwrap().is_none());
    }

    #[test]
    fn test_missing_folder_has_no_latest() {
        let store = UploadStore::new("/nonexistent/carelens-test-uploads");
        assert!(store.latest_csv().unwrap().is_none());
    }

    #[test]
    fn test_latest_picks_most_recently_modified() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "old.csv", "a,b\n1,2\n");
        std::thread::sleep(std::time::Duration::from_millis(20));
        let newer = write_csv(dir.path(), "new.csv", "a,b\n3,4\n5,6\n");
        write_csv(dir.path(), "notes.txt", "not a table");

        let store = UploadStore::new(dir.path());
        assert_eq!(store.latest_csv().unwrap().unwrap(), newer);

        let df = store.load_latest().unwrap().unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_cache_serves_unchanged_file_and_tracks_new_upload() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "first.csv", "a\n1\n2\n");

        let store = UploadStore::new(dir.path());
        let first = store.load_latest().unwrap().unwrap();
        assert_eq!(first.height(), 2);

        // Unchanged file: memo hit returns the identical table.
        let again = store.load_latest().unwrap().unwrap();
        assert_eq!(again.height(), 2);

        // New upload must be picked up without manual invalidation.
        std::thread::sleep(std::time::Duration::from_millis(20));
        write_csv(dir.path(), "second.csv", "a\n1\n2\n3\n");
        let refreshed = store.load_latest().unwrap().unwrap();
        assert_eq!(refreshed.height(), 3);
    }
}
