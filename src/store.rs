//! Persistence for analysis results.
//!
//! The analysis core never touches storage; callers hand a finished
//! [`AnalysisResult`] to a [`RecordStore`], which assigns the id and the
//! creation time.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::pipeline::{normalize_owner, AnalysisResult};

/// Number of records returned by [`RecordStore::recent`] by default.
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub interpretation: String,
    pub analysis: AnalysisResult,
}

impl StoredRecord {
    pub fn owner(&self) -> Option<&str> {
        self.analysis.metadata.owner.as_deref()
    }
}

pub trait RecordStore {
    /// Persists a result and returns it with a fresh id and timestamp.
    fn create(&self, analysis: AnalysisResult, interpretation: String) -> Result<StoredRecord>;

    /// Records of `owner` (guest records for `None`), newest first.
    fn list(&self, owner: Option<&str>) -> Result<Vec<StoredRecord>>;

    fn get(&self, id: &str) -> Result<StoredRecord>;

    /// Deletes a record. A signed-in requester may only delete their own
    /// records; guests and ownerless records are not checked.
    fn delete(&self, id: &str, requester: Option<&str>) -> Result<()>;

    fn recent(&self, owner: Option<&str>, limit: usize) -> Result<Vec<StoredRecord>> {
        let mut records = self.list(owner)?;
        records.truncate(limit);
        Ok(records)
    }
}

/// Stores each record as `<id>.json` inside one directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("Record store at {dir:?}");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        // Ids are UUIDs; anything else could escape the store directory.
        let id = Uuid::parse_str(id).map_err(|_| Error::NotFound(id.to_string()))?;
        Ok(self.dir.join(format!("{id}.json")))
    }

    fn load_all(&self) -> Result<Vec<StoredRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match serde_json::from_slice::<StoredRecord>(&fs::read(&path)?) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable record {path:?}: {e}"),
            }
        }
        Ok(records)
    }
}

impl RecordStore for JsonFileStore {
    fn create(&self, analysis: AnalysisResult, interpretation: String) -> Result<StoredRecord> {
        let record = StoredRecord {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            interpretation,
            analysis,
        };
        let path = self.path_for(&record.id)?;
        fs::write(&path, serde_json::to_vec_pretty(&record)?)?;
        info!("Saved record {} for '{}'", record.id, record.analysis.filename());
        Ok(record)
    }

    fn list(&self, owner: Option<&str>) -> Result<Vec<StoredRecord>> {
        let owner = normalize_owner(owner);
        let mut records: Vec<_> = self
            .load_all()?
            .into_iter()
            .filter(|r| r.owner() == owner.as_deref())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn get(&self, id: &str) -> Result<StoredRecord> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }

    fn delete(&self, id: &str, requester: Option<&str>) -> Result<()> {
        let record = self.get(id)?;
        if let (Some(requester), Some(owner)) = (normalize_owner(requester), record.owner()) {
            if requester != owner {
                warn!("Refused delete of {id} requested by {requester}");
                return Err(Error::Forbidden(id.to_string()));
            }
        }
        fs::remove_file(self.path_for(id)?)?;
        info!("Deleted record {id}");
        Ok(())
    }
}
