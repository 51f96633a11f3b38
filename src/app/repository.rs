use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::data::{FieldMap, Record};
use crate::error::{LibraryError, Result};

/// Reads and writes whole libraries as a pretty-printed JSON array.
#[derive(Clone, Debug, Default)]
pub struct JsonRepository {
    default_path: Option<PathBuf>,
}

impl JsonRepository {
    pub fn new(default_path: Option<PathBuf>) -> Self {
        Self {
            default_path: default_path.filter(|p| !p.as_os_str().is_empty()),
        }
    }

    pub fn default_path(&self) -> Option<&Path> {
        self.default_path.as_deref()
    }

    pub fn set_default_path(&mut self, path: Option<PathBuf>) {
        self.default_path = path.filter(|p| !p.as_os_str().is_empty());
    }

    /// Write `records` to `path` (or the default path). The file is written
    /// beside the target as `.tmp` and renamed over it once complete.
    pub fn save(&self, records: &[Record], path: Option<&Path>) -> Result<PathBuf> {
        let target = self.resolve(path, "save")?;
        let payload = serde_json::to_string_pretty(records)
            .map_err(|e| LibraryError::parse(&target, e))?;

        let tmp = tmp_path(&target);
        fs::write(&tmp, payload.as_bytes()).map_err(|e| LibraryError::io(&tmp, e))?;
        fs::rename(&tmp, &target).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            LibraryError::io(&target, e)
        })?;

        info!("Saved {} records to {}", records.len(), target.display());
        Ok(target)
    }

    pub fn load(&self, path: Option<&Path>) -> Result<Vec<Record>> {
        let source = self.resolve(path, "load")?;
        let raw = fs::read_to_string(&source).map_err(|e| LibraryError::io(&source, e))?;
        let entries: Vec<FieldMap> =
            serde_json::from_str(&raw).map_err(|e| LibraryError::parse(&source, e))?;

        let records: Vec<Record> = entries.iter().map(Record::from_mapping).collect();
        info!("Loaded {} records from {}", records.len(), source.display());
        Ok(records)
    }

    fn resolve(&self, path: Option<&Path>, op: &str) -> Result<PathBuf> {
        match path.filter(|p| !p.as_os_str().is_empty()) {
            Some(p) => Ok(p.to_path_buf()),
            None => {
                let fallback = self.default_path.clone().ok_or_else(|| {
                    LibraryError::InvalidArgument(format!("no path specified to {op} library"))
                })?;
                debug!("{op}: using default library path {}", fallback.display());
                Ok(fallback)
            }
        }
    }
}

fn tmp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
