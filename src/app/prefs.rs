// src/app/prefs.rs
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{LibraryError, Result};

pub const LAST_PATH_KEY: &str = "file/last_path";

/// Small persisted key-value store (`key=value` lines, `#` comments).
/// Keys this build does not know about are kept and written back.
///
/// Values are one line each: surrounding whitespace is trimmed on load and
/// line breaks become spaces on set, so a path that starts or ends with a
/// space, or contains a newline, does not come back unchanged.
#[derive(Clone, Debug, Default)]
pub struct Settings {
    path: PathBuf,
    values: BTreeMap<String, String>,
    dirty: bool,
}

impl Settings {
    /// Read settings from `path`. A missing or unreadable file gives an
    /// empty store bound to the same path.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut values = BTreeMap::new();

        match fs::read_to_string(&path) {
            Ok(txt) => {
                for line in txt.lines() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    let Some((k, v)) = line.split_once('=') else {
                        continue;
                    };
                    values.insert(k.trim().to_string(), v.trim().to_string());
                }
                debug!("read {} settings from {}", values.len(), path.display());
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!("could not read settings {}: {err}", path.display()),
        }

        Self {
            path,
            values,
            dirty: false,
        }
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set_value(&mut self, key: &str, value: impl Into<String>) {
        // one line per entry
        let value: String = value.into().replace(['\r', '\n'], " ");
        if self.values.get(key) != Some(&value) {
            self.values.insert(key.to_string(), value);
            self.dirty = true;
        }
    }

    pub fn last_path(&self) -> Option<PathBuf> {
        self.value(LAST_PATH_KEY)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    pub fn set_last_path(&mut self, path: &Path) {
        self.set_value(LAST_PATH_KEY, path.to_string_lossy());
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn save(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LibraryError::io(parent, e))?;
        }

        let mut txt = String::from("# medialib settings\n");
        for (k, v) in &self.values {
            txt.push_str(k);
            txt.push('=');
            txt.push_str(v);
            txt.push('\n');
        }
        fs::write(&self.path, txt).map_err(|e| LibraryError::io(&self.path, e))?;
        self.dirty = false;
        Ok(())
    }

    /// Save only if something changed; failures are logged, not returned.
    pub fn save_if_dirty(&mut self) {
        if !self.dirty {
            return;
        }
        if let Err(err) = self.save() {
            warn!("failed to save settings: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let s = Settings::load(dir.path().join("none.txt"));
        assert_eq!(s.last_path(), None);
        assert!(!s.is_dirty());
    }

    #[test]
    fn last_path_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("nested").join("settings.txt");

        let mut s = Settings::load(&file);
        s.set_last_path(Path::new("/home/me/films.json"));
        s.set_value("window/geometry", "1024x768+10+20");
        assert!(s.is_dirty());
        s.save().unwrap();
        assert!(!s.is_dirty());

        let again = Settings::load(&file);
        assert_eq!(again.last_path(), Some(PathBuf::from("/home/me/films.json")));
        assert_eq!(again.value("window/geometry"), Some("1024x768+10+20"));
    }

    #[test]
    fn comments_blank_and_broken_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("settings.txt");
        fs::write(&file, "# hi\n\nno equals sign\n file/last_path = lib.json \nextra=a=b\n").unwrap();

        let s = Settings::load(&file);
        assert_eq!(s.last_path(), Some(PathBuf::from("lib.json")));
        assert_eq!(s.value("extra"), Some("a=b"));
        assert_eq!(s.value("no equals sign"), None);
    }

    #[test]
    fn unchanged_value_does_not_dirty() {
        let dir = tempdir().unwrap();
        let mut s = Settings::load(dir.path().join("s.txt"));
        s.set_value("k", "v");
        s.save_if_dirty();
        s.set_value("k", "v");
        assert!(!s.is_dirty());
    }

    #[test]
    fn values_are_stored_as_single_trimmed_lines() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("s.txt");
        let mut s = Settings::load(&file);
        s.set_value("file/last_path", " /odd/ path.json ");
        s.set_value("note", "two\nlines");
        s.save().unwrap();

        let again = Settings::load(&file);
        assert_eq!(again.last_path(), Some(PathBuf::from("/odd/ path.json")));
        assert_eq!(again.value("note"), Some("two lines"));
    }
}
