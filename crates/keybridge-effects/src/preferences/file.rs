//! File-backed preference handler
//!
//! Preferences live in one JSON object file. Writes go to a sibling
//! temporary file which is then renamed over the original, so readers never
//! observe a half-written store. The temporary file is synced before the
//! rename. On unix the file is owner read/write only. A store that no longer
//! parses is replaced on the next write.

use keybridge_core::effects::PreferenceEffects;
use keybridge_core::{BridgeError, Result};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Owner read/write only
#[cfg(unix)]
const FILE_PERMISSIONS: u32 = 0o600;

/// Preference store persisted as a JSON file
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePreferenceStore {
    /// Store backed by `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(BridgeError::io(format!(
                    "failed to read preferences {}: {e}",
                    self.path.display()
                )))
            }
        };

        match serde_json::from_str(&contents)? {
            Value::Object(map) => Ok(map),
            _ => Err(BridgeError::serialization(format!(
                "preferences {} is not a JSON object",
                self.path.display()
            ))),
        }
    }

    fn save(&self, values: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BridgeError::io(format!("failed to create preferences directory: {e}"))
            })?;
        }

        let contents = serde_json::to_vec_pretty(values)?;
        let temp_path = temp_path_for(&self.path);
        let mut file = fs::File::create(&temp_path)
            .map_err(|e| BridgeError::io(format!("failed to create preferences file: {e}")))?;
        file.write_all(&contents)
            .map_err(|e| BridgeError::io(format!("failed to write preferences: {e}")))?;
        file.sync_all()
            .map_err(|e| BridgeError::io(format!("failed to sync preferences: {e}")))?;
        drop(file);
        restrict_permissions(&temp_path)?;
        fs::rename(&temp_path, &self.path)
            .map_err(|e| BridgeError::io(format!("failed to replace preferences: {e}")))?;

        debug!(path = %self.path.display(), "preferences saved");
        Ok(())
    }
}

/// Sibling of `path` with `.tmp` appended to the full file name
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("preferences"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(FILE_PERMISSIONS))
        .map_err(|e| BridgeError::io(format!("failed to set preference permissions: {e}")))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

impl PreferenceEffects for FilePreferenceStore {
    fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.load()?.get(key) {
            None => Ok(default),
            Some(Value::Bool(value)) => Ok(*value),
            Some(other) => Err(BridgeError::serialization(format!(
                "preference {key} is not a boolean: {other}"
            ))),
        }
    }

    fn put_bool(&self, key: &str, value: bool) -> Result<()> {
        let _writer = self.write_lock.lock();
        let mut values = match self.load() {
            Ok(values) => values,
            Err(err @ BridgeError::Serialization { .. }) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "preferences unreadable, replacing store"
                );
                Map::new()
            }
            Err(err) => return Err(err),
        };
        values.insert(key.to_string(), Value::Bool(value));
        self.save(&values)
    }
}
