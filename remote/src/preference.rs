//! User preferences read by the remote control.

use crate::error::RemoteError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Show cover art on the lock screen and other remote surfaces.
pub const COVER_ON_LOCKSCREEN: &str = "cover_on_lockscreen";
/// Default for [`COVER_ON_LOCKSCREEN`].
pub const COVER_ON_LOCKSCREEN_DEFAULT: bool = true;
/// React to headset and media buttons at all.
pub const MEDIA_BUTTON: &str = "media_button";
/// Default for [`MEDIA_BUTTON`].
pub const MEDIA_BUTTON_DEFAULT: bool = true;

/// Read access to boolean user preferences.
pub trait PreferenceStore: Send + Sync {
    /// Read `key`, or `default` if it is unset.
    fn get_bool(&self, key: &str, default: bool) -> bool;
}

impl PreferenceStore for HashMap<String, bool> {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).copied().unwrap_or(default)
    }
}

/// Cached show-cover setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CoverPreference {
    /// Not read yet, or invalidated.
    #[default]
    Unknown,
    /// Show cover art.
    Show,
    /// Hide cover art.
    Hide,
}

impl CoverPreference {
    /// Return the cached value, reading it from `store` if unknown.
    pub fn resolve(&mut self, store: &dyn PreferenceStore) -> bool {
        if *self == Self::Unknown {
            *self = if store.get_bool(COVER_ON_LOCKSCREEN, COVER_ON_LOCKSCREEN_DEFAULT) {
                Self::Show
            } else {
                Self::Hide
            };
            log::debug!("resolved cover preference: {self:?}");
        }
        *self == Self::Show
    }
}

/// Preferences stored as a flat JSON object on disk.
///
/// ```json
/// { "cover_on_lockscreen": false, "media_button": true }
/// ```
#[derive(Debug)]
pub struct JsonPreferences {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl JsonPreferences {
    /// Load preferences from `path`. A missing file yields defaults.
    ///
    /// # Errors
    /// Returns [`RemoteError::Preferences`] if the file exists but cannot be
    /// read or is not a JSON object.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RemoteError> {
        let path = path.as_ref().to_path_buf();
        let values = read_object(&path)?;
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Re-read the file.
    ///
    /// # Errors
    /// Returns [`RemoteError::Preferences`] on read or parse failure; the
    /// previous values are kept in that case.
    pub fn reload(&self) -> Result<(), RemoteError> {
        let values = read_object(&self.path)?;
        let mut guard = self
            .values
            .write()
            .map_err(|e| RemoteError::Preferences(format!("lock poisoned: {e}")))?;
        *guard = values;
        Ok(())
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonPreferences {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values
            .read()
            .ok()
            .and_then(|values| values.get(key).and_then(Value::as_bool))
            .unwrap_or(default)
    }
}

fn read_object(path: &Path) -> Result<Map<String, Value>, RemoteError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("no preference file at {}, using defaults", path.display());
            return Ok(Map::new());
        }
        Err(e) => {
            return Err(RemoteError::Preferences(format!(
                "{}: {e}",
                path.display()
            )));
        }
    };

    match serde_json::from_str(&text) {
        Ok(Value::Object(values)) => Ok(values),
        Ok(_) => Err(RemoteError::Preferences(format!(
            "{}: expected a JSON object",
            path.display()
        ))),
        Err(e) => Err(RemoteError::Preferences(format!("{}: {e}", path.display()))),
    }
}
