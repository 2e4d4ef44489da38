//! Favorites Persistence
//!
//! Stores favorites in a JSON document on disk under the `favorites` key:
//!
//! ```json
//! {"favorites": {"cities": ["Paris"], "cryptocurrencies": ["bitcoin"]}}
//! ```
//!
//! Other top-level keys in the document are preserved. Writes go to a
//! sibling temporary file that is then renamed over the document.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::application::ports::{FavoritesStoragePort, StorageError};
use crate::domain::favorites::FavoritesSet;

/// Document key holding the favorites record.
const FAVORITES_KEY: &str = "favorites";

/// JSON-file favorites storage.
#[derive(Debug)]
pub struct JsonFileFavoritesStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileFavoritesStorage {
    /// Create storage backed by the document at `path`. The file is
    /// created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document. Missing files read as empty; unparseable ones
    /// are logged and read as empty.
    fn read_document(&self) -> Result<Map<String, Value>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) | Err(_) => {
                warn!(path = %self.path.display(), "Favorites document is corrupt, ignoring it");
                Ok(Map::new())
            }
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<(), StorageError> {
        let encoded = serde_json::to_vec_pretty(document)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl FavoritesStoragePort for JsonFileFavoritesStorage {
    fn load(&self) -> Result<Option<FavoritesSet>, StorageError> {
        let mut document = self.read_document()?;
        let Some(record) = document.remove(FAVORITES_KEY) else {
            return Ok(None);
        };
        match serde_json::from_value(record) {
            Ok(favorites) => Ok(Some(favorites)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Stored favorites are corrupt, ignoring them");
                Ok(None)
            }
        }
    }

    fn save(&self, favorites: &FavoritesSet) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut document = self.read_document()?;
        document.insert(FAVORITES_KEY.to_string(), serde_json::to_value(favorites)?);
        self.write_document(&document)?;
        debug!(
            cities = favorites.cities.len(),
            cryptocurrencies = favorites.cryptocurrencies.len(),
            "Saved favorites"
        );
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut document = self.read_document()?;
        if document.remove(FAVORITES_KEY).is_none() {
            return Ok(());
        }
        self.write_document(&document)?;
        debug!("Removed stored favorites");
        Ok(())
    }
}
