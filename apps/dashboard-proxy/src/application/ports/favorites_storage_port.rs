//! Favorites Storage Port (Driven Port)
//!
//! Durable key-value storage for the user's favorites. Writes are
//! synchronous and small; every toggle saves the whole set.

use parking_lot::Mutex;

use crate::domain::favorites::FavoritesSet;

/// Storage error.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing store failed.
    #[error("Favorites storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded.
    #[error("Favorites serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Port for favorites persistence.
pub trait FavoritesStoragePort: Send + Sync {
    /// Load the stored favorites. `Ok(None)` when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self) -> Result<Option<FavoritesSet>, StorageError>;

    /// Replace the stored favorites.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&self, favorites: &FavoritesSet) -> Result<(), StorageError>;

    /// Delete the stored favorites.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self) -> Result<(), StorageError>;
}

/// In-memory implementation for testing. Records every write.
#[derive(Debug, Default)]
pub struct InMemoryFavoritesStorage {
    stored: Mutex<Option<FavoritesSet>>,
    writes: Mutex<Vec<Option<FavoritesSet>>>,
}

impl InMemoryFavoritesStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `favorites`.
    #[must_use]
    pub fn with_favorites(favorites: FavoritesSet) -> Self {
        Self {
            stored: Mutex::new(Some(favorites)),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Number of `save` and `remove` calls so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }

    /// Value written by each `save` (`Some`) or `remove` (`None`), oldest
    /// first.
    #[must_use]
    pub fn writes(&self) -> Vec<Option<FavoritesSet>> {
        self.writes.lock().clone()
    }

    /// Current stored value.
    #[must_use]
    pub fn stored(&self) -> Option<FavoritesSet> {
        self.stored.lock().clone()
    }
}

impl FavoritesStoragePort for InMemoryFavoritesStorage {
    fn load(&self) -> Result<Option<FavoritesSet>, StorageError> {
        Ok(self.stored.lock().clone())
    }

    fn save(&self, favorites: &FavoritesSet) -> Result<(), StorageError> {
        *self.stored.lock() = Some(favorites.clone());
        self.writes.lock().push(Some(favorites.clone()));
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        *self.stored.lock() = None;
        self.writes.lock().push(None);
        Ok(())
    }
}
