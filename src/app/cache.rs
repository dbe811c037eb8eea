//! Keyed model cache for long-lived front-ends (the dashboard).
//!
//! Entries are keyed by the case-folded product key and remember the artifact's
//! modification time. A lookup reloads when the file on disk is newer (or
//! older, after a restore) than the cached copy.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::debug;

use crate::domain::ForecastModel;
use crate::error::AppError;
use crate::io::{ModelStore, product_key};

#[derive(Debug, Clone)]
struct CacheEntry {
    modified: SystemTime,
    model: Arc<ForecastModel>,
}

#[derive(Debug, Clone)]
pub struct ModelCache {
    store: ModelStore,
    entries: HashMap<String, CacheEntry>,
}

impl ModelCache {
    pub fn new(store: ModelStore) -> Self {
        Self {
            store,
            entries: HashMap::new(),
        }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached model for `product`, reloading if the artifact changed on disk.
    ///
    /// A missing artifact drops any stale entry and returns `NotFound`.
    pub fn get(&mut self, product: &str) -> Result<Arc<ForecastModel>, AppError> {
        let key = product_key(product)?;
        let modified = match self.store.modified(product) {
            Ok(m) => m,
            Err(err) => {
                self.entries.remove(&key);
                return Err(err);
            }
        };

        if let Some(entry) = self.entries.get(&key) {
            if entry.modified == modified {
                return Ok(Arc::clone(&entry.model));
            }
            debug!(product, "model artifact changed on disk; reloading");
        }

        let model = Arc::new(self.store.load(product)?);
        self.entries.insert(
            key,
            CacheEntry {
                modified,
                model: Arc::clone(&model),
            },
        );
        Ok(model)
    }

    /// Drop the entry for `product` (e.g. after retraining in-process).
    pub fn invalidate(&mut self, product: &str) {
        if let Ok(key) = product_key(product) {
            self.entries.remove(&key);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
