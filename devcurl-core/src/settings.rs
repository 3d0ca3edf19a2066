// Persisted header filter list

use crate::data::{KeyValueStore, get_json, set_json};
use crate::error::Result;
use crate::headers::{HeaderFilterList, Preset};
use std::sync::Arc;
use tracing::debug;

pub const FILTERED_HEADERS_KEY: &str = "devcurl_filtered_headers";

/// Reads and updates the user's header filter list in a store.
///
/// Every update is a read-modify-write of the whole list.
pub struct HeaderSettings {
    store: Arc<dyn KeyValueStore>,
}

impl HeaderSettings {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The stored list, or the default browser list when nothing is stored yet
    pub fn load(&self) -> Result<HeaderFilterList> {
        let stored: Option<Vec<String>> = get_json(self.store.as_ref(), FILTERED_HEADERS_KEY)?;
        Ok(stored.map(HeaderFilterList::new).unwrap_or_default())
    }

    pub fn save(&self, list: &HeaderFilterList) -> Result<()> {
        set_json(self.store.as_ref(), FILTERED_HEADERS_KEY, list)
    }

    /// Add a header name. Blank or already-listed names are a no-op returning false.
    pub fn add(&self, name: &str) -> Result<bool> {
        let mut list = self.load()?;
        if !list.add(name) {
            debug!("Header '{}' not added (blank or already filtered)", name);
            return Ok(false);
        }
        self.save(&list)?;
        Ok(true)
    }

    pub fn remove(&self, name: &str) -> Result<bool> {
        let mut list = self.load()?;
        if !list.remove(name) {
            return Ok(false);
        }
        self.save(&list)?;
        Ok(true)
    }

    pub fn apply_preset(&self, preset: Preset) -> Result<HeaderFilterList> {
        let list = HeaderFilterList::from_preset(preset);
        self.save(&list)?;
        Ok(list)
    }

    pub fn reset(&self) -> Result<HeaderFilterList> {
        self.apply_preset(Preset::Default)
    }
}
