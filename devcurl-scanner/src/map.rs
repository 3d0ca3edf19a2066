// Persisted page map

use crate::error::Result;
use crate::result::{PageMap, PageRecord};
use chrono::{NaiveDate, Utc};
use devcurl_core::data::{KeyValueStore, get_json, set_json};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub const SCREEN_MAP_KEY: &str = "devcurl_screen_map";

/// Reads and writes the page map in a key-value store.
///
/// Updates load the whole map, change it and write it back; the last writer wins.
pub struct PageMapStore {
    store: Arc<dyn KeyValueStore>,
}

impl PageMapStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The stored map, or an empty one on first use
    pub fn load(&self) -> Result<PageMap> {
        let map: Option<PageMap> = get_json(self.store.as_ref(), SCREEN_MAP_KEY)?;
        Ok(map.unwrap_or_default())
    }

    pub fn save(&self, map: &PageMap) -> Result<()> {
        set_json(self.store.as_ref(), SCREEN_MAP_KEY, map)?;
        Ok(())
    }

    /// Store a page record, replacing any earlier record for the same URL
    pub fn upsert(&self, record: PageRecord) -> Result<PageMap> {
        let mut map = self.load()?;
        let url = record.url.clone();
        map.upsert(record);
        self.save(&map)?;
        debug!("Stored scan of {} ({} pages)", url, map.pages.len());
        Ok(map)
    }

    pub fn clear(&self) -> Result<()> {
        self.save(&PageMap::default())?;
        info!("Cleared page map");
        Ok(())
    }

    /// The whole map as pretty-printed JSON
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.load()?)?)
    }

    /// Write the export into `dir` under a dated file name and return its path
    pub fn export_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let json = self.export_json()?;
        let path = dir.join(export_file_name(Utc::now().date_naive()));
        fs::write(&path, json)?;
        info!("Exported page map to {}", path.display());
        Ok(path)
    }
}

/// `devcurl-screen-map-YYYY-MM-DD.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("devcurl-screen-map-{}.json", date.format("%Y-%m-%d"))
}
