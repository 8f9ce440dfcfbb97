use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::normalize::{composite_key, strip_extension};

const RECOMPUTE_COLUMNS: [&str; 3] = ["category", "filename", "raw_url"];
const VERBATIM_COLUMNS: [&str; 2] = ["composite_key", "raw_url"];

/// Composite key -> hosted image URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlMap {
    entries: HashMap<String, String>,
}

impl UrlMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Stores `url` under `key`, returning `true` when an entry was replaced.
    pub fn insert(&mut self, key: String, url: String) -> bool {
        self.entries.insert(key, url).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for UrlMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Diagnostics of one load; informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UrlMapStats {
    pub total: usize,
    pub loaded: usize,
    pub skipped: usize,
    pub duplicates: usize,
}

/// One row of the image-to-URL table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UrlRecord {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub raw_url: Option<String>,
    #[serde(default)]
    pub composite_key: Option<String>,
}

impl UrlRecord {
    pub fn new(category: &str, filename: &str, raw_url: &str) -> Self {
        Self {
            category: Some(category.to_string()),
            filename: Some(filename.to_string()),
            raw_url: Some(raw_url.to_string()),
            composite_key: None,
        }
    }
}

/// How the key of each record is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// Derive the key from `category` and `filename`.
    Recompute,
    /// Use the precomputed `composite_key` column as is.
    Verbatim,
}

/// Result of loading the image-to-URL table.
#[derive(Debug, Clone, Default)]
pub struct LoadedUrlMap {
    pub map: UrlMap,
    pub stats: UrlMapStats,
}

/// Builds the lookup table by recomputing every key.
pub fn build<I>(records: I) -> (UrlMap, UrlMapStats)
where
    I: IntoIterator<Item = UrlRecord>,
{
    build_with_mode(records, KeyMode::Recompute)
}

pub fn build_with_mode<I>(records: I, mode: KeyMode) -> (UrlMap, UrlMapStats)
where
    I: IntoIterator<Item = UrlRecord>,
{
    let mut map = UrlMap::default();
    let mut stats = UrlMapStats::default();

    for record in records {
        stats.total += 1;
        let Some((key, url)) = record_key(&record, mode) else {
            stats.skipped += 1;
            continue;
        };

        if map.insert(key, url) {
            stats.duplicates += 1;
        }
        stats.loaded += 1;
    }

    (map, stats)
}

fn record_key(record: &UrlRecord, mode: KeyMode) -> Option<(String, String)> {
    let url = present(&record.raw_url)?;
    let key = match mode {
        KeyMode::Recompute => {
            let category = present(&record.category)?;
            let filename = present(&record.filename)?;
            composite_key(category, strip_extension(filename))
        }
        KeyMode::Verbatim => present(&record.composite_key)?.to_string(),
    };
    Some((key, url.to_string()))
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Loads the image-to-URL CSV at `path`.
///
/// The header must provide `category, filename, raw_url`, or
/// `composite_key, raw_url` when keys were computed upstream. Rows that
/// cannot be read are counted as skipped.
pub fn load_csv(path: &Path) -> Result<LoadedUrlMap> {
    if !path.is_file() {
        bail!("image URL table not found: {}", path.display());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open image URL table: {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .clone();
    let mode = key_mode_for_headers(&headers).with_context(|| {
        format!(
            "image URL table {} must contain columns {:?} or {:?}",
            path.display(),
            RECOMPUTE_COLUMNS,
            VERBATIM_COLUMNS
        )
    })?;

    let mut unreadable = 0_usize;
    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<UrlRecord>().enumerate() {
        match row {
            Ok(record) => records.push(record),
            Err(err) => {
                unreadable += 1;
                warn!(line = index + 2, error = %err, "skipping unreadable image URL row");
            }
        }
    }

    let (map, mut stats) = build_with_mode(records, mode);
    stats.total += unreadable;
    stats.skipped += unreadable;

    info!(
        path = %path.display(),
        loaded = stats.loaded,
        skipped = stats.skipped,
        duplicates = stats.duplicates,
        "loaded image URL table"
    );
    if map.is_empty() && stats.total > 0 {
        warn!(path = %path.display(), "image URL table produced no usable entries");
    }

    Ok(LoadedUrlMap { map, stats })
}

fn key_mode_for_headers(headers: &csv::StringRecord) -> Option<KeyMode> {
    let has = |name: &str| headers.iter().any(|header| header.trim() == name);
    if RECOMPUTE_COLUMNS.iter().all(|name| has(name)) {
        Some(KeyMode::Recompute)
    } else if VERBATIM_COLUMNS.iter().all(|name| has(name)) {
        Some(KeyMode::Verbatim)
    } else {
        None
    }
}

/// Caller-owned cache of loaded URL tables, keyed by source path.
///
/// A path is loaded at most once until it is invalidated.
#[derive(Debug, Default)]
pub struct UrlMapCache {
    entries: HashMap<PathBuf, LoadedUrlMap>,
}

impl UrlMapCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&mut self, path: &Path) -> Result<&LoadedUrlMap> {
        self.get_or_load_with(path, load_csv)
    }

    pub fn get_or_load_with<F>(&mut self, path: &Path, loader: F) -> Result<&LoadedUrlMap>
    where
        F: FnOnce(&Path) -> Result<LoadedUrlMap>,
    {
        match self.entries.entry(path.to_path_buf()) {
            Entry::Occupied(entry) => {
                debug!(path = %path.display(), "image URL table served from cache");
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let loaded = loader(path)?;
                Ok(entry.insert(loaded))
            }
        }
    }

    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
