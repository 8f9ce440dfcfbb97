use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One row of the image-to-URL table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub composite_key: String,
    pub category: String,
    pub filename: String,
    pub relative_path: String,
    pub raw_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedImage {
    pub relative_path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub image_root: String,
    pub base_url: String,
    pub url_table_path: String,
    pub image_count: usize,
    pub category_counts: BTreeMap<String, usize>,
    pub images: Vec<ScannedImage>,
}
