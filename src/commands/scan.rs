use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use pharmaview::normalize::{composite_key, strip_extension};
use tracing::{info, warn};
use unicode_normalization::UnicodeNormalization;
use walkdir::WalkDir;

use crate::cli::ScanArgs;
use crate::model::{ImageEntry, ScanManifest, ScannedImage};
use crate::util::{ensure_directory, now_utc_string, sha256_file, write_json_pretty};

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];
const UNKNOWN_CATEGORY: &str = "unknown";
const DEFAULT_URL_TABLE: &str = "image_urls.csv";

#[derive(Debug)]
pub struct ScanOutcome {
    pub entries: Vec<ImageEntry>,
    pub manifest: ScanManifest,
}

pub fn run(args: ScanArgs) -> Result<()> {
    let image_root = fs::canonicalize(&args.image_root)
        .with_context(|| format!("image root not found: {}", args.image_root.display()))?;
    let project_root = match &args.project_root {
        Some(root) => fs::canonicalize(root)
            .with_context(|| format!("project root not found: {}", root.display()))?,
        None => image_root
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| image_root.clone()),
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| project_root.join(DEFAULT_URL_TABLE));
    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| project_root.join("manifests").join("image_scan.json"));

    let outcome = scan_images(&image_root, &project_root, &args.base_url, &output)?;

    if args.dry_run {
        info!(
            image_count = outcome.manifest.image_count,
            categories = outcome.manifest.category_counts.len(),
            source = %outcome.manifest.image_root,
            "scan dry-run complete"
        );
        return Ok(());
    }

    write_url_table(&output, &outcome.entries)?;
    info!(path = %output.display(), rows = outcome.entries.len(), "wrote image URL table");

    write_json_pretty(&manifest_path, &outcome.manifest)?;
    info!(path = %manifest_path.display(), "wrote scan manifest");

    Ok(())
}

/// Walks `image_root` and derives one table row per image.
///
/// The category of an image is the first directory below `image_root`;
/// `relative_path` and `raw_url` are taken relative to `project_root`.
pub fn scan_images(
    image_root: &Path,
    project_root: &Path,
    base_url: &str,
    url_table_path: &Path,
) -> Result<ScanOutcome> {
    if !image_root.is_dir() {
        bail!("image directory not found: {}", image_root.display());
    }

    let mut image_paths = discover_images(image_root);
    image_paths.sort();

    if image_paths.is_empty() {
        bail!("no images found in {}", image_root.display());
    }

    let prefix = url_prefix(base_url);
    let mut entries = Vec::with_capacity(image_paths.len());
    let mut images = Vec::with_capacity(image_paths.len());
    let mut category_counts = BTreeMap::<String, usize>::new();

    for path in image_paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let Some(relative_path) = posix_relative_path(&path, project_root) else {
            warn!(
                path = %path.display(),
                project_root = %project_root.display(),
                "image is outside the project root, skipping"
            );
            continue;
        };

        let category = image_category(&path, image_root)?;
        let sha256 = sha256_file(&path)?;

        *category_counts.entry(category.clone()).or_default() += 1;
        images.push(ScannedImage {
            relative_path: relative_path.clone(),
            sha256,
        });
        entries.push(ImageEntry {
            composite_key: composite_key(&category, strip_extension(&filename)),
            raw_url: format!("{prefix}{relative_path}"),
            category,
            filename,
            relative_path,
        });
    }

    entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    images.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    info!(image_count = entries.len(), "scanned image tree");

    let manifest = ScanManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        image_root: image_root.display().to_string(),
        base_url: prefix,
        url_table_path: url_table_path.display().to_string(),
        image_count: entries.len(),
        category_counts,
        images,
    };

    Ok(ScanOutcome { entries, manifest })
}

pub fn write_url_table(path: &Path, entries: &[ImageEntry]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_directory(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for entry in entries {
        writer
            .serialize(entry)
            .with_context(|| format!("failed to write row for {}", entry.relative_path))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    Ok(())
}

fn discover_images(image_root: &Path) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for entry in WalkDir::new(image_root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "failed to read entry in image tree");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with('.'))
            .unwrap_or(true);
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false);

        if is_image && !hidden {
            images.push(path.to_path_buf());
        }
    }

    images
}

fn image_category(path: &Path, image_root: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(image_root)
        .with_context(|| format!("{} is not below {}", path.display(), image_root.display()))?;

    let mut components = relative.components();
    let first = components.next();
    if components.next().is_none() {
        return Ok(UNKNOWN_CATEGORY.to_string());
    }

    match first {
        Some(Component::Normal(name)) => name
            .to_str()
            .map(|name| name.nfc().collect())
            .with_context(|| format!("invalid UTF-8 category directory: {}", path.display())),
        _ => Ok(UNKNOWN_CATEGORY.to_string()),
    }
}

fn posix_relative_path(path: &Path, project_root: &Path) -> Option<String> {
    let relative = path.strip_prefix(project_root).ok()?;
    let parts = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/").nfc().collect())
}

fn url_prefix(base_url: &str) -> String {
    if base_url.is_empty() || base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    }
}
