use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::table::rowspan::DEFAULT_MERGEABLE_COLUMNS;
use crate::table::{LinkStrategy, PopupOptions, RenderOptions};

pub const DEFAULT_CONFIG_FILE: &str = "pharmaview.json";

const DEFAULT_CATEGORIES: [&str; 11] = [
    "Antibiotiques",
    "Comprimés",
    "Comprimes antalgiques",
    "Cremes - Pommades",
    "Gouttes",
    "Injections",
    "Ovules vaginaux",
    "Pulvérisations",
    "Sachets",
    "Sirop",
    "Suppositoires",
];

/// Categories whose sheets already hold image URLs.
const DEFAULT_RAW_URL_CATEGORIES: [&str; 4] =
    ["Antibiotiques", "Sachets", "Sirop", "Suppositoires"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workbook: Option<PathBuf>,
    #[serde(default)]
    pub link_strategy: LinkStrategy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub excel_root: PathBuf,
    pub url_table: PathBuf,
    pub mergeable_columns: Vec<usize>,
    pub name_column: usize,
    pub popup: PopupOptions,
    pub categories: Vec<CategoryConfig>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let categories = DEFAULT_CATEGORIES
            .iter()
            .map(|name| CategoryConfig {
                name: (*name).to_string(),
                workbook: None,
                link_strategy: if DEFAULT_RAW_URL_CATEGORIES.contains(name) {
                    LinkStrategy::RawUrlOnly
                } else {
                    LinkStrategy::LookupBacked
                },
            })
            .collect();

        Self {
            excel_root: PathBuf::from("excel_data"),
            url_table: PathBuf::from("image_urls.csv"),
            mergeable_columns: DEFAULT_MERGEABLE_COLUMNS.to_vec(),
            name_column: 0,
            popup: PopupOptions::default(),
            categories,
        }
    }
}

impl ViewerConfig {
    /// Loads `path`, or the defaults rooted at the working directory when no
    /// path is given and no default file exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !path.exists() {
            if required {
                bail!("config file not found: {}", path.display());
            }
            info!("no config file found, using built-in categories");
            return Ok(Self::default());
        }

        let raw =
            fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let config: ViewerConfig = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        info!(path = %path.display(), categories = config.categories.len(), "loaded config");
        Ok(config.rooted_at(base))
    }

    fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            bail!("config defines no categories");
        }
        for (index, category) in self.categories.iter().enumerate() {
            if category.name.trim().is_empty() {
                bail!("category #{index} has an empty name");
            }
            if self.categories[..index]
                .iter()
                .any(|other| other.name == category.name)
            {
                bail!("category '{}' is defined twice", category.name);
            }
        }
        Ok(())
    }

    /// Resolves relative paths against `base`.
    pub fn rooted_at(mut self, base: &Path) -> Self {
        self.excel_root = resolve(base, &self.excel_root);
        self.url_table = resolve(base, &self.url_table);
        for category in &mut self.categories {
            if let Some(workbook) = category.workbook.take() {
                category.workbook = Some(resolve(base, &workbook));
            }
        }
        self
    }

    /// Looks up a category by its exact configured name.
    pub fn category(&self, name: &str) -> Result<&CategoryConfig> {
        self.categories
            .iter()
            .find(|category| category.name == name)
            .with_context(|| {
                format!(
                    "unknown category '{name}', expected one of: {}",
                    self.category_names().join(", ")
                )
            })
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories
            .iter()
            .map(|category| category.name.as_str())
            .collect()
    }

    /// `<excel_root>/<name>/<name>.xlsx` unless overridden.
    pub fn workbook_path(&self, category: &CategoryConfig) -> PathBuf {
        category.workbook.clone().unwrap_or_else(|| {
            self.excel_root
                .join(&category.name)
                .join(format!("{}.xlsx", category.name))
        })
    }

    pub fn render_options(&self, category: &CategoryConfig) -> RenderOptions {
        RenderOptions {
            strategy: category.link_strategy,
            mergeable_columns: self.mergeable_columns.clone(),
            name_column: self.name_column,
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
