use anyhow::Result;
use pharmaview::config::ViewerConfig;
use pharmaview::urlmap::load_csv;
use pharmaview::workbook::sheet_names;
use tracing::{info, warn};

use crate::cli::StatusArgs;

pub fn run(args: StatusArgs) -> Result<()> {
    let config = ViewerConfig::load(args.config.as_deref())?;

    info!(
        excel_root = %config.excel_root.display(),
        url_table = %config.url_table.display(),
        categories = config.categories.len(),
        "status requested"
    );

    if config.url_table.exists() {
        match load_csv(&config.url_table) {
            Ok(loaded) => info!(
                path = %config.url_table.display(),
                entries = loaded.map.len(),
                total = loaded.stats.total,
                skipped = loaded.stats.skipped,
                duplicates = loaded.stats.duplicates,
                "image URL table status"
            ),
            Err(err) => {
                let error = format!("{err:#}");
                warn!(
                    path = %config.url_table.display(),
                    error = %error,
                    "image URL table unreadable"
                );
            }
        }
    } else {
        warn!(path = %config.url_table.display(), "image URL table missing");
    }

    for category in &config.categories {
        let path = config.workbook_path(category);
        if !path.exists() {
            warn!(
                category = %category.name,
                path = %path.display(),
                "workbook missing"
            );
            continue;
        }

        match sheet_names(&path) {
            Ok(sheets) => info!(
                category = %category.name,
                strategy = category.link_strategy.as_str(),
                sheets = %sheets.join(", "),
                "workbook available"
            ),
            Err(err) => {
                let error = format!("{err:#}");
                warn!(
                    category = %category.name,
                    path = %path.display(),
                    error = %error,
                    "workbook unreadable"
                );
            }
        }
    }

    Ok(())
}
