use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use pharmaview::config::{CategoryConfig, ViewerConfig};
use pharmaview::table::render::escape_html;
use pharmaview::table::{PopupOptions, TableRenderer, popup_script, standalone_page};
use pharmaview::urlmap::UrlMapCache;
use pharmaview::workbook::{Sheet, Workbook, read_workbook};
use tracing::{info, warn};

use crate::cli::RenderArgs;
use crate::util::{ensure_directory, sanitized_identifier, write_file};

const PAGE_TITLE: &str = "Pharmaceutical Data Viewer";

#[derive(Debug, Clone)]
pub struct RenderedTable {
    pub category: String,
    pub sheet: String,
    pub table_id: String,
    pub html: String,
    pub has_links: bool,
}

/// Which sheets of a workbook to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetSelection<'a> {
    Named(&'a str),
    All,
    OnlySheet,
}

pub fn run(args: RenderArgs) -> Result<()> {
    let config = ViewerConfig::load(args.config.as_deref())?;

    let categories: Vec<&CategoryConfig> = if args.all_categories {
        config.categories.iter().collect()
    } else {
        let name = args
            .category
            .as_deref()
            .context("--category is required unless --all-categories is set")?;
        vec![config.category(name)?]
    };

    let selection = match (&args.sheet, args.all_sheets || args.all_categories) {
        (Some(sheet), _) => SheetSelection::Named(sheet),
        (None, true) => SheetSelection::All,
        (None, false) => SheetSelection::OnlySheet,
    };

    let mut cache = UrlMapCache::new();
    let tables = if args.all_categories {
        render_each_category(&categories, |category| {
            render_category(&config, category, selection, &mut cache)
        })?
    } else {
        let mut tables = Vec::new();
        for category in categories {
            tables.extend(render_category(&config, category, selection, &mut cache)?);
        }
        tables
    };

    write_output(&args, config.popup, &tables)
}

/// Renders every category, skipping those that fail.
///
/// Fails only when no category rendered.
pub fn render_each_category<F>(
    categories: &[&CategoryConfig],
    mut render: F,
) -> Result<Vec<RenderedTable>>
where
    F: FnMut(&CategoryConfig) -> Result<Vec<RenderedTable>>,
{
    let mut tables = Vec::new();
    let mut failed = Vec::new();
    for &category in categories {
        match render(category) {
            Ok(rendered) => tables.extend(rendered),
            Err(err) => {
                let error = format!("{err:#}");
                warn!(category = %category.name, error = %error, "skipping category");
                failed.push(category.name.as_str());
            }
        }
    }

    if tables.is_empty() && !failed.is_empty() {
        bail!("no category rendered, failed: {}", failed.join(", "));
    }
    if !failed.is_empty() {
        warn!(
            rendered = tables.len(),
            failed = failed.len(),
            "some categories were skipped"
        );
    }
    Ok(tables)
}

pub fn render_category(
    config: &ViewerConfig,
    category: &CategoryConfig,
    selection: SheetSelection<'_>,
    cache: &mut UrlMapCache,
) -> Result<Vec<RenderedTable>> {
    let workbook_path = config.workbook_path(category);
    let workbook = read_workbook(&workbook_path)
        .with_context(|| format!("failed to load category '{}'", category.name))?;
    let sheets = select_sheets(&workbook, selection)?;

    let lookup = if category.link_strategy.uses_lookup() {
        Some(&cache.get_or_load(&config.url_table)?.map)
    } else {
        None
    };

    let renderer = TableRenderer::new(config.render_options(category));
    let mut tables = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        let table_id = sanitized_identifier("table", &[&category.name, &sheet.name])?;
        if sheet.dataset.is_empty() {
            info!(category = %category.name, sheet = %sheet.name, "sheet is empty");
        }

        let html = renderer.render(&sheet.dataset, &table_id, &category.name, lookup);
        info!(
            category = %category.name,
            sheet = %sheet.name,
            rows = sheet.dataset.row_count(),
            columns = sheet.dataset.column_count(),
            strategy = category.link_strategy.as_str(),
            "rendered table"
        );

        tables.push(RenderedTable {
            category: category.name.clone(),
            sheet: sheet.name.clone(),
            table_id,
            html,
            has_links: category.link_strategy.emits_links(),
        });
    }

    Ok(tables)
}

pub fn select_sheets<'w>(
    workbook: &'w Workbook,
    selection: SheetSelection<'_>,
) -> Result<Vec<&'w Sheet>> {
    if workbook.sheets.is_empty() {
        bail!("workbook {} has no sheets", workbook.path.display());
    }

    match selection {
        SheetSelection::All => Ok(workbook.sheets.iter().collect()),
        SheetSelection::Named(name) => match workbook.sheet(name) {
            Some(sheet) => Ok(vec![sheet]),
            None => bail!(
                "sheet '{name}' not found in {}, available: {}",
                workbook.path.display(),
                workbook.sheet_names().join(", ")
            ),
        },
        SheetSelection::OnlySheet if workbook.sheets.len() == 1 => {
            Ok(workbook.sheets.iter().collect())
        }
        SheetSelection::OnlySheet => bail!(
            "workbook {} has several sheets, pass --sheet or --all-sheets; available: {}",
            workbook.path.display(),
            workbook.sheet_names().join(", ")
        ),
    }
}

/// Joins tables into one fragment, appending the popup script once.
pub fn compose_document(
    tables: &[&RenderedTable],
    popup: PopupOptions,
    standalone: bool,
) -> String {
    let with_headings = standalone || tables.len() > 1;
    let mut body = String::new();
    for table in tables {
        if with_headings {
            body.push_str(&format!(
                "<h2>{} / {}</h2>\n",
                escape_html(&table.category),
                escape_html(&table.sheet)
            ));
        }
        body.push_str(&table.html);
    }
    if tables.iter().any(|table| table.has_links) {
        body.push_str(&popup_script(popup));
    }

    if standalone {
        standalone_page(PAGE_TITLE, &body)
    } else {
        body
    }
}

fn write_output(args: &RenderArgs, popup: PopupOptions, tables: &[RenderedTable]) -> Result<()> {
    match (&args.output, tables) {
        (None, _) => {
            let all: Vec<&RenderedTable> = tables.iter().collect();
            let document = compose_document(&all, popup, args.standalone);
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(document.as_bytes())
                .context("failed to write rendered tables to stdout")?;
            stdout.flush().context("failed to flush stdout")?;
        }
        (Some(path), [table]) => {
            let document = compose_document(&[table], popup, args.standalone);
            write_file(path, document.as_bytes())?;
            info!(path = %path.display(), "wrote rendered table");
        }
        (Some(dir), tables) => write_table_files(dir, popup, args.standalone, tables)?,
    }

    Ok(())
}

fn write_table_files(
    dir: &Path,
    popup: PopupOptions,
    standalone: bool,
    tables: &[RenderedTable],
) -> Result<()> {
    ensure_directory(dir)?;
    for table in tables {
        let path = dir.join(format!("{}.html", table.table_id));
        let document = compose_document(&[table], popup, standalone);
        write_file(&path, document.as_bytes())?;
    }
    info!(dir = %dir.display(), tables = tables.len(), "wrote rendered tables");
    Ok(())
}
