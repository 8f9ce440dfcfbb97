use serde::{Deserialize, Serialize};

use super::dataset::Dataset;
use super::rowspan::{self, DEFAULT_MERGEABLE_COLUMNS};
use crate::normalize::normalize;
use crate::urlmap::UrlMap;

/// Class carried by every generated link; the popup script binds to it.
pub const POPUP_LINK_CLASS: &str = "external-image-popup";

/// Markup returned for a dataset without rows or columns.
pub const EMPTY_TABLE_PLACEHOLDER: &str = "<p>Table is empty.</p>";

const DEFAULT_POPUP_LABEL: &str = "image";

/// How body cells turn into links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStrategy {
    /// Name cells resolve through the URL table; literal URLs still link.
    #[default]
    LookupBacked,
    /// Only cells holding literal URLs link; any URL table is ignored.
    RawUrlOnly,
    /// Plain text everywhere.
    #[serde(rename = "none")]
    NoLinks,
}

impl LinkStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LookupBacked => "lookup_backed",
            Self::RawUrlOnly => "raw_url_only",
            Self::NoLinks => "none",
        }
    }

    pub fn uses_lookup(self) -> bool {
        matches!(self, Self::LookupBacked)
    }

    pub fn emits_links(self) -> bool {
        !matches!(self, Self::NoLinks)
    }
}

/// Target and short label handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupLink {
    pub url: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub strategy: LinkStrategy,
    pub mergeable_columns: Vec<usize>,
    pub name_column: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            strategy: LinkStrategy::default(),
            mergeable_columns: DEFAULT_MERGEABLE_COLUMNS.to_vec(),
            name_column: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableRenderer {
    options: RenderOptions,
}

enum CellContent {
    Plain(String),
    Link { link: PopupLink, text: String },
}

impl TableRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Renders `dataset` as an HTML table with id `table_id`.
    ///
    /// `category_label` scopes URL-table lookups for the name column. A cell
    /// that cannot be resolved to a link renders as escaped text.
    pub fn render(
        &self,
        dataset: &Dataset,
        table_id: &str,
        category_label: &str,
        url_lookup: Option<&UrlMap>,
    ) -> String {
        if dataset.is_empty() {
            return EMPTY_TABLE_PLACEHOLDER.to_string();
        }

        let grid = rowspan::compute(dataset, &self.options.mergeable_columns);
        let lookup = url_lookup.filter(|_| self.options.strategy.uses_lookup());
        let category_key = normalize(category_label);

        let mut html = String::new();
        write_style(&mut html, table_id);
        html.push_str(&format!(
            "<table class=\"dataframe\" id=\"{}\">\n",
            escape_html(table_id)
        ));
        write_header(&mut html, dataset.columns());

        html.push_str("<tbody>\n");
        for (row_index, row) in dataset.rows().iter().enumerate() {
            html.push_str("<tr>");
            for (column, cell) in row.iter().enumerate() {
                let span = grid.span(row_index, column);
                if span == 0 {
                    continue;
                }
                let text = cell.as_deref().unwrap_or_default();
                let content = self.cell_content(text, column, &category_key, lookup);
                write_cell(&mut html, span, &content);
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n");

        html
    }

    /// Resolves the link for one body cell, if any.
    pub fn resolve_link(
        &self,
        text: &str,
        column: usize,
        category_label: &str,
        url_lookup: Option<&UrlMap>,
    ) -> Option<PopupLink> {
        let lookup = url_lookup.filter(|_| self.options.strategy.uses_lookup());
        match self.cell_content(text, column, &normalize(category_label), lookup) {
            CellContent::Link { link, .. } => Some(link),
            CellContent::Plain(_) => None,
        }
    }

    fn cell_content(
        &self,
        text: &str,
        column: usize,
        category_key: &str,
        lookup: Option<&UrlMap>,
    ) -> CellContent {
        if !self.options.strategy.emits_links() || text.is_empty() {
            return CellContent::Plain(text.to_string());
        }

        if let Some(map) = lookup
            && column == self.options.name_column
        {
            let key = format!("{category_key}-{}", normalize(text));
            if let Some(url) = map.get(&key) {
                let label = short_label(url).unwrap_or(DEFAULT_POPUP_LABEL).to_string();
                return CellContent::Link {
                    link: PopupLink {
                        url: url.to_string(),
                        label,
                    },
                    text: text.to_string(),
                };
            }
        }

        if is_literal_url(text) {
            let (label, visible) = match short_label(text) {
                Some(segment) => (segment.to_string(), segment.to_string()),
                None => (DEFAULT_POPUP_LABEL.to_string(), text.to_string()),
            };
            return CellContent::Link {
                link: PopupLink {
                    url: text.to_string(),
                    label,
                },
                text: visible,
            };
        }

        CellContent::Plain(text.to_string())
    }
}

/// Renders with default merging and the lookup-backed strategy.
pub fn render(
    dataset: &Dataset,
    table_id: &str,
    category_label: &str,
    url_lookup: Option<&UrlMap>,
    name_column_index: usize,
) -> String {
    let renderer = TableRenderer::new(RenderOptions {
        name_column: name_column_index,
        ..RenderOptions::default()
    });
    renderer.render(dataset, table_id, category_label, url_lookup)
}

fn is_literal_url(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}

/// Last path segment of `url` without its query string.
fn short_label(url: &str) -> Option<&str> {
    url.rsplit('/')
        .next()
        .and_then(|segment| segment.split('?').next())
        .filter(|segment| !segment.is_empty())
}

fn write_style(html: &mut String, table_id: &str) {
    let id = escape_html(table_id);
    html.push_str(&format!(
        "<style>\n\
         table#{id} {{ border-collapse: collapse; width: 100%; font-family: sans-serif; }}\n\
         table#{id} th, table#{id} td {{ border: 1px solid #cccccc; padding: 8px; text-align: center; vertical-align: middle; }}\n\
         table#{id} th {{ background-color: #e8e8e8; color: #000000; font-weight: bold; }}\n\
         table#{id} td {{ background-color: #ffffff; color: #000000; }}\n\
         table#{id} tbody tr:nth-child(even) td {{ background-color: #f2f2f2; }}\n\
         table#{id} td a.{POPUP_LINK_CLASS} {{ color: #0066cc; text-decoration: none; cursor: pointer; }}\n\
         table#{id} td a.{POPUP_LINK_CLASS}:hover {{ text-decoration: underline; }}\n\
         </style>\n"
    ));
}

fn write_header(html: &mut String, columns: &[String]) {
    html.push_str("<thead><tr>");
    let mut index = 0;
    while index < columns.len() {
        let continuation = columns[index + 1..]
            .iter()
            .take_while(|name| name.is_empty())
            .count();
        let colspan = continuation + 1;
        if colspan > 1 {
            html.push_str(&format!("<th colspan=\"{colspan}\">"));
        } else {
            html.push_str("<th>");
        }
        html.push_str(&escape_html(&columns[index]));
        html.push_str("</th>");
        index += colspan;
    }
    html.push_str("</tr></thead>\n");
}

fn write_cell(html: &mut String, span: usize, content: &CellContent) {
    if span > 1 {
        html.push_str(&format!("<td rowspan=\"{span}\">"));
    } else {
        html.push_str("<td>");
    }
    match content {
        CellContent::Plain(text) => html.push_str(&escape_html(text)),
        CellContent::Link { link, text } => {
            html.push_str(&format!(
                "<a href=\"#\" class=\"{POPUP_LINK_CLASS}\" data-url=\"{}\" data-filename=\"{}\">{}</a>",
                escape_html(&link.url),
                escape_html(&link.label),
                escape_html(text)
            ));
        }
    }
    html.push_str("</td>");
}

/// Escapes `& < > " '` for text and attribute positions.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests;
