/// A single cell; `None` is the absent marker.
pub type Cell = Option<String>;

/// Placeholder spellings that spreadsheet exports use for missing values.
const MISSING_PLACEHOLDERS: [&str; 2] = ["nan", "NaN"];

/// An ordered, rectangular table read from one sheet.
///
/// Every row holds exactly one cell per column. Blank text is collapsed to
/// the absent marker when the dataset is built and never reappears.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// Builds a dataset from raw header names and raw row text.
    ///
    /// Rows shorter than the header are padded with absent cells and longer
    /// rows are truncated to the header width.
    pub fn from_raw<H, R, C>(columns: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = Option<String>>,
    {
        let columns: Vec<String> = columns
            .into_iter()
            .map(|name| {
                let name: String = name.into();
                clean_header(&name)
            })
            .collect();
        let width = columns.len();

        let rows = rows
            .into_iter()
            .map(|raw| {
                let mut row: Vec<Cell> = raw
                    .into_iter()
                    .take(width)
                    .map(|cell| cell.and_then(|text| clean_cell(&text)))
                    .collect();
                row.resize(width, None);
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Convenience constructor over string slices; `""` is read as absent.
    pub fn from_text(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self::from_raw(
            columns.iter().copied(),
            rows.iter()
                .map(|row| row.iter().map(|cell| Some((*cell).to_string())).collect::<Vec<_>>()),
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .and_then(|cell| cell.as_deref())
    }

    pub fn is_blank(&self, row: usize, column: usize) -> bool {
        self.cell(row, column).is_none()
    }
}

fn clean_header(name: &str) -> String {
    name.trim().to_string()
}

fn clean_cell(text: &str) -> Cell {
    let trimmed = text.trim();
    if trimmed.is_empty() || MISSING_PLACEHOLDERS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}
