use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use calamine::{Data, Range, Reader, open_workbook_auto};
use tracing::{debug, info};

use crate::table::Dataset;

/// Displayed form of date cells.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One named sheet; its first row became the column names.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub dataset: Dataset,
}

#[derive(Debug, Clone)]
pub struct Workbook {
    pub path: PathBuf,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

/// Reads every sheet of the workbook at `path`.
pub fn read_workbook(path: &Path) -> Result<Workbook> {
    if !path.is_file() {
        bail!("workbook not found: {}", path.display());
    }

    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook: {}", path.display()))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("failed to read sheet '{name}' of {}", path.display()))?;
        let dataset = dataset_from_range(&range);
        debug!(
            sheet = %name,
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "read sheet"
        );
        sheets.push(Sheet { name, dataset });
    }

    info!(path = %path.display(), sheets = sheets.len(), "read workbook");

    Ok(Workbook {
        path: path.to_path_buf(),
        sheets,
    })
}

/// Lists sheet names without converting their contents.
pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        bail!("workbook not found: {}", path.display());
    }
    let workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook: {}", path.display()))?;
    Ok(workbook.sheet_names())
}

/// Converts a used range into a dataset anchored at column A.
///
/// Blank leading columns are kept as absent cells with an empty header so
/// column positions match the sheet. Blank leading rows are skipped: the
/// first used row is the header.
fn dataset_from_range(range: &Range<Data>) -> Dataset {
    let Some((_, first_column)) = range.start() else {
        return Dataset::default();
    };
    let offset = first_column as usize;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Dataset::default();
    };

    let columns = std::iter::repeat_n(String::new(), offset)
        .chain(header.iter().map(|cell| cell_text(cell).unwrap_or_default()));
    let body = rows.map(|row| {
        std::iter::repeat_n(None, offset)
            .chain(row.iter().map(cell_text))
            .collect::<Vec<_>>()
    });

    Dataset::from_raw(columns, body)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(text) => Some(text.trim().to_string()),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            Some(format!("{}", *value as i64))
        }
        Data::Float(value) => Some(value.to_string()),
        Data::Int(value) => Some(value.to_string()),
        Data::DateTime(value) if value.is_datetime() => match value.as_datetime() {
            Some(datetime) => Some(datetime.format(DATETIME_FORMAT).to_string()),
            None => Some(cell.to_string()),
        },
        Data::DateTimeIso(text) | Data::DurationIso(text) => Some(text.trim().to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use calamine::{Data, ExcelDateTime, ExcelDateTimeType, Range};

    use super::{cell_text, dataset_from_range, read_workbook};

    #[test]
    fn cell_text_formats_numbers_like_the_sheet_shows_them() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::Float(500.0)), Some("500".to_string()));
        assert_eq!(cell_text(&Data::Float(2.5)), Some("2.5".to_string()));
        assert_eq!(cell_text(&Data::Int(12)), Some("12".to_string()));
        assert_eq!(
            cell_text(&Data::String(" Amoxil ".to_string())),
            Some("Amoxil".to_string())
        );
    }

    #[test]
    fn cell_text_shows_dates_as_calendar_text() {
        let date = ExcelDateTime::new(45292.0, ExcelDateTimeType::DateTime, false);
        assert_eq!(
            cell_text(&Data::DateTime(date)),
            Some("2024-01-01 00:00:00".to_string())
        );

        let afternoon = ExcelDateTime::new(45292.5, ExcelDateTimeType::DateTime, false);
        assert_eq!(
            cell_text(&Data::DateTime(afternoon)),
            Some("2024-01-01 12:00:00".to_string())
        );

        assert_eq!(
            cell_text(&Data::DateTimeIso("2024-01-01T08:30:00".to_string())),
            Some("2024-01-01T08:30:00".to_string())
        );
        assert_eq!(
            cell_text(&Data::DurationIso("PT1H30M".to_string())),
            Some("PT1H30M".to_string())
        );
    }

    #[test]
    fn blank_leading_column_keeps_column_positions() {
        let mut range: Range<Data> = Range::new((0, 1), (1, 2));
        range.set_value((0, 1), Data::String("Nom".to_string()));
        range.set_value((0, 2), Data::String("Dosage".to_string()));
        range.set_value((1, 1), Data::String("Amoxil".to_string()));
        range.set_value((1, 2), Data::String("500mg".to_string()));

        let dataset = dataset_from_range(&range);
        assert_eq!(dataset.columns(), ["", "Nom", "Dosage"]);
        assert_eq!(dataset.row_count(), 1);
        assert!(dataset.is_blank(0, 0));
        assert_eq!(dataset.cell(0, 1), Some("Amoxil"));
        assert_eq!(dataset.cell(0, 2), Some("500mg"));
    }

    #[test]
    fn blank_leading_rows_are_skipped() {
        let mut range: Range<Data> = Range::new((2, 0), (3, 1));
        range.set_value((2, 0), Data::String("Nom".to_string()));
        range.set_value((2, 1), Data::String("Dosage".to_string()));
        range.set_value((3, 0), Data::String("Amoxil".to_string()));

        let dataset = dataset_from_range(&range);
        assert_eq!(dataset.columns(), ["Nom", "Dosage"]);
        assert_eq!(dataset.row_count(), 1);
        assert_eq!(dataset.cell(0, 0), Some("Amoxil"));
    }

    #[test]
    fn first_row_becomes_header_and_blanks_stay_absent() {
        let mut range: Range<Data> = Range::new((0, 0), (2, 2));
        range.set_value((0, 0), Data::String("Nom".to_string()));
        range.set_value((0, 1), Data::String("Dosage".to_string()));
        range.set_value((1, 0), Data::String("Amoxil".to_string()));
        range.set_value((1, 1), Data::String("500mg".to_string()));
        range.set_value((1, 2), Data::String("x".to_string()));
        range.set_value((2, 2), Data::String("y".to_string()));

        let dataset = dataset_from_range(&range);
        assert_eq!(dataset.columns(), ["Nom", "Dosage", ""]);
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.cell(0, 1), Some("500mg"));
        assert!(dataset.is_blank(1, 0));
        assert!(dataset.is_blank(1, 1));
        assert_eq!(dataset.cell(1, 2), Some("y"));
    }

    #[test]
    fn empty_range_yields_empty_dataset() {
        let range: Range<Data> = Range::empty();
        assert!(dataset_from_range(&range).is_empty());
    }

    #[test]
    fn missing_workbook_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_workbook(&dir.path().join("Sirop.xlsx")).expect_err("missing workbook");
        assert!(err.to_string().contains("workbook not found"));
    }
}
