use super::dataset::Dataset;

/// Columns that merge vertically unless configured otherwise.
pub const DEFAULT_MERGEABLE_COLUMNS: [usize; 2] = [1, 2];

/// Vertical spans for every cell of a dataset.
///
/// `0` marks a cell absorbed by an earlier span, `1` a normal cell and any
/// larger value the start of a block covering that many rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowspanGrid {
    spans: Vec<Vec<usize>>,
}

impl RowspanGrid {
    fn ones(rows: usize, columns: usize) -> Self {
        Self {
            spans: vec![vec![1; columns]; rows],
        }
    }

    /// Span of a cell; positions outside the grid read as `1`.
    pub fn span(&self, row: usize, column: usize) -> usize {
        self.spans
            .get(row)
            .and_then(|spans| spans.get(column))
            .copied()
            .unwrap_or(1)
    }

    pub fn is_absorbed(&self, row: usize, column: usize) -> bool {
        self.span(row, column) == 0
    }

    /// Spans of one column, top to bottom.
    pub fn column(&self, column: usize) -> Vec<usize> {
        (0..self.spans.len())
            .map(|row| self.span(row, column))
            .collect()
    }

    fn close_run(&mut self, column: usize, start: usize, end: usize) {
        let len = end - start;
        if len <= 1 {
            return;
        }
        self.spans[start][column] = len;
        for row in start + 1..end {
            self.spans[row][column] = 0;
        }
    }
}

/// Computes the rowspan grid for `mergeable_columns` of `dataset`.
///
/// A non-blank cell opens a block that absorbs the blank cells below it
/// until the next non-blank cell. Blanks above the first non-blank cell of a
/// column stay standalone. Column positions past the dataset width are
/// ignored.
pub fn compute(dataset: &Dataset, mergeable_columns: &[usize]) -> RowspanGrid {
    let row_count = dataset.row_count();
    let mut grid = RowspanGrid::ones(row_count, dataset.column_count());

    for &column in mergeable_columns {
        if column >= dataset.column_count() {
            continue;
        }

        let mut span_start: Option<usize> = None;
        for row in 0..row_count {
            if dataset.is_blank(row, column) {
                continue;
            }
            if let Some(start) = span_start {
                grid.close_run(column, start, row);
            }
            span_start = Some(row);
        }

        if let Some(start) = span_start {
            grid.close_run(column, start, row_count);
        }
    }

    grid
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_MERGEABLE_COLUMNS, compute};
    use crate::table::dataset::Dataset;

    fn single_column(values: &[&str]) -> Dataset {
        let rows: Vec<Vec<&str>> = values.iter().map(|value| vec!["name", *value]).collect();
        let rows: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
        Dataset::from_text(&["Nom", "Dosage"], &rows)
    }

    #[test]
    fn blank_followers_are_absorbed_by_preceding_value() {
        let dataset = single_column(&["A", "", "", "B", ""]);
        let grid = compute(&dataset, &[1]);
        assert_eq!(grid.column(1), vec![3, 0, 0, 2, 0]);
    }

    #[test]
    fn dense_column_has_no_merges() {
        let dataset = single_column(&["A", "B", "C"]);
        let grid = compute(&dataset, &[1]);
        assert_eq!(grid.column(1), vec![1, 1, 1]);
    }

    #[test]
    fn leading_blanks_are_never_merged_backward() {
        let dataset = single_column(&["", "", "A", ""]);
        let grid = compute(&dataset, &[1]);
        assert_eq!(grid.column(1), vec![1, 1, 2, 0]);
    }

    #[test]
    fn all_blank_column_stays_standalone() {
        let dataset = single_column(&["", "", ""]);
        let grid = compute(&dataset, &[1]);
        assert_eq!(grid.column(1), vec![1, 1, 1]);
    }

    #[test]
    fn non_mergeable_columns_are_always_one() {
        let dataset = Dataset::from_text(
            &["Nom", "Dosage", "Forme"],
            &[&["Amoxil", "500mg", "x"], &["", "", "y"]],
        );
        let grid = compute(&dataset, &DEFAULT_MERGEABLE_COLUMNS);

        assert_eq!(grid.column(0), vec![1, 1]);
        assert_eq!(grid.column(1), vec![2, 0]);
        assert_eq!(grid.column(2), vec![1, 1]);
        assert!(grid.is_absorbed(1, 1));
    }

    #[test]
    fn out_of_range_columns_are_ignored() {
        let dataset = single_column(&["A", ""]);
        let grid = compute(&dataset, &[1, 7]);
        assert_eq!(grid.column(1), vec![2, 0]);
        assert_eq!(grid.span(0, 7), 1);
    }

    #[test]
    fn empty_dataset_yields_empty_grid() {
        let dataset = Dataset::from_text(&["Nom", "Dosage"], &[]);
        let grid = compute(&dataset, &DEFAULT_MERGEABLE_COLUMNS);
        assert!(grid.column(1).is_empty());
    }
}
