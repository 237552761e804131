use std::ops::Range;

use crate::error::Error;

/// Named columns plus rows of rendered cell text, one value per column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, Error> {
        if let Some((ri, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(Error::Merge(format!(
                "row {} has {} values, expected {}",
                ri + 1,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// No rows or no columns. Such a dataset has nothing to lay out.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }
}

/// Which rows of the table carry the column names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeaderMode {
    /// Column names head every page slice; row grouping covers data rows only.
    #[default]
    Repeat,
    /// Column names are row 0 of the sliced matrix and only appear in the
    /// first row group.
    FirstPage,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub usable_width: f32, // points
    pub max_rows_per_page: usize,
}

/// Contiguous column groups, each sized to fit the usable page width.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnPlan {
    pub groups: Vec<Range<usize>>,
}

impl ColumnPlan {
    pub fn sizes(&self) -> Vec<usize> {
        self.groups.iter().map(|g| g.len()).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// One (row group, column group) intersection. `rows` indexes data rows;
/// `header` says whether the column names sit on top.
#[derive(Clone, Debug, PartialEq)]
pub struct PageSlice {
    pub header: bool,
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

impl PageSlice {
    pub fn is_empty(&self) -> bool {
        self.cols.is_empty() || (self.rows.is_empty() && !self.header)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len() + usize::from(self.header)
    }

    pub fn cells(&self, dataset: &Dataset) -> Vec<Vec<String>> {
        let header = self
            .header
            .then(|| dataset.columns()[self.cols.clone()].to_vec());
        header
            .into_iter()
            .chain(
                dataset.rows()[self.rows.clone()]
                    .iter()
                    .map(|row| row[self.cols.clone()].to_vec()),
            )
            .collect()
    }
}

pub struct TableFragment {
    pub cells: Vec<Vec<String>>,
    pub col_widths: Vec<f32>, // points
    /// First row of `cells` is the column-name row and gets header styling.
    pub header_row: bool,
}

pub enum ReportItem {
    Title(String),
    Spacer(f32),
    Table(TableFragment),
    PageBreak,
    Footer(String),
}
