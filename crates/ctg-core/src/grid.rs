//! Materialized cell grids handed to the parser by sheet readers.
//!
//! Rows and columns are 0-based: column B of a spreadsheet is column `1`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// True for empty cells and text cells holding only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed display text; empty string for blank cells.
    pub fn as_trimmed_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => String::from(if *b { "TRUE" } else { "FALSE" }),
        }
    }

    /// Permissive numeric read: numbers pass through, text has surrounding
    /// whitespace and a trailing `%` removed before parsing.
    ///
    /// Anything unparsable, including NaN and infinities, is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => parse_number(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_trimmed_text())
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Parse text such as `"92.5"`, `" 92.5 % "` or `"92.5%"` into a finite float.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Compact number formatting: integral values print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One sheet's cells, row-major.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetGrid {
    rows: Vec<Vec<Cell>>,
}

static EMPTY_CELL: Cell = Cell::Empty;

impl SheetGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Build a grid from string rows; empty strings become empty cells and
    /// everything else is kept as text.
    pub fn from_text_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|s| Cell::from(s.as_ref())).collect())
            .collect();
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell at (row, col); out-of-range positions read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(Cell::is_blank))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_read_strips_percent_and_whitespace() {
        assert_eq!(Cell::text(" 92.5 %").as_number(), Some(92.5));
        assert_eq!(Cell::text("85").as_number(), Some(85.0));
        assert_eq!(Cell::Number(70.0).as_number(), Some(70.0));
        assert_eq!(Cell::text("n/a").as_number(), None);
        assert_eq!(Cell::text("NaN").as_number(), None);
        assert_eq!(Cell::Empty.as_number(), None);
        assert_eq!(Cell::Bool(true).as_number(), None);
    }

    #[test]
    fn out_of_range_cells_are_empty() {
        let grid = SheetGrid::from_text_rows(vec![vec!["a", "b"]]);
        assert_eq!(grid.cell(0, 1), &Cell::text("b"));
        assert!(grid.cell(0, 5).is_blank());
        assert!(grid.cell(9, 0).is_blank());
        assert_eq!(grid.column_count(), 2);
    }

    #[test]
    fn number_text_is_compact() {
        assert_eq!(Cell::Number(400.0).as_trimmed_text(), "400");
        assert_eq!(Cell::Number(101.25).as_trimmed_text(), "101.25");
    }
}
