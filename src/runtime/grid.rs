//! Output Grid Assembler
//!
//! Sparse standard-output buffer: each row is either a whole line or a set
//! of cells. Missing rows and cells render as empty strings.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{BindError, Result};

#[derive(Debug, Clone, PartialEq)]
enum Row {
    Line(String),
    Cells(BTreeMap<usize, String>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputGrid {
    rows: BTreeMap<usize, Row>,
}

/// Text form of a value: strings unquoted, everything else as JSON
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl OutputGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Set a whole row; fails if the row already holds cells
    pub fn set_row(&mut self, row: usize, value: &Value) -> Result<()> {
        if matches!(self.rows.get(&row), Some(Row::Cells(_))) {
            return Err(BindError::StructureConflict { row });
        }
        self.rows.insert(row, Row::Line(render(value)));
        Ok(())
    }

    /// Set one cell; fails if the row already holds a whole line
    pub fn set_cell(&mut self, row: usize, col: usize, value: &Value) -> Result<()> {
        let entry = self
            .rows
            .entry(row)
            .or_insert_with(|| Row::Cells(BTreeMap::new()));
        match entry {
            Row::Cells(cells) => {
                cells.insert(col, render(value));
                Ok(())
            }
            Row::Line(_) => Err(BindError::StructureConflict { row }),
        }
    }

    /// One line per row from 0 to the highest row written
    pub fn lines(&self, sep: &str) -> Vec<String> {
        let Some(&last) = self.rows.keys().next_back() else {
            return Vec::new();
        };
        (0..=last)
            .map(|i| match self.rows.get(&i) {
                None => String::new(),
                Some(Row::Line(line)) => line.clone(),
                Some(Row::Cells(cells)) => {
                    let width = cells.keys().next_back().map_or(0, |c| c + 1);
                    (0..width)
                        .map(|c| cells.get(&c).map_or("", String::as_str))
                        .collect::<Vec<_>>()
                        .join(sep)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn gaps_render_as_empty_lines() {
        let mut grid = OutputGrid::new();
        grid.set_row(0, &json!("a")).unwrap();
        grid.set_row(2, &json!("c")).unwrap();
        assert_eq!(grid.lines(","), vec!["a", "", "c"]);
    }

    #[test]
    fn cells_join_with_separator() {
        let mut grid = OutputGrid::new();
        grid.set_cell(0, 2, &json!(3)).unwrap();
        grid.set_cell(0, 0, &json!("x")).unwrap();
        grid.set_cell(1, 1, &json!(1.5)).unwrap();
        assert_eq!(grid.lines(" "), vec!["x  3", " 1.5"]);
    }

    #[test]
    fn last_write_wins() {
        let mut grid = OutputGrid::new();
        grid.set_cell(0, 0, &json!(1)).unwrap();
        grid.set_cell(0, 0, &json!(2)).unwrap();
        grid.set_row(1, &json!("a")).unwrap();
        grid.set_row(1, &json!("b")).unwrap();
        assert_eq!(grid.lines(","), vec!["2", "b"]);
    }

    #[test]
    fn row_over_cells_conflicts() {
        let mut grid = OutputGrid::new();
        grid.set_cell(0, 0, &json!(1)).unwrap();
        assert!(matches!(
            grid.set_row(0, &json!("x")),
            Err(BindError::StructureConflict { row: 0 })
        ));
    }

    #[test]
    fn cells_over_row_conflicts() {
        let mut grid = OutputGrid::new();
        grid.set_row(3, &json!([1, 2])).unwrap();
        assert!(grid.set_cell(3, 0, &json!(1)).is_err());
        assert_eq!(grid.lines(",")[3], "[1,2]");
    }

    #[test]
    fn empty_grid_has_no_lines() {
        assert!(OutputGrid::new().lines(",").is_empty());
    }
}
