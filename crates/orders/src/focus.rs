//! Keyboard focus over the line-item grid.
//!
//! Kept out of the engine: the engine only sees line indices, the UI owns
//! where the cursor is.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridKey {
    Up,
    Down,
    Left,
    Right,
    Tab,
    BackTab,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub column: usize,
}

/// Cursor over a `rows × columns` grid whose row count changes as lines are
/// added and removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridFocus {
    rows: usize,
    columns: usize,
    cursor: Option<Cell>,
}

impl GridFocus {
    pub fn new(rows: usize, columns: usize) -> Self {
        let mut focus = Self {
            rows,
            columns,
            cursor: None,
        };
        focus.clamp();
        focus
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// `None` while the grid is empty.
    pub fn cursor(&self) -> Option<Cell> {
        self.cursor
    }

    pub fn focus(&mut self, row: usize, column: usize) {
        self.cursor = Some(Cell { row, column });
        self.clamp();
    }

    /// Resize after lines were added or removed, keeping the cursor inside.
    pub fn set_rows(&mut self, rows: usize) {
        self.rows = rows;
        self.clamp();
    }

    pub fn handle(&mut self, key: GridKey) -> Option<Cell> {
        let Some(Cell { row, column }) = self.cursor else {
            return None;
        };
        let last_row = self.rows - 1;
        let last_column = self.columns - 1;

        let next = match key {
            GridKey::Up => Cell {
                row: row.saturating_sub(1),
                column,
            },
            GridKey::Down => Cell {
                row: (row + 1).min(last_row),
                column,
            },
            GridKey::Left => Cell {
                row,
                column: column.saturating_sub(1),
            },
            GridKey::Right => Cell {
                row,
                column: (column + 1).min(last_column),
            },
            GridKey::Home => Cell { row, column: 0 },
            GridKey::End => Cell {
                row,
                column: last_column,
            },
            GridKey::Tab => {
                let flat = (row * self.columns + column + 1) % self.cell_count();
                self.cell_at(flat)
            }
            GridKey::BackTab => {
                let cells = self.cell_count();
                let flat = (row * self.columns + column + cells - 1) % cells;
                self.cell_at(flat)
            }
        };

        self.cursor = Some(next);
        self.cursor
    }

    fn cell_count(&self) -> usize {
        self.rows * self.columns
    }

    fn cell_at(&self, flat: usize) -> Cell {
        Cell {
            row: flat / self.columns,
            column: flat % self.columns,
        }
    }

    fn clamp(&mut self) {
        if self.rows == 0 || self.columns == 0 {
            self.cursor = None;
            return;
        }
        let cell = self.cursor.unwrap_or(Cell { row: 0, column: 0 });
        self.cursor = Some(Cell {
            row: cell.row.min(self.rows - 1),
            column: cell.column.min(self.columns - 1),
        });
    }
}
