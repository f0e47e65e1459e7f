use std::fmt;

use serde::Serialize;

pub const N_ROWS: usize = 8;
pub const N_COLS: usize = 12;
pub const N_WELLS: usize = N_ROWS * N_COLS;

pub const ROW_LABELS: [char; N_ROWS] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// Position on a 96-well plate. Row and column are zero-based internally and
/// rendered as `A1`..`H12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WellAddress {
    row: u8,
    col: u8,
}

impl WellAddress {
    pub fn new(row: usize, col: usize) -> Option<Self> {
        if row < N_ROWS && col < N_COLS {
            Some(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// Parses the canonical label form. Lowercase rows and zero-padded
    /// columns are not accepted.
    pub fn parse(label: &str) -> Option<Self> {
        let mut chars = label.chars();
        let row_char = chars.next()?;
        let row = ROW_LABELS.iter().position(|&c| c == row_char)?;
        let digits = chars.as_str();
        if digits.is_empty() || digits.starts_with('0') || digits.len() > 2 {
            return None;
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let col: usize = digits.parse().ok()?;
        if col == 0 {
            return None;
        }
        Self::new(row, col - 1)
    }

    pub fn row(&self) -> usize {
        self.row as usize
    }

    pub fn col(&self) -> usize {
        self.col as usize
    }

    pub fn row_label(&self) -> char {
        ROW_LABELS[self.row as usize]
    }

    /// One-based column number as printed on the plate.
    pub fn column_number(&self) -> usize {
        self.col as usize + 1
    }

    pub fn index(&self) -> usize {
        self.row as usize * N_COLS + self.col as usize
    }

    pub fn all() -> impl Iterator<Item = WellAddress> {
        (0..N_WELLS).map(|i| WellAddress {
            row: (i / N_COLS) as u8,
            col: (i % N_COLS) as u8,
        })
    }
}

impl fmt::Display for WellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_label(), self.column_number())
    }
}

impl Serialize for WellAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Fully populated 8x12 container. Built once by a producer, read-only after.
#[derive(Debug, Clone, PartialEq)]
pub struct WellGrid<T> {
    cells: Vec<T>,
}

impl<T> WellGrid<T> {
    pub fn from_fn(mut f: impl FnMut(WellAddress) -> T) -> Self {
        let cells = WellAddress::all().map(&mut f).collect();
        Self { cells }
    }

    pub fn get(&self, well: WellAddress) -> &T {
        &self.cells[well.index()]
    }

    /// Row-major iteration: A1..A12, B1..B12, ..., H1..H12.
    pub fn iter(&self) -> impl Iterator<Item = (WellAddress, &T)> {
        WellAddress::all().zip(self.cells.iter())
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.cells[row * N_COLS..(row + 1) * N_COLS]
    }
}

pub type CtGrid = WellGrid<Option<f64>>;

impl CtGrid {
    pub fn n_with_data(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/plate/tests.rs"]
mod tests;
