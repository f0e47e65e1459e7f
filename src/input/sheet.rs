use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetCell {
    pub value: Option<String>,
    /// Solid fill as six uppercase hex digits (`RRGGBB`). Workbook colors
    /// without an RGB value keep a `theme:`/`indexed:` token instead.
    pub fill: Option<String>,
}

/// Sparse worksheet addressed by 1-based (row, column).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    cells: BTreeMap<(usize, usize), SheetCell>,
}

impl SheetGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, row: usize, col: usize, cell: SheetCell) {
        if cell.value.is_none() && cell.fill.is_none() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), cell);
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&SheetCell> {
        self.cells.get(&(row, col))
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.cell(row, col)?.value.as_deref()
    }

    pub fn fill(&self, row: usize, col: usize) -> Option<&str> {
        self.cell(row, col)?.fill.as_deref()
    }

    pub fn max_row(&self) -> usize {
        self.cells.keys().map(|&(r, _)| r).max().unwrap_or(0)
    }

    pub fn max_column(&self) -> usize {
        self.cells.keys().map(|&(_, c)| c).max().unwrap_or(0)
    }

    /// First cell in row-major order whose value contains `needle`,
    /// ignoring case.
    pub fn find_marker(&self, needle: &str) -> Option<(usize, usize)> {
        let needle = needle.to_lowercase();
        self.cells
            .iter()
            .find(|(_, cell)| {
                cell.value
                    .as_deref()
                    .is_some_and(|v| v.to_lowercase().contains(&needle))
            })
            .map(|(&pos, _)| pos)
    }
}

/// Normalizes `#RRGGBB`, `RRGGBB` or ARGB `AARRGGBB` to `RRGGBB`.
pub fn normalize_color(raw: &str) -> Option<String> {
    let hex = raw.trim().trim_start_matches('#');
    if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(hex[hex.len() - 6..].to_ascii_uppercase())
}
