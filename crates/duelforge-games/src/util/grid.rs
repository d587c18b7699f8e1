//! Rectangular grids: bounds checks, 8-neighbourhoods, toroidal wrapping
//! and a stack-based flood fill.

use serde::Serialize;

/// A `rows × cols` grid stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(rows: usize, cols: usize, fill: T) -> Self {
        Self {
            rows,
            cols,
            cells: vec![fill; rows * cols],
        }
    }

    /// Copies the grid into nested rows, the shape clients render.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.cells.chunks(self.cols.max(1)).map(<[T]>::to_vec).collect()
    }
}

impl<T> Grid<T> {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether signed coordinates fall inside the grid.
    pub fn contains(&self, row: i64, col: i64) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.cells.get(row * self.cols + col)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        if row < self.rows && col < self.cols {
            self.cells.get_mut(row * self.cols + col)
        } else {
            None
        }
    }

    /// Every cell with its coordinates, row by row.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> + '_ {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| ((i / cols, i % cols), cell))
    }

    /// Builds a new grid of the same shape.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            cells: self.cells.iter().map(f).collect(),
        }
    }
}

impl<T: Serialize + Clone> Serialize for Grid<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_rows().serialize(serializer)
    }
}

/// Offsets of the 8 surrounding cells.
const AROUND: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// The in-bounds cells around `(row, col)`.
pub fn neighbors8(rows: usize, cols: usize, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> {
    AROUND.iter().filter_map(move |&(dr, dc)| {
        let r = row as i64 + dr;
        let c = col as i64 + dc;
        (r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols).then(|| (r as usize, c as usize))
    })
}

/// Wraps a coordinate onto `0..size`.
pub fn wrap(value: i64, size: usize) -> usize {
    value.rem_euclid(size.max(1) as i64) as usize
}

/// What a flood fill does with a cell it reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flood {
    /// Leave the cell alone.
    Skip,
    /// Take the cell but do not spread from it.
    Take,
    /// Take the cell and spread to its neighbours.
    Spread,
}

/// Flood fill over the 8-neighbourhood from `start`, using an explicit
/// stack. Every cell is classified at most once.
///
/// Returns the taken cells in the order they were taken.
pub fn flood_fill(
    rows: usize,
    cols: usize,
    start: (usize, usize),
    mut classify: impl FnMut(usize, usize) -> Flood,
) -> Vec<(usize, usize)> {
    let mut seen = vec![false; rows * cols];
    let mut taken = Vec::new();
    if start.0 >= rows || start.1 >= cols {
        return taken;
    }
    let mut stack = vec![start];
    seen[start.0 * cols + start.1] = true;

    while let Some((row, col)) = stack.pop() {
        match classify(row, col) {
            Flood::Skip => continue,
            Flood::Take => taken.push((row, col)),
            Flood::Spread => {
                taken.push((row, col));
                for (r, c) in neighbors8(rows, cols, row, col) {
                    let idx = r * cols + c;
                    if !seen[idx] {
                        seen[idx] = true;
                        stack.push((r, c));
                    }
                }
            }
        }
    }
    taken
}
