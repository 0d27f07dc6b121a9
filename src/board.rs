//! Board: grid of coloured spheres, group search, pop resolution.

use rand::Rng;
use thiserror::Error;

/// Board dimension when none is given on the command line.
pub const DEFAULT_GRID_SIZE: usize = 8;

/// Minimum connected group size that clears when popped.
pub const DEFAULT_CLEAR_THRESHOLD: usize = 3;

/// Sphere colours in the full palette (indices 0..5): red, green, blue,
/// yellow, magenta.
pub const PALETTE_LEN: u8 = 5;

/// Single cell: either empty or a sphere of a given colour index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Sphere(u8), // colour index 0..PALETTE_LEN
}

/// Coordinate outside the board. In-range callers never see this; it failing
/// loudly surfaces coordinate-math bugs in the picking layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("coordinate ({x}, {y}) outside {size}x{size} board")]
    OutOfBounds { x: usize, y: usize, size: usize },
}

/// One visual command for the rendering layer. [`Board::pop`] emits these in
/// the order the board mutations happened, so applying them in sequence
/// reproduces the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Sphere at (x, y) was removed as part of a popped group.
    Remove { x: usize, y: usize },
    /// Surviving sphere in `column` dropped from `from_row` to `to_row`.
    Move {
        column: usize,
        from_row: usize,
        to_row: usize,
    },
    /// New sphere of `color` appeared at (x, y) during refill.
    Create { x: usize, y: usize, color: u8 },
}

/// Square grid of cells. Row 0 is the top; row `size - 1` is the bottom.
/// Spheres fall towards higher row indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    /// cells[y * size + x]; every in-range coordinate always holds a cell.
    cells: Vec<Cell>,
}

impl Board {
    /// Empty board of the given dimension.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size * size],
        }
    }

    /// Fully populated board, each cell drawn uniformly from the first
    /// `colors` palette entries.
    #[must_use]
    pub fn random(size: usize, colors: u8, rng: &mut impl Rng) -> Self {
        let cells = (0..size * size)
            .map(|_| Cell::Sphere(rng.random_range(0..colors)))
            .collect();
        Self { size, cells }
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.size + x
    }

    #[inline]
    #[must_use]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    pub fn get(&self, x: usize, y: usize) -> Result<Cell, BoardError> {
        if !self.in_bounds(x, y) {
            return Err(BoardError::OutOfBounds {
                x,
                y,
                size: self.size,
            });
        }
        Ok(self.cells[self.index(x, y)])
    }

    /// Overwrites the cell unconditionally; same bounds contract as [`get`].
    ///
    /// [`get`]: Board::get
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) -> Result<(), BoardError> {
        if !self.in_bounds(x, y) {
            return Err(BoardError::OutOfBounds {
                x,
                y,
                size: self.size,
            });
        }
        let idx = self.index(x, y);
        self.cells[idx] = cell;
        Ok(())
    }

    /// Maximal connected same-colour group containing (x, y), the start cell
    /// included. Connectivity is orthogonal only. An empty or out-of-range
    /// start yields an empty group.
    ///
    /// Iterative stack walk with a visited marker; the grid graph has cycles,
    /// the marker guarantees termination in O(size²).
    #[must_use]
    pub fn group_at(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        if !self.in_bounds(x, y) {
            return Vec::new();
        }
        let color = match self.cells[self.index(x, y)] {
            Cell::Sphere(c) => c,
            Cell::Empty => return Vec::new(),
        };

        let mut group = Vec::new();
        let mut visited = vec![false; self.size * self.size];
        let mut stack = vec![(x, y)];
        visited[self.index(x, y)] = true;

        while let Some((cx, cy)) = stack.pop() {
            group.push((cx, cy));
            for (nx, ny) in neighbours(cx, cy, self.size) {
                let idx = self.index(nx, ny);
                if !visited[idx] && self.cells[idx] == Cell::Sphere(color) {
                    visited[idx] = true;
                    stack.push((nx, ny));
                }
            }
        }
        group
    }

    /// Resolve one click: find the group at (x, y), clear it if it has at
    /// least `min_group` members, drop survivors down their columns and
    /// refill from `rng`. Returns the effect sequence of the turn; an
    /// out-of-range click, an empty cell or a too-small group is a no-op
    /// with an empty sequence and no board change.
    ///
    /// Only columns the cleared group touched are modified or produce
    /// effects. The whole turn completes before returning; callers never
    /// observe a half-settled board.
    pub fn pop(
        &mut self,
        x: usize,
        y: usize,
        min_group: usize,
        colors: u8,
        rng: &mut impl Rng,
    ) -> Vec<Effect> {
        let group = self.group_at(x, y);
        if group.len() < min_group {
            return Vec::new();
        }

        let mut effects = Vec::with_capacity(group.len() * 2);
        for &(gx, gy) in &group {
            let idx = self.index(gx, gy);
            self.cells[idx] = Cell::Empty;
            effects.push(Effect::Remove { x: gx, y: gy });
        }

        let mut columns: Vec<usize> = group.iter().map(|&(gx, _)| gx).collect();
        columns.sort_unstable();
        columns.dedup();
        for column in columns {
            let empty_rows = self.settle_column(column, &mut effects);
            self.refill_column(column, empty_rows, colors, rng, &mut effects);
        }
        effects
    }

    /// Stable bottom-up compaction of one column: scanning from the bottom
    /// row upward, each sphere drops to the lowest free row, preserving the
    /// survivors' relative vertical order. Returns how many rows at the top
    /// are left empty for refill.
    fn settle_column(&mut self, column: usize, effects: &mut Vec<Effect>) -> usize {
        let mut free = self.size; // rows 0..free end up empty
        for row in (0..self.size).rev() {
            let idx = self.index(column, row);
            if self.cells[idx] == Cell::Empty {
                continue;
            }
            free -= 1;
            if row != free {
                let target = self.index(column, free);
                self.cells[target] = self.cells[idx];
                self.cells[idx] = Cell::Empty;
                effects.push(Effect::Move {
                    column,
                    from_row: row,
                    to_row: free,
                });
            }
        }
        free
    }

    /// Fill the `empty_rows` rows at the top of `column` with fresh random
    /// colours, lowest row first.
    fn refill_column(
        &mut self,
        column: usize,
        empty_rows: usize,
        colors: u8,
        rng: &mut impl Rng,
        effects: &mut Vec<Effect>,
    ) {
        for row in (0..empty_rows).rev() {
            let color = rng.random_range(0..colors);
            let idx = self.index(column, row);
            self.cells[idx] = Cell::Sphere(color);
            effects.push(Effect::Create {
                x: column,
                y: row,
                color,
            });
        }
    }

    /// True if any connected same-colour group has at least `min_group`
    /// members, i.e. the board still has a playable move. One visited sweep
    /// over the whole board.
    #[must_use]
    pub fn has_clearable_group(&self, min_group: usize) -> bool {
        let mut visited = vec![false; self.size * self.size];
        let mut stack = Vec::new();
        for y in 0..self.size {
            for x in 0..self.size {
                let start = self.index(x, y);
                if visited[start] {
                    continue;
                }
                let color = match self.cells[start] {
                    Cell::Sphere(c) => c,
                    Cell::Empty => continue,
                };
                visited[start] = true;
                stack.push((x, y));
                let mut members = 0usize;
                while let Some((cx, cy)) = stack.pop() {
                    members += 1;
                    for (nx, ny) in neighbours(cx, cy, self.size) {
                        let idx = self.index(nx, ny);
                        if !visited[idx] && self.cells[idx] == Cell::Sphere(color) {
                            visited[idx] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
                if members >= min_group {
                    return true;
                }
            }
        }
        false
    }
}

/// Orthogonal in-bounds neighbours of (x, y) on a `size`-wide board.
fn neighbours(x: usize, y: usize, size: usize) -> impl Iterator<Item = (usize, usize)> {
    const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
    DIRECTIONS.into_iter().filter_map(move |(dx, dy)| {
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        (nx >= 0 && nx < size as isize && ny >= 0 && ny < size as isize)
            .then(|| (nx as usize, ny as usize))
    })
}
