// grid.rs — Runtime-sized cell grid for the Life automaton.
//
// A `Grid` is the host-side value that flows in and out of every backend:
// the seed handed to `CellStorage::ingest`, the snapshot produced by
// `CellStorage::read_current`, and the result returned by the driver.
//
// CELL ENCODING
// ─────────────
// Cells are stored as `u32` (0 = dead, 1 = alive) rather than `bool` or
// `u8`. WGSL storage arrays and `R32Uint` textures are both 32-bit per
// element, so a `u32` grid can be handed to `bytemuck::cast_slice` and
// uploaded without a conversion pass, and the same slice can be compared
// bit-for-bit against a GPU readback.
//
// Memory layout (width = 4, height = 3), row-major, no padding:
//
//   index:  0  1  2  3 | 4  5  6  7 | 8  9 10 11
//   row:    ---- 0 ----  ---- 1 ----  ---- 2 ----
//
//   index = y * width + x
//
// Unlike a GPU image there is never stride padding here. Backends that
// need padded rows (the pitched host plane, texture readback) strip it
// before a `Grid` is produced.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Raw value of a dead cell.
pub const DEAD: u32 = 0;
/// Raw value of a live cell.
pub const ALIVE: u32 = 1;

/// Default probability that a seeded cell starts alive.
pub const DEFAULT_DENSITY: f64 = 0.2;

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// State of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Dead,
    Alive,
}

impl Cell {
    /// Decode a raw storage value. Anything non-zero counts as alive.
    #[inline]
    pub fn from_raw(v: u32) -> Self {
        if v == DEAD { Cell::Dead } else { Cell::Alive }
    }

    #[inline]
    pub fn raw(self) -> u32 {
        match self {
            Cell::Dead => DEAD,
            Cell::Alive => ALIVE,
        }
    }

    #[inline]
    pub fn is_alive(self) -> bool {
        self == Cell::Alive
    }
}

impl From<bool> for Cell {
    fn from(alive: bool) -> Self {
        if alive { Cell::Alive } else { Cell::Dead }
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// A fixed-size 2D grid of Life cells, row-major, one `u32` per cell.
///
/// The size is fixed at construction and never changes; every backend
/// rejects a seed whose shape differs from the storage it was allocated for.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    cells: Vec<u32>,
    width: usize,
    height: usize,
}

impl Grid {
    // --- Constructors ---

    /// Create an all-dead grid.
    pub fn new(width: usize, height: usize) -> Self {
        Grid {
            cells: vec![DEAD; width * height],
            width,
            height,
        }
    }

    /// Wrap an existing cell vector.
    ///
    /// Values are normalised to 0/1 so a grid built from arbitrary raw
    /// data still compares equal to what a backend hands back.
    ///
    /// # Panics
    /// Panics if `cells.len() != width * height`.
    pub fn from_cells(width: usize, height: usize, mut cells: Vec<u32>) -> Self {
        assert_eq!(
            cells.len(),
            width * height,
            "cell count ({}) must equal width * height ({})",
            cells.len(),
            width * height,
        );
        for c in &mut cells {
            *c = Cell::from_raw(*c).raw();
        }
        Grid { cells, width, height }
    }

    /// Wrap cell values read back from a backend, as they are.
    ///
    /// Unlike [`Grid::from_cells`] nothing is normalised, so a kernel that
    /// writes anything but 0/1 produces a grid that compares unequal to the
    /// reference.
    ///
    /// # Panics
    /// Panics if `cells.len() != width * height`.
    pub fn from_raw_cells(width: usize, height: usize, cells: Vec<u32>) -> Self {
        assert_eq!(
            cells.len(),
            width * height,
            "cell count ({}) must equal width * height ({})",
            cells.len(),
            width * height,
        );
        Grid { cells, width, height }
    }

    /// Create a grid with the given live cells, everything else dead.
    ///
    /// # Panics
    /// Panics if any coordinate is out of bounds.
    pub fn with_live_cells(width: usize, height: usize, live: &[(usize, usize)]) -> Self {
        let mut grid = Grid::new(width, height);
        for &(x, y) in live {
            grid.set(x, y, Cell::Alive);
        }
        grid
    }

    /// Seed a grid where every cell is independently alive with
    /// probability `density`, drawn from a generator seeded with `seed`.
    ///
    /// The same `(width, height, density, seed)` always yields the same
    /// grid, which is what lets two backends be compared run-for-run.
    ///
    /// # Panics
    /// Panics if `density` is not within `[0, 1]`. `RunConfig::validate`
    /// rejects such values before they reach here.
    pub fn random(width: usize, height: usize, density: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&density),
            "density ({density}) must be within [0, 1]"
        );
        let mut rng = StdRng::seed_from_u64(seed);
        let cells = (0..width * height)
            .map(|_| if rng.gen::<f64>() < density { ALIVE } else { DEAD })
            .collect();
        Grid { cells, width, height }
    }

    // --- Accessors ---

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells (`width * height`).
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Row-major index of `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        self.bounds_check(x, y);
        y * self.width + x
    }

    /// Cell at `(x, y)`. x is the column, y the row.
    ///
    /// # Panics
    /// Panics if `(x, y)` is out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Cell {
        Cell::from_raw(self.cells[self.index(x, y)])
    }

    /// Cell at signed coordinates, with everything outside the grid dead.
    ///
    /// This is the closed-boundary lookup the Life kernels use for
    /// neighbours: there is no wraparound.
    #[inline]
    pub fn get_or_dead(&self, x: isize, y: isize) -> Cell {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return Cell::Dead;
        }
        Cell::from_raw(self.cells[y as usize * self.width + x as usize])
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        let idx = self.index(x, y);
        self.cells[idx] = cell.raw();
    }

    /// Borrow one row.
    #[inline]
    pub fn row(&self, y: usize) -> &[u32] {
        assert!(y < self.height, "row {y} out of bounds (height {})", self.height);
        let start = y * self.width;
        &self.cells[start..start + self.width]
    }

    /// Number of live cells.
    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c != DEAD).count()
    }

    /// Coordinates of every live cell, in row-major order.
    pub fn live_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c != DEAD)
            .map(|(i, _)| (i % self.width, i / self.width))
            .collect()
    }

    /// Raw cell values, row-major, exactly `width * height` long.
    pub fn as_slice(&self) -> &[u32] {
        &self.cells
    }

    /// Consume the grid, returning its raw cells.
    pub fn into_cells(self) -> Vec<u32> {
        self.cells
    }

    #[inline]
    fn bounds_check(&self, x: usize, y: usize) {
        assert!(
            x < self.width && y < self.height,
            "cell ({x},{y}) out of bounds for grid {}×{}",
            self.width,
            self.height,
        );
    }
}

// Text rendering: one line per row, '#' alive and '.' dead. Small grids
// print whole; larger ones are truncated so assertion failures stay readable.
impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid {{ {}×{}, population={} }}", self.width, self.height, self.population())?;
        for y in 0..self.height.min(32) {
            write!(f, "  ")?;
            for x in 0..self.width.min(64) {
                f.write_str(if self.get(x, y).is_alive() { "#" } else { "." })?;
            }
            if self.width > 64 {
                write!(f, " ...")?;
            }
            writeln!(f)?;
        }
        if self.height > 32 {
            writeln!(f, "  ...")?;
        }
        Ok(())
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                f.write_str(if self.get(x, y).is_alive() { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_all_dead() {
        let g = Grid::new(5, 3);
        assert_eq!(g.len(), 15);
        assert_eq!(g.population(), 0);
    }

    #[test]
    fn test_index_is_row_major() {
        let g = Grid::new(7, 4);
        assert_eq!(g.index(0, 0), 0);
        assert_eq!(g.index(6, 0), 6);
        assert_eq!(g.index(0, 1), 7);
        assert_eq!(g.index(3, 2), 2 * 7 + 3);
    }

    #[test]
    fn test_set_and_get() {
        let mut g = Grid::new(4, 4);
        g.set(2, 1, Cell::Alive);
        assert_eq!(g.get(2, 1), Cell::Alive);
        assert_eq!(g.get(1, 2), Cell::Dead);
        assert_eq!(g.as_slice()[6], ALIVE);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds_panics() {
        Grid::new(3, 3).get(3, 0);
    }

    #[test]
    fn test_get_or_dead_outside_is_dead() {
        let g = Grid::from_cells(2, 2, vec![1, 1, 1, 1]);
        assert_eq!(g.get_or_dead(-1, 0), Cell::Dead);
        assert_eq!(g.get_or_dead(0, -1), Cell::Dead);
        assert_eq!(g.get_or_dead(2, 1), Cell::Dead);
        assert_eq!(g.get_or_dead(1, 2), Cell::Dead);
        assert_eq!(g.get_or_dead(1, 1), Cell::Alive);
    }

    #[test]
    fn test_from_cells_normalises_values() {
        let g = Grid::from_cells(3, 1, vec![0, 7, 1]);
        assert_eq!(g.as_slice(), &[0, 1, 1]);
    }

    #[test]
    fn test_from_raw_cells_keeps_values() {
        let g = Grid::from_raw_cells(3, 1, vec![0, 7, 1]);
        assert_eq!(g.as_slice(), &[0, 7, 1]);
        assert_eq!(g.get(1, 0), Cell::Alive);
        assert_ne!(g, Grid::from_cells(3, 1, vec![0, 7, 1]));
    }

    #[test]
    #[should_panic(expected = "cell count")]
    fn test_from_cells_wrong_length_panics() {
        Grid::from_cells(3, 3, vec![0; 8]);
    }

    #[test]
    fn test_random_is_deterministic() {
        let a = Grid::random(64, 48, 0.2, 1337);
        let b = Grid::random(64, 48, 0.2, 1337);
        let c = Grid::random(64, 48, 0.2, 1338);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_random_density_roughly_respected() {
        let g = Grid::random(200, 200, 0.2, 7);
        let frac = g.population() as f64 / g.len() as f64;
        assert!((frac - 0.2).abs() < 0.02, "live fraction {frac} far from 0.2");
    }

    #[test]
    fn test_random_extreme_densities() {
        assert_eq!(Grid::random(10, 10, 0.0, 1).population(), 0);
        assert_eq!(Grid::random(10, 10, 1.0, 1).population(), 100);
    }

    #[test]
    fn test_live_cells_round_trip() {
        let live = [(2, 1), (3, 2), (1, 3), (2, 3), (3, 3)];
        let g = Grid::with_live_cells(8, 8, &live);
        let mut got = g.live_cells();
        got.sort_by_key(|&(x, y)| (y, x));
        let mut want = live.to_vec();
        want.sort_by_key(|&(x, y)| (y, x));
        assert_eq!(got, want);
    }

    #[test]
    fn test_display_renders_rows() {
        let g = Grid::with_live_cells(3, 2, &[(0, 0), (2, 1)]);
        assert_eq!(g.to_string(), "#..\n..#\n");
    }
}
