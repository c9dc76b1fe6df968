// patterns.rs — Named seed patterns for deterministic runs and tests.
//
// Coordinates are (x, y) offsets from the pattern's top-left corner.
// `stamp` places a pattern at an origin on an existing grid; `seed`
// builds a fresh all-dead grid with one pattern on it.

use crate::grid::{Cell, Grid};

/// A fixed arrangement of live cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub name: &'static str,
    /// Live cells as (x, y) offsets.
    pub cells: &'static [(usize, usize)],
    /// Oscillation period; 1 for still lifes.
    pub period: u32,
    /// Displacement per period, (dx, dy). Zero for anything that stays put.
    pub shift: (isize, isize),
}

impl Pattern {
    /// Bounding-box size (width, height).
    pub fn extent(&self) -> (usize, usize) {
        let w = self.cells.iter().map(|&(x, _)| x + 1).max().unwrap_or(0);
        let h = self.cells.iter().map(|&(_, y)| y + 1).max().unwrap_or(0);
        (w, h)
    }

    /// Absolute coordinates of the pattern placed at `origin`.
    pub fn cells_at(&self, origin: (usize, usize)) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .map(|&(x, y)| (origin.0 + x, origin.1 + y))
            .collect()
    }

    /// Write the pattern into `grid` at `origin`. Cells already alive stay alive.
    ///
    /// # Panics
    /// Panics if the pattern does not fit.
    pub fn stamp(&self, grid: &mut Grid, origin: (usize, usize)) {
        let (w, h) = self.extent();
        assert!(
            origin.0 + w <= grid.width() && origin.1 + h <= grid.height(),
            "pattern {} ({w}×{h}) at {origin:?} does not fit a {}×{} grid",
            self.name,
            grid.width(),
            grid.height(),
        );
        for (x, y) in self.cells_at(origin) {
            grid.set(x, y, Cell::Alive);
        }
    }

    /// A fresh `width × height` grid holding only this pattern at `origin`.
    pub fn seed(&self, width: usize, height: usize, origin: (usize, usize)) -> Grid {
        let mut grid = Grid::new(width, height);
        self.stamp(&mut grid, origin);
        grid
    }
}

/// Glider heading down-right: after 4 generations the same shape reappears
/// one cell further in x and y.
///
/// ```text
///   .#.
///   ..#
///   ###
/// ```
pub const GLIDER: Pattern = Pattern {
    name: "glider",
    cells: &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)],
    period: 4,
    shift: (1, 1),
};

/// 2×2 block, the smallest still life.
pub const BLOCK: Pattern = Pattern {
    name: "block",
    cells: &[(0, 0), (1, 0), (0, 1), (1, 1)],
    period: 1,
    shift: (0, 0),
};

/// Horizontal blinker, period 2.
pub const BLINKER: Pattern = Pattern {
    name: "blinker",
    cells: &[(0, 0), (1, 0), (2, 0)],
    period: 2,
    shift: (0, 0),
};

/// Toad, period 2.
pub const TOAD: Pattern = Pattern {
    name: "toad",
    cells: &[(1, 0), (2, 0), (3, 0), (0, 1), (1, 1), (2, 1)],
    period: 2,
    shift: (0, 0),
};

/// Beacon, period 2.
pub const BEACON: Pattern = Pattern {
    name: "beacon",
    cells: &[(0, 0), (1, 0), (0, 1), (3, 2), (2, 3), (3, 3)],
    period: 2,
    shift: (0, 0),
};

/// R-pentomino: a methuselah that keeps evolving for over a thousand
/// generations. Useful as a long-running, non-periodic workload.
pub const R_PENTOMINO: Pattern = Pattern {
    name: "r-pentomino",
    cells: &[(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)],
    period: 0,
    shift: (0, 0),
};

pub const ALL: &[Pattern] = &[GLIDER, BLOCK, BLINKER, TOAD, BEACON, R_PENTOMINO];

/// Look a pattern up by name (case-insensitive).
pub fn by_name(name: &str) -> Option<Pattern> {
    ALL.iter().copied().find(|p| p.name.eq_ignore_ascii_case(name))
}
