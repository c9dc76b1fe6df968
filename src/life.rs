// life.rs — CPU reference implementation of the Life rule.
//
// This is the authoritative result. Every backend (host planes, GPU
// buffers, GPU textures) is validated against `step` cell-for-cell.
//
// RULE (B3/S23, 8-neighbour Moore neighbourhood):
//   alive, 2 or 3 live neighbours  → alive
//   dead,  exactly 3 live neighbours → alive
//   otherwise                       → dead
//
// BOUNDARY:
//   Closed. Neighbour lookups that fall outside the grid read as dead;
//   there is no toroidal wraparound. The WGSL kernels and the host kernel
//   implement the same policy and are tested against this module.

use crate::grid::{Cell, Grid, ALIVE, DEAD};

/// Offsets of the 8 Moore neighbours, (dx, dy).
pub const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1,  0),          (1,  0),
    (-1,  1), (0,  1), (1,  1),
];

/// Apply the Life rule to one cell given its live-neighbour count.
#[inline]
pub fn next_state(current: Cell, live_neighbors: u32) -> Cell {
    match (current, live_neighbors) {
        (Cell::Alive, 2) | (Cell::Alive, 3) => Cell::Alive,
        (Cell::Dead, 3) => Cell::Alive,
        _ => Cell::Dead,
    }
}

/// Count live neighbours of `(x, y)` using a raw lookup that returns the
/// stored value for in-bounds coordinates.
///
/// `read(x, y)` is only called with in-bounds coordinates; anything outside
/// `width × height` is counted as dead without a lookup. This lets the
/// host kernel reuse the same counting over its own (possibly pitched)
/// memory.
#[inline]
pub fn count_live_neighbors<F>(x: usize, y: usize, width: usize, height: usize, read: F) -> u32
where
    F: Fn(usize, usize) -> u32,
{
    let mut n = 0;
    for (dx, dy) in NEIGHBOR_OFFSETS {
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        if nx < 0 || ny < 0 || nx as usize >= width || ny as usize >= height {
            continue;
        }
        if read(nx as usize, ny as usize) != DEAD {
            n += 1;
        }
    }
    n
}

/// Advance `grid` by one generation.
pub fn step(grid: &Grid) -> Grid {
    let (w, h) = (grid.width(), grid.height());
    let src = grid.as_slice();
    let mut out = Vec::with_capacity(src.len());
    for y in 0..h {
        for x in 0..w {
            let n = count_live_neighbors(x, y, w, h, |nx, ny| src[ny * w + nx]);
            out.push(next_state(Cell::from_raw(src[y * w + x]), n).raw());
        }
    }
    Grid::from_cells(w, h, out)
}

/// Advance `grid` by `generations` steps. `generations == 0` returns a copy.
pub fn run(grid: &Grid, generations: u64) -> Grid {
    let mut g = grid.clone();
    for _ in 0..generations {
        g = step(&g);
    }
    g
}

/// Translate every live cell by `(dx, dy)`, dropping cells that leave the grid.
/// Used to express "same shape, shifted" expectations for travelling patterns.
pub fn translate(grid: &Grid, dx: isize, dy: isize) -> Grid {
    let (w, h) = (grid.width(), grid.height());
    let mut cells = vec![DEAD; w * h];
    for (x, y) in grid.live_cells() {
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        if nx >= 0 && ny >= 0 && (nx as usize) < w && (ny as usize) < h {
            cells[ny as usize * w + nx as usize] = ALIVE;
        }
    }
    Grid::from_cells(w, h, cells)
}
