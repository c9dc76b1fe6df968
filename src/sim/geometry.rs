// sim/geometry.rs — Dispatch geometry: how a grid is tiled for the kernel.
//
// The grid is covered by square 16×16 tiles (one workgroup each). Grid
// sizes that are not multiples of 16 are over-provisioned with ceiling
// division; the kernel bounds-checks every thread, so neither the storage
// nor the stepper ever special-cases the remainder tiles.
//
//   width = 40, height = 20, TILE_SIZE = 16
//
//   tiles_x = ceil(40 / 16) = 3     ┌────┬────┬──┐··
//   tiles_y = ceil(20 / 16) = 2     │    │    │  │ · ← idle threads
//                                   ├────┼────┼──┤··
//                                   └────┴────┴──┘··
//                                   ···············

use crate::config::ConfigError;

/// Edge length of one square dispatch tile, in cells. Matches the
/// `@workgroup_size` baked into the WGSL kernels.
pub const TILE_SIZE: u32 = 16;

/// A 2D tiling covering a `width × height` grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchGeometry {
    /// Tiles along x.
    pub tiles_x: u32,
    /// Tiles along y.
    pub tiles_y: u32,
    /// Tile edge in cells.
    pub tile: u32,
}

impl DispatchGeometry {
    /// Tiling with [`TILE_SIZE`] tiles that covers every cell.
    pub fn covering(width: u32, height: u32) -> Self {
        Self::with_tile(width, height, TILE_SIZE)
    }

    pub fn with_tile(width: u32, height: u32, tile: u32) -> Self {
        assert!(tile > 0, "tile size must be non-zero");
        DispatchGeometry {
            tiles_x: width.div_ceil(tile),
            tiles_y: height.div_ceil(tile),
            tile,
        }
    }

    /// Number of tiles (workgroups) dispatched.
    pub fn tile_count(&self) -> u64 {
        self.tiles_x as u64 * self.tiles_y as u64
    }

    /// Threads launched, including the idle ones past the grid edge.
    pub fn thread_count(&self) -> u64 {
        self.tile_count() * self.tile as u64 * self.tile as u64
    }

    /// Threads per tile.
    pub fn threads_per_tile(&self) -> u32 {
        self.tile * self.tile
    }

    /// Reject a tiling that needs more than `max` workgroups along either
    /// axis of a single dispatch.
    pub fn check_limit(&self, max: u32) -> Result<(), ConfigError> {
        if self.tiles_x > max || self.tiles_y > max {
            return Err(ConfigError::ExceedsDispatchLimit {
                tiles_x: self.tiles_x,
                tiles_y: self.tiles_y,
                max,
            });
        }
        Ok(())
    }
}

/// Round `value` up to the next multiple of `alignment`.
///
/// Used for row pitches: wgpu requires 256-byte aligned rows in
/// texture/buffer copies, and the pitched host plane mirrors that.
pub fn align_to(value: u32, alignment: u32) -> u32 {
    value.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_multiple() {
        let g = DispatchGeometry::covering(512, 256);
        assert_eq!((g.tiles_x, g.tiles_y), (32, 16));
        assert_eq!(g.tile_count(), 512);
        assert_eq!(g.thread_count(), 512 * 256);
    }

    #[test]
    fn test_ceiling() {
        // Sizes that are not multiples of 16 round up.
        for (w, h) in [(1, 1), (15, 17), (40, 20), (100, 3), (513, 511)] {
            let g = DispatchGeometry::covering(w, h);
            let want_x = (w + 15) / 16;
            let want_y = (h + 15) / 16;
            assert_eq!((g.tiles_x, g.tiles_y), (want_x, want_y), "{w}×{h}");
            assert!(g.thread_count() >= w as u64 * h as u64);
            // No more than one partial tile per axis.
            assert!(g.tiles_x * 16 - w < 16);
            assert!(g.tiles_y * 16 - h < 16);
        }
    }

    #[test]
    fn test_single_cell() {
        let g = DispatchGeometry::covering(1, 1);
        assert_eq!(g.tile_count(), 1);
        assert_eq!(g.threads_per_tile(), 256);
    }

    #[test]
    fn test_dispatch_limit() {
        // 65535 is wgpu's default `max_compute_workgroups_per_dimension`.
        let max = 65535;
        assert_eq!(DispatchGeometry::covering(65535 * 16, 1).check_limit(max), Ok(()));

        // A thin 4 MiB row still needs one workgroup too many.
        let g = DispatchGeometry::covering(1_048_561, 1);
        assert_eq!(g.tiles_x, 65536);
        assert_eq!(
            g.check_limit(max),
            Err(ConfigError::ExceedsDispatchLimit { tiles_x: 65536, tiles_y: 1, max })
        );
        assert!(DispatchGeometry::covering(1, 1_048_561).check_limit(max).is_err());
    }

    #[test]
    fn test_align_to() {
        assert_eq!(align_to(0, 64), 0);
        assert_eq!(align_to(1, 64), 64);
        assert_eq!(align_to(64, 64), 64);
        assert_eq!(align_to(65, 64), 128);
        assert_eq!(align_to(512 * 4, 256), 2048);
    }
}
